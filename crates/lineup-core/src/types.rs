use image::RgbImage;

/// Axis-aligned rectangle in image coordinates, as produced by a
/// cascade detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Whether the region lies entirely within an image of the given size.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x + self.width <= width && self.y + self.height <= height
    }
}

/// A cropped color sub-image for one detected face, validated by the
/// eye-count filter before it reaches the classifier.
#[derive(Debug, Clone)]
pub struct FaceCandidate {
    /// Where the face was found in the source image.
    pub region: Region,
    /// The color crop at original resolution.
    pub pixels: RgbImage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits_within() {
        let r = Region::new(10, 10, 20, 20);
        assert!(r.fits_within(30, 30));
        assert!(!r.fits_within(29, 30));
        assert!(!r.fits_within(30, 29));
    }

    #[test]
    fn test_fits_within_at_origin() {
        let r = Region::new(0, 0, 5, 5);
        assert!(r.fits_within(5, 5));
        assert!(!r.fits_within(4, 5));
    }
}
