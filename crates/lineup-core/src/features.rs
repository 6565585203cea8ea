//! Feature assembly.
//!
//! Packs one face crop into the fixed-length vector the classifier was
//! trained on: a 32x32 raw color resize (row-major, channel-last)
//! followed by a 32x32 resize of the detail transform of the
//! original-resolution crop. Layout and length are load-bearing; nothing
//! here may reorder or normalize.

use crate::wavelet;
use image::imageops::{self, FilterType};
use image::RgbImage;

/// Side length both representations are resized to.
pub const FEATURE_SIDE: u32 = 32;
/// Scalars contributed by the raw color resize.
pub const RAW_FEATURES: usize = (FEATURE_SIDE * FEATURE_SIDE * 3) as usize;
/// Scalars contributed by the detail transform.
pub const DETAIL_FEATURES: usize = (FEATURE_SIDE * FEATURE_SIDE) as usize;
/// Total feature vector length.
pub const FEATURE_LEN: usize = RAW_FEATURES + DETAIL_FEATURES;

/// Build the feature vector for one face crop. Always exactly
/// [`FEATURE_LEN`] elements, regardless of the crop's dimensions.
pub fn feature_vector(face: &RgbImage) -> Vec<f64> {
    let raw = imageops::resize(face, FEATURE_SIDE, FEATURE_SIDE, FilterType::Triangle);
    let detail = wavelet::detail_image(face);
    let detail = imageops::resize(&detail, FEATURE_SIDE, FEATURE_SIDE, FilterType::Triangle);

    let mut features = Vec::with_capacity(FEATURE_LEN);
    features.extend(raw.pixels().flat_map(|p| p.0).map(f64::from));
    features.extend(detail.pixels().map(|p| f64::from(p.0[0])));
    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_feature_length_is_fixed() {
        for (w, h) in [(32, 32), (64, 64), (17, 53), (200, 121)] {
            let face = RgbImage::from_fn(w, h, |x, y| Rgb([x as u8, y as u8, 128]));
            let features = feature_vector(&face);
            assert_eq!(features.len(), FEATURE_LEN);
        }
    }

    #[test]
    fn test_raw_block_precedes_detail_block() {
        // A flat red crop: raw features alternate [255, 0, 0] channel-last;
        // detail features are all zero (no high-frequency content).
        let face = RgbImage::from_pixel(50, 50, Rgb([255, 0, 0]));
        let features = feature_vector(&face);
        assert_eq!(&features[..3], &[255.0, 0.0, 0.0]);
        assert!(features[..RAW_FEATURES]
            .chunks(3)
            .all(|px| px == [255.0, 0.0, 0.0]));
        assert!(features[RAW_FEATURES..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_raw_block_is_row_major() {
        // One bright pixel at the origin of an already-32x32 crop lands in
        // the first raw triple, not anywhere later.
        let mut face = RgbImage::from_pixel(32, 32, Rgb([0, 0, 0]));
        face.put_pixel(0, 0, Rgb([200, 100, 50]));
        let features = feature_vector(&face);
        assert!(features[0] > 100.0);
        assert!(features[3..RAW_FEATURES].iter().all(|&v| v < features[0]));
    }

    #[test]
    fn test_values_stay_in_u8_range() {
        let face = RgbImage::from_fn(41, 29, |x, y| Rgb([x as u8 * 5, y as u8 * 9, 255]));
        let features = feature_vector(&face);
        assert!(features.iter().all(|&v| (0.0..=255.0).contains(&v)));
    }
}
