//! Face/eye locator.
//!
//! Runs the face cascade over the full image, then the eye cascade over
//! each face crop, and keeps only faces with at least two detected eyes.
//! The eye count is a hard validity filter: profile views, masks, and
//! detector false positives typically fail it.

use crate::cascade::{DetectOptions, DetectorInitError, HaarCascade};
use crate::types::{FaceCandidate, Region};
use image::{imageops, DynamicImage, GrayImage, RgbImage};
use std::path::Path;

/// Face scan tuning: finer pyramid and a stricter neighbor threshold than
/// the library defaults, trading recall for a lower false-positive rate.
pub const FACE_SCALE_FACTOR: f64 = 1.2;
pub const FACE_MIN_NEIGHBORS: u32 = 5;

/// Minimum detected eye regions for a face crop to be considered valid.
pub const MIN_EYES: usize = 2;

/// Cascade definition filenames expected under the configured directory.
pub const FACE_CASCADE_FILE: &str = "haarcascade_frontalface_default.xml";
pub const EYE_CASCADE_FILE: &str = "haarcascade_eye.xml";

/// Region detection over a grayscale image. Implementations must be
/// reentrant; the locator shares them read-only across requests.
pub trait Detector: Send + Sync {
    fn detect(&self, gray: &GrayImage) -> Vec<Region>;
}

/// A [`HaarCascade`] bound to fixed scan options.
pub struct CascadeDetector {
    cascade: HaarCascade,
    options: DetectOptions,
}

impl CascadeDetector {
    pub fn new(cascade: HaarCascade, options: DetectOptions) -> Self {
        Self { cascade, options }
    }

    pub fn from_file(path: &Path, options: DetectOptions) -> Result<Self, DetectorInitError> {
        Ok(Self::new(HaarCascade::from_file(path)?, options))
    }
}

impl Detector for CascadeDetector {
    fn detect(&self, gray: &GrayImage) -> Vec<Region> {
        self.cascade.detect(gray, &self.options)
    }
}

/// Two-stage face isolation: face detection, then per-face eye validation.
pub struct FaceLocator {
    face: Box<dyn Detector>,
    eyes: Box<dyn Detector>,
}

impl FaceLocator {
    pub fn new(face: Box<dyn Detector>, eyes: Box<dyn Detector>) -> Self {
        Self { face, eyes }
    }

    /// Build both detectors from cascade files in `dir`. The face scan
    /// uses the explicit tuning constants; the eye scan deliberately
    /// keeps the library defaults.
    pub fn from_cascade_dir(dir: &Path) -> Result<Self, DetectorInitError> {
        let face = CascadeDetector::from_file(
            &dir.join(FACE_CASCADE_FILE),
            DetectOptions {
                scale_factor: FACE_SCALE_FACTOR,
                min_neighbors: FACE_MIN_NEIGHBORS,
                ..DetectOptions::default()
            },
        )?;
        let eyes = CascadeDetector::from_file(&dir.join(EYE_CASCADE_FILE), DetectOptions::default())?;
        Ok(Self::new(Box::new(face), Box::new(eyes)))
    }

    /// Find valid face candidates, in face-detection order. Zero faces is
    /// an ordinary empty result, never an error.
    pub fn locate(&self, img: &RgbImage) -> Vec<FaceCandidate> {
        let gray = DynamicImage::ImageRgb8(img.clone()).to_luma8();
        let faces = self.face.detect(&gray);
        tracing::debug!(faces = faces.len(), "face detection complete");

        let (img_w, img_h) = img.dimensions();
        let mut candidates = Vec::new();
        for region in faces {
            if !region.fits_within(img_w, img_h) {
                tracing::debug!(?region, "dropping out-of-bounds face region");
                continue;
            }
            let gray_roi = imageops::crop_imm(&gray, region.x, region.y, region.width, region.height)
                .to_image();
            let eyes = self.eyes.detect(&gray_roi);
            if eyes.len() >= MIN_EYES {
                let pixels =
                    imageops::crop_imm(img, region.x, region.y, region.width, region.height)
                        .to_image();
                candidates.push(FaceCandidate { region, pixels });
            } else {
                tracing::debug!(?region, eyes = eyes.len(), "discarding face: too few eyes");
            }
        }
        candidates
    }
}
