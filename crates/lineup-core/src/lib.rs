//! lineup-core: face identity classification pipeline.
//!
//! Turns a photo into per-face identity predictions: cascade face/eye
//! detection, a wavelet detail transform, fixed-layout feature assembly,
//! and a frozen linear classifier over a static label registry.

pub mod artifacts;
pub mod cascade;
pub mod decode;
pub mod features;
pub mod locator;
pub mod pipeline;
pub mod types;
pub mod wavelet;

pub use artifacts::{ArtifactError, Classifier, LabelRegistry, LinearClassifier};
pub use cascade::{DetectOptions, DetectorInitError, HaarCascade};
pub use decode::DecodeError;
pub use locator::{CascadeDetector, Detector, FaceLocator};
pub use pipeline::{Classification, ImageInput, Pipeline, PipelineError};
pub use types::{FaceCandidate, Region};

use std::path::PathBuf;

/// Default directory for artifacts (cascades, labels, classifier) when no
/// configuration overrides it.
pub fn default_artifact_dir() -> PathBuf {
    PathBuf::from("artifacts")
}
