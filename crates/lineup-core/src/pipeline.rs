//! Pipeline orchestrator.
//!
//! Wires decode -> locate -> feature assembly -> classify into one
//! synchronous call per request. The pipeline owns the locator, the
//! classifier, and the label registry as explicitly constructed immutable
//! state; all inference paths borrow `&self`, so a shared pipeline serves
//! concurrent requests without locking.

use crate::artifacts::{ArtifactError, Classifier, LabelRegistry};
use crate::decode::{self, DecodeError};
use crate::features;
use crate::locator::FaceLocator;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("provide exactly one of an image payload or a file path")]
    InvalidInput,
    #[error("classifier returned out-of-range class index {0}")]
    ClassIndex(usize),
}

/// The image to classify: a base64 payload or a local file, never both.
#[derive(Debug, Clone)]
pub enum ImageInput {
    Payload(String),
    Path(PathBuf),
}

impl ImageInput {
    /// Build an input from optional request parts. Supplying neither or
    /// both is [`PipelineError::InvalidInput`]; no pipeline work happens.
    pub fn from_parts(
        payload: Option<String>,
        path: Option<PathBuf>,
    ) -> Result<Self, PipelineError> {
        match (payload, path) {
            (Some(payload), None) => Ok(Self::Payload(payload)),
            (None, Some(path)) => Ok(Self::Path(path)),
            _ => Err(PipelineError::InvalidInput),
        }
    }
}

/// One classification outcome, serialized as-is at the HTTP boundary.
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    /// Predicted label name.
    pub class: String,
    /// Percentages ordered by label index, rounded to 2 decimals and
    /// summing to 100 within rounding tolerance.
    pub class_probability: Vec<f64>,
    /// Snapshot of the label dictionary the indices refer to.
    pub class_dictionary: BTreeMap<String, usize>,
}

/// The assembled classification pipeline.
pub struct Pipeline {
    locator: FaceLocator,
    classifier: Box<dyn Classifier>,
    labels: LabelRegistry,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("labels", &self.labels)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Assemble the pipeline. Classifier and registry must agree on the
    /// class count, otherwise a probability row could map to the wrong
    /// label.
    pub fn new(
        locator: FaceLocator,
        classifier: Box<dyn Classifier>,
        labels: LabelRegistry,
    ) -> Result<Self, ArtifactError> {
        if classifier.class_count() != labels.len() {
            return Err(ArtifactError::ClassCountMismatch {
                classifier: classifier.class_count(),
                labels: labels.len(),
            });
        }
        Ok(Self {
            locator,
            classifier,
            labels,
        })
    }

    /// Label registry view, for diagnostics.
    pub fn labels(&self) -> &LabelRegistry {
        &self.labels
    }

    /// Classify every valid face in the input image.
    ///
    /// Returns one result per candidate in discovery order. Zero valid
    /// faces is an ordinary empty vec; "no face recognized" is not an
    /// error. Decode failures propagate so callers can tell bad input
    /// apart from an empty outcome.
    pub fn classify(&self, input: &ImageInput) -> Result<Vec<Classification>, PipelineError> {
        let img = match input {
            ImageInput::Payload(payload) => decode::from_base64(payload)?,
            ImageInput::Path(path) => decode::from_file(path)?,
        };

        let candidates = self.locator.locate(&img);
        tracing::debug!(candidates = candidates.len(), "valid faces located");

        let mut results = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            let features = features::feature_vector(&candidate.pixels);
            let index = self.classifier.predict(&features);
            let class = self
                .labels
                .name_of(index)
                .ok_or(PipelineError::ClassIndex(index))?
                .to_string();
            let class_probability = self
                .classifier
                .predict_probability(&features)
                .into_iter()
                .map(|p| round2(p * 100.0))
                .collect();
            results.push(Classification {
                class,
                class_probability,
                class_dictionary: self.labels.snapshot().clone(),
            });
        }
        Ok(results)
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
