//! Saved artifacts: the frozen classifier and the label registry.
//!
//! Both load once at process start and are immutable afterwards. The
//! classifier is an opaque collaborator behind the [`Classifier`] trait;
//! the bundled implementation is a frozen multinomial logistic model
//! stored as JSON. The registry is the single source of truth for the
//! name <-> index mapping; the pipeline cross-checks the classifier's
//! class count against it at construction so a probability row can never
//! silently mismap to the wrong label.

use crate::features::FEATURE_LEN;
use ndarray::Array2;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("artifact file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to read artifact {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed artifact: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("label registry is empty")]
    EmptyRegistry,
    #[error("label indices must be unique and contiguous from 0: {0}")]
    BadLabelIndex(String),
    #[error("classifier weight row {row} has {got} values, expected {expected}")]
    BadWeightRow {
        row: usize,
        got: usize,
        expected: usize,
    },
    #[error("classifier has {weights} weight rows but {intercepts} intercepts")]
    RowMismatch { weights: usize, intercepts: usize },
    #[error("classifier knows {classifier} classes but the label registry has {labels}")]
    ClassCountMismatch { classifier: usize, labels: usize },
}

/// A frozen, pre-trained classifier over the fixed feature layout.
///
/// Implementations must be reentrant: inference borrows immutably and is
/// safe to call from concurrent requests.
pub trait Classifier: Send + Sync {
    /// Number of classes the model distinguishes.
    fn class_count(&self) -> usize;

    /// Predicted class index for one feature vector.
    fn predict(&self, features: &[f64]) -> usize;

    /// Probability distribution over class indices, summing to 1.
    fn predict_probability(&self, features: &[f64]) -> Vec<f64>;
}

#[derive(Deserialize)]
struct ClassifierArtifact {
    weights: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
}

/// Multinomial logistic model loaded from a JSON artifact:
/// `{ "weights": [[..4096 floats..] per class], "intercepts": [..] }`.
#[derive(Debug)]
pub struct LinearClassifier {
    weights: Array2<f64>,
    intercepts: Vec<f64>,
}

impl LinearClassifier {
    /// Load and validate the model artifact.
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let artifact: ClassifierArtifact = read_json(path)?;
        if artifact.weights.len() != artifact.intercepts.len() {
            return Err(ArtifactError::RowMismatch {
                weights: artifact.weights.len(),
                intercepts: artifact.intercepts.len(),
            });
        }
        let classifier = Self::from_parts(artifact.weights, artifact.intercepts)?;
        tracing::info!(
            path = %path.display(),
            classes = classifier.class_count(),
            "loaded classifier artifact"
        );
        Ok(classifier)
    }

    /// Build a model from raw weight rows (one per class, [`FEATURE_LEN`]
    /// wide) and per-class intercepts.
    pub fn from_parts(
        weights: Vec<Vec<f64>>,
        intercepts: Vec<f64>,
    ) -> Result<Self, ArtifactError> {
        let classes = weights.len();
        for (row, w) in weights.iter().enumerate() {
            if w.len() != FEATURE_LEN {
                return Err(ArtifactError::BadWeightRow {
                    row,
                    got: w.len(),
                    expected: FEATURE_LEN,
                });
            }
        }
        let mut matrix = Array2::zeros((classes, FEATURE_LEN));
        for (i, row) in weights.iter().enumerate() {
            for (j, value) in row.iter().enumerate() {
                matrix[(i, j)] = *value;
            }
        }
        Ok(Self {
            weights: matrix,
            intercepts,
        })
    }

    /// Per-class decision scores: `w . x + b`.
    fn decision(&self, features: &[f64]) -> Vec<f64> {
        self.weights
            .rows()
            .into_iter()
            .zip(&self.intercepts)
            .map(|(row, b)| {
                row.iter()
                    .zip(features)
                    .map(|(w, x)| w * x)
                    .sum::<f64>()
                    + b
            })
            .collect()
    }
}

impl Classifier for LinearClassifier {
    fn class_count(&self) -> usize {
        self.intercepts.len()
    }

    fn predict(&self, features: &[f64]) -> usize {
        self.decision(features)
            .into_iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    fn predict_probability(&self, features: &[f64]) -> Vec<f64> {
        // Softmax with max subtraction for numeric stability.
        let scores = self.decision(features);
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
        let total: f64 = exps.iter().sum();
        exps.into_iter().map(|e| e / total).collect()
    }
}

/// Immutable bidirectional label name <-> index mapping, loaded once from
/// a JSON object `{ "name": index, ... }`.
#[derive(Debug)]
pub struct LabelRegistry {
    name_to_index: BTreeMap<String, usize>,
    index_to_name: Vec<String>,
}

impl LabelRegistry {
    /// Load and validate the registry artifact.
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let mapping: BTreeMap<String, usize> = read_json(path)?;
        let registry = Self::from_mapping(mapping)?;
        tracing::info!(
            path = %path.display(),
            labels = registry.len(),
            "loaded label registry"
        );
        Ok(registry)
    }

    /// Build a registry from a name -> index mapping. Indices must be
    /// unique and contiguous from zero.
    pub fn from_mapping(mapping: BTreeMap<String, usize>) -> Result<Self, ArtifactError> {
        if mapping.is_empty() {
            return Err(ArtifactError::EmptyRegistry);
        }
        let mut index_to_name = vec![None::<String>; mapping.len()];
        for (name, &index) in &mapping {
            let slot = index_to_name.get_mut(index).ok_or_else(|| {
                ArtifactError::BadLabelIndex(format!(
                    "index {index} out of range for {} labels",
                    mapping.len()
                ))
            })?;
            if let Some(taken) = slot {
                return Err(ArtifactError::BadLabelIndex(format!(
                    "index {index} assigned to both {taken:?} and {name:?}"
                )));
            }
            *slot = Some(name.clone());
        }
        // Length and uniqueness together guarantee every slot is filled.
        let index_to_name = index_to_name.into_iter().flatten().collect();
        Ok(Self {
            name_to_index: mapping,
            index_to_name,
        })
    }

    pub fn len(&self) -> usize {
        self.index_to_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index_to_name.is_empty()
    }

    /// Label name for a class index.
    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.index_to_name.get(index).map(String::as_str)
    }

    /// Class index for a label name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// Read-only view of the full mapping, for result serialization.
    pub fn snapshot(&self) -> &BTreeMap<String, usize> {
        &self.name_to_index
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::NotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}
