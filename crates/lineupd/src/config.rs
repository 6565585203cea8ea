use std::path::PathBuf;

/// Daemon configuration, loaded from environment variables.
pub struct Config {
    /// Listen address (default: 127.0.0.1:5000).
    pub listen: String,
    /// Directory containing the face and eye cascade XML files.
    pub cascade_dir: PathBuf,
    /// Path to the label dictionary artifact.
    pub labels_path: PathBuf,
    /// Path to the serialized classifier artifact.
    pub model_path: PathBuf,
}

impl Config {
    /// Load configuration from `LINEUP_*` environment variables with
    /// defaults under the artifact directory.
    pub fn from_env() -> Self {
        let artifact_dir = std::env::var("LINEUP_ARTIFACT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| lineup_core::default_artifact_dir());

        Self {
            listen: std::env::var("LINEUP_LISTEN")
                .unwrap_or_else(|_| "127.0.0.1:5000".to_string()),
            cascade_dir: std::env::var("LINEUP_CASCADE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| artifact_dir.join("cascades")),
            labels_path: std::env::var("LINEUP_LABELS")
                .map(PathBuf::from)
                .unwrap_or_else(|_| artifact_dir.join("class_dictionary.json")),
            model_path: std::env::var("LINEUP_MODEL")
                .map(PathBuf::from)
                .unwrap_or_else(|_| artifact_dir.join("classifier.json")),
        }
    }
}
