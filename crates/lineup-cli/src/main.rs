use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use lineup_core::{FaceLocator, ImageInput, LabelRegistry, LinearClassifier, Pipeline};

#[derive(Parser)]
#[command(name = "lineup", about = "Lineup face identity classification CLI")]
struct Cli {
    /// Directory containing the face and eye cascade XML files.
    #[arg(long)]
    cascade_dir: Option<PathBuf>,

    /// Path to the label dictionary artifact.
    #[arg(long)]
    labels: Option<PathBuf>,

    /// Path to the classifier artifact.
    #[arg(long)]
    model: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every valid face in a local image file
    Classify {
        /// Image file to classify
        image: PathBuf,
    },
    /// Print the label dictionary
    Labels,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let artifact_dir = std::env::var("LINEUP_ARTIFACT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| lineup_core::default_artifact_dir());

    let labels_path = cli
        .labels
        .unwrap_or_else(|| artifact_dir.join("class_dictionary.json"));

    match cli.command {
        Commands::Classify { image } => {
            let cascade_dir = cli
                .cascade_dir
                .unwrap_or_else(|| artifact_dir.join("cascades"));
            let model_path = cli
                .model
                .unwrap_or_else(|| artifact_dir.join("classifier.json"));

            let locator = FaceLocator::from_cascade_dir(&cascade_dir)
                .with_context(|| format!("loading cascades from {}", cascade_dir.display()))?;
            let labels = LabelRegistry::load(&labels_path)
                .with_context(|| format!("loading labels from {}", labels_path.display()))?;
            let classifier = LinearClassifier::load(&model_path)
                .with_context(|| format!("loading classifier from {}", model_path.display()))?;
            let pipeline =
                Pipeline::new(locator, Box::new(classifier), labels).context("assembling pipeline")?;

            let results = pipeline.classify(&ImageInput::Path(image))?;
            if results.is_empty() {
                eprintln!("no valid face found");
            }
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Commands::Labels => {
            let labels = LabelRegistry::load(&labels_path)
                .with_context(|| format!("loading labels from {}", labels_path.display()))?;
            for (name, index) in labels.snapshot() {
                println!("{index}\t{name}");
            }
        }
    }

    Ok(())
}
