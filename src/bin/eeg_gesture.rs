//! EEG gesture command-line tool
//!
//! # Usage
//!
//! ```bash
//! # Extract a feature matrix from a class-folder corpus
//! eeg-gesture build --data data/ --out features.json
//!
//! # Train and select a model, from a corpus or a saved feature matrix
//! eeg-gesture train --data data/ --out model/
//! eeg-gesture train --features features.json --out model/
//!
//! # Classify every window of a recording
//! eeg-gesture predict --model model/ --recording session.csv --prediction-file prediction.txt
//!
//! # Show the named features of a recording's first window
//! eeg-gesture features --recording session.csv
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use eeg_gesture::live::write_prediction_file;
use eeg_gesture::preprocessing::recording::load_csv;
use eeg_gesture::{
    train, DatasetBuilder, FeatureExtractor, GestureVocabulary, LabeledDataset, LivePredictor,
    ModelArtifact, PipelineConfig, PredictionSlot, Preprocessor, TrainConfig,
};

/// EEG hand-gesture pipeline
#[derive(Parser, Debug)]
#[command(name = "eeg-gesture")]
#[command(author, version, about = "EEG feature extraction and gesture classifier selection", long_about = None)]
struct Cli {
    /// Logging verbosity when RUST_LOG is unset
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Pipeline configuration (JSON); defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a labeled feature matrix from a corpus
    Build {
        /// Corpus root with one folder per gesture
        #[arg(short, long)]
        data: PathBuf,

        /// Output feature matrix (JSON)
        #[arg(short, long)]
        out: PathBuf,

        /// Disable noise augmentation
        #[arg(long)]
        no_augment: bool,
    },

    /// Train the model menu and save the best artifact
    Train {
        /// Corpus root with one folder per gesture
        #[arg(short, long, required_unless_present = "features", conflicts_with = "features")]
        data: Option<PathBuf>,

        /// Feature matrix written by `build`
        #[arg(short, long)]
        features: Option<PathBuf>,

        /// Artifact directory
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Classify every window of one recording
    Predict {
        /// Artifact directory
        #[arg(short, long)]
        model: PathBuf,

        /// Recording (CSV)
        #[arg(short, long)]
        recording: PathBuf,

        /// Write the last label here for file-polling viewers
        #[arg(short, long)]
        prediction_file: Option<PathBuf>,
    },

    /// Print the named features of the first window of a recording
    Features {
        /// Recording (CSV)
        #[arg(short, long)]
        recording: PathBuf,
    },
}

fn load_config(path: Option<&Path>) -> eeg_gesture::error::Result<PipelineConfig> {
    match path {
        Some(p) => PipelineConfig::from_json_file(p),
        None => Ok(PipelineConfig::default()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Build {
            data,
            out,
            no_augment,
        } => {
            if no_augment {
                config.augmentation = None;
            }
            let builder = DatasetBuilder::new(config, GestureVocabulary::default())?;
            let (dataset, report) = builder.build(&data)?;
            dataset.save_json(&out)?;

            println!("Dataset: {} windows x {} features", dataset.len(), dataset.n_features());
            for (label, count) in dataset.class_counts() {
                println!("  class {}: {} windows", label, count);
            }
            for skipped in &report.skipped {
                println!("  skipped {}: {}", skipped.path.display(), skipped.reason);
            }
        }

        Commands::Train {
            data,
            features,
            out,
        } => {
            let dataset = match (data, features) {
                (_, Some(path)) => LabeledDataset::load_json(path)?,
                (Some(root), None) => {
                    DatasetBuilder::new(config, GestureVocabulary::default())?
                        .build(root)?
                        .0
                }
                (None, None) => return Err("either --data or --features is required".into()),
            };

            let outcome = train(&dataset, &TrainConfig::default())?;
            for (i, report) in outcome.reports.iter().enumerate() {
                let marker = if i == outcome.selected { "*" } else { " " };
                println!("{} {:<14} accuracy {:.4}", marker, report.name, report.accuracy);
            }
            outcome.artifact.save(&out)?;
            println!("Saved {} to {}", outcome.artifact.metadata().model_name, out.display());
        }

        Commands::Predict {
            model,
            recording,
            prediction_file,
        } => {
            let artifact = ModelArtifact::load(&model)?;
            let (raw, _) = load_csv(&recording, &config.channels, config.channel_convention)?;
            let predictor = LivePredictor::new(artifact, config, PredictionSlot::new())?;

            let labels = predictor.predict_recording(&raw)?;
            for (i, label) in labels.iter().enumerate() {
                println!("window {:>4}: {}", i, label);
            }
            if let (Some(path), Some(last)) = (prediction_file, predictor.slot().latest()) {
                write_prediction_file(&path, last)?;
            }
        }

        Commands::Features { recording } => {
            let (cleaned, convention) =
                Preprocessor::new(&config)?.process_file(&recording, config.channel_convention)?;
            log::debug!("Columns matched as {:?}", convention);
            let window_len = config.window_len();
            if cleaned.n_samples() < window_len {
                return Err(format!(
                    "recording has {} samples, a window needs {}",
                    cleaned.n_samples(),
                    window_len
                )
                .into());
            }

            let extractor = FeatureExtractor::new(&config);
            let features = extractor.extract(&cleaned.slice(0, window_len))?;
            for (name, value) in extractor.feature_names().iter().zip(features.as_slice()) {
                println!("{:<28} {:>14.6}", name, value);
            }
        }
    }

    Ok(())
}
