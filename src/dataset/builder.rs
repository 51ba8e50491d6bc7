//! Corpus walking and labeled dataset assembly
//!
//! Layout: `<root>/<class folder>/<recording>.csv`. Class folders come from
//! the gesture vocabulary; a missing folder is skipped. Within a folder,
//! files are processed in sorted order so a seeded build is reproducible.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::config::{ChannelConvention, GestureVocabulary, PipelineConfig};
use crate::error::{PipelineError, Result};
use crate::features::FeatureExtractor;
use crate::preprocessing::Preprocessor;

use super::augmentation::add_relative_noise;
use super::labeled::LabeledDataset;
use super::windowing::{segment, Window};

/// A recording left out of the dataset, with the reason
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFile {
    /// File that was skipped
    pub path: PathBuf,
    /// Rendered error
    pub reason: String,
}

/// Summary of one build
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    /// Files that contributed (possibly zero) windows
    pub files_used: Vec<PathBuf>,
    /// Files skipped because of per-file errors
    pub skipped: Vec<SkippedFile>,
    /// Windows produced per label
    pub windows_per_class: BTreeMap<u8, usize>,
    /// Column convention the dataset was read with
    pub convention: Option<ChannelConvention>,
}

impl BuildReport {
    /// Total windows produced
    pub fn total_windows(&self) -> usize {
        self.windows_per_class.values().sum()
    }
}

/// Dataset builder bound to one configuration and vocabulary
///
/// # Example
///
/// ```no_run
/// use eeg_gesture::{DatasetBuilder, GestureVocabulary, PipelineConfig};
///
/// let builder = DatasetBuilder::new(PipelineConfig::default(), GestureVocabulary::default())?;
/// let (dataset, report) = builder.build("data/")?;
/// println!("{} windows, {} files skipped", dataset.len(), report.skipped.len());
/// # Ok::<(), eeg_gesture::PipelineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct DatasetBuilder {
    config: PipelineConfig,
    vocabulary: GestureVocabulary,
    preprocessor: Preprocessor,
    extractor: FeatureExtractor,
}

impl DatasetBuilder {
    /// Create a builder
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the configuration is invalid.
    pub fn new(config: PipelineConfig, vocabulary: GestureVocabulary) -> Result<Self> {
        config.validate()?;
        let preprocessor = Preprocessor::new(&config)?;
        let extractor = FeatureExtractor::new(&config);
        Ok(Self {
            config,
            vocabulary,
            preprocessor,
            extractor,
        })
    }

    /// The configuration in use
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Walk `root` and build the labeled feature matrix
    ///
    /// # Errors
    ///
    /// - `NotFound` if `root` is not a directory
    /// - `SchemaMismatch` if a file only matches the channel set under a
    ///   different column convention than the one the dataset uses
    /// - `EmptyDataset` if no file produced a window
    ///
    /// Any other per-file failure is logged and the file is skipped.
    pub fn build(&self, root: impl AsRef<Path>) -> Result<(LabeledDataset, BuildReport)> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(PipelineError::NotFound {
                path: root.to_path_buf(),
            });
        }

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut report = BuildReport::default();
        let mut locked = match self.config.channel_convention {
            ChannelConvention::AutoDetect => None,
            fixed => Some(fixed),
        };

        let mut features = Vec::new();
        let mut labels = Vec::new();

        for (folder, label) in self.vocabulary.iter() {
            let class_dir = root.join(folder);
            if !class_dir.is_dir() {
                log::debug!("Class folder {:?} not present, skipping", class_dir);
                continue;
            }

            for path in list_recordings(&class_dir)? {
                let windows = match self.load_windows(&path, label, &mut locked)? {
                    Ok(windows) => windows,
                    Err(e) if e.is_per_file() => {
                        log::warn!("Skipping {:?}: {}", path, e);
                        report.skipped.push(SkippedFile {
                            path,
                            reason: e.to_string(),
                        });
                        continue;
                    }
                    Err(e) => return Err(e),
                };

                log::debug!("{:?}: {} windows", path, windows.len());
                *report.windows_per_class.entry(label).or_insert(0) += windows.len();

                let rows = self.extract_windows(windows, &mut rng)?;
                labels.extend(std::iter::repeat(label).take(rows.len()));
                features.extend(rows);
                report.files_used.push(path);
            }
        }

        report.convention = locked;

        if features.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }

        log::info!(
            "Built dataset: {} windows from {} files ({} skipped)",
            features.len(),
            report.files_used.len(),
            report.skipped.len()
        );

        Ok((LabeledDataset::new(features, labels)?, report))
    }

    /// Preprocess one file and cut its windows
    ///
    /// The outer error aborts the build; the inner one only skips this file.
    /// Locks the dataset convention on the first file that resolves, and
    /// fails fast on a file that only resolves under the other one.
    fn load_windows(
        &self,
        path: &Path,
        label: u8,
        locked: &mut Option<ChannelConvention>,
    ) -> Result<Result<Vec<Window>>> {
        let wanted = locked.unwrap_or(ChannelConvention::AutoDetect);
        let (recording, resolved) = match self.preprocessor.process_file(path, wanted) {
            Ok(ok) => ok,
            Err(e @ PipelineError::SchemaMismatch { .. }) if locked.is_some() => {
                return match self.resolves_elsewhere(path) {
                    Some(other) => Err(PipelineError::SchemaMismatch {
                        path: path.to_path_buf(),
                        message: format!(
                            "file uses {:?} column names but the dataset uses {:?}",
                            other, wanted
                        ),
                    }),
                    None => Ok(Err(e)),
                };
            }
            Err(e) => return Ok(Err(e)),
        };

        if locked.is_none() {
            log::debug!("Dataset column convention: {:?}", resolved);
            *locked = Some(resolved);
        }

        Ok(Ok(segment(
            &recording,
            self.config.window_len(),
            self.config.step_len(),
            label,
            path,
        )))
    }

    /// Convention a file would resolve under when the locked one failed
    fn resolves_elsewhere(&self, path: &Path) -> Option<ChannelConvention> {
        crate::preprocessing::recording::load_csv(
            path,
            &self.config.channels,
            ChannelConvention::AutoDetect,
        )
        .ok()
        .map(|(_, c)| c)
    }

    /// Augment sequentially, then extract in parallel keeping window order
    fn extract_windows(&self, mut windows: Vec<Window>, rng: &mut StdRng) -> Result<Vec<Vec<f64>>> {
        if let Some(augmentation) = &self.config.augmentation {
            for window in windows.iter_mut() {
                add_relative_noise(&mut window.data, augmentation, rng);
            }
        }

        windows
            .par_iter()
            .map(|w| self.extractor.extract(&w.data).map(|fv| fv.into_vec()))
            .collect()
    }
}

/// Sorted `.csv` files (any case) directly inside a directory
fn list_recordings(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e.eq_ignore_ascii_case("csv"));
        if is_csv && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Build a labeled dataset from a class-folder corpus
///
/// Convenience wrapper around [`DatasetBuilder`].
pub fn build(
    root: impl AsRef<Path>,
    vocabulary: &GestureVocabulary,
    config: &PipelineConfig,
) -> Result<(LabeledDataset, BuildReport)> {
    DatasetBuilder::new(config.clone(), vocabulary.clone())?.build(root)
}
