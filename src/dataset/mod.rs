//! Labeled dataset construction
//!
//! Walks a class-folder corpus, preprocesses each recording, cuts it into
//! overlapping windows, optionally augments them and extracts one feature
//! vector per window.

pub mod augmentation;
pub mod builder;
pub mod labeled;
pub mod windowing;

pub use builder::{build, BuildReport, DatasetBuilder, SkippedFile};
pub use labeled::LabeledDataset;
pub use windowing::{window_count, Window};
