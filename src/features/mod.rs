//! Feature extraction modules
//!
//! This module contains the per-window feature algorithms:
//! - Descriptive statistics (moments, range, IQR)
//! - Entropy measures (Shannon, sample entropy)
//! - Hjorth parameters
//! - Welch PSD and band power
//! - The extractor assembling them into a fixed-length vector

pub mod entropy;
pub mod extractor;
pub mod hjorth;
pub mod spectral;
pub mod statistics;

pub use extractor::{FeatureExtractor, FeatureVector};
