//! Live prediction side
//!
//! Adapter-level pieces around a trained artifact:
//! - A latest-wins prediction slot (plus file compatibility helpers)
//! - Label to pose frame mapping for the viewer
//! - A predictor that classifies windows and publishes labels

pub mod mailbox;
pub mod pose;
pub mod predictor;

pub use mailbox::{read_prediction_file, write_prediction_file, PredictionSlot};
pub use pose::{PoseDriver, PoseMap};
pub use predictor::LivePredictor;
