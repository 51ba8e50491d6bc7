//! Label to pose frame mapping

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::mailbox::PredictionSlot;

/// Playback frame per gesture label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoseMap {
    frames: BTreeMap<u8, u32>,
}

impl Default for PoseMap {
    fn default() -> Self {
        Self::new([(0, 1), (1, 10), (2, 30), (3, 20)])
    }
}

impl PoseMap {
    /// Build a map from `(label, frame)` pairs
    pub fn new(pairs: impl IntoIterator<Item = (u8, u32)>) -> Self {
        Self {
            frames: pairs.into_iter().collect(),
        }
    }

    /// Frame for a label; unknown labels have none
    pub fn frame_for(&self, label: u8) -> Option<u32> {
        self.frames.get(&label).copied()
    }
}

/// Moves the viewer only when the mapped frame changes
#[derive(Debug, Clone, Default)]
pub struct PoseDriver {
    map: PoseMap,
    current: Option<u32>,
}

impl PoseDriver {
    /// Create a driver with no pose applied yet
    pub fn new(map: PoseMap) -> Self {
        Self { map, current: None }
    }

    /// Frame currently applied
    pub fn current_frame(&self) -> Option<u32> {
        self.current
    }

    /// Apply a label; returns the new frame when it differs from the current one
    pub fn apply(&mut self, label: u8) -> Option<u32> {
        let frame = self.map.frame_for(label)?;
        if self.current == Some(frame) {
            return None;
        }
        self.current = Some(frame);
        Some(frame)
    }

    /// Check the slot once; an empty slot or an unknown label changes nothing
    pub fn poll(&mut self, slot: &PredictionSlot) -> Option<u32> {
        self.apply(slot.latest()?)
    }
}
