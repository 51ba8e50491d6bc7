//! Latest-wins prediction hand-off
//!
//! [`PredictionSlot`] is the in-process side channel: the producer overwrites
//! the single slot, the consumer reads whatever is there without blocking.
//! The text-file helpers keep compatibility with viewers that poll a file.

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::Result;

/// Single-slot mailbox holding the most recent label
#[derive(Debug, Clone, Default)]
pub struct PredictionSlot {
    inner: Arc<Mutex<Option<u8>>>,
}

impl PredictionSlot {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, Option<u8>> {
        // A panicking writer cannot leave a partial u8 behind
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the current label
    pub fn publish(&self, label: u8) {
        *self.guard() = Some(label);
    }

    /// Latest label, if any, leaving it in place
    pub fn latest(&self) -> Option<u8> {
        *self.guard()
    }

    /// Latest label, if any, emptying the slot
    pub fn take(&self) -> Option<u8> {
        self.guard().take()
    }
}

/// Read a label from a prediction text file
///
/// A missing, unreadable or non-numeric file means "no prediction" and
/// yields `None`. Only plain decimal digits count as a label.
pub fn read_prediction_file(path: impl AsRef<Path>) -> Option<u8> {
    let content = fs::read_to_string(path).ok()?;
    let digits = content.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Overwrite a prediction text file atomically (temp file + rename)
pub fn write_prediction_file(path: impl AsRef<Path>, label: u8) -> Result<()> {
    let path = path.as_ref();
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    fs::write(&tmp, label.to_string())?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_wins() {
        let slot = PredictionSlot::new();
        assert_eq!(slot.latest(), None);
        slot.publish(1);
        slot.publish(3);
        assert_eq!(slot.latest(), Some(3));
        assert_eq!(slot.take(), Some(3));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn test_shared_between_threads() {
        let slot = PredictionSlot::new();
        let producer = slot.clone();
        std::thread::spawn(move || producer.publish(2))
            .join()
            .unwrap();
        assert_eq!(slot.latest(), Some(2));
    }

    #[test]
    fn test_prediction_file() {
        let dir = std::env::temp_dir().join(format!("eeg_gesture_pred_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("prediction.txt");

        assert_eq!(read_prediction_file(&path), None);
        write_prediction_file(&path, 2).unwrap();
        assert_eq!(read_prediction_file(&path), Some(2));

        fs::write(&path, "not a label").unwrap();
        assert_eq!(read_prediction_file(&path), None);
        fs::write(&path, "3\n").unwrap();
        assert_eq!(read_prediction_file(&path), Some(3));

        for signed in ["+3", "-1", " +2 ", "3.0", ""] {
            fs::write(&path, signed).unwrap();
            assert_eq!(read_prediction_file(&path), None, "{:?} is not a label", signed);
        }

        fs::remove_dir_all(&dir).ok();
    }
}
