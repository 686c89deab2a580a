//! Data models shared across crates
//!
//! `ObjectEntry` is owned by the object registry but published to the
//! dashboard through the event bus, so it lives here. `UploadRecord` is the
//! row type of the upload ledger.

use serde::{Deserialize, Serialize};

/// One print object discovered in the current job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectEntry {
    /// Slicer-emitted object name, unique within the session
    pub object_id: String,
    /// Discovery order index
    pub sequence_id: usize,
    /// Whether this object is the one currently being printed
    pub active: bool,
    /// Whether the user cancelled this object
    pub cancelled: bool,
    /// Whether the name matched the configured ignore list
    pub ignored: bool,
    /// Bounding box minimum X
    pub min_x: f64,
    /// Bounding box maximum X
    pub max_x: f64,
    /// Bounding box minimum Y
    pub min_y: f64,
    /// Bounding box maximum Y
    pub max_y: f64,
}

impl ObjectEntry {
    /// Create an entry whose bounding box starts at the sentinel extremes
    pub fn new(object_id: impl Into<String>, sequence_id: usize) -> Self {
        Self {
            object_id: object_id.into(),
            sequence_id,
            active: false,
            cancelled: false,
            ignored: false,
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    /// Create an entry whose bounding box is the given center point
    pub fn with_center(object_id: impl Into<String>, sequence_id: usize, x: f64, y: f64) -> Self {
        Self {
            min_x: x,
            max_x: x,
            min_y: y,
            max_y: y,
            ..Self::new(object_id, sequence_id)
        }
    }

    /// Whether the bounding box holds at least one point
    pub fn has_bounds(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    /// Grow the bounding box to include the given coordinates
    ///
    /// Missing axes are left untouched. Cancelled entries are frozen.
    pub fn expand(&mut self, x: Option<f64>, y: Option<f64>) {
        if self.cancelled {
            return;
        }
        if let Some(x) = x {
            if x > self.max_x {
                self.max_x = x;
            }
            if x < self.min_x {
                self.min_x = x;
            }
        }
        if let Some(y) = y {
            if y > self.max_y {
                self.max_y = y;
            }
            if y < self.min_y {
                self.min_y = y;
            }
        }
    }
}

/// One row of the upload ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRecord {
    /// Basename of the uploaded job directory
    pub job_name: String,
    /// Human readable completion date, e.g. `Monday, March 04, 2024`
    pub completion_date: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_bounds() {
        let entry = ObjectEntry::new("part", 0);
        assert!(!entry.has_bounds());
    }

    #[test]
    fn test_expand() {
        let mut entry = ObjectEntry::new("part", 0);
        entry.expand(Some(10.0), Some(20.0));
        entry.expand(Some(5.0), None);
        assert!(entry.has_bounds());
        assert_eq!(entry.min_x, 5.0);
        assert_eq!(entry.max_x, 10.0);
        assert_eq!(entry.min_y, 20.0);
        assert_eq!(entry.max_y, 20.0);
    }

    #[test]
    fn test_cancelled_bounds_frozen() {
        let mut entry = ObjectEntry::with_center("part", 3, 1.0, 1.0);
        entry.cancelled = true;
        entry.expand(Some(50.0), Some(-50.0));
        assert_eq!(entry.max_x, 1.0);
        assert_eq!(entry.min_y, 1.0);
    }
}
