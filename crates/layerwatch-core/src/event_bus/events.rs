//! Event type definitions for the event bus.
//!
//! Events are the notification sinks exposed to the dashboard layer:
//! object list updates, "advance to next object", capture session
//! lifecycle and upload outcomes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::ObjectEntry;

/// Root event enum for all collector events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AppEvent {
    /// Object tracking events
    Objects(ObjectEvent),
    /// Telemetry capture events
    Telemetry(TelemetryEvent),
    /// Upload pipeline events
    Upload(UploadEvent),
}

impl AppEvent {
    /// Get the category of this event
    pub fn category(&self) -> EventCategory {
        match self {
            AppEvent::Objects(_) => EventCategory::Objects,
            AppEvent::Telemetry(_) => EventCategory::Telemetry,
            AppEvent::Upload(_) => EventCategory::Upload,
        }
    }

    /// Get a short description of this event for logging
    pub fn description(&self) -> String {
        match self {
            AppEvent::Objects(e) => e.description(),
            AppEvent::Telemetry(e) => e.description(),
            AppEvent::Upload(e) => e.description(),
        }
    }
}

/// Event category for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Object tracking events.
    Objects,
    /// Telemetry capture events.
    Telemetry,
    /// Upload pipeline events.
    Upload,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::Objects => write!(f, "Objects"),
            EventCategory::Telemetry => write!(f, "Telemetry"),
            EventCategory::Upload => write!(f, "Upload"),
        }
    }
}

/// Object tracking events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ObjectEvent {
    /// Registry scan completed for a newly selected file.
    ListUpdated {
        /// Full object list in discovery order.
        objects: Vec<ObjectEntry>,
        /// Display name of the source file.
        filename: String,
    },
    /// The print moved on to another object marker.
    NextObject,
    /// An object was cancelled.
    Cancelled {
        /// Name of the cancelled object.
        object_id: String,
        /// Sequence id of the cancelled object.
        sequence_id: usize,
    },
}

impl ObjectEvent {
    /// Get a short description
    pub fn description(&self) -> String {
        match self {
            ObjectEvent::ListUpdated { objects, filename } => {
                format!("{} objects in {}", objects.len(), filename)
            }
            ObjectEvent::NextObject => "Next object".to_string(),
            ObjectEvent::Cancelled { object_id, .. } => format!("Cancelled {}", object_id),
        }
    }
}

/// Telemetry capture events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TelemetryEvent {
    /// A capture session started.
    SessionStarted {
        /// Job directory receiving the samples.
        job_directory: PathBuf,
    },
    /// A capture session ended and was handed to the upload pipeline.
    SessionEnded {
        /// Job directory holding the samples.
        job_directory: PathBuf,
        /// Number of samples attempted in the session.
        samples: usize,
    },
}

impl TelemetryEvent {
    /// Get a short description
    pub fn description(&self) -> String {
        match self {
            TelemetryEvent::SessionStarted { job_directory } => {
                format!("Capture started in {}", job_directory.display())
            }
            TelemetryEvent::SessionEnded {
                job_directory,
                samples,
            } => format!(
                "Capture ended in {} after {} samples",
                job_directory.display(),
                samples
            ),
        }
    }
}

/// Upload pipeline events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UploadEvent {
    /// Job uploaded and recorded in the ledger.
    Completed {
        /// Job directory basename.
        job_name: String,
    },
    /// Upload abandoned.
    Failed {
        /// Job directory basename.
        job_name: String,
        /// Failure reason.
        reason: String,
    },
}

impl UploadEvent {
    /// Get a short description
    pub fn description(&self) -> String {
        match self {
            UploadEvent::Completed { job_name } => format!("Uploaded {}", job_name),
            UploadEvent::Failed { job_name, reason } => {
                format!("Upload of {} failed: {}", job_name, reason)
            }
        }
    }
}
