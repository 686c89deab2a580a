//! Printer host collaborator interface
//!
//! The printer control host owns the serial link, the job queue and the
//! plugin lifecycle. Layerwatch only sees it through this module: a state
//! query, the current job filename, a command sink and a stream of events.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Printer state as reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrinterStateId {
    /// A job is running
    Printing,
    /// A job is paused
    Paused,
    /// A pause was requested and is in progress
    Pausing,
    /// A resume was requested and is in progress
    Resuming,
    /// Any other host state (operational, offline, error, ...)
    Other(String),
}

impl PrinterStateId {
    /// Parse a host state identifier such as `PRINTING`
    pub fn from_host_id(id: &str) -> Self {
        match id {
            "PRINTING" => Self::Printing,
            "PAUSED" => Self::Paused,
            "PAUSING" => Self::Pausing,
            "RESUMING" => Self::Resuming,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether a job is printing
    ///
    /// Gates both telemetry capture and outbound filtering. `Paused` is not
    /// printing; the capture loop keeps its session open across it.
    pub fn is_printing(&self) -> bool {
        matches!(self, Self::Printing | Self::Pausing | Self::Resuming)
    }
}

impl std::fmt::Display for PrinterStateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Printing => write!(f, "PRINTING"),
            Self::Paused => write!(f, "PAUSED"),
            Self::Pausing => write!(f, "PAUSING"),
            Self::Resuming => write!(f, "RESUMING"),
            Self::Other(id) => write!(f, "{}", id),
        }
    }
}

/// Events delivered by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HostEvent {
    /// Printer connection established
    Connected,
    /// Firmware identification received
    FirmwareDataReceived {
        /// Firmware name, e.g. `Prusa-Firmware`.
        name: Option<String>,
        /// Raw firmware data.
        data: Option<String>,
    },
    /// A file was selected for printing
    FileSelected {
        /// Path on disk of the selected (already annotated) file.
        path: PathBuf,
        /// Display name of the file.
        name: Option<String>,
    },
    /// A print was started
    PrintStarted {
        /// Path on disk of the printed file.
        path: PathBuf,
        /// Display name of the file.
        name: Option<String>,
    },
    /// Print completed
    PrintDone,
    /// Print failed
    PrintFailed,
    /// Print cancelled by the user
    PrintCancelled,
    /// File was deselected
    FileDeselected,
}

impl HostEvent {
    /// Whether this event ends the current job
    pub fn ends_job(&self) -> bool {
        matches!(
            self,
            Self::PrintDone | Self::PrintFailed | Self::PrintCancelled | Self::FileDeselected
        )
    }
}

/// Printer host collaborator
///
/// Implementations must return quickly; the capture loop calls these on
/// every poll.
pub trait PrinterHost: Send + Sync {
    /// Current printer state
    fn state_id(&self) -> PrinterStateId;

    /// Name of the file of the current job, if any
    fn current_job_filename(&self) -> Option<String>;

    /// Queue commands for sending to the printer, in order
    fn send_commands(&self, commands: &[String]);
}
