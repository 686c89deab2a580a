//! Error handling for Layerwatch
//!
//! Provides error types for every layer of the collector:
//! - G-Code errors (annotation, scanning, malformed input)
//! - Tracking errors (object registry lookups, cancellation)
//! - Telemetry errors (snapshot fetch, sample writes)
//! - Upload errors (archive, storage, ledger)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// G-Code error type
///
/// Represents errors raised while reading, annotating or scanning G-Code files.
#[derive(Error, Debug)]
pub enum GcodeError {
    /// Malformed line that could not be interpreted
    #[error("Malformed line {line_number}: {reason}")]
    MalformedLine {
        /// The line number (1-based) of the offending line.
        line_number: u64,
        /// The reason the line could not be interpreted.
        reason: String,
    },

    /// Object info comment carried an unusable JSON payload
    #[error("Invalid object info payload: {reason}")]
    InvalidObjectInfo {
        /// The reason the payload was rejected.
        reason: String,
    },

    /// File could not be opened or read
    #[error("File error on {path}: {reason}")]
    FileError {
        /// The path of the file.
        path: String,
        /// The underlying reason.
        reason: String,
    },

    /// Standard I/O error while streaming
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Object tracking error type
///
/// Programming-invariant violations in the object registry. These are
/// logged and treated as no-ops by the stream filter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackingError {
    /// No object with this name is registered
    #[error("Unknown object: {name}")]
    UnknownObject {
        /// The object name that was looked up.
        name: String,
    },

    /// No object with this sequence id is registered
    #[error("Unknown object id: {id}")]
    UnknownObjectId {
        /// The sequence id that was looked up.
        id: usize,
    },
}

/// Telemetry capture error type
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Snapshot endpoint is not configured
    #[error("Snapshot URL is not configured")]
    SnapshotNotConfigured,

    /// Snapshot fetch failed (timeout, HTTP status, transport)
    #[error("Snapshot fetch from {url} failed: {reason}")]
    SnapshotFailed {
        /// The snapshot URL.
        url: String,
        /// The reason for the failure.
        reason: String,
    },

    /// Job directory could not be created
    #[error("Failed to create job directory {path}: {reason}")]
    JobDirectory {
        /// The directory path.
        path: String,
        /// The reason for the failure.
        reason: String,
    },

    /// Standard I/O error while writing samples
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Upload pipeline error type
#[derive(Error, Debug)]
pub enum UploadError {
    /// Archive step failed
    #[error("Archiving {job} failed: {reason}")]
    ArchiveFailed {
        /// The job directory basename.
        job: String,
        /// The reason (stderr of the archiver, or the underlying error).
        reason: String,
    },

    /// Remote storage rejected or failed the upload
    #[error("Upload of {name} failed: {reason}")]
    StorageFailed {
        /// The blob name.
        name: String,
        /// The reason for the failure.
        reason: String,
    },

    /// Upload ledger could not be read or written
    #[error("Ledger error: {reason}")]
    Ledger {
        /// The reason for the failure.
        reason: String,
    },

    /// Namespace (pilot id) is missing
    #[error("Upload namespace is not configured")]
    MissingNamespace,

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Main error type for Layerwatch
///
/// A unified error type that can represent any error from all layers.
#[derive(Error, Debug)]
pub enum Error {
    /// G-Code error
    #[error(transparent)]
    Gcode(#[from] GcodeError),

    /// Tracking error
    #[error(transparent)]
    Tracking(#[from] TrackingError),

    /// Telemetry error
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// Upload error
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this is a transient I/O failure (fetch, upload, archive)
    ///
    /// Transient failures abandon the current cycle or session and are never retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Telemetry(TelemetryError::SnapshotFailed { .. })
                | Error::Telemetry(TelemetryError::Io(_))
                | Error::Upload(UploadError::ArchiveFailed { .. })
                | Error::Upload(UploadError::StorageFailed { .. })
                | Error::Upload(UploadError::Io(_))
                | Error::Io(_)
        )
    }

    /// Check if this is a tracking error
    pub fn is_tracking_error(&self) -> bool {
        matches!(self, Error::Tracking(_))
    }

    /// Check if this is a G-Code error
    pub fn is_gcode_error(&self) -> bool {
        matches!(self, Error::Gcode(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
