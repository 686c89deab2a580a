//! # Layerwatch Telemetry
//!
//! Print-session data collection: shared print signals fed by the command
//! callbacks, the Z probe offset parser, camera snapshot sources, the
//! polling capture loop and the archive/upload pipeline that runs once a
//! print finishes.

pub mod archive;
pub mod capture;
pub mod ledger;
pub mod signals;
pub mod snapshot;
pub mod storage;
pub mod upload;
pub mod z_offset;

pub use archive::{Archiver, TarGzArchiver, ZipArchiver};
pub use capture::{sanitize_filename, CaptureHandle, CaptureLoop, JobHandoff, TelemetrySession, POLL_INTERVAL};
pub use ledger::{UploadLedger, COMPLETION_DATE_FORMAT, LEDGER_FILE};
pub use signals::PrintSignals;
pub use snapshot::{HttpSnapshotSource, SnapshotSource};
pub use storage::{BlobStore, DirectoryBlobStore, HttpBlobStore};
pub use upload::{UploadDispatcher, UploadPipeline, LOCAL_STORE_DIR};
pub use z_offset::{ZOffsetTracker, PROBE_OFFSET_QUERY};
