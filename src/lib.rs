//! # Layerwatch
//!
//! Per-object print tracking and print telemetry collection for 3D printer
//! hosts:
//! - Rewrites slicer object comments into `@Object` annotations
//! - Tracks objects and their bounding boxes while a job prints
//! - Skips cancelled objects in the outbound command stream
//! - Captures camera snapshots with flow rate and Z offset labels
//! - Archives and uploads each finished print's samples
//!
//! ## Architecture
//!
//! Layerwatch is organized as a workspace with multiple crates:
//!
//! 1. **layerwatch-core** - Errors, host interface, data models, event bus
//! 2. **layerwatch-settings** - Flat settings and compiled matchers
//! 3. **layerwatch-gcode** - Move parser, annotator, registry, stream filter
//! 4. **layerwatch-telemetry** - Print signals, capture loop, upload pipeline
//! 5. **layerwatch** - Host facade, logging and the command line tool

pub mod collector;

pub use collector::Collector;

pub use layerwatch_core::{
    AppEvent, Error, EventBus, EventBusConfig, EventCategory, EventFilter, GcodeError, HostEvent,
    ObjectEntry, ObjectEvent, PrinterHost, PrinterStateId, Result, TelemetryError, TelemetryEvent,
    TrackingError, UploadError, UploadEvent, UploadRecord,
};

pub use layerwatch_gcode::{
    AnnotateStats, CommentAnnotator, FilterOutput, ObjectRegistry, ObjectTracker, ParsedMove,
};

pub use layerwatch_settings::{
    ArchiveFormat, CaptureConfig, ObjectTrackingConfig, Settings, SettingsError, UploadConfig,
};

pub use layerwatch_telemetry::{CaptureHandle, PrintSignals, UploadLedger};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Pretty formatted output on stderr, keeping stdout for command output
/// - RUST_LOG environment variable support
/// - INFO as the default level
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
