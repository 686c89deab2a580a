//! Layerwatch Settings Crate
//!
//! Handles the flat key/value collector settings, their persistence as JSON
//! or TOML, and their one-time compilation into immutable matchers.

pub mod config;
pub mod error;
pub mod matchers;

pub use config::{split_list, ArchiveFormat, Settings, DEFAULT_OBJECT_TAG_PATTERNS};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
pub use matchers::{CaptureConfig, ObjectTrackingConfig, UploadConfig};
