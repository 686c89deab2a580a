//! Compiled, immutable views of the settings
//!
//! Regexes and comma lists are parsed once when a session is configured and
//! then shared read-only by the annotator, the registry scan and the stream
//! filter.

use regex::{Regex, RegexBuilder};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{split_list, ArchiveFormat, Settings};
use crate::error::{ConfigError, ConfigResult};

/// Object tracking configuration with compiled matchers
#[derive(Debug, Clone)]
pub struct ObjectTrackingConfig {
    /// Annotation tag token, e.g. `Object`
    pub tag: String,
    /// Slicer comment patterns, anchored at line start
    pub comment_patterns: Vec<Regex>,
    /// Object names flagged as ignored
    pub ignored: Vec<String>,
    /// Commands injected when a skip region starts
    pub before_skip: Vec<String>,
    /// Commands injected when a skip region ends
    pub after_skip: Vec<String>,
    /// Commands still sent while skipping, anchored at command start
    pub allowed: Vec<Regex>,
    /// Honour `@<tag>stop` markers
    pub stop_tags: bool,
    marker: Regex,
    info_marker: Regex,
    stop_marker: Regex,
}

impl ObjectTrackingConfig {
    /// Compile the tracking configuration from settings
    pub fn from_settings(settings: &Settings) -> ConfigResult<Self> {
        let comment_patterns = settings
            .object_tag_patterns
            .iter()
            .filter(|p| !p.is_empty())
            .map(|p| anchored(p, "object_tag_patterns"))
            .collect::<ConfigResult<Vec<_>>>()?;

        let allowed = split_list(&settings.allowed_during_skip)
            .iter()
            .map(|p| anchored(p, "allowed_during_skip"))
            .collect::<ConfigResult<Vec<_>>>()?;

        let tag = settings.reptag.trim().to_string();
        let escaped = regex::escape(&tag);

        let marker = marker_regex(&format!(r"^@{} ([^\t\n\r\x0C\x0B]*)", escaped))?;
        let info_marker = marker_regex(&format!(
            r"^@{}info ([^\t\n\r\x0C\x0B]*) X(-*\d+\.*\d*) Y(-*\d+\.*\d*)",
            escaped
        ))?;
        let stop_marker = marker_regex(&format!(r"^@{}stop ([^\t\n\r\x0C\x0B]*)", escaped))?;

        Ok(Self {
            tag,
            comment_patterns,
            ignored: split_list(&settings.ignored_objects),
            before_skip: split_list(&settings.before_skip_gcode),
            after_skip: split_list(&settings.after_skip_gcode),
            allowed,
            stop_tags: settings.stop_tags,
            marker,
            info_marker,
            stop_marker,
        })
    }

    /// `@<tag> <name>` matcher, case-insensitive; group 1 is the name
    pub fn marker(&self) -> &Regex {
        &self.marker
    }

    /// `@<tag>info <name> X<x> Y<y>` matcher; groups are name, x, y
    pub fn info_marker(&self) -> &Regex {
        &self.info_marker
    }

    /// `@<tag>stop <name>` matcher; group 1 is the name
    pub fn stop_marker(&self) -> &Regex {
        &self.stop_marker
    }

    /// Whether a command matches the allow-list
    pub fn is_allowed(&self, command: &str) -> bool {
        self.allowed.iter().any(|re| re.is_match(command))
    }

    /// Whether an object name is on the ignore list
    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignored.iter().any(|ignored| ignored == name)
    }
}

impl Default for ObjectTrackingConfig {
    fn default() -> Self {
        // The default settings only hold known-good patterns.
        Self::from_settings(&Settings::default()).expect("default patterns compile")
    }
}

/// Telemetry capture configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureConfig {
    /// Camera snapshot endpoint
    pub snapshot_url: Option<String>,
    /// Minimum time between two samples
    pub interval: Duration,
    /// Wall-clock ceiling of samples per print
    pub max_capture: Duration,
    /// Bound on a single snapshot fetch
    pub snapshot_timeout: Duration,
    /// Folder receiving job directories
    pub data_folder: PathBuf,
    /// Consent gate: terms accepted, enabled and pilot id present
    pub collection_allowed: bool,
}

impl CaptureConfig {
    /// Build the capture configuration from settings
    pub fn from_settings(settings: &Settings) -> ConfigResult<Self> {
        Ok(Self {
            snapshot_url: settings.snapshot_url.clone(),
            interval: Duration::from_secs_f64(settings.snapshot_interval_secs),
            max_capture: Duration::from_secs_f64(settings.max_capture_minutes * 60.0),
            snapshot_timeout: Duration::from_secs(settings.snapshot_timeout_secs),
            data_folder: settings.resolved_data_folder()?,
            collection_allowed: settings.collection_allowed(),
        })
    }

    /// Per-session sample cap: the number of intervals in the capture ceiling
    pub fn max_samples(&self) -> usize {
        let interval = self.interval.as_secs_f64();
        if interval <= 0.0 {
            return 0;
        }
        (self.max_capture.as_secs_f64() / interval).round() as usize
    }
}

/// Upload configuration
#[derive(Debug, Clone, PartialEq)]
pub struct UploadConfig {
    /// Remote storage base URL
    pub endpoint: Option<String>,
    /// Remote storage bucket
    pub bucket: String,
    /// Per-user namespace (the pilot id)
    pub namespace: Option<String>,
    /// Folder holding the upload ledger
    pub data_folder: PathBuf,
    /// Archive format
    pub archive_format: ArchiveFormat,
}

impl UploadConfig {
    /// Build the upload configuration from settings
    pub fn from_settings(settings: &Settings) -> ConfigResult<Self> {
        Ok(Self {
            endpoint: settings.upload_endpoint.clone(),
            bucket: settings.upload_bucket.clone(),
            namespace: settings.pilot_id.clone(),
            data_folder: settings.resolved_data_folder()?,
            archive_format: settings.archive_format,
        })
    }
}

fn anchored(pattern: &str, key: &str) -> ConfigResult<Regex> {
    Regex::new(&format!("^(?:{})", pattern)).map_err(|source| ConfigError::InvalidPattern {
        key: key.to_string(),
        pattern: pattern.to_string(),
        source,
    })
}

fn marker_regex(pattern: &str) -> ConfigResult<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| ConfigError::InvalidPattern {
            key: "reptag".to_string(),
            pattern: pattern.to_string(),
            source,
        })
}
