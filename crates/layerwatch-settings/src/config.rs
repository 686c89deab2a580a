//! Flat key/value settings for Layerwatch
//!
//! The host stores plugin settings as a flat map, so `Settings` mirrors that
//! shape one key per field. Every key has a default, so partial files load.
//! Settings are read as-is here; compiled matchers and derived limits live
//! in [`crate::matchers`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult, SettingsError, SettingsResult};

/// Default object comment patterns (S3D, Cura, Slic3r/Prusa/SuperSlicer, ideaMaker)
pub const DEFAULT_OBJECT_TAG_PATTERNS: [&str; 4] = [
    "; process (.*)",
    ";MESH:(.*)",
    "; printing object (.*)",
    ";PRINTING: (.*)",
];

/// Archive format used to bundle a job directory before upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    /// gzip-compressed tarball built by a low-priority `tar` process
    #[default]
    Tgz,
    /// zip archive built in-process
    Zip,
}

impl std::fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tgz => write!(f, "tgz"),
            Self::Zip => write!(f, "zip"),
        }
    }
}

/// Complete collector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Camera snapshot endpoint
    pub snapshot_url: Option<String>,
    /// Data collection switch
    pub enabled: bool,
    /// Pilot identity, used as the upload namespace
    pub pilot_id: Option<String>,
    /// Collection terms accepted by the user
    pub terms_accepted: bool,
    /// Slicer comment patterns whose first group is an object name
    pub object_tag_patterns: Vec<String>,
    /// Annotation tag token (`@<reptag> name`)
    pub reptag: String,
    /// Comma-separated object names flagged as ignored
    pub ignored_objects: String,
    /// Comma-separated commands injected when a skip region starts
    pub before_skip_gcode: String,
    /// Comma-separated commands injected when a skip region ends
    pub after_skip_gcode: String,
    /// Comma-separated regexes of commands still sent while skipping
    pub allowed_during_skip: String,
    /// Honour `@<reptag>stop` markers as the end of a skip region
    pub stop_tags: bool,
    /// Seconds between snapshots
    pub snapshot_interval_secs: f64,
    /// Wall-clock ceiling of collected samples per print, in minutes
    pub max_capture_minutes: f64,
    /// Snapshot fetch timeout in seconds
    pub snapshot_timeout_secs: u64,
    /// Folder receiving job directories and the upload ledger
    pub data_folder: Option<PathBuf>,
    /// Remote storage base URL
    pub upload_endpoint: Option<String>,
    /// Remote storage bucket
    pub upload_bucket: String,
    /// Archive format for uploads
    pub archive_format: ArchiveFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            snapshot_url: None,
            enabled: false,
            pilot_id: None,
            terms_accepted: false,
            object_tag_patterns: DEFAULT_OBJECT_TAG_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            reptag: "Object".to_string(),
            ignored_objects: "ENDGCODE,STARTGCODE".to_string(),
            before_skip_gcode: String::new(),
            after_skip_gcode: String::new(),
            allowed_during_skip: String::new(),
            stop_tags: false,
            snapshot_interval_secs: 0.4,
            max_capture_minutes: 30.0,
            snapshot_timeout_secs: 5,
            data_folder: None,
            upload_endpoint: None,
            upload_bucket: "celestrius-data-collection".to_string(),
            archive_format: ArchiveFormat::Tgz,
        }
    }
}

impl Settings {
    /// Create new settings with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SettingsError::LoadError(format!("{}: {}", path.display(), e))
        })?;

        let settings: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content)?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.display().to_string()).into());
        };

        settings.validate()?;
        tracing::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::to_string_pretty(self)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::to_string_pretty(self)?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.display().to_string()).into());
        };

        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;

        Ok(())
    }

    /// Validate settings
    pub fn validate(&self) -> SettingsResult<()> {
        if self.reptag.trim().is_empty() || self.reptag.contains(char::is_whitespace) {
            return Err(SettingsError::InvalidSetting {
                key: "reptag".to_string(),
                reason: "must be a single non-empty token".to_string(),
            });
        }

        if self.snapshot_interval_secs.is_nan() || self.snapshot_interval_secs <= 0.0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "snapshot_interval_secs".to_string(),
                value: self.snapshot_interval_secs.to_string(),
            }
            .into());
        }

        if self.max_capture_minutes.is_nan() || self.max_capture_minutes <= 0.0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "max_capture_minutes".to_string(),
                value: self.max_capture_minutes.to_string(),
            }
            .into());
        }

        if self.snapshot_timeout_secs == 0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "snapshot_timeout_secs".to_string(),
                value: "0".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Whether the user consented to data collection
    ///
    /// Requires accepted terms, the enabled switch and a pilot identity.
    pub fn collection_allowed(&self) -> bool {
        self.terms_accepted && self.enabled && self.pilot_id.is_some()
    }

    /// Data folder, falling back to the platform data directory
    pub fn resolved_data_folder(&self) -> ConfigResult<PathBuf> {
        match &self.data_folder {
            Some(folder) => Ok(folder.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join("layerwatch"))
                .ok_or(ConfigError::NoDataDirectory),
        }
    }
}

/// Split a comma-separated setting into trimmed, non-empty entries
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.reptag, "Object");
        assert_eq!(settings.object_tag_patterns.len(), 4);
        assert_eq!(settings.snapshot_interval_secs, 0.4);
        assert!(!settings.collection_allowed());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("ENDGCODE,STARTGCODE"), vec!["ENDGCODE", "STARTGCODE"]);
        assert_eq!(split_list(" G1 Z10 , ,M400,"), vec!["G1 Z10", "M400"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_collection_allowed() {
        let settings = Settings {
            enabled: true,
            terms_accepted: true,
            pilot_id: Some("pilot@example.com".to_string()),
            ..Default::default()
        };
        assert!(settings.collection_allowed());

        let settings = Settings {
            pilot_id: None,
            ..settings
        };
        assert!(!settings.collection_allowed());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let settings = Settings {
            reptag: "Two Words".to_string(),
            ..Default::default()
        };
        assert!(settings.validate().is_err());

        let settings = Settings {
            snapshot_interval_secs: 0.0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"enabled": true, "reptag": "Part"}"#).unwrap();
        assert!(settings.enabled);
        assert_eq!(settings.reptag, "Part");
        assert_eq!(settings.ignored_objects, "ENDGCODE,STARTGCODE");
        assert_eq!(settings.archive_format, ArchiveFormat::Tgz);
    }

    #[test]
    fn test_save_and_load_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layerwatch.toml");

        let settings = Settings {
            pilot_id: Some("pilot".to_string()),
            archive_format: ArchiveFormat::Zip,
            after_skip_gcode: "M400".to_string(),
            ..Default::default()
        };
        settings.save_to_file(&path).unwrap();

        let loaded = Settings::load_from_file(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layerwatch.yaml");
        std::fs::write(&path, "enabled: true").unwrap();
        assert!(Settings::load_from_file(&path).is_err());
    }
}
