//! Object registry
//!
//! Built once per selected file by scanning its annotated markers. Entries
//! keep discovery order; lookups by name go through an index.

use layerwatch_core::{GcodeError, ObjectEntry};
use layerwatch_settings::ObjectTrackingConfig;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Objects discovered in the current job
#[derive(Debug, Clone, Default)]
pub struct ObjectRegistry {
    entries: Vec<ObjectEntry>,
    by_name: HashMap<String, usize>,
    objects_known: bool,
}

impl ObjectRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan an annotated G-Code stream
    ///
    /// Duplicate names are ignored (first occurrence wins). The `ignored`
    /// flag of every entry is computed once the scan is complete.
    pub fn scan<R: BufRead>(
        mut reader: R,
        config: &ObjectTrackingConfig,
    ) -> Result<Self, GcodeError> {
        let mut registry = Self::new();
        let mut buf = Vec::new();
        let mut line_number = 0u64;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            line_number += 1;

            let line = String::from_utf8_lossy(&buf);
            if !line.starts_with('@') {
                continue;
            }
            if let Err(e) = registry.register_line(&line, line_number, config) {
                tracing::warn!("{}", e);
            }
        }

        registry.apply_ignored(config);
        tracing::debug!(
            "Found {} objects (metadata {})",
            registry.len(),
            if registry.objects_known { "present" } else { "absent" }
        );
        Ok(registry)
    }

    /// Scan an annotated G-Code file
    pub fn scan_file(path: &Path, config: &ObjectTrackingConfig) -> Result<Self, GcodeError> {
        let file = File::open(path).map_err(|e| GcodeError::FileError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::scan(BufReader::new(file), config)
    }

    /// Register the object named by a marker line, if any
    ///
    /// Returns the sequence id of a newly created entry.
    pub fn register_line(
        &mut self,
        line: &str,
        line_number: u64,
        config: &ObjectTrackingConfig,
    ) -> Result<Option<usize>, GcodeError> {
        if let Some(caps) = config.info_marker().captures(line) {
            let name = caps[1].trim();
            if self.by_name.contains_key(name) {
                return Ok(None);
            }

            let x = parse_coordinate(&caps[2], line_number)?;
            let y = parse_coordinate(&caps[3], line_number)?;

            // Slicer metadata is authoritative once any info marker is seen
            self.objects_known = true;
            let sequence_id = self.entries.len();
            return Ok(Some(self.insert(ObjectEntry::with_center(name, sequence_id, x, y))));
        }

        if let Some(caps) = config.marker().captures(line) {
            let name = caps[1].trim();
            if self.by_name.contains_key(name) {
                return Ok(None);
            }
            let sequence_id = self.entries.len();
            return Ok(Some(self.insert(ObjectEntry::new(name, sequence_id))));
        }

        Ok(None)
    }

    fn insert(&mut self, entry: ObjectEntry) -> usize {
        let sequence_id = entry.sequence_id;
        self.by_name.insert(entry.object_id.clone(), self.entries.len());
        self.entries.push(entry);
        sequence_id
    }

    /// Flag every entry whose name is on the ignore list
    pub fn apply_ignored(&mut self, config: &ObjectTrackingConfig) {
        for entry in &mut self.entries {
            entry.ignored = config.is_ignored(&entry.object_id);
        }
    }

    /// Entries in discovery order
    pub fn entries(&self) -> &[ObjectEntry] {
        &self.entries
    }

    /// Look up an entry by object name
    pub fn get(&self, name: &str) -> Option<&ObjectEntry> {
        self.by_name.get(name).map(|&index| &self.entries[index])
    }

    /// Look up an entry by object name for mutation
    pub fn get_mut(&mut self, name: &str) -> Option<&mut ObjectEntry> {
        match self.by_name.get(name) {
            Some(&index) => self.entries.get_mut(index),
            None => None,
        }
    }

    /// Look up an entry by sequence id
    pub fn get_by_id(&self, sequence_id: usize) -> Option<&ObjectEntry> {
        self.entries.iter().find(|e| e.sequence_id == sequence_id)
    }

    /// Look up an entry by sequence id for mutation
    pub fn get_by_id_mut(&mut self, sequence_id: usize) -> Option<&mut ObjectEntry> {
        self.entries.iter_mut().find(|e| e.sequence_id == sequence_id)
    }

    /// Whether object geometry came from slicer metadata
    pub fn objects_known(&self) -> bool {
        self.objects_known
    }

    /// Number of objects
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no objects were discovered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry and forget the metadata flag
    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_name.clear();
        self.objects_known = false;
    }
}

fn parse_coordinate(text: &str, line_number: u64) -> Result<f64, GcodeError> {
    text.parse::<f64>().map_err(|e| GcodeError::MalformedLine {
        line_number,
        reason: format!("bad coordinate '{}': {}", text, e),
    })
}
