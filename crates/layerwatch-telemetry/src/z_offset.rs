//! Z probe offset tracking
//!
//! Firmware answers `M851` in several dialects. Each received line is
//! inspected and handed back unchanged; a recognised offset is stored in
//! the shared [`PrintSignals`].

use layerwatch_core::HostEvent;
use std::sync::Arc;

use crate::signals::PrintSignals;

/// Query that makes the firmware report its probe offset
pub const PROBE_OFFSET_QUERY: &str = "M851";

/// Parser for the firmware's probe offset responses
#[derive(Debug)]
pub struct ZOffsetTracker {
    signals: Arc<PrintSignals>,
    prusa_firmware: bool,
    value_follows: bool,
}

impl ZOffsetTracker {
    /// Create a tracker writing into the given signals
    pub fn new(signals: Arc<PrintSignals>) -> Self {
        Self {
            signals,
            prusa_firmware: false,
            value_follows: false,
        }
    }

    /// Whether the connected firmware identified itself as Prusa
    pub fn is_prusa_firmware(&self) -> bool {
        self.prusa_firmware
    }

    /// React to a host event; returns commands to send to the printer
    pub fn on_event(&mut self, event: &HostEvent) -> Vec<String> {
        match event {
            HostEvent::Connected => vec![PROBE_OFFSET_QUERY.to_string()],
            HostEvent::FirmwareDataReceived { name, data } => {
                tracing::debug!("Firmware data: {:?} - {:?}", name, data);
                if let Some(name) = name {
                    self.prusa_firmware = name.to_lowercase().contains("prusa");
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    /// Inspect one line received from the printer
    ///
    /// Returns commands to send, which is a corrective re-query when the
    /// firmware reports the offset as out of range.
    pub fn on_received(&mut self, line: &str) -> Vec<String> {
        if line.is_empty() {
            return Vec::new();
        }
        let line = line.trim().to_lowercase();

        if self.value_follows {
            self.value_follows = false;
            tracing::debug!("Z offset value (prusa): {}", line);
            self.set_from_response(&line);
            return Vec::new();
        }

        if line.len() < 3 {
            return Vec::new();
        }

        if line.contains("zprobe_zoffset") {
            tracing::debug!("CR3D M851 echo: {}", line);
            self.set_from_response(line.rsplit('=').next().unwrap_or(""));
        } else if line.contains("probe z offset:") {
            tracing::debug!("Marlin 1.x M851 echo: {}", line);
            self.set_from_response(line.rsplit(':').next().unwrap_or(""));
        } else if line.ends_with("z offset") && self.prusa_firmware {
            tracing::debug!("Prusa M851 echo: z offset may follow");
            self.value_follows = true;
        } else if line.contains("z offset") {
            tracing::debug!("CR3D variant echo to M851Z[VALUE]: {}", line);
            self.set_from_response(line.rsplit(' ').next().unwrap_or(""));
        } else if line.contains("m851") || line.contains("probe offset ") {
            tracing::debug!("Marlin 2.x M851 echo: {}", line);
            self.set_from_gcode(&line.replace("probe offset", ""));
        } else if line.contains("?z out of range") {
            tracing::error!("Setting z offset: {}", line);
            return vec![PROBE_OFFSET_QUERY.to_string()];
        }

        Vec::new()
    }

    fn set_from_response(&self, offset: &str) {
        let offset: String = offset
            .trim()
            .chars()
            .filter(|c| *c != ' ' && *c != '"')
            .collect();

        if offset.is_empty() {
            tracing::warn!("Offset part is empty");
            return;
        }
        if !is_offset_text(&offset) {
            tracing::warn!("Unable to extract Z offset from \"{}\"", offset);
            return;
        }

        match offset.parse::<f64>() {
            Ok(value) => {
                tracing::info!("Z probe offset is now {}", offset);
                self.signals.set_z_offset(value);
            }
            Err(e) => tracing::warn!("Unable to parse Z offset \"{}\": {}", offset, e),
        }
    }

    fn set_from_gcode(&self, line: &str) {
        let stripped = line.to_lowercase().replace("m851", "");
        match stripped.split_whitespace().find(|word| word.starts_with('z')) {
            Some(word) => self.set_from_response(&word[1..]),
            None => tracing::warn!("Bad M851 response: {}", line),
        }
    }
}

/// Optional `-`, digits and at most one `.`
fn is_offset_text(text: &str) -> bool {
    let text = text.replacen('-', "", 1).replacen('.', "", 1);
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}
