//! Print signals shared between the command callbacks and the capture loop
//!
//! Each field group has its own lock, held only for a single read or write.

use parking_lot::Mutex;
use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Default, Clone, Copy)]
struct ReadyGate {
    seen_m109: bool,
    seen_command_after_m109: bool,
}

/// Flow rate, Z probe offset and the heat-up ready gate
#[derive(Debug)]
pub struct PrintSignals {
    flow_rate: Mutex<f64>,
    z_offset: Mutex<Option<f64>>,
    gate: Mutex<ReadyGate>,
}

fn flow_rate_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)s(\d+)").expect("invalid regex pattern"))
}

impl PrintSignals {
    /// Create signals with a 100% flow rate and no known Z offset
    pub fn new() -> Self {
        Self {
            flow_rate: Mutex::new(1.0),
            z_offset: Mutex::new(None),
            gate: Mutex::new(ReadyGate::default()),
        }
    }

    /// Current flow rate multiplier
    pub fn flow_rate(&self) -> f64 {
        *self.flow_rate.lock()
    }

    /// Set the flow rate multiplier
    pub fn set_flow_rate(&self, flow_rate: f64) {
        *self.flow_rate.lock() = flow_rate;
    }

    /// Last Z probe offset reported by the firmware
    pub fn z_offset(&self) -> Option<f64> {
        *self.z_offset.lock()
    }

    /// Record the Z probe offset
    pub fn set_z_offset(&self, z_offset: f64) {
        *self.z_offset.lock() = Some(z_offset);
    }

    /// Observe a command that was sent to the printer
    ///
    /// `M221 S<n>` sets the flow rate to `n / 100`. `M109` arms the ready
    /// gate; the first command sent after it opens the gate.
    pub fn observe_sent(&self, command: &str) {
        {
            let mut gate = self.gate.lock();
            if gate.seen_m109 {
                gate.seen_command_after_m109 = true;
            }
        }

        let code = command.split_whitespace().next().unwrap_or("");
        if code.eq_ignore_ascii_case("M221") {
            let percent = flow_rate_regex()
                .captures(command)
                .and_then(|caps| caps[1].parse::<f64>().ok());
            if let Some(percent) = percent {
                self.set_flow_rate(percent / 100.0);
                tracing::debug!("Flow rate is now {}", percent / 100.0);
            }
        } else if code.eq_ignore_ascii_case("M109") {
            *self.gate.lock() = ReadyGate {
                seen_m109: true,
                seen_command_after_m109: false,
            };
        }
    }

    /// Whether the printer is past its first heat-up wait
    pub fn ready(&self) -> bool {
        self.gate.lock().seen_command_after_m109
    }

    /// Close the ready gate for the next print
    pub fn reset_gate(&self) {
        *self.gate.lock() = ReadyGate::default();
    }

    /// Render the label record written next to each snapshot
    pub fn labels(&self) -> String {
        let mut labels = format!("flow_rate:{:?}\n", self.flow_rate());
        if let Some(z_offset) = self.z_offset() {
            labels.push_str(&format!("z_offset:{:?}\n", z_offset));
        }
        labels
    }
}

impl Default for PrintSignals {
    fn default() -> Self {
        Self::new()
    }
}
