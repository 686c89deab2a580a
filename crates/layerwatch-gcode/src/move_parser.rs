//! Linear move parsing
//!
//! Parses `G0`/`G1` command lines into axis words. Parsing is a pure
//! function of the line; nothing is cached between calls.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Axis words of a single linear move
///
/// `None` means the axis word is not present on the line (or its number
/// could not be parsed).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ParsedMove {
    /// X coordinate
    pub x: Option<f64>,
    /// Y coordinate
    pub y: Option<f64>,
    /// Z coordinate
    pub z: Option<f64>,
    /// Extruder position or length
    pub e: Option<f64>,
    /// Feed rate
    pub feed_rate: Option<f64>,
}

impl ParsedMove {
    /// Whether this move advances the filament while moving in XY
    ///
    /// Requires an X or Y word and a non-zero E word.
    pub fn is_extrusion(&self) -> bool {
        (self.x.is_some() || self.y.is_some()) && self.e.is_some_and(|e| e != 0.0)
    }
}

struct MovePatterns {
    motion: Regex,
    x: Regex,
    y: Regex,
    z: Regex,
    e: Regex,
    feed: Regex,
}

fn patterns() -> &'static MovePatterns {
    static PATTERNS: OnceLock<MovePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| MovePatterns {
        motion: Regex::new(r"^G[01]\s+").expect("invalid regex pattern"),
        x: Regex::new(r"^.*\sX(-*\d*\.*\d*)").expect("invalid regex pattern"),
        y: Regex::new(r"^.*\sY(-*\d*\.*\d*)").expect("invalid regex pattern"),
        z: Regex::new(r"^.*\sZ(-*\d*\.*\d*)").expect("invalid regex pattern"),
        e: Regex::new(r"^.*\sE(-*\d*\.*\d*)").expect("invalid regex pattern"),
        feed: Regex::new(r"^.*\sF(\d*\.*\d*)").expect("invalid regex pattern"),
    })
}

fn capture_number(re: &Regex, line: &str) -> Option<f64> {
    let caps = re.captures(line)?;
    let text = caps.get(1)?.as_str();
    match text.parse::<f64>() {
        Ok(value) => Some(value),
        Err(_) => {
            if !text.is_empty() {
                tracing::trace!("Ignoring malformed number '{}' in '{}'", text, line);
            }
            None
        }
    }
}

/// Parse a linear move command
///
/// Returns `None` if the line does not start with `G0` or `G1` followed by
/// whitespace. The prefix match is case-sensitive. When an axis word occurs
/// more than once, the last occurrence wins.
pub fn parse_move(line: &str) -> Option<ParsedMove> {
    let patterns = patterns();
    if !patterns.motion.is_match(line) {
        return None;
    }

    Some(ParsedMove {
        x: capture_number(&patterns.x, line),
        y: capture_number(&patterns.y, line),
        z: capture_number(&patterns.z, line),
        e: capture_number(&patterns.e, line),
        feed_rate: capture_number(&patterns.feed, line),
    })
}

/// Parse a line and keep it only if it is an extrusion move
pub fn is_extrusion_move(line: &str) -> Option<ParsedMove> {
    parse_move(line).filter(ParsedMove::is_extrusion)
}
