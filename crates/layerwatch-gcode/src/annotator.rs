//! Slicer comment annotation
//!
//! Rewrites the object comments emitted by the common slicers into one
//! normalized marker form before a file becomes the active job:
//!
//! - `; printing object cube` (any configured pattern) becomes `@Object cube`
//! - `; object:{"id":"cube","object_center":[1.5,2.5]}` becomes
//!   `@Objectinfo cube X1.5 Y2.5`
//! - `; stop printing object cube` becomes `@Objectstop cube`
//!
//! The output is 7-bit clean: every non-ASCII character is written as a
//! decimal character reference (`&#233;`).

use layerwatch_core::GcodeError;
use layerwatch_settings::ObjectTrackingConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::OnceLock;

/// Counters collected while annotating a stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotateStats {
    /// Lines read from the source
    pub lines_read: u64,
    /// Lines written to the output
    pub lines_written: u64,
    /// `@<tag> <name>` markers produced
    pub object_markers: u64,
    /// `@<tag>info` markers produced
    pub info_markers: u64,
    /// `@<tag>stop` markers produced
    pub stop_markers: u64,
    /// Info comments left untouched because their payload was unusable
    pub invalid_info: u64,
    /// Lines dropped because they were empty after rewriting
    pub dropped: u64,
}

/// Kind of rewrite applied to a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rewrite {
    None,
    Object,
    Info,
    Stop,
}

fn info_comment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^; object:(.*)").expect("invalid regex pattern"))
}

fn stop_comment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^; stop printing object ([^\t\n\r\x0C\x0B]*)").expect("invalid regex pattern")
    })
}

/// Single-pass rewriter for slicer object comments
#[derive(Debug, Clone)]
pub struct CommentAnnotator {
    patterns: Vec<Regex>,
    marker: String,
}

impl CommentAnnotator {
    /// Create an annotator using the configured comment patterns and tag
    pub fn new(config: &ObjectTrackingConfig) -> Self {
        Self {
            patterns: config.comment_patterns.clone(),
            marker: format!("@{}", config.tag),
        }
    }

    /// Rewrite a single line (with or without its terminator)
    ///
    /// Only lines starting with `;` are candidates. When several comment
    /// patterns match, the last one wins. The result is not yet escaped.
    pub fn annotate_line(&self, line: &str) -> Result<String, GcodeError> {
        self.rewrite(line).map(|(text, _)| text)
    }

    fn rewrite(&self, line: &str) -> Result<(String, Rewrite), GcodeError> {
        if !line.starts_with(';') {
            return Ok((line.to_string(), Rewrite::None));
        }

        let content = line.trim_end_matches(['\n', '\r']);
        let mut rewritten = None;

        for pattern in &self.patterns {
            if let Some(name) = pattern.captures(content).and_then(|caps| caps.get(1)) {
                rewritten = Some((format!("{} {}\n", self.marker, name.as_str()), Rewrite::Object));
            }
        }
        if let Some(result) = rewritten {
            return Ok(result);
        }

        if let Some(caps) = info_comment_regex().captures(content) {
            let payload = caps.get(1).map_or("", |m| m.as_str());
            let (name, x, y) = parse_object_info(payload)?;
            return Ok((
                format!("{}info {} X{} Y{}\n", self.marker, name, x, y),
                Rewrite::Info,
            ));
        }

        if let Some(caps) = stop_comment_regex().captures(content) {
            let name = caps.get(1).map_or("", |m| m.as_str());
            return Ok((format!("{}stop {}\n", self.marker, name), Rewrite::Stop));
        }

        Ok((line.to_string(), Rewrite::None))
    }

    /// Annotate a whole stream
    ///
    /// Lines are decoded as UTF-8 with invalid sequences replaced. An info
    /// comment with an unusable payload is logged and passed through.
    pub fn annotate<R: BufRead, W: Write>(
        &self,
        mut reader: R,
        mut writer: W,
    ) -> Result<AnnotateStats, GcodeError> {
        let mut stats = AnnotateStats::default();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            stats.lines_read += 1;

            let line = String::from_utf8_lossy(&buf);
            let output = match self.rewrite(&line) {
                Ok((text, kind)) => {
                    match kind {
                        Rewrite::Object => stats.object_markers += 1,
                        Rewrite::Info => stats.info_markers += 1,
                        Rewrite::Stop => stats.stop_markers += 1,
                        Rewrite::None => {}
                    }
                    text
                }
                Err(e) => {
                    tracing::warn!("Line {}: {}", stats.lines_read, e);
                    stats.invalid_info += 1;
                    line.into_owned()
                }
            };

            if output.is_empty() {
                stats.dropped += 1;
                continue;
            }

            writer.write_all(escape_non_ascii(&output).as_bytes())?;
            stats.lines_written += 1;
        }

        writer.flush()?;
        tracing::debug!(
            "Annotated {} lines: {} object, {} info, {} stop markers",
            stats.lines_read,
            stats.object_markers,
            stats.info_markers,
            stats.stop_markers
        );
        Ok(stats)
    }

    /// Annotate `source` into `destination`
    pub fn annotate_file(&self, source: &Path, destination: &Path) -> Result<AnnotateStats, GcodeError> {
        let input = File::open(source).map_err(|e| GcodeError::FileError {
            path: source.display().to_string(),
            reason: e.to_string(),
        })?;
        let output = File::create(destination).map_err(|e| GcodeError::FileError {
            path: destination.display().to_string(),
            reason: e.to_string(),
        })?;

        self.annotate(BufReader::new(input), BufWriter::new(output))
    }
}

fn parse_object_info(payload: &str) -> Result<(String, String, String), GcodeError> {
    let info: serde_json::Value =
        serde_json::from_str(payload).map_err(|e| GcodeError::InvalidObjectInfo {
            reason: e.to_string(),
        })?;

    let name = info
        .get("id")
        .and_then(|id| id.as_str())
        .ok_or_else(|| GcodeError::InvalidObjectInfo {
            reason: "missing string field 'id'".to_string(),
        })?;

    let center = info
        .get("object_center")
        .and_then(|c| c.as_array())
        .filter(|c| c.len() >= 2)
        .ok_or_else(|| GcodeError::InvalidObjectInfo {
            reason: "missing field 'object_center'".to_string(),
        })?;

    let coordinate = |value: &serde_json::Value| match value {
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(GcodeError::InvalidObjectInfo {
            reason: format!("non-numeric center coordinate {}", other),
        }),
    };

    Ok((name.to_string(), coordinate(&center[0])?, coordinate(&center[1])?))
}

/// Replace every non-ASCII character with a decimal character reference
pub fn escape_non_ascii(text: &str) -> String {
    if text.is_ascii() {
        return text.to_string();
    }

    let mut escaped = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        if c.is_ascii() {
            escaped.push(c);
        } else {
            escaped.push_str(&format!("&#{};", c as u32));
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use layerwatch_settings::Settings;

    fn annotator() -> CommentAnnotator {
        CommentAnnotator::new(&ObjectTrackingConfig::default())
    }

    fn run(input: &[u8]) -> (String, AnnotateStats) {
        let mut out = Vec::new();
        let stats = annotator().annotate(input, &mut out).unwrap();
        (String::from_utf8(out).unwrap(), stats)
    }

    #[test]
    fn test_object_comment() {
        assert_eq!(
            annotator().annotate_line("; printing object cube_1\n").unwrap(),
            "@Object cube_1\n"
        );
        assert_eq!(annotator().annotate_line(";MESH:Body").unwrap(), "@Object Body\n");
    }

    #[test]
    fn test_info_comment() {
        let line = r#"; object:{"id":"foo","object_center":[1.5,2.5]}"#;
        assert_eq!(
            annotator().annotate_line(line).unwrap(),
            "@Objectinfo foo X1.5 Y2.5\n"
        );
    }

    #[test]
    fn test_info_comment_integer_center() {
        let line = r#"; object:{"id":"bar","object_center":[10,-4.25],"first_layer_height":0.2}"#;
        assert_eq!(
            annotator().annotate_line(line).unwrap(),
            "@Objectinfo bar X10 Y-4.25\n"
        );
    }

    #[test]
    fn test_stop_comment() {
        assert_eq!(
            annotator().annotate_line("; stop printing object cube_1\r\n").unwrap(),
            "@Objectstop cube_1\n"
        );
    }

    #[test]
    fn test_non_comment_lines_unchanged() {
        assert_eq!(annotator().annotate_line("G1 X1 E1\n").unwrap(), "G1 X1 E1\n");
        assert_eq!(
            annotator().annotate_line("; layer 2\n").unwrap(),
            "; layer 2\n"
        );
        // Patterns only match at line start
        assert_eq!(
            annotator().annotate_line("G1 X1 ; printing object cube\n").unwrap(),
            "G1 X1 ; printing object cube\n"
        );
    }

    #[test]
    fn test_invalid_info_is_reported() {
        let err = annotator().annotate_line("; object:{not json").unwrap_err();
        assert!(matches!(err, GcodeError::InvalidObjectInfo { .. }));

        let err = annotator()
            .annotate_line(r#"; object:{"object_center":[1,2]}"#)
            .unwrap_err();
        assert!(matches!(err, GcodeError::InvalidObjectInfo { .. }));
    }

    #[test]
    fn test_custom_tag() {
        let settings = Settings {
            reptag: "Part".to_string(),
            ..Default::default()
        };
        let config = ObjectTrackingConfig::from_settings(&settings).unwrap();
        let annotator = CommentAnnotator::new(&config);
        assert_eq!(
            annotator.annotate_line("; process Left").unwrap(),
            "@Part Left\n"
        );
    }

    #[test]
    fn test_stream_escapes_non_ascii() {
        let (out, stats) = run("; printing object caf\u{e9}\nG1 X1 E1 ; \u{2713}\n".as_bytes());
        assert_eq!(out, "@Object caf&#233;\nG1 X1 E1 ; &#10003;\n");
        assert!(out.is_ascii());
        assert_eq!(stats.object_markers, 1);
        assert_eq!(stats.lines_written, 2);
    }

    #[test]
    fn test_stream_invalid_utf8_is_replaced() {
        let (out, _) = run(b"; printing object a\xffb\n");
        assert_eq!(out, "@Object a&#65533;b\n");
    }

    #[test]
    fn test_stream_keeps_bad_info_line() {
        let (out, stats) = run(b"; object:oops\nG28\n");
        assert_eq!(out, "; object:oops\nG28\n");
        assert_eq!(stats.invalid_info, 1);
    }

    #[test]
    fn test_stream_without_trailing_newline() {
        let (out, stats) = run(b"G28\n; stop printing object a");
        assert_eq!(out, "G28\n@Objectstop a\n");
        assert_eq!(stats.lines_read, 2);
        assert_eq!(stats.dropped, 0);
    }

    #[test]
    fn test_escape_non_ascii() {
        assert_eq!(escape_non_ascii("plain"), "plain");
        assert_eq!(escape_non_ascii("\u{00fc}ber"), "&#252;ber");
    }
}
