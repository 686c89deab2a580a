//! # Layerwatch G-Code
//!
//! G-Code handling for per-object tracking: a stateless move parser, the
//! slicer comment annotator, the object registry and the outbound command
//! filter that skips cancelled objects.

pub mod annotator;
pub mod move_parser;
pub mod registry;
pub mod stream_filter;

pub use annotator::{escape_non_ascii, AnnotateStats, CommentAnnotator};
pub use move_parser::{is_extrusion_move, parse_move, ParsedMove};
pub use registry::ObjectRegistry;
pub use stream_filter::{FilterOutput, ObjectTracker, StreamFilterState, COOLDOWN_COMMANDS};
