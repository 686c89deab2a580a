//! Per-object skip filtering of the outbound command stream
//!
//! The tracker sits on the command emission path. Each outbound command is
//! fed to [`ObjectTracker::process`], which decides whether the printer gets
//! nothing, the command unchanged, or a replacement sequence. Skipping a
//! cancelled object means suppressing everything between its marker and the
//! next marker naming a live object, then resynchronizing the extruder.

use layerwatch_core::{GcodeError, ObjectEntry, ObjectEvent, TrackingError};
use layerwatch_settings::ObjectTrackingConfig;
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::move_parser::{is_extrusion_move, parse_move, ParsedMove};
use crate::registry::ObjectRegistry;

/// Commands sent when a print ends while a cancelled object was skipped
pub const COOLDOWN_COMMANDS: [&str; 2] = ["M140 S0", "M104 S0"];

/// Decision for one outbound command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutput {
    /// Send nothing
    Suppress,
    /// Send the command unchanged
    Pass,
    /// Send these commands, in order, instead
    Replace(Vec<String>),
}

impl FilterOutput {
    /// Resolve the decision into the commands to send
    pub fn into_commands(self, original: &str) -> Vec<String> {
        match self {
            FilterOutput::Suppress => Vec::new(),
            FilterOutput::Pass => vec![original.to_string()],
            FilterOutput::Replace(commands) => commands,
        }
    }
}

/// Runtime variables of the skip state machine
///
/// Lives for one print session and is reset when the print ends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamFilterState {
    /// Commands are being suppressed
    pub skipping: bool,
    /// The before-skip sequence has not been emitted yet
    pub pending_start_skip: bool,
    /// The after-skip sequence and resync have not been emitted yet
    pub pending_end_skip: bool,
    /// Name of the object currently being printed
    pub active_object: Option<String>,
    /// Extrusion is absolute (`M82`) rather than relative (`M83`)
    pub track_absolute_extrusion: bool,
    /// Last extruder position seen while skipping
    pub last_extrusion: f64,
    /// E value of the previous extrusion move
    pub previous_extrusion: f64,
    /// When the current skip region started
    pub skip_started_at: Option<Instant>,
}

/// Object tracker and outbound command filter
///
/// Notifications are queued rather than published, so the owner can hand
/// them to subscribers after releasing whatever lock guards the tracker.
#[derive(Debug)]
pub struct ObjectTracker {
    config: Arc<ObjectTrackingConfig>,
    registry: ObjectRegistry,
    state: StreamFilterState,
    events: Vec<ObjectEvent>,
}

impl ObjectTracker {
    /// Create a tracker with an empty registry
    pub fn new(config: Arc<ObjectTrackingConfig>) -> Self {
        Self {
            config,
            registry: ObjectRegistry::new(),
            state: StreamFilterState::default(),
            events: Vec::new(),
        }
    }

    /// Drain the notifications queued since the last call
    pub fn take_events(&mut self) -> Vec<ObjectEvent> {
        std::mem::take(&mut self.events)
    }

    /// Current state machine variables
    pub fn state(&self) -> &StreamFilterState {
        &self.state
    }

    /// Object registry of the current job
    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    /// Tracking configuration
    pub fn config(&self) -> &ObjectTrackingConfig {
        &self.config
    }

    /// Rebuild the registry from a newly selected or started file
    ///
    /// The object list is queued when it is non-empty and the file has a
    /// display name. Returns the number of objects found.
    pub fn on_file_selected(&mut self, path: &Path, name: Option<&str>) -> Result<usize, GcodeError> {
        let registry = ObjectRegistry::scan_file(path, &self.config)?;
        Ok(self.install_registry(registry, name))
    }

    /// Rebuild the registry from an annotated stream
    pub fn load_objects<R: BufRead>(&mut self, reader: R, name: Option<&str>) -> Result<usize, GcodeError> {
        let registry = ObjectRegistry::scan(reader, &self.config)?;
        Ok(self.install_registry(registry, name))
    }

    fn install_registry(&mut self, registry: ObjectRegistry, name: Option<&str>) -> usize {
        self.registry = registry;
        self.state.last_extrusion = 0.0;

        let count = self.registry.len();
        if count > 0 {
            if let Some(filename) = name {
                self.publish(ObjectEvent::ListUpdated {
                    objects: self.registry.entries().to_vec(),
                    filename: filename.to_string(),
                });
            }
        }
        tracing::info!("Tracking {} objects", count);
        count
    }

    /// Reset at print end, failure, cancellation or file deselection
    ///
    /// Returns the heater shutdown commands if a skip region was still
    /// open, since the print ended inside a cancelled object.
    pub fn on_print_ended(&mut self) -> Vec<String> {
        let commands = if self.state.skipping {
            tracing::info!("Print ended while skipping, turning heaters off");
            COOLDOWN_COMMANDS.iter().map(|c| c.to_string()).collect()
        } else {
            Vec::new()
        };

        self.set_active(None);
        self.registry.clear();
        self.state = StreamFilterState::default();
        commands
    }

    /// Cancel an object by sequence id
    ///
    /// Cancelling the active object starts skipping immediately.
    pub fn cancel_object(&mut self, sequence_id: usize) -> Result<ObjectEntry, TrackingError> {
        let entry = self
            .registry
            .get_by_id_mut(sequence_id)
            .ok_or(TrackingError::UnknownObjectId { id: sequence_id })?;
        entry.cancelled = true;
        let was_active = self.state.active_object.as_deref() == Some(entry.object_id.as_str());
        if was_active {
            entry.active = false;
        }
        let entry = entry.clone();
        tracing::info!("Object {} cancelled", entry.object_id);

        if was_active {
            self.state.active_object = None;
            self.state.skipping = true;
            self.state.skip_started_at = Some(Instant::now());
        }

        self.publish(ObjectEvent::Cancelled {
            object_id: entry.object_id.clone(),
            sequence_id,
        });
        Ok(entry)
    }

    /// Decide what to send for one outbound command
    ///
    /// Never fails: an internal error is logged and the command passes
    /// through unchanged.
    pub fn process(&mut self, command: &str) -> FilterOutput {
        match self.filter(command) {
            Ok(output) => output,
            Err(e) => {
                tracing::error!("Object tracking failed on '{}': {}", command, e);
                FilterOutput::Pass
            }
        }
    }

    fn filter(&mut self, command: &str) -> Result<FilterOutput, TrackingError> {
        if let Some(marker) = command.strip_prefix('@') {
            self.handle_marker(marker);
            return Ok(FilterOutput::Suppress);
        }

        match command {
            "M82" => {
                self.state.track_absolute_extrusion = true;
                tracing::info!("Tracking extrusion");
                return Ok(FilterOutput::Pass);
            }
            "M83" => {
                self.state.track_absolute_extrusion = false;
                tracing::info!("Not tracking extrusion");
                return Ok(FilterOutput::Pass);
            }
            _ => {}
        }

        let extrusion = is_extrusion_move(command);

        if self.state.pending_start_skip {
            self.state.pending_start_skip = false;
            if !self.config.before_skip.is_empty() {
                self.track_skipped_extrusion(command);
                let mut commands = Vec::with_capacity(self.config.before_skip.len() + 1);
                if self.is_allowed(command) {
                    commands.push(command.to_string());
                }
                commands.extend(self.config.before_skip.iter().cloned());
                return Ok(FilterOutput::Replace(commands));
            }
        }

        if self.state.pending_end_skip {
            self.state.pending_end_skip = false;
            if let Some(started) = self.state.skip_started_at.take() {
                tracing::info!("Took {:?} to skip block", started.elapsed());
            }

            let mut commands = Vec::with_capacity(self.config.after_skip.len() + 2);
            if self.state.track_absolute_extrusion {
                commands.push(format!("G92 E{}", self.state.last_extrusion));
            }
            commands.push(command.to_string());
            commands.extend(self.config.after_skip.iter().cloned());
            return Ok(FilterOutput::Replace(commands));
        }

        let output = if self.state.skipping {
            self.track_skipped_extrusion(command);
            if self.is_allowed(command) {
                FilterOutput::Pass
            } else {
                FilterOutput::Suppress
            }
        } else {
            FilterOutput::Pass
        };

        let result = match extrusion {
            Some(ref movement) if !self.state.skipping && !self.registry.objects_known() => {
                self.update_bounds(movement)
            }
            _ => Ok(()),
        };

        if let Some(movement) = extrusion {
            if let Some(e) = movement.e {
                self.state.previous_extrusion = e;
            }
        }

        result.map(|_| output)
    }

    fn handle_marker(&mut self, marker: &str) {
        let (command, parameters) = match marker.split_once(char::is_whitespace) {
            Some((command, parameters)) => (command, parameters.trim()),
            None => (marker.trim(), ""),
        };

        if command != self.config.tag {
            self.publish(ObjectEvent::NextObject);

            if self.config.stop_tags && self.state.skipping {
                let line = format!("@{}", marker);
                if let Some(caps) = self.config.stop_marker().captures(&line) {
                    tracing::info!("Stop marker for {}, resuming", caps[1].trim());
                    self.state.skipping = false;
                }
            }
            return;
        }

        let Some(entry) = self.registry.get(parameters) else {
            tracing::info!("Could not get entry {}", parameters);
            return;
        };

        if entry.cancelled {
            tracing::info!("Hit a cancelled object, {}", parameters);
            self.set_active(None);
            self.state.skip_started_at = Some(Instant::now());
            self.state.skipping = true;
            self.state.pending_start_skip = true;
        } else {
            let object_id = entry.object_id.clone();
            if self.state.skipping {
                self.state.skipping = false;
                self.state.pending_end_skip = true;
            }
            self.set_active(Some(object_id));
        }
    }

    /// Move the active flag to `object_id`, clearing it on the previous entry
    fn set_active(&mut self, object_id: Option<String>) {
        if let Some(previous) = self.state.active_object.take() {
            if let Some(entry) = self.registry.get_mut(&previous) {
                entry.active = false;
            }
        }
        if let Some(name) = object_id.as_deref() {
            if let Some(entry) = self.registry.get_mut(name) {
                entry.active = true;
            }
        }
        self.state.active_object = object_id;
    }

    fn is_allowed(&self, command: &str) -> bool {
        let allowed = self.config.is_allowed(command);
        if allowed {
            tracing::info!("Allowing command: {}", command);
        }
        allowed
    }

    fn track_skipped_extrusion(&mut self, command: &str) {
        if !self.state.track_absolute_extrusion {
            return;
        }
        if let Some(e) = parse_move(command).and_then(|m| m.e) {
            if e != 0.0 {
                self.state.last_extrusion = e;
            }
        }
        if command == "G92 E0" {
            self.state.last_extrusion = 0.0;
        }
    }

    fn update_bounds(&mut self, movement: &ParsedMove) -> Result<(), TrackingError> {
        let Some(e) = movement.e else {
            return Ok(());
        };

        let extruded = if self.state.track_absolute_extrusion {
            e > self.state.previous_extrusion
        } else {
            e > 0.0
        };
        if !extruded {
            return Ok(());
        }

        let Some(active) = self.state.active_object.as_deref() else {
            return Ok(());
        };
        let entry = self
            .registry
            .get_mut(active)
            .ok_or_else(|| TrackingError::UnknownObject {
                name: active.to_string(),
            })?;
        entry.expand(movement.x, movement.y);
        Ok(())
    }

    fn publish(&mut self, event: ObjectEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layerwatch_settings::Settings;

    fn tracker_with(settings: Settings, gcode: &str) -> ObjectTracker {
        let config = ObjectTrackingConfig::from_settings(&settings).unwrap();
        let mut tracker = ObjectTracker::new(Arc::new(config));
        tracker.load_objects(gcode.as_bytes(), None).unwrap();
        tracker
    }

    fn tracker(gcode: &str) -> ObjectTracker {
        tracker_with(Settings::default(), gcode)
    }

    const TWO_OBJECTS: &str = "@Object foo\nG1 X1 E1\n@Object bar\nG1 X2 E1\n";

    #[test]
    fn test_passing_by_default() {
        let mut t = tracker(TWO_OBJECTS);
        assert_eq!(t.process("G28"), FilterOutput::Pass);
        assert_eq!(t.process("G1 X10 Y10 E1"), FilterOutput::Pass);
    }

    #[test]
    fn test_markers_are_never_sent() {
        let mut t = tracker(TWO_OBJECTS);
        assert_eq!(t.process("@Object foo"), FilterOutput::Suppress);
        assert_eq!(t.state().active_object.as_deref(), Some("foo"));
        assert_eq!(t.process("@Object missing"), FilterOutput::Suppress);
        assert_eq!(t.state().active_object.as_deref(), Some("foo"));
    }

    #[test]
    fn test_cancelled_object_is_skipped() {
        let mut t = tracker(TWO_OBJECTS);
        t.cancel_object(1).unwrap();

        t.process("@Object bar");
        assert!(t.state().skipping);
        assert_eq!(t.process("G1 X2 Y2 E0.5"), FilterOutput::Suppress);
        assert_eq!(t.process("M106 S255"), FilterOutput::Suppress);

        t.process("@Object foo");
        assert!(!t.state().skipping);
        assert_eq!(t.process("G1 X1 Y1 E0.2"), FilterOutput::Replace(vec!["G1 X1 Y1 E0.2".to_string()]));
        assert_eq!(t.process("G1 X1 Y2 E0.3"), FilterOutput::Pass);
    }

    #[test]
    fn test_resync_in_absolute_mode() {
        let mut t = tracker(TWO_OBJECTS);
        t.process("M82");
        t.cancel_object(1).unwrap();
        t.process("@Object bar");
        t.process("G1 X5 Y5 E10.0");
        t.process("G1 X6 Y5 E12.3");
        t.process("G0 X0 Y0");
        t.process("@Object foo");

        assert_eq!(
            t.process("G1 X1 Y1 E12.5"),
            FilterOutput::Replace(vec!["G92 E12.3".to_string(), "G1 X1 Y1 E12.5".to_string()])
        );
    }

    #[test]
    fn test_g92_reset_while_skipping() {
        let mut t = tracker(TWO_OBJECTS);
        t.process("M82");
        t.cancel_object(1).unwrap();
        t.process("@Object bar");
        t.process("G1 X5 Y5 E4");
        t.process("G92 E0");
        t.process("@Object foo");
        assert_eq!(
            t.process("G1 X1 E1"),
            FilterOutput::Replace(vec!["G92 E0".to_string(), "G1 X1 E1".to_string()])
        );
    }

    #[test]
    fn test_before_and_after_sequences() {
        let settings = Settings {
            before_skip_gcode: "G1 Z10,M400".to_string(),
            after_skip_gcode: "G1 Z0.4".to_string(),
            allowed_during_skip: "M10[49]".to_string(),
            ..Default::default()
        };
        let mut t = tracker_with(settings, TWO_OBJECTS);
        t.cancel_object(1).unwrap();
        t.process("@Object bar");

        assert_eq!(
            t.process("M104 S210"),
            FilterOutput::Replace(vec![
                "M104 S210".to_string(),
                "G1 Z10".to_string(),
                "M400".to_string()
            ])
        );
        assert_eq!(t.process("G1 X3 E2"), FilterOutput::Suppress);
        assert_eq!(t.process("M109 S210"), FilterOutput::Pass);

        t.process("@Object foo");
        assert_eq!(
            t.process("G1 X1 E1"),
            FilterOutput::Replace(vec!["G1 X1 E1".to_string(), "G1 Z0.4".to_string()])
        );
    }

    #[test]
    fn test_before_sequence_drops_disallowed_command() {
        let settings = Settings {
            before_skip_gcode: "G1 Z10".to_string(),
            ..Default::default()
        };
        let mut t = tracker_with(settings, TWO_OBJECTS);
        t.cancel_object(1).unwrap();
        t.process("@Object bar");
        assert_eq!(
            t.process("G1 X3 E2"),
            FilterOutput::Replace(vec!["G1 Z10".to_string()])
        );
    }

    #[test]
    fn test_extrusion_mode_toggles_pass() {
        let mut t = tracker(TWO_OBJECTS);
        t.cancel_object(1).unwrap();
        t.process("@Object bar");
        assert_eq!(t.process("M82"), FilterOutput::Pass);
        assert!(t.state().track_absolute_extrusion);
        assert_eq!(t.process("M83"), FilterOutput::Pass);
        assert!(!t.state().track_absolute_extrusion);
    }

    #[test]
    fn test_cancel_active_object_skips_immediately() {
        let mut t = tracker(TWO_OBJECTS);
        t.process("@Object foo");
        let entry = t.cancel_object(0).unwrap();
        assert!(entry.cancelled);
        assert!(t.state().skipping);
        assert!(!t.state().pending_start_skip);
        assert_eq!(t.process("G1 X1 E1"), FilterOutput::Suppress);
    }

    #[test]
    fn test_cancel_unknown_id() {
        let mut t = tracker(TWO_OBJECTS);
        assert_eq!(
            t.cancel_object(9).unwrap_err(),
            TrackingError::UnknownObjectId { id: 9 }
        );
    }

    #[test]
    fn test_stop_marker() {
        let settings = Settings {
            stop_tags: true,
            ..Default::default()
        };
        let mut t = tracker_with(settings, TWO_OBJECTS);
        t.cancel_object(1).unwrap();
        t.process("@Object bar");
        t.process("G1 X1 E1");
        assert_eq!(t.process("@Objectstop bar"), FilterOutput::Suppress);
        assert!(!t.state().skipping);
        assert_eq!(t.process("G1 X1 E1"), FilterOutput::Pass);
    }

    #[test]
    fn test_stop_marker_any_case() {
        let settings = Settings {
            stop_tags: true,
            ..Default::default()
        };
        let mut t = tracker_with(settings, TWO_OBJECTS);
        t.cancel_object(1).unwrap();
        t.process("@Object bar");
        t.process("@OBJECTSTOP bar");
        assert!(!t.state().skipping);
    }

    #[test]
    fn test_stop_marker_ignored_without_setting() {
        let mut t = tracker(TWO_OBJECTS);
        t.cancel_object(1).unwrap();
        t.process("@Object bar");
        t.process("@Objectstop bar");
        assert!(t.state().skipping);
    }

    #[test]
    fn test_next_object_notification() {
        let config = Arc::new(ObjectTrackingConfig::default());
        let mut t = ObjectTracker::new(config);

        t.process("@Objectinfo foo X1 Y1");
        assert!(matches!(t.take_events().as_slice(), [ObjectEvent::NextObject]));
        t.process("@Object foo");
        assert!(t.take_events().is_empty());
    }

    #[test]
    fn test_cancel_queues_notification() {
        let mut t = tracker(TWO_OBJECTS);
        t.cancel_object(1).unwrap();
        match t.take_events().as_slice() {
            [ObjectEvent::Cancelled {
                object_id,
                sequence_id,
            }] => {
                assert_eq!(object_id, "bar");
                assert_eq!(*sequence_id, 1);
            }
            other => panic!("Wrong events queued: {:?}", other),
        }
        assert!(t.take_events().is_empty());
    }

    #[test]
    fn test_active_flag_follows_markers() {
        let mut t = tracker(TWO_OBJECTS);
        t.process("@Object foo");
        assert!(t.registry().get("foo").unwrap().active);
        assert!(!t.registry().get("bar").unwrap().active);

        t.process("@Object bar");
        assert!(!t.registry().get("foo").unwrap().active);
        assert!(t.registry().get("bar").unwrap().active);

        // Unknown names leave the current object active
        t.process("@Object baz");
        assert!(t.registry().get("bar").unwrap().active);
        assert_eq!(t.registry().entries().iter().filter(|e| e.active).count(), 1);
    }

    #[test]
    fn test_cancelling_active_object_clears_flag() {
        let mut t = tracker(TWO_OBJECTS);
        t.process("@Object foo");
        let entry = t.cancel_object(0).unwrap();
        assert!(!entry.active);
        assert!(!t.registry().get("foo").unwrap().active);
        assert_eq!(t.state().active_object, None);

        t.process("@Object bar");
        assert!(t.registry().get("bar").unwrap().active);
        assert!(!t.registry().get("foo").unwrap().active);
    }

    #[test]
    fn test_cancelled_marker_clears_flag() {
        let mut t = tracker(TWO_OBJECTS);
        t.cancel_object(1).unwrap();
        t.process("@Object foo");
        t.process("@Object bar");
        assert!(t.registry().entries().iter().all(|e| !e.active));
        assert_eq!(t.state().active_object, None);
    }

    #[test]
    fn test_print_end_clears_active_object() {
        let mut t = tracker(TWO_OBJECTS);
        t.process("@Object foo");
        t.on_print_ended();
        assert_eq!(t.state().active_object, None);

        t.load_objects(TWO_OBJECTS.as_bytes(), None).unwrap();
        assert!(t.registry().entries().iter().all(|e| !e.active));
    }

    #[test]
    fn test_padded_marker_matches_registered_name() {
        let mut t = tracker("@Object cube \n@Object  bar\t\n");
        assert!(t.registry().get("cube").is_some());
        assert!(t.registry().get("bar").is_some());

        t.cancel_object(0).unwrap();
        assert_eq!(t.process("@Object cube "), FilterOutput::Suppress);
        assert!(t.state().skipping);
        assert_eq!(t.process("G1 X1 Y1 E1"), FilterOutput::Suppress);
    }

    #[test]
    fn test_stale_active_object_after_reload_passes() {
        let mut t = tracker("@Object foo\n");
        assert!(!t.registry().objects_known());
        t.process("M83");
        t.process("@Object foo");

        // The new job does not know foo, so extending its bounds fails
        t.load_objects("@Object bar\n".as_bytes(), None).unwrap();
        assert_eq!(t.state().active_object.as_deref(), Some("foo"));
        assert_eq!(t.process("G1 X1 Y1 E1"), FilterOutput::Pass);
        assert!(!t.registry().get("bar").unwrap().has_bounds());

        // Later commands are still filtered
        assert_eq!(t.process("@Object bar"), FilterOutput::Suppress);
        t.process("G1 X4 Y6 E1");
        let bar = t.registry().get("bar").unwrap();
        assert_eq!((bar.min_x, bar.max_y), (4.0, 6.0));

        t.cancel_object(0).unwrap();
        assert_eq!(t.process("G1 X5 Y6 E1"), FilterOutput::Suppress);
    }

    #[test]
    fn test_bounding_box_relative() {
        let mut t = tracker(TWO_OBJECTS);
        t.process("M83");
        t.process("@Object foo");
        t.process("G1 X10 Y20 E0.5");
        t.process("G1 X30 Y5 E0.5");
        t.process("G1 X99 Y99 E-0.8");
        t.process("G0 X200 Y200");

        let foo = t.registry().get("foo").unwrap();
        assert_eq!((foo.min_x, foo.max_x), (10.0, 30.0));
        assert_eq!((foo.min_y, foo.max_y), (5.0, 20.0));
    }

    #[test]
    fn test_bounding_box_absolute() {
        let mut t = tracker(TWO_OBJECTS);
        t.process("M82");
        t.process("@Object bar");
        t.process("G1 X10 Y10 E1");
        t.process("G1 X20 Y10 E2");
        // Retract: E does not increase
        t.process("G1 X90 Y90 E1.5");

        let bar = t.registry().get("bar").unwrap();
        assert_eq!((bar.min_x, bar.max_x), (10.0, 20.0));
        assert_eq!(t.state().previous_extrusion, 1.5);
    }

    #[test]
    fn test_bounding_box_frozen_with_metadata() {
        let mut t = tracker("@Objectinfo foo X5 Y5\n");
        t.process("M83");
        t.process("@Object foo");
        t.process("G1 X50 Y50 E1");
        let foo = t.registry().get("foo").unwrap();
        assert_eq!(foo.max_x, 5.0);
    }

    #[test]
    fn test_print_end_while_skipping() {
        let mut t = tracker(TWO_OBJECTS);
        t.cancel_object(1).unwrap();
        t.process("@Object bar");

        assert_eq!(t.on_print_ended(), vec!["M140 S0", "M104 S0"]);
        assert_eq!(t.state(), &StreamFilterState::default());
        assert!(t.registry().is_empty());
        assert!(t.on_print_ended().is_empty());
    }

    #[test]
    fn test_list_published_with_ignored_flags() {
        let mut t = ObjectTracker::new(Arc::new(ObjectTrackingConfig::default()));

        let count = t
            .load_objects("@Object STARTGCODE\n@Object cube\n".as_bytes(), Some("cube.gcode"))
            .unwrap();
        assert_eq!(count, 2);

        match t.take_events().pop() {
            Some(ObjectEvent::ListUpdated { objects, filename }) => {
                assert_eq!(filename, "cube.gcode");
                assert!(objects[0].ignored);
                assert!(!objects[1].ignored);
            }
            other => panic!("Wrong event received: {:?}", other),
        }
    }

    #[test]
    fn test_into_commands() {
        assert!(FilterOutput::Suppress.into_commands("G28").is_empty());
        assert_eq!(FilterOutput::Pass.into_commands("G28"), vec!["G28"]);
    }
}
