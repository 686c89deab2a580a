use layerwatch_core::ObjectEvent;
use layerwatch_gcode::{CommentAnnotator, FilterOutput, ObjectRegistry, ObjectTracker};
use layerwatch_settings::{ObjectTrackingConfig, Settings};
use std::io::Write;
use std::sync::Arc;

const PRUSA_SLICED: &str = "\
; generated by PrusaSlicer
; object:{\"id\":\"cube_id_0_copy_0\",\"object_center\":[100.5,80],\"first_layer_height\":0.2}
; object:{\"id\":\"cone_id_1_copy_0\",\"object_center\":[140,80.25],\"first_layer_height\":0.2}
M82
G28
; printing object cube_id_0_copy_0
G1 X100 Y80 E1.0
G1 X101 Y80 E2.0
; stop printing object cube_id_0_copy_0
; printing object cone_id_1_copy_0
G1 X140 Y80 E3.0
G1 X141 Y80 E4.5
; stop printing object cone_id_1_copy_0
; printing object cube_id_0_copy_0
G1 X100 Y81 E5.0
";

fn annotate(source: &str, config: &ObjectTrackingConfig) -> String {
    let mut out = Vec::new();
    CommentAnnotator::new(config)
        .annotate(source.as_bytes(), &mut out)
        .unwrap();
    String::from_utf8(out).unwrap()
}

fn send_all(tracker: &mut ObjectTracker, gcode: &str) -> Vec<String> {
    gcode
        .lines()
        .flat_map(|line| tracker.process(line).into_commands(line))
        .collect()
}

#[test]
fn test_annotate_scan_and_skip() {
    let config = Arc::new(ObjectTrackingConfig::default());
    let annotated = annotate(PRUSA_SLICED, &config);

    assert!(annotated.contains("@Objectinfo cube_id_0_copy_0 X100.5 Y80\n"));
    assert!(annotated.contains("@Object cone_id_1_copy_0\n"));
    assert!(annotated.contains("@Objectstop cone_id_1_copy_0\n"));

    let mut tracker = ObjectTracker::new(config);
    assert_eq!(tracker.load_objects(annotated.as_bytes(), None).unwrap(), 2);
    assert!(tracker.registry().objects_known());

    let cone = tracker.registry().get("cone_id_1_copy_0").unwrap().sequence_id;
    tracker.cancel_object(cone).unwrap();

    let sent = send_all(&mut tracker, &annotated);
    assert!(sent.iter().all(|c| !c.starts_with('@')));
    assert!(!sent.iter().any(|c| c.starts_with("G1 X140") || c.starts_with("G1 X141")));
    assert!(sent.iter().any(|c| c == "G1 X101 Y80 E2.0"));

    // Absolute extrusion: resync to the last E seen inside the skipped object
    let resync = sent.iter().position(|c| c == "G92 E4.5").unwrap();
    assert_eq!(sent[resync + 1], "G1 X100 Y81 E5.0");
}

#[test]
fn test_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("part.gcode");
    let annotated = dir.path().join("part.annotated.gcode");

    let mut file = std::fs::File::create(&source).unwrap();
    file.write_all(b";PRINTING: Left\nG1 X1 E1\n;PRINTING: Right\nG1 X2 E1\n;PRINTING: Left\n")
        .unwrap();
    drop(file);

    let config = Arc::new(ObjectTrackingConfig::default());
    let stats = CommentAnnotator::new(&config)
        .annotate_file(&source, &annotated)
        .unwrap();
    assert_eq!(stats.object_markers, 3);

    let registry = ObjectRegistry::scan_file(&annotated, &config).unwrap();
    let names: Vec<_> = registry.entries().iter().map(|e| e.object_id.as_str()).collect();
    assert_eq!(names, vec!["Left", "Right"]);

    let mut tracker = ObjectTracker::new(config);
    tracker.on_file_selected(&annotated, Some("part.gcode")).unwrap();
    match tracker.take_events().as_slice() {
        [ObjectEvent::ListUpdated { objects, filename }] => {
            assert_eq!(objects.len(), 2);
            assert_eq!(filename, "part.gcode");
        }
        other => panic!("Wrong events queued: {:?}", other),
    }
}

#[test]
fn test_skip_until_live_marker() {
    let config = Arc::new(ObjectTrackingConfig::default());
    let mut tracker = ObjectTracker::new(config);
    tracker
        .load_objects("@Object foo\n@Object bar\n".as_bytes(), None)
        .unwrap();
    tracker.cancel_object(1).unwrap();

    tracker.process("@Object bar");
    for command in ["G1 X1 Y1 E0.1", "G0 X5", "M106 S128", "G1 Z0.6"] {
        assert_eq!(tracker.process(command), FilterOutput::Suppress);
    }
    // Markers for unknown objects do not end the skip region
    tracker.process("@Object baz");
    assert_eq!(tracker.process("G1 X2 E0.1"), FilterOutput::Suppress);

    tracker.process("@Object foo");
    assert_ne!(tracker.process("G1 X2 E0.1"), FilterOutput::Suppress);
}

#[test]
fn test_custom_patterns_and_ignore_list() {
    let settings = Settings {
        object_tag_patterns: vec!["; part=(.*)".to_string()],
        ignored_objects: "purge tower".to_string(),
        ..Default::default()
    };
    let config = ObjectTrackingConfig::from_settings(&settings).unwrap();
    let annotated = annotate("; part=purge tower\n; part=gear\n; printing object x\n", &config);
    assert_eq!(
        annotated,
        "@Object purge tower\n@Object gear\n; printing object x\n"
    );

    let registry = ObjectRegistry::scan(annotated.as_bytes(), &config).unwrap();
    assert!(registry.get("purge tower").unwrap().ignored);
    assert!(!registry.get("gear").unwrap().ignored);
}
