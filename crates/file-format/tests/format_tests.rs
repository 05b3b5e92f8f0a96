use approx::assert_relative_eq;
use cad_types::*;
use feature_engine::*;
use file_format::{
    load_document, parse_document, save_document, Document, DocumentMetadata, LoadError,
    FORMAT_ID, FORMAT_VERSION,
};
use geometry_kernel::{KernelIntrospect, MockKernel};
use modeling_ops::Operation;
use sketch_profiles::build_profiles;
use uuid::Uuid;

// ── Helper Functions ─────────────────────────────────────────────────────

const ROOT: Uuid = ComponentTree::ROOT_ID;

fn rectangle_sketch(w: f64, h: f64) -> Sketch {
    let mut sketch = Sketch::new(Uuid::new_v4());
    let corners = [
        Point2::new(0.0, 0.0),
        Point2::new(w, 0.0),
        Point2::new(w, h),
        Point2::new(0.0, h),
    ];
    for i in 0..4 {
        sketch.add(SketchElement::line(corners[i], corners[(i + 1) % 4]));
    }
    sketch.constraints.push(SketchConstraint::Horizontal {
        element: sketch.elements[0].id(),
    });
    sketch
}

/// Sketch, extrusion and fillet on a 10x5 rectangle.
fn build_timeline(kernel: &mut MockKernel) -> Timeline {
    let sketch = rectangle_sketch(10.0, 5.0);
    let profiles = build_profiles(&sketch.elements, false)
        .iter()
        .map(|p| ProfileRef {
            component: ROOT,
            sketch: sketch.id,
            rings: p.rings(),
        })
        .collect();

    let mut timeline = Timeline::new();
    timeline.insert_feature(
        Feature::new(
            ROOT,
            FeatureKind::Sketch(SketchSettings {
                plane: Some(PlanarRef::Fixed { plane: Plane::XY }),
                sketch,
            }),
        ),
        kernel,
    );
    timeline.insert_feature(
        Feature::new(
            ROOT,
            FeatureKind::Extrusion(ExtrusionSettings {
                profiles,
                axis: None,
                distance: 2.5,
                side: true,
                symmetric: false,
                operation: Operation::Join,
            }),
        ),
        kernel,
    );
    let compound = timeline.top().root().compound.clone().unwrap();
    let edge = kernel.list_edges(&compound)[0].id;
    timeline.insert_feature(
        Feature::new(
            ROOT,
            FeatureKind::Fillet(FilletSettings {
                edges: vec![EdgeRef {
                    component: ROOT,
                    edge,
                }],
                radius: 0.3,
            }),
        ),
        kernel,
    );
    timeline
}

fn saved(timeline: &Timeline) -> String {
    let mut meta = DocumentMetadata::new("Bracket");
    save_document(timeline, &mut meta).unwrap()
}

// ── Save ────────────────────────────────────────────────────────────────

#[test]
fn save_writes_header_and_metadata() {
    let mut kernel = MockKernel::new();
    let json = saved(&build_timeline(&mut kernel));

    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["format"], FORMAT_ID);
    assert_eq!(parsed["version"], FORMAT_VERSION);
    assert_eq!(parsed["metadata"]["name"], "Bracket");
    assert!(parsed["metadata"]["created"].is_string());
    assert!(parsed["metadata"]["modified"].is_string());
}

#[test]
fn features_are_title_and_values() {
    let mut kernel = MockKernel::new();
    let json = saved(&build_timeline(&mut kernel));

    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    let features = parsed["features"].as_array().unwrap();
    let titles: Vec<&str> = features
        .iter()
        .map(|f| f["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Sketch", "Extrusion", "Fillet"]);

    let extrusion = &features[1];
    assert_eq!(extrusion["component_id"], ROOT.to_string());
    assert_eq!(extrusion["values"]["distance"], 2.5);
    assert_eq!(extrusion["values"]["operation"], "join");
    assert!(extrusion["values"]["profiles"][0]["rings"][0].is_array());
    // Runtime state is not persisted.
    assert!(extrusion.get("error").is_none());
    assert!(extrusion.get("state").is_none());
}

#[test]
fn save_stamps_modification_time() {
    let mut kernel = MockKernel::new();
    let timeline = build_timeline(&mut kernel);
    let mut meta = DocumentMetadata::new("Bracket");
    let created = meta.created;
    save_document(&timeline, &mut meta).unwrap();
    assert!(meta.modified >= created);
    assert_eq!(meta.created, created);
}

// ── Round trip ──────────────────────────────────────────────────────────

#[test]
fn serialize_deserialize_serialize_is_stable() {
    let mut kernel = MockKernel::new();
    let timeline = build_timeline(&mut kernel);
    let document = Document::from_timeline(&timeline, DocumentMetadata::new("Bracket"));

    let first = document.to_json().unwrap();
    let second = parse_document(&first).unwrap().to_json().unwrap();
    assert_eq!(first, second);
}

#[test]
fn parsed_features_keep_ids_and_settings() {
    let mut kernel = MockKernel::new();
    let timeline = build_timeline(&mut kernel);
    let document = parse_document(&saved(&timeline)).unwrap();

    assert_eq!(document.features.len(), 3);
    for (loaded, original) in document.features.iter().zip(timeline.features()) {
        assert_eq!(loaded.id, original.id);
        assert_eq!(loaded.component_id, original.component_id);
        assert_eq!(loaded.kind, original.kind);
        assert_eq!(loaded.state, FeatureState::Incomplete);
        assert!(loaded.error.is_none());
    }
}

#[test]
fn loading_replays_the_timeline() {
    let mut kernel = MockKernel::new();
    let original = build_timeline(&mut kernel);
    let json = saved(&original);

    let mut reload_kernel = MockKernel::new();
    let (loaded, meta) = load_document(&json, &mut reload_kernel).unwrap();

    assert_eq!(meta.name, "Bracket");
    assert_eq!(loaded.len(), 3);
    assert_eq!(loaded.marker(), 3);
    assert!(loaded
        .features()
        .iter()
        .all(|f| f.state == FeatureState::Executed && f.error.is_none()));

    let volume = |k: &MockKernel, t: &Timeline| {
        k.mass_properties(t.top().root().compound.as_ref().unwrap())
            .unwrap()
            .volume
    };
    assert_relative_eq!(
        volume(&reload_kernel, &loaded),
        volume(&kernel, &original),
        epsilon = 1e-9
    );
}

#[test]
fn empty_timeline_round_trips() {
    let mut kernel = MockKernel::new();
    let json = saved(&Timeline::new());
    let (loaded, _) = load_document(&json, &mut kernel).unwrap();
    assert!(loaded.is_empty());
    assert!(loaded.top().root().compound.is_none());
}

// ── Validation and migration ────────────────────────────────────────────

#[test]
fn load_rejects_unknown_format() {
    let err = parse_document(r#"{"format": "other", "version": 2}"#).unwrap_err();
    assert!(matches!(err, LoadError::UnknownFormat(f) if f == "other"));
}

#[test]
fn load_rejects_future_version() {
    let json = format!(r#"{{"format": "{FORMAT_ID}", "version": 99}}"#);
    let err = parse_document(&json).unwrap_err();
    assert!(matches!(
        err,
        LoadError::FutureVersion {
            file_version: 99,
            supported_version: FORMAT_VERSION
        }
    ));
}

#[test]
fn load_rejects_invalid_json() {
    let err = parse_document("not json").unwrap_err();
    assert!(matches!(err, LoadError::Parse(_)));
}

#[test]
fn version_one_documents_are_migrated() {
    let mut kernel = MockKernel::new();
    let timeline = build_timeline(&mut kernel);
    let mut raw: serde_json::Value = serde_json::from_str(&saved(&timeline)).unwrap();

    let obj = raw.as_object_mut().unwrap();
    obj.insert("version".into(), 1.into());
    let meta = obj.remove("metadata").unwrap();
    obj.insert("project".into(), meta);
    for feature in obj["features"].as_array_mut().unwrap() {
        feature.as_object_mut().unwrap().remove("component_id");
    }

    let mut reload_kernel = MockKernel::new();
    let (loaded, meta) = load_document(&raw.to_string(), &mut reload_kernel).unwrap();
    assert_eq!(meta.name, "Bracket");
    assert_eq!(loaded.len(), 3);
    assert!(loaded.features().iter().all(|f| f.component_id == ROOT));
    assert!(loaded.top().root().compound.is_some());
}
