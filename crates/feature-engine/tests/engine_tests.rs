use approx::assert_relative_eq;
use cad_types::*;
use feature_engine::*;
use geometry_kernel::{KernelIntrospect, KernelOp, MockKernel};
use modeling_ops::Operation;
use sketch_profiles::{build_profiles, ConstraintSolver, SolveError};
use uuid::Uuid;

const ROOT: Uuid = ComponentTree::ROOT_ID;

fn rect(x0: f64, y0: f64, w: f64, h: f64) -> Vec<SketchElement> {
    let (x1, y1) = (x0 + w, y0 + h);
    vec![
        SketchElement::line(Point2::new(x0, y0), Point2::new(x1, y0)),
        SketchElement::line(Point2::new(x1, y0), Point2::new(x1, y1)),
        SketchElement::line(Point2::new(x1, y1), Point2::new(x0, y1)),
        SketchElement::line(Point2::new(x0, y1), Point2::new(x0, y0)),
    ]
}

fn sketch_of(elements: Vec<SketchElement>) -> Sketch {
    let mut sketch = Sketch::new(Uuid::new_v4());
    for e in elements {
        sketch.add(e);
    }
    sketch
}

fn sketch_feature(component: Uuid, plane: PlanarRef, sketch: Sketch) -> Feature {
    Feature::new(
        component,
        FeatureKind::Sketch(SketchSettings {
            plane: Some(plane),
            sketch,
        }),
    )
}

fn xy() -> PlanarRef {
    PlanarRef::Fixed { plane: Plane::XY }
}

/// References to every region of `sketch`, outer boundaries excluded.
fn profile_refs(component: Uuid, sketch: &Sketch) -> Vec<ProfileRef> {
    build_profiles(&sketch.elements, false)
        .iter()
        .map(|p| ProfileRef {
            component,
            sketch: sketch.id,
            rings: p.rings(),
        })
        .collect()
}

fn extrusion(profiles: Vec<ProfileRef>, distance: f64, operation: Operation) -> Feature {
    Feature::new(
        ROOT,
        FeatureKind::Extrusion(ExtrusionSettings {
            profiles,
            axis: None,
            distance,
            side: true,
            symmetric: false,
            operation,
        }),
    )
}

fn volume(kernel: &MockKernel, tree: &ComponentTree) -> f64 {
    tree.root()
        .compound
        .as_ref()
        .map_or(0.0, |c| kernel.mass_properties(c).unwrap().volume)
}

/// A timeline holding a 4x4 square sketch extruded by 4.
fn box_timeline(kernel: &mut MockKernel) -> (Timeline, Uuid, Uuid) {
    let mut timeline = Timeline::new();
    let sketch = sketch_of(rect(0.0, 0.0, 4.0, 4.0));
    let refs = profile_refs(ROOT, &sketch);
    let sketch_feature = sketch_feature(ROOT, xy(), sketch);
    let sketch_id = sketch_feature.id;
    timeline.insert_feature(sketch_feature, kernel);
    let extrude = extrusion(refs, 4.0, Operation::Join);
    let extrude_id = extrude.id;
    timeline.insert_feature(extrude, kernel);
    (timeline, sketch_id, extrude_id)
}

fn top_face(kernel: &MockKernel, tree: &ComponentTree) -> Uuid {
    let compound = tree.root().compound.as_ref().unwrap();
    kernel
        .list_faces(compound)
        .into_iter()
        .find(|f| {
            kernel
                .face_plane(f)
                .is_some_and(|p| p.normal[2] > 0.99 && p.origin[2] > 0.0)
        })
        .unwrap()
        .id
}

fn sketch_settings(timeline: &Timeline, id: Uuid) -> SketchSettings {
    match &timeline.feature(id).unwrap().kind {
        FeatureKind::Sketch(s) => s.clone(),
        other => panic!("expected a sketch, got {}", other.title()),
    }
}

// ── Recompute ───────────────────────────────────────────────────────────────

#[test]
fn extruded_square_builds_a_box() {
    let mut kernel = MockKernel::new();
    let (timeline, _, extrude) = box_timeline(&mut kernel);

    assert_eq!(timeline.len(), 2);
    assert_eq!(timeline.marker(), 2);
    assert_eq!(timeline.feature(extrude).unwrap().state, FeatureState::Executed);
    assert_relative_eq!(volume(&kernel, timeline.top()), 64.0, epsilon = 1e-9);
    assert_eq!(timeline.top().root().sketches.len(), 1);
}

#[test]
fn symmetric_extrusion_straddles_the_sketch_plane() {
    let mut kernel = MockKernel::new();
    let (mut timeline, _, extrude) = box_timeline(&mut kernel);
    let mut settings = match &timeline.feature(extrude).unwrap().kind {
        FeatureKind::Extrusion(s) => s.clone(),
        other => panic!("expected an extrusion, got {}", other.title()),
    };
    settings.symmetric = true;
    settings.side = false;

    timeline
        .update_feature(extrude, FeatureKind::Extrusion(settings), &mut kernel)
        .unwrap();

    assert_eq!(timeline.feature(extrude).unwrap().state, FeatureState::Executed);
    let compound = timeline.top().root().compound.clone().unwrap();
    let props = kernel.mass_properties(&compound).unwrap();
    assert_relative_eq!(props.volume, 64.0, epsilon = 1e-9);
    assert_relative_eq!(props.centroid[2], 0.0, epsilon = 1e-9);
}

#[test]
fn evaluate_twice_changes_nothing() {
    let mut kernel = MockKernel::new();
    let (mut timeline, _, _) = box_timeline(&mut kernel);
    let before = timeline.top().clone();
    let extrudes = kernel.call_count(KernelOp::Extrude);

    assert!(timeline.evaluate(&mut kernel).is_empty());
    assert!(ComponentTree::ptr_eq(&before, timeline.top()));
    assert_eq!(kernel.call_count(KernelOp::Extrude), extrudes);
}

#[test]
fn insert_leaves_earlier_snapshots_untouched() {
    let mut kernel = MockKernel::new();
    let (mut timeline, _, _) = box_timeline(&mut kernel);
    let earlier: Vec<ComponentTree> = (0..=2).map(|i| timeline.tree_at(i).unwrap().clone()).collect();

    let sketch = sketch_of(rect(10.0, 0.0, 1.0, 1.0));
    let refs = profile_refs(ROOT, &sketch);
    timeline.insert_feature(sketch_feature(ROOT, xy(), sketch), &mut kernel);
    timeline.insert_feature(extrusion(refs, 1.0, Operation::Join), &mut kernel);

    for (i, tree) in earlier.iter().enumerate() {
        assert!(ComponentTree::ptr_eq(tree, timeline.tree_at(i).unwrap()), "slot {i}");
    }
    assert!(!ComponentTree::ptr_eq(&earlier[2], timeline.tree_at(4).unwrap()));
    assert_relative_eq!(volume(&kernel, timeline.top()), 65.0, epsilon = 1e-9);
}

#[test]
fn insert_in_the_middle_recomputes_only_up_to_the_marker() {
    let mut kernel = MockKernel::new();
    let (mut timeline, _, _) = box_timeline(&mut kernel);
    timeline.move_marker(1, &mut kernel).unwrap();
    let slot0 = timeline.tree_at(0).unwrap().clone();
    let slot1 = timeline.tree_at(1).unwrap().clone();
    let extrudes = kernel.call_count(KernelOp::Extrude);

    let component = Uuid::new_v4();
    timeline.insert_feature(
        Feature::new(
            ROOT,
            FeatureKind::NewComponent(NewComponentSettings {
                component,
                name: "Part".into(),
            }),
        ),
        &mut kernel,
    );

    assert_eq!(timeline.marker(), 2);
    assert_eq!(timeline.invalidation_index(), 2);
    assert!(ComponentTree::ptr_eq(&slot0, timeline.tree_at(0).unwrap()));
    assert!(ComponentTree::ptr_eq(&slot1, timeline.tree_at(1).unwrap()));
    assert!(timeline.top().find(component).is_some());
    // The extrusion now sits past the marker and has not run again.
    assert_eq!(kernel.call_count(KernelOp::Extrude), extrudes);

    let final_tree = timeline.final_tree(&mut kernel).clone();
    assert!(final_tree.find(component).is_some());
    assert_relative_eq!(volume(&kernel, &final_tree), 64.0, epsilon = 1e-9);
    assert_eq!(timeline.marker(), 2);
}

#[test]
fn incomplete_feature_is_skipped() {
    let mut kernel = MockKernel::new();
    let (mut timeline, _, _) = box_timeline(&mut kernel);
    let before = timeline.top().clone();

    let changed = timeline.insert_feature(extrusion(Vec::new(), 2.0, Operation::Join), &mut kernel);

    let feature = &timeline.features()[2];
    assert_eq!(feature.state, FeatureState::Incomplete);
    assert!(feature.error.is_none());
    assert!(changed.is_empty());
    assert!(ComponentTree::ptr_eq(&before, timeline.top()));
}

// ── Marker ──────────────────────────────────────────────────────────────────

#[test]
fn moving_the_marker_back_and_forth_reuses_snapshots() {
    let mut kernel = MockKernel::new();
    let (mut timeline, _, _) = box_timeline(&mut kernel);
    let full = timeline.top().clone();

    let changed = timeline.move_marker(1, &mut kernel).unwrap();
    assert_eq!(changed, vec![ROOT]);
    assert!(timeline.top().root().compound.is_none());

    let extrudes = kernel.call_count(KernelOp::Extrude);
    let changed = timeline.move_marker(2, &mut kernel).unwrap();
    assert_eq!(changed, vec![ROOT]);
    assert!(ComponentTree::ptr_eq(&full, timeline.top()));
    assert_eq!(kernel.call_count(KernelOp::Extrude), extrudes);
}

#[test]
fn marker_past_the_end_is_rejected() {
    let mut kernel = MockKernel::new();
    let (mut timeline, _, _) = box_timeline(&mut kernel);
    let err = timeline.move_marker(3, &mut kernel).unwrap_err();
    assert_eq!(err, EngineError::MarkerOutOfRange { marker: 3, len: 2 });
}

#[test]
fn removing_a_feature_before_the_marker_shifts_it() {
    let mut kernel = MockKernel::new();
    let (mut timeline, _, extrude) = box_timeline(&mut kernel);

    let changed = timeline.remove_feature(extrude, &mut kernel).unwrap();

    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline.marker(), 1);
    assert_eq!(changed, vec![ROOT]);
    assert!(timeline.top().root().compound.is_none());
    assert!(timeline.tree_at(2).is_none());
}

#[test]
fn removing_an_unknown_feature_fails() {
    let mut kernel = MockKernel::new();
    let (mut timeline, _, _) = box_timeline(&mut kernel);
    let id = Uuid::new_v4();
    let err = timeline.remove_feature(id, &mut kernel).unwrap_err();
    assert_eq!(err, EngineError::FeatureNotFound { id });
    assert_eq!(timeline.len(), 2);
}

// ── Failure isolation ───────────────────────────────────────────────────────

#[test]
fn deleting_a_profile_curve_rolls_the_extrusion_back() {
    let mut kernel = MockKernel::new();
    let (mut timeline, sketch_id, extrude) = box_timeline(&mut kernel);

    let mut settings = sketch_settings(&timeline, sketch_id);
    let first = settings.sketch.elements[0].id();
    settings.sketch.remove(first);
    timeline
        .update_feature(sketch_id, FeatureKind::Sketch(settings), &mut kernel)
        .unwrap();

    let feature = timeline.feature(extrude).unwrap();
    assert_eq!(feature.state, FeatureState::Errored);
    assert_eq!(feature.error, Some(FeatureError::error("Profile was lost")));
    assert!(timeline.top().root().compound.is_none());
    assert!(ComponentTree::ptr_eq(
        timeline.tree_at(1).unwrap(),
        timeline.tree_at(2).unwrap()
    ));
}

#[test]
fn failing_step_does_not_stop_later_steps() {
    let mut kernel = MockKernel::new();
    let (mut timeline, sketch_id, _) = box_timeline(&mut kernel);
    let refs = profile_refs(ROOT, &sketch_settings(&timeline, sketch_id).sketch);

    timeline.insert_feature(extrusion(refs.clone(), 0.0, Operation::Join), &mut kernel);
    timeline.insert_feature(extrusion(refs, -2.0, Operation::Join), &mut kernel);

    let zero = &timeline.features()[2];
    assert!(zero.is_errored());
    assert_eq!(zero.error.as_ref().unwrap().message, "Extrusion has no volume");
    assert!(ComponentTree::ptr_eq(
        timeline.tree_at(2).unwrap(),
        timeline.tree_at(3).unwrap()
    ));
    assert_eq!(timeline.features()[3].state, FeatureState::Executed);
    assert_relative_eq!(volume(&kernel, timeline.top()), 96.0, epsilon = 1e-9);
}

#[test]
fn kernel_failure_becomes_a_feature_error() {
    let mut kernel = MockKernel::new();
    kernel.fail_on(KernelOp::Extrude);
    let (timeline, _, extrude) = box_timeline(&mut kernel);

    let feature = timeline.feature(extrude).unwrap();
    assert!(feature.is_errored());
    assert!(feature.error.as_ref().unwrap().message.starts_with("kernel error"));
    assert!(timeline.top().root().compound.is_none());
}

#[test]
fn cut_without_a_body_is_an_error() {
    let mut kernel = MockKernel::new();
    let mut timeline = Timeline::new();
    let sketch = sketch_of(rect(0.0, 0.0, 1.0, 1.0));
    let refs = profile_refs(ROOT, &sketch);
    timeline.insert_feature(sketch_feature(ROOT, xy(), sketch), &mut kernel);
    timeline.insert_feature(extrusion(refs, 1.0, Operation::Cut), &mut kernel);

    let feature = &timeline.features()[1];
    assert!(feature.is_errored());
    assert_eq!(
        feature.error.as_ref().unwrap().message,
        "nothing to cut: component has no body"
    );
}

// ── Reference resolution ────────────────────────────────────────────────────

#[test]
fn losing_one_of_two_profiles_is_a_warning() {
    let mut kernel = MockKernel::new();
    let mut timeline = Timeline::new();
    let mut elements = rect(0.0, 0.0, 2.0, 2.0);
    elements.extend(rect(5.0, 0.0, 2.0, 2.0));
    let sketch = sketch_of(elements);
    let refs = profile_refs(ROOT, &sketch);
    assert_eq!(refs.len(), 2);
    let sketch_f = sketch_feature(ROOT, xy(), sketch);
    let sketch_id = sketch_f.id;
    timeline.insert_feature(sketch_f, &mut kernel);
    let extrude = extrusion(refs, 1.0, Operation::Join);
    let extrude_id = extrude.id;
    timeline.insert_feature(extrude, &mut kernel);
    assert_relative_eq!(volume(&kernel, timeline.top()), 8.0, epsilon = 1e-9);

    let mut settings = sketch_settings(&timeline, sketch_id);
    let right_side = settings.sketch.elements[5].id();
    settings.sketch.remove(right_side);
    timeline
        .update_feature(sketch_id, FeatureKind::Sketch(settings), &mut kernel)
        .unwrap();

    let feature = timeline.feature(extrude_id).unwrap();
    assert_eq!(feature.state, FeatureState::Executed);
    assert_eq!(feature.error, Some(FeatureError::warning("Profile was lost")));
    assert_relative_eq!(volume(&kernel, timeline.top()), 4.0, epsilon = 1e-9);

    timeline.repair_feature(extrude_id, &mut kernel).unwrap();
    let feature = timeline.feature(extrude_id).unwrap();
    assert!(feature.error.is_none());
    match &feature.kind {
        FeatureKind::Extrusion(s) => assert_eq!(s.profiles.len(), 1),
        other => panic!("unexpected {}", other.title()),
    }
}

#[test]
fn split_profile_is_repaired_with_a_warning() {
    let mut kernel = MockKernel::new();
    let (mut timeline, sketch_id, extrude) = box_timeline(&mut kernel);

    let mut settings = sketch_settings(&timeline, sketch_id);
    settings
        .sketch
        .add(SketchElement::line(Point2::new(0.0, 0.0), Point2::new(4.0, 4.0)));
    timeline
        .update_feature(sketch_id, FeatureKind::Sketch(settings), &mut kernel)
        .unwrap();

    let feature = timeline.feature(extrude).unwrap();
    assert_eq!(feature.state, FeatureState::Executed);
    assert_eq!(
        feature.error,
        Some(FeatureError::warning("Profile has been repaired"))
    );
    assert_relative_eq!(volume(&kernel, timeline.top()), 32.0, epsilon = 1e-9);
}

#[test]
fn repair_after_total_loss_leaves_an_incomplete_feature() {
    let mut kernel = MockKernel::new();
    let (mut timeline, sketch_id, extrude) = box_timeline(&mut kernel);
    let mut settings = sketch_settings(&timeline, sketch_id);
    settings.sketch.elements.truncate(2);
    timeline
        .update_feature(sketch_id, FeatureKind::Sketch(settings), &mut kernel)
        .unwrap();
    assert!(timeline.feature(extrude).unwrap().is_errored());

    timeline.repair_feature(extrude, &mut kernel).unwrap();

    let feature = timeline.feature(extrude).unwrap();
    assert_eq!(feature.state, FeatureState::Incomplete);
    assert!(feature.error.is_none());
}

#[test]
fn sketch_on_a_face_follows_the_face() {
    let mut kernel = MockKernel::new();
    let (mut timeline, _, extrude) = box_timeline(&mut kernel);
    let face = top_face(&kernel, timeline.top());

    let sketch = sketch_of(rect(1.0, 1.0, 1.0, 1.0));
    let on_face = sketch_feature(
        ROOT,
        PlanarRef::Face {
            face: FaceRef {
                component: ROOT,
                face,
            },
        },
        sketch.clone(),
    );
    let on_face_id = on_face.id;
    timeline.insert_feature(on_face, &mut kernel);

    let placed = timeline.top().root().sketch(sketch.id).unwrap();
    assert_relative_eq!(placed.workplane.origin[2], 4.0, epsilon = 1e-9);

    timeline.remove_feature(extrude, &mut kernel).unwrap();
    let feature = timeline.feature(on_face_id).unwrap();
    assert_eq!(feature.error, Some(FeatureError::error("Sketch plane was lost")));
    assert!(timeline.top().root().sketch(sketch.id).is_none());
}

#[test]
fn fillet_and_shell_pick_entities_by_identity() {
    let mut kernel = MockKernel::new();
    let (mut timeline, _, _) = box_timeline(&mut kernel);
    let compound = timeline.top().root().compound.clone().unwrap();
    let edge = kernel.list_edges(&compound)[0].id;
    let face = top_face(&kernel, timeline.top());

    let fillet = Feature::new(
        ROOT,
        FeatureKind::Fillet(FilletSettings {
            edges: vec![
                EdgeRef {
                    component: ROOT,
                    edge,
                },
                EdgeRef {
                    component: ROOT,
                    edge: Uuid::new_v4(),
                },
            ],
            radius: 0.5,
        }),
    );
    timeline.insert_feature(fillet, &mut kernel);
    let fillet = &timeline.features()[2];
    assert_eq!(fillet.state, FeatureState::Executed);
    assert_eq!(fillet.error, Some(FeatureError::warning("Edge reference was lost")));
    assert!(volume(&kernel, timeline.top()) < 64.0);

    let shell = Feature::new(
        ROOT,
        FeatureKind::Shell(ShellSettings {
            faces: vec![FaceRef {
                component: ROOT,
                face,
            }],
            distance: 0.5,
            side: true,
        }),
    );
    timeline.insert_feature(shell, &mut kernel);
    let shell = &timeline.features()[3];
    assert_eq!(shell.state, FeatureState::Executed);
    assert!(shell.error.is_none());
    let faces = kernel.list_faces(timeline.top().root().compound.as_ref().unwrap());
    assert!(faces.iter().all(|f| f.id != face));
}

#[test]
fn split_ring_resolves_to_the_later_of_equal_matches() {
    let mut kernel = MockKernel::new();
    let mut elements = rect(0.0, 0.0, 4.0, 4.0);
    let ring = elements.iter().map(|e| e.id()).collect::<std::collections::BTreeSet<_>>();
    elements.push(SketchElement::line(Point2::new(2.0, 0.0), Point2::new(2.0, 4.0)));
    let sketch = sketch_of(elements);
    let sketch_id = sketch.id;
    let wires = sketch_profiles::build_wires_with(&sketch.elements, false, &Tolerance::default());
    let mut timeline = Timeline::new();
    timeline.insert_feature(sketch_feature(ROOT, xy(), sketch), &mut kernel);

    let overlaps: Vec<usize> = wires
        .iter()
        .map(|w| w.element_ids().intersection(&ring).count())
        .collect();
    assert_eq!(overlaps, vec![3, 3]);

    let reference = ProfileRef {
        component: ROOT,
        sketch: sketch_id,
        rings: vec![ring],
    };
    let resolution = resolve::resolve_profile(&reference, timeline.top(), &Tolerance::default());
    assert!(matches!(resolution, Resolution::Repaired(_)));
    let resolved = resolution.value().unwrap();
    assert_eq!(resolved.profile.outer.element_ids(), wires[1].element_ids());
}

#[test]
fn draft_with_a_lost_neutral_plane_is_rolled_back() {
    let mut kernel = MockKernel::new();
    let (mut timeline, _, _) = box_timeline(&mut kernel);
    let before = timeline.top().clone();
    let compound = before.root().compound.clone().unwrap();
    let side = kernel
        .list_faces(&compound)
        .into_iter()
        .find(|f| kernel.face_plane(f).is_some_and(|p| p.normal[0] > 0.99))
        .unwrap()
        .id;

    timeline.insert_feature(
        Feature::new(
            ROOT,
            FeatureKind::Draft(DraftSettings {
                plane: Some(PlanarRef::Face {
                    face: FaceRef {
                        component: ROOT,
                        face: Uuid::new_v4(),
                    },
                }),
                faces: vec![FaceRef {
                    component: ROOT,
                    face: side,
                }],
                angle: 5.0,
            }),
        ),
        &mut kernel,
    );

    let draft = &timeline.features()[2];
    assert_eq!(draft.state, FeatureState::Errored);
    assert_eq!(draft.error, Some(FeatureError::error("Reference plane was lost")));
    assert!(ComponentTree::ptr_eq(&before, timeline.top()));
}

#[test]
fn revolution_about_a_sketch_line() {
    let mut kernel = MockKernel::new();
    let mut timeline = Timeline::new();
    let mut sketch = sketch_of(rect(1.0, 0.0, 1.0, 1.0));
    let axis_line = sketch.add(
        SketchElement::line(Point2::new(0.0, 0.0), Point2::new(0.0, 1.0)).as_construction(),
    );
    let refs = profile_refs(ROOT, &sketch);
    let axis = AxialRef::Curve {
        curve: CurveRef {
            component: ROOT,
            sketch: sketch.id,
            element: axis_line,
        },
    };
    timeline.insert_feature(sketch_feature(ROOT, xy(), sketch), &mut kernel);
    timeline.insert_feature(
        Feature::new(
            ROOT,
            FeatureKind::Revolution(RevolutionSettings {
                profiles: refs,
                axis: Some(axis),
                angle: 360.0,
                side: true,
                operation: Operation::Join,
            }),
        ),
        &mut kernel,
    );

    assert_eq!(timeline.features()[1].state, FeatureState::Executed);
    assert!(volume(&kernel, timeline.top()) > 0.0);

    let sketch_id = timeline.features()[0].id;
    let mut settings = match &timeline.features()[0].kind {
        FeatureKind::Sketch(s) => s.clone(),
        _ => unreachable!(),
    };
    settings.sketch.remove(axis_line);
    timeline
        .update_feature(sketch_id, FeatureKind::Sketch(settings), &mut kernel)
        .unwrap();

    let revolution = &timeline.features()[1];
    assert_eq!(revolution.state, FeatureState::Errored);
    assert_eq!(
        revolution.error,
        Some(FeatureError::error("Curve reference was lost"))
    );
    assert!(timeline.top().root().compound.is_none());
}

// ── Changed components ──────────────────────────────────────────────────────

#[test]
fn changes_are_reported_per_component() {
    let mut kernel = MockKernel::new();
    let mut timeline = Timeline::new();
    let part = Uuid::new_v4();

    let changed = timeline.insert_feature(
        Feature::new(
            ROOT,
            FeatureKind::NewComponent(NewComponentSettings {
                component: part,
                name: "Part".into(),
            }),
        ),
        &mut kernel,
    );
    assert_eq!(changed, vec![ROOT]);

    let sketch = sketch_of(rect(0.0, 0.0, 1.0, 1.0));
    let refs = profile_refs(part, &sketch);
    let changed = timeline.insert_feature(sketch_feature(part, xy(), sketch), &mut kernel);
    assert_eq!(changed, vec![part]);

    let changed = timeline.insert_feature(extrusion_in(part, refs), &mut kernel);
    assert_eq!(changed, vec![part]);
    assert!(timeline.top().root().compound.is_none());
    assert!(timeline.top().find(part).unwrap().compound.is_some());
}

fn extrusion_in(component: Uuid, profiles: Vec<ProfileRef>) -> Feature {
    Feature {
        component_id: component,
        ..extrusion(profiles, 1.0, Operation::Join)
    }
}

#[test]
fn duplicate_component_is_an_error() {
    let mut kernel = MockKernel::new();
    let mut timeline = Timeline::new();
    let part = Uuid::new_v4();
    let new_part = || {
        Feature::new(
            ROOT,
            FeatureKind::NewComponent(NewComponentSettings {
                component: part,
                name: "Part".into(),
            }),
        )
    };
    timeline.insert_feature(new_part(), &mut kernel);
    let changed = timeline.insert_feature(new_part(), &mut kernel);

    assert!(changed.is_empty());
    assert!(timeline.features()[1].is_errored());
    assert_eq!(timeline.top().root().children.len(), 1);
}

// ── Sketch editing ──────────────────────────────────────────────────────────

#[test]
fn dragging_defers_recompute_until_commit() {
    let mut kernel = MockKernel::new();
    let mut timeline = Timeline::new();
    let sketch = sketch_of(vec![SketchElement::circle(Point2::new(0.0, 0.0), 1.0)]);
    let circle = sketch.elements[0].id();
    let refs = profile_refs(ROOT, &sketch);
    let sketch_f = sketch_feature(ROOT, xy(), sketch);
    let sketch_id = sketch_f.id;
    timeline.insert_feature(sketch_f, &mut kernel);
    timeline.insert_feature(extrusion(refs, 1.0, Operation::Join), &mut kernel);
    let before = timeline.top().clone();
    let small = volume(&kernel, &before);

    let polyline = timeline
        .drag_sketch_handle(sketch_id, circle, 1, Point2::new(2.0, 0.0))
        .unwrap();
    assert!(polyline.len() > 2);
    assert!(polyline.iter().all(|p| (p.length() - 2.0).abs() < 1e-9));
    assert!(ComponentTree::ptr_eq(&before, timeline.top()));
    assert_eq!(timeline.invalidation_index(), 2);

    let changed = timeline.commit_drag(sketch_id, &mut kernel).unwrap();
    assert_eq!(changed, vec![ROOT]);
    assert_relative_eq!(volume(&kernel, timeline.top()), small * 4.0, max_relative = 1e-9);
    assert!(timeline.features()[1].error.is_none());
}

#[test]
fn dragging_rejects_bad_targets() {
    let mut kernel = MockKernel::new();
    let (mut timeline, sketch_id, extrude) = box_timeline(&mut kernel);
    let line = sketch_settings(&timeline, sketch_id).sketch.elements[0].id();
    let p = Point2::new(0.0, 0.0);

    assert_eq!(
        timeline.drag_sketch_handle(extrude, line, 0, p),
        Err(EngineError::NotASketch { id: extrude })
    );
    let missing = Uuid::new_v4();
    assert_eq!(
        timeline.drag_sketch_handle(sketch_id, missing, 0, p),
        Err(EngineError::ElementNotFound { id: missing })
    );
    assert_eq!(
        timeline.drag_sketch_handle(sketch_id, line, 2, p),
        Err(EngineError::UnknownHandle {
            element: line,
            handle: 2
        })
    );
}

struct MoveRim {
    circle: Uuid,
    to: Point2,
}

impl ConstraintSolver for MoveRim {
    fn solve(&mut self, _sketch: &Sketch) -> Result<Vec<(ElementPoint, Point2)>, SolveError> {
        Ok(vec![(
            ElementPoint {
                element: self.circle,
                handle: 1,
            },
            self.to,
        )])
    }
}

#[test]
fn solved_sketch_is_recomputed() {
    let mut kernel = MockKernel::new();
    let mut timeline = Timeline::new();
    let sketch = sketch_of(vec![SketchElement::circle(Point2::new(0.0, 0.0), 1.0)]);
    let circle = sketch.elements[0].id();
    let sketch_f = sketch_feature(ROOT, xy(), sketch);
    let sketch_id = sketch_f.id;
    timeline.insert_feature(sketch_f, &mut kernel);

    let mut solver = MoveRim {
        circle,
        to: Point2::new(0.0, 3.0),
    };
    let changed = timeline
        .solve_sketch(sketch_id, &mut solver, &mut kernel)
        .unwrap();

    assert_eq!(changed, vec![ROOT]);
    let placed = timeline.top().root().sketch(sketch_settings(&timeline, sketch_id).sketch.id).unwrap();
    match placed.element(circle).unwrap() {
        SketchElement::Circle { radius, .. } => assert_relative_eq!(*radius, 3.0),
        other => panic!("unexpected element {other:?}"),
    }
}
