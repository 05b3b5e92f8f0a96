//! Helper functions: error type, sketch builders, reference constructors.

use std::f64::consts::TAU;

use cad_types::*;
use feature_engine::EngineError;
use file_format::{LoadError, SaveError};
use geometry_kernel::{KernelError, KernelIntrospect, ShapeHandle};
use sketch_profiles::build_profiles;
use uuid::Uuid;

// ── Error Type ──────────────────────────────────────────────────────────────

/// Unified error type for the test harness.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("feature not found: {name}")]
    FeatureNotFound { name: String },

    #[error("duplicate name: {name}")]
    DuplicateName { name: String },

    #[error("feature {name} is not a sketch")]
    NotASketch { name: String },

    #[error("component {component} has no solid")]
    NoSolid { component: Uuid },

    #[error("no face with normal {normal:?}")]
    NoSuchFace { normal: [f64; 3] },

    #[error("assertion failed: {detail}")]
    AssertionFailed { detail: String },

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),

    #[error("load error: {0}")]
    Load(#[from] LoadError),

    #[error("save error: {0}")]
    Save(#[from] SaveError),
}

// ── Sketch Builders ─────────────────────────────────────────────────────────

/// Four lines bounding an axis-aligned rectangle, counter-clockwise from
/// the lower-left corner.
pub fn rect_elements(x: f64, y: f64, w: f64, h: f64) -> Vec<SketchElement> {
    polygon_elements(&[
        Point2::new(x, y),
        Point2::new(x + w, y),
        Point2::new(x + w, y + h),
        Point2::new(x, y + h),
    ])
}

/// One line per polygon side, closing back to the first corner.
pub fn polygon_elements(corners: &[Point2]) -> Vec<SketchElement> {
    (0..corners.len())
        .map(|i| SketchElement::line(corners[i], corners[(i + 1) % corners.len()]))
        .collect()
}

/// Regular polygon inscribed in a circle.
pub fn regular_polygon(center: Point2, radius: f64, sides: usize) -> Vec<SketchElement> {
    let corners: Vec<Point2> = (0..sides)
        .map(|i| center + Point2::from_angle(TAU * i as f64 / sides as f64) * radius)
        .collect();
    polygon_elements(&corners)
}

pub fn sketch_with(elements: Vec<SketchElement>) -> Sketch {
    let mut sketch = Sketch::new(Uuid::new_v4());
    for element in elements {
        sketch.add(element);
    }
    sketch
}

// ── Reference Constructors ──────────────────────────────────────────────────

/// References to every region of `sketch`, outer boundaries excluded.
pub fn profile_refs(component: Uuid, sketch: &Sketch) -> Vec<ProfileRef> {
    build_profiles(&sketch.elements, false)
        .iter()
        .map(|p| ProfileRef {
            component,
            sketch: sketch.id,
            rings: p.rings(),
        })
        .collect()
}

pub fn fixed_plane(plane: Plane) -> PlanarRef {
    PlanarRef::Fixed { plane }
}

pub fn face_plane_ref(component: Uuid, face: Uuid) -> PlanarRef {
    PlanarRef::Face {
        face: FaceRef { component, face },
    }
}

pub fn face_refs(component: Uuid, faces: &[Uuid]) -> Vec<FaceRef> {
    faces
        .iter()
        .map(|&face| FaceRef { component, face })
        .collect()
}

pub fn edge_refs(component: Uuid, edges: &[Uuid]) -> Vec<EdgeRef> {
    edges
        .iter()
        .map(|&edge| EdgeRef { component, edge })
        .collect()
}

// ── Topology Queries ────────────────────────────────────────────────────────

/// The planar face whose outward normal is closest to `normal`, ties going
/// to the face farthest along it.
pub fn face_by_normal(
    ki: &dyn KernelIntrospect,
    shape: &ShapeHandle,
    normal: [f64; 3],
) -> Option<Uuid> {
    let normal = vnormalize(normal);
    ki.list_faces(shape)
        .iter()
        .filter_map(|f| ki.face_plane(f).map(|p| (f.id, p)))
        .filter(|(_, p)| vdot(p.normal, normal) > 1.0 - 1e-6)
        .max_by(|(_, a), (_, b)| vdot(a.origin, normal).total_cmp(&vdot(b.origin, normal)))
        .map(|(id, _)| id)
}
