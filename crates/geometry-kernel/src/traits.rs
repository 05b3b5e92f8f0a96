use cad_types::{Axis, Curve2d, Plane, Point2};
use uuid::Uuid;

use crate::types::*;

/// Core geometry kernel trait. Provides all shape construction and
/// modification operations. Every call is synchronous and may fail.
pub trait Kernel {
    /// Build a 3D edge from a sketch curve placed on `plane`. `source` is the
    /// stable id the edge (and anything generated from it) is named after.
    fn make_curve(
        &mut self,
        curve: &Curve2d,
        source: Uuid,
        plane: &Plane,
    ) -> Result<ShapeHandle, KernelError>;

    /// Points where two sketch curves meet.
    fn intersect_curves(&self, a: &Curve2d, b: &Curve2d) -> Vec<Point2>;

    /// Join consecutive edges into a closed wire.
    fn make_wire(&mut self, edges: &[ShapeHandle]) -> Result<ShapeHandle, KernelError>;

    /// Build a planar face bounded by `outer` with `holes` cut out.
    fn make_face(
        &mut self,
        outer: &ShapeHandle,
        holes: &[ShapeHandle],
    ) -> Result<ShapeHandle, KernelError>;

    /// Sweep a face along a vector.
    fn extrude(&mut self, face: &ShapeHandle, vector: [f64; 3]) -> Result<ShapeHandle, KernelError>;

    /// Revolve a face about an axis by `angle` radians.
    fn revolve(
        &mut self,
        face: &ShapeHandle,
        axis: &Axis,
        angle: f64,
    ) -> Result<ShapeHandle, KernelError>;

    fn union(&mut self, a: &ShapeHandle, b: &ShapeHandle) -> Result<ShapeHandle, KernelError>;

    /// Boolean subtraction: a minus b.
    fn subtract(&mut self, a: &ShapeHandle, b: &ShapeHandle) -> Result<ShapeHandle, KernelError>;

    fn intersect(&mut self, a: &ShapeHandle, b: &ShapeHandle) -> Result<ShapeHandle, KernelError>;

    /// Group solids into one compound without fusing them.
    fn combine(&mut self, shapes: &[ShapeHandle]) -> Result<ShapeHandle, KernelError>;

    /// Round the given edges.
    fn fillet(
        &mut self,
        solid: &ShapeHandle,
        edges: &[Uuid],
        radius: f64,
    ) -> Result<ShapeHandle, KernelError>;

    /// Hollow a solid: remove `open_faces` and offset the rest by `distance`.
    fn offset(
        &mut self,
        solid: &ShapeHandle,
        open_faces: &[Uuid],
        distance: f64,
    ) -> Result<ShapeHandle, KernelError>;

    /// Tilt faces by `angle` radians about their intersection with `neutral`.
    fn draft(
        &mut self,
        solid: &ShapeHandle,
        faces: &[Uuid],
        neutral: &Plane,
        angle: f64,
    ) -> Result<ShapeHandle, KernelError>;

    /// Attempt to heal an invalid shape.
    fn fix(&mut self, shape: &ShapeHandle) -> Result<ShapeHandle, KernelError>;
}

/// Topology introspection trait. Provides read-only queries on kernel geometry.
pub trait KernelIntrospect {
    fn list_faces(&self, shape: &ShapeHandle) -> Vec<TopoEntity>;

    fn list_edges(&self, shape: &ShapeHandle) -> Vec<TopoEntity>;

    /// Whether `entity` is the entity a reference recorded as `identity`.
    fn is_same(&self, entity: &TopoEntity, identity: Uuid) -> bool;

    /// The plane of a planar face, `None` for curved faces.
    fn face_plane(&self, face: &TopoEntity) -> Option<Plane>;

    /// The line of a straight edge, `None` for curved edges.
    fn edge_axis(&self, edge: &TopoEntity) -> Option<Axis>;

    fn is_valid(&self, shape: &ShapeHandle) -> bool;

    fn mass_properties(&self, shape: &ShapeHandle) -> Result<MassProperties, KernelError>;

    fn tessellate(&self, shape: &ShapeHandle, tolerance: f64) -> Result<RenderMesh, KernelError>;

    /// Polyline samples of an edge or wire.
    fn tessellate_curve(
        &self,
        shape: &ShapeHandle,
        tolerance: f64,
    ) -> Result<Vec<[f64; 3]>, KernelError>;
}
