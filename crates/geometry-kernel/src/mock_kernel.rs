//! MockKernel: deterministic test double implementing Kernel + KernelIntrospect.
//!
//! Models solids as bounding boxes with named faces and edges. Entity ids are
//! UUID v5 names derived from the originating edge ids and the operation that
//! produced them, so the same input always yields the same identities across
//! recomputes and reloads. Volumes are rough estimates only.

use std::collections::{HashMap, HashSet};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, TAU};

use cad_types::geom2d::{centroid, signed_area};
use cad_types::*;
use tracing::debug;
use uuid::Uuid;

use crate::traits::{Kernel, KernelIntrospect};
use crate::types::*;

/// Kernel operations that can be made to fail on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelOp {
    MakeCurve,
    MakeWire,
    MakeFace,
    Extrude,
    Revolve,
    Union,
    Subtract,
    Intersect,
    Combine,
    Fillet,
    Offset,
    Draft,
    Fix,
}

/// Name an entity after its origin and the role it plays in an operation.
fn derive_id(origin: Uuid, role: &str) -> Uuid {
    Uuid::new_v5(&origin, role.as_bytes())
}

#[derive(Debug, Clone)]
struct MockEdge {
    id: Uuid,
    curve: Curve2d,
    plane: Plane,
}

impl MockEdge {
    fn start(&self) -> [f64; 3] {
        self.plane.to_world(self.curve.start())
    }

    fn end(&self) -> [f64; 3] {
        self.plane.to_world(self.curve.end())
    }

    fn axis(&self) -> Option<Axis> {
        match self.curve {
            Curve2d::Line { start, end } => Some(Axis {
                origin: self.plane.to_world(start),
                direction: vnormalize(self.plane.dir_to_world(end - start)),
            }),
            _ => None,
        }
    }

    fn points(&self, chords: usize) -> Vec<[f64; 3]> {
        self.curve
            .sample(chords)
            .into_iter()
            .map(|p| self.plane.to_world(p))
            .collect()
    }
}

#[derive(Debug, Clone)]
struct MockFace {
    id: Uuid,
    plane: Plane,
    boundary: Vec<MockEdge>,
    area: f64,
    centroid: Point2,
}

#[derive(Debug, Clone)]
struct FaceRecord {
    id: Uuid,
    plane: Option<Plane>,
    area: f64,
}

#[derive(Debug, Clone)]
struct EdgeRecord {
    id: Uuid,
    axis: Option<Axis>,
    length: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    min: [f64; 3],
    max: [f64; 3],
}

impl Bounds {
    fn from_points(points: &[[f64; 3]]) -> Self {
        let mut b = Bounds {
            min: [f64::INFINITY; 3],
            max: [f64::NEG_INFINITY; 3],
        };
        for p in points {
            for i in 0..3 {
                b.min[i] = b.min[i].min(p[i]);
                b.max[i] = b.max[i].max(p[i]);
            }
        }
        b
    }

    fn union(&self, other: &Bounds) -> Bounds {
        let mut b = *self;
        for i in 0..3 {
            b.min[i] = b.min[i].min(other.min[i]);
            b.max[i] = b.max[i].max(other.max[i]);
        }
        b
    }

    fn intersection(&self, other: &Bounds) -> Option<Bounds> {
        let mut b = *self;
        for i in 0..3 {
            b.min[i] = b.min[i].max(other.min[i]);
            b.max[i] = b.max[i].min(other.max[i]);
            if b.max[i] <= b.min[i] {
                return None;
            }
        }
        Some(b)
    }

    fn extents(&self) -> [f64; 3] {
        vsub(self.max, self.min)
    }

    fn volume(&self) -> f64 {
        let e = self.extents();
        e[0].max(0.0) * e[1].max(0.0) * e[2].max(0.0)
    }

    fn center(&self) -> [f64; 3] {
        vscale(vadd(self.min, self.max), 0.5)
    }

    /// Smallest extent, ignoring flat directions.
    fn thickness(&self) -> f64 {
        self.extents()
            .into_iter()
            .filter(|e| *e > 1e-9)
            .fold(f64::INFINITY, f64::min)
    }

    fn expanded(&self, by: f64) -> Bounds {
        Bounds {
            min: vsub(self.min, [by; 3]),
            max: vadd(self.max, [by; 3]),
        }
    }
}

#[derive(Debug, Clone)]
struct MockSolid {
    faces: Vec<FaceRecord>,
    edges: Vec<EdgeRecord>,
    volume: f64,
    bounds: Bounds,
}

impl MockSolid {
    fn face(&self, id: Uuid) -> Option<&FaceRecord> {
        self.faces.iter().find(|f| f.id == id)
    }

    fn edge(&self, id: Uuid) -> Option<&EdgeRecord> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// Add the other solid's faces and edges, skipping identities already present.
    fn absorb(&mut self, other: &MockSolid) {
        let face_ids: HashSet<Uuid> = self.faces.iter().map(|f| f.id).collect();
        let edge_ids: HashSet<Uuid> = self.edges.iter().map(|e| e.id).collect();
        self.faces.extend(
            other
                .faces
                .iter()
                .filter(|f| !face_ids.contains(&f.id))
                .cloned(),
        );
        self.edges.extend(
            other
                .edges
                .iter()
                .filter(|e| !edge_ids.contains(&e.id))
                .cloned(),
        );
    }

    fn surface_area(&self) -> f64 {
        self.faces.iter().map(|f| f.area).sum()
    }
}

#[derive(Debug, Clone)]
enum MockShape {
    Edge(MockEdge),
    Wire(Vec<MockEdge>),
    Face(MockFace),
    Solid(MockSolid),
}

/// Deterministic test double for the geometry kernel.
/// Implements both Kernel and KernelIntrospect.
pub struct MockKernel {
    tolerance: Tolerance,
    failures: HashSet<KernelOp>,
    calls: HashMap<KernelOp, usize>,
}

impl MockKernel {
    pub fn new() -> Self {
        Self {
            tolerance: Tolerance::default(),
            failures: HashSet::new(),
            calls: HashMap::new(),
        }
    }

    /// Make every later call of `op` fail until [`clear_failures`](Self::clear_failures).
    pub fn fail_on(&mut self, op: KernelOp) {
        self.failures.insert(op);
    }

    pub fn clear_failures(&mut self) {
        self.failures.clear();
    }

    /// How many times `op` has been invoked, including failed calls.
    pub fn call_count(&self, op: KernelOp) -> usize {
        self.calls.get(&op).copied().unwrap_or(0)
    }

    fn enter(&mut self, op: KernelOp) -> Result<(), KernelError> {
        *self.calls.entry(op).or_insert(0) += 1;
        if self.failures.contains(&op) {
            debug!(?op, "mock kernel injected failure");
            return Err(KernelError::Other {
                message: format!("injected failure in {:?}", op),
            });
        }
        Ok(())
    }

    fn shape<'a>(&self, handle: &'a ShapeHandle) -> Result<&'a MockShape, KernelError> {
        handle.downcast::<MockShape>().ok_or_else(|| KernelError::InvalidShape {
            reason: "handle was not created by this kernel".into(),
        })
    }

    fn solid<'a>(&self, handle: &'a ShapeHandle) -> Result<&'a MockSolid, KernelError> {
        match self.shape(handle)? {
            MockShape::Solid(s) => Ok(s),
            _ => Err(KernelError::InvalidShape {
                reason: "expected a solid".into(),
            }),
        }
    }

    fn face<'a>(&self, handle: &'a ShapeHandle) -> Result<&'a MockFace, KernelError> {
        match self.shape(handle)? {
            MockShape::Face(f) => Ok(f),
            _ => Err(KernelError::InvalidShape {
                reason: "expected a face".into(),
            }),
        }
    }

    fn wire_edges(&self, handle: &ShapeHandle) -> Result<Vec<MockEdge>, KernelError> {
        match self.shape(handle)? {
            MockShape::Wire(edges) => Ok(edges.clone()),
            _ => Err(KernelError::InvalidWire {
                reason: "expected a wire".into(),
            }),
        }
    }

    fn wire_polygon(&self, edges: &[MockEdge]) -> Vec<Point2> {
        let mut points = Vec::new();
        for edge in edges {
            let samples = edge.curve.sample(self.tolerance.samples_per_curve);
            points.extend_from_slice(&samples[..samples.len() - 1]);
        }
        points
    }

    fn boundary_points(&self, face: &MockFace) -> Vec<[f64; 3]> {
        face.boundary
            .iter()
            .flat_map(|e| e.points(self.tolerance.samples_per_curve))
            .collect()
    }

    fn find_face_record<'a>(solid: &'a MockSolid, id: Uuid) -> Result<&'a FaceRecord, KernelError> {
        solid.face(id).ok_or(KernelError::EntityNotFound { id })
    }
}

impl Default for MockKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl Kernel for MockKernel {
    fn make_curve(
        &mut self,
        curve: &Curve2d,
        source: Uuid,
        plane: &Plane,
    ) -> Result<ShapeHandle, KernelError> {
        self.enter(KernelOp::MakeCurve)?;
        if self.tolerance.is_zero_length(curve.length()) {
            return Err(KernelError::InvalidParameter {
                reason: "curve has zero length".into(),
            });
        }
        Ok(ShapeHandle::new(MockShape::Edge(MockEdge {
            id: source,
            curve: *curve,
            plane: *plane,
        })))
    }

    fn intersect_curves(&self, a: &Curve2d, b: &Curve2d) -> Vec<Point2> {
        a.intersect(b, &self.tolerance)
            .into_iter()
            .map(|(t, _)| a.point_at(t))
            .collect()
    }

    fn make_wire(&mut self, edges: &[ShapeHandle]) -> Result<ShapeHandle, KernelError> {
        self.enter(KernelOp::MakeWire)?;
        let mut chain = Vec::with_capacity(edges.len());
        for handle in edges {
            match self.shape(handle)? {
                MockShape::Edge(e) => chain.push(e.clone()),
                _ => {
                    return Err(KernelError::InvalidWire {
                        reason: "wire members must be edges".into(),
                    })
                }
            }
        }
        let (first, last) = match (chain.first(), chain.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => {
                return Err(KernelError::InvalidWire {
                    reason: "wire has no edges".into(),
                })
            }
        };
        let eps = self.tolerance.coincidence;
        for pair in chain.windows(2) {
            if vlength(vsub(pair[0].end(), pair[1].start())) > eps {
                return Err(KernelError::InvalidWire {
                    reason: "edges are not connected".into(),
                });
            }
        }
        if vlength(vsub(last.end(), first.start())) > eps {
            return Err(KernelError::InvalidWire {
                reason: "wire is not closed".into(),
            });
        }
        Ok(ShapeHandle::new(MockShape::Wire(chain)))
    }

    fn make_face(
        &mut self,
        outer: &ShapeHandle,
        holes: &[ShapeHandle],
    ) -> Result<ShapeHandle, KernelError> {
        self.enter(KernelOp::MakeFace)?;
        let outer_edges = self.wire_edges(outer)?;
        let plane = outer_edges[0].plane;
        let outer_poly = self.wire_polygon(&outer_edges);
        let outer_area = signed_area(&outer_poly).abs();
        let outer_centroid = centroid(&outer_poly);

        let mut area = outer_area;
        let mut moment = outer_centroid * outer_area;
        let mut boundary = outer_edges;
        for hole in holes {
            let hole_edges = self.wire_edges(hole)?;
            let poly = self.wire_polygon(&hole_edges);
            let hole_area = signed_area(&poly).abs();
            area -= hole_area;
            moment = moment - centroid(&poly) * hole_area;
            boundary.extend(hole_edges);
        }
        if area <= self.tolerance.coincidence {
            return Err(KernelError::InvalidShape {
                reason: "face has no area".into(),
            });
        }

        let mut edge_ids: Vec<Uuid> = boundary.iter().map(|e| e.id).collect();
        edge_ids.sort();
        let seed = edge_ids
            .iter()
            .fold(Uuid::NAMESPACE_OID, |acc, id| derive_id(acc, &id.to_string()));

        Ok(ShapeHandle::new(MockShape::Face(MockFace {
            id: derive_id(seed, "face"),
            plane,
            boundary,
            area,
            centroid: moment * (1.0 / area),
        })))
    }

    fn extrude(&mut self, face: &ShapeHandle, vector: [f64; 3]) -> Result<ShapeHandle, KernelError> {
        self.enter(KernelOp::Extrude)?;
        let face = self.face(face)?.clone();
        let height = vlength(vector);
        let volume = face.area * vdot(vector, face.plane.normal).abs();
        if volume <= self.tolerance.coincidence {
            return Err(KernelError::InvalidParameter {
                reason: "extrusion has no volume".into(),
            });
        }
        let dir = vnormalize(vector);
        let up = if vdot(dir, face.plane.normal) >= 0.0 { 1.0 } else { -1.0 };

        let mut faces = vec![
            FaceRecord {
                id: derive_id(face.id, "extrude:start"),
                plane: Some(Plane {
                    normal: vscale(face.plane.normal, -up),
                    ..face.plane
                }),
                area: face.area,
            },
            FaceRecord {
                id: derive_id(face.id, "extrude:end"),
                plane: Some(Plane {
                    origin: vadd(face.plane.origin, vector),
                    normal: vscale(face.plane.normal, up),
                    x_axis: face.plane.x_axis,
                }),
                area: face.area,
            },
        ];
        let mut edges = Vec::new();
        for e in &face.boundary {
            let length = e.curve.length();
            let side_plane = e.axis().map(|axis| Plane {
                origin: axis.origin,
                normal: vnormalize(vcross(axis.direction, dir)),
                x_axis: axis.direction,
            });
            faces.push(FaceRecord {
                id: derive_id(e.id, "extrude:side"),
                plane: side_plane,
                area: length * height,
            });
            edges.push(EdgeRecord {
                id: derive_id(e.id, "extrude:start"),
                axis: e.axis(),
                length,
            });
            edges.push(EdgeRecord {
                id: derive_id(e.id, "extrude:end"),
                axis: e.axis().map(|a| Axis {
                    origin: vadd(a.origin, vector),
                    ..a
                }),
                length,
            });
            edges.push(EdgeRecord {
                id: derive_id(e.id, "extrude:lateral"),
                axis: Some(Axis {
                    origin: e.start(),
                    direction: dir,
                }),
                length: height,
            });
        }

        let base = self.boundary_points(&face);
        let mut points = base.clone();
        points.extend(base.iter().map(|p| vadd(*p, vector)));
        debug!(faces = faces.len(), volume, "mock extrude");
        Ok(ShapeHandle::new(MockShape::Solid(MockSolid {
            faces,
            edges,
            volume,
            bounds: Bounds::from_points(&points),
        })))
    }

    fn revolve(
        &mut self,
        face: &ShapeHandle,
        axis: &Axis,
        angle: f64,
    ) -> Result<ShapeHandle, KernelError> {
        self.enter(KernelOp::Revolve)?;
        let face = self.face(face)?.clone();
        let sweep = angle.abs().min(TAU);
        let radius = axis.distance_to(face.plane.to_world(face.centroid));
        let volume = face.area * sweep * radius;
        if volume <= self.tolerance.coincidence {
            return Err(KernelError::InvalidParameter {
                reason: "revolution has no volume".into(),
            });
        }
        let full = self.tolerance.is_zero_angle(sweep - TAU);
        let rotate = |p: [f64; 3], a: f64| {
            vadd(axis.origin, vrotate(vsub(p, axis.origin), axis.direction, a))
        };

        let mut faces = Vec::new();
        let mut edges = Vec::new();
        if !full {
            faces.push(FaceRecord {
                id: derive_id(face.id, "revolve:start"),
                plane: Some(face.plane),
                area: face.area,
            });
            faces.push(FaceRecord {
                id: derive_id(face.id, "revolve:end"),
                plane: Some(Plane {
                    origin: rotate(face.plane.origin, angle),
                    normal: vrotate(face.plane.normal, axis.direction, angle),
                    x_axis: vrotate(face.plane.x_axis, axis.direction, angle),
                }),
                area: face.area,
            });
        }
        for e in &face.boundary {
            let r = axis.distance_to(e.plane.to_world(e.curve.point_at(0.5)));
            faces.push(FaceRecord {
                id: derive_id(e.id, "revolve:side"),
                plane: None,
                area: e.curve.length() * r * sweep,
            });
            if !full {
                edges.push(EdgeRecord {
                    id: derive_id(e.id, "revolve:start"),
                    axis: e.axis(),
                    length: e.curve.length(),
                });
                edges.push(EdgeRecord {
                    id: derive_id(e.id, "revolve:end"),
                    axis: e.axis().map(|a| Axis {
                        origin: rotate(a.origin, angle),
                        direction: vrotate(a.direction, axis.direction, angle),
                    }),
                    length: e.curve.length(),
                });
            }
            edges.push(EdgeRecord {
                id: derive_id(e.id, "revolve:sweep"),
                axis: None,
                length: axis.distance_to(e.start()) * sweep,
            });
        }

        let base = self.boundary_points(&face);
        let steps = 16;
        let points: Vec<[f64; 3]> = (0..=steps)
            .flat_map(|i| {
                let a = angle * i as f64 / steps as f64;
                base.iter().map(move |p| rotate(*p, a))
            })
            .collect();
        debug!(faces = faces.len(), volume, "mock revolve");
        Ok(ShapeHandle::new(MockShape::Solid(MockSolid {
            faces,
            edges,
            volume,
            bounds: Bounds::from_points(&points),
        })))
    }

    fn union(&mut self, a: &ShapeHandle, b: &ShapeHandle) -> Result<ShapeHandle, KernelError> {
        self.enter(KernelOp::Union)?;
        let (a, b) = (self.solid(a)?, self.solid(b)?);
        let overlap = a
            .bounds
            .intersection(&b.bounds)
            .map(|o| o.volume())
            .unwrap_or(0.0)
            .min(a.volume)
            .min(b.volume);
        let mut result = a.clone();
        result.absorb(b);
        result.volume = a.volume + b.volume - overlap;
        result.bounds = a.bounds.union(&b.bounds);
        Ok(ShapeHandle::new(MockShape::Solid(result)))
    }

    fn subtract(&mut self, a: &ShapeHandle, b: &ShapeHandle) -> Result<ShapeHandle, KernelError> {
        self.enter(KernelOp::Subtract)?;
        let (a, b) = (self.solid(a)?, self.solid(b)?);
        let overlap = match a.bounds.intersection(&b.bounds) {
            Some(o) => o.volume().min(b.volume),
            None => return Ok(ShapeHandle::new(MockShape::Solid(a.clone()))),
        };
        let volume = a.volume - overlap;
        if volume <= self.tolerance.coincidence {
            return Err(KernelError::BooleanFailed {
                reason: "subtraction removes the whole body".into(),
            });
        }
        let mut result = a.clone();
        result.absorb(b);
        result.volume = volume;
        Ok(ShapeHandle::new(MockShape::Solid(result)))
    }

    fn intersect(&mut self, a: &ShapeHandle, b: &ShapeHandle) -> Result<ShapeHandle, KernelError> {
        self.enter(KernelOp::Intersect)?;
        let (a, b) = (self.solid(a)?, self.solid(b)?);
        let common = a
            .bounds
            .intersection(&b.bounds)
            .ok_or_else(|| KernelError::BooleanFailed {
                reason: "bodies do not overlap".into(),
            })?;
        let mut result = a.clone();
        result.absorb(b);
        result.volume = common.volume().min(a.volume).min(b.volume);
        result.bounds = common;
        Ok(ShapeHandle::new(MockShape::Solid(result)))
    }

    fn combine(&mut self, shapes: &[ShapeHandle]) -> Result<ShapeHandle, KernelError> {
        self.enter(KernelOp::Combine)?;
        let mut solids = shapes.iter().map(|s| self.solid(s));
        let mut result = match solids.next() {
            Some(first) => first?.clone(),
            None => {
                return Err(KernelError::InvalidParameter {
                    reason: "nothing to combine".into(),
                })
            }
        };
        for solid in solids {
            let solid = solid?;
            result.absorb(solid);
            result.volume += solid.volume;
            result.bounds = result.bounds.union(&solid.bounds);
        }
        Ok(ShapeHandle::new(MockShape::Solid(result)))
    }

    fn fillet(
        &mut self,
        solid: &ShapeHandle,
        edges: &[Uuid],
        radius: f64,
    ) -> Result<ShapeHandle, KernelError> {
        self.enter(KernelOp::Fillet)?;
        let solid = self.solid(solid)?;
        if radius <= 0.0 {
            return Err(KernelError::FilletFailed {
                reason: "radius must be positive".into(),
            });
        }
        if edges.is_empty() {
            return Err(KernelError::FilletFailed {
                reason: "no edges selected".into(),
            });
        }
        if radius * 2.0 >= solid.bounds.thickness() {
            return Err(KernelError::FilletFailed {
                reason: format!("radius {} is too large for the body", radius),
            });
        }

        let mut result = solid.clone();
        for &id in edges {
            let edge = solid
                .edge(id)
                .cloned()
                .ok_or(KernelError::EntityNotFound { id })?;
            result.edges.retain(|e| e.id != id);
            result.faces.push(FaceRecord {
                id: derive_id(id, "fillet"),
                plane: None,
                area: edge.length * radius * FRAC_PI_2,
            });
            for side in ["fillet:a", "fillet:b"] {
                result.edges.push(EdgeRecord {
                    id: derive_id(id, side),
                    axis: None,
                    length: edge.length,
                });
            }
            result.volume -= (1.0 - FRAC_PI_4) * radius * radius * edge.length;
        }
        Ok(ShapeHandle::new(MockShape::Solid(result)))
    }

    fn offset(
        &mut self,
        solid: &ShapeHandle,
        open_faces: &[Uuid],
        distance: f64,
    ) -> Result<ShapeHandle, KernelError> {
        self.enter(KernelOp::Offset)?;
        let solid = self.solid(solid)?;
        if self.tolerance.is_zero_length(distance) {
            return Err(KernelError::ShellFailed {
                reason: "shell thickness is zero".into(),
            });
        }
        for &id in open_faces {
            Self::find_face_record(solid, id)?;
        }
        if distance > 0.0 && distance * 2.0 >= solid.bounds.thickness() {
            return Err(KernelError::ShellFailed {
                reason: "shell thickness collapses the body".into(),
            });
        }

        let thickness = distance.abs();
        let mut result = solid.clone();
        result.faces.retain(|f| !open_faces.contains(&f.id));
        let inner: Vec<FaceRecord> = result
            .faces
            .iter()
            .map(|f| FaceRecord {
                id: derive_id(f.id, "offset"),
                plane: f.plane.map(|p| Plane {
                    origin: vsub(p.origin, vscale(p.normal, distance)),
                    normal: vscale(p.normal, -1.0),
                    x_axis: p.x_axis,
                }),
                area: f.area,
            })
            .collect();
        let wall = result.surface_area() * thickness;
        result.faces.extend(inner);
        if distance > 0.0 {
            result.volume = wall.min(solid.volume);
        } else {
            result.volume = wall;
            result.bounds = solid.bounds.expanded(thickness);
        }
        Ok(ShapeHandle::new(MockShape::Solid(result)))
    }

    fn draft(
        &mut self,
        solid: &ShapeHandle,
        faces: &[Uuid],
        neutral: &Plane,
        angle: f64,
    ) -> Result<ShapeHandle, KernelError> {
        self.enter(KernelOp::Draft)?;
        let solid = self.solid(solid)?;
        if angle.abs() >= FRAC_PI_2 {
            return Err(KernelError::DraftFailed {
                reason: "draft angle must be below 90 degrees".into(),
            });
        }
        let pull = vnormalize(neutral.normal);
        let mut result = solid.clone();
        for &id in faces {
            let record = Self::find_face_record(solid, id)?;
            let plane = record.plane.ok_or_else(|| KernelError::DraftFailed {
                reason: "only planar faces can be drafted".into(),
            })?;
            let hinge = vcross(pull, plane.normal);
            if vlength(hinge) < self.tolerance.angular.max(1e-9) {
                return Err(KernelError::DraftFailed {
                    reason: "face is parallel to the neutral plane".into(),
                });
            }
            if let Some(target) = result.faces.iter_mut().find(|f| f.id == id) {
                target.plane = Some(Plane {
                    normal: vrotate(plane.normal, hinge, angle),
                    x_axis: vrotate(plane.x_axis, hinge, angle),
                    ..plane
                });
            }
        }
        Ok(ShapeHandle::new(MockShape::Solid(result)))
    }

    fn fix(&mut self, shape: &ShapeHandle) -> Result<ShapeHandle, KernelError> {
        self.enter(KernelOp::Fix)?;
        if self.is_valid(shape) {
            Ok(shape.clone())
        } else {
            Err(KernelError::InvalidShape {
                reason: "shape could not be fixed".into(),
            })
        }
    }
}

impl KernelIntrospect for MockKernel {
    fn list_faces(&self, shape: &ShapeHandle) -> Vec<TopoEntity> {
        let ids: Vec<Uuid> = match self.shape(shape) {
            Ok(MockShape::Solid(s)) => s.faces.iter().map(|f| f.id).collect(),
            Ok(MockShape::Face(f)) => vec![f.id],
            _ => Vec::new(),
        };
        ids.into_iter()
            .map(|id| TopoEntity {
                id,
                kind: TopoKind::Face,
                owner: shape.clone(),
            })
            .collect()
    }

    fn list_edges(&self, shape: &ShapeHandle) -> Vec<TopoEntity> {
        let ids: Vec<Uuid> = match self.shape(shape) {
            Ok(MockShape::Solid(s)) => s.edges.iter().map(|e| e.id).collect(),
            Ok(MockShape::Face(f)) => f.boundary.iter().map(|e| e.id).collect(),
            Ok(MockShape::Wire(edges)) => edges.iter().map(|e| e.id).collect(),
            Ok(MockShape::Edge(e)) => vec![e.id],
            Err(_) => Vec::new(),
        };
        ids.into_iter()
            .map(|id| TopoEntity {
                id,
                kind: TopoKind::Edge,
                owner: shape.clone(),
            })
            .collect()
    }

    fn is_same(&self, entity: &TopoEntity, identity: Uuid) -> bool {
        entity.id == identity
    }

    fn face_plane(&self, face: &TopoEntity) -> Option<Plane> {
        match self.shape(&face.owner).ok()? {
            MockShape::Solid(s) => s.face(face.id)?.plane,
            MockShape::Face(f) if f.id == face.id => Some(f.plane),
            _ => None,
        }
    }

    fn edge_axis(&self, edge: &TopoEntity) -> Option<Axis> {
        match self.shape(&edge.owner).ok()? {
            MockShape::Solid(s) => s.edge(edge.id)?.axis,
            MockShape::Edge(e) if e.id == edge.id => e.axis(),
            MockShape::Wire(edges) => edges.iter().find(|e| e.id == edge.id)?.axis(),
            MockShape::Face(f) => f.boundary.iter().find(|e| e.id == edge.id)?.axis(),
            _ => None,
        }
    }

    fn is_valid(&self, shape: &ShapeHandle) -> bool {
        let eps = self.tolerance.coincidence;
        match self.shape(shape) {
            Ok(MockShape::Solid(s)) => s.volume > eps && !s.faces.is_empty(),
            Ok(MockShape::Face(f)) => f.area > eps,
            Ok(MockShape::Wire(edges)) => !edges.is_empty(),
            Ok(MockShape::Edge(e)) => e.curve.length() > eps,
            Err(_) => false,
        }
    }

    fn mass_properties(&self, shape: &ShapeHandle) -> Result<MassProperties, KernelError> {
        match self.shape(shape)? {
            MockShape::Solid(s) => Ok(MassProperties {
                volume: s.volume,
                area: s.surface_area(),
                centroid: s.bounds.center(),
            }),
            MockShape::Face(f) => Ok(MassProperties {
                volume: 0.0,
                area: f.area,
                centroid: f.plane.to_world(f.centroid),
            }),
            _ => Err(KernelError::InvalidShape {
                reason: "mass properties need a face or solid".into(),
            }),
        }
    }

    /// Box mesh of the solid's bounds: 8 vertices, 12 triangles.
    fn tessellate(&self, shape: &ShapeHandle, _tolerance: f64) -> Result<RenderMesh, KernelError> {
        let b = self.solid(shape)?.bounds;
        let corner = |i: usize| {
            [
                if i & 1 == 0 { b.min[0] } else { b.max[0] },
                if i & 2 == 0 { b.min[1] } else { b.max[1] },
                if i & 4 == 0 { b.min[2] } else { b.max[2] },
            ]
        };
        let mut mesh = RenderMesh::default();
        let center = b.center();
        for i in 0..8 {
            let p = corner(i);
            mesh.vertices.extend(p.iter().map(|v| *v as f32));
            mesh.normals
                .extend(vnormalize(vsub(p, center)).iter().map(|v| *v as f32));
        }
        const QUADS: [[u32; 4]; 6] = [
            [0, 2, 3, 1],
            [4, 5, 7, 6],
            [0, 1, 5, 4],
            [2, 6, 7, 3],
            [0, 4, 6, 2],
            [1, 3, 7, 5],
        ];
        for q in QUADS {
            mesh.indices.extend_from_slice(&[q[0], q[1], q[2], q[0], q[2], q[3]]);
        }
        Ok(mesh)
    }

    fn tessellate_curve(
        &self,
        shape: &ShapeHandle,
        tolerance: f64,
    ) -> Result<Vec<[f64; 3]>, KernelError> {
        if tolerance <= 0.0 {
            return Err(KernelError::TessellationFailed {
                reason: "tolerance must be positive".into(),
            });
        }
        let chords = |e: &MockEdge| ((e.curve.length() / tolerance).ceil() as usize).clamp(2, 256);
        match self.shape(shape)? {
            MockShape::Edge(e) => Ok(e.points(chords(e))),
            MockShape::Wire(edges) => {
                let mut points = Vec::new();
                for e in edges {
                    let samples = e.points(chords(e));
                    let skip = usize::from(!points.is_empty());
                    points.extend_from_slice(&samples[skip..]);
                }
                Ok(points)
            }
            _ => Err(KernelError::TessellationFailed {
                reason: "only edges and wires have polylines".into(),
            }),
        }
    }
}
