//! Re-locating referenced entities in a freshly recomputed snapshot.
//!
//! Every resolver looks up the owning component by id, re-derives the
//! candidates from its current sketches or compound, and matches by
//! identity. Nothing is ever looked up by position.

use cad_types::geom::{vnormalize, vsub};
use cad_types::{
    AxialRef, Axis, CurveRef, EdgeRef, FaceRef, PlanarRef, Plane, ProfileRef, SketchElement,
    Tolerance,
};
use geometry_kernel::{KernelIntrospect, TopoEntity};
use sketch_profiles::{build_wires_with, Profile};

use crate::tree::ComponentTree;

/// Outcome of resolving one reference.
#[derive(Debug, Clone)]
pub enum Resolution<T> {
    /// Found exactly what was referenced.
    Resolved(T),
    /// Found a close replacement, e.g. a profile whose boundary gained or
    /// lost curves.
    Repaired(T),
    Lost,
}

impl<T> Resolution<T> {
    pub fn is_lost(&self) -> bool {
        matches!(self, Resolution::Lost)
    }

    pub fn value(self) -> Option<T> {
        match self {
            Resolution::Resolved(v) | Resolution::Repaired(v) => Some(v),
            Resolution::Lost => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        match self {
            Resolution::Resolved(v) => Resolution::Resolved(f(v)),
            Resolution::Repaired(v) => Resolution::Repaired(f(v)),
            Resolution::Lost => Resolution::Lost,
        }
    }

    fn and_then<U>(self, f: impl FnOnce(T) -> Resolution<U>) -> Resolution<U> {
        match self {
            Resolution::Resolved(v) => f(v),
            Resolution::Repaired(v) => match f(v) {
                Resolution::Resolved(u) => Resolution::Repaired(u),
                other => other,
            },
            Resolution::Lost => Resolution::Lost,
        }
    }
}

impl<T> From<Option<T>> for Resolution<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Resolution::Lost, Resolution::Resolved)
    }
}

/// A profile ready to be turned into a face.
#[derive(Debug, Clone)]
pub struct ResolvedProfile {
    pub profile: Profile,
    /// Workplane of the owning sketch.
    pub plane: Plane,
    /// The reference rewritten to the rings that matched.
    pub reference: ProfileRef,
}

/// Find the current region matching a profile reference. Each ring is
/// replaced by the region wire sharing the most curves with it; a ring with
/// no overlap at all loses the profile.
pub fn resolve_profile(
    reference: &ProfileRef,
    tree: &ComponentTree,
    tol: &Tolerance,
) -> Resolution<ResolvedProfile> {
    let Some(sketch) = tree
        .find(reference.component)
        .and_then(|c| c.sketch(reference.sketch))
    else {
        return Resolution::Lost;
    };
    let wires = build_wires_with(&sketch.elements, false, tol);

    let mut repaired = false;
    let mut rings = Vec::with_capacity(reference.rings.len());
    for ring in &reference.rings {
        let best = wires
            .iter()
            .map(|w| (w.element_ids().intersection(ring).count(), w))
            .filter(|(overlap, _)| *overlap > 0)
            // Equal overlaps go to the later wire in walk order.
            .max_by_key(|(overlap, _)| *overlap);
        let Some((overlap, wire)) = best else {
            return Resolution::Lost;
        };
        repaired |= overlap != ring.len() || wire.element_ids().len() != ring.len();
        rings.push(wire.clone());
    }

    let mut rings = rings.into_iter();
    let Some(outer) = rings.next() else {
        return Resolution::Lost;
    };
    let profile = Profile {
        outer,
        holes: rings.collect(),
    };
    let resolved = ResolvedProfile {
        reference: ProfileRef {
            rings: profile.rings(),
            ..reference.clone()
        },
        profile,
        plane: sketch.workplane,
    };
    if repaired {
        Resolution::Repaired(resolved)
    } else {
        Resolution::Resolved(resolved)
    }
}

/// The sketch element a curve reference names, with its sketch's workplane.
pub fn resolve_curve(
    reference: &CurveRef,
    tree: &ComponentTree,
) -> Resolution<(SketchElement, Plane)> {
    tree.find(reference.component)
        .and_then(|c| c.sketch(reference.sketch))
        .and_then(|s| Some((s.element(reference.element)?.clone(), s.workplane)))
        .into()
}

pub fn resolve_face(
    reference: &FaceRef,
    tree: &ComponentTree,
    ki: &dyn KernelIntrospect,
) -> Resolution<TopoEntity> {
    tree.find(reference.component)
        .and_then(|c| c.compound.as_ref())
        .and_then(|compound| {
            ki.list_faces(compound)
                .into_iter()
                .find(|f| ki.is_same(f, reference.face))
        })
        .into()
}

pub fn resolve_edge(
    reference: &EdgeRef,
    tree: &ComponentTree,
    ki: &dyn KernelIntrospect,
) -> Resolution<TopoEntity> {
    tree.find(reference.component)
        .and_then(|c| c.compound.as_ref())
        .and_then(|compound| {
            ki.list_edges(compound)
                .into_iter()
                .find(|e| ki.is_same(e, reference.edge))
        })
        .into()
}

/// A plane from a datum or from a face, which must be planar.
pub fn resolve_plane(
    reference: &PlanarRef,
    tree: &ComponentTree,
    ki: &dyn KernelIntrospect,
) -> Resolution<Plane> {
    match reference {
        PlanarRef::Fixed { plane } => Resolution::Resolved(*plane),
        PlanarRef::Face { face } => {
            resolve_face(face, tree, ki).and_then(|f| ki.face_plane(&f).into())
        }
    }
}

/// An axis from a datum, a straight edge or a sketch line.
pub fn resolve_axis(
    reference: &AxialRef,
    tree: &ComponentTree,
    ki: &dyn KernelIntrospect,
) -> Resolution<Axis> {
    match reference {
        AxialRef::Fixed { axis } => Resolution::Resolved(*axis),
        AxialRef::Edge { edge } => {
            resolve_edge(edge, tree, ki).and_then(|e| ki.edge_axis(&e).into())
        }
        AxialRef::Curve { curve } => {
            resolve_curve(curve, tree).and_then(|(element, plane)| match element {
                SketchElement::Line { start, end, .. } => {
                    let origin = plane.to_world(start);
                    Resolution::Resolved(Axis {
                        origin,
                        direction: vnormalize(vsub(plane.to_world(end), origin)),
                    })
                }
                _ => Resolution::Lost,
            })
        }
    }
}
