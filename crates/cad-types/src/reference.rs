//! Persistent reference descriptors. Each one names its target by stable
//! ids (owning component, sketch, element or kernel identity), never by
//! position in a list, so it can be re-resolved after every recompute.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::geom::{Axis, Plane};

/// A closed region of a sketch, identified by the element ids of its rings.
/// `rings[0]` is the outer boundary, the rest are holes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRef {
    pub component: Uuid,
    pub sketch: Uuid,
    pub rings: Vec<BTreeSet<Uuid>>,
}

/// One element of a sketch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveRef {
    pub component: Uuid,
    pub sketch: Uuid,
    pub element: Uuid,
}

/// A face of a component's compound, matched by kernel identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaceRef {
    pub component: Uuid,
    pub face: Uuid,
}

/// An edge of a component's compound, matched by kernel identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeRef {
    pub component: Uuid,
    pub edge: Uuid,
}

/// Source of a plane: a fixed datum or a planar face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlanarRef {
    Fixed { plane: Plane },
    Face { face: FaceRef },
}

/// Source of an axis: a fixed datum, a straight edge or a sketch line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AxialRef {
    Fixed { axis: Axis },
    Edge { edge: EdgeRef },
    Curve { curve: CurveRef },
}

impl ProfileRef {
    /// All element ids across all rings.
    pub fn elements(&self) -> BTreeSet<Uuid> {
        self.rings.iter().flatten().copied().collect()
    }
}
