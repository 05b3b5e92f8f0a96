use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use cad_types::geom2d::{locate_point, signed_area, PointLocation};
use cad_types::{Curve2d, Point2, Tolerance};

/// Identity of one piece of a sketch element after splitting at
/// intersections. Pieces are numbered along the element from its start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SegmentId {
    pub element: Uuid,
    pub part: u32,
}

impl SegmentId {
    /// Stable id for the kernel edge built from this piece.
    pub fn edge_id(&self) -> Uuid {
        Uuid::new_v5(&self.element, &self.part.to_le_bytes())
    }
}

/// A split piece of a sketch element, in the element's own direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub id: SegmentId,
    pub curve: Curve2d,
}

/// A segment as traversed by a wire. `curve` already runs in the
/// direction of travel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientedSegment {
    pub id: SegmentId,
    pub reversed: bool,
    pub curve: Curve2d,
}

impl OrientedSegment {
    pub fn new(segment: &Segment, reversed: bool) -> Self {
        Self {
            id: segment.id,
            reversed,
            curve: if reversed {
                segment.curve.reversed()
            } else {
                segment.curve
            },
        }
    }

    pub fn start(&self) -> Point2 {
        self.curve.start()
    }

    pub fn end(&self) -> Point2 {
        self.curve.end()
    }
}

/// A closed loop of oriented segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wire {
    pub segments: Vec<OrientedSegment>,
}

impl Wire {
    pub fn new(segments: Vec<OrientedSegment>) -> Self {
        Self { segments }
    }

    pub fn start(&self) -> Option<Point2> {
        self.segments.first().map(OrientedSegment::start)
    }

    pub fn end(&self) -> Option<Point2> {
        self.segments.last().map(OrientedSegment::end)
    }

    /// Every segment meets the next one and the last meets the first.
    pub fn is_closed(&self, tol: &Tolerance) -> bool {
        let n = self.segments.len();
        n > 0
            && (0..n).all(|i| {
                let next = &self.segments[(i + 1) % n];
                tol.points_coincident(self.segments[i].end(), next.start())
            })
    }

    /// Ids of the sketch elements this wire runs along.
    pub fn element_ids(&self) -> BTreeSet<Uuid> {
        self.segments.iter().map(|s| s.id.element).collect()
    }

    /// Polygon approximation: each segment contributes its samples except
    /// the last, which is the next segment's first.
    pub fn sample(&self, chords: usize) -> Vec<Point2> {
        let mut points = Vec::new();
        for seg in &self.segments {
            let samples = seg.curve.sample(chords);
            points.extend_from_slice(&samples[..samples.len() - 1]);
        }
        points
    }

    /// Shoelace area over the sampled polygon. Negative means clockwise.
    pub fn signed_area(&self, tol: &Tolerance) -> f64 {
        signed_area(&self.sample(tol.samples_per_curve))
    }

    pub fn is_clockwise(&self, tol: &Tolerance) -> bool {
        self.signed_area(tol) < 0.0
    }

    /// True when `other` lies inside this wire: none of its samples or
    /// chord midpoints is outside, and at least one is strictly inside.
    pub fn encloses(&self, other: &Wire, tol: &Tolerance) -> bool {
        encloses_polygon(
            &self.sample(tol.samples_per_curve),
            &other.sample(tol.samples_per_curve),
            tol,
        )
    }
}

pub(crate) fn encloses_polygon(outer: &[Point2], inner: &[Point2], tol: &Tolerance) -> bool {
    let n = inner.len();
    let mut strictly_inside = false;
    for i in 0..n {
        let a = inner[i];
        let mid = a.lerp(inner[(i + 1) % n], 0.5);
        for p in [a, mid] {
            match locate_point(p, outer, tol.coincidence) {
                PointLocation::Outside => return false,
                PointLocation::Inside => strictly_inside = true,
                PointLocation::Boundary => {}
            }
        }
    }
    strictly_inside
}

/// A planar region: one outer wire and the holes cut out of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub outer: Wire,
    pub holes: Vec<Wire>,
}

impl Profile {
    pub fn area(&self, tol: &Tolerance) -> f64 {
        self.outer.signed_area(tol).abs()
            - self
                .holes
                .iter()
                .map(|h| h.signed_area(tol).abs())
                .sum::<f64>()
    }

    /// Element ids per ring, outer first.
    pub fn rings(&self) -> Vec<BTreeSet<Uuid>> {
        std::iter::once(&self.outer)
            .chain(self.holes.iter())
            .map(Wire::element_ids)
            .collect()
    }
}
