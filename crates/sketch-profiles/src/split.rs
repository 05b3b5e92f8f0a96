use cad_types::{Curve2d, SketchElement, Tolerance};
use uuid::Uuid;

use crate::types::{Segment, SegmentId};

/// Curves that can bound a region: construction geometry and zero-length
/// curves are dropped.
pub fn usable_curves(elements: &[SketchElement], tol: &Tolerance) -> Vec<(Uuid, Curve2d)> {
    elements
        .iter()
        .filter(|e| !e.is_construction())
        .map(|e| (e.id(), e.curve()))
        .filter(|(_, c)| !tol.is_zero_length(c.length()))
        .collect()
}

/// Split every curve at the points where it meets any other curve.
/// Existing endpoints are kept; hits within tolerance of an endpoint do not
/// create a new piece.
pub fn split_all(curves: &[(Uuid, Curve2d)], tol: &Tolerance) -> Vec<Segment> {
    let mut segments = Vec::new();
    for (i, (element, curve)) in curves.iter().enumerate() {
        let closed = matches!(curve, Curve2d::Circle { .. });
        let eps = tol.coincidence / curve.length();

        let mut params: Vec<f64> = curves
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .flat_map(|(_, (_, other))| curve.intersect(other, tol))
            .map(|(t, _)| if closed && t > 1.0 - eps { 0.0 } else { t })
            .filter(|t| closed || (*t > eps && *t < 1.0 - eps))
            .collect();
        params.sort_by(f64::total_cmp);
        params.dedup_by(|a, b| (*a - *b).abs() < eps);

        let pieces = curve.split(&params);
        segments.extend(
            pieces
                .into_iter()
                .filter(|p| !tol.is_zero_length(p.length()))
                .enumerate()
                .map(|(part, piece)| Segment {
                    id: SegmentId {
                        element: *element,
                        part: part as u32,
                    },
                    curve: piece,
                }),
        );
    }
    segments
}
