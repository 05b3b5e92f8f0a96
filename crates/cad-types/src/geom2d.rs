//! Planar polygon math over sampled curve points.

use crate::geom::Point2;

/// Where a point lies relative to a closed polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointLocation {
    Inside,
    Outside,
    Boundary,
}

/// Signed area of a closed polygon (shoelace). Negative means clockwise.
/// The closing edge from the last point back to the first is implied.
pub fn signed_area(points: &[Point2]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        twice_area += p.cross(q);
    }
    twice_area * 0.5
}

/// Area centroid of a closed polygon. Falls back to the vertex average for
/// degenerate input.
pub fn centroid(points: &[Point2]) -> Point2 {
    let area = signed_area(points);
    if area.abs() < 1e-15 {
        if points.is_empty() {
            return Point2::ORIGIN;
        }
        let sum = points.iter().fold(Point2::ORIGIN, |acc, p| acc + *p);
        return sum * (1.0 / points.len() as f64);
    }
    let mut cx = 0.0;
    let mut cy = 0.0;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        let f = p.cross(q);
        cx += (p.x + q.x) * f;
        cy += (p.y + q.y) * f;
    }
    Point2::new(cx / (6.0 * area), cy / (6.0 * area))
}

pub fn is_clockwise(points: &[Point2]) -> bool {
    signed_area(points) < 0.0
}

/// Shortest distance from `p` to the segment `a`..`b`.
pub fn distance_to_segment(p: Point2, a: Point2, b: Point2) -> f64 {
    let ab = b - a;
    let len_sq = ab.dot(ab);
    if len_sq < 1e-30 {
        return p.distance_to(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance_to(a + ab * t)
}

/// Even-odd classification of `p` against a closed polygon, casting a ray
/// towards +x. Points within `eps` of an edge are reported as `Boundary`.
pub fn locate_point(p: Point2, polygon: &[Point2], eps: f64) -> PointLocation {
    let n = polygon.len();
    if n < 3 {
        return PointLocation::Outside;
    }

    for i in 0..n {
        if distance_to_segment(p, polygon[i], polygon[(i + 1) % n]) < eps {
            return PointLocation::Boundary;
        }
    }

    let mut inside = false;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if x_cross > p.x {
                inside = !inside;
            }
        }
    }

    if inside {
        PointLocation::Inside
    } else {
        PointLocation::Outside
    }
}

/// Normalize an angle into `[0, 2π)`.
pub fn normalize_angle(angle: f64) -> f64 {
    angle.rem_euclid(std::f64::consts::TAU)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square() -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ]
    }

    #[test]
    fn square_area_sign_follows_winding() {
        let mut square = unit_square();
        assert_relative_eq!(signed_area(&square), 1.0);
        square.reverse();
        assert_relative_eq!(signed_area(&square), -1.0);
        assert!(is_clockwise(&square));
    }

    #[test]
    fn locate_point_classifies_all_three_cases() {
        let square = unit_square();
        assert_eq!(
            locate_point(Point2::new(0.5, 0.5), &square, 1e-9),
            PointLocation::Inside
        );
        assert_eq!(
            locate_point(Point2::new(1.5, 0.5), &square, 1e-9),
            PointLocation::Outside
        );
        assert_eq!(
            locate_point(Point2::new(1.0, 0.25), &square, 1e-9),
            PointLocation::Boundary
        );
    }
}
