use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::geom::Point2;
use crate::geom2d::{distance_to_segment, normalize_angle};
use crate::Tolerance;

/// A bounded planar curve, parameterized over `[0, 1]` from start to end.
///
/// Arcs carry a signed sweep: positive runs counter-clockwise. A circle
/// starts and ends at angle zero and always runs counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Curve2d {
    Line {
        start: Point2,
        end: Point2,
    },
    Arc {
        center: Point2,
        radius: f64,
        start_angle: f64,
        sweep: f64,
    },
    Circle {
        center: Point2,
        radius: f64,
    },
}

impl Curve2d {
    pub fn point_at(&self, t: f64) -> Point2 {
        match *self {
            Curve2d::Line { start, end } => start.lerp(end, t),
            Curve2d::Arc {
                center,
                radius,
                start_angle,
                sweep,
            } => center + Point2::from_angle(start_angle + sweep * t) * radius,
            Curve2d::Circle { center, radius } => center + Point2::from_angle(TAU * t) * radius,
        }
    }

    pub fn start(&self) -> Point2 {
        self.point_at(0.0)
    }

    pub fn end(&self) -> Point2 {
        self.point_at(1.0)
    }

    /// Unit direction of travel at `t`.
    pub fn tangent_at(&self, t: f64) -> Point2 {
        match *self {
            Curve2d::Line { start, end } => (end - start).normalized(),
            Curve2d::Arc {
                start_angle, sweep, ..
            } => {
                let a = start_angle + sweep * t;
                Point2::new(-a.sin(), a.cos()) * sweep.signum()
            }
            Curve2d::Circle { .. } => {
                let a = TAU * t;
                Point2::new(-a.sin(), a.cos())
            }
        }
    }

    /// Signed curvature in the direction of travel: positive turns
    /// counter-clockwise, zero for lines.
    pub fn curvature(&self) -> f64 {
        match *self {
            Curve2d::Line { .. } => 0.0,
            Curve2d::Arc { radius, sweep, .. } => sweep.signum() / radius.abs(),
            Curve2d::Circle { radius, .. } => 1.0 / radius.abs(),
        }
    }

    pub fn length(&self) -> f64 {
        match *self {
            Curve2d::Line { start, end } => start.distance_to(end),
            Curve2d::Arc { radius, sweep, .. } => radius.abs() * sweep.abs(),
            Curve2d::Circle { radius, .. } => radius.abs() * TAU,
        }
    }

    /// A curve whose end meets its start, such as a full circle.
    pub fn is_closed(&self, tol: &Tolerance) -> bool {
        match self {
            Curve2d::Circle { .. } => true,
            Curve2d::Line { .. } => false,
            Curve2d::Arc { .. } => {
                !tol.is_zero_length(self.length()) && tol.points_coincident(self.start(), self.end())
            }
        }
    }

    pub fn reversed(&self) -> Self {
        match *self {
            Curve2d::Line { start, end } => Curve2d::Line {
                start: end,
                end: start,
            },
            Curve2d::Arc {
                center,
                radius,
                start_angle,
                sweep,
            } => Curve2d::Arc {
                center,
                radius,
                start_angle: start_angle + sweep,
                sweep: -sweep,
            },
            Curve2d::Circle { center, radius } => Curve2d::Arc {
                center,
                radius,
                start_angle: 0.0,
                sweep: -TAU,
            },
        }
    }

    /// The piece of this curve between parameters `t0` and `t1`.
    pub fn sub(&self, t0: f64, t1: f64) -> Self {
        match *self {
            Curve2d::Line { .. } => Curve2d::Line {
                start: self.point_at(t0),
                end: self.point_at(t1),
            },
            Curve2d::Arc {
                center,
                radius,
                start_angle,
                sweep,
            } => Curve2d::Arc {
                center,
                radius,
                start_angle: start_angle + sweep * t0,
                sweep: sweep * (t1 - t0),
            },
            Curve2d::Circle { center, radius } => Curve2d::Arc {
                center,
                radius,
                start_angle: TAU * t0,
                sweep: TAU * (t1 - t0),
            },
        }
    }

    /// Split at the given sorted interior parameters. A circle split at
    /// `n > 0` parameters yields `n` arcs, the last one wrapping through zero.
    pub fn split(&self, params: &[f64]) -> Vec<Curve2d> {
        if params.is_empty() {
            return vec![*self];
        }
        if let Curve2d::Circle { .. } = self {
            return params
                .iter()
                .enumerate()
                .map(|(i, &t0)| {
                    let t1 = params.get(i + 1).copied().unwrap_or(params[0] + 1.0);
                    self.sub(t0, t1)
                })
                .collect();
        }
        let mut bounds = Vec::with_capacity(params.len() + 2);
        bounds.push(0.0);
        bounds.extend_from_slice(params);
        bounds.push(1.0);
        bounds.windows(2).map(|w| self.sub(w[0], w[1])).collect()
    }

    /// Polyline approximation. Lines yield their two endpoints; round curves
    /// yield `chords + 1` points.
    pub fn sample(&self, chords: usize) -> Vec<Point2> {
        match self {
            Curve2d::Line { start, end } => vec![*start, *end],
            _ => {
                let n = chords.max(2);
                (0..=n).map(|i| self.point_at(i as f64 / n as f64)).collect()
            }
        }
    }

    fn circle_of(&self) -> Option<(Point2, f64)> {
        match *self {
            Curve2d::Arc { center, radius, .. } | Curve2d::Circle { center, radius } => {
                Some((center, radius))
            }
            Curve2d::Line { .. } => None,
        }
    }

    /// Parameter of a point lying on this curve, or `None` if it is off the
    /// curve or outside its bounds.
    pub fn param_of(&self, p: Point2, tol: &Tolerance) -> Option<f64> {
        match *self {
            Curve2d::Line { start, end } => {
                if distance_to_segment(p, start, end) >= tol.coincidence {
                    return None;
                }
                let d = end - start;
                let len_sq = d.dot(d);
                if len_sq < 1e-30 {
                    return None;
                }
                Some(((p - start).dot(d) / len_sq).clamp(0.0, 1.0))
            }
            Curve2d::Circle { center, radius } => {
                if (p.distance_to(center) - radius).abs() >= tol.coincidence {
                    return None;
                }
                Some(normalize_angle((p - center).angle()) / TAU)
            }
            Curve2d::Arc {
                center,
                radius,
                start_angle,
                sweep,
            } => {
                if (p.distance_to(center) - radius).abs() >= tol.coincidence {
                    return None;
                }
                let angle = (p - center).angle();
                let span = sweep.abs();
                let eps = tol.coincidence / radius.max(1e-12);
                let mut offset = if sweep >= 0.0 {
                    normalize_angle(angle - start_angle)
                } else {
                    normalize_angle(start_angle - angle)
                };
                if offset > span + eps {
                    if TAU - offset < eps {
                        offset = 0.0;
                    } else {
                        return None;
                    }
                }
                if span < 1e-15 {
                    return None;
                }
                Some((offset / span).min(1.0))
            }
        }
    }

    /// All points where this curve meets `other`, as parameter pairs
    /// `(t_self, t_other)`. Overlapping collinear or concentric curves
    /// report only the endpoints that lie on the other curve.
    pub fn intersect(&self, other: &Curve2d, tol: &Tolerance) -> Vec<(f64, f64)> {
        let mut hits = match (self.circle_of(), other.circle_of()) {
            (None, None) => self.intersect_line_line(other, tol),
            (None, Some((c, r))) => self.intersect_line_circle(other, c, r, tol),
            (Some((c, r)), None) => other
                .intersect_line_circle(self, c, r, tol)
                .into_iter()
                .map(|(a, b)| (b, a))
                .collect(),
            (Some((c1, r1)), Some((c2, r2))) => {
                self.intersect_circle_circle(other, (c1, r1), (c2, r2), tol)
            }
        };
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        hits.dedup_by(|a, b| (a.0 - b.0).abs() < 1e-12 && (a.1 - b.1).abs() < 1e-12);
        hits
    }

    fn intersect_line_line(&self, other: &Curve2d, tol: &Tolerance) -> Vec<(f64, f64)> {
        let (p, r) = (self.start(), self.end() - self.start());
        let (q, s) = (other.start(), other.end() - other.start());
        let denom = r.cross(s);
        let (len_r, len_s) = (r.length(), s.length());
        if len_r < tol.coincidence || len_s < tol.coincidence {
            return Vec::new();
        }

        if denom.abs() < tol.angular.max(1e-12) * len_r * len_s {
            return endpoint_contacts(self, other, tol);
        }

        let t = (q - p).cross(s) / denom;
        let u = (q - p).cross(r) / denom;
        let (et, eu) = (tol.coincidence / len_r, tol.coincidence / len_s);
        if t < -et || t > 1.0 + et || u < -eu || u > 1.0 + eu {
            return Vec::new();
        }
        vec![(t.clamp(0.0, 1.0), u.clamp(0.0, 1.0))]
    }

    fn intersect_line_circle(
        &self,
        round: &Curve2d,
        center: Point2,
        radius: f64,
        tol: &Tolerance,
    ) -> Vec<(f64, f64)> {
        let d = self.end() - self.start();
        let f = self.start() - center;
        let a = d.dot(d);
        if a < 1e-30 {
            return Vec::new();
        }
        let b = 2.0 * f.dot(d);
        let c = f.dot(f) - radius * radius;
        let disc = b * b - 4.0 * a * c;

        let roots = if disc < 0.0 {
            // Near-tangent lines can miss by rounding.
            let t = -b / (2.0 * a);
            let closest = self.point_at(t);
            if (closest.distance_to(center) - radius).abs() < tol.coincidence {
                vec![t]
            } else {
                Vec::new()
            }
        } else {
            let sq = disc.sqrt();
            vec![(-b - sq) / (2.0 * a), (-b + sq) / (2.0 * a)]
        };

        let et = tol.coincidence / a.sqrt();
        roots
            .into_iter()
            .filter(|t| *t >= -et && *t <= 1.0 + et)
            .filter_map(|t| {
                let t = t.clamp(0.0, 1.0);
                round.param_of(self.point_at(t), tol).map(|u| (t, u))
            })
            .collect()
    }

    fn intersect_circle_circle(
        &self,
        other: &Curve2d,
        (c1, r1): (Point2, f64),
        (c2, r2): (Point2, f64),
        tol: &Tolerance,
    ) -> Vec<(f64, f64)> {
        let d = c1.distance_to(c2);
        if d < tol.coincidence {
            if (r1 - r2).abs() < tol.coincidence {
                return endpoint_contacts(self, other, tol);
            }
            return Vec::new();
        }
        if d > r1 + r2 + tol.coincidence || d < (r1 - r2).abs() - tol.coincidence {
            return Vec::new();
        }

        let a = (r1 * r1 - r2 * r2 + d * d) / (2.0 * d);
        let h = (r1 * r1 - a * a).max(0.0).sqrt();
        let dir = (c2 - c1) * (1.0 / d);
        let base = c1 + dir * a;
        let perp = Point2::new(-dir.y, dir.x);
        let points = if h < tol.coincidence {
            vec![base]
        } else {
            vec![base + perp * h, base - perp * h]
        };

        points
            .into_iter()
            .filter_map(|p| Some((self.param_of(p, tol)?, other.param_of(p, tol)?)))
            .collect()
    }
}

/// Contacts between two curves lying on the same line or circle: every
/// endpoint of one that falls on the other.
fn endpoint_contacts(a: &Curve2d, b: &Curve2d, tol: &Tolerance) -> Vec<(f64, f64)> {
    let mut hits = Vec::new();
    if !matches!(a, Curve2d::Circle { .. }) {
        for ta in [0.0, 1.0] {
            if let Some(tb) = b.param_of(a.point_at(ta), tol) {
                hits.push((ta, tb));
            }
        }
    }
    if !matches!(b, Curve2d::Circle { .. }) {
        for tb in [0.0, 1.0] {
            if let Some(ta) = a.param_of(b.point_at(tb), tol) {
                hits.push((ta, tb));
            }
        }
    }
    hits
}
