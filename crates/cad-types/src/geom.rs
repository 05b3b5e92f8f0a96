use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// A point (or vector) in sketch space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn from_angle(angle: f64) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    pub fn distance_to(self, other: Self) -> f64 {
        (other - self).length()
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product. Negative means `other` is
    /// clockwise from `self`.
    pub fn cross(self, other: Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn normalized(self) -> Self {
        let len = self.length();
        if len < 1e-15 {
            Self::ORIGIN
        } else {
            Self::new(self.x / len, self.y / len)
        }
    }

    pub fn lerp(self, other: Self, t: f64) -> Self {
        self + (other - self) * t
    }

    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    pub fn almost_eq(self, other: Self, eps: f64) -> bool {
        self.distance_to(other) < eps
    }
}

impl Add for Point2 {
    type Output = Point2;
    fn add(self, rhs: Self) -> Self::Output {
        Point2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2 {
    type Output = Point2;
    fn sub(self, rhs: Self) -> Self::Output {
        Point2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point2 {
    type Output = Point2;
    fn mul(self, rhs: f64) -> Self::Output {
        Point2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Point2 {
    type Output = Point2;
    fn neg(self) -> Self::Output {
        Point2::new(-self.x, -self.y)
    }
}

// ── 3D vector helpers ──────────────────────────────────────────────────────

pub fn vadd(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

pub fn vsub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub fn vscale(a: [f64; 3], s: f64) -> [f64; 3] {
    [a[0] * s, a[1] * s, a[2] * s]
}

pub fn vdot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn vcross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub fn vlength(a: [f64; 3]) -> f64 {
    vdot(a, a).sqrt()
}

pub fn vnormalize(a: [f64; 3]) -> [f64; 3] {
    let len = vlength(a);
    if len < 1e-15 {
        [0.0, 0.0, 0.0]
    } else {
        vscale(a, 1.0 / len)
    }
}

/// Rotate `v` about the unit vector `axis` by `angle` radians (Rodrigues).
pub fn vrotate(v: [f64; 3], axis: [f64; 3], angle: f64) -> [f64; 3] {
    let (s, c) = angle.sin_cos();
    let k = vnormalize(axis);
    let term1 = vscale(v, c);
    let term2 = vscale(vcross(k, v), s);
    let term3 = vscale(k, vdot(k, v) * (1.0 - c));
    vadd(vadd(term1, term2), term3)
}

/// A placed plane: the workplane of a sketch or the surface of a planar face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub origin: [f64; 3],
    pub normal: [f64; 3],
    pub x_axis: [f64; 3],
}

impl Plane {
    pub const XY: Self = Self {
        origin: [0.0, 0.0, 0.0],
        normal: [0.0, 0.0, 1.0],
        x_axis: [1.0, 0.0, 0.0],
    };

    pub const XZ: Self = Self {
        origin: [0.0, 0.0, 0.0],
        normal: [0.0, -1.0, 0.0],
        x_axis: [1.0, 0.0, 0.0],
    };

    pub const YZ: Self = Self {
        origin: [0.0, 0.0, 0.0],
        normal: [1.0, 0.0, 0.0],
        x_axis: [0.0, 1.0, 0.0],
    };

    pub fn y_axis(&self) -> [f64; 3] {
        vcross(self.normal, self.x_axis)
    }

    /// Map a sketch-space point onto the plane in world space.
    pub fn to_world(&self, p: Point2) -> [f64; 3] {
        vadd(
            self.origin,
            vadd(vscale(self.x_axis, p.x), vscale(self.y_axis(), p.y)),
        )
    }

    /// Map a sketch-space direction onto the plane in world space.
    pub fn dir_to_world(&self, d: Point2) -> [f64; 3] {
        vadd(vscale(self.x_axis, d.x), vscale(self.y_axis(), d.y))
    }

    pub fn offset(&self, distance: f64) -> Self {
        Self {
            origin: vadd(self.origin, vscale(self.normal, distance)),
            ..*self
        }
    }
}

/// A directed line in world space, used for revolve axes and edge axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub origin: [f64; 3],
    pub direction: [f64; 3],
}

impl Axis {
    pub const X: Self = Self {
        origin: [0.0, 0.0, 0.0],
        direction: [1.0, 0.0, 0.0],
    };

    pub const Y: Self = Self {
        origin: [0.0, 0.0, 0.0],
        direction: [0.0, 1.0, 0.0],
    };

    pub const Z: Self = Self {
        origin: [0.0, 0.0, 0.0],
        direction: [0.0, 0.0, 1.0],
    };

    /// Distance from `p` to the infinite line through this axis.
    pub fn distance_to(&self, p: [f64; 3]) -> f64 {
        let d = vnormalize(self.direction);
        let v = vsub(p, self.origin);
        vlength(vsub(v, vscale(d, vdot(v, d))))
    }
}

/// Placement of a component relative to its parent, as a row-major 4x4 matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub matrix: [[f64; 4]; 4],
}

impl Transform {
    pub const IDENTITY: Self = Self {
        matrix: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
