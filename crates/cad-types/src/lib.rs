pub mod curve;
pub mod geom;
pub mod geom2d;
pub mod reference;
pub mod sketch;
pub mod topo;

pub use curve::*;
pub use geom::*;
pub use reference::*;
pub use sketch::*;
pub use topo::*;

/// Tolerances shared by the profile builder and the kernel double.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Points closer than this are considered coincident.
    pub coincidence: f64,
    /// Angles smaller than this (radians) are considered zero.
    pub angular: f64,
    /// Number of chords used when an arc or circle is sampled as a polygon.
    pub samples_per_curve: usize,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            coincidence: 1e-6,
            angular: 1e-9,
            samples_per_curve: 16,
        }
    }
}

impl Tolerance {
    pub fn points_coincident(&self, a: Point2, b: Point2) -> bool {
        a.distance_to(b) < self.coincidence
    }

    pub fn is_zero_length(&self, length: f64) -> bool {
        length.abs() < self.coincidence
    }

    pub fn is_zero_angle(&self, angle: f64) -> bool {
        angle.abs() < self.angular
    }
}
