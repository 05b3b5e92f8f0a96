use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use uuid::Uuid;

use crate::curve::Curve2d;
use crate::geom::{Plane, Point2};
use crate::geom2d::normalize_angle;

/// A 2D sketch on a workplane: curve elements plus the constraints the
/// external solver works on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sketch {
    pub id: Uuid,
    pub elements: Vec<SketchElement>,
    #[serde(default)]
    pub constraints: Vec<SketchConstraint>,
    /// 3D placement of the sketch plane. Overwritten from the plane
    /// reference each time the owning feature executes.
    pub workplane: Plane,
}

impl Sketch {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            elements: Vec::new(),
            constraints: Vec::new(),
            workplane: Plane::XY,
        }
    }

    pub fn add(&mut self, element: SketchElement) -> Uuid {
        let id = element.id();
        self.elements.push(element);
        id
    }

    /// Remove an element and every constraint that mentions it.
    pub fn remove(&mut self, id: Uuid) -> Option<SketchElement> {
        let pos = self.elements.iter().position(|e| e.id() == id)?;
        self.constraints.retain(|c| !c.references().contains(&id));
        Some(self.elements.remove(pos))
    }

    pub fn element(&self, id: Uuid) -> Option<&SketchElement> {
        self.elements.iter().find(|e| e.id() == id)
    }

    pub fn element_mut(&mut self, id: Uuid) -> Option<&mut SketchElement> {
        self.elements.iter_mut().find(|e| e.id() == id)
    }
}

/// A planar curve primitive of a sketch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SketchElement {
    Line {
        id: Uuid,
        start: Point2,
        end: Point2,
        #[serde(default)]
        construction: bool,
    },
    Circle {
        id: Uuid,
        center: Point2,
        radius: f64,
        #[serde(default)]
        construction: bool,
    },
    /// Counter-clockwise from `start_angle` to `end_angle` (radians).
    Arc {
        id: Uuid,
        center: Point2,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        #[serde(default)]
        construction: bool,
    },
}

impl SketchElement {
    pub fn line(start: Point2, end: Point2) -> Self {
        SketchElement::Line {
            id: Uuid::new_v4(),
            start,
            end,
            construction: false,
        }
    }

    pub fn circle(center: Point2, radius: f64) -> Self {
        SketchElement::Circle {
            id: Uuid::new_v4(),
            center,
            radius,
            construction: false,
        }
    }

    pub fn arc(center: Point2, radius: f64, start_angle: f64, end_angle: f64) -> Self {
        SketchElement::Arc {
            id: Uuid::new_v4(),
            center,
            radius,
            start_angle,
            end_angle,
            construction: false,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            SketchElement::Line { id, .. }
            | SketchElement::Circle { id, .. }
            | SketchElement::Arc { id, .. } => *id,
        }
    }

    /// Reference-only geometry, ignored when building profiles.
    pub fn is_construction(&self) -> bool {
        match self {
            SketchElement::Line { construction, .. }
            | SketchElement::Circle { construction, .. }
            | SketchElement::Arc { construction, .. } => *construction,
        }
    }

    pub fn as_construction(mut self) -> Self {
        match &mut self {
            SketchElement::Line { construction, .. }
            | SketchElement::Circle { construction, .. }
            | SketchElement::Arc { construction, .. } => *construction = true,
        }
        self
    }

    /// The underlying curve, derived from the current parameters.
    pub fn curve(&self) -> Curve2d {
        match *self {
            SketchElement::Line { start, end, .. } => Curve2d::Line { start, end },
            SketchElement::Circle { center, radius, .. } => Curve2d::Circle { center, radius },
            SketchElement::Arc {
                center,
                radius,
                start_angle,
                end_angle,
                ..
            } => Curve2d::Arc {
                center,
                radius,
                start_angle,
                sweep: normalize_angle(end_angle - start_angle),
            },
        }
    }

    /// Draggable control points: endpoints for lines, center and rim for
    /// circles, center and both ends for arcs.
    pub fn handles(&self) -> Vec<Point2> {
        match *self {
            SketchElement::Line { start, end, .. } => vec![start, end],
            SketchElement::Circle { center, radius, .. } => {
                vec![center, center + Point2::new(radius, 0.0)]
            }
            SketchElement::Arc {
                center,
                radius,
                start_angle,
                end_angle,
                ..
            } => vec![
                center,
                center + Point2::from_angle(start_angle) * radius,
                center + Point2::from_angle(end_angle) * radius,
            ],
        }
    }

    /// Move one control point. Returns false if `index` is not a handle of
    /// this element.
    pub fn set_handle(&mut self, index: usize, p: Point2) -> bool {
        match self {
            SketchElement::Line { start, end, .. } => match index {
                0 => *start = p,
                1 => *end = p,
                _ => return false,
            },
            SketchElement::Circle { center, radius, .. } => match index {
                0 => *center = p,
                1 => *radius = center.distance_to(p),
                _ => return false,
            },
            SketchElement::Arc {
                center,
                radius,
                start_angle,
                end_angle,
                ..
            } => match index {
                0 => *center = p,
                1 => {
                    *radius = center.distance_to(p);
                    *start_angle = (p - *center).angle();
                }
                2 => *end_angle = (p - *center).angle(),
                _ => return false,
            },
        }
        true
    }

    /// Display polyline for this element.
    pub fn tessellate(&self, chords: usize) -> Vec<Point2> {
        let curve = self.curve();
        match curve {
            Curve2d::Line { .. } => curve.sample(1),
            _ => {
                let fraction = curve.length() / (TAU * self.radius().unwrap_or(1.0)).max(1e-12);
                let n = ((chords as f64) * fraction).ceil().max(2.0) as usize;
                curve.sample(n)
            }
        }
    }

    fn radius(&self) -> Option<f64> {
        match *self {
            SketchElement::Circle { radius, .. } | SketchElement::Arc { radius, .. } => {
                Some(radius)
            }
            SketchElement::Line { .. } => None,
        }
    }
}

/// One control point of an element, addressed by handle index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementPoint {
    pub element: Uuid,
    pub handle: usize,
}

/// A constraint between sketch elements. Solved externally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SketchConstraint {
    Coincident { a: ElementPoint, b: ElementPoint },
    Horizontal { element: Uuid },
    Vertical { element: Uuid },
    Parallel { a: Uuid, b: Uuid },
    Perpendicular { a: Uuid, b: Uuid },
    Tangent { a: Uuid, b: Uuid },
    Equal { a: Uuid, b: Uuid },
    Distance { a: ElementPoint, b: ElementPoint, value: f64 },
    Radius { element: Uuid, value: f64 },
    Angle { a: Uuid, b: Uuid, value_degrees: f64 },
    Fixed { point: ElementPoint },
}

impl SketchConstraint {
    /// Ids of every element this constraint mentions.
    pub fn references(&self) -> Vec<Uuid> {
        match self {
            SketchConstraint::Coincident { a, b } | SketchConstraint::Distance { a, b, .. } => {
                vec![a.element, b.element]
            }
            SketchConstraint::Horizontal { element }
            | SketchConstraint::Vertical { element }
            | SketchConstraint::Radius { element, .. } => vec![*element],
            SketchConstraint::Parallel { a, b }
            | SketchConstraint::Perpendicular { a, b }
            | SketchConstraint::Tangent { a, b }
            | SketchConstraint::Equal { a, b }
            | SketchConstraint::Angle { a, b, .. } => vec![*a, *b],
            SketchConstraint::Fixed { point } => vec![point.element],
        }
    }
}
