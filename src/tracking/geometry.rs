//! Planar segment intersection in camera pixel space.

use serde::{Deserialize, Serialize};

/// A point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// True if `a`, `b`, `c` make a strictly counter-clockwise turn.
///
/// Colinear triples are not counter-clockwise.
pub fn ccw(a: Point, b: Point, c: Point) -> bool {
    (c.y - a.y) * (b.x - a.x) > (b.y - a.y) * (c.x - a.x)
}

/// True if segment `p1`-`p2` crosses segment `q1`-`q2`.
///
/// Each segment's endpoints must lie on strictly different sides of the
/// other. Colinear overlap is never an intersection. An endpoint lying
/// exactly on the other segment's line counts as the clockwise side, so a
/// segment that only touches the boundary intersects when its other endpoint
/// is on the counter-clockwise side. Any NaN coordinate gives no intersection.
pub fn segments_intersect(p1: Point, p2: Point, q1: Point, q2: Point) -> bool {
    ccw(p1, q1, q2) != ccw(p2, q1, q2) && ccw(p1, p2, q1) != ccw(p1, p2, q2)
}
