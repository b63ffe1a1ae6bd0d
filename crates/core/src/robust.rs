//! Robust geometric predicates for ring orientation.
//!
//! Piece outlines arrive from the drafting layer in arbitrary winding order
//! and pass through rotations and reflections before they are compared with
//! a sheet contour. Winding decisions use Shewchuk's adaptive-precision
//! `orient2d` so that nearly collinear corners never flip a ring the wrong way.
//!
//! ## Example
//!
//! ```rust
//! use pattern_nest_core::robust::{orient2d, Orientation};
//!
//! assert_eq!(
//!     orient2d((0.0, 0.0), (1.0, 0.0), (0.5, 1.0)),
//!     Orientation::CounterClockwise
//! );
//! ```

use robust::{orient2d as robust_orient2d, Coord};

/// Result of an orientation test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Left turn.
    CounterClockwise,
    /// Right turn.
    Clockwise,
    /// Points on one line.
    Collinear,
}

impl Orientation {
    #[inline]
    pub fn is_ccw(self) -> bool {
        matches!(self, Orientation::CounterClockwise)
    }

    #[inline]
    pub fn is_cw(self) -> bool {
        matches!(self, Orientation::Clockwise)
    }

    #[inline]
    pub fn is_collinear(self) -> bool {
        matches!(self, Orientation::Collinear)
    }
}

/// Orientation of `pc` relative to the directed line `pa -> pb`.
#[inline]
pub fn orient2d(pa: (f64, f64), pb: (f64, f64), pc: (f64, f64)) -> Orientation {
    let det = robust_orient2d(
        Coord { x: pa.0, y: pa.1 },
        Coord { x: pb.0, y: pb.1 },
        Coord { x: pc.0, y: pc.1 },
    );

    if det > 0.0 {
        Orientation::CounterClockwise
    } else if det < 0.0 {
        Orientation::Clockwise
    } else {
        Orientation::Collinear
    }
}

/// Signed shoelace area (positive for counter-clockwise rings).
///
/// Kahan-compensated so that long, densely subdivided contours keep their
/// sign.
pub fn signed_area(ring: &[(f64, f64)]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }

    let mut sum = 0.0;
    let mut c = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        let term = ring[i].0 * ring[j].1 - ring[j].0 * ring[i].1;
        let y = term - c;
        let t = sum + y;
        c = (t - sum) - y;
        sum = t;
    }

    sum / 2.0
}

/// Returns true if the ring winds counter-clockwise.
///
/// Decided at the lowest-leftmost vertex, which is always convex; falls back
/// to the signed area when that corner is degenerate.
pub fn is_ccw(ring: &[(f64, f64)]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }

    let mut min_idx = 0;
    for (i, &(x, y)) in ring.iter().enumerate() {
        let (min_x, min_y) = ring[min_idx];
        if y < min_y || (y == min_y && x < min_x) {
            min_idx = i;
        }
    }

    let prev = ring[(min_idx + n - 1) % n];
    let curr = ring[min_idx];
    let next = ring[(min_idx + 1) % n];

    match orient2d(prev, curr, next) {
        Orientation::CounterClockwise => true,
        Orientation::Clockwise => false,
        Orientation::Collinear => signed_area(ring) > 0.0,
    }
}

/// Returns the ring in counter-clockwise order.
pub fn to_ccw(mut ring: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    if ring.len() >= 3 && !is_ccw(&ring) {
        ring.reverse();
    }
    ring
}

/// Returns the ring in clockwise order.
pub fn to_cw(mut ring: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    if ring.len() >= 3 && is_ccw(&ring) {
        ring.reverse();
    }
    ring
}
