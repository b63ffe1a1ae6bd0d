//! Polygon helpers shared by pieces, contours and the position search.
//!
//! Rings are plain `Vec<(f64, f64)>` without a repeated closing point. Edges
//! are addressed 1..=N: edge `i` runs from `ring[i - 1]` to `ring[i % N]`.

use geo::{Area, Coord, LineString, Polygon as GeoPolygon};
use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use pattern_nest_core::robust::to_ccw;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Points closer than this are merged when cleaning a ring.
pub const POINT_EPSILON: f64 = 1e-9;

/// Relative intersection area below which two outlines only touch.
pub const OVERLAP_TOLERANCE: f64 = 1e-6;

/// Mitre length (in multiples of the offset) above which corners are bevelled.
const MITER_LIMIT: f64 = 4.0;

/// A directed segment between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Segment {
    pub start: (f64, f64),
    pub end: (f64, f64),
}

impl Segment {
    pub fn new(start: (f64, f64), end: (f64, f64)) -> Self {
        Self { start, end }
    }

    pub fn dx(&self) -> f64 {
        self.end.0 - self.start.0
    }

    pub fn dy(&self) -> f64 {
        self.end.1 - self.start.1
    }

    pub fn length(&self) -> f64 {
        self.dx().hypot(self.dy())
    }

    /// Direction angle in degrees, `[0, 360)`.
    pub fn angle_deg(&self) -> f64 {
        self.dy().atan2(self.dx()).to_degrees().rem_euclid(360.0)
    }

    /// Counter-clockwise angle in degrees that turns `self` onto `other`.
    pub fn angle_to(&self, other: &Segment) -> f64 {
        (other.angle_deg() - self.angle_deg()).rem_euclid(360.0)
    }

    pub fn is_degenerate(&self) -> bool {
        self.length() <= POINT_EPSILON || !self.length().is_finite()
    }

    /// Point at parameter `t` (0 = start, 1 = end).
    pub fn point_at(&self, t: f64) -> (f64, f64) {
        (self.start.0 + self.dx() * t, self.start.1 + self.dy() * t)
    }
}

/// Returns edge `index` (1-based) of a closed ring.
pub fn ring_edge(ring: &[(f64, f64)], index: usize) -> Option<Segment> {
    let n = ring.len();
    if n < 2 || index == 0 || index > n {
        return None;
    }
    Some(Segment::new(ring[index - 1], ring[index % n]))
}

/// Returns true if every coordinate is finite.
pub fn is_finite_ring(ring: &[(f64, f64)]) -> bool {
    ring.iter().all(|&(x, y)| x.is_finite() && y.is_finite())
}

/// Drops repeated consecutive points and a repeated closing point.
pub fn clean_ring(ring: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut out: Vec<(f64, f64)> = Vec::with_capacity(ring.len());
    for &p in ring {
        match out.last() {
            Some(&q) if distance(p, q) <= POINT_EPSILON => {}
            _ => out.push(p),
        }
    }
    while out.len() > 1 {
        let (first, last) = (out[0], out[out.len() - 1]);
        if distance(first, last) <= POINT_EPSILON {
            out.pop();
        } else {
            break;
        }
    }
    out
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

/// Converts a ring into a `geo` polygon.
pub fn to_geo_polygon(ring: &[(f64, f64)]) -> GeoPolygon<f64> {
    let exterior = LineString::from(
        ring.iter()
            .map(|&(x, y)| Coord { x, y })
            .collect::<Vec<_>>(),
    );
    GeoPolygon::new(exterior, vec![])
}

/// Unsigned area of a ring.
pub fn area(ring: &[(f64, f64)]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    to_geo_polygon(ring).unsigned_area()
}

/// Subdivides every edge into `floor(len / shift)` equal parts.
///
/// A non-positive `shift` returns the ring unchanged.
pub fn densify(ring: &[(f64, f64)], shift: f64) -> Vec<(f64, f64)> {
    if shift.is_nan() || shift <= 0.0 || ring.len() < 2 {
        return ring.to_vec();
    }

    let n = ring.len();
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let edge = Segment::new(ring[i], ring[(i + 1) % n]);
        out.push(edge.start);
        let parts = (edge.length() / shift).floor();
        if parts > 1.0 && parts.is_finite() {
            let parts = parts as usize;
            for k in 1..parts {
                out.push(edge.point_at(k as f64 / parts as f64));
            }
        }
    }
    out
}

/// Offsets a ring outward by `distance` with mitred corners.
///
/// Corners sharper than the mitre limit are bevelled. Self-overlaps at short
/// edges are resolved by a union with the source ring. The result is
/// counter-clockwise.
pub fn offset_outward(ring: &[(f64, f64)], distance: f64) -> Vec<(f64, f64)> {
    let ring = to_ccw(clean_ring(ring));
    if distance.is_nan() || distance <= 0.0 || ring.len() < 3 {
        return ring;
    }

    let n = ring.len();
    let mut raw = Vec::with_capacity(n + n / 2);
    for i in 0..n {
        let prev = ring[(i + n - 1) % n];
        let curr = ring[i];
        let next = ring[(i + 1) % n];

        let n1 = outward_normal(prev, curr);
        let n2 = outward_normal(curr, next);
        let bisector = (n1.0 + n2.0, n1.1 + n2.1);
        let len_sq = bisector.0 * bisector.0 + bisector.1 * bisector.1;

        // Mitre length is 2d / |n1 + n2|.
        if len_sq <= 1e-12 || 2.0 / len_sq.sqrt() > MITER_LIMIT {
            raw.push((curr.0 + n1.0 * distance, curr.1 + n1.1 * distance));
            raw.push((curr.0 + n2.0 * distance, curr.1 + n2.1 * distance));
        } else {
            let scale = 2.0 * distance / len_sq;
            raw.push((curr.0 + bisector.0 * scale, curr.1 + bisector.1 * scale));
        }
    }

    match union(&raw, &ring) {
        Some(merged) => to_ccw(clean_ring(&merged)),
        None => to_ccw(raw),
    }
}

/// Unit normal pointing right of `a -> b` (outward for counter-clockwise rings).
fn outward_normal(a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len = dx.hypot(dy);
    if len <= POINT_EPSILON {
        return (0.0, 0.0);
    }
    (dy / len, -dx / len)
}

fn to_overlay_contour(ring: &[(f64, f64)]) -> Vec<[f64; 2]> {
    ring.iter().map(|&(x, y)| [x, y]).collect()
}

fn from_overlay_contour(contour: Vec<[f64; 2]>) -> Vec<(f64, f64)> {
    contour.into_iter().map(|[x, y]| (x, y)).collect()
}

/// Union of two rings.
///
/// Returns the outer boundary when the union is a single shape; holes are
/// dropped. Returns `None` when the rings fall apart into several shapes
/// (disjoint, or touching in a single point) or the result is degenerate.
pub fn union(a: &[(f64, f64)], b: &[(f64, f64)]) -> Option<Vec<(f64, f64)>> {
    if a.len() < 3 || b.len() < 3 {
        return None;
    }

    let subject: Vec<Vec<[f64; 2]>> = vec![to_overlay_contour(a)];
    let clip = to_overlay_contour(b);
    let shapes = subject.overlay(&[clip], OverlayRule::Union, FillRule::NonZero);

    if shapes.len() != 1 {
        return None;
    }

    let outer = shapes.into_iter().next()?.into_iter().next()?;
    let outer = clean_ring(&from_overlay_contour(outer));
    if outer.len() < 3 || area(&outer) <= 0.0 {
        return None;
    }
    Some(outer)
}

/// Area of the intersection of two rings.
pub fn intersection_area(a: &[(f64, f64)], b: &[(f64, f64)]) -> f64 {
    if a.len() < 3 || b.len() < 3 {
        return 0.0;
    }

    let subject: Vec<Vec<[f64; 2]>> = vec![to_overlay_contour(a)];
    let clip = to_overlay_contour(b);
    let shapes = subject.overlay(&[clip], OverlayRule::Intersect, FillRule::NonZero);

    shapes
        .into_iter()
        .map(|shape| {
            let mut contours = shape.into_iter();
            let outer = contours
                .next()
                .map(|c| area(&from_overlay_contour(c)))
                .unwrap_or(0.0);
            let holes: f64 = contours.map(|c| area(&from_overlay_contour(c))).sum();
            outer - holes
        })
        .sum()
}

/// Returns true if the interiors of two rings overlap.
///
/// Rings that only share boundary segments or points do not overlap.
pub fn overlaps(a: &[(f64, f64)], b: &[(f64, f64)]) -> bool {
    let smaller = area(a).min(area(b));
    if smaller <= 0.0 {
        return false;
    }
    intersection_area(a, b) > OVERLAP_TOLERANCE * smaller
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pattern_nest_core::robust::is_ccw;

    fn square(x: f64, y: f64, size: f64) -> Vec<(f64, f64)> {
        vec![(x, y), (x + size, y), (x + size, y + size), (x, y + size)]
    }

    #[test]
    fn test_ring_edge_numbering() {
        let ring = square(0.0, 0.0, 10.0);
        let first = ring_edge(&ring, 1).unwrap();
        assert_eq!(first.start, (0.0, 0.0));
        assert_eq!(first.end, (10.0, 0.0));

        let last = ring_edge(&ring, 4).unwrap();
        assert_eq!(last.start, (0.0, 10.0));
        assert_eq!(last.end, (0.0, 0.0));

        assert!(ring_edge(&ring, 0).is_none());
        assert!(ring_edge(&ring, 5).is_none());
    }

    #[test]
    fn test_segment_angles() {
        let right = Segment::new((0.0, 0.0), (1.0, 0.0));
        let down = Segment::new((0.0, 1.0), (0.0, 0.0));
        assert_relative_eq!(right.angle_deg(), 0.0);
        assert_relative_eq!(down.angle_deg(), 270.0);
        assert_relative_eq!(right.angle_to(&down), 270.0);
        assert_relative_eq!(down.angle_to(&right), 90.0);
    }

    #[test]
    fn test_clean_ring_drops_duplicates() {
        let ring = vec![(0.0, 0.0), (0.0, 0.0), (5.0, 0.0), (5.0, 5.0), (0.0, 0.0)];
        assert_eq!(clean_ring(&ring), vec![(0.0, 0.0), (5.0, 0.0), (5.0, 5.0)]);
    }

    #[test]
    fn test_area() {
        assert_relative_eq!(area(&square(3.0, 4.0, 10.0)), 100.0);
        assert_relative_eq!(area(&[(0.0, 0.0), (1.0, 1.0)]), 0.0);
    }

    #[test]
    fn test_densify() {
        let ring = square(0.0, 0.0, 10.0);
        let dense = densify(&ring, 2.5);
        assert_eq!(dense.len(), 16);
        assert_eq!(dense[1], (2.5, 0.0));
        assert_relative_eq!(area(&dense), 100.0, epsilon = 1e-9);

        assert_eq!(densify(&ring, 0.0), ring);
        // Edges shorter than two shifts stay whole.
        assert_eq!(densify(&ring, 6.0).len(), 4);
    }

    #[test]
    fn test_offset_square() {
        let grown = offset_outward(&square(0.0, 0.0, 10.0), 1.0);
        assert!(is_ccw(&grown));
        assert_relative_eq!(area(&grown), 144.0, epsilon = 1e-6);
    }

    #[test]
    fn test_offset_concave_l_shape() {
        let l = vec![
            (0.0, 0.0),
            (20.0, 0.0),
            (20.0, 5.0),
            (5.0, 5.0),
            (5.0, 20.0),
            (0.0, 20.0),
        ];
        let grown = offset_outward(&l, 1.0);
        // Exact mitred offset of the L: (22 x 7) + (7 x 15)
        assert_relative_eq!(area(&grown), 259.0, epsilon = 1e-6);
    }

    #[test]
    fn test_offset_zero_is_identity() {
        let ring = square(0.0, 0.0, 4.0);
        assert_eq!(offset_outward(&ring, 0.0), ring);
    }

    #[test]
    fn test_union_adjacent_squares() {
        let merged = union(&square(0.0, 0.0, 10.0), &square(10.0, 0.0, 10.0)).unwrap();
        assert_relative_eq!(area(&merged), 200.0, epsilon = 1e-6);
    }

    #[test]
    fn test_union_disjoint_is_none() {
        assert!(union(&square(0.0, 0.0, 10.0), &square(20.0, 0.0, 10.0)).is_none());
    }

    #[test]
    fn test_union_drops_holes() {
        // A U-shape closed by a bar leaves a hole.
        let u = vec![
            (0.0, 0.0),
            (30.0, 0.0),
            (30.0, 30.0),
            (20.0, 30.0),
            (20.0, 10.0),
            (10.0, 10.0),
            (10.0, 30.0),
            (0.0, 30.0),
        ];
        let bar = vec![(0.0, 30.0), (30.0, 30.0), (30.0, 40.0), (0.0, 40.0)];
        let merged = union(&u, &bar).unwrap();
        assert_relative_eq!(area(&merged), 1200.0, epsilon = 1e-6);
    }

    #[test]
    fn test_overlap_excludes_touching() {
        let a = square(0.0, 0.0, 10.0);
        assert!(!overlaps(&a, &square(10.0, 0.0, 10.0)));
        assert!(!overlaps(&a, &square(10.0, 10.0, 10.0)));
        assert!(overlaps(&a, &square(5.0, 5.0, 10.0)));
        // Containment counts as overlap.
        assert!(overlaps(&a, &square(2.0, 2.0, 2.0)));
    }

    #[test]
    fn test_intersection_area() {
        let a = square(0.0, 0.0, 10.0);
        let b = square(5.0, 5.0, 10.0);
        assert_relative_eq!(intersection_area(&a, &b), 25.0, epsilon = 1e-6);
    }
}
