//! Affine transforms and axis-aligned rectangles for placed pieces.
//!
//! A committed piece carries one [`Transform2D`]: a 2×3 affine matrix built
//! from translations, rotations about a pivot and reflections across a line.
//! Composition goes through `nalgebra` homogeneous matrices.

use nalgebra::{Matrix3, Point2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 2D affine transform (rotation, translation and optional reflection).
///
/// Maps `(x, y)` to `(m11 * x + m12 * y + dx, m21 * x + m22 * y + dy)`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Transform2D {
    pub m11: f64,
    pub m12: f64,
    pub m21: f64,
    pub m22: f64,
    pub dx: f64,
    pub dy: f64,
}

impl Transform2D {
    /// Creates the identity transform.
    pub fn identity() -> Self {
        Self {
            m11: 1.0,
            m12: 0.0,
            m21: 0.0,
            m22: 1.0,
            dx: 0.0,
            dy: 0.0,
        }
    }

    /// Creates a pure translation.
    pub fn translation(dx: f64, dy: f64) -> Self {
        Self {
            dx,
            dy,
            ..Self::identity()
        }
    }

    /// Creates a rotation by `degrees` (counter-clockwise) about `pivot`.
    pub fn rotation_about(pivot: (f64, f64), degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let (px, py) = pivot;
        Self {
            m11: cos,
            m12: -sin,
            m21: sin,
            m22: cos,
            dx: px - cos * px + sin * py,
            dy: py - sin * px - cos * py,
        }
    }

    /// Creates a reflection across the infinite line through `a` and `b`.
    ///
    /// Returns the identity when the two points coincide.
    pub fn reflection_across(a: (f64, f64), b: (f64, f64)) -> Self {
        let (ux, uy) = (b.0 - a.0, b.1 - a.1);
        let len_sq = ux * ux + uy * uy;
        if len_sq <= f64::EPSILON {
            return Self::identity();
        }
        let cos2 = (ux * ux - uy * uy) / len_sq;
        let sin2 = 2.0 * ux * uy / len_sq;
        let (ax, ay) = a;
        Self {
            m11: cos2,
            m12: sin2,
            m21: sin2,
            m22: -cos2,
            dx: ax - cos2 * ax - sin2 * ay,
            dy: ay - sin2 * ax + cos2 * ay,
        }
    }

    /// Converts to a homogeneous nalgebra matrix.
    pub fn to_matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.m11, self.m12, self.dx, //
            self.m21, self.m22, self.dy, //
            0.0, 0.0, 1.0,
        )
    }

    /// Creates from a homogeneous nalgebra matrix (the last row is ignored).
    pub fn from_matrix(m: &Matrix3<f64>) -> Self {
        Self {
            m11: m[(0, 0)],
            m12: m[(0, 1)],
            dx: m[(0, 2)],
            m21: m[(1, 0)],
            m22: m[(1, 1)],
            dy: m[(1, 2)],
        }
    }

    /// Composes two transforms: `self` first, then `next`.
    pub fn then(&self, next: &Self) -> Self {
        Self::from_matrix(&(next.to_matrix() * self.to_matrix()))
    }

    /// Transforms a single point.
    pub fn apply(&self, (x, y): (f64, f64)) -> (f64, f64) {
        let p = self.to_matrix().transform_point(&Point2::new(x, y));
        (p.x, p.y)
    }

    /// Transforms a sequence of points.
    pub fn apply_all(&self, points: &[(f64, f64)]) -> Vec<(f64, f64)> {
        let m = self.to_matrix();
        points
            .iter()
            .map(|&(x, y)| {
                let p = m.transform_point(&Point2::new(x, y));
                (p.x, p.y)
            })
            .collect()
    }

    /// Determinant of the linear part.
    pub fn determinant(&self) -> f64 {
        self.m11 * self.m22 - self.m12 * self.m21
    }

    /// Returns true if the transform contains a reflection.
    pub fn is_mirrored(&self) -> bool {
        self.determinant() < 0.0
    }

    /// Angle (degrees, `[0, 360)`) of the image of the x axis.
    pub fn rotation_deg(&self) -> f64 {
        self.m21.atan2(self.m11).to_degrees().rem_euclid(360.0)
    }

    /// Translation component.
    pub fn translation_part(&self) -> (f64, f64) {
        (self.dx, self.dy)
    }

    /// Returns true if every coefficient is finite.
    pub fn is_finite(&self) -> bool {
        [self.m11, self.m12, self.m21, self.m22, self.dx, self.dy]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Checks if this is approximately the identity.
    pub fn is_identity(&self, epsilon: f64) -> bool {
        (self.m11 - 1.0).abs() < epsilon
            && self.m12.abs() < epsilon
            && self.m21.abs() < epsilon
            && (self.m22 - 1.0).abs() < epsilon
            && self.dx.abs() < epsilon
            && self.dy.abs() < epsilon
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::identity()
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rect2D {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect2D {
    /// Creates a rectangle from its corners.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Creates the rectangle `[0, width] × [0, height]`.
    pub fn sheet(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Bounding rectangle of a point set, `None` when empty.
    pub fn from_points(points: &[(f64, f64)]) -> Option<Self> {
        let (&(x0, y0), rest) = points.split_first()?;
        Some(rest.iter().fold(Self::new(x0, y0, x0, y0), |r, &(x, y)| {
            Self::new(r.min_x.min(x), r.min_y.min(y), r.max_x.max(x), r.max_y.max(y))
        }))
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Length of the diagonal.
    pub fn diagonal(&self) -> f64 {
        self.width().hypot(self.height())
    }

    /// Returns true if `other` lies inside `self`, allowing `epsilon` slack.
    pub fn contains_rect(&self, other: &Rect2D, epsilon: f64) -> bool {
        other.min_x >= self.min_x - epsilon
            && other.min_y >= self.min_y - epsilon
            && other.max_x <= self.max_x + epsilon
            && other.max_y <= self.max_y + epsilon
    }

    /// Returns true if the interiors overlap by more than `epsilon` on both axes.
    ///
    /// Rectangles that only share a side do not overlap.
    pub fn overlaps(&self, other: &Rect2D, epsilon: f64) -> bool {
        self.min_x < other.max_x - epsilon
            && other.min_x < self.max_x - epsilon
            && self.min_y < other.max_y - epsilon
            && other.min_y < self.max_y - epsilon
    }

    /// Smallest rectangle containing both.
    pub fn united(&self, other: &Rect2D) -> Self {
        Self::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    /// Returns a copy moved by `(dx, dy)`.
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.min_x + dx, self.min_y + dy, self.max_x + dx, self.max_y + dy)
    }
}
