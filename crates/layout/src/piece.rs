//! Pattern pieces as seen by the layout engine.

use crate::geometry::{self, Segment};
use pattern_nest_core::robust::to_ccw;
use pattern_nest_core::{Error, Rect2D, Result, Transform2D};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Piece identifier.
pub type PieceId = String;

/// A pattern piece to be laid out.
///
/// Holds three outlines in piece-local coordinates: the main outline (sewing
/// line), the allowance outline (main outline plus seam allowance) and the
/// layout outline (allowance outline grown by half the layout gap). All are
/// stored counter-clockwise. Placement only changes [`transform`], so copies
/// handed to concurrent search units never share mutable state.
///
/// [`transform`]: LayoutPiece::transform
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LayoutPiece {
    id: PieceId,
    main: Vec<(f64, f64)>,
    allowance: Vec<(f64, f64)>,
    layout: Vec<(f64, f64)>,
    transform: Transform2D,
    forbid_flip: bool,
}

impl LayoutPiece {
    /// Creates a piece whose allowance and layout outlines equal `main`.
    pub fn new(id: impl Into<PieceId>, main: Vec<(f64, f64)>) -> Self {
        let main = to_ccw(geometry::clean_ring(&main));
        Self {
            id: id.into(),
            allowance: main.clone(),
            layout: main.clone(),
            main,
            transform: Transform2D::identity(),
            forbid_flip: false,
        }
    }

    /// Creates an axis-aligned rectangle with its corner at the origin.
    pub fn rectangle(id: impl Into<PieceId>, width: f64, height: f64) -> Self {
        Self::new(
            id,
            vec![(0.0, 0.0), (width, 0.0), (width, height), (0.0, height)],
        )
    }

    /// Creates an L-shaped piece.
    pub fn l_shape(
        id: impl Into<PieceId>,
        width: f64,
        height: f64,
        notch_width: f64,
        notch_height: f64,
    ) -> Self {
        Self::new(
            id,
            vec![
                (0.0, 0.0),
                (width, 0.0),
                (width, notch_height),
                (notch_width, notch_height),
                (notch_width, height),
                (0.0, height),
            ],
        )
    }

    /// Sets the seam-allowance outline. The layout outline follows it.
    pub fn with_allowance(mut self, allowance: Vec<(f64, f64)>) -> Self {
        self.allowance = to_ccw(geometry::clean_ring(&allowance));
        self.layout = self.allowance.clone();
        self
    }

    /// Grows the allowance outline uniformly by `width` as a seam allowance.
    pub fn with_seam_allowance(self, width: f64) -> Self {
        let allowance = geometry::offset_outward(&self.main, width);
        self.with_allowance(allowance)
    }

    /// Forbids mirroring (directional prints, one-way fabrics).
    pub fn with_forbid_flip(mut self, forbid: bool) -> Self {
        self.forbid_flip = forbid;
        self
    }

    /// Rebuilds the layout outline as the allowance outline grown by `gap / 2`.
    pub fn prepare_layout(&mut self, gap: f64) {
        self.layout = if gap > 0.0 {
            geometry::offset_outward(&self.allowance, gap / 2.0)
        } else {
            self.allowance.clone()
        };
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn forbid_flip(&self) -> bool {
        self.forbid_flip
    }

    pub fn transform(&self) -> &Transform2D {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: Transform2D) {
        self.transform = transform;
    }

    /// Clears all placement.
    pub fn reset_transform(&mut self) {
        self.transform = Transform2D::identity();
    }

    /// Returns true if the committed transform contains a reflection.
    pub fn is_mirrored(&self) -> bool {
        self.transform.is_mirrored()
    }

    /// Moves the piece.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.transform = self.transform.then(&Transform2D::translation(dx, dy));
    }

    /// Rotates the piece counter-clockwise by `degrees` about `pivot`.
    pub fn rotate(&mut self, pivot: (f64, f64), degrees: f64) {
        self.transform = self
            .transform
            .then(&Transform2D::rotation_about(pivot, degrees));
    }

    /// Mirrors the piece across the line through `axis`.
    pub fn mirror(&mut self, axis: &Segment) {
        self.transform = self
            .transform
            .then(&Transform2D::reflection_across(axis.start, axis.end));
    }

    /// Main outline in piece-local coordinates.
    pub fn local_main(&self) -> &[(f64, f64)] {
        &self.main
    }

    /// Allowance outline in piece-local coordinates.
    pub fn local_allowance(&self) -> &[(f64, f64)] {
        &self.allowance
    }

    /// Layout outline in piece-local coordinates.
    pub fn local_layout(&self) -> &[(f64, f64)] {
        &self.layout
    }

    fn placed(&self, ring: &[(f64, f64)]) -> Vec<(f64, f64)> {
        let mut points = self.transform.apply_all(ring);
        // Reflection reverses the winding; keep every placed ring counter-clockwise.
        if self.transform.is_mirrored() {
            points.reverse();
        }
        points
    }

    /// Placed main outline (counter-clockwise).
    pub fn main_points(&self) -> Vec<(f64, f64)> {
        self.placed(&self.main)
    }

    /// Placed allowance outline (counter-clockwise).
    pub fn allowance_points(&self) -> Vec<(f64, f64)> {
        self.placed(&self.allowance)
    }

    /// Placed layout outline (counter-clockwise).
    pub fn layout_points(&self) -> Vec<(f64, f64)> {
        self.placed(&self.layout)
    }

    pub fn main_edges_count(&self) -> usize {
        self.main.len()
    }

    pub fn layout_edges_count(&self) -> usize {
        self.layout.len()
    }

    /// Edge count of the main or layout outline.
    pub fn edges_count(&self, on_layout: bool) -> usize {
        if on_layout {
            self.layout_edges_count()
        } else {
            self.main_edges_count()
        }
    }

    /// Placed main-outline edge `index` (1-based).
    pub fn main_edge(&self, index: usize) -> Option<Segment> {
        geometry::ring_edge(&self.main_points(), index)
    }

    /// Placed layout-outline edge `index` (1-based).
    pub fn layout_edge(&self, index: usize) -> Option<Segment> {
        geometry::ring_edge(&self.layout_points(), index)
    }

    /// Placed edge `index` of the main or layout outline.
    pub fn edge(&self, index: usize, on_layout: bool) -> Option<Segment> {
        if on_layout {
            self.layout_edge(index)
        } else {
            self.main_edge(index)
        }
    }

    /// Index of the edge whose end point lies closest to `point`.
    pub fn edge_by_point(&self, point: (f64, f64), on_layout: bool) -> Option<usize> {
        let ring = if on_layout {
            self.layout_points()
        } else {
            self.main_points()
        };
        let n = ring.len();
        (1..=n)
            .map(|i| {
                let (x, y) = ring[i % n];
                (i, (x - point.0).hypot(y - point.1))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Bounding rectangle of the placed layout outline.
    pub fn bounding_rect(&self) -> Option<Rect2D> {
        Rect2D::from_points(&self.layout_points())
    }

    /// Bounding rectangle of the placed main outline.
    pub fn main_bounding_rect(&self) -> Option<Rect2D> {
        Rect2D::from_points(&self.main_points())
    }

    /// Main-outline area.
    pub fn area(&self) -> f64 {
        geometry::area(&self.main)
    }

    /// Layout-outline area.
    pub fn layout_area(&self) -> f64 {
        geometry::area(&self.layout)
    }

    /// Diagonal of the unrotated layout bounding rectangle.
    pub fn diagonal(&self) -> f64 {
        Rect2D::from_points(&self.layout)
            .map(|r| r.diagonal())
            .unwrap_or(0.0)
    }

    /// Checks that both outlines are usable polygons.
    pub fn validate(&self) -> Result<()> {
        for (name, ring) in [("main", &self.main), ("allowance", &self.allowance)] {
            if ring.len() < 3 {
                return Err(Error::InvalidPiece(format!(
                    "piece '{}': {} outline has {} edges, need at least 3",
                    self.id,
                    name,
                    ring.len()
                )));
            }
            if !geometry::is_finite_ring(ring) {
                return Err(Error::InvalidPiece(format!(
                    "piece '{}': {} outline has non-finite coordinates",
                    self.id, name
                )));
            }
            if geometry::area(ring) <= 0.0 {
                return Err(Error::InvalidPiece(format!(
                    "piece '{}': {} outline has zero area",
                    self.id, name
                )));
            }
        }
        Ok(())
    }
}
