//! Occupied silhouette of one sheet.

use crate::candidate::PlacementMode;
use crate::geometry::{self, Segment};
use crate::piece::LayoutPiece;
use pattern_nest_core::robust::to_cw;
use pattern_nest_core::{Error, Rect2D, Result};

/// The outer boundary of everything placed on a sheet.
///
/// The boundary is stored clockwise, so the free side of every edge lies to
/// its left. An empty boundary means a blank sheet; its only edge is the
/// synthetic left border returned by [`Contour::empty_sheet_edge`].
#[derive(Debug, Clone, Default)]
pub struct Contour {
    points: Vec<(f64, f64)>,
    width: f64,
    height: f64,
    shift: f64,
}

impl Contour {
    /// Creates a blank contour for a `width × height` sheet.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            points: Vec::new(),
            width,
            height,
            shift: 0.0,
        }
    }

    /// Sets the edge subdivision length.
    pub fn with_shift(mut self, shift: f64) -> Self {
        self.shift = shift.max(0.0);
        self
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn shift(&self) -> f64 {
        self.shift
    }

    /// Resizes the sheet. Only allowed while nothing is placed.
    pub fn set_size(&mut self, width: f64, height: f64) -> Result<()> {
        if !self.is_empty() {
            return Err(Error::InvalidSheet(
                "sheet size is fixed once a piece is placed".into(),
            ));
        }
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Sets the edge subdivision length. Only allowed while nothing is placed.
    pub fn set_shift(&mut self, shift: f64) -> Result<()> {
        if !self.is_empty() {
            return Err(Error::InvalidSheet(
                "shift is fixed once a piece is placed".into(),
            ));
        }
        self.shift = shift.max(0.0);
        Ok(())
    }

    /// Returns true if the sheet is blank.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns true if the sheet has a usable size.
    pub fn has_valid_size(&self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// Occupied boundary points (clockwise).
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Replaces the occupied boundary with a union result.
    pub fn set_points(&mut self, points: Vec<(f64, f64)>) {
        self.points = points;
    }

    /// The sheet rectangle `[0, width] × [0, height]`.
    pub fn sheet_rect(&self) -> Rect2D {
        Rect2D::sheet(self.width, self.height)
    }

    /// Bounding rectangle of the occupied boundary, `None` when blank.
    pub fn bounding_rect(&self) -> Option<Rect2D> {
        Rect2D::from_points(&self.points)
    }

    /// Returns true if `rect` lies inside the sheet.
    pub fn contains_rect(&self, rect: &Rect2D) -> bool {
        self.sheet_rect().contains_rect(rect, 1e-6)
    }

    /// The synthetic edge of a blank sheet: the left border, top to bottom.
    pub fn empty_sheet_edge(&self) -> Segment {
        Segment::new((0.0, self.height), (0.0, 0.0))
    }

    /// Number of addressable edges (1 for a blank sheet).
    pub fn global_edges_count(&self) -> usize {
        if self.is_empty() {
            1
        } else {
            self.points.len()
        }
    }

    /// Edge `index` (1-based) of the occupied boundary.
    pub fn global_edge(&self, index: usize) -> Option<Segment> {
        if self.is_empty() {
            return (index == 1).then(|| self.empty_sheet_edge());
        }
        geometry::ring_edge(&self.points, index)
    }

    /// Returns true if the ring overlaps the occupied area.
    pub fn overlaps(&self, ring: &[(f64, f64)]) -> bool {
        !self.is_empty() && geometry::overlaps(&self.points, ring)
    }

    /// Computes the boundary after adding an already placed piece.
    ///
    /// The edge indices name the pairing that produced the placement and must
    /// be in range for this contour and piece. Returns an empty vector when
    /// the pairing is out of range or the union is degenerate (the piece does
    /// not connect to the silhouette, or the result splits into several parts).
    pub fn unite(
        &self,
        piece: &LayoutPiece,
        sheet_edge: usize,
        piece_edge: usize,
        mode: PlacementMode,
    ) -> Vec<(f64, f64)> {
        let on_layout = !self.is_empty();
        if sheet_edge == 0
            || sheet_edge > self.global_edges_count()
            || piece_edge == 0
            || piece_edge > piece.edges_count(on_layout)
        {
            log::trace!(
                "unite rejected: edge pair ({}, {}) out of range for '{}'",
                sheet_edge,
                piece_edge,
                piece.id()
            );
            return Vec::new();
        }

        let outline = piece.layout_points();
        if self.is_empty() {
            return to_cw(outline);
        }

        match geometry::union(&self.points, &outline) {
            Some(merged) => geometry::densify(&to_cw(merged), self.shift),
            None => {
                log::trace!(
                    "unite rejected: degenerate {:?} union for '{}' at edge pair ({}, {})",
                    mode,
                    piece.id(),
                    sheet_edge,
                    piece_edge
                );
                Vec::new()
            }
        }
    }
}
