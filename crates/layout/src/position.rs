//! Evaluation of one (sheet edge, piece edge) pairing.
//!
//! A [`PositionSearch`] lays one edge of a private piece copy along one edge
//! of the sheet contour, tries a mirrored placement when the direct one
//! collides, and optionally sweeps all rotations about the matched point.
//! Every collision-free placement is offered to the unit's own
//! [`BestCandidate`]. Units share nothing mutable, so any number of them can
//! run in parallel over the same [`Contour`].

use crate::candidate::{BestCandidate, PlacementMode};
use crate::contour::Contour;
use crate::geometry::Segment;
use crate::piece::LayoutPiece;
use pattern_nest_core::{normalize_rotation_increment, Rect2D};
use std::sync::atomic::{AtomicBool, Ordering};

/// Angles (degrees) this close to 0 or 360 count as no turn.
const ANGLE_EPSILON: f64 = 1e-6;

/// One unit of placement search.
pub struct PositionSearch<'a> {
    contour: &'a Contour,
    sheet_edge: usize,
    piece: LayoutPiece,
    piece_edge: usize,
    stop: &'a AtomicBool,
    rotate: bool,
    rotation_increment: u32,
    best: BestCandidate,
    angle_between: Option<f64>,
}

impl<'a> PositionSearch<'a> {
    /// Creates a search unit. Unusable rotation increments become 180.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        contour: &'a Contour,
        sheet_edge: usize,
        piece: LayoutPiece,
        piece_edge: usize,
        stop: &'a AtomicBool,
        rotate: bool,
        rotation_increment: u32,
        save_length: bool,
    ) -> Self {
        Self {
            best: BestCandidate::new(contour.width(), contour.height(), save_length),
            contour,
            sheet_edge,
            piece,
            piece_edge,
            stop,
            rotate,
            rotation_increment: normalize_rotation_increment(rotation_increment),
            angle_between: None,
        }
    }

    /// Runs the search and returns the best placement found.
    ///
    /// Returns early with whatever was found if the stop flag is raised.
    pub fn run(mut self) -> BestCandidate {
        if self.stop.load(Ordering::Relaxed) {
            return self.best;
        }

        let mut work = self.piece.clone();
        if let Some(edge) = self.combine(&mut work) {
            self.save_candidate(&work, edge, PlacementMode::Combine);
        }

        // A blank sheet is always swept so the first piece may take any angle.
        if self.rotate || self.contour.is_empty() {
            self.rotation_sweep();
        }

        self.best
    }

    /// Edges are counted on the main outline for a blank sheet and on the
    /// layout outline afterwards.
    fn on_layout(&self) -> bool {
        !self.contour.is_empty()
    }

    /// Direct touch, then the mirrored touch. Returns the piece edge used.
    fn combine(&mut self, piece: &mut LayoutPiece) -> Option<usize> {
        let sheet_edge = self.contour.global_edge(self.sheet_edge)?;

        let angle = self.combine_edges(piece, self.piece_edge, &sheet_edge)?;
        self.angle_between = Some(angle);
        if self.is_free(piece) {
            return Some(self.piece_edge);
        }

        if piece.forbid_flip() {
            return None;
        }

        piece.mirror(&sheet_edge);
        let flipped_edge = piece.edge_by_point(sheet_edge.end, self.on_layout())?;
        self.combine_edges(piece, flipped_edge, &sheet_edge)?;
        self.is_free(piece).then_some(flipped_edge)
    }

    /// Lays piece edge `piece_edge` along `sheet_edge`, end points matched.
    ///
    /// Returns the counter-clockwise angle from the sheet edge to the piece
    /// edge before alignment.
    fn combine_edges(
        &self,
        piece: &mut LayoutPiece,
        piece_edge: usize,
        sheet_edge: &Segment,
    ) -> Option<f64> {
        let edge = piece.edge(piece_edge, self.on_layout())?;
        if edge.is_degenerate() || sheet_edge.is_degenerate() {
            return None;
        }

        piece.translate(sheet_edge.end.0 - edge.end.0, sheet_edge.end.1 - edge.end.1);
        let angle = sheet_edge.angle_to(&edge);
        if !is_full_turn(angle) {
            piece.rotate(sheet_edge.end, -angle);
        }
        self.snap_to_corner(piece);
        Some(angle)
    }

    /// Moves the piece onto the sheet edge and turns it by `angle` degrees.
    fn rotate_edges(&self, piece: &mut LayoutPiece, sheet_edge: &Segment, angle: f64) -> bool {
        let Some(edge) = piece.edge(self.piece_edge, self.on_layout()) else {
            return false;
        };
        if edge.is_degenerate() {
            return false;
        }

        piece.translate(sheet_edge.end.0 - edge.end.0, sheet_edge.end.1 - edge.end.1);
        piece.rotate(sheet_edge.end, angle);
        self.snap_to_corner(piece);
        true
    }

    /// On a blank sheet the first piece goes to the bottom-left corner.
    fn snap_to_corner(&self, piece: &mut LayoutPiece) {
        if !self.contour.is_empty() {
            return;
        }
        if let Some(rect) = piece.bounding_rect() {
            piece.translate(-rect.min_x, -rect.min_y);
        }
    }

    fn rotation_sweep(&mut self) {
        let Some(sheet_edge) = self.contour.global_edge(self.sheet_edge) else {
            return;
        };

        let increment = self.rotation_increment;
        // Angle 0 repeats the direct touch when the edges were already parallel.
        let mut angle = match self.angle_between {
            Some(a) if is_full_turn(a) => increment,
            _ => 0,
        };

        while angle < 360 {
            if self.stop.load(Ordering::Relaxed) {
                return;
            }

            let mut work = self.piece.clone();
            if self.rotate_edges(&mut work, &sheet_edge, f64::from(angle)) && self.is_free(&work) {
                self.save_candidate(&work, self.piece_edge, PlacementMode::Rotation);
            }
            angle += increment;
        }
    }

    /// Containment in the sheet plus absence of overlap with the contour.
    fn is_free(&self, piece: &LayoutPiece) -> bool {
        let Some(rect) = piece.bounding_rect() else {
            return false;
        };
        if !rect.min_x.is_finite() || !rect.max_y.is_finite() {
            return false;
        }
        if !self.contour.contains_rect(&rect) {
            return false;
        }

        let Some(occupied) = self.contour.bounding_rect() else {
            return true;
        };
        if !occupied.overlaps(&rect, 0.0) {
            return true;
        }

        !self.contour.overlaps(&piece.layout_points())
    }

    fn save_candidate(&mut self, piece: &LayoutPiece, piece_edge: usize, mode: PlacementMode) {
        let united = self.contour.unite(piece, self.sheet_edge, piece_edge, mode);
        let Some(rect) = Rect2D::from_points(&united) else {
            return;
        };
        self.best.new_result(
            rect,
            self.sheet_edge,
            piece_edge,
            *piece.transform(),
            piece.is_mirrored(),
            mode,
        );
    }
}

fn is_full_turn(angle: f64) -> bool {
    angle.abs() < ANGLE_EPSILON || (360.0 - angle).abs() < ANGLE_EPSILON
}
