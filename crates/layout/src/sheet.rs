//! One sheet of paper and the pieces committed to it.

use crate::candidate::BestCandidate;
use crate::contour::Contour;
use crate::piece::LayoutPiece;
use crate::position::PositionSearch;
use pattern_nest_core::{normalize_rotation_increment, Rect2D, Result, DEFAULT_ROTATION_INCREMENT};
use rayon::prelude::*;
use rayon::ThreadPool;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A sheet being filled, or a finished page.
///
/// Pieces are only ever added through [`Sheet::arrange_piece`], which either
/// commits a piece completely (transform applied and contour updated) or
/// leaves the sheet untouched.
#[derive(Debug, Clone)]
pub struct Sheet {
    contour: Contour,
    pieces: Vec<LayoutPiece>,
    paper_index: usize,
    rotate: bool,
    rotation_increment: u32,
    save_length: bool,
    pool: Option<Arc<ThreadPool>>,
}

impl Sheet {
    /// Creates an empty `width × height` sheet.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            contour: Contour::new(width, height),
            pieces: Vec::new(),
            paper_index: 0,
            rotate: true,
            rotation_increment: DEFAULT_ROTATION_INCREMENT,
            save_length: false,
            pool: None,
        }
    }

    /// Creates a finished page from already placed pieces.
    pub(crate) fn assembled(
        width: f64,
        height: f64,
        paper_index: usize,
        pieces: Vec<LayoutPiece>,
    ) -> Self {
        let mut sheet = Self::new(width, height);
        sheet.paper_index = paper_index;
        sheet.pieces = pieces;
        sheet
    }

    pub fn with_paper_index(mut self, index: usize) -> Self {
        self.paper_index = index;
        self
    }

    pub fn with_shift(mut self, shift: f64) -> Self {
        self.contour = self.contour.with_shift(shift);
        self
    }

    pub fn with_rotate(mut self, rotate: bool) -> Self {
        self.rotate = rotate;
        self
    }

    /// Sets the rotation step; unusable values become 180.
    pub fn with_rotation_increment(mut self, degrees: u32) -> Self {
        self.set_rotation_increment(degrees);
        self
    }

    pub fn with_save_length(mut self, save_length: bool) -> Self {
        self.save_length = save_length;
        self
    }

    /// Runs the edge-pair search on a dedicated pool instead of the global one.
    pub fn with_pool(mut self, pool: Arc<ThreadPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Sets the rotation step; unusable values become 180.
    pub fn set_rotation_increment(&mut self, degrees: u32) {
        let normalized = normalize_rotation_increment(degrees);
        if normalized != degrees {
            log::warn!(
                "rotation increment {} does not divide 360 within 1..=180, using {}",
                degrees,
                normalized
            );
        }
        self.rotation_increment = normalized;
    }

    /// Resizes the sheet. Fails once a piece was placed.
    pub fn set_size(&mut self, width: f64, height: f64) -> Result<()> {
        self.contour.set_size(width, height)
    }

    pub fn width(&self) -> f64 {
        self.contour.width()
    }

    pub fn height(&self) -> f64 {
        self.contour.height()
    }

    pub fn paper_index(&self) -> usize {
        self.paper_index
    }

    pub fn rotate(&self) -> bool {
        self.rotate
    }

    pub fn rotation_increment(&self) -> u32 {
        self.rotation_increment
    }

    pub fn save_length(&self) -> bool {
        self.save_length
    }

    pub fn contour(&self) -> &Contour {
        &self.contour
    }

    /// Committed pieces in placement order.
    pub fn pieces(&self) -> &[LayoutPiece] {
        &self.pieces
    }

    /// Consumes the sheet, returning its pieces.
    pub fn into_pieces(self) -> Vec<LayoutPiece> {
        self.pieces
    }

    /// Number of committed pieces.
    pub fn count(&self) -> usize {
        self.pieces.len()
    }

    /// Combined bounding rectangle of the committed layout outlines.
    pub fn pieces_bounding_rect(&self) -> Option<Rect2D> {
        self.pieces
            .iter()
            .filter_map(LayoutPiece::bounding_rect)
            .reduce(|a, b| a.united(&b))
    }

    /// Sheet length after optional cropping to the pieces.
    pub fn cropped_height(&self, auto_crop: bool) -> f64 {
        if auto_crop {
            if let Some(rect) = self.pieces_bounding_rect() {
                if rect.height() < self.height() {
                    return rect.height();
                }
            }
        }
        self.height()
    }

    /// Placed main-outline area.
    pub fn used_area(&self) -> f64 {
        self.pieces.iter().map(LayoutPiece::area).sum()
    }

    /// Tries to place `piece` on this sheet.
    ///
    /// Every (contour edge, piece edge) pair is searched in parallel; the best
    /// result is committed. Returns false when nothing fits, the inputs are
    /// unusable, or `stop` was raised. In those cases the sheet is unchanged.
    pub fn arrange_piece(&mut self, piece: &LayoutPiece, stop: &AtomicBool) -> bool {
        if !self.contour.has_valid_size() {
            return false;
        }
        if piece.layout_edges_count() < 3 || piece.main_edges_count() < 3 {
            return false;
        }

        let (rotate, increment) = if piece.forbid_flip() && !self.rotate {
            // Without mirroring a half turn is the only way out of a bad touch.
            (true, 180)
        } else {
            (self.rotate, self.rotation_increment)
        };

        let best = self.search(piece, stop, rotate, increment);

        if stop.load(Ordering::Relaxed) {
            return false;
        }
        if !best.has_result() {
            log::debug!(
                "sheet {}: no position for '{}'",
                self.paper_index,
                piece.id()
            );
            return false;
        }

        let mut placed = piece.clone();
        placed.set_transform(best.transform());
        let united = self
            .contour
            .unite(&placed, best.sheet_edge(), best.piece_edge(), best.mode());
        if united.is_empty() {
            return false;
        }

        self.contour.set_points(united);
        log::debug!(
            "sheet {}: placed '{}' at edge pair ({}, {}) by {:?}{}",
            self.paper_index,
            placed.id(),
            best.sheet_edge(),
            best.piece_edge(),
            best.mode(),
            if best.is_mirrored() { ", mirrored" } else { "" }
        );
        self.pieces.push(placed);
        true
    }

    fn search(
        &self,
        piece: &LayoutPiece,
        stop: &AtomicBool,
        rotate: bool,
        increment: u32,
    ) -> BestCandidate {
        let sheet_edges = self.contour.global_edges_count();
        let piece_edges = piece.edges_count(!self.contour.is_empty());
        let pairs: Vec<(usize, usize)> = (1..=sheet_edges)
            .flat_map(|s| (1..=piece_edges).map(move |p| (s, p)))
            .collect();

        let contour = &self.contour;
        let (width, height, save_length) = (self.width(), self.height(), self.save_length);
        let run = || {
            pairs
                .into_par_iter()
                .map(|(sheet_edge, piece_edge)| {
                    PositionSearch::new(
                        contour,
                        sheet_edge,
                        piece.clone(),
                        piece_edge,
                        stop,
                        rotate,
                        increment,
                        save_length,
                    )
                    .run()
                })
                .reduce(
                    || BestCandidate::new(width, height, save_length),
                    |mut acc, other| {
                        acc.merge(&other);
                        acc
                    },
                )
        };

        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry;
    use approx::assert_relative_eq;

    fn assert_no_overlap(sheet: &Sheet) {
        let pieces = sheet.pieces();
        for (i, a) in pieces.iter().enumerate() {
            for b in &pieces[i + 1..] {
                assert!(
                    !geometry::overlaps(&a.layout_points(), &b.layout_points()),
                    "'{}' overlaps '{}'",
                    a.id(),
                    b.id()
                );
            }
        }
    }

    #[test]
    fn test_first_piece_becomes_contour() {
        let mut sheet = Sheet::new(400.0, 600.0).with_rotate(false);
        let stop = AtomicBool::new(false);
        let piece = LayoutPiece::rectangle("a", 100.0, 100.0);

        assert!(sheet.arrange_piece(&piece, &stop));
        assert_eq!(sheet.count(), 1);

        let placed = &sheet.pieces()[0];
        let rect = placed.bounding_rect().unwrap();
        assert_relative_eq!(rect.min_x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(rect.min_y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(
            geometry::area(sheet.contour().points()),
            10_000.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_second_piece_touches_first() {
        let mut sheet = Sheet::new(400.0, 600.0).with_rotate(false);
        let stop = AtomicBool::new(false);

        assert!(sheet.arrange_piece(&LayoutPiece::rectangle("a", 100.0, 100.0), &stop));
        assert!(sheet.arrange_piece(&LayoutPiece::rectangle("b", 100.0, 100.0), &stop));

        assert_no_overlap(&sheet);
        let rect = sheet.pieces_bounding_rect().unwrap();
        assert_relative_eq!(rect.area(), 20_000.0, epsilon = 1e-6);
        assert_relative_eq!(sheet.used_area(), 20_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_oversized_piece_rejected() {
        let mut sheet = Sheet::new(400.0, 600.0).with_rotate(false);
        let stop = AtomicBool::new(false);

        assert!(!sheet.arrange_piece(&LayoutPiece::rectangle("big", 500.0, 500.0), &stop));
        assert_eq!(sheet.count(), 0);
        assert!(sheet.contour().is_empty());
    }

    #[test]
    fn test_invalid_sheet_or_piece_rejected() {
        let stop = AtomicBool::new(false);
        let piece = LayoutPiece::rectangle("a", 10.0, 10.0);
        assert!(!Sheet::new(0.0, 100.0).arrange_piece(&piece, &stop));

        let line = LayoutPiece::new("line", vec![(0.0, 0.0), (10.0, 0.0)]);
        assert!(!Sheet::new(100.0, 100.0).arrange_piece(&line, &stop));
    }

    #[test]
    fn test_stopped_sheet_is_unchanged() {
        let mut sheet = Sheet::new(400.0, 600.0);
        let stop = AtomicBool::new(true);
        assert!(!sheet.arrange_piece(&LayoutPiece::rectangle("a", 100.0, 100.0), &stop));
        assert_eq!(sheet.count(), 0);
        assert!(sheet.contour().is_empty());
    }

    #[test]
    fn test_fills_until_full() {
        let mut sheet = Sheet::new(200.0, 200.0).with_rotation_increment(90);
        let stop = AtomicBool::new(false);

        let mut placed = 0;
        for i in 0..6 {
            if sheet.arrange_piece(&LayoutPiece::rectangle(format!("p{i}"), 100.0, 100.0), &stop) {
                placed += 1;
            }
        }
        assert_eq!(placed, 4);
        assert_no_overlap(&sheet);
        for piece in sheet.pieces() {
            assert!(sheet
                .contour()
                .sheet_rect()
                .contains_rect(&piece.bounding_rect().unwrap(), 1e-6));
        }
    }

    #[test]
    fn test_dedicated_pool() {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let mut sheet = Sheet::new(400.0, 600.0).with_pool(Arc::new(pool));
        let stop = AtomicBool::new(false);
        assert!(sheet.arrange_piece(&LayoutPiece::l_shape("l", 80.0, 80.0, 30.0, 30.0), &stop));
    }

    #[test]
    fn test_rotation_increment_coerced() {
        let sheet = Sheet::new(10.0, 10.0).with_rotation_increment(7);
        assert_eq!(sheet.rotation_increment(), 180);
    }

    #[test]
    fn test_cropped_height() {
        let mut sheet = Sheet::new(400.0, 600.0);
        let stop = AtomicBool::new(false);
        assert_relative_eq!(sheet.cropped_height(true), 600.0);

        assert!(sheet.arrange_piece(&LayoutPiece::rectangle("a", 100.0, 100.0), &stop));
        assert_relative_eq!(sheet.cropped_height(true), 100.0, epsilon = 1e-9);
        assert_relative_eq!(sheet.cropped_height(false), 600.0);
    }

    #[test]
    fn test_size_locked_after_placement() {
        let mut sheet = Sheet::new(400.0, 600.0);
        assert!(sheet.set_size(300.0, 300.0).is_ok());
        let stop = AtomicBool::new(false);
        assert!(sheet.arrange_piece(&LayoutPiece::rectangle("a", 10.0, 10.0), &stop));
        assert!(sheet.set_size(100.0, 100.0).is_err());
    }
}
