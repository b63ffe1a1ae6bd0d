//! Best placement bookkeeping for one piece-vs-sheet attempt.

use pattern_nest_core::{Rect2D, Transform2D};
use std::cmp::Ordering;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Slack allowed when comparing a candidate with the sheet size.
const TARGET_TOLERANCE: f64 = 1e-6;

/// Why a candidate placement was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PlacementMode {
    /// Edge-to-edge touch, possibly after a flip.
    Combine,
    /// Free rotation about the matched point.
    Rotation,
}

/// The best placement found so far.
///
/// Scores are the area of the bounding rectangle of sheet contents after the
/// placement, or its height when `save_length` is set. Lower is better.
#[derive(Debug, Clone)]
pub struct BestCandidate {
    target: Rect2D,
    save_length: bool,
    valid: bool,
    rect: Rect2D,
    sheet_edge: usize,
    piece_edge: usize,
    transform: Transform2D,
    mirrored: bool,
    mode: PlacementMode,
}

impl BestCandidate {
    /// Creates an empty candidate bounded by the sheet size.
    pub fn new(sheet_width: f64, sheet_height: f64, save_length: bool) -> Self {
        let target = Rect2D::sheet(sheet_width, sheet_height);
        Self {
            target,
            save_length,
            valid: false,
            rect: target,
            sheet_edge: 0,
            piece_edge: 0,
            transform: Transform2D::identity(),
            mirrored: false,
            mode: PlacementMode::Combine,
        }
    }

    fn score_of(&self, rect: &Rect2D) -> f64 {
        if self.save_length {
            rect.height()
        } else {
            rect.area()
        }
    }

    /// Score of the stored result (the sheet bound while none is valid).
    pub fn score(&self) -> f64 {
        self.score_of(&self.rect)
    }

    /// Records a candidate if it strictly improves on the current best.
    ///
    /// `rect` is the bounding rectangle of the sheet contents with the
    /// candidate placed. Zero-sized or non-finite candidates are ignored.
    pub fn new_result(
        &mut self,
        rect: Rect2D,
        sheet_edge: usize,
        piece_edge: usize,
        transform: Transform2D,
        mirrored: bool,
        mode: PlacementMode,
    ) {
        let score = self.score_of(&rect);
        if !score.is_finite()
            || rect.width() <= 0.0
            || rect.height() <= 0.0
            || !transform.is_finite()
        {
            return;
        }

        // Nothing larger than the sheet can improve on the seed bound.
        if rect.width() > self.target.width() + TARGET_TOLERANCE
            || rect.height() > self.target.height() + TARGET_TOLERANCE
        {
            return;
        }

        if self.valid && score >= self.score() {
            return;
        }

        self.valid = true;
        self.rect = rect;
        self.sheet_edge = sheet_edge;
        self.piece_edge = piece_edge;
        self.transform = transform;
        self.mirrored = mirrored;
        self.mode = mode;
    }

    /// Orders two valid results: score, then sheet edge, piece edge, mode.
    fn rank(&self, other: &Self) -> Ordering {
        self.score()
            .total_cmp(&other.score())
            .then(self.sheet_edge.cmp(&other.sheet_edge))
            .then(self.piece_edge.cmp(&other.piece_edge))
            .then(self.mode.cmp(&other.mode))
    }

    /// Folds another worker's best into this one.
    ///
    /// The result does not depend on merge order.
    pub fn merge(&mut self, other: &BestCandidate) {
        if !other.valid {
            return;
        }
        if !self.valid || other.rank(self) == Ordering::Less {
            self.valid = true;
            self.rect = other.rect;
            self.sheet_edge = other.sheet_edge;
            self.piece_edge = other.piece_edge;
            self.transform = other.transform;
            self.mirrored = other.mirrored;
            self.mode = other.mode;
        }
    }

    /// Returns true once a placement was recorded.
    pub fn has_result(&self) -> bool {
        self.valid
    }

    /// Bounding rectangle of the sheet contents with the best placement.
    pub fn rect(&self) -> Rect2D {
        self.rect
    }

    /// The sheet size used as the initial bound.
    pub fn target(&self) -> Rect2D {
        self.target
    }

    pub fn save_length(&self) -> bool {
        self.save_length
    }

    pub fn sheet_edge(&self) -> usize {
        self.sheet_edge
    }

    pub fn piece_edge(&self) -> usize {
        self.piece_edge
    }

    pub fn transform(&self) -> Transform2D {
        self.transform
    }

    pub fn is_mirrored(&self) -> bool {
        self.mirrored
    }

    pub fn mode(&self) -> PlacementMode {
        self.mode
    }
}
