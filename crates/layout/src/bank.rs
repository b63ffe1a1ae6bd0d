//! The inventory of pieces waiting for a sheet.
//!
//! Pieces are handed out one at a time as tickets. A ticket is only removed
//! once its piece is committed ([`Inventory::arranged`]); a piece that does
//! not fit ([`Inventory::not_arranged`]) is deferred and regrouped for the
//! next sheet.

use crate::piece::LayoutPiece;
use pattern_nest_core::{Error, Result, SelectionCase};

/// Pieces still to be laid out, ordered by a selection policy.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    pieces: Vec<LayoutPiece>,
    layout_gap: f64,
    case: SelectionCase,
    pending: Vec<usize>,
    deferred: Vec<usize>,
    arranged: Vec<bool>,
    arranged_count: usize,
    biggest_diagonal: f64,
    prepared: bool,
}

impl Inventory {
    /// Creates an empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the piece set. The inventory must be prepared again.
    pub fn set_pieces(&mut self, pieces: Vec<LayoutPiece>) {
        self.pieces = pieces;
        self.reset();
    }

    /// Sets the gap between pieces. The inventory must be prepared again.
    pub fn set_layout_gap(&mut self, gap: f64) {
        self.layout_gap = gap.max(0.0);
        self.prepared = false;
    }

    pub fn set_case(&mut self, case: SelectionCase) {
        self.case = case;
        self.prepared = false;
    }

    pub fn layout_gap(&self) -> f64 {
        self.layout_gap
    }

    pub fn case(&self) -> SelectionCase {
        self.case
    }

    fn reset(&mut self) {
        self.pending.clear();
        self.deferred.clear();
        self.arranged = vec![false; self.pieces.len()];
        self.arranged_count = 0;
        self.biggest_diagonal = 0.0;
        self.prepared = false;
    }

    /// Validates the pieces, builds layout outlines and orders the tickets.
    pub fn prepare(&mut self) -> Result<()> {
        self.reset();

        if self.pieces.is_empty() {
            return Err(Error::PrepareLayout("no pieces to lay out".into()));
        }

        for piece in &mut self.pieces {
            piece
                .validate()
                .map_err(|e| Error::PrepareLayout(e.to_string()))?;
            piece.reset_transform();
            piece.prepare_layout(self.layout_gap);
            if piece.layout_edges_count() < 3 || piece.layout_area() <= 0.0 {
                return Err(Error::PrepareLayout(format!(
                    "piece '{}': layout outline collapsed",
                    piece.id()
                )));
            }
        }

        self.biggest_diagonal = self
            .pieces
            .iter()
            .map(LayoutPiece::diagonal)
            .fold(0.0, f64::max);

        let all: Vec<usize> = (0..self.pieces.len()).collect();
        self.pending = self.group(all);
        self.prepared = true;
        Ok(())
    }

    /// Orders indices by size tier, then by descending area, then by id.
    fn group(&self, mut indices: Vec<usize>) -> Vec<usize> {
        let area = |i: usize| self.pieces[i].layout_area();
        let (min, max) = indices.iter().fold((f64::INFINITY, 0.0_f64), |(lo, hi), &i| {
            (lo.min(area(i)), hi.max(area(i)))
        });

        let tier = |a: f64| -> u8 {
            match self.case {
                SelectionCase::Desc => 0,
                SelectionCase::TwoGroups => {
                    let s = (max + min) / 2.0;
                    if a >= s {
                        0
                    } else {
                        1
                    }
                }
                SelectionCase::ThreeGroups => {
                    let s1 = max - (max - min) / 3.0;
                    let s2 = min + (max - min) / 3.0;
                    if a > s1 {
                        0
                    } else if a > s2 {
                        1
                    } else {
                        2
                    }
                }
            }
        };

        indices.sort_by(|&a, &b| {
            tier(area(a))
                .cmp(&tier(area(b)))
                .then(area(b).total_cmp(&area(a)))
                .then_with(|| self.pieces[a].id().cmp(self.pieces[b].id()))
        });
        indices
    }

    /// Returns the next piece to try without removing it.
    ///
    /// When the current round is exhausted, deferred pieces are regrouped
    /// into a new round. Returns `None` once every piece is arranged.
    pub fn ticket(&mut self) -> Option<usize> {
        if !self.prepared {
            return None;
        }
        if self.pending.is_empty() && !self.deferred.is_empty() {
            let deferred = std::mem::take(&mut self.deferred);
            self.pending = self.group(deferred);
        }
        self.pending.first().copied()
    }

    /// Piece behind a ticket.
    pub fn piece(&self, index: usize) -> Option<&LayoutPiece> {
        self.pieces.get(index)
    }

    /// Marks a piece as committed to a sheet.
    pub fn arranged(&mut self, index: usize) {
        if let Some(pos) = self.pending.iter().position(|&i| i == index) {
            self.pending.remove(pos);
            self.arranged[index] = true;
            self.arranged_count += 1;
        }
    }

    /// Defers a piece that did not fit on the current sheet.
    pub fn not_arranged(&mut self, index: usize) {
        if let Some(pos) = self.pending.iter().position(|&i| i == index) {
            self.pending.remove(pos);
            self.deferred.push(index);
        }
    }

    /// Pieces left to try on the current sheet.
    pub fn left_to_arrange(&self) -> usize {
        self.pending.len()
    }

    /// Pieces not yet committed anywhere.
    pub fn all_piece_count(&self) -> usize {
        self.pending.len() + self.deferred.len()
    }

    pub fn arranged_count(&self) -> usize {
        self.arranged_count
    }

    pub fn is_arranged(&self, index: usize) -> bool {
        self.arranged.get(index).copied().unwrap_or(false)
    }

    /// Ids of pieces not yet committed.
    pub fn unarranged_ids(&self) -> Vec<String> {
        self.pieces
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.is_arranged(*i))
            .map(|(_, p)| p.id().to_string())
            .collect()
    }

    /// Largest layout bounding diagonal among the pieces.
    pub fn biggest_diagonal(&self) -> f64 {
        self.biggest_diagonal
    }

    /// Total piece count.
    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }
}
