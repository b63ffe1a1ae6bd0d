//! # Pattern Nest Layout
//!
//! Edge-matching nesting of garment pattern pieces onto rectangular paper
//! sheets.
//!
//! Each piece is tried against every edge of the sheet's occupied contour.
//! For every (contour edge, piece edge) pair the piece is aligned edge to
//! edge, optionally mirrored or swept through rotations, and the placement
//! that keeps the sheet contents most compact wins. When a sheet can take no
//! more pieces a new one is opened.
//!
//! ## Features
//!
//! - Main, seam-allowance and layout outlines per piece
//! - Uniform layout gap between pieces
//! - Mirroring with a per-piece forbid-flip flag
//! - Rotation sweep at a configurable increment
//! - Parallel edge-pair search with rayon
//! - Strip optimization and page uniting
//! - Progress events and cooperative abort
//!
//! ## Quick Start
//!
//! ```rust
//! use pattern_nest_layout::{Generator, LayoutConfig, LayoutPiece};
//!
//! let pieces = vec![
//!     LayoutPiece::rectangle("front", 120.0, 80.0).with_seam_allowance(5.0),
//!     LayoutPiece::l_shape("yoke", 90.0, 90.0, 40.0, 40.0),
//! ];
//!
//! let config = LayoutConfig::new()
//!     .with_paper(400.0, 600.0)
//!     .with_layout_gap(2.0)
//!     .with_rotation_increment(90);
//!
//! let result = Generator::new(config).generate(&pieces).unwrap();
//!
//! println!("Placed {} pieces on {} sheets, utilization: {:.1}%",
//!     result.placed_count(),
//!     result.sheets_used(),
//!     result.utilization() * 100.0);
//! ```
//!
//! ## Pieces
//!
//! ```rust
//! use pattern_nest_layout::LayoutPiece;
//!
//! // Rectangle
//! let rect = LayoutPiece::rectangle("r1", 100.0, 50.0);
//!
//! // Custom outline with an explicit allowance
//! let sleeve = LayoutPiece::new("sleeve", vec![(0.0, 0.0), (60.0, 0.0), (45.0, 90.0), (15.0, 90.0)])
//!     .with_seam_allowance(1.5)
//!     .with_forbid_flip(true);
//! ```

pub mod bank;
pub mod candidate;
pub mod contour;
pub mod generator;
pub mod geometry;
pub mod piece;
pub mod position;
pub mod sheet;

// Re-exports
pub use bank::Inventory;
pub use candidate::{BestCandidate, PlacementMode};
pub use contour::Contour;
pub use generator::{AbortHandle, Generator, LayoutResult, MAX_PAGE_LENGTH};
pub use geometry::Segment;
pub use piece::{LayoutPiece, PieceId};
pub use position::PositionSearch;
pub use sheet::Sheet;
pub use pattern_nest_core::{
    Error, EventCallback, LayoutConfig, LayoutEvent, LayoutState, LayoutSummary, Margins,
    Rect2D, Result, SelectionCase, Transform2D,
};
