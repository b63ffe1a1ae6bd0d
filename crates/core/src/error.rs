//! Error types for pattern-nest.

use thiserror::Error;

/// Result type alias for pattern-nest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or running a layout.
///
/// Failed placement attempts for a single piece are not errors: the piece is
/// deferred to the next sheet. These variants cover misuse and the
/// run-level failure kinds.
#[derive(Debug, Error)]
pub enum Error {
    /// A piece outline is unusable (too few edges, zero area, non-finite).
    #[error("Invalid piece: {0}")]
    InvalidPiece(String),

    /// A sheet was given unusable dimensions or mutated after first use.
    #[error("Invalid sheet: {0}")]
    InvalidSheet(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The inventory could not be prepared.
    #[error("Layout preparation failed: {0}")]
    PrepareLayout(String),

    /// A piece could not be placed even on an empty sheet.
    #[error("Piece '{0}' does not fit on an empty sheet")]
    EmptyPaper(String),

    /// Computation cancelled.
    #[error("Computation cancelled")]
    Cancelled,

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
