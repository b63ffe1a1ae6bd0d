//! # Pattern-Nest Core
//!
//! Shared types for the pattern-nest garment layout engine.
//!
//! This crate holds everything the layout algorithms and their callers agree
//! on: the error type, affine transforms, robust orientation predicates, the
//! per-run policy configuration, run states with progress events, and the
//! run summary.
//!
//! ## Core Components
//!
//! - **Errors**: [`Error`], [`Result`]
//! - **Geometry primitives**: [`Transform2D`], [`Rect2D`], [`robust`] predicates
//! - **Configuration**: [`LayoutConfig`], [`Margins`], [`SelectionCase`]
//! - **Progress**: [`LayoutState`], [`LayoutEvent`], [`EventCallback`]
//! - **Summary**: [`LayoutSummary`]
//!
//! ## Configuration
//!
//! ```rust
//! use pattern_nest_core::{LayoutConfig, SelectionCase};
//!
//! let config = LayoutConfig::new()
//!     .with_paper(1500.0, 3000.0)
//!     .with_layout_gap(2.0)
//!     .with_rotation_increment(90)
//!     .with_case(SelectionCase::TwoGroups);
//!
//! assert!(config.validate().is_ok());
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod config;
pub mod error;
pub mod progress;
pub mod result;
pub mod robust;
pub mod transform;

// Re-exports
pub use config::{
    normalize_multiplier, normalize_rotation_increment, LayoutConfig, Margins, SelectionCase,
    DEFAULT_ROTATION_INCREMENT, MAX_MULTIPLIER,
};
pub use error::{Error, Result};
pub use progress::{EventCallback, LayoutEvent, LayoutState};
pub use result::LayoutSummary;
pub use transform::{Rect2D, Transform2D};
