//! Run state and progress events.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Terminal state of a layout run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LayoutState {
    /// The run completed (or has not failed yet).
    #[default]
    NoError,
    /// The inventory could not be prepared.
    PrepareLayoutError,
    /// The run was aborted by the caller.
    ProcessStopped,
    /// A piece does not fit even on an empty sheet.
    EmptyPaperError,
}

impl LayoutState {
    /// Returns true for the successful state.
    pub fn is_ok(self) -> bool {
        self == LayoutState::NoError
    }

    /// Short human-readable description.
    pub fn describe(self) -> &'static str {
        match self {
            LayoutState::NoError => "layout finished",
            LayoutState::PrepareLayoutError => "could not prepare the layout",
            LayoutState::ProcessStopped => "layout stopped by the user",
            LayoutState::EmptyPaperError => "a piece does not fit on an empty sheet",
        }
    }
}

impl std::fmt::Display for LayoutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.describe())
    }
}

/// An observable step of a layout run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LayoutEvent {
    /// The run started with this many pieces.
    Started { total: usize },
    /// A piece was committed; `count` is the running total.
    Arranged { count: usize },
    /// The run finished without error.
    Finished,
    /// The run ended abnormally.
    Error(LayoutState),
}

impl LayoutEvent {
    /// Returns true if this event ends the run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LayoutEvent::Finished | LayoutEvent::Error(_))
    }
}

/// Event callback for long-running layouts.
pub type EventCallback = Box<dyn Fn(LayoutEvent) + Send + Sync>;
