//! Layout run summary.

use crate::progress::LayoutState;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Compact statistics for a finished layout run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LayoutSummary {
    /// Pieces handed to the run.
    pub total_requested: usize,
    /// Pieces committed to a sheet.
    pub total_placed: usize,
    /// Sheets produced.
    pub sheets_used: usize,
    /// Placed area over total sheet area, in percent.
    pub utilization_percent: f64,
    /// Wall-clock time in milliseconds.
    pub time_ms: u64,
    /// Final run state.
    pub state: LayoutState,
}

impl LayoutSummary {
    /// Returns true if every requested piece was placed without error.
    pub fn is_complete(&self) -> bool {
        self.state.is_ok() && self.total_placed == self.total_requested
    }

    /// Utilization formatted as a percentage string.
    pub fn utilization_label(&self) -> String {
        format!("{:.1}%", self.utilization_percent)
    }
}

impl std::fmt::Display for LayoutSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} pieces on {} sheet(s), {} used, {} ms ({})",
            self.total_placed,
            self.total_requested,
            self.sheets_used,
            self.utilization_label(),
            self.time_ms,
            self.state
        )
    }
}
