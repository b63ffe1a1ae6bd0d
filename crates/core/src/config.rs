//! Layout policy configuration.

use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Rotation increment used when a requested value is unusable.
pub const DEFAULT_ROTATION_INCREMENT: u32 = 180;

/// Upper bound for the strip-optimization multiplier.
pub const MAX_MULTIPLIER: u8 = 10;

/// Coerces a rotation increment into a divisor of 360 within `1..=180`.
///
/// Anything else becomes [`DEFAULT_ROTATION_INCREMENT`].
pub fn normalize_rotation_increment(value: u32) -> u32 {
    if (1..=180).contains(&value) && 360 % value == 0 {
        value
    } else {
        DEFAULT_ROTATION_INCREMENT
    }
}

/// Clamps the strip-optimization multiplier into `1..=10`.
pub fn normalize_multiplier(value: u8) -> u8 {
    value.clamp(1, MAX_MULTIPLIER)
}

/// How the inventory orders pieces for placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SelectionCase {
    /// Three size tiers (big, middle, small).
    #[default]
    ThreeGroups,
    /// Two size tiers split at the mean of the extreme areas.
    TwoGroups,
    /// Strictly descending area.
    Desc,
}

/// Printer margins subtracted from the paper size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Margins {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Margins {
    /// Same margin on every side.
    pub fn uniform(value: f64) -> Self {
        Self {
            left: value,
            top: value,
            right: value,
            bottom: value,
        }
    }
}

/// Policy for one layout run.
///
/// Built once and handed to the generator; the engine never reads ambient
/// settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LayoutConfig {
    /// Paper width.
    pub paper_width: f64,

    /// Paper height (roll length for a single sheet).
    pub paper_height: f64,

    /// Printer margins.
    pub margins: Margins,

    /// Whether `margins` are subtracted from the paper size.
    pub use_printer_fields: bool,

    /// Minimum spacing between the allowance outlines of two pieces.
    pub layout_gap: f64,

    /// Contour edges are subdivided into parts of about this length (0 = off).
    pub shift: f64,

    /// Free rotation search.
    pub rotate: bool,

    /// Rotation step in degrees (divisor of 360 in `1..=180`).
    pub rotation_increment: u32,

    /// Crop united pages to their pieces.
    pub auto_crop: bool,

    /// Score candidates by resulting length instead of bounding area.
    pub save_length: bool,

    /// Stack all sheets into as few tall pages as possible.
    pub unite_pages: bool,

    /// Lay out on narrow strips and gather them into pages afterwards.
    pub strip_optimization: bool,

    /// Strip height multiplier (`1..=10`).
    pub multiplier: u8,

    /// Piece ordering policy.
    pub case: SelectionCase,

    /// Worker threads for the edge-pair search (0 = shared global pool).
    pub threads: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            paper_width: 0.0,
            paper_height: 0.0,
            margins: Margins::default(),
            use_printer_fields: true,
            layout_gap: 0.0,
            shift: 0.0,
            rotate: true,
            rotation_increment: DEFAULT_ROTATION_INCREMENT,
            auto_crop: false,
            save_length: false,
            unite_pages: false,
            strip_optimization: false,
            multiplier: 1,
            case: SelectionCase::default(),
            threads: 0,
        }
    }
}

impl LayoutConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the paper size.
    pub fn with_paper(mut self, width: f64, height: f64) -> Self {
        self.paper_width = width;
        self.paper_height = height;
        self
    }

    /// Sets the printer margins and enables them.
    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self.use_printer_fields = true;
        self
    }

    /// Enables or disables the printer margins.
    pub fn with_printer_fields(mut self, enabled: bool) -> Self {
        self.use_printer_fields = enabled;
        self
    }

    /// Sets the gap between pieces. Negative values are ignored.
    pub fn with_layout_gap(mut self, gap: f64) -> Self {
        if gap >= 0.0 {
            self.layout_gap = gap;
        }
        self
    }

    /// Sets the contour subdivision length.
    pub fn with_shift(mut self, shift: f64) -> Self {
        self.shift = shift.max(0.0);
        self
    }

    /// Enables or disables free rotation.
    pub fn with_rotate(mut self, rotate: bool) -> Self {
        self.rotate = rotate;
        self
    }

    /// Sets the rotation increment, coercing unusable values to 180.
    pub fn with_rotation_increment(mut self, degrees: u32) -> Self {
        self.rotation_increment = normalize_rotation_increment(degrees);
        self
    }

    /// Enables auto-cropping of united pages.
    pub fn with_auto_crop(mut self, enabled: bool) -> Self {
        self.auto_crop = enabled;
        self
    }

    /// Enables length-saving scoring.
    pub fn with_save_length(mut self, enabled: bool) -> Self {
        self.save_length = enabled;
        self
    }

    /// Enables page uniting.
    pub fn with_unite_pages(mut self, enabled: bool) -> Self {
        self.unite_pages = enabled;
        self
    }

    /// Enables strip optimization with the given multiplier.
    pub fn with_strip_optimization(mut self, enabled: bool, multiplier: u8) -> Self {
        self.strip_optimization = enabled;
        self.multiplier = normalize_multiplier(multiplier);
        self
    }

    /// Sets the selection policy.
    pub fn with_case(mut self, case: SelectionCase) -> Self {
        self.case = case;
        self
    }

    /// Sets the number of worker threads (0 = global pool).
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Usable page width after margins.
    pub fn page_width(&self) -> f64 {
        if self.use_printer_fields {
            self.paper_width - (self.margins.left + self.margins.right)
        } else {
            self.paper_width
        }
    }

    /// Usable page height after margins.
    pub fn page_height(&self) -> f64 {
        if self.use_printer_fields {
            self.paper_height - (self.margins.top + self.margins.bottom)
        } else {
            self.paper_height
        }
    }

    /// Rotation increment after coercion.
    pub fn effective_rotation_increment(&self) -> u32 {
        normalize_rotation_increment(self.rotation_increment)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        let finite = [
            self.paper_width,
            self.paper_height,
            self.margins.left,
            self.margins.top,
            self.margins.right,
            self.margins.bottom,
            self.layout_gap,
            self.shift,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(Error::ConfigError("all lengths must be finite".into()));
        }

        if self.paper_width <= 0.0 || self.paper_height <= 0.0 {
            return Err(Error::ConfigError(format!(
                "paper size must be positive, got {}x{}",
                self.paper_width, self.paper_height
            )));
        }

        if self.page_width() <= 0.0 || self.page_height() <= 0.0 {
            return Err(Error::ConfigError(
                "margins leave no usable page area".into(),
            ));
        }

        if self.layout_gap < 0.0 || self.shift < 0.0 {
            return Err(Error::ConfigError(
                "layout gap and shift must not be negative".into(),
            ));
        }

        Ok(())
    }
}
