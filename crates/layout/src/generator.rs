//! Layout run orchestration.
//!
//! The [`Generator`] drives a whole run: it prepares the inventory, fills
//! sheets one after another until every piece is committed, and finally
//! gathers strips or unites pages when configured to.

use crate::bank::Inventory;
use crate::geometry::POINT_EPSILON;
use crate::piece::{LayoutPiece, PieceId};
use crate::sheet::Sheet;
use pattern_nest_core::{
    normalize_multiplier, Error, EventCallback, LayoutConfig, LayoutEvent, LayoutState,
    LayoutSummary, Result,
};
use rayon::ThreadPool;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Longest page produced by [`Generator::unite_pages`].
pub const MAX_PAGE_LENGTH: f64 = 32768.0;

/// Outcome of a layout run.
///
/// Sheets built before an abort or a fatal error are kept, so callers can
/// show a partial layout.
#[derive(Debug, Clone)]
pub struct LayoutResult {
    /// Finished sheets in order.
    pub sheets: Vec<Sheet>,

    /// Final run state.
    pub state: LayoutState,

    /// Ids of pieces that were not committed.
    pub unplaced: Vec<PieceId>,

    /// Number of committed pieces.
    pub arranged: usize,

    /// Number of pieces handed to the run.
    pub total_pieces: usize,

    /// Computation time in milliseconds.
    pub computation_time_ms: u64,
}

impl LayoutResult {
    fn new(total_pieces: usize) -> Self {
        Self {
            sheets: Vec::new(),
            state: LayoutState::NoError,
            unplaced: Vec::new(),
            arranged: 0,
            total_pieces,
            computation_time_ms: 0,
        }
    }

    /// Returns true if the run finished without error.
    pub fn is_successful(&self) -> bool {
        self.state.is_ok()
    }

    /// Returns true if every piece was committed.
    pub fn all_placed(&self) -> bool {
        self.unplaced.is_empty()
    }

    /// Number of pieces on all sheets.
    pub fn placed_count(&self) -> usize {
        self.sheets.iter().map(Sheet::count).sum()
    }

    pub fn sheets_used(&self) -> usize {
        self.sheets.len()
    }

    /// Placed main-outline area over total sheet area (0.0 - 1.0).
    pub fn utilization(&self) -> f64 {
        let total: f64 = self.sheets.iter().map(|s| s.width() * s.height()).sum();
        if total <= 0.0 {
            return 0.0;
        }
        self.sheets.iter().map(Sheet::used_area).sum::<f64>() / total
    }

    /// Iterates over all committed pieces with their sheet index.
    pub fn placements(&self) -> impl Iterator<Item = (usize, &LayoutPiece)> {
        self.sheets
            .iter()
            .enumerate()
            .flat_map(|(i, sheet)| sheet.pieces().iter().map(move |p| (i, p)))
    }

    pub fn summary(&self) -> LayoutSummary {
        LayoutSummary::from(self)
    }
}

impl From<&LayoutResult> for LayoutSummary {
    fn from(result: &LayoutResult) -> Self {
        Self {
            total_requested: result.total_pieces,
            total_placed: result.placed_count(),
            sheets_used: result.sheets_used(),
            utilization_percent: result.utilization() * 100.0,
            time_ms: result.computation_time_ms,
            state: result.state,
        }
    }
}

/// Stop flags of the runs in progress on one generator.
type RunFlags = Arc<Mutex<Vec<Arc<AtomicBool>>>>;

/// Requests cancellation of the layouts running on a generator, from any
/// thread.
///
/// Only runs in progress are stopped; a later run starts fresh.
#[derive(Debug, Clone)]
pub struct AbortHandle(RunFlags);

impl AbortHandle {
    pub fn abort(&self) {
        let runs = self.0.lock().unwrap_or_else(|e| e.into_inner());
        for stop in runs.iter() {
            stop.store(true, Ordering::Relaxed);
        }
    }

    /// Returns true if a run in progress has been asked to stop.
    pub fn is_aborted(&self) -> bool {
        let runs = self.0.lock().unwrap_or_else(|e| e.into_inner());
        runs.iter().any(|stop| stop.load(Ordering::Relaxed))
    }
}

/// Registration of one run's stop flag, removed again on drop.
struct ActiveRun {
    runs: RunFlags,
    stop: Arc<AtomicBool>,
}

impl ActiveRun {
    fn register(runs: &RunFlags) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        runs.lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Arc::clone(&stop));
        Self {
            runs: Arc::clone(runs),
            stop,
        }
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }
}

impl Drop for ActiveRun {
    fn drop(&mut self) {
        self.runs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|stop| !Arc::ptr_eq(stop, &self.stop));
    }
}

/// Top-level layout driver.
///
/// A generator may run several layouts at once; each run has its own stop
/// flag.
pub struct Generator {
    config: LayoutConfig,
    runs: RunFlags,
    pool: Mutex<Option<Arc<ThreadPool>>>,
}

impl Generator {
    /// Creates a generator with the given configuration.
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            runs: Arc::new(Mutex::new(Vec::new())),
            pool: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Stops the runs in progress. In-flight searches return promptly and
    /// nothing half-placed is committed.
    pub fn abort(&self) {
        self.abort_handle().abort();
    }

    /// A handle that can abort runs of this generator from another thread.
    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle(Arc::clone(&self.runs))
    }

    /// Lays out `pieces`.
    ///
    /// Run-level failures are reported through [`LayoutResult::state`];
    /// `Err` means the configuration is unusable.
    pub fn generate(&self, pieces: &[LayoutPiece]) -> Result<LayoutResult> {
        self.run(pieces, None)
    }

    /// Lays out `pieces`, reporting progress through `callback`.
    pub fn generate_with_events(
        &self,
        pieces: &[LayoutPiece],
        callback: EventCallback,
    ) -> Result<LayoutResult> {
        self.run(pieces, Some(&callback))
    }

    /// Dedicated worker pool, built on first use when `threads > 0`.
    fn worker_pool(&self) -> Result<Option<Arc<ThreadPool>>> {
        if self.config.threads == 0 {
            return Ok(None);
        }
        let mut slot = self
            .pool
            .lock()
            .map_err(|_| Error::Internal("worker pool lock poisoned".into()))?;
        if let Some(pool) = slot.as_ref() {
            return Ok(Some(Arc::clone(pool)));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .thread_name(|i| format!("pattern-nest-{i}"))
            .build()
            .map_err(|e| Error::ConfigError(format!("cannot build worker pool: {e}")))?;
        let pool = Arc::new(pool);
        *slot = Some(Arc::clone(&pool));
        Ok(Some(pool))
    }

    /// Applies the run's policy knobs to a sheet.
    fn configure(&self, sheet: Sheet, pool: &Option<Arc<ThreadPool>>) -> Sheet {
        let sheet = sheet
            .with_shift(self.config.shift)
            .with_rotate(self.config.rotate)
            .with_rotation_increment(self.config.effective_rotation_increment())
            .with_save_length(self.config.save_length);
        match pool {
            Some(pool) => sheet.with_pool(Arc::clone(pool)),
            None => sheet,
        }
    }

    fn run(&self, pieces: &[LayoutPiece], callback: Option<&EventCallback>) -> Result<LayoutResult> {
        let start = Instant::now();
        let emit = |event: LayoutEvent| {
            if let Some(callback) = callback {
                callback(event);
            }
        };

        self.config.validate()?;
        let pool = self.worker_pool()?;

        if self.config.effective_rotation_increment() != self.config.rotation_increment {
            log::warn!(
                "rotation increment {} does not divide 360 within 1..=180, using {}",
                self.config.rotation_increment,
                self.config.effective_rotation_increment()
            );
        }

        let run = ActiveRun::register(&self.runs);
        let mut result = LayoutResult::new(pieces.len());
        emit(LayoutEvent::Started {
            total: pieces.len(),
        });

        let mut bank = Inventory::new();
        bank.set_pieces(pieces.to_vec());
        bank.set_layout_gap(self.config.layout_gap);
        bank.set_case(self.config.case);

        if let Err(e) = bank.prepare() {
            log::warn!("{}", e);
            return Ok(self.fail(result, &bank, LayoutState::PrepareLayoutError, start, &emit));
        }

        let width = self.config.page_width();
        let mut height = self.config.page_height();
        let mut strip_optimized = false;

        if self.config.strip_optimization {
            let multiplier = f64::from(normalize_multiplier(self.config.multiplier));
            let b = bank.biggest_diagonal() * multiplier + self.config.layout_gap;
            if b > 0.0 && height >= b * 2.0 {
                strip_optimized = true;
                height = (height / (height / b).floor()).floor();
                log::debug!("strip optimization: working height {}", height);
            }
        }

        let mut sheets: Vec<Sheet> = Vec::new();
        while bank.all_piece_count() > 0 {
            if run.stopped() {
                break;
            }

            let mut sheet = self.configure(
                Sheet::new(width, height).with_paper_index(sheets.len()),
                &pool,
            );
            log::debug!(
                "sheet {} opened ({} x {}), {} pieces left",
                sheet.paper_index(),
                width,
                height,
                bank.all_piece_count()
            );

            while let Some(index) = bank.ticket() {
                let placed = match bank.piece(index) {
                    Some(piece) => sheet.arrange_piece(piece, &run.stop),
                    None => false,
                };

                if placed {
                    bank.arranged(index);
                    emit(LayoutEvent::Arranged {
                        count: bank.arranged_count(),
                    });
                } else {
                    bank.not_arranged(index);
                }

                if run.stopped() || bank.left_to_arrange() == 0 {
                    break;
                }
            }

            if run.stopped() {
                if sheet.count() > 0 {
                    sheets.push(sheet);
                }
                break;
            }

            if sheet.count() == 0 {
                result.sheets = sheets;
                return Ok(self.fail(result, &bank, LayoutState::EmptyPaperError, start, &emit));
            }

            log::debug!(
                "sheet {} closed with {} pieces",
                sheet.paper_index(),
                sheet.count()
            );
            sheets.push(sheet);
        }

        if run.stopped() {
            result.sheets = sheets;
            return Ok(self.fail(result, &bank, LayoutState::ProcessStopped, start, &emit));
        }

        if strip_optimized {
            sheets = self.gather_pages(sheets);
        }
        if self.config.unite_pages {
            sheets = self.unite_pages(sheets);
        }

        result.sheets = sheets;
        result.arranged = bank.arranged_count();
        result.unplaced = bank.unarranged_ids();
        result.computation_time_ms = start.elapsed().as_millis() as u64;
        emit(LayoutEvent::Finished);
        Ok(result)
    }

    fn fail(
        &self,
        mut result: LayoutResult,
        bank: &Inventory,
        state: LayoutState,
        start: Instant,
        emit: &impl Fn(LayoutEvent),
    ) -> LayoutResult {
        match state {
            LayoutState::EmptyPaperError => {
                let culprit = bank
                    .unarranged_ids()
                    .into_iter()
                    .next()
                    .unwrap_or_default();
                log::warn!("{}", Error::EmptyPaper(culprit));
            }
            LayoutState::ProcessStopped => log::warn!("{}", Error::Cancelled),
            // Preparation failures are logged with their cause by the caller.
            _ => {}
        }
        result.state = state;
        result.arranged = bank.arranged_count();
        result.unplaced = bank.unarranged_ids();
        result.computation_time_ms = start.elapsed().as_millis() as u64;
        emit(LayoutEvent::Error(state));
        result
    }

    /// Stacks strip sheets into pages no taller than the usable page height.
    ///
    /// Each strip contributes the height of its pieces plus twice the layout
    /// gap (except the last one). Fewer than two sheets are returned as is.
    pub fn gather_pages(&self, sheets: Vec<Sheet>) -> Vec<Sheet> {
        if sheets.len() < 2 {
            return sheets;
        }

        let page_height = self.config.page_height();
        let groups = stack_sheets(sheets, page_height, self.config.layout_gap, |sheet| {
            sheet
                .pieces_bounding_rect()
                .map(|r| (r.height(), r.min_y))
                .unwrap_or((0.0, 0.0))
        });

        let pool = self.pool_snapshot();
        groups
            .into_iter()
            .enumerate()
            .map(|(i, (_, pieces))| {
                self.configure(
                    Sheet::assembled(self.config.page_width(), page_height, i, pieces),
                    &pool,
                )
            })
            .collect()
    }

    /// Stacks sheets into pages up to [`MAX_PAGE_LENGTH`] long.
    ///
    /// Each sheet contributes its height, or the height of its pieces with
    /// `auto_crop`, plus twice the layout gap (except the last one). The new
    /// page length is the accumulated length.
    pub fn unite_pages(&self, sheets: Vec<Sheet>) -> Vec<Sheet> {
        if sheets.len() < 2 {
            return sheets;
        }

        let auto_crop = self.config.auto_crop;
        let groups = stack_sheets(sheets, MAX_PAGE_LENGTH, self.config.layout_gap, |sheet| {
            match sheet.pieces_bounding_rect() {
                Some(r) if auto_crop => (r.height(), r.min_y),
                _ => (sheet.height(), 0.0),
            }
        });

        let pool = self.pool_snapshot();
        groups
            .into_iter()
            .enumerate()
            .map(|(i, (length, pieces))| {
                self.configure(
                    Sheet::assembled(self.config.page_width(), length, i, pieces),
                    &pool,
                )
            })
            .collect()
    }

    fn pool_snapshot(&self) -> Option<Arc<ThreadPool>> {
        self.pool.lock().ok().and_then(|slot| slot.clone())
    }
}

/// Rounds a length up to whole units, ignoring float noise.
fn whole_units(length: f64) -> f64 {
    (length - POINT_EPSILON).ceil().max(0.0)
}

/// Stacks the pieces of consecutive sheets along +y.
///
/// `measure` returns the length a sheet contributes and the y it starts at.
/// Returns each new page's accumulated length and pieces.
fn stack_sheets(
    sheets: Vec<Sheet>,
    cap: f64,
    gap: f64,
    measure: impl Fn(&Sheet) -> (f64, f64),
) -> Vec<(f64, Vec<LayoutPiece>)> {
    let last = sheets.len().saturating_sub(1);
    let mut groups: Vec<(f64, Vec<LayoutPiece>)> = Vec::new();

    for (i, sheet) in sheets.into_iter().enumerate() {
        let (height, base) = measure(&sheet);
        let mut length = whole_units(height);
        if i != last {
            length = whole_units(length + gap * 2.0);
        }

        let start_new = match groups.last() {
            Some((used, pieces)) => !pieces.is_empty() && used + length > cap,
            None => true,
        };
        if start_new {
            groups.push((0.0, Vec::new()));
        }

        if let Some((used, pieces)) = groups.last_mut() {
            let offset = *used - base;
            pieces.extend(sheet.into_pieces().into_iter().map(|mut piece| {
                piece.translate(0.0, offset);
                piece
            }));
            *used += length;
        }
    }
    groups
}
