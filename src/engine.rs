//! Row pipeline and the streaming matcher.
//!
//! Rows enter through [`StereoMatcher::push_row`] in raster order and update
//! the per-column window sums. Once the window holds `half` rows below a row,
//! that row is matched: every sweep slides the SAD lanes across the padded
//! row, the texture score is taken during sweep 0, and the final sweep gates
//! and refines each column.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::StereoConfig;
use crate::disparity::{DisparityEmitter, DisparityMap};
use crate::gate::{TextureAccumulator, ValidityGate};
use crate::image::{pair_size, ImageView};
use crate::refine::refine_disparity;
use crate::sad::{ColumnSums, SadAccumulator};
use crate::sweep::SweepController;
use crate::trace::{trace_event, trace_span};
use crate::util::{StereoError, StereoResult};

/// Row history plus the scratch to match the row centred in it.
///
/// One instance serves every row of a frame.
#[derive(Clone, Debug)]
pub(crate) struct RowMatcher {
    window_size: usize,
    num_disparities: usize,
    columns: ColumnSums,
    sad: SadAccumulator,
    texture: TextureAccumulator,
    controller: SweepController,
    gate: ValidityGate,
    texture_scores: Vec<u32>,
}

impl RowMatcher {
    /// Expects `cfg` to be validated for `width x height`.
    pub(crate) fn new(cfg: &StereoConfig, width: usize, height: usize) -> Self {
        Self {
            window_size: cfg.window_size,
            num_disparities: cfg.num_disparities,
            columns: ColumnSums::new(
                cfg.window_size,
                width,
                cfg.num_disparities,
                cfg.pre_filter_cap,
            ),
            sad: SadAccumulator::new(cfg.lane_width, cfg.window_size),
            texture: TextureAccumulator::new(cfg.window_size),
            controller: SweepController::new(
                width,
                cfg.lane_width,
                cfg.num_disparities,
                cfg.uniqueness_ratio.max(0) as u32,
            ),
            gate: ValidityGate::new(cfg, width, height),
            texture_scores: vec![0; width],
        }
    }

    /// Pushes the next row pair; `None` is a border row.
    pub(crate) fn push_row(&mut self, left: Option<&[u8]>, right: Option<&[u8]>) {
        self.columns.push_row(left, right);
    }

    /// Empties the window.
    pub(crate) fn reset(&mut self) {
        self.columns.reset();
    }

    /// Matches image row `y`, centred in the window, and emits its pixels.
    pub(crate) fn match_row(&mut self, y: usize, out: &mut DisparityEmitter) {
        let lead = self.window_size - 1;
        let lanes = self.sad.lanes();
        for sweep in 0..self.controller.sweeps() {
            let first = self.controller.first_disparity(sweep);
            self.sad.begin_sweep(first);
            if sweep == 0 {
                self.texture.reset();
            }
            let last = self.controller.is_final(sweep);

            for col in 0..self.columns.padded_width() {
                self.sad.push_column(col, self.columns.costs(col, first, lanes));
                let score = if sweep == 0 {
                    self.texture.push_column(self.columns.deviation(col))
                } else {
                    0
                };
                if col < lead {
                    continue;
                }

                let x = col - lead;
                if sweep == 0 {
                    self.texture_scores[x] = score;
                }
                self.controller
                    .update(x, sweep, self.sad.costs(), self.sad.valid());
                if last {
                    out.emit(self.resolve(x, y));
                }
            }
        }
    }

    fn resolve(&self, x: usize, y: usize) -> Option<i16> {
        if !self.gate.passes(x, y, self.texture_scores[x]) {
            return None;
        }
        self.controller
            .state(x)
            .finish()
            .filter(|best| !best.ambiguous)
            .map(|best| refine_disparity(&best, self.num_disparities))
    }
}

/// Streaming SAD block matcher for one frame size.
///
/// Inputs are expected to be prefiltered already (see
/// [`SobelClip`](crate::prefilter::SobelClip)).
///
/// ```
/// use stereobm::{ImageView, StereoConfig, StereoMatcher};
///
/// let cfg = StereoConfig {
///     window_size: 5,
///     num_disparities: 8,
///     lane_width: 4,
///     ..StereoConfig::default()
/// };
/// let left = vec![31u8; 32 * 16];
/// let right = left.clone();
/// let l = ImageView::from_slice(&left, 32, 16).unwrap();
/// let r = ImageView::from_slice(&right, 32, 16).unwrap();
/// let mut matcher = StereoMatcher::new(cfg, 32, 16).unwrap();
/// let map = matcher.compute(l, r).unwrap();
/// assert_eq!(map.width(), 32);
/// ```
#[derive(Clone, Debug)]
pub struct StereoMatcher {
    cfg: StereoConfig,
    width: usize,
    height: usize,
    rows: RowMatcher,
    emitter: DisparityEmitter,
    rows_in: usize,
    rows_out: usize,
}

impl StereoMatcher {
    /// Validates `cfg` for the frame size and allocates all state.
    pub fn new(cfg: StereoConfig, width: usize, height: usize) -> StereoResult<Self> {
        cfg.validate_for(width, height)?;
        Ok(Self {
            cfg,
            width,
            height,
            rows: RowMatcher::new(&cfg, width, height),
            emitter: DisparityEmitter::with_capacity(width * height),
            rows_in: 0,
            rows_out: 0,
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &StereoConfig {
        &self.cfg
    }

    /// Frame width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Frame height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Input rows received for the current frame.
    pub fn rows_received(&self) -> usize {
        self.rows_in
    }

    /// Output rows completed for the current frame.
    pub fn rows_emitted(&self) -> usize {
        self.rows_out
    }

    /// Feeds the next row pair.
    ///
    /// Returns the index of the output row completed by this push, if any.
    pub fn push_row(&mut self, left: &[u8], right: &[u8]) -> StereoResult<Option<usize>> {
        for got in [left.len(), right.len()] {
            if got != self.width {
                return Err(StereoError::RowLengthMismatch {
                    expected: self.width,
                    got,
                });
            }
        }
        if self.rows_in == self.height {
            return Err(StereoError::FrameOverrun {
                height: self.height,
            });
        }

        self.rows.push_row(Some(left), Some(right));
        self.rows_in += 1;
        if self.rows_in <= self.cfg.half_window() {
            return Ok(None);
        }
        Ok(Some(self.match_next()))
    }

    /// Flushes the bottom rows and returns the frame's map.
    ///
    /// The matcher is ready for the next frame afterwards.
    pub fn finish(&mut self) -> StereoResult<DisparityMap> {
        if self.rows_in < self.height {
            return Err(StereoError::IncompleteFrame {
                received: self.rows_in,
                expected: self.height,
            });
        }
        while self.rows_out < self.height {
            self.rows.push_row(None, None);
            self.match_next();
        }

        let data = self.emitter.take();
        let map = DisparityMap::from_raw(data, self.width, self.height);
        trace_event!(
            "disparity_stats",
            valid = map.valid_count(),
            filtered = map.as_slice().len() - map.valid_count()
        );
        self.reset();
        Ok(map)
    }

    /// Drops the partially processed frame.
    pub fn reset(&mut self) {
        self.rows.reset();
        self.emitter.clear();
        self.rows_in = 0;
        self.rows_out = 0;
    }

    /// Matches a whole frame from a fresh state.
    pub fn compute(
        &mut self,
        left: ImageView<'_, u8>,
        right: ImageView<'_, u8>,
    ) -> StereoResult<DisparityMap> {
        self.compute_with_abort(left, right, &AtomicBool::new(false))
    }

    /// Like [`compute`](Self::compute), polling `abort` before every row.
    ///
    /// On abort the frame is discarded and [`StereoError::Aborted`] reports
    /// how many output rows were done.
    pub fn compute_with_abort(
        &mut self,
        left: ImageView<'_, u8>,
        right: ImageView<'_, u8>,
        abort: &AtomicBool,
    ) -> StereoResult<DisparityMap> {
        let (width, height) = pair_size(&left, &right)?;
        if width != self.width || height != self.height {
            return Err(StereoError::FrameSizeMismatch {
                expected_width: self.width,
                expected_height: self.height,
                width,
                height,
            });
        }
        let _span = trace_span!(
            "stereo_match",
            width = width,
            height = height,
            sweeps = self.cfg.sweep_factor(),
            lanes = self.cfg.lane_width
        )
        .entered();

        self.reset();
        for (l, r) in left.rows().zip(right.rows()) {
            if abort.load(Ordering::Relaxed) {
                let rows_done = self.rows_out;
                trace_event!("frame_aborted", rows_done = rows_done);
                self.reset();
                return Err(StereoError::Aborted { rows_done });
            }
            self.push_row(l, r)?;
        }
        self.finish()
    }

    fn match_next(&mut self) -> usize {
        let y = self.rows_out;
        self.rows.match_row(y, &mut self.emitter);
        self.rows_out += 1;
        y
    }
}
