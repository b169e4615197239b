//! Row-parallel matching (feature-gated).
//!
//! An output row only depends on the `window_size` input rows around it, so
//! the frame is split into bands of consecutive rows matched independently.
//! Each worker owns a row matcher: it primes the window for the first row of
//! a band and then streams the band the same way the sequential engine
//! does. Sweeps inside a row stay sequential. The result is bit-identical to
//! [`StereoMatcher::compute`](crate::StereoMatcher::compute).

use crate::config::StereoConfig;
use crate::disparity::{DisparityEmitter, DisparityMap};
use crate::engine::RowMatcher;
use crate::image::{pair_size, ImageView};
use crate::trace::{trace_event, trace_span};
use crate::util::StereoResult;
use rayon::prelude::*;

/// Output rows per parallel task.
const BAND_ROWS: usize = 16;

/// Per-worker scratch state.
struct Worker {
    rows: RowMatcher,
    emitter: DisparityEmitter,
}

/// Computes the disparity map of a prefiltered pair with row bands spread
/// over the rayon pool.
pub fn compute_disparity_par(
    cfg: &StereoConfig,
    left: ImageView<'_, u8>,
    right: ImageView<'_, u8>,
) -> StereoResult<DisparityMap> {
    let (width, height) = pair_size(&left, &right)?;
    cfg.validate_for(width, height)?;
    let _span = trace_span!("stereo_match_par", width = width, height = height).entered();

    let half = cfg.half_window();
    // Input row `y + half` completes output row `y`; past the image it is border.
    let source = |r: usize| (left.row(r), right.row(r));

    let mut data = vec![0i16; width * height];
    data.par_chunks_mut(width * BAND_ROWS)
        .enumerate()
        .for_each_init(
            || Worker {
                rows: RowMatcher::new(cfg, width, height),
                emitter: DisparityEmitter::with_capacity(width),
            },
            |worker, (band, out)| {
                let y0 = band * BAND_ROWS;
                worker.rows.reset();
                // Rows y0 - half ..= y0 + half - 1, top first.
                for src in y0.saturating_sub(half)..y0 + half {
                    let (l, r) = source(src);
                    worker.rows.push_row(l, r);
                }
                for (i, dst) in out.chunks_mut(width).enumerate() {
                    let y = y0 + i;
                    let (l, r) = source(y + half);
                    worker.rows.push_row(l, r);
                    worker.rows.match_row(y, &mut worker.emitter);
                    worker.emitter.drain_into(dst);
                }
            },
        );

    let map = DisparityMap::from_raw(data, width, height);
    trace_event!(
        "disparity_stats",
        valid = map.valid_count(),
        filtered = map.as_slice().len() - map.valid_count()
    );
    Ok(map)
}
