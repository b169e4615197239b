//! stereobm is a CPU SAD stereo block matcher for rectified grayscale pairs.
//!
//! The matcher slides a square window along each row, evaluates the
//! disparity range in sweeps of `lane_width` candidates with an incremental
//! box filter, rejects border, low-texture and ambiguous pixels and refines
//! the rest to 1/16 pixel. Optional features add row parallelism (`rayon`),
//! an `i32x8` lane kernel (`simd`), image file I/O (`image-io`) and
//! `tracing` spans.
//!
//! ```
//! use stereobm::{compute_disparity, ImageView, StereoConfig};
//!
//! let (w, h) = (48, 24);
//! let left: Vec<u8> = (0..w * h).map(|i| ((i * 37) % 251) as u8).collect();
//! let right = left.clone();
//! let cfg = StereoConfig {
//!     window_size: 5,
//!     num_disparities: 16,
//!     lane_width: 8,
//!     ..StereoConfig::default()
//! };
//! let map = compute_disparity(
//!     ImageView::from_slice(&left, w, h).unwrap(),
//!     ImageView::from_slice(&right, w, h).unwrap(),
//!     &cfg,
//! )
//! .unwrap();
//! assert_eq!(map.as_slice().len(), w * h);
//! ```

pub mod config;
pub mod disparity;
mod engine;
mod gate;
pub mod image;
pub mod kernel;
pub mod lowlevel;
pub mod prefilter;
mod refine;
mod sad;
mod sweep;
mod trace;
pub mod util;
mod window;

pub use config::{StereoConfig, MAX_DISPARITIES, MAX_WINDOW_SIZE};
pub use disparity::{DisparityMap, DisparityPixel, FILTERED};
pub use engine::StereoMatcher;
pub use image::{ImageView, OwnedImage};
pub use prefilter::{Passthrough, Prefilter, SobelClip};
pub use refine::DISPARITY_SCALE;
pub use util::{StereoError, StereoResult};

#[cfg(feature = "rayon")]
pub use kernel::rayon::compute_disparity_par;

/// Prefilters both images with [`SobelClip`] and matches them.
///
/// Uses the row-parallel path when `cfg.parallel` is set and the `rayon`
/// feature is enabled.
pub fn compute_disparity(
    left: ImageView<'_, u8>,
    right: ImageView<'_, u8>,
    cfg: &StereoConfig,
) -> StereoResult<DisparityMap> {
    compute_disparity_with(&SobelClip::new(cfg.pre_filter_cap)?, left, right, cfg)
}

/// Same as [`compute_disparity`] with a caller-chosen prefilter.
pub fn compute_disparity_with<P: Prefilter>(
    prefilter: &P,
    left: ImageView<'_, u8>,
    right: ImageView<'_, u8>,
    cfg: &StereoConfig,
) -> StereoResult<DisparityMap> {
    let (width, height) = image::pair_size(&left, &right)?;
    cfg.validate_for(width, height)?;
    let left = prefilter.apply(left)?;
    let right = prefilter.apply(right)?;

    #[cfg(feature = "rayon")]
    {
        if cfg.parallel {
            return compute_disparity_par(cfg, left.view(), right.view());
        }
    }
    StereoMatcher::new(*cfg, width, height)?.compute(left.view(), right.view())
}
