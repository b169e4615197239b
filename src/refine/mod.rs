//! Sub-pixel refinement of integer matches.

mod subpixel;

pub use subpixel::{refine_disparity, subpixel_delta, DISPARITY_SCALE};
