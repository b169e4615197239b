//! Low-level building blocks of the matcher.
//!
//! These expose the window buffer, column sums, lane accumulator,
//! running-minimum tracker, gates and refiner for custom pipelines and
//! testing. Most users should
//! prefer [`StereoMatcher`](crate::StereoMatcher) or
//! [`compute_disparity`](crate::compute_disparity).

pub use crate::disparity::DisparityEmitter;
pub use crate::gate::{TextureAccumulator, ValidityGate};
pub use crate::kernel::scalar::SadScalar;
#[cfg(feature = "simd")]
pub use crate::kernel::simd::SadSimd;
pub use crate::kernel::CostKernel;
pub use crate::refine::{refine_disparity, subpixel_delta};
pub use crate::sad::{ColumnSums, SadAccumulator};
pub use crate::sweep::{min_lane, BestMatch, MatchState, SweepController};
pub use crate::window::WindowBuffer;
