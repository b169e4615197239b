//! Row cost kernels.
//!
//! A kernel computes, for one padded column of one row pair and a run of
//! consecutive disparity lanes, the absolute differences between the left
//! sample and the shifted right samples.
//! [`ColumnSums`](crate::lowlevel::ColumnSums) adds and retires these as
//! rows enter and leave the window, and the SAD accumulator turns the
//! resulting column sums into window costs.

/// Kernel trait for the per-row lane costs.
pub trait CostKernel {
    /// Writes `out[d] = |left[col] - right[col - first_disparity - d]|`.
    ///
    /// Right samples left of padded column 0 read as 0.
    fn row_costs(left: &[u8], right: &[u8], col: usize, first_disparity: usize, out: &mut [u32]);
}

pub mod scalar;

#[cfg(feature = "simd")]
pub mod simd;

#[cfg(feature = "rayon")]
pub mod rayon;

#[cfg(not(feature = "simd"))]
pub(crate) use scalar::SadScalar as ActiveKernel;
#[cfg(feature = "simd")]
pub(crate) use simd::SadSimd as ActiveKernel;
