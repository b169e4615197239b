//! Scalar reference kernel.

use crate::kernel::CostKernel;
use crate::util::math::abs_diff_u8;

/// Scalar SAD row kernel.
pub struct SadScalar;

impl CostKernel for SadScalar {
    fn row_costs(left: &[u8], right: &[u8], col: usize, first_disparity: usize, out: &mut [u32]) {
        let sample = left[col];
        for (d, cost) in out.iter_mut().enumerate() {
            let shifted = match col.checked_sub(first_disparity + d) {
                Some(src) => right[src],
                None => 0,
            };
            *cost = abs_diff_u8(sample, shifted);
        }
    }
}
