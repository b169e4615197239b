//! SIMD row kernel using the `wide` crate.
//!
//! Lanes are processed 8 at a time with `i32x8`. Consecutive disparities read
//! consecutive right samples in reverse order, so each block is loaded from a
//! contiguous run of the padded right row and reversed. Blocks that would
//! reach left of padded column 0 fall back to the scalar loop.

use crate::kernel::scalar::SadScalar;
use crate::kernel::CostKernel;
use wide::i32x8;

const LANES: usize = 8;

/// Loads 8 samples in reverse order.
#[inline]
fn load_u8x8_reversed(slice: &[u8]) -> i32x8 {
    i32x8::from([
        slice[7] as i32,
        slice[6] as i32,
        slice[5] as i32,
        slice[4] as i32,
        slice[3] as i32,
        slice[2] as i32,
        slice[1] as i32,
        slice[0] as i32,
    ])
}

/// SIMD SAD row kernel.
pub struct SadSimd;

impl CostKernel for SadSimd {
    fn row_costs(left: &[u8], right: &[u8], col: usize, first_disparity: usize, out: &mut [u32]) {
        let lanes = out.len();
        let simd_end = lanes / LANES * LANES;
        let sample = i32x8::splat(left[col] as i32);

        let mut d0 = 0;
        while d0 < simd_end {
            let top = first_disparity + d0 + LANES - 1;
            let block = &mut out[d0..d0 + LANES];
            if col >= top {
                let base = col - top;
                let diff = (sample - load_u8x8_reversed(&right[base..base + LANES])).abs();
                for (dst, v) in block.iter_mut().zip(diff.to_array()) {
                    *dst = v as u32;
                }
            } else {
                SadScalar::row_costs(left, right, col, first_disparity + d0, block);
            }
            d0 += LANES;
        }

        // Scalar remainder
        if d0 < lanes {
            SadScalar::row_costs(left, right, col, first_disparity + d0, &mut out[d0..]);
        }
    }
}
