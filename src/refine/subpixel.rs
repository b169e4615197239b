//! Closed-form fit around the cost minimum.
//!
//! With `p` and `n` the costs left and right of the minimum `c`, the offset
//! is `(p - n) / (p + n - 2c + |p - n|)`, the vertex of the symmetric V
//! through the three samples. It lies in `[-1/2, 1/2]` and is computed in
//! 1/256 pixel, then the disparity is rounded to 1/16 pixel.

use crate::sweep::BestMatch;
use crate::util::math::div_round_half_away;

/// Fixed-point scale of emitted disparities (1/16 pixel).
pub const DISPARITY_SCALE: i32 = 16;

/// Fractional correction in 1/256 pixel, rounded to nearest.
///
/// Returns 0 when the three costs are flat.
pub fn subpixel_delta(best_cost: u32, prev_cost: u32, next_cost: u32) -> i32 {
    let c = best_cost as i64;
    let p = prev_cost as i64;
    let n = next_cost as i64;
    let denom = p + n - 2 * c + (p - n).abs();
    if denom <= 0 {
        return 0;
    }
    div_round_half_away(256 * (p - n), denom) as i32
}

/// Refined disparity of a match in 1/16 pixel.
///
/// At either end of the range the missing neighbour is replaced by the one
/// that exists, which makes the correction 0 there.
pub fn refine_disparity(best: &BestMatch, num_disparities: usize) -> i16 {
    let mut prev = best.prev_cost;
    let mut next = best.next_cost;
    if best.disparity == 0 {
        prev = next;
    }
    if best.disparity + 1 == num_disparities {
        next = prev;
    }
    let delta = match (prev.or(next), next.or(prev)) {
        (Some(p), Some(n)) => subpixel_delta(best.cost, p, n),
        _ => 0,
    };
    let fixed = (best.disparity as i32 * 256 + delta + 15) >> 4;
    fixed as i16
}
