//! Integer helpers shared by the cost and refinement stages.

/// Absolute difference of two 8-bit samples.
#[inline]
pub(crate) fn abs_diff_u8(a: u8, b: u8) -> u32 {
    a.abs_diff(b) as u32
}

/// Integer division rounding half away from zero. `den` must be positive.
pub(crate) fn div_round_half_away(num: i64, den: i64) -> i64 {
    debug_assert!(den > 0);
    let q = (2 * num.abs() + den) / (2 * den);
    if num < 0 {
        -q
    } else {
        q
    }
}

/// Uniqueness threshold `cost + cost * ratio / 100` in integer arithmetic.
#[inline]
pub(crate) fn uniqueness_threshold(cost: u32, ratio: u32) -> u64 {
    let cost = cost as u64;
    cost + cost * ratio as u64 / 100
}
