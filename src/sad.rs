//! Incremental SAD accumulation, vertical and horizontal.
//!
//! [`ColumnSums`] holds, for every padded column and every disparity, the sum
//! over the window rows of the absolute differences. When a row enters the
//! window its contributions are added and those of the row it evicts are
//! subtracted, so keeping a column current costs one row cost per disparity.
//! The same sums are kept for the texture deviation `|p - cap|`.
//!
//! Each lane `d` of a [`SadAccumulator`] sweep holds the SAD of a
//! `window_size x window_size` block for disparity `first_disparity + d`.
//! Moving one column right adds the incoming column sum and subtracts the one
//! that leaves the window, so the per-column work is one add per lane.
//!
//! A lane is valid only once every column in its window had a real right
//! sample (`col >= disparity + window_size - 1`). Column costs for
//! `col < disparity` are forced to 0; validity is tracked separately so those
//! zeros never win a minimum search.

use crate::kernel::{ActiveKernel, CostKernel};
use crate::util::math::abs_diff_u8;
use crate::window::WindowBuffer;

/// Per-column vertical sums over the rows of a [`WindowBuffer`].
#[derive(Clone, Debug)]
pub struct ColumnSums {
    window: WindowBuffer,
    num_disparities: usize,
    level: u8,
    costs: Vec<u32>,
    deviation: Vec<u32>,
    scratch: Vec<u32>,
}

impl ColumnSums {
    /// Creates sums over an all-border window for images `width` pixels wide.
    ///
    /// `level` is the zero point of the texture deviation.
    pub fn new(window_size: usize, width: usize, num_disparities: usize, level: u8) -> Self {
        let window = WindowBuffer::new(window_size, width);
        let padded_width = window.padded_width();
        let mut sums = Self {
            window,
            num_disparities,
            level,
            costs: vec![0; padded_width * num_disparities],
            deviation: vec![0; padded_width],
            scratch: vec![0; num_disparities],
        };
        sums.reset();
        sums
    }

    /// Row history the sums describe.
    pub fn window(&self) -> &WindowBuffer {
        &self.window
    }

    /// Number of padded columns.
    pub fn padded_width(&self) -> usize {
        self.window.padded_width()
    }

    /// Clears the window back to the zero border.
    pub fn reset(&mut self) {
        self.window.reset();
        // Zero rows match each other exactly and sit `level` away from the
        // texture zero point.
        self.costs.fill(0);
        self.deviation
            .fill(self.window.window_size() as u32 * self.level as u32);
    }

    /// Pushes a row pair, retiring the row it evicts; `None` pushes a border
    /// row.
    pub fn push_row(&mut self, left: Option<&[u8]>, right: Option<&[u8]>) {
        self.push_row_with::<ActiveKernel>(left, right);
    }

    /// Same as [`push_row`](Self::push_row) with an explicit kernel.
    pub fn push_row_with<K: CostKernel>(&mut self, left: Option<&[u8]>, right: Option<&[u8]>) {
        let newest = self.window.window_size() - 1;
        let (window, mut tally) = self.split();
        tally.apply::<K>(window.left_row(0), window.right_row(0), false);
        window.push_row(left, right);
        tally.apply::<K>(window.left_row(newest), window.right_row(newest), true);
    }

    fn split(&mut self) -> (&mut WindowBuffer, Tally<'_>) {
        (
            &mut self.window,
            Tally {
                level: self.level,
                costs: &mut self.costs,
                deviation: &mut self.deviation,
                scratch: &mut self.scratch,
            },
        )
    }

    /// Column sums at padded column `col` for disparities
    /// `first_disparity..first_disparity + lanes`.
    #[inline]
    pub fn costs(&self, col: usize, first_disparity: usize, lanes: usize) -> &[u32] {
        let base = col * self.num_disparities + first_disparity;
        &self.costs[base..base + lanes]
    }

    /// Texture deviation sum at padded column `col`.
    #[inline]
    pub fn deviation(&self, col: usize) -> u32 {
        self.deviation[col]
    }
}

/// Mutable view of the sums while the window is being updated.
struct Tally<'a> {
    level: u8,
    costs: &'a mut [u32],
    deviation: &'a mut [u32],
    scratch: &'a mut [u32],
}

impl Tally<'_> {
    /// Adds or retires one padded row pair.
    fn apply<K: CostKernel>(&mut self, left: &[u8], right: &[u8], add: bool) {
        let n = self.scratch.len();
        for (col, &sample) in left.iter().enumerate() {
            K::row_costs(left, right, col, 0, self.scratch);
            let sums = &mut self.costs[col * n..(col + 1) * n];
            let deviation = abs_diff_u8(sample, self.level);
            if add {
                sums.iter_mut()
                    .zip(self.scratch.iter())
                    .for_each(|(s, &c)| *s += c);
                self.deviation[col] += deviation;
            } else {
                sums.iter_mut()
                    .zip(self.scratch.iter())
                    .for_each(|(s, &c)| *s -= c);
                self.deviation[col] -= deviation;
            }
        }
    }
}

/// Running window costs for the lanes of one sweep.
#[derive(Clone, Debug)]
pub struct SadAccumulator {
    lanes: usize,
    window_size: usize,
    first_disparity: usize,
    costs: Vec<u32>,
    valid: Vec<bool>,
    history: Vec<u32>,
    slot: usize,
}

impl SadAccumulator {
    /// Creates an accumulator for `lanes` disparities per sweep.
    pub fn new(lanes: usize, window_size: usize) -> Self {
        Self {
            lanes,
            window_size,
            first_disparity: 0,
            costs: vec![0; lanes],
            valid: vec![false; lanes],
            history: vec![0; lanes * window_size],
            slot: 0,
        }
    }

    /// Clears all lanes and starts a sweep at `first_disparity`.
    pub fn begin_sweep(&mut self, first_disparity: usize) {
        self.first_disparity = first_disparity;
        self.costs.fill(0);
        self.valid.fill(false);
        self.history.fill(0);
        self.slot = 0;
    }

    /// Advances every lane to padded column `col`.
    ///
    /// `column[d]` is the vertical sum for disparity `first_disparity + d`.
    pub fn push_column(&mut self, col: usize, column: &[u32]) {
        let base = self.slot * self.lanes;
        let outgoing = &mut self.history[base..base + self.lanes];
        for d in 0..self.lanes {
            let disparity = self.first_disparity + d;
            let incoming = if col < disparity { 0 } else { column[d] };
            self.costs[d] = self.costs[d] - outgoing[d] + incoming;
            outgoing[d] = incoming;
            self.valid[d] = col + 1 >= disparity + self.window_size;
        }
        self.slot = (self.slot + 1) % self.window_size;
    }

    /// Number of lanes.
    pub fn lanes(&self) -> usize {
        self.lanes
    }

    /// Disparity of lane 0 in the current sweep.
    pub fn first_disparity(&self) -> usize {
        self.first_disparity
    }

    /// Current window costs, one per lane.
    pub fn costs(&self) -> &[u32] {
        &self.costs
    }

    /// Validity flags matching [`costs`](Self::costs).
    pub fn valid(&self) -> &[bool] {
        &self.valid
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnSums, SadAccumulator};
    use crate::kernel::scalar::SadScalar;
    use crate::window::WindowBuffer;

    fn row(width: usize, y: usize, a: usize, b: usize) -> Vec<u8> {
        (0..width).map(|x| ((x * a + y * b) % 256) as u8).collect()
    }

    fn fill(width: usize, wsize: usize, ndisp: usize, rows: usize) -> ColumnSums {
        let mut sums = ColumnSums::new(wsize, width, ndisp, 31);
        for y in 0..rows {
            let (l, r) = (row(width, y, 37, 11), row(width, y, 23, 41));
            sums.push_row_with::<SadScalar>(Some(&l), Some(&r));
        }
        sums
    }

    fn column_sad(win: &WindowBuffer, col: usize, disparity: usize) -> u32 {
        (0..win.window_size())
            .map(|i| {
                let r = col.checked_sub(disparity).map_or(0, |c| win.right_row(i)[c]);
                win.left_row(i)[col].abs_diff(r) as u32
            })
            .sum()
    }

    fn block_sad(win: &WindowBuffer, col: usize, disparity: usize) -> u32 {
        let wsize = win.window_size();
        (col + 1 - wsize..=col)
            .filter(|&c| c >= disparity)
            .map(|c| column_sad(win, c, disparity))
            .sum()
    }

    #[test]
    fn column_sums_follow_the_sliding_window() {
        let (width, wsize, ndisp) = (14, 5, 8);
        // Fewer, exactly as many and more rows than the window holds.
        for rows in [3, 5, 12] {
            let mut sums = fill(width, wsize, ndisp, rows);
            for _ in 0..2 {
                let win = sums.window().clone();
                for col in 0..sums.padded_width() {
                    let got = sums.costs(col, 0, ndisp);
                    for (d, &cost) in got.iter().enumerate() {
                        assert_eq!(cost, column_sad(&win, col, d), "rows {rows}, col {col}");
                    }
                    let deviation: u32 = (0..wsize)
                        .map(|i| win.left_row(i)[col].abs_diff(31) as u32)
                        .sum();
                    assert_eq!(sums.deviation(col), deviation);
                }
                // Bottom border rows retire real rows too.
                sums.push_row_with::<SadScalar>(None, None);
            }
        }
    }

    #[test]
    fn reset_matches_fresh_sums() {
        let mut sums = fill(10, 5, 4, 7);
        sums.reset();
        let fresh = ColumnSums::new(5, 10, 4, 31);
        for col in 0..sums.padded_width() {
            assert_eq!(sums.costs(col, 0, 4), fresh.costs(col, 0, 4));
            assert_eq!(sums.deviation(col), 5 * 31);
        }
    }

    #[test]
    fn incremental_costs_match_block_sums() {
        let wsize = 5;
        let sums = fill(20, wsize, 8, wsize);
        for first in [0usize, 4] {
            let mut acc = SadAccumulator::new(4, wsize);
            acc.begin_sweep(first);
            for col in 0..sums.padded_width() {
                acc.push_column(col, sums.costs(col, first, 4));
                if col + 1 < wsize {
                    continue;
                }
                for d in 0..4 {
                    assert_eq!(
                        acc.costs()[d],
                        block_sad(sums.window(), col, first + d),
                        "col {col}"
                    );
                }
            }
        }
    }

    #[test]
    fn lanes_become_valid_once_window_is_inside() {
        let wsize = 5;
        let sums = fill(12, wsize, 8, wsize);
        let mut acc = SadAccumulator::new(4, wsize);
        acc.begin_sweep(4);
        for col in 0..=7 {
            acc.push_column(col, sums.costs(col, 4, 4));
        }
        assert_eq!(acc.valid(), &[false, false, false, false]);
        acc.push_column(8, sums.costs(8, 4, 4));
        assert_eq!(acc.valid(), &[true, false, false, false]);
        for col in 9..=11 {
            acc.push_column(col, sums.costs(col, 4, 4));
        }
        assert_eq!(acc.valid(), &[true, true, true, true]);
    }

    #[test]
    fn begin_sweep_clears_state() {
        let wsize = 5;
        let sums = fill(10, wsize, 2, wsize);
        let mut acc = SadAccumulator::new(2, wsize);
        acc.begin_sweep(0);
        for col in 0..sums.padded_width() {
            acc.push_column(col, sums.costs(col, 0, 2));
        }
        acc.begin_sweep(2);
        assert_eq!(acc.first_disparity(), 2);
        assert_eq!(acc.costs(), &[0, 0]);
        assert_eq!(acc.valid(), &[false, false]);
    }
}
