//! Texture and border gating.
//!
//! The texture score of a pixel is the window sum of `|p - cap|` over the
//! left image, i.e. how far the prefiltered gradients stray from zero. It is
//! maintained with the same column box filter as the SAD lanes, fed by the
//! deviation sums of [`ColumnSums`](crate::lowlevel::ColumnSums).

use crate::config::StereoConfig;

/// Incremental window texture score along a row.
#[derive(Clone, Debug)]
pub struct TextureAccumulator {
    history: Vec<u32>,
    slot: usize,
    sum: u32,
}

impl TextureAccumulator {
    /// Creates an accumulator over `window_size` columns.
    pub fn new(window_size: usize) -> Self {
        Self {
            history: vec![0; window_size],
            slot: 0,
            sum: 0,
        }
    }

    /// Starts a new row.
    pub fn reset(&mut self) {
        self.history.fill(0);
        self.slot = 0;
        self.sum = 0;
    }

    /// Slides the window one column right, `incoming` being the new column's
    /// deviation sum, and returns the score.
    pub fn push_column(&mut self, incoming: u32) -> u32 {
        self.sum = self.sum - self.history[self.slot] + incoming;
        self.history[self.slot] = incoming;
        self.slot = (self.slot + 1) % self.history.len();
        self.sum
    }

    /// Current window score.
    pub fn score(&self) -> u32 {
        self.sum
    }
}

/// Border and texture rules for one frame size.
#[derive(Clone, Copy, Debug)]
pub struct ValidityGate {
    width: usize,
    height: usize,
    half: usize,
    left_margin: usize,
    texture_threshold: u32,
}

impl ValidityGate {
    /// Builds the gate for a validated configuration.
    pub fn new(cfg: &StereoConfig, width: usize, height: usize) -> Self {
        let half = cfg.half_window();
        Self {
            width,
            height,
            half,
            left_margin: cfg.num_disparities - 1 + half,
            texture_threshold: cfg.texture_threshold.max(0) as u32,
        }
    }

    /// Whether `(x, y)` lies in the frame the matcher never reports.
    ///
    /// The left margin is wider because a match needs `num_disparities`
    /// columns of context in the right image.
    pub fn is_border(&self, x: usize, y: usize) -> bool {
        y < self.half
            || y + self.half >= self.height
            || x < self.left_margin
            || x + self.half >= self.width
    }

    /// Whether the window texture is high enough.
    pub fn texture_ok(&self, score: u32) -> bool {
        score >= self.texture_threshold
    }

    /// Combined border and texture check.
    pub fn passes(&self, x: usize, y: usize, texture: u32) -> bool {
        !self.is_border(x, y) && self.texture_ok(texture)
    }
}

#[cfg(test)]
mod tests {
    use super::{TextureAccumulator, ValidityGate};
    use crate::config::StereoConfig;
    use crate::sad::ColumnSums;

    #[test]
    fn texture_matches_window_sum() {
        let wsize = 5;
        let width = 9;
        let mut sums = ColumnSums::new(wsize, width, 2, 31);
        for y in 0..wsize {
            let row: Vec<u8> = (0..width).map(|x| ((x * 9 + y * 5) % 60) as u8).collect();
            sums.push_row(Some(&row), Some(&row));
        }
        let win = sums.window();
        let mut tex = TextureAccumulator::new(wsize);
        for col in 0..sums.padded_width() {
            let score = tex.push_column(sums.deviation(col));
            if col + 1 < wsize {
                continue;
            }
            let mut expected = 0;
            for c in col + 1 - wsize..=col {
                for i in 0..wsize {
                    expected += win.left_row(i)[c].abs_diff(31) as u32;
                }
            }
            assert_eq!(score, expected);
            assert_eq!(tex.score(), expected);
        }
    }

    #[test]
    fn flat_cap_window_has_zero_texture() {
        let mut sums = ColumnSums::new(5, 6, 2, 31);
        for _ in 0..5 {
            sums.push_row(Some(&[31; 6]), Some(&[31; 6]));
        }
        let mut tex = TextureAccumulator::new(5);
        let mut last = u32::MAX;
        for col in 2..8 {
            last = tex.push_column(sums.deviation(col));
        }
        assert_eq!(last, 0);
    }

    #[test]
    fn border_margins() {
        let cfg = StereoConfig {
            window_size: 5,
            num_disparities: 8,
            lane_width: 4,
            texture_threshold: 0,
            ..StereoConfig::default()
        };
        let gate = ValidityGate::new(&cfg, 16, 16);
        // Left margin is num_disparities - 1 + half = 9.
        assert!(gate.is_border(8, 5));
        assert!(!gate.is_border(9, 5));
        assert!(!gate.is_border(13, 5));
        assert!(gate.is_border(14, 5));
        assert!(gate.is_border(10, 1));
        assert!(!gate.is_border(10, 2));
        assert!(!gate.is_border(10, 13));
        assert!(gate.is_border(10, 14));
    }

    #[test]
    fn texture_threshold_is_inclusive() {
        let cfg = StereoConfig {
            texture_threshold: 20,
            ..StereoConfig::default()
        };
        let gate = ValidityGate::new(&cfg, 64, 64);
        assert!(!gate.texture_ok(19));
        assert!(gate.texture_ok(20));
    }
}
