//! Matcher configuration and its construction-time validation.

use crate::util::{StereoError, StereoResult};

/// Largest disparity range whose 1/16-pixel output still fits an `i16`.
pub const MAX_DISPARITIES: usize = 2047;

/// Largest window side; keeps every window SAD and texture sum inside `u32`.
pub const MAX_WINDOW_SIZE: usize = 255;

/// Parameters of the SAD block matcher.
///
/// `num_disparities` candidates `0..num_disparities` are searched in
/// `sweep_factor()` sweeps of `lane_width` candidates each.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StereoConfig {
    /// Side of the square SAD window; odd and at least 5.
    pub window_size: usize,
    /// Number of disparity candidates searched.
    pub num_disparities: usize,
    /// Candidates evaluated per sweep.
    pub lane_width: usize,
    /// Clamp of the gradient prefilter; also the zero level of the texture score.
    pub pre_filter_cap: u8,
    /// Minimum window texture score for a pixel to be matched.
    pub texture_threshold: i32,
    /// Uniqueness margin in percent; 0 disables the test.
    pub uniqueness_ratio: i32,
    /// Use the row-parallel path when the `rayon` feature is enabled.
    pub parallel: bool,
}

impl Default for StereoConfig {
    fn default() -> Self {
        Self {
            window_size: 11,
            num_disparities: 32,
            lane_width: 8,
            pre_filter_cap: 31,
            texture_threshold: 10,
            uniqueness_ratio: 15,
            parallel: false,
        }
    }
}

impl StereoConfig {
    /// Half window `(window_size - 1) / 2`.
    pub fn half_window(&self) -> usize {
        (self.window_size - 1) / 2
    }

    /// Number of sweeps needed to cover the disparity range.
    pub fn sweep_factor(&self) -> usize {
        self.num_disparities.div_ceil(self.lane_width.max(1))
    }

    /// Validates the size-independent constraints.
    pub fn validate(&self) -> StereoResult<()> {
        if self.window_size % 2 == 0 {
            return Err(invalid("window_size", "must be odd"));
        }
        if self.window_size < 5 {
            return Err(invalid("window_size", "must be at least 5"));
        }
        if self.window_size > MAX_WINDOW_SIZE {
            return Err(invalid("window_size", "must be at most 255"));
        }
        if self.num_disparities < 2 {
            return Err(invalid("num_disparities", "must be greater than 1"));
        }
        if self.num_disparities > MAX_DISPARITIES {
            return Err(invalid(
                "num_disparities",
                "exceeds the range representable in 1/16-pixel i16 output",
            ));
        }
        if self.lane_width == 0 {
            return Err(invalid("lane_width", "must be at least 1"));
        }
        if self.lane_width > self.num_disparities {
            return Err(invalid("lane_width", "must not exceed num_disparities"));
        }
        if self.num_disparities % self.lane_width != 0 {
            return Err(invalid(
                "num_disparities",
                "must be a multiple of lane_width",
            ));
        }
        if !(1..=63).contains(&self.pre_filter_cap) {
            return Err(invalid("pre_filter_cap", "must be within 1..=63"));
        }
        if self.texture_threshold < 0 {
            return Err(invalid("texture_threshold", "must be non-negative"));
        }
        if self.uniqueness_ratio < 0 {
            return Err(invalid("uniqueness_ratio", "must be non-negative"));
        }
        Ok(())
    }

    /// Validates the configuration against a concrete image size.
    pub fn validate_for(&self, width: usize, height: usize) -> StereoResult<()> {
        if width == 0 || height == 0 {
            return Err(StereoError::InvalidDimensions { width, height });
        }
        self.validate()?;
        if self.num_disparities >= width {
            return Err(invalid(
                "num_disparities",
                "must be smaller than the image width",
            ));
        }
        if self.window_size >= width.min(height) {
            return Err(invalid(
                "window_size",
                "must be smaller than the image width and height",
            ));
        }
        Ok(())
    }
}

fn invalid(param: &'static str, reason: &'static str) -> StereoError {
    StereoError::InvalidConfig { param, reason }
}
