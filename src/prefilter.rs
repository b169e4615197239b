//! Gradient prefilters applied to each image before matching.
//!
//! The matcher expects inputs that went through a horizontal gradient and a
//! clamp to `[0, 2 * cap]`, where `cap` marks zero gradient. [`SobelClip`] is
//! that operator; [`Passthrough`] is for inputs preprocessed elsewhere.

use crate::image::{ImageView, OwnedImage};
use crate::util::{StereoError, StereoResult};

/// Per-image preprocessing operator. Output has the input's dimensions.
pub trait Prefilter {
    fn apply(&self, image: ImageView<'_, u8>) -> StereoResult<OwnedImage>;
}

/// 3x3 Sobel x-gradient followed by a symmetric clamp around `cap`.
///
/// The one-pixel image frame has gradient 0 and therefore maps to `cap`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SobelClip {
    cap: u8,
}

impl SobelClip {
    /// Creates the filter; `cap` must be within `1..=63`.
    pub fn new(cap: u8) -> StereoResult<Self> {
        if !(1..=63).contains(&cap) {
            return Err(StereoError::InvalidConfig {
                param: "pre_filter_cap",
                reason: "must be within 1..=63",
            });
        }
        Ok(Self { cap })
    }

    /// Returns the clamp value.
    pub fn cap(&self) -> u8 {
        self.cap
    }

    #[inline]
    fn clip(&self, gradient: i32) -> u8 {
        let cap = self.cap as i32;
        if gradient < -cap {
            0
        } else if gradient > cap {
            (2 * cap) as u8
        } else {
            (gradient + cap) as u8
        }
    }
}

impl Prefilter for SobelClip {
    fn apply(&self, image: ImageView<'_, u8>) -> StereoResult<OwnedImage> {
        let width = image.width();
        let height = image.height();
        let mut out = OwnedImage::filled(width, height, self.cap)?;
        if width < 3 || height < 3 {
            return Ok(out);
        }

        let rows_err = || StereoError::BufferTooSmall {
            needed: height * image.stride(),
            got: image.as_slice().len(),
        };
        let dst = out.data_mut();
        for y in 1..height - 1 {
            let above = image.row(y - 1).ok_or_else(rows_err)?;
            let here = image.row(y).ok_or_else(rows_err)?;
            let below = image.row(y + 1).ok_or_else(rows_err)?;
            let dst_row = &mut dst[y * width..(y + 1) * width];
            for x in 1..width - 1 {
                let right = above[x + 1] as i32 + 2 * here[x + 1] as i32 + below[x + 1] as i32;
                let left = above[x - 1] as i32 + 2 * here[x - 1] as i32 + below[x - 1] as i32;
                dst_row[x] = self.clip(right - left);
            }
        }
        Ok(out)
    }
}

/// Copies the input unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct Passthrough;

impl Prefilter for Passthrough {
    fn apply(&self, image: ImageView<'_, u8>) -> StereoResult<OwnedImage> {
        OwnedImage::from_view(image)
    }
}
