//! Disparity output: sentinel, per-pixel values and the map.

use crate::image::OwnedImage;
use crate::refine::DISPARITY_SCALE;
use crate::util::StereoResult;

/// Value stored for pixels without a trustworthy match.
///
/// Refined disparities are never negative, so `-16` cannot collide with one.
pub const FILTERED: i16 = -DISPARITY_SCALE as i16;

/// One output pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisparityPixel {
    /// Disparity in 1/16 pixel.
    Valid(i16),
    /// Border, low texture, ambiguous or unmatched.
    Filtered,
}

impl DisparityPixel {
    /// Decodes a raw map value.
    pub fn from_raw(raw: i16) -> Self {
        if raw == FILTERED {
            Self::Filtered
        } else {
            Self::Valid(raw)
        }
    }

    /// Raw map value.
    pub fn raw(self) -> i16 {
        match self {
            Self::Valid(v) => v,
            Self::Filtered => FILTERED,
        }
    }

    /// Whole-pixel part of a valid disparity.
    pub fn integer(self) -> Option<i16> {
        match self {
            Self::Valid(v) => Some(v >> 4),
            Self::Filtered => None,
        }
    }

    /// Fractional part in 1/16 pixel.
    pub fn fraction(self) -> Option<u8> {
        match self {
            Self::Valid(v) => Some((v & 0xF) as u8),
            Self::Filtered => None,
        }
    }

    /// Disparity in pixels.
    pub fn to_f32(self) -> Option<f32> {
        match self {
            Self::Valid(v) => Some(v as f32 / DISPARITY_SCALE as f32),
            Self::Filtered => None,
        }
    }

    /// Whether the pixel carries a disparity.
    pub fn is_valid(self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

/// Dense disparity map in raster order, 1/16 pixel per unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisparityMap {
    width: usize,
    height: usize,
    data: Vec<i16>,
}

impl DisparityMap {
    pub(crate) fn from_raw(data: Vec<i16>, width: usize, height: usize) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            width,
            height,
            data,
        }
    }

    /// Map width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Map height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw values, `FILTERED` for rejected pixels.
    pub fn as_slice(&self) -> &[i16] {
        &self.data
    }

    /// Consumes the map and returns its raw values.
    pub fn into_vec(self) -> Vec<i16> {
        self.data
    }

    /// Raw value at `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> Option<i16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }

    /// Decoded pixel at `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<DisparityPixel> {
        self.get(x, y).map(DisparityPixel::from_raw)
    }

    /// Row `y` of raw values.
    pub fn row(&self, y: usize) -> Option<&[i16]> {
        if y >= self.height {
            return None;
        }
        self.data.get(y * self.width..(y + 1) * self.width)
    }

    /// Number of pixels with a disparity.
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|&&v| v != FILTERED).count()
    }

    /// Smallest and largest valid raw values.
    pub fn disparity_range(&self) -> Option<(i16, i16)> {
        self.data
            .iter()
            .copied()
            .filter(|&v| v != FILTERED)
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Disparities in pixels, NaN where filtered.
    pub fn to_f32(&self) -> Vec<f32> {
        self.data
            .iter()
            .map(|&v| DisparityPixel::from_raw(v).to_f32().unwrap_or(f32::NAN))
            .collect()
    }

    /// 8-bit visualization scaled by the largest valid value; filtered is 0.
    pub fn to_gray_normalized(&self) -> StereoResult<OwnedImage> {
        let max = self
            .disparity_range()
            .map(|(_, hi)| hi.max(1) as f32)
            .unwrap_or(1.0);
        let data = self
            .data
            .iter()
            .map(|&v| {
                if v == FILTERED || v <= 0 {
                    0
                } else {
                    (v as f32 * 255.0 / max).round().min(255.0) as u8
                }
            })
            .collect();
        OwnedImage::new(data, self.width, self.height)
    }
}

/// Appends refined disparities or the sentinel in raster order.
#[derive(Clone, Debug, Default)]
pub struct DisparityEmitter {
    out: Vec<i16>,
}

impl DisparityEmitter {
    /// Creates an emitter with room for `capacity` pixels.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            out: Vec::with_capacity(capacity),
        }
    }

    /// Writes one pixel; `None` writes the sentinel.
    #[inline]
    pub fn emit(&mut self, value: Option<i16>) {
        self.out.push(value.unwrap_or(FILTERED));
    }

    /// Number of pixels written so far.
    pub fn len(&self) -> usize {
        self.out.len()
    }

    /// Whether nothing was written yet.
    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    /// Drops everything written so far.
    pub fn clear(&mut self) {
        self.out.clear();
    }

    /// Returns the written values, leaving the emitter empty.
    pub fn take(&mut self) -> Vec<i16> {
        std::mem::take(&mut self.out)
    }

    /// Copies the written values into `dst` and clears, keeping capacity.
    pub fn drain_into(&mut self, dst: &mut [i16]) {
        dst.copy_from_slice(&self.out);
        self.out.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{DisparityEmitter, DisparityMap, DisparityPixel, FILTERED};

    #[test]
    fn pixel_decoding() {
        assert_eq!(DisparityPixel::from_raw(FILTERED), DisparityPixel::Filtered);
        let px = DisparityPixel::from_raw(52);
        assert_eq!(px.integer(), Some(3));
        assert_eq!(px.fraction(), Some(4));
        assert_eq!(px.to_f32(), Some(3.25));
        assert_eq!(px.raw(), 52);
        assert!(!DisparityPixel::Filtered.is_valid());
    }

    #[test]
    fn emitter_writes_sentinel_for_rejected_pixels() {
        let mut emitter = DisparityEmitter::with_capacity(3);
        emitter.emit(Some(48));
        emitter.emit(None);
        emitter.emit(Some(0));
        assert_eq!(emitter.len(), 3);
        assert_eq!(emitter.take(), vec![48, FILTERED, 0]);
        assert!(emitter.is_empty());
    }

    #[test]
    fn map_statistics_ignore_filtered() {
        let map = DisparityMap::from_raw(vec![FILTERED, 16, 40, FILTERED, 8, 32], 3, 2);
        assert_eq!(map.valid_count(), 4);
        assert_eq!(map.disparity_range(), Some((8, 40)));
        assert_eq!(map.get(1, 1), Some(8));
        assert_eq!(map.pixel(0, 0), Some(DisparityPixel::Filtered));
        assert_eq!(map.row(1), Some(&[FILTERED, 8, 32][..]));
        assert!(map.get(3, 0).is_none());

        let f = map.to_f32();
        assert!(f[0].is_nan());
        assert_eq!(f[2], 2.5);

        let gray = map.to_gray_normalized().unwrap();
        assert_eq!(gray.data(), &[0, 102, 255, 0, 51, 204]);
    }
}
