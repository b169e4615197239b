//! Error types for stereobm.

use thiserror::Error;

/// Result alias for stereobm operations.
pub type StereoResult<T> = std::result::Result<T, StereoError>;

/// Errors that can occur when configuring or running the matcher.
///
/// Low-texture, ambiguous and border pixels are not errors; they are emitted
/// as [`FILTERED`](crate::FILTERED) in the disparity map.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StereoError {
    /// Image width or height is zero or overflows.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Row stride is smaller than the row width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// Backing buffer is shorter than the view requires.
    #[error("buffer too small: need {needed} elements, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// Left and right images differ in size.
    #[error(
        "stereo pair size mismatch: left {left_width}x{left_height}, right {right_width}x{right_height}"
    )]
    SizeMismatch {
        left_width: usize,
        left_height: usize,
        right_width: usize,
        right_height: usize,
    },
    /// A frame does not have the size the matcher was built for.
    #[error("frame is {width}x{height}, matcher expects {expected_width}x{expected_height}")]
    FrameSizeMismatch {
        expected_width: usize,
        expected_height: usize,
        width: usize,
        height: usize,
    },
    /// A matcher parameter is out of range; raised at construction only.
    #[error("invalid configuration for `{param}`: {reason}")]
    InvalidConfig {
        param: &'static str,
        reason: &'static str,
    },
    /// A streamed row does not have the configured width.
    #[error("row length {got} does not match image width {expected}")]
    RowLengthMismatch { expected: usize, got: usize },
    /// More rows were pushed than the configured image height.
    #[error("frame already holds {height} rows")]
    FrameOverrun { height: usize },
    /// The frame was finished before every row was pushed.
    #[error("incomplete frame: received {received} of {expected} rows")]
    IncompleteFrame { received: usize, expected: usize },
    /// Processing was cancelled between rows.
    #[error("aborted after {rows_done} rows")]
    Aborted { rows_done: usize },
    /// Image decoding or encoding failed.
    #[error("image i/o failed: {reason}")]
    ImageIo { reason: String },
}
