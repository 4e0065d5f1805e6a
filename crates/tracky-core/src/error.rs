use crate::elements::Roi;
use thiserror::Error;

/// Fatal conditions of a tracking run.
#[derive(Debug, Error)]
pub enum TrackError {
    #[error("failed to open video stream: {0}")]
    VideoOpen(String),

    #[error("video stream {0} has no decodable frames")]
    EmptyStream(String),

    #[error("invalid frame rate {0} reported by the container")]
    InvalidFrameRate(f64),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("element name '{0}' is used more than once")]
    DuplicateElement(String),

    #[error("invalid roi {0:?}: x and y must be >= 0, width and height > 0")]
    InvalidRoi([i32; 4]),

    #[error("roi {roi} of element '{element}' lies outside the {frame_width}x{frame_height} frame")]
    RoiOutOfBounds {
        element: String,
        roi: Roi,
        frame_width: i32,
        frame_height: i32,
    },

    #[error("element '{element}': template shape {expected:?} differs from candidate {actual:?}")]
    ShapeMismatch {
        element: String,
        expected: (i32, i32, i32),
        actual: (i32, i32, i32),
    },

    #[error("unsupported pixel depth {0}, only 8-bit regions can be scored")]
    UnsupportedPixelFormat(i32),

    #[error("seek to {0:.3}s landed past the end of the stream")]
    SeekPastEnd(f64),

    #[error("invalid run parameters: {0}")]
    InvalidRunParams(String),
}
