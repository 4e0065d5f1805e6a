//! Frame sources

pub mod capture;
pub mod memory;

pub use capture::VideoCaptureSource;
pub use memory::MemorySource;

use opencv::core::Mat;
use tracky_core::ContainerPosition;

/// Stream metadata, read once at open
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamInfo {
    pub fps: f64,
    pub frame_count: u64,
    pub width: i32,
    pub height: i32,
}

impl StreamInfo {
    pub fn seconds_per_frame(&self) -> f64 {
        1.0 / self.fps
    }

    pub fn duration(&self) -> f64 {
        self.frame_count as f64 / self.fps
    }

    /// False when the container did not report a frame count
    pub fn has_known_length(&self) -> bool {
        self.frame_count > 0
    }
}

/// One decoded frame and where the container says it is
pub struct DecodedFrame {
    pub image: Mat,
    pub position: ContainerPosition,
}
