//! Tracky Computer Vision Library
//! 
//! Frame sources, template capture and SSIM scoring over OpenCV, plus the
//! frame-by-frame element tracker that ties them to the sampling clock.

pub mod region;
pub mod similarity;
pub mod template;
pub mod tracking;
pub mod utils;
pub mod video;

// Re-export commonly used types
pub use region::{crop_region, RegionShape};
pub use similarity::{SsimConfig, SsimScorer};
pub use template::{Template, TemplateCapture};
pub use tracking::{ElementTracker, RunSummary, StopReason, TrackerConfig};
pub use video::{MemorySource, StreamInfo, VideoCaptureSource};

// Error handling
pub type Result<T> = anyhow::Result<T>;

/// Core traits for the CV system
pub mod traits {
    use super::*;
    use opencv::core::Mat;
    use tracky_core::ContainerPosition;

    /// A decoded video stream, read strictly forward apart from `seek_near`.
    pub trait FrameSource {
        /// Stream metadata, read once at open
        fn info(&self) -> &StreamInfo;

        /// Ask the decoder to position itself at or before `seconds`.
        /// Advisory: the landing position is whatever the next `grab` reports.
        fn seek_near(&mut self, seconds: f64) -> Result<()>;

        /// Advance exactly one frame. `None` at end of stream.
        fn grab(&mut self) -> Result<Option<ContainerPosition>>;

        /// Pixels of the most recently grabbed frame.
        fn retrieve(&mut self) -> Result<Mat>;

        fn next_frame(&mut self) -> Result<Option<video::DecodedFrame>> {
            match self.grab()? {
                Some(position) => Ok(Some(video::DecodedFrame {
                    image: self.retrieve()?,
                    position,
                })),
                None => Ok(None),
            }
        }
    }

    /// Similarity between two equally shaped regions.
    pub trait RegionScorer {
        fn score(&self, element: &str, template: &Mat, candidate: &Mat) -> Result<f64>;
    }
}
