//! In-memory frame source

use super::StreamInfo;
use crate::traits::FrameSource;
use crate::utils::ImageUtils;
use crate::Result;
use anyhow::Context;
use opencv::{core::Mat, prelude::*};
use tracky_core::{ContainerPosition, TrackError};

/// Frames held in memory at a fixed nominal rate.
///
/// The reported container clock can be skewed with `with_clock_drift` to
/// exercise consumers that must not depend on it.
pub struct MemorySource {
    info: StreamInfo,
    frames: Vec<Mat>,
    next: usize,
    current: Option<usize>,
    clock_drift: f64,
}

impl MemorySource {
    pub fn new(frames: Vec<Mat>, fps: f64) -> Result<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(TrackError::InvalidFrameRate(fps).into());
        }
        let first = frames
            .first()
            .ok_or_else(|| TrackError::EmptyStream("memory source".into()))?;

        let info = StreamInfo {
            fps,
            frame_count: frames.len() as u64,
            width: first.cols(),
            height: first.rows(),
        };
        Ok(Self {
            info,
            frames,
            next: 0,
            current: None,
            clock_drift: 1.0,
        })
    }

    pub fn from_rgb_images(images: &[image::RgbImage], fps: f64) -> Result<Self> {
        let frames = images
            .iter()
            .map(ImageUtils::rgb_to_mat)
            .collect::<Result<Vec<_>>>()?;
        Self::new(frames, fps)
    }

    /// Scale reported container times by `factor`
    pub fn with_clock_drift(mut self, factor: f64) -> Self {
        self.clock_drift = factor;
        self
    }
}

impl FrameSource for MemorySource {
    fn info(&self) -> &StreamInfo {
        &self.info
    }

    fn seek_near(&mut self, seconds: f64) -> Result<()> {
        let target = (seconds.max(0.0) * self.info.fps).floor() as usize;
        self.next = target.min(self.frames.len());
        self.current = None;
        Ok(())
    }

    fn grab(&mut self) -> Result<Option<ContainerPosition>> {
        if self.next >= self.frames.len() {
            self.current = None;
            return Ok(None);
        }
        let index = self.next;
        self.next += 1;
        self.current = Some(index);

        Ok(Some(ContainerPosition {
            frame: index as i64,
            time: index as f64 / self.info.fps * self.clock_drift,
        }))
    }

    fn retrieve(&mut self) -> Result<Mat> {
        let index = self.current.context("retrieve called before grab")?;
        self.frames[index].try_clone().context("Failed to copy frame")
    }
}
