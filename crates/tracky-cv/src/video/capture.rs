//! OpenCV `VideoCapture` backed source

use super::StreamInfo;
use crate::traits::FrameSource;
use crate::Result;
use anyhow::Context;
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{self, VideoCapture},
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracky_core::{ContainerPosition, TrackError};

enum Cursor {
    /// Nothing grabbed since open or the last seek
    Idle,
    /// Decoded ahead of time; served by the next grab
    Pending(Mat, ContainerPosition),
    /// Grabbed frame whose pixels are already held
    Buffered(Mat),
    /// Grabbed frame still inside the decoder
    Grabbed,
}

pub struct VideoCaptureSource {
    path: PathBuf,
    capture: VideoCapture,
    info: StreamInfo,
    cursor: Cursor,
}

impl VideoCaptureSource {
    /// Open `path`, read its metadata and decode the first frame.
    ///
    /// The frame size is only knowable from a decoded frame, so a stream
    /// whose first frame cannot be read fails here.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.to_string_lossy();

        let mut capture = VideoCapture::from_file(&path_str, videoio::CAP_ANY)
            .map_err(|e| TrackError::VideoOpen(format!("{}: {}", path_str, e)))?;
        if !capture.is_opened()? {
            return Err(TrackError::VideoOpen(path_str.to_string()).into());
        }

        let fps = capture
            .get(videoio::CAP_PROP_FPS)
            .context("Failed to read frame rate")?;
        if !fps.is_finite() || fps <= 0.0 {
            return Err(TrackError::InvalidFrameRate(fps).into());
        }
        let frame_count = capture
            .get(videoio::CAP_PROP_FRAME_COUNT)
            .context("Failed to read frame count")?
            .max(0.0) as u64;

        let mut first = Mat::default();
        if !capture.read(&mut first).context("Failed to decode first frame")? || first.empty() {
            return Err(TrackError::EmptyStream(path_str.to_string()).into());
        }

        let info = StreamInfo {
            fps,
            frame_count,
            width: first.cols(),
            height: first.rows(),
        };

        let duration = info.duration();
        info!(
            path = %path.display(),
            fps = format_args!("{:.5}", fps),
            frames = frame_count,
            spf = format_args!("{:.5}", info.seconds_per_frame()),
            duration = format_args!(
                "{}:{:06.3} (M:S) {:.3} (S)",
                (duration / 60.0) as u64,
                duration % 60.0,
                duration
            ),
            size = format_args!("{} x {}", info.width, info.height),
            "opened video"
        );
        if !info.has_known_length() {
            warn!(
                path = %path.display(),
                "container reports no frame count; pass --time-end or nothing will be sampled"
            );
        }

        let mut source = Self {
            path: path.to_path_buf(),
            capture,
            info,
            cursor: Cursor::Idle,
        };
        let position = source.container_position()?;
        source.cursor = Cursor::Pending(first, position);
        Ok(source)
    }

    /// Decoder's own idea of the frame just grabbed
    fn container_position(&self) -> Result<ContainerPosition> {
        let frames = self
            .capture
            .get(videoio::CAP_PROP_POS_FRAMES)
            .context("Failed to read container frame position")?;
        let msec = self
            .capture
            .get(videoio::CAP_PROP_POS_MSEC)
            .context("Failed to read container time position")?;

        Ok(ContainerPosition {
            frame: frames as i64 - 1,
            time: msec / 1000.0 - self.info.seconds_per_frame(),
        })
    }
}

impl FrameSource for VideoCaptureSource {
    fn info(&self) -> &StreamInfo {
        &self.info
    }

    fn seek_near(&mut self, seconds: f64) -> Result<()> {
        self.cursor = Cursor::Idle;
        let accepted = self
            .capture
            .set(videoio::CAP_PROP_POS_MSEC, seconds * 1000.0)
            .with_context(|| format!("Failed to seek to {:.3}s", seconds))?;
        if !accepted {
            warn!(seconds, "decoder rejected seek request");
        }
        debug!(seconds, "seek requested");
        Ok(())
    }

    fn grab(&mut self) -> Result<Option<ContainerPosition>> {
        if let Cursor::Pending(image, position) =
            std::mem::replace(&mut self.cursor, Cursor::Idle)
        {
            self.cursor = Cursor::Buffered(image);
            return Ok(Some(position));
        }

        if !self.capture.grab().context("Failed to grab frame")? {
            self.cursor = Cursor::Idle;
            return Ok(None);
        }
        self.cursor = Cursor::Grabbed;
        Ok(Some(self.container_position()?))
    }

    fn retrieve(&mut self) -> Result<Mat> {
        match &self.cursor {
            Cursor::Buffered(image) => image.try_clone().context("Failed to copy buffered frame"),
            Cursor::Grabbed => {
                let mut image = Mat::default();
                let ok = self
                    .capture
                    .retrieve(&mut image, 0)
                    .context("Failed to retrieve frame")?;
                if !ok || image.empty() {
                    anyhow::bail!(
                        "Decoder returned no pixels for grabbed frame in {}",
                        self.path.display()
                    );
                }
                Ok(image)
            }
            Cursor::Idle | Cursor::Pending(..) => anyhow::bail!("retrieve called before grab"),
        }
    }
}
