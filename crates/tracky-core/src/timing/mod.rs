//! Run parameters and the immutable per-run context

mod clock;

pub use clock::{Phase, SamplingClock, Step, Tick};

use crate::error::TrackError;
use serde::{Deserialize, Serialize};

/// User-supplied sampling parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunParams {
    /// Frames at or before this nominal time are decoded but never sampled
    pub time_start: f64,
    /// Last nominal time sampled; the stream duration when unset
    pub time_end: Option<f64>,
    /// Shift applied to the output time column only
    pub time_offset: f64,
    /// Emit every Nth retained frame
    pub frame_skip_stride: u32,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            time_start: 0.0,
            time_end: None,
            time_offset: 0.0,
            frame_skip_stride: 1,
        }
    }
}

/// Everything a run needs to know about timing, resolved once against the
/// stream metadata and shared read-only by every component.
#[derive(Debug, Clone, PartialEq)]
pub struct RunContext {
    fps: f64,
    seconds_per_frame: f64,
    duration: f64,
    time_start: f64,
    time_end: f64,
    time_offset: f64,
    frame_skip_stride: u32,
}

impl RunContext {
    pub fn new(fps: f64, frame_count: u64, params: &RunParams) -> Result<Self, TrackError> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(TrackError::InvalidFrameRate(fps));
        }
        if params.frame_skip_stride == 0 {
            return Err(TrackError::InvalidRunParams(
                "frame skip stride must be at least 1".into(),
            ));
        }

        let duration = frame_count as f64 / fps;
        let time_end = params.time_end.unwrap_or(duration);

        if !params.time_start.is_finite()
            || !time_end.is_finite()
            || !params.time_offset.is_finite()
        {
            return Err(TrackError::InvalidRunParams(
                "start, end and offset must be finite".into(),
            ));
        }
        if time_end < params.time_start {
            return Err(TrackError::InvalidRunParams(format!(
                "end time {:.3}s precedes start time {:.3}s",
                time_end, params.time_start
            )));
        }

        Ok(Self {
            fps,
            seconds_per_frame: 1.0 / fps,
            duration,
            time_start: params.time_start,
            time_end,
            time_offset: params.time_offset,
            frame_skip_stride: params.frame_skip_stride,
        })
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn seconds_per_frame(&self) -> f64 {
        self.seconds_per_frame
    }

    /// Nominal stream duration from the container's frame count
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn time_start(&self) -> f64 {
        self.time_start
    }

    pub fn time_end(&self) -> f64 {
        self.time_end
    }

    pub fn time_offset(&self) -> f64 {
        self.time_offset
    }

    pub fn frame_skip_stride(&self) -> u32 {
        self.frame_skip_stride
    }

    /// Nominal time of the `frame_index`th decoded frame.
    ///
    /// Derived from the index alone so the sampling grid never accumulates
    /// rounding error, however long the stream.
    pub fn nominal_time(&self, frame_index: u64) -> f64 {
        frame_index as f64 / self.fps
    }

    pub fn display_time(&self, nominal_time: f64) -> f64 {
        nominal_time + self.time_offset
    }

    /// Approximate number of retained frames, for progress reporting only.
    pub fn expected_retained(&self) -> u64 {
        let end = self.time_end.min(self.duration);
        ((end - self.time_start).max(0.0) * self.fps) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_resolve_to_duration() {
        let ctx = RunContext::new(30.0, 300, &RunParams::default()).unwrap();
        assert_eq!(ctx.time_end(), 10.0);
        assert_eq!(ctx.time_start(), 0.0);
        assert_eq!(ctx.frame_skip_stride(), 1);
        assert_eq!(ctx.expected_retained(), 300);
    }

    #[test]
    fn test_nominal_time_is_exact_on_whole_seconds() {
        let ctx = RunContext::new(30.0, 900, &RunParams::default()).unwrap();
        assert_eq!(ctx.nominal_time(300), 10.0);
        assert_eq!(ctx.nominal_time(900), 30.0);
    }

    #[test]
    fn test_rejects_bad_params() {
        assert!(matches!(
            RunContext::new(0.0, 10, &RunParams::default()),
            Err(TrackError::InvalidFrameRate(_))
        ));
        assert!(matches!(
            RunContext::new(f64::NAN, 10, &RunParams::default()),
            Err(TrackError::InvalidFrameRate(_))
        ));

        let stride_zero = RunParams {
            frame_skip_stride: 0,
            ..Default::default()
        };
        assert!(RunContext::new(25.0, 10, &stride_zero).is_err());

        let inverted = RunParams {
            time_start: 5.0,
            time_end: Some(2.0),
            ..Default::default()
        };
        assert!(RunContext::new(25.0, 1000, &inverted).is_err());
    }

    #[test]
    fn test_display_time_applies_offset() {
        let params = RunParams {
            time_offset: -1.5,
            ..Default::default()
        };
        let ctx = RunContext::new(10.0, 100, &params).unwrap();
        assert_eq!(ctx.display_time(2.0), 0.5);
    }
}
