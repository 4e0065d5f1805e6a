//! Sampling clock
//!
//! Walks decoded frames one at a time and decides, from the frame count
//! alone, which of them fall in the sampling window and which are emitted.
//! The container's own timestamps never enter this state machine.

use super::RunContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nominal time at or before `time_start`
    Seek,
    /// Nominal time inside `(time_start, time_end]`
    Active,
    /// Past `time_end` or end of stream
    Done,
}

/// Position of one decoded frame on the nominal grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Zero-based count of frames decoded since the stream was opened
    pub frame_index: u64,
    pub nominal_time: f64,
    /// One-based count of retained frames; zero while seeking
    pub retained_index: u64,
}

/// Decision for one decoded frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Before the window: advance the stream, nothing else
    Seek(Tick),
    /// Retained but dropped by the stride
    Skip(Tick),
    /// Retained and selected: score and emit a record
    Emit(Tick),
    /// Window closed; the triggering frame produces nothing
    Done,
}

#[derive(Debug, Clone)]
pub struct SamplingClock {
    fps: f64,
    time_start: f64,
    time_end: f64,
    stride: u64,
    frame_index: u64,
    retained: u64,
    emitted: u64,
    phase: Phase,
}

impl SamplingClock {
    pub fn new(ctx: &RunContext) -> Self {
        Self {
            fps: ctx.fps(),
            time_start: ctx.time_start(),
            time_end: ctx.time_end(),
            stride: ctx.frame_skip_stride().max(1) as u64,
            frame_index: 0,
            retained: 0,
            emitted: 0,
            phase: Phase::Seek,
        }
    }

    /// Account for one freshly decoded frame.
    pub fn advance(&mut self) -> Step {
        if self.phase == Phase::Done {
            return Step::Done;
        }

        let frame_index = self.frame_index;
        let nominal_time = frame_index as f64 / self.fps;

        if nominal_time > self.time_end {
            self.phase = Phase::Done;
            return Step::Done;
        }
        self.frame_index += 1;

        if nominal_time <= self.time_start {
            self.phase = Phase::Seek;
            return Step::Seek(Tick {
                frame_index,
                nominal_time,
                retained_index: 0,
            });
        }

        self.phase = Phase::Active;
        self.retained += 1;
        let tick = Tick {
            frame_index,
            nominal_time,
            retained_index: self.retained,
        };

        if self.retained % self.stride == 0 {
            self.emitted += 1;
            Step::Emit(tick)
        } else {
            Step::Skip(tick)
        }
    }

    /// The source ran dry.
    pub fn end_of_stream(&mut self) {
        self.phase = Phase::Done;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Frames accounted for so far, excluding a frame that closed the window
    pub fn frames_seen(&self) -> u64 {
        self.frame_index
    }

    pub fn retained(&self) -> u64 {
        self.retained
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::RunParams;

    fn context(fps: f64, frames: u64, start: f64, end: Option<f64>, stride: u32) -> RunContext {
        let params = RunParams {
            time_start: start,
            time_end: end,
            time_offset: 0.0,
            frame_skip_stride: stride,
        };
        RunContext::new(fps, frames, &params).unwrap()
    }

    /// Drive the clock over `frames` decodable frames, collecting emitted ticks.
    fn run(ctx: &RunContext, frames: u64) -> (Vec<Tick>, SamplingClock) {
        let mut clock = SamplingClock::new(ctx);
        let mut emitted = Vec::new();
        for _ in 0..frames {
            match clock.advance() {
                Step::Emit(tick) => emitted.push(tick),
                Step::Seek(_) | Step::Skip(_) => {}
                Step::Done => return (emitted, clock),
            }
        }
        clock.end_of_stream();
        (emitted, clock)
    }

    #[test]
    fn test_first_frame_is_seek_when_start_is_zero() {
        let ctx = context(30.0, 300, 0.0, Some(10.0), 1);
        let mut clock = SamplingClock::new(&ctx);

        assert!(matches!(clock.advance(), Step::Seek(t) if t.frame_index == 0));
        assert_eq!(clock.phase(), Phase::Seek);

        match clock.advance() {
            Step::Emit(t) => {
                assert_eq!(t.frame_index, 1);
                assert_eq!(t.retained_index, 1);
            }
            other => panic!("expected emit, got {:?}", other),
        }
        assert_eq!(clock.phase(), Phase::Active);
    }

    #[test]
    fn test_ten_second_window_every_frame() {
        let ctx = context(30.0, 301, 0.0, Some(10.0), 1);
        let (ticks, clock) = run(&ctx, 301);

        assert_eq!(ticks.len(), 300);
        assert_eq!(ticks.first().unwrap().frame_index, 1);
        assert_eq!(ticks.last().unwrap().frame_index, 300);
        assert_eq!(ticks.last().unwrap().nominal_time, 10.0);
        assert_eq!(clock.retained(), 300);
    }

    #[test]
    fn test_stride_law() {
        for stride in [1u32, 2, 3, 7, 10, 64] {
            let ctx = context(30.0, 301, 0.0, Some(10.0), stride);
            let (ticks, clock) = run(&ctx, 301);
            assert_eq!(ticks.len() as u64, clock.retained() / stride as u64, "stride {}", stride);
            assert!(ticks.iter().all(|t| t.retained_index % stride as u64 == 0));
        }
    }

    #[test]
    fn test_window_closes_past_end() {
        let ctx = context(25.0, 1000, 2.0, Some(4.0), 1);
        let mut clock = SamplingClock::new(&ctx);
        let mut last = None;
        loop {
            match clock.advance() {
                Step::Emit(t) => last = Some(t),
                Step::Seek(t) => assert!(t.nominal_time <= 2.0),
                Step::Skip(_) => unreachable!(),
                Step::Done => break,
            }
        }
        let last = last.unwrap();
        assert_eq!(last.frame_index, 100);
        assert_eq!(last.nominal_time, 4.0);
        assert_eq!(clock.phase(), Phase::Done);
        assert_eq!(clock.retained(), 50);
        // Later frames are ignored once done
        assert_eq!(clock.advance(), Step::Done);
        assert_eq!(clock.frames_seen(), 101);
    }

    #[test]
    fn test_end_of_stream_before_end_time() {
        let ctx = context(30.0, 60, 0.0, Some(100.0), 1);
        let (ticks, clock) = run(&ctx, 60);
        assert_eq!(ticks.len(), 59);
        assert_eq!(clock.phase(), Phase::Done);
    }

    #[test]
    fn test_nominal_time_steps_by_frame_period() {
        let ctx = context(29.97, 1000, 1.0, None, 1);
        let (ticks, _) = run(&ctx, 1000);
        let spf = ctx.seconds_per_frame();
        for pair in ticks.windows(2) {
            assert_eq!(pair[1].frame_index, pair[0].frame_index + 1);
            assert!((pair[1].nominal_time - pair[0].nominal_time - spf).abs() < 1e-9);
        }
    }

    #[test]
    fn test_negative_start_counts_from_first_frame() {
        let ctx = context(10.0, 20, -1.0, None, 1);
        let (ticks, _) = run(&ctx, 20);
        assert_eq!(ticks.len(), 20);
        assert_eq!(ticks[0].frame_index, 0);
        assert_eq!(ticks[0].retained_index, 1);
    }
}
