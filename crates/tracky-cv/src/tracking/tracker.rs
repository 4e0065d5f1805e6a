//! Element tracker: drives the sampling clock over a frame source and
//! scores every emitted frame against the element templates

use super::config::TrackerConfig;
use crate::region::crop_region;
use crate::similarity::SsimScorer;
use crate::template::Template;
use crate::traits::FrameSource;
use crate::utils::DebugWriter;
use crate::Result;
use anyhow::Context;
use opencv::core::Mat;
use serde::Serialize;
use tracing::info;
use tracky_core::{
    timing::Phase, ContainerPosition, OutputRecord, RecordSink, Roi, RunContext, SamplingClock,
    Step, Tick,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    /// The source ran out of frames
    EndOfStream,
    /// A frame's nominal time passed `time_end`
    WindowClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Frames grabbed from the source, including one that closed the window
    pub decoded: u64,
    pub retained: u64,
    pub emitted: u64,
    pub stop_reason: StopReason,
}

/// Snapshot handed to progress observers after every decoded frame
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    pub phase: Phase,
    pub frame_index: u64,
    pub retained: u64,
    pub emitted: u64,
}

pub struct ElementTracker<'a> {
    ctx: &'a RunContext,
    templates: &'a [Template],
    scorer: SsimScorer,
    debug: Option<DebugWriter>,
    rois: Vec<Roi>,
    progress_interval: u64,
}

impl<'a> ElementTracker<'a> {
    pub fn new(ctx: &'a RunContext, templates: &'a [Template], config: &TrackerConfig) -> Self {
        let debug = match &config.debug.dir {
            Some(dir) if config.debug.frame_snapshots => Some(DebugWriter::new(dir)),
            _ => None,
        };

        Self {
            ctx,
            templates,
            scorer: SsimScorer::new(config.ssim.clone()),
            debug,
            rois: templates.iter().map(|t| t.roi).collect(),
            progress_interval: config.progress_interval.max(1),
        }
    }

    pub fn element_names(&self) -> Vec<&str> {
        self.templates.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn run<S, K>(&self, source: &mut S, sink: &mut K) -> Result<RunSummary>
    where
        S: FrameSource,
        K: RecordSink,
    {
        self.run_with_progress(source, sink, |_| {})
    }

    /// Process the stream from its current position, which must be the
    /// start: the nominal clock counts frames from here.
    pub fn run_with_progress<S, K, F>(
        &self,
        source: &mut S,
        sink: &mut K,
        mut progress: F,
    ) -> Result<RunSummary>
    where
        S: FrameSource,
        K: RecordSink,
        F: FnMut(&Progress),
    {
        let mut clock = SamplingClock::new(self.ctx);
        let mut decoded = 0u64;

        info!(
            frames = self.ctx.expected_retained(),
            start = self.ctx.time_start(),
            end = self.ctx.time_end(),
            stride = self.ctx.frame_skip_stride(),
            "processing"
        );

        sink.begin(&self.element_names())?;

        let stop_reason = loop {
            let Some(container) = source.grab()? else {
                clock.end_of_stream();
                break StopReason::EndOfStream;
            };
            decoded += 1;

            let step = clock.advance();
            match step {
                Step::Done => break StopReason::WindowClosed,
                Step::Seek(tick) => {
                    if tick.frame_index % self.progress_interval == 0 {
                        info!(
                            frame = tick.frame_index,
                            time = format_args!("{:.3}", tick.nominal_time),
                            "seeking"
                        );
                    }
                }
                Step::Skip(tick) | Step::Emit(tick) => {
                    if tick.retained_index % self.progress_interval == 0 {
                        self.log_progress(&tick, &container);
                    }
                    if let Step::Emit(tick) = step {
                        let frame = source.retrieve().with_context(|| {
                            format!("Failed to decode frame {}", tick.frame_index)
                        })?;
                        let record = self.score_frame(&frame, tick, container)?;
                        sink.write_record(&record)?;

                        if let Some(debug) = &self.debug {
                            debug.frame_snapshot(&frame, &record, &self.rois)?;
                        }
                    }
                }
            }

            progress(&Progress {
                phase: clock.phase(),
                frame_index: clock.frames_seen(),
                retained: clock.retained(),
                emitted: clock.emitted(),
            });
        };

        sink.finish()?;

        let summary = RunSummary {
            decoded,
            retained: clock.retained(),
            emitted: clock.emitted(),
            stop_reason,
        };
        info!(
            decoded = summary.decoded,
            retained = summary.retained,
            emitted = summary.emitted,
            stop = ?summary.stop_reason,
            "done"
        );
        Ok(summary)
    }

    /// Build the record for one emitted frame: every element's roi is
    /// cropped and scored against its template, in configuration order.
    pub fn score_frame(
        &self,
        frame: &Mat,
        tick: Tick,
        container: ContainerPosition,
    ) -> Result<OutputRecord> {
        let crops = self
            .templates
            .iter()
            .map(|t| crop_region(frame, &t.roi, &t.name))
            .collect::<Result<Vec<_>>>()?;

        let scores = self.score_crops(&crops)?;

        let mut record = OutputRecord::new(self.ctx, tick, container);
        for (template, score) in self.templates.iter().zip(scores) {
            record.push_reading(&template.name, score, template.is_present(score));
        }
        Ok(record)
    }

    #[cfg(not(feature = "parallel"))]
    fn score_crops(&self, crops: &[Mat]) -> Result<Vec<f64>> {
        use crate::traits::RegionScorer;

        self.templates
            .iter()
            .zip(crops)
            .map(|(template, crop)| self.scorer.score(&template.name, &template.image, crop))
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn score_crops(&self, crops: &[Mat]) -> Result<Vec<f64>> {
        use crate::region::PixelView;
        use rayon::prelude::*;

        // Pixel views borrow plain byte slices, so only they cross threads
        let views = self
            .templates
            .iter()
            .zip(crops)
            .map(|(template, crop)| {
                Ok((
                    template.name.as_str(),
                    PixelView::from_mat(&template.image)?,
                    PixelView::from_mat(crop)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        views
            .par_iter()
            .map(|(name, template, candidate)| {
                self.scorer.score_views(name, template, candidate)
            })
            .collect()
    }

    fn log_progress(&self, tick: &Tick, container: &ContainerPosition) {
        info!(
            retained = tick.retained_index,
            of = self.ctx.expected_retained(),
            frame = tick.frame_index,
            container_frame = container.frame,
            time = format_args!("{:.3}", tick.nominal_time),
            container_time = format_args!("{:.3}", container.time),
            "progress"
        );
    }
}
