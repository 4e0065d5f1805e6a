use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracky_core::{CsvRecordWriter, ElementsFile, RunContext};
use tracky_cv::{
    traits::FrameSource, utils::DebugWriter, ElementTracker, TemplateCapture, TrackerConfig,
    VideoCaptureSource,
};

mod cli;

use cli::{default_paths, prepare_debug_dir, Args};

fn main() -> Result<()> {
    // Respect RUST_LOG; default to info
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    run(&args)
}

fn run(args: &Args) -> Result<()> {
    let defaults = default_paths(&args.video, args.debug_dir.as_deref());
    let data_file = args.data_file.clone().unwrap_or(defaults.data_file);
    let out_file = args.out_file.clone().unwrap_or(defaults.out_file);

    let elements = ElementsFile::load(&data_file)?;

    let mut config = TrackerConfig::default();
    if args.wants_debug() {
        prepare_debug_dir(&defaults.debug_dir)?;
        info!(dir = %defaults.debug_dir.display(), "debug output");
        config = config.with_debug_dir(
            &defaults.debug_dir,
            args.debug_elements,
            args.debug_processing,
        );
    }

    // Templates come from their own pass over the stream
    let templates = {
        let mut source = VideoCaptureSource::open(&args.video)?;
        let mut capture = TemplateCapture::new();
        if config.debug.element_snapshots {
            capture = capture.with_debug(DebugWriter::new(&defaults.debug_dir));
        }
        capture.capture_all(&mut source, &elements.elements)?
    };

    if args.debug_elements {
        info!("element snapshots written, skipping processing");
        return Ok(());
    }

    let mut source = VideoCaptureSource::open(&args.video)?;
    let info = *source.info();
    let ctx = RunContext::new(info.fps, info.frame_count, &args.run_params())?;

    let tracker = ElementTracker::new(&ctx, &templates, &config);
    let mut sink = CsvRecordWriter::create(&out_file)?;

    let pb = progress_bar(ctx.expected_retained());
    let summary = tracker
        .run_with_progress(&mut source, &mut sink, |p| pb.set_position(p.retained))
        .with_context(|| format!("Processing failed for {}", args.video.display()))?;
    pb.finish_and_clear();

    info!(
        out = %out_file.display(),
        rows = summary.emitted,
        "wrote table"
    );
    Ok(())
}

const PROGRESS_TEMPLATE: &str = "{bar:40.cyan/blue} {pos}/{len} frames [{elapsed_precise}]";

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template(PROGRESS_TEMPLATE) {
        pb.set_style(style);
    }
    pb
}
