//! Command-line arguments and default path derivation

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracky_core::RunParams;

/// Track when specific elements are in frame at a specific position.
#[derive(Parser, Debug)]
#[command(name = "tracky", version, long_about = None)]
pub struct Args {
    /// Video file to process
    #[arg(value_name = "FILE")]
    pub video: PathBuf,

    /// JSON element file (default: <video stem>.json next to the video)
    #[arg(long, value_name = "FILE")]
    pub data_file: Option<PathBuf>,

    /// CSV output file (default: <video stem>.csv next to the video)
    #[arg(long, value_name = "FILE")]
    pub out_file: Option<PathBuf>,

    /// Start processing at T seconds
    #[arg(long, value_name = "T", default_value_t = 0.0)]
    pub time_start: f64,

    /// End processing at T seconds (default: duration of the video)
    #[arg(long, value_name = "T")]
    pub time_end: Option<f64>,

    /// Add T seconds to the time column (useful to sync with another event log)
    #[arg(long, value_name = "T", default_value_t = 0.0, allow_hyphen_values = true)]
    pub time_offset: f64,

    /// Parent directory for the debug image directory (default: next to the video)
    #[arg(long, value_name = "DIR")]
    pub debug_dir: Option<PathBuf>,

    /// Save an image per element showing the frame and roi it was captured from, then stop
    #[arg(long)]
    pub debug_elements: bool,

    /// Save an image per processed frame showing every element and its similarity score
    #[arg(long)]
    pub debug_processing: bool,

    /// Process every N frames
    #[arg(
        long,
        value_name = "N",
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub freq: u32,
}

impl Args {
    pub fn run_params(&self) -> RunParams {
        RunParams {
            time_start: self.time_start,
            time_end: self.time_end,
            time_offset: self.time_offset,
            frame_skip_stride: self.freq,
        }
    }

    pub fn wants_debug(&self) -> bool {
        self.debug_elements || self.debug_processing
    }
}

/// Paths derived from the video file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultPaths {
    pub data_file: PathBuf,
    pub out_file: PathBuf,
    pub debug_dir: PathBuf,
}

/// `<dir>/<stem>.json`, `<dir>/<stem>.csv` and `<debug parent or dir>/<stem>-debug`.
pub fn default_paths(video: &Path, debug_parent: Option<&Path>) -> DefaultPaths {
    let dir = video.parent().unwrap_or_else(|| Path::new(""));
    let stem = video
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    DefaultPaths {
        data_file: dir.join(format!("{}.json", stem)),
        out_file: dir.join(format!("{}.csv", stem)),
        debug_dir: debug_parent.unwrap_or(dir).join(format!("{}-debug", stem)),
    }
}

/// Remove `dir` if it exists and create it empty.
pub fn prepare_debug_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        std::fs::remove_dir_all(dir)
            .with_context(|| format!("Failed to clear debug directory: {}", dir.display()))?;
    }
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create debug directory: {}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let paths = default_paths(Path::new("videos/android1.mp4"), None);
        assert_eq!(paths.data_file, PathBuf::from("videos/android1.json"));
        assert_eq!(paths.out_file, PathBuf::from("videos/android1.csv"));
        assert_eq!(paths.debug_dir, PathBuf::from("videos/android1-debug"));

        let paths = default_paths(Path::new("clip.mov"), Some(Path::new("/tmp/dbg")));
        assert_eq!(paths.data_file, PathBuf::from("clip.json"));
        assert_eq!(paths.debug_dir, PathBuf::from("/tmp/dbg/clip-debug"));
    }

    #[test]
    fn test_parse_args() {
        let args = Args::try_parse_from([
            "tracky",
            "in.mp4",
            "--time-start",
            "2.5",
            "--time-offset",
            "-3",
            "--freq",
            "10",
        ])
        .unwrap();
        let params = args.run_params();
        assert_eq!(params.time_start, 2.5);
        assert_eq!(params.time_offset, -3.0);
        assert_eq!(params.frame_skip_stride, 10);
        assert_eq!(params.time_end, None);
        assert!(!args.wants_debug());

        assert!(Args::try_parse_from(["tracky", "in.mp4", "--freq", "0"]).is_err());
    }

    #[test]
    fn test_prepare_debug_dir_clears_old_content() -> Result<()> {
        let parent = tempfile::tempdir()?;
        let dir = parent.path().join("clip-debug");
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join("stale.png"), b"x")?;

        prepare_debug_dir(&dir)?;
        assert!(dir.exists());
        assert_eq!(std::fs::read_dir(&dir)?.count(), 0);
        Ok(())
    }
}
