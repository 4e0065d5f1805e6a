//! Tracker configuration

use crate::similarity::SsimConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main tracker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub ssim: SsimConfig,
    pub debug: DebugConfig,
    /// Log progress every N decoded frames
    pub progress_interval: u64,
}

/// Debug snapshot configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebugConfig {
    pub dir: Option<PathBuf>,
    /// One image per element showing where its template was taken
    pub element_snapshots: bool,
    /// One annotated image per emitted frame
    pub frame_snapshots: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            ssim: SsimConfig::default(),
            debug: DebugConfig::default(),
            progress_interval: 100,
        }
    }
}

impl TrackerConfig {
    pub fn with_debug_dir(mut self, dir: impl Into<PathBuf>, elements: bool, frames: bool) -> Self {
        self.debug = DebugConfig {
            dir: Some(dir.into()),
            element_snapshots: elements,
            frame_snapshots: frames,
        };
        self
    }
}
