//! Frame-by-frame element tracking

pub mod config;
pub mod tracker;

pub use config::{DebugConfig, TrackerConfig};
pub use tracker::{ElementTracker, Progress, RunSummary, StopReason};
