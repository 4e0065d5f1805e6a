//! Tracky core
//!
//! Video-library-free domain model: element configuration, the run context,
//! the sampling clock and the output table.

pub mod elements;
pub mod error;
pub mod record;
pub mod timing;

pub use elements::{ElementSpec, ElementsFile, Roi};
pub use error::TrackError;
pub use record::{ContainerPosition, CsvRecordWriter, ElementReading, OutputRecord, RecordSink};
pub use timing::{RunContext, RunParams, SamplingClock, Step, Tick};

pub type Result<T> = anyhow::Result<T>;
