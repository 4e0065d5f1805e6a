//! Output table: one record per emitted frame

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;

use crate::timing::{RunContext, Tick};

/// Position as reported by the decoder. Diagnostic only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContainerPosition {
    pub frame: i64,
    pub time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementReading {
    pub name: String,
    pub score: f64,
    pub present: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRecord {
    pub display_time: f64,
    pub retained_index: u64,
    pub frame_index: u64,
    pub nominal_time: f64,
    pub container: ContainerPosition,
    /// In configuration order
    pub readings: Vec<ElementReading>,
}

impl OutputRecord {
    pub fn new(ctx: &RunContext, tick: Tick, container: ContainerPosition) -> Self {
        Self {
            display_time: ctx.display_time(tick.nominal_time),
            retained_index: tick.retained_index,
            frame_index: tick.frame_index,
            nominal_time: tick.nominal_time,
            container,
            readings: Vec::new(),
        }
    }

    pub fn push_reading(&mut self, name: &str, score: f64, present: bool) {
        self.readings.push(ElementReading {
            name: name.to_string(),
            score,
            present,
        });
    }

    pub fn reading(&self, name: &str) -> Option<&ElementReading> {
        self.readings.iter().find(|r| r.name == name)
    }
}

/// Append-only destination for records, written in frame order.
pub trait RecordSink {
    fn begin(&mut self, element_names: &[&str]) -> Result<()>;
    fn write_record(&mut self, record: &OutputRecord) -> Result<()>;
    fn finish(&mut self) -> Result<()>;
}

/// Collects records in memory.
impl RecordSink for Vec<OutputRecord> {
    fn begin(&mut self, _element_names: &[&str]) -> Result<()> {
        Ok(())
    }

    fn write_record(&mut self, record: &OutputRecord) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

const FIXED_COLUMNS: [&str; 6] = [
    "time",
    "frame",
    "frame_video",
    "time_video",
    "frame_chk",
    "time_chk",
];

pub fn csv_header(element_names: &[&str]) -> String {
    let mut columns: Vec<String> = FIXED_COLUMNS.iter().map(|c| c.to_string()).collect();
    for name in element_names {
        columns.push(format!("{}_ssi", name));
        columns.push(name.to_string());
    }
    columns.join(",")
}

pub fn csv_row(record: &OutputRecord) -> String {
    let mut row = format!(
        "{:.3},{},{},{:.3},{},{:.3}",
        record.display_time,
        record.retained_index,
        record.frame_index,
        record.nominal_time,
        record.container.frame,
        record.container.time,
    );
    for reading in &record.readings {
        row.push_str(&format!(
            ",{:.2},{}",
            reading.score,
            if reading.present { 1 } else { 0 }
        ));
    }
    row
}

/// CSV writer over any byte sink.
pub struct CsvRecordWriter<W: Write> {
    out: W,
    columns: usize,
    rows: u64,
}

impl<W: Write> CsvRecordWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            columns: 0,
            rows: 0,
        }
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl CsvRecordWriter<std::io::BufWriter<std::fs::File>> {
    pub fn create<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Self::new(std::io::BufWriter::new(file)))
    }
}

impl<W: Write> RecordSink for CsvRecordWriter<W> {
    fn begin(&mut self, element_names: &[&str]) -> Result<()> {
        self.columns = element_names.len();
        writeln!(self.out, "{}", csv_header(element_names)).context("Failed to write CSV header")
    }

    fn write_record(&mut self, record: &OutputRecord) -> Result<()> {
        debug_assert_eq!(record.readings.len(), self.columns);
        writeln!(self.out, "{}", csv_row(record))
            .with_context(|| format!("Failed to write CSV row for frame {}", record.frame_index))?;
        self.rows += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush().context("Failed to flush CSV output")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::RunParams;

    fn sample_record() -> OutputRecord {
        let params = RunParams {
            time_offset: 100.0,
            ..Default::default()
        };
        let ctx = RunContext::new(30.0, 300, &params).unwrap();
        let tick = Tick {
            frame_index: 45,
            nominal_time: 1.5,
            retained_index: 44,
        };
        let mut record = OutputRecord::new(
            &ctx,
            tick,
            ContainerPosition {
                frame: 45,
                time: 1.4998,
            },
        );
        record.push_reading("wifi", 0.91234, true);
        record.push_reading("battery", -0.05, false);
        record
    }

    #[test]
    fn test_header() {
        assert_eq!(
            csv_header(&["wifi", "battery"]),
            "time,frame,frame_video,time_video,frame_chk,time_chk,wifi_ssi,wifi,battery_ssi,battery"
        );
    }

    #[test]
    fn test_row_formatting() {
        let record = sample_record();
        assert_eq!(record.display_time, 101.5);
        assert_eq!(
            csv_row(&record),
            "101.500,44,45,1.500,45,1.500,0.91,1,-0.05,0"
        );
    }

    #[test]
    fn test_writer_streams_rows() -> Result<()> {
        let mut writer = CsvRecordWriter::new(Vec::new());
        writer.begin(&["wifi", "battery"])?;
        writer.write_record(&sample_record())?;
        writer.finish()?;
        assert_eq!(writer.rows(), 1);

        let text = String::from_utf8(writer.into_inner())?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("battery_ssi,battery"));
        assert!(lines[1].starts_with("101.500,44,45"));
        Ok(())
    }

    #[test]
    fn test_reading_lookup() {
        let record = sample_record();
        assert!(record.reading("wifi").unwrap().present);
        assert!(record.reading("missing").is_none());
    }
}
