//! Annotated debug snapshots

use super::image::ImageUtils;
use crate::region::to_rect;
use crate::Result;
use anyhow::Context;
use opencv::{
    core::{Mat, Point, Scalar},
    imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8},
    prelude::*,
};
use std::path::{Path, PathBuf};
use tracky_core::{OutputRecord, Roi};

/// Stroke used for an absent element
const THIN: i32 = 1;
/// Stroke used for a present element
const THICK: i32 = 3;

/// Writes snapshot images into one directory
#[derive(Debug, Clone)]
pub struct DebugWriter {
    dir: PathBuf,
    color: Scalar,
}

impl DebugWriter {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            // BGR red
            color: Scalar::new(0.0, 0.0, 255.0, 0.0),
        }
    }

    /// The frame a template was captured from, with its roi outlined.
    pub fn element_snapshot(&self, name: &str, frame: &Mat, roi: &Roi) -> Result<PathBuf> {
        let mut output = frame.try_clone().context("Failed to copy frame for snapshot")?;
        imgproc::rectangle(&mut output, to_rect(roi), self.color, THIN, LINE_8, 0)?;

        let path = self.dir.join(format!("element {}.png", name));
        ImageUtils::save_image(&output, &path)?;
        Ok(path)
    }

    /// An emitted frame with every roi outlined (thick when present) and its score.
    pub fn frame_snapshot(
        &self,
        frame: &Mat,
        record: &OutputRecord,
        rois: &[Roi],
    ) -> Result<PathBuf> {
        let mut output = frame.try_clone().context("Failed to copy frame for snapshot")?;

        for (reading, roi) in record.readings.iter().zip(rois) {
            let thickness = if reading.present { THICK } else { THIN };
            imgproc::rectangle(&mut output, to_rect(roi), self.color, thickness, LINE_8, 0)?;
            imgproc::put_text(
                &mut output,
                &format!("{:.2}", reading.score),
                Point::new(roi.x, roi.y - 5),
                FONT_HERSHEY_SIMPLEX,
                0.6,
                self.color,
                1,
                LINE_8,
                false,
            )?;
        }

        let path = self
            .dir
            .join(format!("{:05} {:.3}.png", record.frame_index, record.nominal_time));
        ImageUtils::save_image(&output, &path)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{self, CV_8UC3};
    use tracky_core::{ContainerPosition, RunContext, RunParams, Tick};

    #[test]
    fn test_snapshot_names() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let writer = DebugWriter::new(dir.path());
        let frame = Mat::new_rows_cols_with_default(80, 80, CV_8UC3, core::Scalar::all(40.0))?;
        let roi = Roi::new(10, 10, 20, 20)?;

        let element = writer.element_snapshot("wifi", &frame, &roi)?;
        assert_eq!(element.file_name().unwrap(), "element wifi.png");
        assert!(element.exists());

        let ctx = RunContext::new(30.0, 300, &RunParams::default())?;
        let tick = Tick {
            frame_index: 42,
            nominal_time: 1.4,
            retained_index: 41,
        };
        let mut record = OutputRecord::new(&ctx, tick, ContainerPosition { frame: 42, time: 1.4 });
        record.push_reading("wifi", 0.97, true);

        let snapshot = writer.frame_snapshot(&frame, &record, &[roi])?;
        assert_eq!(snapshot.file_name().unwrap(), "00042 1.400.png");
        assert!(snapshot.exists());
        Ok(())
    }
}
