//! ROI cropping and raw pixel access
//! 
//! Bridges the configuration-level `Roi` to OpenCV and hands the scorer a
//! borrowed, tightly packed view of 8-bit pixels.

use crate::Result;
use anyhow::Context;
use opencv::{
    core::{Mat, Rect, CV_8U},
    prelude::*,
};
use tracky_core::{Roi, TrackError};

/// Convert to OpenCV Rect
pub fn to_rect(roi: &Roi) -> Rect {
    Rect::new(roi.x, roi.y, roi.width, roi.height)
}

/// Copy the `roi` of `frame` into an owned, continuous Mat.
///
/// A rectangle reaching outside the frame is a fatal `RoiOutOfBounds`
/// rather than a silently clipped crop.
pub fn crop_region(frame: &Mat, roi: &Roi, element: &str) -> Result<Mat> {
    let (frame_width, frame_height) = (frame.cols(), frame.rows());
    if !roi.fits_within(frame_width, frame_height) {
        return Err(TrackError::RoiOutOfBounds {
            element: element.to_string(),
            roi: *roi,
            frame_width,
            frame_height,
        }
        .into());
    }

    let view = Mat::roi(frame, to_rect(roi))
        .with_context(|| format!("Failed to take roi {} for '{}'", roi, element))?;
    view.try_clone()
        .with_context(|| format!("Failed to copy roi {} for '{}'", roi, element))
}

/// Shape of a pixel region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionShape {
    pub width: i32,
    pub height: i32,
    pub channels: i32,
}

impl RegionShape {
    pub fn of(mat: &Mat) -> Self {
        Self {
            width: mat.cols(),
            height: mat.rows(),
            channels: mat.channels(),
        }
    }

    pub fn as_tuple(&self) -> (i32, i32, i32) {
        (self.width, self.height, self.channels)
    }

    pub fn pixel_count(&self) -> usize {
        self.width.max(0) as usize * self.height.max(0) as usize
    }

    pub fn sample_count(&self) -> usize {
        self.pixel_count() * self.channels.max(0) as usize
    }
}

/// Interleaved 8-bit samples, row-major, no padding.
#[derive(Debug, Clone, Copy)]
pub struct PixelView<'a> {
    pub shape: RegionShape,
    pub data: &'a [u8],
}

impl<'a> PixelView<'a> {
    pub fn new(shape: RegionShape, data: &'a [u8]) -> Self {
        debug_assert_eq!(shape.sample_count(), data.len());
        Self { shape, data }
    }

    pub fn from_mat(mat: &'a Mat) -> Result<Self> {
        let depth = mat.depth();
        if depth != CV_8U {
            return Err(TrackError::UnsupportedPixelFormat(depth).into());
        }
        if !mat.is_continuous() {
            anyhow::bail!("Pixel region is not continuous in memory");
        }

        let shape = RegionShape::of(mat);
        let data = mat.data_bytes().context("Failed to access region pixels")?;
        Ok(Self { shape, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{self, CV_8UC3, CV_32FC1};

    #[test]
    fn test_crop_shape() -> Result<()> {
        let frame = Mat::new_rows_cols_with_default(100, 120, CV_8UC3, core::Scalar::all(128.0))?;
        let roi = Roi::new(10, 10, 50, 40)?;

        let crop = crop_region(&frame, &roi, "icon")?;
        assert_eq!(RegionShape::of(&crop).as_tuple(), (50, 40, 3));

        let view = PixelView::from_mat(&crop)?;
        assert_eq!(view.data.len(), 50 * 40 * 3);
        assert!(view.data.iter().all(|&v| v == 128));
        Ok(())
    }

    #[test]
    fn test_crop_touching_edges() -> Result<()> {
        let frame = Mat::new_rows_cols_with_default(60, 60, CV_8UC3, core::Scalar::all(0.0))?;
        let roi = Roi::new(10, 10, 50, 50)?;
        assert!(crop_region(&frame, &roi, "edge").is_ok());
        Ok(())
    }

    #[test]
    fn test_crop_out_of_bounds() -> Result<()> {
        let frame = Mat::new_rows_cols_with_default(50, 50, CV_8UC3, core::Scalar::all(0.0))?;
        let roi = Roi::new(10, 10, 50, 50)?;

        let err = crop_region(&frame, &roi, "icon").unwrap_err();
        match err.downcast_ref::<TrackError>() {
            Some(TrackError::RoiOutOfBounds { element, frame_width, .. }) => {
                assert_eq!(element, "icon");
                assert_eq!(*frame_width, 50);
            }
            other => panic!("unexpected error {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_rejects_float_pixels() -> Result<()> {
        let mat = Mat::new_rows_cols_with_default(8, 8, CV_32FC1, core::Scalar::all(0.5))?;
        let err = PixelView::from_mat(&mat).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TrackError>(),
            Some(TrackError::UnsupportedPixelFormat(_))
        ));
        Ok(())
    }
}
