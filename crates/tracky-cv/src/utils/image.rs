//! Image conversion and saving using opencv-match conversions

use crate::Result;
use anyhow::Context;
use opencv::{core::Mat, imgcodecs};
use opencv_match::prelude::*;
use std::path::Path;

/// Image utility functions leveraging opencv-match conversions
pub struct ImageUtils;

impl ImageUtils {
    /// Save Mat as image, format chosen by extension
    pub fn save_image<P: AsRef<Path>>(mat: &Mat, path: P) -> Result<()> {
        let path_str = path.as_ref().to_string_lossy();

        let written = imgcodecs::imwrite(&path_str, mat, &opencv::core::Vector::new())
            .with_context(|| format!("Failed to save image: {}", path_str))?;
        if !written {
            anyhow::bail!("Encoder refused to write image: {}", path_str);
        }
        Ok(())
    }

    /// Convert image::RgbImage to OpenCV Mat using opencv-match
    pub fn rgb_to_mat(rgb_image: &image::RgbImage) -> Result<Mat> {
        rgb_image.try_into_cv()
            .context("Failed to convert RGB image to OpenCV Mat")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::prelude::*;

    #[test]
    fn test_rgb_image_becomes_three_channel_mat() -> Result<()> {
        let mut rgb_img = image::RgbImage::new(64, 48);
        rgb_img.put_pixel(3, 5, image::Rgb([200, 100, 50]));

        let mat = ImageUtils::rgb_to_mat(&rgb_img)?;
        assert_eq!((mat.cols(), mat.rows(), mat.channels()), (64, 48, 3));
        assert!(mat.is_continuous());
        Ok(())
    }

    #[test]
    fn test_save_image() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mat = ImageUtils::rgb_to_mat(&image::RgbImage::new(16, 16))?;
        let path = dir.path().join("frame.png");

        ImageUtils::save_image(&mat, &path)?;
        assert!(path.exists());
        Ok(())
    }
}
