//! Similarity scoring between a template and a candidate crop

pub mod ssim;

pub use ssim::structural_similarity;

use crate::region::{PixelView, RegionShape};
use crate::traits::RegionScorer;
use crate::Result;
use opencv::core::Mat;
use serde::{Deserialize, Serialize};
use tracky_core::TrackError;

/// SSIM parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SsimConfig {
    /// Side of the uniform window (odd)
    pub win_size: usize,
    pub k1: f64,
    pub k2: f64,
    /// Dynamic range of the samples
    pub data_range: f64,
}

impl Default for SsimConfig {
    fn default() -> Self {
        Self {
            win_size: 7,
            k1: 0.01,
            k2: 0.03,
            data_range: 255.0,
        }
    }
}

/// Structural-similarity scorer. Output lies in [-1, 1]; identical regions score 1.
#[derive(Debug, Clone, Default)]
pub struct SsimScorer {
    config: SsimConfig,
}

impl SsimScorer {
    pub fn new(config: SsimConfig) -> Self {
        Self { config }
    }

    /// Score two borrowed pixel views, failing on any shape difference.
    pub fn score_views(
        &self,
        element: &str,
        template: &PixelView<'_>,
        candidate: &PixelView<'_>,
    ) -> Result<f64> {
        check_shapes(element, template.shape, candidate.shape)?;
        Ok(structural_similarity(template, candidate, &self.config))
    }
}

impl RegionScorer for SsimScorer {
    fn score(&self, element: &str, template: &Mat, candidate: &Mat) -> Result<f64> {
        check_shapes(element, RegionShape::of(template), RegionShape::of(candidate))?;
        let template = PixelView::from_mat(template)?;
        let candidate = PixelView::from_mat(candidate)?;
        self.score_views(element, &template, &candidate)
    }
}

fn check_shapes(
    element: &str,
    expected: RegionShape,
    actual: RegionShape,
) -> std::result::Result<(), TrackError> {
    if expected != actual {
        return Err(TrackError::ShapeMismatch {
            element: element.to_string(),
            expected: expected.as_tuple(),
            actual: actual.as_tuple(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{self, CV_8UC1, CV_8UC3};

    #[test]
    fn test_self_similarity() -> Result<()> {
        let scorer = SsimScorer::default();
        let color = core::Scalar::new(10.0, 80.0, 200.0, 0.0);
        let region = Mat::new_rows_cols_with_default(20, 30, CV_8UC3, color)?;
        assert_eq!(scorer.score("icon", &region, &region)?, 1.0);
        Ok(())
    }

    #[test]
    fn test_shape_mismatch_is_fatal() -> Result<()> {
        let scorer = SsimScorer::default();
        let a = Mat::new_rows_cols_with_default(20, 30, CV_8UC3, core::Scalar::all(0.0))?;
        let b = Mat::new_rows_cols_with_default(20, 31, CV_8UC3, core::Scalar::all(0.0))?;
        let gray = Mat::new_rows_cols_with_default(20, 30, CV_8UC1, core::Scalar::all(0.0))?;

        for candidate in [&b, &gray] {
            let err = scorer.score("icon", &a, candidate).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<TrackError>(),
                Some(TrackError::ShapeMismatch {
                    element,
                    expected: (30, 20, 3),
                    ..
                }) if element == "icon"
            ));
        }
        Ok(())
    }

    #[test]
    fn test_flat_regions_of_different_brightness() -> Result<()> {
        let scorer = SsimScorer::default();
        let dark = Mat::new_rows_cols_with_default(16, 16, CV_8UC3, core::Scalar::all(0.0))?;
        let light = Mat::new_rows_cols_with_default(16, 16, CV_8UC3, core::Scalar::all(255.0))?;
        let score = scorer.score("icon", &dark, &light)?;
        assert!(score < 0.01, "{}", score);
        Ok(())
    }
}
