//! Element templates

pub mod capture;

pub use capture::TemplateCapture;

use crate::region::RegionShape;
use opencv::core::Mat;
use tracky_core::{ContainerPosition, ElementSpec, Roi};

/// The pixels of one element's roi at its reference time.
///
/// Captured once and never modified; every later crop of the roi is
/// compared against `image`.
#[derive(Debug)]
pub struct Template {
    pub name: String,
    pub roi: Roi,
    pub threshold: f64,
    pub image: Mat,
    /// Where the decoder actually landed
    pub captured_at: ContainerPosition,
}

impl Template {
    pub fn new(spec: &ElementSpec, image: Mat, captured_at: ContainerPosition) -> Self {
        Self {
            name: spec.name.clone(),
            roi: spec.roi,
            threshold: spec.threshold,
            image,
            captured_at,
        }
    }

    pub fn shape(&self) -> RegionShape {
        RegionShape::of(&self.image)
    }

    pub fn is_present(&self, score: f64) -> bool {
        tracky_core::elements::is_present(score, self.threshold)
    }
}
