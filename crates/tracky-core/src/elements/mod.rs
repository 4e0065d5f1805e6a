//! Tracked elements: a named, fixed region compared against its template

mod data;

pub use data::ElementsFile;

use crate::error::TrackError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rectangle in pixel coordinates, stored in configuration as `[x, y, width, height]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[i32; 4]", into = "[i32; 4]")]
pub struct Roi {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Roi {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Result<Self, TrackError> {
        Self::try_from([x, y, width, height])
    }

    /// Exclusive right edge
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// True when the rectangle lies entirely inside a `frame_width` x `frame_height` frame.
    pub fn fits_within(&self, frame_width: i32, frame_height: i32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.right() <= frame_width
            && self.bottom() <= frame_height
    }
}

impl TryFrom<[i32; 4]> for Roi {
    type Error = TrackError;

    fn try_from(value: [i32; 4]) -> Result<Self, Self::Error> {
        let [x, y, width, height] = value;
        if x < 0 || y < 0 || width <= 0 || height <= 0 {
            return Err(TrackError::InvalidRoi(value));
        }
        if x.checked_add(width).is_none() || y.checked_add(height).is_none() {
            return Err(TrackError::InvalidRoi(value));
        }
        Ok(Self { x, y, width, height })
    }
}

impl From<Roi> for [i32; 4] {
    fn from(roi: Roi) -> Self {
        [roi.x, roi.y, roi.width, roi.height]
    }
}

impl fmt::Display for Roi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.x, self.y, self.width, self.height)
    }
}

/// One configured element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSpec {
    /// Lookup key and output column label
    pub name: String,
    /// Seconds from stream start at which the template is captured
    #[serde(rename = "time")]
    pub reference_time: f64,
    pub roi: Roi,
    pub threshold: f64,
}

impl ElementSpec {
    pub fn new(name: impl Into<String>, reference_time: f64, roi: Roi, threshold: f64) -> Self {
        Self {
            name: name.into(),
            reference_time,
            roi,
            threshold,
        }
    }
}

/// Presence decision. Strict: a score equal to the threshold is absent.
pub fn is_present(score: f64, threshold: f64) -> bool {
    score > threshold
}
