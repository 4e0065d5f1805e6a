//! Template capture from a frame source

use super::Template;
use crate::region::crop_region;
use crate::traits::FrameSource;
use crate::utils::DebugWriter;
use crate::Result;
use anyhow::Context;
use tracing::{info, warn};
use tracky_core::{ElementSpec, TrackError};

/// Captures one template per element, in configuration order
pub struct TemplateCapture {
    debug: Option<DebugWriter>,
}

impl TemplateCapture {
    pub fn new() -> Self {
        Self { debug: None }
    }

    /// Also write an `element <name>.png` snapshot per element
    pub fn with_debug(mut self, writer: DebugWriter) -> Self {
        self.debug = Some(writer);
        self
    }

    pub fn capture_all<S: FrameSource>(
        &self,
        source: &mut S,
        elements: &[ElementSpec],
    ) -> Result<Vec<Template>> {
        elements
            .iter()
            .map(|element| self.capture(source, element))
            .collect()
    }

    /// Seek near the element's reference time, decode one frame and crop its roi.
    ///
    /// The landing position reported after the seek is recorded on the
    /// template; it is never assumed to equal the request.
    pub fn capture<S: FrameSource>(
        &self,
        source: &mut S,
        element: &ElementSpec,
    ) -> Result<Template> {
        source
            .seek_near(element.reference_time)
            .with_context(|| format!("Failed to seek for element '{}'", element.name))?;

        let frame = source
            .next_frame()
            .with_context(|| format!("Failed to decode frame for element '{}'", element.name))?
            .ok_or(TrackError::SeekPastEnd(element.reference_time))?;

        let image = crop_region(&frame.image, &element.roi, &element.name)?;

        let drift = frame.position.time - element.reference_time;
        info!(
            element = %element.name,
            requested = format_args!("{:.3}", element.reference_time),
            landed = format_args!("{:.3}", frame.position.time),
            frame = frame.position.frame,
            "captured template"
        );
        if drift.abs() > source.info().seconds_per_frame() * 2.0 {
            warn!(
                element = %element.name,
                drift = format_args!("{:.3}", drift),
                "seek landed away from the requested time"
            );
        }

        if let Some(debug) = &self.debug {
            debug.element_snapshot(&element.name, &frame.image, &element.roi)?;
        }

        Ok(Template::new(element, image, frame.position))
    }
}

impl Default for TemplateCapture {
    fn default() -> Self {
        Self::new()
    }
}
