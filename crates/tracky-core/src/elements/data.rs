use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

use crate::elements::ElementSpec;
use crate::error::TrackError;

/// The element configuration document: `{"elements": [...]}`.
///
/// Element order is significant: it fixes template capture order and the
/// column order of the output table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementsFile {
    pub elements: Vec<ElementSpec>,
}

impl ElementsFile {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open element file: {}", path.display()))?;

        let data: ElementsFile = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse element file: {}", path.display()))?;
        data.validate()
            .with_context(|| format!("Invalid element file: {}", path.display()))?;

        info!(
            path = %path.display(),
            count = data.elements.len(),
            names = ?data.names().collect::<Vec<_>>(),
            "loaded element configuration"
        );
        Ok(data)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let data: ElementsFile =
            serde_json::from_str(json).context("Failed to parse element configuration")?;
        data.validate()?;
        Ok(data)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().map(|e| e.name.as_str())
    }

    fn validate(&self) -> Result<(), TrackError> {
        if self.elements.is_empty() {
            return Err(TrackError::InvalidConfig("no elements configured".into()));
        }

        let mut seen = HashSet::new();
        for element in &self.elements {
            if element.name.trim().is_empty() {
                return Err(TrackError::InvalidConfig("element name is empty".into()));
            }
            if !seen.insert(element.name.as_str()) {
                return Err(TrackError::DuplicateElement(element.name.clone()));
            }
            if !element.reference_time.is_finite() || element.reference_time < 0.0 {
                return Err(TrackError::InvalidConfig(format!(
                    "element '{}' has invalid time {}",
                    element.name, element.reference_time
                )));
            }
            if !element.threshold.is_finite() {
                return Err(TrackError::InvalidConfig(format!(
                    "element '{}' has a non-finite threshold",
                    element.name
                )));
            }
        }
        Ok(())
    }
}
