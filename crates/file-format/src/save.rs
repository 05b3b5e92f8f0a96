use feature_engine::{Feature, Timeline};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::SaveError;
use crate::metadata::DocumentMetadata;

/// Format identifier written into every document.
pub const FORMAT_ID: &str = "parametric-cad";

/// Current document version.
pub const FORMAT_VERSION: u32 = 2;

/// The persisted document: the feature history is the whole model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub format: String,
    pub version: u32,
    pub metadata: DocumentMetadata,
    /// Every feature in timeline order, including those past the marker.
    pub features: Vec<Feature>,
}

impl Document {
    pub fn from_timeline(timeline: &Timeline, metadata: DocumentMetadata) -> Self {
        Self {
            format: FORMAT_ID.to_string(),
            version: FORMAT_VERSION,
            metadata,
            features: timeline.features().to_vec(),
        }
    }

    pub fn to_json(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Serialize a timeline's features to pretty-printed JSON and stamp the
/// modification time.
pub fn save_document(
    timeline: &Timeline,
    metadata: &mut DocumentMetadata,
) -> Result<String, SaveError> {
    metadata.touch();
    let json = Document::from_timeline(timeline, metadata.clone()).to_json()?;
    info!(name = %metadata.name, features = timeline.len(), "saved document");
    Ok(json)
}
