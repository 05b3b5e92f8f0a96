use feature_engine::Timeline;
use modeling_ops::KernelBundle;
use serde_json::Value;
use tracing::{info, instrument};

use crate::errors::LoadError;
use crate::metadata::DocumentMetadata;
use crate::migrate::migrate;
use crate::save::{Document, FORMAT_ID, FORMAT_VERSION};

/// Parse a document from JSON, checking its format and migrating older
/// versions. Nothing is recomputed.
pub fn parse_document(json: &str) -> Result<Document, LoadError> {
    let raw: Value = serde_json::from_str(json)?;

    let format = raw.get("format").and_then(Value::as_str).unwrap_or_default();
    if format != FORMAT_ID {
        return Err(LoadError::UnknownFormat(format.to_string()));
    }

    let version = raw
        .get("version")
        .and_then(Value::as_u64)
        .map_or(0, |v| u32::try_from(v).unwrap_or(u32::MAX));
    if version > FORMAT_VERSION {
        return Err(LoadError::FutureVersion {
            file_version: version,
            supported_version: FORMAT_VERSION,
        });
    }

    let raw = if version < FORMAT_VERSION {
        migrate(raw, version, FORMAT_VERSION)?
    } else {
        raw
    };
    Ok(serde_json::from_value(raw)?)
}

/// Load a document by replaying its features, in order, into a fresh
/// timeline. The marker ends after the last feature.
#[instrument(skip(json, kb), fields(bytes = json.len()))]
pub fn load_document(
    json: &str,
    kb: &mut dyn KernelBundle,
) -> Result<(Timeline, DocumentMetadata), LoadError> {
    let document = parse_document(json)?;
    let mut timeline = Timeline::new();
    for feature in document.features {
        timeline.insert_feature(feature, kb);
    }
    let errored = timeline.features().iter().filter(|f| f.is_errored()).count();
    info!(
        name = %document.metadata.name,
        features = timeline.len(),
        errored,
        "loaded document"
    );
    Ok((timeline, document.metadata))
}
