use serde_json::{Map, Value};
use uuid::Uuid;

use crate::errors::LoadError;

/// Upgrade a raw document from `from_version` to `to_version`, one version
/// at a time.
pub fn migrate(mut doc: Value, from_version: u32, to_version: u32) -> Result<Value, LoadError> {
    let mut version = from_version;
    while version < to_version {
        doc = match version {
            1 => migrate_v1_to_v2(doc).map_err(|reason| LoadError::MigrationFailed {
                from: version,
                to: version + 1,
                reason,
            })?,
            _ => {
                return Err(LoadError::MigrationFailed {
                    from: version,
                    to: to_version,
                    reason: format!("no migration path from v{version}"),
                })
            }
        };
        version += 1;
    }
    if let Some(obj) = doc.as_object_mut() {
        obj.insert("version".into(), Value::from(to_version));
    }
    Ok(doc)
}

/// Version 1 kept metadata under `project` and placed every feature in the
/// root component implicitly.
fn migrate_v1_to_v2(mut doc: Value) -> Result<Value, String> {
    let obj = doc
        .as_object_mut()
        .ok_or_else(|| "document is not an object".to_string())?;
    if let Some(project) = obj.remove("project") {
        obj.insert("metadata".into(), project);
    }
    let features = obj
        .get_mut("features")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| "missing feature list".to_string())?;
    for feature in features {
        let entry: &mut Map<String, Value> = feature
            .as_object_mut()
            .ok_or_else(|| "feature entry is not an object".to_string())?;
        entry
            .entry("component_id")
            .or_insert_with(|| Value::String(Uuid::nil().to_string()));
    }
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn v1_gains_component_ids_and_metadata() {
        let doc = json!({
            "format": "parametric-cad",
            "version": 1,
            "project": {"name": "old"},
            "features": [{"id": Uuid::nil(), "title": "Sketch", "values": {}}],
        });
        let migrated = migrate(doc, 1, 2).unwrap();
        assert_eq!(migrated["version"], 2);
        assert_eq!(migrated["metadata"]["name"], "old");
        assert!(migrated.get("project").is_none());
        assert_eq!(
            migrated["features"][0]["component_id"],
            Uuid::nil().to_string()
        );
    }

    #[test]
    fn unknown_version_has_no_path() {
        let err = migrate(json!({}), 0, 2).unwrap_err();
        assert!(matches!(
            err,
            LoadError::MigrationFailed { from: 0, to: 2, .. }
        ));
    }
}
