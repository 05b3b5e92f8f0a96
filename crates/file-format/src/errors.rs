/// Errors while reading a document.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to parse document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unknown document format: {0}")]
    UnknownFormat(String),

    #[error("document version {file_version} is newer than supported version {supported_version}")]
    FutureVersion {
        file_version: u32,
        supported_version: u32,
    },

    #[error("migration failed from version {from} to {to}: {reason}")]
    MigrationFailed { from: u32, to: u32, reason: String },
}

/// Errors while writing a document.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
}
