use thiserror::Error;

/// Errors that can arise while talking to the engine's collaborators
/// (player store, migrations, flavor text service).
#[derive(Debug, Error)]
pub enum EngineError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around JSON serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Wrapper around IO errors (directory creation, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when a stored record carries a version newer than this build understands.
    #[error("schema mismatch for {entity}: expected at most {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u32,
        found: u32,
    },

    /// A migration step could not transform a stored record.
    #[error("migration to v{version} failed: {reason}")]
    Migration { version: u32, reason: String },

    /// The flavor text service failed or returned something unusable.
    #[error("flavor service error: {0}")]
    Flavor(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
