use thiserror::Error;

/// Errors emitted while migrating or seeding a store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("migration {version} failed: {source}")]
    Migration {
        version: &'static str,
        #[source]
        source: sqlx::Error,
    },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{kind} '{key}' was not seeded before its children")]
    MissingParent { kind: &'static str, key: String },
    #[error("{field} value {value} does not fit an INTEGER column")]
    OutOfRange { field: &'static str, value: u64 },
}

pub type Result<T> = std::result::Result<T, StoreError>;
