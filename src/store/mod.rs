pub mod document;
pub mod pool;
pub mod sql;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

pub use document::DocumentRepository;
pub use sql::SqlRepository;

/// Errors surfaced by the record stores
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("missing required fields: {}", missing.join(", "))]
    Validation { missing: Vec<String> },

    #[error("unique constraint violated: {detail}")]
    Constraint { detail: String },

    #[error("{0}")]
    NotFound(String),

    #[error("unknown field: {0}")]
    InvalidField(String),

    #[error("missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("invalid database URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),

    #[error("invalid document payload: {0}")]
    Bson(#[from] mongodb::bson::ser::Error),
}

/// Persistence capability shared by the relational and document stores.
///
/// Only the operations both flavors support live here; pagination and the
/// field-scoped operations are inherent to [`SqlRepository`], and the
/// document flavor deliberately does not grow stubs for them.
#[async_trait]
pub trait RecordStore {
    async fn create(&self, data: Map<String, Value>) -> Result<Value, StoreError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Value>, StoreError>;
    async fn find_all(&self) -> Result<Vec<Value>, StoreError>;
    async fn update(&self, id: &str, data: Map<String, Value>) -> Result<Value, StoreError>;
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}
