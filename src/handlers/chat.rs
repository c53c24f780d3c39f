//! Chat message handlers over the document store.
//!
//! The chat boundary supports create/list/get/update/delete; there is no
//! pagination and no field-scoped operation here, matching what the document
//! store adapter offers.

use axum::{
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use mongodb::bson::Document;
use serde_json::Value;

use crate::error::ApiError;
use crate::store::{pool, DocumentRepository, RecordStore};

use super::as_object;

const COLLECTION: &str = "mensajes";

async fn repository() -> Result<DocumentRepository, ApiError> {
    let db = pool::mongo_db().await?;
    Ok(DocumentRepository::new(db.collection::<Document>(COLLECTION)))
}

/// POST /api/chat/mensajes
pub async fn create(Json(payload): Json<Value>) -> Result<impl IntoResponse, ApiError> {
    let repo = repository().await?;
    let record = create_record(&repo, payload).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/chat/mensajes
pub async fn list() -> Result<impl IntoResponse, ApiError> {
    let repo = repository().await?;
    let records = list_records(&repo).await?;
    Ok(Json(Value::Array(records)))
}

/// GET /api/chat/mensajes/:id
pub async fn get(Path(id): Path<String>) -> Result<impl IntoResponse, ApiError> {
    let repo = repository().await?;
    let record = find_record(&repo, &id).await?;
    Ok(Json(record))
}

/// PUT /api/chat/mensajes/:id
pub async fn update(
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = repository().await?;
    let record = update_record(&repo, &id, payload).await?;
    Ok(Json(record))
}

/// DELETE /api/chat/mensajes/:id
pub async fn delete(Path(id): Path<String>) -> Result<impl IntoResponse, ApiError> {
    let repo = repository().await?;
    delete_record(&repo, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Shared semantics over any record store; the handlers above bind them to the
// document collection.

async fn create_record<R: RecordStore>(store: &R, payload: Value) -> Result<Value, ApiError> {
    let data = as_object(payload)?;
    Ok(store.create(data).await?)
}

async fn list_records<R: RecordStore>(store: &R) -> Result<Vec<Value>, ApiError> {
    Ok(store.find_all().await?)
}

async fn find_record<R: RecordStore>(store: &R, id: &str) -> Result<Value, ApiError> {
    store
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("record {} not found", id)))
}

async fn update_record<R: RecordStore>(
    store: &R,
    id: &str,
    payload: Value,
) -> Result<Value, ApiError> {
    let data = as_object(payload)?;
    Ok(store.update(id, data).await?)
}

async fn delete_record<R: RecordStore>(store: &R, id: &str) -> Result<(), ApiError> {
    Ok(store.delete(id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use async_trait::async_trait;
    use serde_json::{json, Map};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Mutex;

    /// In-memory store used to exercise the handler semantics without a
    /// running database.
    #[derive(Default)]
    struct MemoryStore {
        records: Mutex<HashMap<String, Value>>,
        next_id: AtomicI64,
    }

    #[async_trait]
    impl RecordStore for MemoryStore {
        async fn create(&self, data: Map<String, Value>) -> Result<Value, StoreError> {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            let mut record = data;
            record.insert("_id".to_string(), Value::String(id.to_string()));
            let record = Value::Object(record);
            self.records.lock().unwrap().insert(id.to_string(), record.clone());
            Ok(record)
        }

        async fn find_by_id(&self, id: &str) -> Result<Option<Value>, StoreError> {
            Ok(self.records.lock().unwrap().get(id).cloned())
        }

        async fn find_all(&self) -> Result<Vec<Value>, StoreError> {
            Ok(self.records.lock().unwrap().values().cloned().collect())
        }

        async fn update(&self, id: &str, data: Map<String, Value>) -> Result<Value, StoreError> {
            let mut records = self.records.lock().unwrap();
            let record = records
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(format!("record {} not found", id)))?;
            if let Value::Object(fields) = record {
                for (key, value) in data {
                    fields.insert(key, value);
                }
            }
            Ok(record.clone())
        }

        async fn delete(&self, id: &str) -> Result<(), StoreError> {
            self.records
                .lock()
                .unwrap()
                .remove(id)
                .map(|_| ())
                .ok_or_else(|| StoreError::NotFound(format!("record {} not found", id)))
        }
    }

    #[tokio::test]
    async fn create_then_find_round_trips() {
        let store = MemoryStore::default();
        let created = create_record(&store, json!({ "texto": "hola", "de": 1 })).await.unwrap();

        let id = created["_id"].as_str().unwrap().to_string();
        let found = find_record(&store, &id).await.unwrap();
        assert_eq!(found["texto"], "hola");
        assert_eq!(found["de"], 1);
    }

    #[tokio::test]
    async fn non_object_bodies_are_rejected() {
        let store = MemoryStore::default();
        let err = create_record(&store, json!(["not", "an", "object"])).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn second_delete_is_not_found() {
        let store = MemoryStore::default();
        let created = create_record(&store, json!({ "texto": "hola" })).await.unwrap();
        let id = created["_id"].as_str().unwrap().to_string();

        delete_record(&store, &id).await.unwrap();
        let err = delete_record(&store, &id).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn update_merges_fields_and_reports_missing_targets() {
        let store = MemoryStore::default();
        let created = create_record(&store, json!({ "texto": "hola", "leido": false }))
            .await
            .unwrap();
        let id = created["_id"].as_str().unwrap().to_string();

        let updated = update_record(&store, &id, json!({ "leido": true })).await.unwrap();
        assert_eq!(updated["texto"], "hola");
        assert_eq!(updated["leido"], true);

        let err = update_record(&store, "999", json!({ "leido": true })).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn missing_record_is_not_found() {
        let store = MemoryStore::default();
        let err = find_record(&store, "999").await.unwrap_err();
        assert_eq!(err.status_code(), 404);

        assert!(list_records(&store).await.unwrap().is_empty());
    }
}
