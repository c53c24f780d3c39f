//! Document store adapter backing the chat boundary.
//!
//! Mirrors the relational adapter's surface where the capability overlaps;
//! schema validation is left to the store itself, and pagination and the
//! field-scoped operations are intentionally absent.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use mongodb::Collection;
use serde_json::{Map, Value};

use super::{RecordStore, StoreError};

pub struct DocumentRepository {
    collection: Collection<Document>,
}

impl DocumentRepository {
    pub fn new(collection: Collection<Document>) -> Self {
        Self { collection }
    }

    /// A malformed id cannot name any document; treated as absence.
    fn parse_id(id: &str) -> Option<ObjectId> {
        ObjectId::parse_str(id).ok()
    }

    fn not_found(id: &str) -> StoreError {
        StoreError::NotFound(format!("document {} not found", id))
    }
}

#[async_trait]
impl RecordStore for DocumentRepository {
    async fn create(&self, mut data: Map<String, Value>) -> Result<Value, StoreError> {
        // Ids are store-assigned and immutable
        data.remove("_id");

        let document =
            mongodb::bson::to_document(&data)?;
        let inserted = self.collection.insert_one(document, None).await?;

        let oid = match inserted.inserted_id {
            Bson::ObjectId(oid) => oid,
            _ => return Ok(Value::Object(data)),
        };

        match self.collection.find_one(doc! { "_id": oid }, None).await? {
            Some(created) => Ok(document_to_value(created)),
            None => {
                let mut fields = data;
                fields.insert("_id".to_string(), Value::String(oid.to_hex()));
                Ok(Value::Object(fields))
            }
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Value>, StoreError> {
        let Some(oid) = Self::parse_id(id) else {
            return Ok(None);
        };

        let found = self.collection.find_one(doc! { "_id": oid }, None).await?;
        Ok(found.map(document_to_value))
    }

    async fn find_all(&self) -> Result<Vec<Value>, StoreError> {
        let mut cursor = self.collection.find(None, None).await?;
        let mut records = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            records.push(document_to_value(document));
        }
        Ok(records)
    }

    async fn update(&self, id: &str, mut data: Map<String, Value>) -> Result<Value, StoreError> {
        let oid = Self::parse_id(id).ok_or_else(|| Self::not_found(id))?;
        data.remove("_id");

        let changes = mongodb::bson::to_document(&data)?;
        let result = self
            .collection
            .update_one(doc! { "_id": oid }, doc! { "$set": changes }, None)
            .await?;

        if result.matched_count == 0 {
            return Err(Self::not_found(id));
        }

        self.find_by_id(id).await?.ok_or_else(|| Self::not_found(id))
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let oid = Self::parse_id(id).ok_or_else(|| Self::not_found(id))?;

        let result = self.collection.delete_one(doc! { "_id": oid }, None).await?;
        if result.deleted_count == 0 {
            return Err(Self::not_found(id));
        }
        Ok(())
    }
}

/// Flatten a BSON document into plain JSON: object ids become hex strings and
/// timestamps RFC 3339, so clients never see extended-JSON wrappers.
fn document_to_value(document: Document) -> Value {
    Value::Object(document.into_iter().map(|(key, value)| (key, bson_to_value(value))).collect())
}

fn bson_to_value(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => {
            Value::String(dt.try_to_rfc3339_string().unwrap_or_default())
        }
        other => other.into_relaxed_extjson(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_ids_flatten_to_hex_strings() {
        let oid = ObjectId::new();
        let document = doc! { "_id": oid, "texto": "hola", "leido": false, "intentos": 3_i64 };

        let value = document_to_value(document);
        assert_eq!(value["_id"], Value::String(oid.to_hex()));
        assert_eq!(value["texto"], "hola");
        assert_eq!(value["leido"], false);
        assert_eq!(value["intentos"], 3);
    }

    #[test]
    fn malformed_ids_are_treated_as_absent() {
        assert!(DocumentRepository::parse_id("not-an-object-id").is_none());
        assert!(DocumentRepository::parse_id(&ObjectId::new().to_hex()).is_some());
    }
}
