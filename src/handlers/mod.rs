pub mod auth;
pub mod chat;
pub mod records;
pub mod upload;

use serde_json::{Map, Value};

use crate::error::ApiError;

pub(crate) fn as_object(value: Value) -> Result<Map<String, Value>, ApiError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::bad_request("request body must be a JSON object")),
    }
}
