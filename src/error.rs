// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::auth::TokenError;
use crate::store::StoreError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    Validation { missing: Vec<String> },
    Constraint { original: String },
    InvalidField(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    Internal(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Validation { .. } => 400,
            ApiError::Constraint { .. } => 400,
            ApiError::InvalidField(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Internal(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Validation { missing } => {
                format!("missing required fields: {}", missing.join(", "))
            }
            ApiError::Constraint { .. } => "unique constraint violated".to_string(),
            ApiError::InvalidField(field) => format!("unknown field: {}", field),
            ApiError::Unauthorized(msg) => msg.clone(),
            ApiError::Forbidden(msg) => msg.clone(),
            ApiError::NotFound(msg) => msg.clone(),
            ApiError::Internal(msg) => msg.clone(),
            ApiError::ServiceUnavailable(msg) => msg.clone(),
        }
    }

    /// Error class name exposed to clients as `msg`
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BadRequest",
            ApiError::Validation { .. } => "ValidationError",
            ApiError::Constraint { .. } => "ConstraintError",
            ApiError::InvalidField(_) => "InvalidFieldError",
            ApiError::Unauthorized(_) => "TokenError",
            ApiError::Forbidden(_) => "TokenError",
            ApiError::NotFound(_) => "NotFoundError",
            ApiError::Internal(_) => "InternalError",
            ApiError::ServiceUnavailable(_) => "ServiceUnavailable",
        }
    }

    /// Convert to JSON response body.
    ///
    /// Every body carries `error`; classified failures add `msg`, and
    /// store-level constraint violations add the native detail as `original`.
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::Validation { missing } => json!({
                "error": self.message(),
                "msg": self.error_code(),
                "fields": missing,
            }),
            ApiError::Constraint { original } => json!({
                "error": self.message(),
                "msg": self.error_code(),
                "original": original,
            }),
            ApiError::InvalidField(_) | ApiError::NotFound(_) => json!({
                "error": self.message(),
                "msg": self.error_code(),
            }),
            _ => json!({ "error": self.message() }),
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation(missing: Vec<String>) -> Self {
        ApiError::Validation { missing }
    }

    pub fn invalid_field(field: impl Into<String>) -> Self {
        ApiError::InvalidField(field.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation { missing } => ApiError::Validation { missing },
            StoreError::Constraint { detail } => ApiError::Constraint { original: detail },
            StoreError::NotFound(msg) => ApiError::not_found(msg),
            StoreError::InvalidField(field) => ApiError::invalid_field(field),
            StoreError::ConfigMissing(name) => {
                tracing::error!("store configuration missing: {}", name);
                ApiError::service_unavailable("storage unavailable")
            }
            StoreError::InvalidDatabaseUrl => {
                tracing::error!("DATABASE_URL is not a valid connection string");
                ApiError::service_unavailable("storage unavailable")
            }
            StoreError::Bson(e) => ApiError::bad_request(e.to_string()),
            // Unclassified store failures surface the raw message (debug-oriented)
            StoreError::Sqlx(e) => ApiError::internal(e.to_string()),
            StoreError::Mongo(e) => ApiError::internal(e.to_string()),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidOrExpired => ApiError::unauthorized("token invalid or expired"),
            other => ApiError::internal(other.to_string()),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
