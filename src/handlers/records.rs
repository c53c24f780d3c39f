//! Entity-generic request handlers.
//!
//! Routes carry the entity name as a path segment; the descriptor registry
//! resolves it, and every entity gets the same operation set. Adding an
//! entity to the API is a registry entry, not a new handler.

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::schema;
use crate::store::{pool, SqlRepository};

use super::as_object;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// `{campo, valor}` body shared by the field-scoped operations.
#[derive(Debug, Deserialize)]
pub struct FieldBody {
    pub campo: Option<String>,
    pub valor: Option<Value>,
}

impl FieldBody {
    fn into_parts(self) -> Result<(String, Value), ApiError> {
        match (self.campo, self.valor) {
            (Some(campo), Some(valor)) => Ok((campo, valor)),
            _ => Err(ApiError::bad_request("campo and valor are required")),
        }
    }
}

/// The pagination window derived from `page`/`limit` query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationWindow {
    pub page: i64,
    pub limit: i64,
}

impl PaginationWindow {
    pub fn from_query(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(10).max(1),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        (total + self.limit - 1) / self.limit
    }
}

pub(crate) async fn repository(entidad: &str) -> Result<SqlRepository, ApiError> {
    let descriptor = schema::descriptor_for(entidad)
        .ok_or_else(|| ApiError::not_found(format!("unknown entity: {}", entidad)))?;
    let pool = pool::pg_pool().await?.clone();
    Ok(SqlRepository::new(descriptor, pool))
}

/// GET /api/:entidad - full list, or a page when `page`/`limit` is present
pub async fn list(
    Path(entidad): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    let repo = repository(&entidad).await?;

    if query.page.is_none() && query.limit.is_none() {
        let records = repo.find_all(None).await?;
        return Ok(Json(Value::Array(records)).into_response());
    }

    let window = PaginationWindow::from_query(query.page, query.limit);
    let records = repo.find_all(Some((window.limit, window.offset()))).await?;
    let total = repo.count_all().await?;

    Ok(Json(json!({
        "data": records,
        "pagination": {
            "page": window.page,
            "limit": window.limit,
            "total": total,
            "totalPages": window.total_pages(total),
        },
    }))
    .into_response())
}

/// POST /api/:entidad - create a record
pub async fn create(
    Path(entidad): Path<String>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = repository(&entidad).await?;
    let data = as_object(payload)?;

    let missing = repo.descriptor().missing_required_fields(&data);
    if !missing.is_empty() {
        return Err(ApiError::validation(missing.iter().map(|s| s.to_string()).collect()));
    }

    let record = repo.create(&data).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/:entidad/:id
pub async fn get(Path((entidad, id)): Path<(String, i64)>) -> Result<impl IntoResponse, ApiError> {
    let repo = repository(&entidad).await?;

    let record = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("{} {} not found", entidad, id)))?;

    Ok(Json(record))
}

/// PUT /api/:entidad/:id - replace client-settable fields
pub async fn update(
    Path((entidad, id)): Path<(String, i64)>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = repository(&entidad).await?;
    let data = as_object(payload)?;

    let missing = repo.descriptor().missing_required_fields(&data);
    if !missing.is_empty() {
        return Err(ApiError::validation(missing.iter().map(|s| s.to_string()).collect()));
    }

    let record = repo.update(id, &data).await?;
    Ok(Json(record))
}

/// PATCH /api/:entidad/:id - update one field via `{campo, valor}`
pub async fn patch(
    Path((entidad, id)): Path<(String, i64)>,
    Json(body): Json<FieldBody>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = repository(&entidad).await?;
    let (campo, valor) = body.into_parts()?;

    let record = repo.update_field(id, &campo, &valor).await?;
    Ok(Json(record))
}

/// DELETE /api/:entidad/:id
pub async fn delete(Path((entidad, id)): Path<(String, i64)>) -> Result<impl IntoResponse, ApiError> {
    let repo = repository(&entidad).await?;
    repo.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/:entidad/buscar - equality search via `{campo, valor}`
pub async fn search(
    Path(entidad): Path<String>,
    Json(body): Json<FieldBody>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = repository(&entidad).await?;
    let (campo, valor) = body.into_parts()?;

    let records = repo.find_by_field(&campo, &valor).await?;
    Ok(Json(Value::Array(records)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_defaults_when_one_parameter_is_given() {
        let window = PaginationWindow::from_query(Some(2), None);
        assert_eq!(window, PaginationWindow { page: 2, limit: 10 });

        let window = PaginationWindow::from_query(None, Some(25));
        assert_eq!(window, PaginationWindow { page: 1, limit: 25 });
    }

    #[test]
    fn window_computes_offset_and_total_pages() {
        let window = PaginationWindow::from_query(Some(2), Some(10));
        assert_eq!(window.offset(), 10);
        // 25 records at limit 10 span 3 pages
        assert_eq!(window.total_pages(25), 3);
        assert_eq!(window.total_pages(30), 3);
        assert_eq!(window.total_pages(0), 0);
    }

    #[test]
    fn window_clamps_nonsense_parameters() {
        let window = PaginationWindow::from_query(Some(0), Some(-5));
        assert_eq!(window, PaginationWindow { page: 1, limit: 1 });
        assert_eq!(window.offset(), 0);
    }

    #[test]
    fn field_body_requires_both_keys() {
        let body = FieldBody { campo: Some("nombre".into()), valor: None };
        assert!(body.into_parts().is_err());

        let body = FieldBody { campo: None, valor: Some(Value::from("x")) };
        assert!(body.into_parts().is_err());

        let body = FieldBody { campo: Some("nombre".into()), valor: Some(Value::from("x")) };
        let (campo, valor) = body.into_parts().unwrap();
        assert_eq!(campo, "nombre");
        assert_eq!(valor, Value::from("x"));
    }
}
