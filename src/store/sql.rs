//! Generic relational store adapter.
//!
//! One [`SqlRepository`] binds an [`EntityDescriptor`] to the shared pool and
//! exposes uniform persistence operations. Rows travel as JSON objects via
//! Postgres `row_to_json`, so no per-entity row mapping exists anywhere.

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{postgres::PgArguments, PgPool, Row};

use crate::schema::EntityDescriptor;

use super::{RecordStore, StoreError};

pub struct SqlRepository {
    descriptor: &'static EntityDescriptor,
    pool: PgPool,
}

impl SqlRepository {
    pub fn new(descriptor: &'static EntityDescriptor, pool: PgPool) -> Self {
        Self { descriptor, pool }
    }

    pub fn descriptor(&self) -> &'static EntityDescriptor {
        self.descriptor
    }

    /// Insert a new record. Validates required fields against the descriptor
    /// and returns the created row including generated columns.
    pub async fn create(&self, data: &Map<String, Value>) -> Result<Value, StoreError> {
        let missing = self.descriptor.missing_required_fields(data);
        if !missing.is_empty() {
            return Err(StoreError::Validation {
                missing: missing.iter().map(|s| s.to_string()).collect(),
            });
        }

        let (columns, values) = self.known_fields(data);
        let sql = insert_sql(self.descriptor, &columns);

        let mut query = sqlx::query(&sql);
        for value in values.iter().copied() {
            query = bind_value(query, value);
        }

        let row = query.fetch_one(&self.pool).await.map_err(classify)?;
        Ok(row.try_get("row")?)
    }

    /// Absence is `Ok(None)`, never an error.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Value>, StoreError> {
        let sql = format!(
            "SELECT row_to_json(t) AS row FROM (SELECT * FROM {} WHERE {} = $1) t",
            quote_ident(self.descriptor.table),
            quote_ident(self.descriptor.primary_key),
        );

        match sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await? {
            Some(row) => Ok(Some(row.try_get("row")?)),
            None => Ok(None),
        }
    }

    /// Full set, or one page ordered by primary key when a `(limit, offset)`
    /// window is supplied.
    pub async fn find_all(&self, window: Option<(i64, i64)>) -> Result<Vec<Value>, StoreError> {
        let table = quote_ident(self.descriptor.table);

        let rows = match window {
            Some((limit, offset)) => {
                let sql = format!(
                    "SELECT row_to_json(t) AS row FROM (SELECT * FROM {} ORDER BY {} LIMIT $1 OFFSET $2) t",
                    table,
                    quote_ident(self.descriptor.primary_key),
                );
                sqlx::query(&sql).bind(limit).bind(offset).fetch_all(&self.pool).await?
            }
            None => {
                let sql = format!("SELECT row_to_json(t) AS row FROM (SELECT * FROM {}) t", table);
                sqlx::query(&sql).fetch_all(&self.pool).await?
            }
        };

        rows.iter()
            .map(|row| row.try_get("row"))
            .collect::<Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    /// Total record count; pairs with `find_all` for pagination metadata.
    pub async fn count_all(&self) -> Result<i64, StoreError> {
        let sql = format!("SELECT COUNT(*) AS count FROM {}", quote_ident(self.descriptor.table));
        let row = sqlx::query(&sql).fetch_one(&self.pool).await?;
        Ok(row.try_get("count")?)
    }

    /// Merge the provided known fields into an existing record.
    pub async fn update(&self, id: i64, data: &Map<String, Value>) -> Result<Value, StoreError> {
        let (columns, values) = self.known_fields(data);
        if columns.is_empty() {
            // Nothing to merge; still a not-found check plus the current row.
            return self.find_by_id(id).await?.ok_or_else(|| self.not_found(id));
        }

        let sql = update_sql(self.descriptor, &columns);
        let mut query = sqlx::query(&sql);
        for value in values.iter().copied() {
            query = bind_value(query, value);
        }
        query = query.bind(id);

        match query.fetch_optional(&self.pool).await.map_err(classify)? {
            Some(row) => Ok(row.try_get("row")?),
            None => Err(self.not_found(id)),
        }
    }

    /// Physical removal.
    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = $1",
            quote_ident(self.descriptor.table),
            quote_ident(self.descriptor.primary_key),
        );

        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(self.not_found(id));
        }
        Ok(())
    }

    /// Single-field update. Unknown fields and the primary key are rejected
    /// before any query runs.
    pub async fn update_field(
        &self,
        id: i64,
        field: &str,
        value: &Value,
    ) -> Result<Value, StoreError> {
        if !self.descriptor.is_mutable_field(field) {
            return Err(StoreError::InvalidField(field.to_string()));
        }

        let sql = update_sql(self.descriptor, &[field]);
        let query = bind_value(sqlx::query(&sql), value).bind(id);

        match query.fetch_optional(&self.pool).await.map_err(classify)? {
            Some(row) => Ok(row.try_get("row")?),
            None => Err(self.not_found(id)),
        }
    }

    /// Equality lookup on one descriptor field.
    pub async fn find_by_field(&self, field: &str, value: &Value) -> Result<Vec<Value>, StoreError> {
        if !self.descriptor.is_queryable_field(field) {
            return Err(StoreError::InvalidField(field.to_string()));
        }

        let sql = format!(
            "SELECT row_to_json(t) AS row FROM (SELECT * FROM {} WHERE {} = $1) t",
            quote_ident(self.descriptor.table),
            quote_ident(field),
        );

        let rows = bind_value(sqlx::query(&sql), value).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| row.try_get("row"))
            .collect::<Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    /// Intersect the payload with descriptor fields, preserving descriptor
    /// order. Unknown keys are dropped.
    fn known_fields<'a>(
        &self,
        data: &'a Map<String, Value>,
    ) -> (Vec<&'static str>, Vec<&'a Value>) {
        let mut columns = Vec::new();
        let mut values = Vec::new();
        for field in self.descriptor.fields {
            if let Some(value) = data.get(field.name) {
                columns.push(field.name);
                values.push(value);
            }
        }
        (columns, values)
    }

    fn not_found(&self, id: i64) -> StoreError {
        StoreError::NotFound(format!("{} {} not found", self.descriptor.name, id))
    }
}

#[async_trait]
impl RecordStore for SqlRepository {
    async fn create(&self, data: Map<String, Value>) -> Result<Value, StoreError> {
        SqlRepository::create(self, &data).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Value>, StoreError> {
        match id.parse::<i64>() {
            Ok(id) => SqlRepository::find_by_id(self, id).await,
            Err(_) => Ok(None),
        }
    }

    async fn find_all(&self) -> Result<Vec<Value>, StoreError> {
        SqlRepository::find_all(self, None).await
    }

    async fn update(&self, id: &str, data: Map<String, Value>) -> Result<Value, StoreError> {
        let id = id
            .parse::<i64>()
            .map_err(|_| StoreError::NotFound(format!("{} {} not found", self.descriptor.name, id)))?;
        SqlRepository::update(self, id, &data).await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let id = id
            .parse::<i64>()
            .map_err(|_| StoreError::NotFound(format!("{} {} not found", self.descriptor.name, id)))?;
        SqlRepository::delete(self, id).await
    }
}

fn insert_sql(descriptor: &EntityDescriptor, columns: &[&str]) -> String {
    let table = quote_ident(descriptor.table);

    if columns.is_empty() {
        return format!(
            "WITH r AS (INSERT INTO {} DEFAULT VALUES RETURNING *) SELECT row_to_json(r) AS row FROM r",
            table
        );
    }

    let column_list = columns.iter().map(|c| quote_ident(c)).collect::<Vec<_>>().join(", ");
    let placeholders =
        (1..=columns.len()).map(|i| format!("${}", i)).collect::<Vec<_>>().join(", ");

    format!(
        "WITH r AS (INSERT INTO {} ({}) VALUES ({}) RETURNING *) SELECT row_to_json(r) AS row FROM r",
        table, column_list, placeholders
    )
}

/// `WHERE <pk> = $n` with n = columns.len() + 1; callers bind values first,
/// then the id.
fn update_sql(descriptor: &EntityDescriptor, columns: &[&str]) -> String {
    let assignments = columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{} = ${}", quote_ident(c), i + 1))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "WITH r AS (UPDATE {} SET {} WHERE {} = ${} RETURNING *) SELECT row_to_json(r) AS row FROM r",
        quote_ident(descriptor.table),
        assignments,
        quote_ident(descriptor.primary_key),
        columns.len() + 1
    )
}

/// Quote SQL identifier to prevent injection
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db) = err {
        if db.code().as_deref() == Some("23505") {
            return StoreError::Constraint { detail: db.message().to_string() };
        }
    }
    StoreError::Sqlx(err)
}

fn bind_value<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(u) = n.as_u64() {
                // Postgres has no u64; cast down if it fits
                q.bind(u as i64)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s),
        // Nested structures land in JSONB columns
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()),
    }
}
