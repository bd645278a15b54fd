use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use super::model::*;
use super::repo::*;

pub struct SqliteRepository {
    pool: SqlitePool,
    name: String,
}

impl SqliteRepository {
    pub async fn new(db_url: &str, name: Option<String>, max_connections: u32) -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str(db_url)?.create_if_missing(true);

        // Every connection to :memory: opens a separate database.
        let in_memory = db_url.contains(":memory:");
        let mut pool_options = SqlitePoolOptions::new();
        if in_memory {
            debug!("In-memory database, using a single connection");
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        } else {
            pool_options = pool_options.max_connections(max_connections.max(1));
        }

        let pool = pool_options.connect_with(options).await?;

        let repo = Self {
            pool,
            name: name.unwrap_or_else(|| db_url.to_string()),
        };

        repo.init_schema().await?;

        info!("Database initialized at {}", db_url);

        Ok(repo)
    }

    async fn init_schema(&self) -> DbResult<()> {
        let schema = include_str!("schema.sql");
        sqlx::raw_sql(schema).execute(&self.pool).await?;
        Ok(())
    }
}

enum FilterValue {
    Text(String),
    Int(i64),
    Real(f64),
    Null,
}

fn filter_value(field: &str, value: &Value) -> DbResult<FilterValue> {
    match value {
        Value::String(s) => Ok(FilterValue::Text(s.clone())),
        // json_extract yields 1/0 for JSON booleans.
        Value::Bool(b) => Ok(FilterValue::Int(*b as i64)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(FilterValue::Int(i)),
            None => n
                .as_f64()
                .map(FilterValue::Real)
                .ok_or_else(|| {
                    DbError::Validation(field.to_string(), "unsupported number".to_string())
                }),
        },
        Value::Null => Ok(FilterValue::Null),
        Value::Array(_) | Value::Object(_) => Err(DbError::Validation(
            field.to_string(),
            "filter values must be scalars".to_string(),
        )),
    }
}

fn is_field_name(field: &str) -> bool {
    !field.is_empty() && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_timestamp(id: &str, s: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::Malformed(id.to_string(), format!("bad timestamp {}: {}", s, e)))
}

#[async_trait]
impl CatalogRepo for SqliteRepository {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn list_collections(&self) -> DbResult<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }
}

#[async_trait]
impl DocumentRepo for SqliteRepository {
    async fn create_document(&self, collection: &str, data: Value) -> DbResult<String> {
        check_collection(collection)?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let body = serde_json::to_string(&data)
            .map_err(|e| DbError::Malformed(id.clone(), e.to_string()))?;

        sqlx::query(&format!(
            "INSERT INTO {} (id, data, created_at, updated_at) VALUES (?, ?, ?, ?)",
            collection
        ))
        .bind(&id)
        .bind(&body)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        debug!(collection = collection, id = %id, "Created document");
        Ok(id)
    }

    async fn get_documents(
        &self,
        collection: &str,
        filter: &DocumentFilter,
        limit: Option<i64>,
    ) -> DbResult<Vec<StoredDocument>> {
        check_collection(collection)?;

        let mut sql = format!("SELECT id, data, created_at, updated_at FROM {}", collection);
        let mut binds = Vec::with_capacity(filter.len());
        for (i, (field, value)) in filter.iter().enumerate() {
            if !is_field_name(field) {
                return Err(DbError::Validation(field.clone(), "invalid filter field".to_string()));
            }
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            let value = filter_value(field, value)?;
            match value {
                FilterValue::Null => {
                    sql.push_str(&format!("json_extract(data, '$.{}') IS NULL", field));
                }
                other => {
                    sql.push_str(&format!("json_extract(data, '$.{}') = ?", field));
                    binds.push(other);
                }
            }
        }
        sql.push_str(" ORDER BY rowid");
        if limit.is_some() {
            sql.push_str(" LIMIT ?");
        }

        let mut query = sqlx::query_as::<_, (String, String, String, String)>(&sql);
        for value in binds {
            query = match value {
                FilterValue::Text(s) => query.bind(s),
                FilterValue::Int(i) => query.bind(i),
                FilterValue::Real(f) => query.bind(f),
                FilterValue::Null => query,
            };
        }
        if let Some(limit) = limit {
            query = query.bind(limit);
        }

        let rows = query.fetch_all(&self.pool).await?;

        rows.into_iter()
            .map(|(id, data, created_at, updated_at)| -> DbResult<StoredDocument> {
                let data = serde_json::from_str(&data)
                    .map_err(|e| DbError::Malformed(id.clone(), e.to_string()))?;
                Ok(StoredDocument {
                    created_at: parse_timestamp(&id, &created_at)?,
                    updated_at: parse_timestamp(&id, &updated_at)?,
                    id,
                    data,
                })
            })
            .collect()
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn close(&self) {
        self.pool.close().await;
        info!("Database closed");
    }
}
