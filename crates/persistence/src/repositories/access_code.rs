//! Access code repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::{AccessCode, AccessCodePatch, InsertedCode, NewAccessCode};
use domain::repository::{AccessCodeStore, CodeQuery, ExportSelection};
use domain::{DomainError, ValidationError};
use shared::validation::escape_like;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::AccessCodeEntity;
use crate::metrics::QueryTimer;

const CODE_COLUMNS: &str =
    "id, code_hash, plain_code, expires_at, max_uses, used_count, description, created_at";

const ORDER_NEWEST_FIRST: &str = "ORDER BY created_at DESC, id DESC";

/// Builds the WHERE clause for pushed-down listing filters.
/// Tracks conditions and parameter positions so count and page queries share it.
struct CodeFilterBuilder {
    conditions: Vec<String>,
    param_count: i32,
}

impl CodeFilterBuilder {
    fn build(query: &CodeQuery) -> Self {
        let mut conditions = Vec::new();
        let mut param_count = 0;

        if query.search.is_some() {
            param_count += 1;
            conditions.push(format!("description ILIKE ${}", param_count));
        }

        if query.expires_from.is_some() {
            param_count += 1;
            conditions.push(format!("expires_at >= ${}", param_count));
        }

        if query.expires_to.is_some() {
            param_count += 1;
            conditions.push(format!("expires_at <= ${}", param_count));
        }

        Self {
            conditions,
            param_count,
        }
    }

    fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            "TRUE".to_string()
        } else {
            self.conditions.join(" AND ")
        }
    }

    fn param_count(&self) -> i32 {
        self.param_count
    }
}

/// `%term%` with LIKE metacharacters escaped.
fn contains_pattern(search: &str) -> String {
    format!("%{}%", escape_like(search))
}

/// Binds listing filter parameters in the order `CodeFilterBuilder` numbers them.
macro_rules! bind_code_filters {
    ($builder:expr, $query:expr) => {{
        let mut b = $builder;
        if let Some(ref search) = $query.search {
            b = b.bind(contains_pattern(search));
        }
        if let Some(from) = $query.expires_from {
            b = b.bind(from);
        }
        if let Some(to) = $query.expires_to {
            b = b.bind(to);
        }
        b
    }};
}

/// Maps driver errors onto domain errors.
fn map_sqlx_error(err: sqlx::Error) -> DomainError {
    match err {
        sqlx::Error::RowNotFound => DomainError::code_not_found(),
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some("23505") => DomainError::Conflict("Access code already exists".into()),
            _ => {
                tracing::error!(error = %db_err, "Access code query failed");
                DomainError::Storage(format!("Database error: {}", db_err))
            }
        },
        other => {
            tracing::error!(error = %other, "Access code query failed");
            DomainError::Storage(format!("Database error: {}", other))
        }
    }
}

/// PostgreSQL-backed access code store.
#[derive(Clone)]
pub struct PgAccessCodeRepository {
    pool: PgPool,
}

impl PgAccessCodeRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccessCodeStore for PgAccessCodeRepository {
    async fn insert_one(&self, row: NewAccessCode) -> Result<InsertedCode, DomainError> {
        let timer = QueryTimer::new("insert_one");
        let result = sqlx::query_as::<_, (Uuid, DateTime<Utc>)>(
            r#"
            INSERT INTO access_codes (code_hash, plain_code, expires_at, max_uses, description)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, created_at
            "#,
        )
        .bind(&row.code_hash)
        .bind(&row.plain_code)
        .bind(row.expires_at)
        .bind(row.max_uses)
        .bind(&row.description)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        let (id, created_at) = result.map_err(map_sqlx_error)?;
        Ok(InsertedCode { id, created_at })
    }

    /// One statement over parallel arrays, so every row gets the same
    /// transaction timestamp from `DEFAULT NOW()`.
    async fn insert_many(
        &self,
        rows: Vec<NewAccessCode>,
    ) -> Result<Vec<InsertedCode>, DomainError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut hashes = Vec::with_capacity(rows.len());
        let mut plains = Vec::with_capacity(rows.len());
        let mut expiries = Vec::with_capacity(rows.len());
        let mut caps = Vec::with_capacity(rows.len());
        let mut descriptions = Vec::with_capacity(rows.len());
        for row in rows {
            hashes.push(row.code_hash);
            plains.push(row.plain_code);
            expiries.push(row.expires_at);
            caps.push(row.max_uses);
            descriptions.push(row.description);
        }

        let timer = QueryTimer::new("insert_many");
        let result = sqlx::query_as::<_, (Uuid, DateTime<Utc>)>(
            r#"
            INSERT INTO access_codes (code_hash, plain_code, expires_at, max_uses, description)
            SELECT code_hash, plain_code, expires_at, max_uses, description
            FROM UNNEST($1::text[], $2::text[], $3::timestamptz[], $4::int4[], $5::text[])
                WITH ORDINALITY AS t(code_hash, plain_code, expires_at, max_uses, description, ord)
            ORDER BY ord
            RETURNING id, created_at
            "#,
        )
        .bind(&hashes)
        .bind(&plains)
        .bind(&expiries)
        .bind(&caps)
        .bind(&descriptions)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        let inserted = result
            .map_err(map_sqlx_error)?
            .into_iter()
            .map(|(id, created_at)| InsertedCode { id, created_at })
            .collect();
        Ok(inserted)
    }

    async fn update(&self, id: Uuid, patch: &AccessCodePatch) -> Result<AccessCode, DomainError> {
        if patch.is_empty() {
            return Err(ValidationError::NoFieldsToUpdate.into());
        }

        let mut sets = Vec::new();
        let mut param_count = 0;
        if patch.expires_at.is_some() {
            param_count += 1;
            sets.push(format!("expires_at = ${}", param_count));
        }
        if patch.max_uses.is_some() {
            param_count += 1;
            sets.push(format!("max_uses = ${}", param_count));
        }
        if patch.description.is_some() {
            param_count += 1;
            sets.push(format!("description = ${}", param_count));
        }

        let sql = format!(
            "UPDATE access_codes SET {} WHERE id = ${} RETURNING {}",
            sets.join(", "),
            param_count + 1,
            CODE_COLUMNS
        );

        let mut builder = sqlx::query_as::<_, AccessCodeEntity>(&sql);
        if let Some(expires_at) = patch.expires_at {
            builder = builder.bind(expires_at);
        }
        if let Some(max_uses) = patch.max_uses {
            builder = builder.bind(max_uses);
        }
        if let Some(description) = &patch.description {
            builder = builder.bind(description.clone());
        }

        let timer = QueryTimer::new("update");
        let result = builder.bind(id).fetch_optional(&self.pool).await;
        timer.record();

        result
            .map_err(map_sqlx_error)?
            .map(AccessCode::from)
            .ok_or_else(DomainError::code_not_found)
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let timer = QueryTimer::new("delete");
        let result = sqlx::query("DELETE FROM access_codes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.record();

        if result.map_err(map_sqlx_error)?.rows_affected() == 0 {
            return Err(DomainError::code_not_found());
        }
        Ok(())
    }

    async fn query_page(
        &self,
        query: &CodeQuery,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<AccessCode>, i64), DomainError> {
        let filter = CodeFilterBuilder::build(query);
        let where_clause = filter.where_clause();
        let param_count = filter.param_count();

        let count_sql = format!("SELECT COUNT(*) FROM access_codes WHERE {}", where_clause);
        let list_sql = format!(
            "SELECT {} FROM access_codes WHERE {} {} LIMIT ${} OFFSET ${}",
            CODE_COLUMNS,
            where_clause,
            ORDER_NEWEST_FIRST,
            param_count + 1,
            param_count + 2
        );

        let count_builder = bind_code_filters!(sqlx::query_scalar::<_, i64>(&count_sql), query);
        let list_builder =
            bind_code_filters!(sqlx::query_as::<_, AccessCodeEntity>(&list_sql), query)
                .bind(limit)
                .bind(offset);

        let timer = QueryTimer::new("query_page");
        let result = tokio::try_join!(
            count_builder.fetch_one(&self.pool),
            list_builder.fetch_all(&self.pool)
        );
        timer.record();

        let (total, entities) = result.map_err(map_sqlx_error)?;
        Ok((entities.into_iter().map(AccessCode::from).collect(), total))
    }

    async fn query_window(
        &self,
        query: &CodeQuery,
        cap: i64,
    ) -> Result<Vec<AccessCode>, DomainError> {
        let filter = CodeFilterBuilder::build(query);
        let sql = format!(
            "SELECT {} FROM access_codes WHERE {} {} LIMIT ${}",
            CODE_COLUMNS,
            filter.where_clause(),
            ORDER_NEWEST_FIRST,
            filter.param_count() + 1
        );

        let builder = bind_code_filters!(sqlx::query_as::<_, AccessCodeEntity>(&sql), query);

        let timer = QueryTimer::new("query_window");
        let result = builder.bind(cap).fetch_all(&self.pool).await;
        timer.record();

        Ok(result
            .map_err(map_sqlx_error)?
            .into_iter()
            .map(AccessCode::from)
            .collect())
    }

    async fn query_all(&self, cap: i64) -> Result<Vec<AccessCode>, DomainError> {
        let sql = format!(
            "SELECT {} FROM access_codes {} LIMIT $1",
            CODE_COLUMNS, ORDER_NEWEST_FIRST
        );

        let timer = QueryTimer::new("query_all");
        let result = sqlx::query_as::<_, AccessCodeEntity>(&sql)
            .bind(cap)
            .fetch_all(&self.pool)
            .await;
        timer.record();

        Ok(result
            .map_err(map_sqlx_error)?
            .into_iter()
            .map(AccessCode::from)
            .collect())
    }

    async fn recent_created_at(&self, limit: i64) -> Result<Vec<DateTime<Utc>>, DomainError> {
        let timer = QueryTimer::new("recent_created_at");
        let result = sqlx::query_scalar::<_, DateTime<Utc>>(
            "SELECT created_at FROM access_codes ORDER BY created_at DESC, id DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        result.map_err(map_sqlx_error)
    }

    async fn select_for_export(
        &self,
        selection: &ExportSelection,
        cap: i64,
    ) -> Result<Vec<AccessCode>, DomainError> {
        let timer = QueryTimer::new("select_for_export");
        let result = match selection {
            ExportSelection::Batch(key) => {
                let sql = format!(
                    "SELECT {} FROM access_codes WHERE created_at = $1 {} LIMIT $2",
                    CODE_COLUMNS, ORDER_NEWEST_FIRST
                );
                sqlx::query_as::<_, AccessCodeEntity>(&sql)
                    .bind(key)
                    .bind(cap)
                    .fetch_all(&self.pool)
                    .await
            }
            ExportSelection::Range { start, end } => {
                let sql = format!(
                    "SELECT {} FROM access_codes \
                     WHERE ($1::timestamptz IS NULL OR created_at >= $1) \
                       AND ($2::timestamptz IS NULL OR created_at <= $2) \
                     {} LIMIT $3",
                    CODE_COLUMNS, ORDER_NEWEST_FIRST
                );
                sqlx::query_as::<_, AccessCodeEntity>(&sql)
                    .bind(start)
                    .bind(end)
                    .bind(cap)
                    .fetch_all(&self.pool)
                    .await
            }
        };
        timer.record();

        Ok(result
            .map_err(map_sqlx_error)?
            .into_iter()
            .map(AccessCode::from)
            .collect())
    }
}
