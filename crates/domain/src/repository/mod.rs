//! Storage port for access codes.
//!
//! The persistence crate provides the PostgreSQL implementation; an in-memory
//! implementation with identical ordering and filtering rules lives in
//! [`memory`] for service tests and local tooling.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DomainError;
use crate::models::{AccessCode, AccessCodePatch, CodeFilters, InsertedCode, NewAccessCode};

pub use memory::InMemoryCodeStore;

/// Filters that can be pushed down to storage. Status is derived and is
/// never part of a storage query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeQuery {
    /// Case-insensitive substring of `description`, matched literally.
    pub search: Option<String>,
    /// Inclusive lower bound on `expires_at`.
    pub expires_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `expires_at`.
    pub expires_to: Option<DateTime<Utc>>,
}

impl CodeQuery {
    pub fn from_filters(filters: &CodeFilters) -> Self {
        Self {
            search: shared::validation::normalize_text(filters.search.as_deref()),
            expires_from: filters.expires_from,
            expires_to: filters.expires_to,
        }
    }

    /// Row-level predicate equivalent to the SQL the repository generates.
    pub fn matches(&self, code: &AccessCode) -> bool {
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let hit = code
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        if self.expires_from.is_some_and(|from| code.expires_at < from) {
            return false;
        }
        if self.expires_to.is_some_and(|to| code.expires_at > to) {
            return false;
        }
        true
    }
}

/// Row selection for exports, keyed on `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportSelection {
    /// Exactly one batch.
    Batch(DateTime<Utc>),
    /// Inclusive range; either bound may be open.
    Range {
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    },
}

impl ExportSelection {
    pub fn matches(&self, created_at: DateTime<Utc>) -> bool {
        match self {
            ExportSelection::Batch(key) => created_at == *key,
            ExportSelection::Range { start, end } => {
                start.map_or(true, |s| created_at >= s) && end.map_or(true, |e| created_at <= e)
            }
        }
    }
}

/// Persistence operations on the `access_codes` table.
///
/// Every read returns rows newest first (`created_at DESC, id DESC`).
#[async_trait]
pub trait AccessCodeStore: Send + Sync {
    /// Insert a single row.
    async fn insert_one(&self, row: NewAccessCode) -> Result<InsertedCode, DomainError>;

    /// Insert all rows in one statement; they share one `created_at`.
    async fn insert_many(&self, rows: Vec<NewAccessCode>)
        -> Result<Vec<InsertedCode>, DomainError>;

    /// Apply a partial update and return the full row.
    ///
    /// Fails with `NoFieldsToUpdate` for an empty patch and `NotFound` for an
    /// unknown id.
    async fn update(&self, id: Uuid, patch: &AccessCodePatch) -> Result<AccessCode, DomainError>;

    /// Hard delete. Fails with `NotFound` for an unknown id.
    async fn delete(&self, id: Uuid) -> Result<(), DomainError>;

    /// One page of matching rows plus the total match count.
    async fn query_page(
        &self,
        query: &CodeQuery,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<AccessCode>, i64), DomainError>;

    /// The `cap` most recent matching rows.
    async fn query_window(&self, query: &CodeQuery, cap: i64)
        -> Result<Vec<AccessCode>, DomainError>;

    /// The `cap` most recent rows, unfiltered.
    async fn query_all(&self, cap: i64) -> Result<Vec<AccessCode>, DomainError>;

    /// `created_at` of the `limit` most recent rows.
    async fn recent_created_at(&self, limit: i64) -> Result<Vec<DateTime<Utc>>, DomainError>;

    /// Rows selected for export, capped at `cap`.
    async fn select_for_export(
        &self,
        selection: &ExportSelection,
        cap: i64,
    ) -> Result<Vec<AccessCode>, DomainError>;
}
