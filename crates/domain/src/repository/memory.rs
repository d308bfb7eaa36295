//! In-memory access code store.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use uuid::Uuid;

use super::{AccessCodeStore, CodeQuery, ExportSelection};
use crate::error::{DomainError, ValidationError};
use crate::models::{AccessCode, AccessCodePatch, InsertedCode, NewAccessCode};

#[derive(Default)]
struct State {
    rows: Vec<AccessCode>,
    last_created_at: Option<DateTime<Utc>>,
}

/// Store backed by a vector behind a lock.
///
/// Mirrors the PostgreSQL repository: microsecond timestamps, one shared
/// `created_at` per insert call, unique retained plaintext, newest-first reads.
#[derive(Default)]
pub struct InMemoryCodeStore {
    state: RwLock<State>,
}

impl InMemoryCodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts fully formed rows as-is, keeping their timestamps.
    pub fn seed(&self, rows: impl IntoIterator<Item = AccessCode>) -> Result<(), DomainError> {
        let mut state = self.write()?;
        for row in rows {
            if state
                .last_created_at
                .map_or(true, |last| row.created_at > last)
            {
                state.last_created_at = Some(row.created_at);
            }
            state.rows.push(row);
        }
        Ok(())
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.state.read().map(|s| s.rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, State>, DomainError> {
        self.state
            .read()
            .map_err(|_| DomainError::Storage("code store lock poisoned".into()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>, DomainError> {
        self.state
            .write()
            .map_err(|_| DomainError::Storage("code store lock poisoned".into()))
    }

    fn sorted(rows: impl Iterator<Item = AccessCode>) -> Vec<AccessCode> {
        let mut rows: Vec<AccessCode> = rows.collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows
    }

    fn insert_locked(
        state: &mut State,
        rows: Vec<NewAccessCode>,
    ) -> Result<Vec<InsertedCode>, DomainError> {
        for (i, row) in rows.iter().enumerate() {
            let Some(plain) = row.plain_code.as_deref() else {
                continue;
            };
            let in_store = state
                .rows
                .iter()
                .any(|r| r.plain_code.as_deref() == Some(plain));
            let in_batch = rows[..i]
                .iter()
                .any(|r| r.plain_code.as_deref() == Some(plain));
            if in_store || in_batch {
                return Err(DomainError::Conflict("Access code already exists".into()));
            }
        }

        let mut created_at = Utc::now().trunc_subsecs(6);
        if let Some(last) = state.last_created_at {
            if created_at <= last {
                created_at = last + Duration::microseconds(1);
            }
        }
        state.last_created_at = Some(created_at);

        let inserted = rows
            .into_iter()
            .map(|row| {
                let id = Uuid::new_v4();
                state.rows.push(AccessCode {
                    id,
                    code_hash: row.code_hash,
                    plain_code: row.plain_code,
                    expires_at: row.expires_at,
                    max_uses: row.max_uses,
                    used_count: 0,
                    description: row.description,
                    created_at,
                });
                InsertedCode { id, created_at }
            })
            .collect();
        Ok(inserted)
    }
}

#[async_trait]
impl AccessCodeStore for InMemoryCodeStore {
    async fn insert_one(&self, row: NewAccessCode) -> Result<InsertedCode, DomainError> {
        let mut state = self.write()?;
        Self::insert_locked(&mut state, vec![row])?
            .pop()
            .ok_or_else(|| DomainError::Storage("insert returned no row".into()))
    }

    async fn insert_many(
        &self,
        rows: Vec<NewAccessCode>,
    ) -> Result<Vec<InsertedCode>, DomainError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let mut state = self.write()?;
        Self::insert_locked(&mut state, rows)
    }

    async fn update(&self, id: Uuid, patch: &AccessCodePatch) -> Result<AccessCode, DomainError> {
        if patch.is_empty() {
            return Err(ValidationError::NoFieldsToUpdate.into());
        }
        let mut state = self.write()?;
        let code = state
            .rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(DomainError::code_not_found)?;
        patch.apply_to(code);
        Ok(code.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let mut state = self.write()?;
        let before = state.rows.len();
        state.rows.retain(|r| r.id != id);
        if state.rows.len() == before {
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
        let state = self.read()?;
        let matching = Self::sorted(state.rows.iter().filter(|r| query.matches(r)).cloned());
        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn query_window(
        &self,
        query: &CodeQuery,
        cap: i64,
    ) -> Result<Vec<AccessCode>, DomainError> {
        let state = self.read()?;
        let mut rows = Self::sorted(state.rows.iter().filter(|r| query.matches(r)).cloned());
        rows.truncate(cap.max(0) as usize);
        Ok(rows)
    }

    async fn query_all(&self, cap: i64) -> Result<Vec<AccessCode>, DomainError> {
        let state = self.read()?;
        let mut rows = Self::sorted(state.rows.iter().cloned());
        rows.truncate(cap.max(0) as usize);
        Ok(rows)
    }

    async fn recent_created_at(&self, limit: i64) -> Result<Vec<DateTime<Utc>>, DomainError> {
        let rows = self.query_all(limit).await?;
        Ok(rows.into_iter().map(|r| r.created_at).collect())
    }

    async fn select_for_export(
        &self,
        selection: &ExportSelection,
        cap: i64,
    ) -> Result<Vec<AccessCode>, DomainError> {
        let state = self.read()?;
        let mut rows = Self::sorted(
            state
                .rows
                .iter()
                .filter(|r| selection.matches(r.created_at))
                .cloned(),
        );
        rows.truncate(cap.max(0) as usize);
        Ok(rows)
    }
}
