//! Access code service: the entry point callers use.

use std::sync::Arc;

use chrono::Utc;
use shared::hashing::CodeHasher;
use shared::validation::normalize_text;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::code_generator::{self, generate_batch};
use super::{batches, dashboard, export, listing};
use crate::error::{DomainError, ValidationError};
use crate::models::{
    AccessCodePatch, CodeBatchSummary, CodeFilters, CodeListResponse, CodeView,
    CreateCodeRequest, CreateCodeResult, CreateMode, DashboardPayload, ExportFile, ExportFormat,
    ExportOptions, NewAccessCode, UpdateCodeRequest, BULK_GENERATION_LIMIT, DASHBOARD_SCAN_CAP,
    DEFAULT_PAGE_SIZE, MAX_EXPORT_RECORDS, MAX_PAGE_SIZE, MIN_CUSTOM_CODE_LENGTH,
    UNLIMITED_MAX_USES,
};
use crate::repository::AccessCodeStore;

/// Attempts made to insert a random batch before a plaintext collision is
/// surfaced as a conflict.
pub const RANDOM_INSERT_ATTEMPTS: u32 = 3;

/// Rows fetched when filtering by derived status.
pub const STATUS_FILTER_FETCH_CAP: i64 = 1000;

/// Upper bound on the number of batches one call may return.
pub const MAX_BATCH_LIMIT: usize = 100;

/// Tunable bounds applied by the service.
#[derive(Debug, Clone)]
pub struct CodeLimits {
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub status_filter_fetch_cap: i64,
    pub bulk_generation_limit: u32,
    pub min_custom_code_length: usize,
    pub export_row_cap: i64,
    pub dashboard_scan_cap: i64,
    pub max_batch_limit: usize,
    /// Concurrent hashing tasks during bulk generation.
    pub hashing_parallelism: usize,
}

impl Default for CodeLimits {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            status_filter_fetch_cap: STATUS_FILTER_FETCH_CAP,
            bulk_generation_limit: BULK_GENERATION_LIMIT,
            min_custom_code_length: MIN_CUSTOM_CODE_LENGTH,
            export_row_cap: MAX_EXPORT_RECORDS,
            dashboard_scan_cap: DASHBOARD_SCAN_CAP,
            max_batch_limit: MAX_BATCH_LIMIT,
            hashing_parallelism: code_generator::default_parallelism(),
        }
    }
}

/// Absent, zero or negative caps mean unlimited; anything above the sentinel
/// is stored as the sentinel.
pub fn normalize_max_uses(max_uses: Option<i32>) -> i32 {
    match max_uses {
        Some(n) if n > 0 => n.min(UNLIMITED_MAX_USES),
        _ => UNLIMITED_MAX_USES,
    }
}

/// Trims and uppercases a custom code, enforcing the minimum length.
pub fn normalize_custom_code(
    raw: Option<&str>,
    min_length: usize,
) -> Result<String, ValidationError> {
    let code = raw.map(str::trim).unwrap_or_default().to_uppercase();
    if code.is_empty() {
        return Err(ValidationError::EmptyCustomCode);
    }
    if code.chars().count() < min_length {
        return Err(ValidationError::CustomCodeTooShort { min: min_length });
    }
    Ok(code)
}

/// Access code lifecycle and query operations over a store.
#[derive(Clone)]
pub struct AccessCodeService {
    store: Arc<dyn AccessCodeStore>,
    hasher: CodeHasher,
    limits: CodeLimits,
}

impl AccessCodeService {
    pub fn new(store: Arc<dyn AccessCodeStore>, hasher: CodeHasher, limits: CodeLimits) -> Self {
        Self {
            store,
            hasher,
            limits,
        }
    }

    pub fn limits(&self) -> &CodeLimits {
        &self.limits
    }

    pub async fn list_codes(&self, filters: &CodeFilters) -> Result<CodeListResponse, DomainError> {
        listing::list_codes(self.store.as_ref(), filters, &self.limits, Utc::now()).await
    }

    /// Creates one custom code or a batch of random codes.
    ///
    /// Every created row shares `batch_created_at`.
    pub async fn create_code(
        &self,
        request: CreateCodeRequest,
    ) -> Result<CreateCodeResult, DomainError> {
        request.validate()?;

        let max_uses = normalize_max_uses(request.max_uses);
        let description = normalize_text(request.description.as_deref());

        match request.mode {
            CreateMode::Custom => {
                let plain = normalize_custom_code(
                    request.plain_code.as_deref(),
                    self.limits.min_custom_code_length,
                )?;
                let code_hash = code_generator::hash_code(&self.hasher, &plain).await?;
                let inserted = self
                    .store
                    .insert_one(NewAccessCode {
                        code_hash,
                        plain_code: Some(plain.clone()),
                        expires_at: request.expires_at,
                        max_uses,
                        description,
                    })
                    .await?;

                info!(
                    code_id = %inserted.id,
                    max_uses,
                    "Custom access code created"
                );

                Ok(CreateCodeResult {
                    ids: vec![inserted.id],
                    plain_codes: vec![plain],
                    batch_created_at: inserted.created_at,
                })
            }
            CreateMode::Random => {
                let requested = request.quantity.unwrap_or(1);
                if requested < 1 {
                    return Err(ValidationError::QuantityOutOfRange.into());
                }
                let quantity = (requested as u32).min(self.limits.bulk_generation_limit) as usize;

                let mut attempt = 1;
                loop {
                    let plains = generate_batch(quantity);
                    let hashes = code_generator::hash_codes(
                        &self.hasher,
                        &plains,
                        self.limits.hashing_parallelism,
                    )
                    .await?;
                    let rows = plains
                        .iter()
                        .zip(hashes)
                        .map(|(plain, code_hash)| NewAccessCode {
                            code_hash,
                            plain_code: Some(plain.clone()),
                            expires_at: request.expires_at,
                            max_uses,
                            description: description.clone(),
                        })
                        .collect();

                    match self.store.insert_many(rows).await {
                        Ok(inserted) => {
                            let batch_created_at =
                                inserted.first().map(|c| c.created_at).ok_or_else(|| {
                                    DomainError::Storage("insert returned no rows".into())
                                })?;

                            info!(
                                count = inserted.len(),
                                requested,
                                max_uses,
                                batch_created_at = %batch_created_at,
                                "Random access codes created"
                            );

                            return Ok(CreateCodeResult {
                                ids: inserted.into_iter().map(|c| c.id).collect(),
                                plain_codes: plains,
                                batch_created_at,
                            });
                        }
                        Err(DomainError::Conflict(reason)) if attempt < RANDOM_INSERT_ATTEMPTS => {
                            warn!(
                                attempt,
                                reason = %reason,
                                "Generated code collided with an existing code; regenerating batch"
                            );
                            attempt += 1;
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }
    }

    /// Updates expiry, cap and description; returns the refreshed view.
    pub async fn update_code(
        &self,
        id: Uuid,
        request: UpdateCodeRequest,
    ) -> Result<CodeView, DomainError> {
        request.validate()?;

        if let Some(max_uses) = request.max_uses {
            if !(1..=UNLIMITED_MAX_USES).contains(&max_uses) {
                return Err(ValidationError::InvalidMaxUses {
                    max: UNLIMITED_MAX_USES,
                }
                .into());
            }
        }

        let patch = AccessCodePatch {
            expires_at: request.expires_at,
            max_uses: request.max_uses,
            description: request
                .description
                .as_deref()
                .map(|d| normalize_text(Some(d))),
        };
        if patch.is_empty() {
            return Err(ValidationError::NoFieldsToUpdate.into());
        }

        let code = self.store.update(id, &patch).await?;

        info!(
            code_id = %id,
            expires_at_changed = patch.expires_at.is_some(),
            max_uses_changed = patch.max_uses.is_some(),
            description_changed = patch.description.is_some(),
            "Access code updated"
        );

        Ok(CodeView::from_code(&code, Utc::now()))
    }

    pub async fn delete_code(&self, id: Uuid) -> Result<(), DomainError> {
        self.store.delete(id).await?;
        info!(code_id = %id, "Access code deleted");
        Ok(())
    }

    pub async fn list_recent_batches(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<CodeBatchSummary>, DomainError> {
        batches::list_recent_batches(self.store.as_ref(), limit, self.limits.max_batch_limit).await
    }

    /// Builds and renders an export on behalf of `operator`.
    pub async fn export_codes(
        &self,
        options: &ExportOptions,
        operator: &str,
        format: ExportFormat,
    ) -> Result<ExportFile, DomainError> {
        let now = Utc::now();
        let report =
            export::build_report(self.store.as_ref(), options, operator, &self.limits, now).await?;
        let file = export::render(&report, format, now)?;

        info!(
            operator = %operator,
            scope = options.scope.label(),
            content = options.content.label(),
            records = file.record_count,
            "Access codes exported"
        );

        Ok(file)
    }

    pub async fn dashboard(&self) -> Result<DashboardPayload, DomainError> {
        dashboard::build_dashboard(self.store.as_ref(), self.limits.dashboard_scan_cap, Utc::now())
            .await
    }
}
