use sqlx::PgPool;
use std::sync::Arc;

use domain::services::AccessCodeService;
use persistence::PgAccessCodeRepository;

use crate::config::Config;
use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub codes: AccessCodeService,
}

impl AppState {
    /// Operator identity for this call: the explicit value, else the configured default.
    pub fn operator(&self, explicit: Option<&str>) -> String {
        shared::validation::normalize_text(explicit)
            .unwrap_or_else(|| self.config.operator.default_identity.clone())
    }
}

/// Wires the PostgreSQL repository and hasher into the access code service.
pub fn create_app(config: Config, pool: PgPool) -> Result<AppState, ApiError> {
    let config = Arc::new(config);

    let hasher = config
        .hashing
        .build_hasher()
        .map_err(|e| ApiError::Internal(format!("Invalid hashing configuration: {}", e)))?;
    let repository = PgAccessCodeRepository::new(pool.clone());
    let codes = AccessCodeService::new(Arc::new(repository), hasher, config.code_limits());

    Ok(AppState {
        pool,
        config,
        codes,
    })
}
