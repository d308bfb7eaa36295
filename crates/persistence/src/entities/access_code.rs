//! Access code entity.

use chrono::{DateTime, Utc};
use domain::models::AccessCode;
use sqlx::FromRow;
use uuid::Uuid;

/// Database entity for the `access_codes` table.
#[derive(Debug, Clone, FromRow)]
pub struct AccessCodeEntity {
    pub id: Uuid,

    /// Argon2id PHC string.
    pub code_hash: String,

    /// Plaintext retained for operator display.
    pub plain_code: Option<String>,

    pub expires_at: DateTime<Utc>,

    /// Usage cap; the unlimited sentinel when uncapped.
    pub max_uses: i32,

    pub used_count: i32,

    pub description: Option<String>,

    /// Insert timestamp; shared by every row of one batch.
    pub created_at: DateTime<Utc>,
}

impl From<AccessCodeEntity> for AccessCode {
    fn from(entity: AccessCodeEntity) -> Self {
        Self {
            id: entity.id,
            code_hash: entity.code_hash,
            plain_code: entity.plain_code,
            expires_at: entity.expires_at,
            max_uses: entity.max_uses,
            used_count: entity.used_count,
            description: entity.description,
            created_at: entity.created_at,
        }
    }
}
