//! Access code domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::status::derive_status;

/// Reserved `max_uses` value meaning "no usage cap".
///
/// Any stored value at or above the sentinel is treated as unlimited for display.
pub const UNLIMITED_MAX_USES: i32 = 999_999;

/// Label rendered in place of the cap for unlimited codes.
pub const UNLIMITED_LABEL: &str = "∞";

/// Access code as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AccessCode {
    pub id: Uuid,
    pub code_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plain_code: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub max_uses: i32,
    pub used_count: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AccessCode {
    /// Status at the given instant.
    pub fn status_at(&self, now: DateTime<Utc>) -> CodeStatus {
        derive_status(Some(self.expires_at), self.used_count, self.max_uses, now)
    }

    pub fn is_unlimited(&self) -> bool {
        self.max_uses >= UNLIMITED_MAX_USES
    }

    /// `"<used>/<max>"`, with `∞` for unlimited codes.
    pub fn usage(&self) -> String {
        usage_label(self.used_count, self.max_uses)
    }

    /// Plaintext when retained, otherwise the masked hash.
    pub fn display_code(&self) -> String {
        match self.plain_code.as_deref().map(str::trim) {
            Some(plain) if !plain.is_empty() => plain.to_string(),
            _ => mask_hash(&self.code_hash),
        }
    }

    /// Value written to exports: plaintext when retained, else the raw hash.
    pub fn export_code(&self) -> &str {
        self.plain_code.as_deref().unwrap_or(&self.code_hash)
    }
}

/// Derived code status. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeStatus {
    Active,
    Inactive,
}

impl CodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeStatus::Active => "active",
            CodeStatus::Inactive => "inactive",
        }
    }
}

impl std::fmt::Display for CodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row to insert. `id`, `used_count` and `created_at` are assigned by storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccessCode {
    pub code_hash: String,
    pub plain_code: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub max_uses: i32,
    pub description: Option<String>,
}

/// Identity assigned to an inserted row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct InsertedCode {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Partial update. Only expiry, cap and description are mutable.
///
/// `description: Some(None)` clears the column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessCodePatch {
    pub expires_at: Option<DateTime<Utc>>,
    pub max_uses: Option<i32>,
    pub description: Option<Option<String>>,
}

impl AccessCodePatch {
    pub fn is_empty(&self) -> bool {
        self.expires_at.is_none() && self.max_uses.is_none() && self.description.is_none()
    }

    /// Applies the patch in place; used by in-memory stores.
    pub fn apply_to(&self, code: &mut AccessCode) {
        if let Some(expires_at) = self.expires_at {
            code.expires_at = expires_at;
        }
        if let Some(max_uses) = self.max_uses {
            code.max_uses = max_uses;
        }
        if let Some(description) = &self.description {
            code.description = description.clone();
        }
    }
}

/// Caller-facing view of a code, with derived fields computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CodeView {
    pub id: Uuid,
    pub display_code: String,
    pub status: CodeStatus,
    pub expires_at: DateTime<Utc>,
    pub usage: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CodeView {
    pub fn from_code(code: &AccessCode, now: DateTime<Utc>) -> Self {
        Self {
            id: code.id,
            display_code: code.display_code(),
            status: code.status_at(now),
            expires_at: code.expires_at,
            usage: code.usage(),
            description: code.description.clone(),
            created_at: code.created_at,
        }
    }
}

/// Renders `"<used>/<max>"`, substituting `∞` at or above the sentinel.
pub fn usage_label(used_count: i32, max_uses: i32) -> String {
    if max_uses >= UNLIMITED_MAX_USES {
        format!("{}/{}", used_count, UNLIMITED_LABEL)
    } else {
        format!("{}/{}", used_count, max_uses)
    }
}

/// Masks a stored hash as `abc****xyz` for display.
pub fn mask_hash(hash: &str) -> String {
    let chars: Vec<char> = hash.chars().collect();
    let head: String = chars.iter().take(3).collect();
    let tail: String = chars[chars.len().saturating_sub(3)..].iter().collect();
    format!("{}****{}", head, tail)
}
