//! Create and update requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Maximum number of codes generated by one random-mode request.
pub const BULK_GENERATION_LIMIT: u32 = 100;

/// Minimum length of a custom plaintext code, after trimming.
pub const MIN_CUSTOM_CODE_LENGTH: usize = 6;

/// How the plaintext is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreateMode {
    Random,
    Custom,
}

/// Request to create one custom code or a batch of random codes.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateCodeRequest {
    pub mode: CreateMode,
    /// Random mode only. Defaults to 1; clamped to the bulk limit.
    #[serde(default)]
    pub quantity: Option<i32>,
    /// Custom mode only. Trimmed and uppercased before storage.
    #[serde(default)]
    pub plain_code: Option<String>,
    pub expires_at: DateTime<Utc>,
    /// Absent or non-positive means unlimited.
    #[serde(default)]
    pub max_uses: Option<i32>,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    #[serde(default)]
    pub description: Option<String>,
}

/// Result of a create call. All ids share `batch_created_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CreateCodeResult {
    pub ids: Vec<Uuid>,
    pub plain_codes: Vec<String>,
    pub batch_created_at: DateTime<Utc>,
}

/// Partial update of a code.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateCodeRequest {
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_uses: Option<i32>,
    /// A blank description clears the stored value.
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    #[serde(default)]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_create_request_deserialize_minimal() {
        let json = r#"{"mode":"random","expires_at":"2030-01-01T00:00:00Z"}"#;
        let request: CreateCodeRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.mode, CreateMode::Random);
        assert!(request.quantity.is_none());
        assert!(request.max_uses.is_none());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_create_request_description_too_long() {
        let request = CreateCodeRequest {
            mode: CreateMode::Custom,
            quantity: None,
            plain_code: Some("WELCOME2030".to_string()),
            expires_at: Utc::now() + Duration::days(1),
            max_uses: Some(5),
            description: Some("x".repeat(501)),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_request_rejects_invalid_timestamp() {
        let json = r#"{"mode":"custom","expires_at":"tomorrow"}"#;
        assert!(serde_json::from_str::<CreateCodeRequest>(json).is_err());
    }

    #[test]
    fn test_update_request_default_is_empty() {
        let request: UpdateCodeRequest = serde_json::from_str("{}").unwrap();
        assert!(request.expires_at.is_none());
        assert!(request.max_uses.is_none());
        assert!(request.description.is_none());
    }
}
