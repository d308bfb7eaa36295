//! Listing filters and responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::access_code::{CodeStatus, CodeView};

/// Default number of codes per page.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Hard upper bound on page size.
pub const MAX_PAGE_SIZE: u32 = 50;

/// Status filter. `All` is the only value that can be pushed to storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl StatusFilter {
    /// The concrete status to match, or `None` for `All`.
    pub fn as_status(&self) -> Option<CodeStatus> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Active => Some(CodeStatus::Active),
            StatusFilter::Inactive => Some(CodeStatus::Inactive),
        }
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Active),
            "inactive" => Ok(StatusFilter::Inactive),
            other => Err(format!("unknown status filter: {}", other)),
        }
    }
}

/// Caller-supplied listing filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CodeFilters {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
    /// Case-insensitive substring match on description.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: StatusFilter,
    #[serde(default)]
    pub expires_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_to: Option<DateTime<Utc>>,
}

/// Page of codes.
///
/// With a concrete status filter, `total` counts matches inside the bounded
/// fetch window only, not across the whole table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CodeListResponse {
    pub items: Vec<CodeView>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}
