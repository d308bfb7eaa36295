//! Dashboard summary models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::access_code::CodeStatus;
use super::batch::BatchMode;

/// Rows scanned to build the dashboard.
pub const DASHBOARD_SCAN_CAP: i64 = 10_000;

/// Days counted as "expiring soon".
pub const EXPIRING_SOON_DAYS: i64 = 7;

/// Length of the creation trend, in days, ending today.
pub const TREND_DAYS: i64 = 7;

/// Number of recent codes shown.
pub const RECENT_CODES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DashboardStats {
    pub total: usize,
    pub active: usize,
    pub expiring_soon: usize,
    /// Percent of limited capacity consumed; `None` without limited codes.
    pub usage_rate: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RecentCode {
    pub id: Uuid,
    pub display_code: String,
    pub status: CodeStatus,
    pub expires_at: DateTime<Utc>,
    pub usage: String,
    pub description: Option<String>,
    pub mode: BatchMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DashboardGeneration {
    pub last_batch_at: Option<DateTime<Utc>>,
    pub last_batch_count: usize,
    pub last_batch_mode: Option<BatchMode>,
    /// Random batches created in the trend window.
    pub batches_7d: usize,
    /// Custom codes created in the trend window.
    pub customs_7d: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DashboardPayload {
    pub stats: DashboardStats,
    pub trend: Vec<TrendPoint>,
    pub recent: Vec<RecentCode>,
    pub generation: DashboardGeneration,
}
