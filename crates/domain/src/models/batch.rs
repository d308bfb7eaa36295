//! Generation batches inferred from shared creation timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default number of batches returned by the aggregator.
pub const DEFAULT_BATCH_LIMIT: usize = 20;

/// Rows scanned per requested batch.
pub const BATCH_SCAN_FACTOR: usize = 20;

/// How a batch was most likely produced, judged by its size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchMode {
    Random,
    Custom,
}

impl BatchMode {
    /// A lone code is a custom code; anything larger came from bulk generation.
    pub fn from_count(count: usize) -> Self {
        if count > 1 {
            BatchMode::Random
        } else {
            BatchMode::Custom
        }
    }
}

/// One logical batch: every code sharing `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CodeBatchSummary {
    pub created_at: DateTime<Utc>,
    pub count: usize,
    pub mode: BatchMode,
}
