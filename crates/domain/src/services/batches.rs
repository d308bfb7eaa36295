//! Batch aggregation.
//!
//! A batch is every code sharing one `created_at`; bulk inserts guarantee the
//! shared value. Batches are recovered by scanning recent timestamps.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::error::DomainError;
use crate::models::{BatchMode, CodeBatchSummary, BATCH_SCAN_FACTOR, DEFAULT_BATCH_LIMIT};
use crate::repository::AccessCodeStore;

/// Groups timestamps into batches, newest first.
pub fn group_batches(timestamps: &[DateTime<Utc>]) -> Vec<CodeBatchSummary> {
    let mut counts: BTreeMap<DateTime<Utc>, usize> = BTreeMap::new();
    for ts in timestamps {
        *counts.entry(*ts).or_default() += 1;
    }
    counts
        .into_iter()
        .rev()
        .map(|(created_at, count)| CodeBatchSummary {
            created_at,
            count,
            mode: BatchMode::from_count(count),
        })
        .collect()
}

/// Returns up to `limit` of the most recent batches.
///
/// Only the `limit * BATCH_SCAN_FACTOR` newest rows are scanned, so a batch
/// straddling the scan boundary may be undercounted.
pub async fn list_recent_batches(
    store: &dyn AccessCodeStore,
    limit: Option<usize>,
    max_limit: usize,
) -> Result<Vec<CodeBatchSummary>, DomainError> {
    let limit = limit.unwrap_or(DEFAULT_BATCH_LIMIT).clamp(1, max_limit.max(1));
    let scan = (limit * BATCH_SCAN_FACTOR) as i64;

    let timestamps = store.recent_created_at(scan).await?;
    let mut batches = group_batches(&timestamps);
    batches.truncate(limit);
    Ok(batches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccessCode;
    use crate::repository::InMemoryCodeStore;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn row(created_at: DateTime<Utc>) -> AccessCode {
        AccessCode {
            id: Uuid::new_v4(),
            code_hash: "hash".to_string(),
            plain_code: None,
            expires_at: created_at + Duration::days(1),
            max_uses: 1,
            used_count: 0,
            description: None,
            created_at,
        }
    }

    #[test]
    fn test_group_batches_newest_first() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let t1 = t0 + Duration::microseconds(1);
        let batches = group_batches(&[t0, t0, t1, t0]);

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].created_at, t1);
        assert_eq!(batches[0].count, 1);
        assert_eq!(batches[0].mode, BatchMode::Custom);
        assert_eq!(batches[1].count, 3);
        assert_eq!(batches[1].mode, BatchMode::Random);
    }

    #[test]
    fn test_group_batches_empty() {
        assert!(group_batches(&[]).is_empty());
    }

    #[tokio::test]
    async fn test_limit_truncates_and_clamps() {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let store = InMemoryCodeStore::new();
        store
            .seed((0..5).map(|i| row(base + Duration::minutes(i))))
            .unwrap();

        let two = list_recent_batches(&store, Some(2), 100).await.unwrap();
        assert_eq!(two.len(), 2);
        assert_eq!(two[0].created_at, base + Duration::minutes(4));

        let zero = list_recent_batches(&store, Some(0), 100).await.unwrap();
        assert_eq!(zero.len(), 1);
    }

    #[tokio::test]
    async fn test_scan_window_bounds_rows_considered() {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let store = InMemoryCodeStore::new();
        // one batch of 30 rows; a limit of 1 scans only 20 of them
        store.seed((0..30).map(|_| row(base))).unwrap();

        let batches = list_recent_batches(&store, Some(1), 100).await.unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].count, 20);
    }
}
