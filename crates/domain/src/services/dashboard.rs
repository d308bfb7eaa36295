//! Dashboard aggregation over a bounded scan of recent codes.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use super::batches::group_batches;
use crate::error::DomainError;
use crate::models::{
    AccessCode, BatchMode, CodeStatus, DashboardGeneration, DashboardPayload, DashboardStats,
    RecentCode, TrendPoint, EXPIRING_SOON_DAYS, RECENT_CODES, TREND_DAYS,
};
use crate::repository::AccessCodeStore;

/// Percent of limited capacity consumed, rounded and capped at 100.
pub fn usage_rate(codes: &[AccessCode]) -> Option<u32> {
    let (used, max) = codes
        .iter()
        .filter(|c| !c.is_unlimited())
        .fold((0i64, 0i64), |(used, max), c| {
            (used + i64::from(c.used_count), max + i64::from(c.max_uses))
        });
    if max <= 0 {
        return None;
    }
    let rate = (used as f64 / max as f64 * 100.0).round();
    Some(rate.clamp(0.0, 100.0) as u32)
}

/// Daily creation counts for the trend window, oldest first, ending today.
pub fn creation_trend(codes: &[AccessCode], now: DateTime<Utc>) -> Vec<TrendPoint> {
    let mut points: Vec<TrendPoint> = (0..TREND_DAYS)
        .map(|i| TrendPoint {
            date: (now - Duration::days(TREND_DAYS - 1 - i)).date_naive(),
            count: 0,
        })
        .collect();

    for code in codes {
        let date = code.created_at.date_naive();
        if let Some(point) = points.iter_mut().find(|p| p.date == date) {
            point.count += 1;
        }
    }
    points
}

/// Builds the dashboard from at most `scan_cap` recent codes.
pub async fn build_dashboard(
    store: &dyn AccessCodeStore,
    scan_cap: i64,
    now: DateTime<Utc>,
) -> Result<DashboardPayload, DomainError> {
    let codes = store.query_all(scan_cap).await?;

    let mut batch_sizes: HashMap<DateTime<Utc>, usize> = HashMap::new();
    for code in &codes {
        *batch_sizes.entry(code.created_at).or_default() += 1;
    }
    let mode_of = |code: &AccessCode| {
        BatchMode::from_count(batch_sizes.get(&code.created_at).copied().unwrap_or(0))
    };

    let expiring_threshold = now + Duration::days(EXPIRING_SOON_DAYS);
    let active: Vec<&AccessCode> = codes
        .iter()
        .filter(|c| c.status_at(now) == CodeStatus::Active)
        .collect();
    let stats = DashboardStats {
        total: codes.len(),
        active: active.len(),
        expiring_soon: active
            .iter()
            .filter(|c| c.expires_at <= expiring_threshold)
            .count(),
        usage_rate: usage_rate(&codes),
    };

    let trend = creation_trend(&codes, now);

    let recent = codes
        .iter()
        .take(RECENT_CODES)
        .map(|code| RecentCode {
            id: code.id,
            display_code: code.display_code(),
            status: code.status_at(now),
            expires_at: code.expires_at,
            usage: code.usage(),
            description: code.description.clone(),
            mode: mode_of(code),
        })
        .collect();

    let timestamps: Vec<DateTime<Utc>> = codes.iter().map(|c| c.created_at).collect();
    let batches = group_batches(&timestamps);
    let window_start = now - Duration::days(TREND_DAYS - 1);
    let in_window = batches.iter().filter(|b| b.created_at >= window_start);
    let generation = DashboardGeneration {
        last_batch_at: batches.first().map(|b| b.created_at),
        last_batch_count: batches.first().map_or(0, |b| b.count),
        last_batch_mode: batches.first().map(|b| b.mode),
        batches_7d: in_window
            .clone()
            .filter(|b| b.mode == BatchMode::Random)
            .count(),
        customs_7d: in_window.filter(|b| b.mode == BatchMode::Custom).count(),
    };

    Ok(DashboardPayload {
        stats,
        trend,
        recent,
        generation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UNLIMITED_MAX_USES;
    use crate::repository::InMemoryCodeStore;
    use uuid::Uuid;

    fn code(
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        used_count: i32,
        max_uses: i32,
    ) -> AccessCode {
        AccessCode {
            id: Uuid::new_v4(),
            code_hash: "abcdefghijkl".to_string(),
            plain_code: None,
            expires_at,
            max_uses,
            used_count,
            description: None,
            created_at,
        }
    }

    #[test]
    fn test_usage_rate_ignores_unlimited() {
        let now = Utc::now();
        let codes = vec![
            code(now, now, 1, 4),
            code(now, now, 500, UNLIMITED_MAX_USES),
        ];
        assert_eq!(usage_rate(&codes), Some(25));
    }

    #[test]
    fn test_usage_rate_none_without_limited_codes() {
        let now = Utc::now();
        assert_eq!(usage_rate(&[]), None);
        assert_eq!(
            usage_rate(&[code(now, now, 3, UNLIMITED_MAX_USES)]),
            None
        );
    }

    #[test]
    fn test_usage_rate_capped_at_100() {
        let now = Utc::now();
        assert_eq!(usage_rate(&[code(now, now, 9, 3)]), Some(100));
    }

    #[test]
    fn test_trend_has_seven_days_ending_today() {
        let now = Utc::now();
        let codes = vec![
            code(now, now, 0, 1),
            code(now, now, 0, 1),
            code(now - Duration::days(2), now, 0, 1),
            code(now - Duration::days(30), now, 0, 1),
        ];
        let trend = creation_trend(&codes, now);

        assert_eq!(trend.len(), 7);
        assert_eq!(trend[6].date, now.date_naive());
        assert_eq!(trend[6].count, 2);
        assert_eq!(trend[4].count, 1);
        assert_eq!(trend.iter().map(|p| p.count).sum::<usize>(), 3);
    }

    #[tokio::test]
    async fn test_build_dashboard() {
        let now = Utc::now();
        let batch_at = now - Duration::hours(2);
        let custom_at = now - Duration::hours(1);
        let store = InMemoryCodeStore::new();
        store
            .seed(vec![
                code(batch_at, now + Duration::days(3), 0, 2),
                code(batch_at, now + Duration::days(3), 2, 2),
                code(batch_at, now + Duration::days(30), 0, 2),
                code(custom_at, now - Duration::days(1), 0, UNLIMITED_MAX_USES),
            ])
            .unwrap();

        let dashboard = build_dashboard(&store, 100, now).await.unwrap();

        assert_eq!(dashboard.stats.total, 4);
        assert_eq!(dashboard.stats.active, 2);
        assert_eq!(dashboard.stats.expiring_soon, 1);
        assert_eq!(dashboard.stats.usage_rate, Some(33));

        assert_eq!(dashboard.recent.len(), 4);
        assert_eq!(dashboard.recent[0].mode, BatchMode::Custom);
        assert_eq!(dashboard.recent[0].usage, "0/∞");
        assert_eq!(dashboard.recent[0].display_code, "abc****jkl");
        assert_eq!(dashboard.recent[1].mode, BatchMode::Random);

        assert_eq!(dashboard.generation.last_batch_at, Some(custom_at));
        assert_eq!(dashboard.generation.last_batch_count, 1);
        assert_eq!(dashboard.generation.last_batch_mode, Some(BatchMode::Custom));
        assert_eq!(dashboard.generation.batches_7d, 1);
        assert_eq!(dashboard.generation.customs_7d, 1);
    }

    #[tokio::test]
    async fn test_empty_dashboard() {
        let store = InMemoryCodeStore::new();
        let dashboard = build_dashboard(&store, 100, Utc::now()).await.unwrap();
        assert_eq!(dashboard.stats.total, 0);
        assert_eq!(dashboard.stats.usage_rate, None);
        assert_eq!(dashboard.trend.len(), 7);
        assert!(dashboard.recent.is_empty());
        assert_eq!(dashboard.generation.last_batch_at, None);
        assert_eq!(dashboard.generation.last_batch_count, 0);
    }
}
