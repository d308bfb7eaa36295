//! Filtered, paginated listing of access codes.
//!
//! Filters on stored columns are pushed down to storage. Status is derived,
//! so a concrete status filter fetches a bounded window of the most recent
//! matching rows, filters it in memory, and paginates the result. Totals on
//! that path count matches inside the window only.

use chrono::{DateTime, Utc};
use shared::pagination::PageRequest;
use tracing::{debug, warn};

use super::codes::CodeLimits;
use crate::error::{DomainError, ValidationError};
use crate::models::{CodeFilters, CodeListResponse, CodeView};
use crate::repository::{AccessCodeStore, CodeQuery};

/// Lists codes matching `filters`, newest first.
pub async fn list_codes(
    store: &dyn AccessCodeStore,
    filters: &CodeFilters,
    limits: &CodeLimits,
    now: DateTime<Utc>,
) -> Result<CodeListResponse, DomainError> {
    shared::validation::validate_time_range(filters.expires_from, filters.expires_to)
        .map_err(ValidationError::from_range)?;

    let page = PageRequest::resolve(
        filters.page,
        filters.page_size,
        limits.default_page_size,
        limits.max_page_size,
    );
    let query = CodeQuery::from_filters(filters);

    let (items, total) = match filters.status.as_status() {
        None => {
            let (rows, total) = store.query_page(&query, page.limit(), page.offset()).await?;
            let items = rows.iter().map(|c| CodeView::from_code(c, now)).collect();
            (items, total)
        }
        Some(status) => {
            let cap = limits.status_filter_fetch_cap;
            let window = store.query_window(&query, cap).await?;
            if window.len() as i64 >= cap {
                warn!(
                    cap,
                    status = %status,
                    "Status filter window is full; totals may be truncated"
                );
            }

            let matching: Vec<CodeView> = window
                .iter()
                .filter(|c| c.status_at(now) == status)
                .map(|c| CodeView::from_code(c, now))
                .collect();
            let total = matching.len() as i64;
            (page.slice(matching), total)
        }
    };

    debug!(
        page = page.page,
        page_size = page.page_size,
        status = ?filters.status,
        total,
        "Listed access codes"
    );

    Ok(CodeListResponse {
        items,
        total,
        page: page.page,
        page_size: page.page_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccessCode, CodeStatus, StatusFilter};
    use crate::repository::InMemoryCodeStore;
    use chrono::Duration;
    use uuid::Uuid;

    fn code(offset_secs: i64, expires_in: Duration, description: &str) -> AccessCode {
        let now = Utc::now();
        AccessCode {
            id: Uuid::new_v4(),
            code_hash: format!("hash-{}", offset_secs),
            plain_code: None,
            expires_at: now + expires_in,
            max_uses: 5,
            used_count: 0,
            description: Some(description.to_string()),
            created_at: now - Duration::seconds(offset_secs),
        }
    }

    fn store_with(rows: Vec<AccessCode>) -> InMemoryCodeStore {
        let store = InMemoryCodeStore::new();
        store.seed(rows).unwrap();
        store
    }

    #[tokio::test]
    async fn test_unfiltered_listing_paginates() {
        let store = store_with(
            (0..25)
                .map(|i| code(i, Duration::days(1), "bulk"))
                .collect(),
        );
        let limits = CodeLimits::default();
        let now = Utc::now();

        let first = list_codes(&store, &CodeFilters::default(), &limits, now)
            .await
            .unwrap();
        assert_eq!(first.items.len(), 20);
        assert_eq!(first.total, 25);
        assert_eq!(first.page, 1);
        assert_eq!(first.page_size, 20);

        let filters = CodeFilters {
            page: Some(2),
            ..Default::default()
        };
        let second = list_codes(&store, &filters, &limits, now).await.unwrap();
        assert_eq!(second.items.len(), 5);
        assert_eq!(second.total, 25);
    }

    #[tokio::test]
    async fn test_status_filter_counts_matches_only() {
        let mut rows: Vec<AccessCode> = (0..3)
            .map(|i| code(i, Duration::days(1), "live"))
            .collect();
        rows.extend((3..5).map(|i| code(i, -Duration::days(1), "expired")));
        let store = store_with(rows);

        let filters = CodeFilters {
            page_size: Some(10),
            status: StatusFilter::Active,
            ..Default::default()
        };
        let response = list_codes(&store, &filters, &CodeLimits::default(), Utc::now())
            .await
            .unwrap();

        assert_eq!(response.items.len(), 3);
        assert_eq!(response.total, 3);
        assert!(response
            .items
            .iter()
            .all(|item| item.status == CodeStatus::Active));
    }

    #[tokio::test]
    async fn test_inactive_filter_includes_exhausted() {
        let mut exhausted = code(0, Duration::days(1), "used up");
        exhausted.used_count = 5;
        let store = store_with(vec![exhausted, code(1, Duration::days(1), "fresh")]);

        let filters = CodeFilters {
            status: StatusFilter::Inactive,
            ..Default::default()
        };
        let response = list_codes(&store, &filters, &CodeLimits::default(), Utc::now())
            .await
            .unwrap();
        assert_eq!(response.total, 1);
        assert_eq!(response.items[0].description.as_deref(), Some("used up"));
    }

    #[tokio::test]
    async fn test_status_filter_is_bounded_by_window() {
        let store = store_with(
            (0..8)
                .map(|i| code(i, Duration::days(1), "live"))
                .collect(),
        );
        let limits = CodeLimits {
            status_filter_fetch_cap: 5,
            ..Default::default()
        };
        let filters = CodeFilters {
            status: StatusFilter::Active,
            ..Default::default()
        };
        let response = list_codes(&store, &filters, &limits, Utc::now())
            .await
            .unwrap();
        assert_eq!(response.total, 5);
    }

    #[tokio::test]
    async fn test_search_and_page_size_clamp() {
        let mut rows: Vec<AccessCode> = (0..60)
            .map(|i| code(i, Duration::days(1), "Spring Promo"))
            .collect();
        rows.push(code(61, Duration::days(1), "staff"));
        let store = store_with(rows);

        let filters = CodeFilters {
            page_size: Some(500),
            search: Some("promo".to_string()),
            ..Default::default()
        };
        let response = list_codes(&store, &filters, &CodeLimits::default(), Utc::now())
            .await
            .unwrap();
        assert_eq!(response.page_size, 50);
        assert_eq!(response.items.len(), 50);
        assert_eq!(response.total, 60);
    }

    #[tokio::test]
    async fn test_ordering_is_newest_first() {
        let store = store_with(vec![
            code(30, Duration::days(1), "old"),
            code(0, Duration::days(1), "new"),
        ]);
        let response = list_codes(
            &store,
            &CodeFilters::default(),
            &CodeLimits::default(),
            Utc::now(),
        )
        .await
        .unwrap();
        assert_eq!(response.items[0].description.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_inverted_expiry_range_rejected() {
        let store = InMemoryCodeStore::new();
        let now = Utc::now();
        let filters = CodeFilters {
            expires_from: Some(now),
            expires_to: Some(now - Duration::days(1)),
            ..Default::default()
        };
        let result = list_codes(&store, &filters, &CodeLimits::default(), now).await;
        assert!(matches!(
            result,
            Err(DomainError::Validation(ValidationError::InvalidRange(_)))
        ));
    }
}
