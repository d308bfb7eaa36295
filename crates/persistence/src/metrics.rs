//! Repository query timing and pool gauges.
//!
//! Values go to whichever `metrics` recorder the binary installs.

use ::metrics::{gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Publishes pool size, idle and in-use connection counts.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();

    gauge!("access_codes_db_connections_active").set(size.saturating_sub(idle) as f64);
    gauge!("access_codes_db_connections_idle").set(idle as f64);
    gauge!("access_codes_db_connections_total").set(size as f64);
}

/// Times one repository query into `access_codes_query_duration_seconds{query}`.
///
/// ```ignore
/// let timer = QueryTimer::new("query_page");
/// let result = builder.fetch_all(&pool).await;
/// timer.record();
/// ```
pub struct QueryTimer {
    query: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query: &'static str) -> Self {
        Self {
            query,
            start: Instant::now(),
        }
    }

    pub fn record(self) {
        histogram!("access_codes_query_duration_seconds", "query" => self.query)
            .record(self.start.elapsed().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_timer_keeps_query_label() {
        let timer = QueryTimer::new("insert_many");
        assert_eq!(timer.query, "insert_many");
    }

    #[test]
    fn test_query_timer_records_without_recorder() {
        QueryTimer::new("query_window").record();
    }
}
