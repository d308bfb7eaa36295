//! Prometheus recorder for repository query and pool metrics.
//!
//! The CLI is short-lived, so instead of serving `/metrics` the rendered
//! snapshot is written to a file after the command finishes.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sqlx::PgPool;

use crate::error::ApiError;

/// Histogram buckets for query durations, in seconds.
const QUERY_DURATION_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0];

fn builder() -> Result<PrometheusBuilder, ApiError> {
    PrometheusBuilder::new()
        .set_buckets(QUERY_DURATION_BUCKETS)
        .map_err(|e| ApiError::Internal(format!("Invalid histogram buckets: {}", e)))
}

/// Installs the global Prometheus recorder.
///
/// Must be called once, before the pool is created, so every query is timed.
pub fn init_metrics() -> Result<PrometheusHandle, ApiError> {
    builder()?
        .install_recorder()
        .map_err(|e| ApiError::Internal(format!("Failed to install Prometheus recorder: {}", e)))
}

/// Records current pool gauges and renders everything in Prometheus text format.
pub fn render_snapshot(handle: &PrometheusHandle, pool: &PgPool) -> String {
    persistence::metrics::record_pool_metrics(pool);
    handle.render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use persistence::metrics::QueryTimer;
    use sqlx::postgres::PgPoolOptions;

    #[tokio::test]
    async fn test_snapshot_contains_query_histogram_and_pool_gauges() {
        let recorder = builder().unwrap().build_recorder();
        let handle = recorder.handle();
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/access_codes_metrics")
            .unwrap();

        let rendered = ::metrics::with_local_recorder(&recorder, || {
            QueryTimer::new("query_page").record();
            QueryTimer::new("query_page").record();
            render_snapshot(&handle, &pool)
        });

        assert!(rendered.contains("access_codes_query_duration_seconds_bucket"));
        assert!(rendered
            .contains("access_codes_query_duration_seconds_count{query=\"query_page\"} 2"));
        assert!(rendered.contains("access_codes_db_connections_total "));
        assert!(rendered.contains("access_codes_db_connections_idle "));
    }

    #[test]
    fn test_snapshot_is_empty_without_recorded_metrics() {
        let recorder = builder().unwrap().build_recorder();
        assert!(recorder.handle().render().trim().is_empty());
    }
}
