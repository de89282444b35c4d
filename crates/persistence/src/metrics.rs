//! Database metrics collection.

use metrics::{counter, gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Times one named query and records it as `database_query_duration_seconds`.
///
/// ```ignore
/// let timer = QueryTimer::new("load_devices");
/// let result = sqlx::query_as::<_, DeviceEntity>(...).fetch_all(&pool).await;
/// timer.finish(result)
/// ```
pub struct QueryTimer {
    query_name: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: &'static str) -> Self {
        Self {
            query_name,
            start: Instant::now(),
        }
    }

    /// Records the elapsed time.
    pub fn record(self) {
        histogram!(
            "database_query_duration_seconds",
            "query" => self.query_name
        )
        .record(self.start.elapsed().as_secs_f64());
    }

    /// Records the elapsed time and counts failures, passing the result through.
    pub fn finish<T, E>(self, result: Result<T, E>) -> Result<T, E> {
        if result.is_err() {
            counter!("database_query_errors_total", "query" => self.query_name).increment(1);
        }
        self.record();
        result
    }
}

/// Publishes connection pool gauges.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();

    gauge!("database_connections_active").set(size.saturating_sub(idle) as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
}
