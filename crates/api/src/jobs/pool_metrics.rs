//! Connection pool gauges.

use sqlx::PgPool;
use tracing::warn;

use super::scheduler::{Job, JobFrequency};

/// Publishes pool gauges and warns while every connection is checked out.
///
/// The device sync and the request handlers share one pool, so saturation shows up
/// here before it shows up as request timeouts.
pub struct PoolMetricsJob {
    pool: PgPool,
}

impl PoolMetricsJob {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_saturated(size: u32, idle: usize, max: u32) -> bool {
    size >= max && idle == 0
}

#[async_trait::async_trait]
impl Job for PoolMetricsJob {
    fn name(&self) -> &'static str {
        "pool_metrics"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(10)
    }

    async fn execute(&self) -> Result<(), String> {
        persistence::metrics::record_pool_metrics(&self.pool);

        let max = self.pool.options().get_max_connections();
        if is_saturated(self.pool.size(), self.pool.num_idle(), max) {
            warn!(max_connections = max, "Database pool saturated");
        }
        Ok(())
    }
}
