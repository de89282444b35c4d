//! Battery sample repository.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::entities::BatteryLevelEntity;
use crate::filter::Filter;
use crate::metrics::QueryTimer;
use domain::models::{BatteryLevelEntry, TelemetryQuery};

/// Postgres caps bind parameters per statement; three are bound per sample.
const INSERT_CHUNK: usize = 1000;

#[derive(Clone)]
pub struct BatteryRepository {
    pool: PgPool,
}

impl BatteryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Samples of the selected devices, newest first.
    pub async fn find(
        &self,
        query: &TelemetryQuery,
    ) -> Result<Vec<BatteryLevelEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_battery_samples");
        let filter = Filter::new()
            .text_in("id", &query.ids)
            .at_or_after(r#""timestamp""#, query.since);

        let mut builder =
            QueryBuilder::<Postgres>::new(r#"SELECT id, level, "timestamp" FROM battery"#);
        filter.push_where(&mut builder);
        builder.push(r#" ORDER BY "timestamp" DESC"#);

        let result = builder
            .build_query_as::<BatteryLevelEntity>()
            .fetch_all(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Appends samples in one transaction.
    pub async fn insert_batch(&self, samples: &[BatteryLevelEntry]) -> Result<u64, sqlx::Error> {
        if samples.is_empty() {
            return Ok(0);
        }

        let timer = QueryTimer::new("insert_battery_samples");
        let result = async {
            let mut tx = self.pool.begin().await?;
            let mut inserted = 0;
            for chunk in samples.chunks(INSERT_CHUNK) {
                let mut builder =
                    QueryBuilder::<Postgres>::new(r#"INSERT INTO battery (id, level, "timestamp") "#);
                builder.push_values(chunk, |mut b, sample| {
                    b.push_bind(&sample.id)
                        .push_bind(sample.level)
                        .push_bind(sample.timestamp);
                });
                inserted += builder.build().execute(&mut *tx).await?.rows_affected();
            }
            tx.commit().await?;
            Ok::<u64, sqlx::Error>(inserted)
        }
        .await;
        timer.finish(result)
    }

    /// Deletes samples taken before `before`.
    pub async fn delete_before(&self, before: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("prune_battery_samples");
        let result = sqlx::query(r#"DELETE FROM battery WHERE "timestamp" < $1"#)
            .bind(before)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected());
        timer.finish(result)
    }
}
