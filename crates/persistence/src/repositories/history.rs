//! History (change journal) repository.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::entities::HistoryEntity;
use crate::filter::Filter;
use crate::metrics::QueryTimer;
use domain::models::{HistoryEntry, TelemetryQuery};

#[derive(Clone)]
pub struct HistoryRepository {
    pool: PgPool,
}

impl HistoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Journals one snapshot. Returns false if `(id, modified)` already exists.
    pub async fn insert(&self, entry: &HistoryEntry) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("insert_history_entry");
        let result = sqlx::query(
            r#"
            INSERT INTO history (id, level, loggedin_user, status, last_connection, modified, "timestamp")
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id, modified) DO NOTHING
            "#,
        )
        .bind(&entry.id)
        .bind(entry.level)
        .bind(&entry.loggedin_user)
        .bind(&entry.status)
        .bind(entry.last_connection)
        .bind(entry.modified)
        .bind(entry.timestamp)
        .execute(&self.pool)
        .await
        .map(|r| r.rows_affected() == 1);
        timer.finish(result)
    }

    /// Entries of the selected devices journaled at or after `since`, newest first.
    pub async fn find(&self, query: &TelemetryQuery) -> Result<Vec<HistoryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_history_entries");
        let filter = Filter::new()
            .text_in("id", &query.ids)
            .at_or_after(r#""timestamp""#, query.since);

        let mut builder = QueryBuilder::<Postgres>::new(
            r#"SELECT id, level, loggedin_user, status, last_connection, modified, "timestamp" FROM history"#,
        );
        filter.push_where(&mut builder);
        builder.push(r#" ORDER BY "timestamp" DESC, modified DESC"#);

        let result = builder
            .build_query_as::<HistoryEntity>()
            .fetch_all(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Deletes entries journaled before `before`.
    pub async fn delete_before(&self, before: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("prune_history");
        let result = sqlx::query(r#"DELETE FROM history WHERE "timestamp" < $1"#)
            .bind(before)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected());
        timer.finish(result)
    }
}
