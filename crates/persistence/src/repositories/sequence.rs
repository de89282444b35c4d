//! Monotonic id counters.

use sqlx::{Executor, Postgres};

use crate::metrics::QueryTimer;

/// Increments the named counter and returns its previous value.
///
/// A single upsert, so concurrent callers serialize on the counter row. A fresh
/// counter yields 0. Runs on any executor so it can join an open transaction.
pub async fn next_id<'e, E>(executor: E, name: &str) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let timer = QueryTimer::new("next_sequence_id");
    let result = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO "reservationIds" (name, id)
        VALUES ($1, 1)
        ON CONFLICT (name) DO UPDATE SET id = "reservationIds".id + 1
        RETURNING id - 1
        "#,
    )
    .bind(name)
    .fetch_one(executor)
    .await;
    timer.finish(result)
}
