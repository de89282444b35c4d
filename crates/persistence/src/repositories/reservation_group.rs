//! Reservation group repository.

use sqlx::PgPool;

use crate::entities::ReservationGroupEntity;
use crate::metrics::QueryTimer;
use crate::repositories::sequence;
use domain::models::GROUP_COUNTER;

#[derive(Clone)]
pub struct ReservationGroupRepository {
    pool: PgPool,
}

impl ReservationGroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Groups owned by the participant, in id order.
    pub async fn list_by_participant(
        &self,
        participant: &str,
    ) -> Result<Vec<ReservationGroupEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_reservation_groups");
        let result = sqlx::query_as::<_, ReservationGroupEntity>(
            r#"
            SELECT id, name, participant
            FROM "reservationGroups"
            WHERE participant = $1
            ORDER BY id ASC
            "#,
        )
        .bind(participant)
        .fetch_all(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Creates a group with the next id of the group counter.
    pub async fn create(
        &self,
        name: &str,
        participant: &str,
    ) -> Result<ReservationGroupEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_reservation_group");
        let result = async {
            let mut tx = self.pool.begin().await?;
            let id = sequence::next_id(&mut *tx, GROUP_COUNTER).await?;
            let group = sqlx::query_as::<_, ReservationGroupEntity>(
                r#"
                INSERT INTO "reservationGroups" (id, name, participant)
                VALUES ($1, $2, $3)
                RETURNING id, name, participant
                "#,
            )
            .bind(id)
            .bind(name)
            .bind(participant)
            .fetch_one(&mut *tx)
            .await?;
            tx.commit().await?;
            Ok::<ReservationGroupEntity, sqlx::Error>(group)
        }
        .await;
        timer.finish(result)
    }

    /// Renames a group. Returns `None` if the participant owns no group with that id.
    pub async fn update(
        &self,
        id: i64,
        name: &str,
        participant: &str,
    ) -> Result<Option<ReservationGroupEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_reservation_group");
        let result = sqlx::query_as::<_, ReservationGroupEntity>(
            r#"
            UPDATE "reservationGroups"
            SET name = $2
            WHERE id = $1 AND participant = $3
            RETURNING id, name, participant
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(participant)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result)
    }

    pub async fn delete(&self, id: i64, participant: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_reservation_group");
        let result = sqlx::query(
            r#"DELETE FROM "reservationGroups" WHERE id = $1 AND participant = $2"#,
        )
        .bind(id)
        .bind(participant)
        .execute(&self.pool)
        .await
        .map(|r| r.rows_affected() > 0);
        timer.finish(result)
    }
}
