//! Reservation repository.
//!
//! Reservations live in two relations with the same shape: `reservations` (current
//! horizon) and `reservationHistory` (long horizon). Every write goes to both.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use crate::entities::{ReservationEntity, ReservationUnitEntity};
use crate::filter::Filter;
use crate::metrics::QueryTimer;
use crate::repositories::sequence;
use domain::models::{
    Reservation, ReservationDraft, ReservationHorizon, ReservationScope, Slot,
    RESERVATION_COUNTER,
};
use domain::ports::ReservationPruneReport;

const CURRENT_TABLE: &str = "reservations";
const HISTORY_TABLE: &str = "reservationHistory";

fn table(horizon: ReservationHorizon) -> &'static str {
    match horizon {
        ReservationHorizon::Current => CURRENT_TABLE,
        ReservationHorizon::History => HISTORY_TABLE,
    }
}

/// Reservation columns plus the groups and pin flag aggregated from its units.
fn select_reservations(table: &str) -> String {
    format!(
        r#"SELECT r.id, r."groupID" AS group_id, r."timetableID" AS timetable_id, r.participant,
                  r.date, r.priority_level, r.priority_description, r.created, r.modified,
                  COALESCE(ARRAY_AGG(u.ipad_group ORDER BY u.ipad_group)
                           FILTER (WHERE u.ipad_group IS NOT NULL), '{{}}') AS ipad_groups,
                  COALESCE(BOOL_OR(u.is_pinned), FALSE) AS is_pinned
           FROM "{table}" r
           LEFT JOIN "reservationUnits" u ON u.reservation_id = r.id"#
    )
}

#[derive(Clone)]
pub struct ReservationRepository {
    pool: PgPool,
}

impl ReservationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Finds a reservation in the current horizon.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<ReservationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_reservation_by_id");
        let mut builder = QueryBuilder::<Postgres>::new(select_reservations(CURRENT_TABLE));
        builder.push(" WHERE r.id = ").push_bind(id);
        builder.push(" GROUP BY r.id");
        let result = builder
            .build_query_as::<ReservationEntity>()
            .fetch_optional(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Lists reservations of one horizon, ordered by slot date.
    pub async fn list(
        &self,
        horizon: ReservationHorizon,
        scope: &ReservationScope,
    ) -> Result<Vec<ReservationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_reservations");
        let filter = match scope {
            ReservationScope::All => Filter::new(),
            ReservationScope::Participant(participant) => {
                Filter::new().text_eq("r.participant", participant.clone())
            }
            ReservationScope::ResourceGroup(group) => Filter::new().occupies_group("r.id", *group),
        };

        let mut builder = QueryBuilder::<Postgres>::new(select_reservations(table(horizon)));
        filter.push_where(&mut builder);
        builder.push(" GROUP BY r.id ORDER BY r.date ASC, r.id ASC");
        let result = builder
            .build_query_as::<ReservationEntity>()
            .fetch_all(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Occupancy rows of one slot.
    pub async fn units_for_slot(&self, slot: Slot) -> Result<Vec<ReservationUnitEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_reservation_units");
        let result = sqlx::query_as::<_, ReservationUnitEntity>(
            r#"
            SELECT reservation_date, unit, ipad_group, is_pinned, reservation_id
            FROM "reservationUnits"
            WHERE reservation_date = $1 AND unit = $2
            ORDER BY ipad_group ASC
            "#,
        )
        .bind(slot.date)
        .bind(slot.unit)
        .fetch_all(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Writes a reservation, its units and, for creations, its new id atomically.
    ///
    /// The units are inserted without conflict handling, so a group another
    /// reservation claimed in the meantime fails the whole transaction with a
    /// unique violation.
    pub async fn commit(&self, draft: &ReservationDraft) -> Result<Reservation, sqlx::Error> {
        let timer = QueryTimer::new("commit_reservation");
        let result = async {
            let mut tx = self.pool.begin().await?;

            let id = match draft.id {
                Some(id) => id,
                None => sequence::next_id(&mut *tx, RESERVATION_COUNTER).await?,
            };
            let mut reservation = draft.reservation.clone();
            reservation.id = id;

            delete_units(&mut tx, id).await?;
            insert_units(&mut tx, &reservation, draft.slot).await?;
            for table in [CURRENT_TABLE, HISTORY_TABLE] {
                upsert_reservation(&mut tx, table, &reservation).await?;
            }

            tx.commit().await?;
            Ok::<Reservation, sqlx::Error>(reservation)
        }
        .await;
        timer.finish(result)
    }

    /// Deletes a reservation from both horizons along with its units.
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_reservation");
        let result = async {
            let mut tx = self.pool.begin().await?;
            delete_units(&mut tx, id).await?;
            let mut removed = 0;
            for table in [CURRENT_TABLE, HISTORY_TABLE] {
                removed += sqlx::query(&format!(r#"DELETE FROM "{table}" WHERE id = $1"#))
                    .bind(id)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();
            }
            tx.commit().await?;
            Ok::<bool, sqlx::Error>(removed > 0)
        }
        .await;
        timer.finish(result)
    }

    /// Applies the retention horizons. Each relation is pruned independently.
    pub async fn prune(
        &self,
        current_before: DateTime<Utc>,
        history_before: DateTime<Utc>,
        units_before: NaiveDate,
    ) -> Result<ReservationPruneReport, sqlx::Error> {
        let timer = QueryTimer::new("prune_reservations");
        let result = async {
            let current = self.delete_dated_before(CURRENT_TABLE, current_before).await?;
            let history = self.delete_dated_before(HISTORY_TABLE, history_before).await?;
            let units = sqlx::query(r#"DELETE FROM "reservationUnits" WHERE reservation_date < $1"#)
                .bind(units_before)
                .execute(&self.pool)
                .await?
                .rows_affected();
            Ok::<ReservationPruneReport, sqlx::Error>(ReservationPruneReport {
                current,
                history,
                units,
            })
        }
        .await;
        timer.finish(result)
    }

    async fn delete_dated_before(&self, table: &str, before: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(r#"DELETE FROM "{table}""#));
        Filter::new().before("date", before).push_where(&mut builder);
        Ok(builder.build().execute(&self.pool).await?.rows_affected())
    }
}

async fn delete_units(tx: &mut Transaction<'_, Postgres>, reservation_id: i64) -> Result<u64, sqlx::Error> {
    sqlx::query(r#"DELETE FROM "reservationUnits" WHERE reservation_id = $1"#)
        .bind(reservation_id)
        .execute(&mut **tx)
        .await
        .map(|r| r.rows_affected())
}

async fn insert_units(
    tx: &mut Transaction<'_, Postgres>,
    reservation: &Reservation,
    slot: Slot,
) -> Result<(), sqlx::Error> {
    if reservation.ipad_groups.is_empty() {
        return Ok(());
    }
    let mut builder = QueryBuilder::<Postgres>::new(
        r#"INSERT INTO "reservationUnits" (reservation_date, unit, ipad_group, is_pinned, reservation_id) "#,
    );
    builder.push_values(&reservation.ipad_groups, |mut b, group| {
        b.push_bind(slot.date)
            .push_bind(slot.unit)
            .push_bind(*group)
            .push_bind(reservation.is_pinned)
            .push_bind(reservation.id);
    });
    builder.build().execute(&mut **tx).await.map(|_| ())
}

async fn upsert_reservation(
    tx: &mut Transaction<'_, Postgres>,
    table: &str,
    reservation: &Reservation,
) -> Result<(), sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO "{table}" (id, "groupID", "timetableID", participant, date,
                               priority_level, priority_description, created, modified)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (id) DO UPDATE SET
            "groupID" = EXCLUDED."groupID",
            "timetableID" = EXCLUDED."timetableID",
            participant = EXCLUDED.participant,
            date = EXCLUDED.date,
            priority_level = EXCLUDED.priority_level,
            priority_description = EXCLUDED.priority_description,
            modified = EXCLUDED.modified
        "#
    );
    sqlx::query(&sql)
        .bind(reservation.id)
        .bind(reservation.group_id)
        .bind(&reservation.timetable_id)
        .bind(&reservation.participant)
        .bind(reservation.date)
        .bind(reservation.priority.level)
        .bind(&reservation.priority.description)
        .bind(reservation.created)
        .bind(reservation.modified)
        .execute(&mut **tx)
        .await
        .map(|_| ())
}
