//! Reservation entities.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

use domain::models::{Priority, Reservation, ReservationGroup, ReservationUnit};

/// A reservation row joined with its aggregated occupancy units.
#[derive(Debug, Clone, FromRow)]
pub struct ReservationEntity {
    pub id: i64,
    pub group_id: i64,
    pub timetable_id: String,
    pub participant: String,
    pub date: DateTime<Utc>,
    pub priority_level: i32,
    pub priority_description: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub ipad_groups: Vec<i32>,
    pub is_pinned: bool,
}

impl From<ReservationEntity> for Reservation {
    fn from(entity: ReservationEntity) -> Self {
        Self {
            id: entity.id,
            group_id: entity.group_id,
            timetable_id: entity.timetable_id,
            participant: entity.participant,
            date: entity.date,
            priority: Priority {
                level: entity.priority_level,
                description: entity.priority_description,
            },
            ipad_groups: entity.ipad_groups,
            is_pinned: entity.is_pinned,
            created: entity.created,
            modified: entity.modified,
        }
    }
}

/// Database row mapping for the reservationUnits table.
#[derive(Debug, Clone, FromRow)]
pub struct ReservationUnitEntity {
    pub reservation_date: NaiveDate,
    pub unit: i32,
    pub ipad_group: i32,
    pub is_pinned: bool,
    pub reservation_id: i64,
}

impl From<ReservationUnitEntity> for ReservationUnit {
    fn from(entity: ReservationUnitEntity) -> Self {
        Self {
            date: entity.reservation_date,
            unit: entity.unit,
            ipad_group: entity.ipad_group,
            is_pinned: entity.is_pinned,
            reservation_id: entity.reservation_id,
        }
    }
}

/// Database row mapping for the reservationGroups table.
#[derive(Debug, Clone, FromRow)]
pub struct ReservationGroupEntity {
    pub id: i64,
    pub name: String,
    pub participant: String,
}

impl From<ReservationGroupEntity> for ReservationGroup {
    fn from(entity: ReservationGroupEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            participant: entity.participant,
        }
    }
}
