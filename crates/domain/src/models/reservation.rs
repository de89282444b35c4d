//! Reservation domain models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use validator::Validate;

use crate::errors::AllocationError;
use shared::validation::{parse_timetable_unit, validate_resource_groups, validate_timetable_id};

/// Counter row used for reservation ids.
pub const RESERVATION_COUNTER: &str = "reservations";

/// Counter row used for reservation group ids.
pub const GROUP_COUNTER: &str = "groups";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Priority {
    pub level: i32,
    #[serde(default)]
    pub description: String,
}

/// A booking of one or more resource groups for a single slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: i64,
    #[serde(rename = "groupID")]
    pub group_id: i64,
    #[serde(rename = "timetableID")]
    pub timetable_id: String,
    pub participant: String,
    pub date: DateTime<Utc>,
    pub priority: Priority,
    #[serde(rename = "iPadGroups")]
    pub ipad_groups: Vec<i32>,
    #[serde(rename = "isPinned")]
    pub is_pinned: bool,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// A bookable period: a calendar day plus a time unit within that day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Slot {
    pub date: NaiveDate,
    pub unit: i32,
}

impl Slot {
    pub fn new(date: NaiveDate, unit: i32) -> Self {
        Self { date, unit }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.date, self.unit)
    }
}

/// Occupancy of one resource group in one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationUnit {
    pub date: NaiveDate,
    pub unit: i32,
    #[serde(rename = "iPadGroup")]
    pub ipad_group: i32,
    #[serde(rename = "isPinned")]
    pub is_pinned: bool,
    #[serde(rename = "reservationID")]
    pub reservation_id: i64,
}

/// Request payload for creating or updating a reservation.
///
/// The participant is never taken from the body; it is the authenticated caller.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReservationRequest {
    /// Present on updates only.
    #[serde(default)]
    pub id: Option<i64>,

    #[serde(rename = "groupID", default)]
    pub group_id: i64,

    #[serde(rename = "timetableID")]
    #[validate(custom(function = "validate_timetable_id"))]
    pub timetable_id: String,

    pub date: DateTime<Utc>,

    #[serde(default)]
    pub priority: Priority,

    #[serde(rename = "iPadGroups")]
    #[validate(
        length(min = 1, message = "At least one resource group is required"),
        custom(function = "validate_resource_groups")
    )]
    pub ipad_groups: Vec<i32>,

    #[serde(rename = "isPinned", default)]
    pub is_pinned: bool,
}

impl ReservationRequest {
    /// Returns the slot this request books.
    pub fn slot(&self) -> Result<Slot, AllocationError> {
        let unit = parse_timetable_unit(&self.timetable_id)
            .map_err(|e| AllocationError::ValidationFailure(e.to_string()))?;
        Ok(Slot::new(self.date.date_naive(), unit))
    }

    /// Builds the reservation that would be stored for `participant`.
    pub fn to_reservation(
        &self,
        id: i64,
        participant: &str,
        ipad_groups: Vec<i32>,
        created: DateTime<Utc>,
        modified: DateTime<Utc>,
    ) -> Reservation {
        Reservation {
            id,
            group_id: self.group_id,
            timetable_id: self.timetable_id.clone(),
            participant: participant.to_string(),
            date: shared::time::truncate_to_second(self.date),
            priority: self.priority.clone(),
            ipad_groups,
            is_pinned: self.is_pinned,
            created,
            modified,
        }
    }
}

/// A reservation ready to be committed. `id` is `None` for creations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationDraft {
    pub id: Option<i64>,
    pub reservation: Reservation,
    pub slot: Slot,
}

/// Participant-defined collection of reservations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationGroup {
    pub id: i64,
    pub name: String,
    pub participant: String,
}

/// Request payload for creating or updating a reservation group.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReservationGroupRequest {
    #[serde(default)]
    pub id: Option<i64>,

    #[validate(length(
        min = 1,
        max = 100,
        message = "Name must be between 1 and 100 characters"
    ))]
    pub name: String,
}

/// Partition of the resource group universe for one slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeGroups {
    pub free_groups: Vec<i32>,
    pub unpinned_groups: Vec<i32>,
    pub reserved_groups: Vec<i32>,
    pub max_count: usize,
}

/// Which relation a reservation query reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationHorizon {
    Current,
    History,
}

impl ReservationHorizon {
    pub fn from_history_flag(with_history: bool) -> Self {
        if with_history {
            Self::History
        } else {
            Self::Current
        }
    }
}

/// Optional narrowing of a reservation listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReservationScope {
    #[default]
    All,
    Participant(String),
    ResourceGroup(i32),
}

/// Reservations plus the caller's reservation groups.
#[derive(Debug, Clone, Serialize)]
pub struct ReservationOverview {
    pub reservations: Vec<Reservation>,
    pub groups: Vec<ReservationGroup>,
}

/// Why an allocation request was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("requested {requested} groups but only {available} are free")]
    Capacity { requested: usize, available: usize },

    #[error("resource group {0} does not exist")]
    UnknownGroup(i32),

    #[error("reservation {0} does not exist")]
    UnknownReservation(i64),

    #[error("{0}")]
    Invalid(String),
}

/// Terminal result of one allocation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationOutcome {
    /// Stored with the (possibly substituted) groups.
    Success(Reservation),
    /// A pinned request collides with an existing reservation on `group`.
    NeedsApproval { group: i32 },
    /// Capacity or validity violation. Nothing was written.
    Rejected(RejectReason),
    /// Storage failure. Conflicts are retryable.
    Failed(AllocationError),
}

impl AllocationOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            AllocationOutcome::Success(_) => "success",
            AllocationOutcome::NeedsApproval { .. } => "needs_approval",
            AllocationOutcome::Rejected(_) => "rejected",
            AllocationOutcome::Failed(_) => "failed",
        }
    }
}
