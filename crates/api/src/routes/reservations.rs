//! Reservation endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::Participant;
use crate::middleware::record_allocation_outcome;
use domain::errors::AllocationError;
use domain::models::{
    AllocationOutcome, FreeGroups, Reservation, ReservationHorizon, ReservationOverview,
    ReservationRequest, ReservationScope, Slot,
};
use persistence::repositories::{ReservationGroupRepository, ReservationRepository};

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewQuery {
    #[serde(default)]
    pub history: bool,
    #[serde(default = "default_true")]
    pub all_users: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct HorizonQuery {
    #[serde(default)]
    pub history: bool,
}

#[derive(Debug, Deserialize)]
pub struct FreeGroupsQuery {
    pub date: NaiveDate,
    pub unit: i32,
}

/// Identifies a reservation in a delete body. Other fields are ignored.
#[derive(Debug, Deserialize)]
pub struct ReservationRef {
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct ReservationsResponse {
    pub reservations: Vec<Reservation>,
}

async fn list_reservations(
    state: &AppState,
    horizon: ReservationHorizon,
    scope: ReservationScope,
) -> Result<Vec<Reservation>, ApiError> {
    let rows = ReservationRepository::new(state.pool.clone())
        .list(horizon, &scope)
        .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

/// Reservations (everyone's or the caller's own) plus the caller's groups.
///
/// GET /reservations/?history=false&allUsers=true
pub async fn overview(
    State(state): State<AppState>,
    participant: Participant,
    Query(query): Query<OverviewQuery>,
) -> Result<Json<ReservationOverview>, ApiError> {
    let scope = if query.all_users {
        ReservationScope::All
    } else {
        ReservationScope::Participant(participant.0.clone())
    };
    let reservations = list_reservations(
        &state,
        ReservationHorizon::from_history_flag(query.history),
        scope,
    )
    .await?;
    let groups = ReservationGroupRepository::new(state.pool.clone())
        .list_by_participant(participant.as_str())
        .await?;

    Ok(Json(ReservationOverview {
        reservations,
        groups: groups.into_iter().map(Into::into).collect(),
    }))
}

/// GET /reservations/list?history=false
pub async fn list_all(
    State(state): State<AppState>,
    Query(query): Query<HorizonQuery>,
) -> Result<Json<ReservationsResponse>, ApiError> {
    let reservations = list_reservations(
        &state,
        ReservationHorizon::from_history_flag(query.history),
        ReservationScope::All,
    )
    .await?;
    Ok(Json(ReservationsResponse { reservations }))
}

/// GET /reservations/list/:ipad_group?history=false
pub async fn list_by_resource_group(
    State(state): State<AppState>,
    Path(ipad_group): Path<i32>,
    Query(query): Query<HorizonQuery>,
) -> Result<Json<ReservationsResponse>, ApiError> {
    let reservations = list_reservations(
        &state,
        ReservationHorizon::from_history_flag(query.history),
        ReservationScope::ResourceGroup(ipad_group),
    )
    .await?;
    Ok(Json(ReservationsResponse { reservations }))
}

/// POST /reservations/list
pub async fn create(
    State(state): State<AppState>,
    participant: Participant,
    Json(mut request): Json<ReservationRequest>,
) -> Result<Response, ApiError> {
    request.id = None;
    let outcome = state
        .allocator
        .create_or_update(&request, participant.as_str())
        .await;
    outcome_response(outcome)
}

/// PUT /reservations/list
pub async fn update(
    State(state): State<AppState>,
    participant: Participant,
    Json(request): Json<ReservationRequest>,
) -> Result<Response, ApiError> {
    if request.id.is_none() {
        return Err(ApiError::Validation("id is required for updates".to_string()));
    }
    let outcome = state
        .allocator
        .create_or_update(&request, participant.as_str())
        .await;
    outcome_response(outcome)
}

/// DELETE /reservations/list
pub async fn delete(
    State(state): State<AppState>,
    Json(reservation): Json<ReservationRef>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.allocator.delete(reservation.id).await?;
    Ok(Json(json!({ "status": "Success" })))
}

/// Free, unpinned-reserved and pinned-reserved groups of one slot.
///
/// GET /reservations/free?date=2024-03-04&unit=2
pub async fn free_groups(
    State(state): State<AppState>,
    Query(query): Query<FreeGroupsQuery>,
) -> Result<Json<FreeGroups>, ApiError> {
    let groups = state
        .allocator
        .free_groups(Slot::new(query.date, query.unit))
        .await?;
    Ok(Json(groups))
}

/// Maps an allocation outcome onto the HTTP response.
///
/// Success is 200, a pinned collision awaiting approval 202, a rejection 403, a
/// conflicting concurrent write 409 (retryable) and any other failure 500.
fn outcome_response(outcome: AllocationOutcome) -> Result<Response, ApiError> {
    record_allocation_outcome(outcome.kind());
    match outcome {
        AllocationOutcome::Success(reservation) => {
            Ok((StatusCode::OK, Json(json!({ "reservation": reservation }))).into_response())
        }
        AllocationOutcome::NeedsApproval { group } => Ok((
            StatusCode::ACCEPTED,
            Json(json!({ "status": "needs_approval", "group": group })),
        )
            .into_response()),
        AllocationOutcome::Rejected(reason) => Err(ApiError::Rejected(reason)),
        AllocationOutcome::Failed(AllocationError::ConflictFailure(msg)) => {
            Err(ApiError::Conflict(msg))
        }
        AllocationOutcome::Failed(e) => Err(ApiError::Internal(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use domain::models::{Priority, RejectReason};

    fn reservation() -> Reservation {
        let at = Utc.with_ymd_and_hms(2024, 3, 4, 8, 0, 0).unwrap();
        Reservation {
            id: 3,
            group_id: 0,
            timetable_id: "5a-1-math-2".into(),
            participant: "alice".into(),
            date: at,
            priority: Priority::default(),
            ipad_groups: vec![1, 2],
            is_pinned: false,
            created: at,
            modified: at,
        }
    }

    fn status(outcome: AllocationOutcome) -> StatusCode {
        match outcome_response(outcome) {
            Ok(response) => response.status(),
            Err(e) => e.into_response().status(),
        }
    }

    #[test]
    fn test_outcome_statuses() {
        assert_eq!(status(AllocationOutcome::Success(reservation())), StatusCode::OK);
        assert_eq!(
            status(AllocationOutcome::NeedsApproval { group: 4 }),
            StatusCode::ACCEPTED
        );
        assert_eq!(
            status(AllocationOutcome::Rejected(RejectReason::Capacity {
                requested: 3,
                available: 2
            })),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status(AllocationOutcome::Failed(AllocationError::ConflictFailure(
                "taken".into()
            ))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(AllocationOutcome::Failed(AllocationError::StoreUnavailable(
                "down".into()
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_overview_query_defaults() {
        let query: OverviewQuery = serde_json::from_str("{}").unwrap();
        assert!(!query.history);
        assert!(query.all_users);
    }
}
