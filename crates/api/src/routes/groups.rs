//! Reservation group endpoints. Groups are private to their participant.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::Participant;
use domain::models::{ReservationGroup, ReservationGroupRequest};
use persistence::repositories::ReservationGroupRepository;

#[derive(Debug, Serialize)]
pub struct GroupsResponse {
    pub groups: Vec<ReservationGroup>,
}

#[derive(Debug, Serialize)]
pub struct GroupResponse {
    pub status: &'static str,
    pub group: ReservationGroup,
}

#[derive(Debug, Deserialize)]
pub struct GroupRef {
    pub id: i64,
}

/// GET /reservations/groups
pub async fn list(
    State(state): State<AppState>,
    participant: Participant,
) -> Result<Json<GroupsResponse>, ApiError> {
    let groups = ReservationGroupRepository::new(state.pool.clone())
        .list_by_participant(participant.as_str())
        .await?;
    Ok(Json(GroupsResponse {
        groups: groups.into_iter().map(Into::into).collect(),
    }))
}

/// POST /reservations/groups
pub async fn create(
    State(state): State<AppState>,
    participant: Participant,
    Json(request): Json<ReservationGroupRequest>,
) -> Result<Json<GroupResponse>, ApiError> {
    request.validate()?;
    let group = ReservationGroupRepository::new(state.pool.clone())
        .create(&request.name, participant.as_str())
        .await?;
    tracing::info!(group_id = group.id, participant = %participant.0, "Reservation group created");
    Ok(Json(GroupResponse {
        status: "Success",
        group: group.into(),
    }))
}

/// PUT /reservations/groups
pub async fn update(
    State(state): State<AppState>,
    participant: Participant,
    Json(request): Json<ReservationGroupRequest>,
) -> Result<Json<GroupResponse>, ApiError> {
    request.validate()?;
    let id = request
        .id
        .ok_or_else(|| ApiError::Validation("id is required for updates".to_string()))?;
    let group = ReservationGroupRepository::new(state.pool.clone())
        .update(id, &request.name, participant.as_str())
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("reservation group {}", id)))?;
    Ok(Json(GroupResponse {
        status: "Success",
        group: group.into(),
    }))
}

/// DELETE /reservations/groups
pub async fn delete(
    State(state): State<AppState>,
    participant: Participant,
    Json(group): Json<GroupRef>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = ReservationGroupRepository::new(state.pool.clone())
        .delete(group.id, participant.as_str())
        .await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("reservation group {}", group.id)));
    }
    Ok(Json(json!({ "status": "Success" })))
}
