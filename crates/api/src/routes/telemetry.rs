//! History and battery telemetry queries.

use std::collections::BTreeMap;

use axum::{extract::State, Json};
use serde::Serialize;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::telemetry::group_by_device;
use domain::models::{BatteryLevelEntry, HistoryEntry, TelemetryQuery};
use persistence::repositories::{BatteryRepository, HistoryRepository};

/// Rows grouped by device id, newest first within each device.
#[derive(Debug, Serialize)]
pub struct DeviceTelemetryResponse<T> {
    pub devices: BTreeMap<String, Vec<T>>,
}

/// POST /history
pub async fn query_history(
    State(state): State<AppState>,
    Json(query): Json<TelemetryQuery>,
) -> Result<Json<DeviceTelemetryResponse<HistoryEntry>>, ApiError> {
    query.validate()?;
    if query.since.is_none() {
        return Err(ApiError::Validation("date is required".to_string()));
    }

    let rows = HistoryRepository::new(state.pool.clone()).find(&query).await?;
    let entries: Vec<HistoryEntry> = rows.into_iter().map(Into::into).collect();
    Ok(Json(DeviceTelemetryResponse {
        devices: group_by_device(entries, |e| &e.id),
    }))
}

/// POST /charging/batteries
pub async fn query_batteries(
    State(state): State<AppState>,
    Json(query): Json<TelemetryQuery>,
) -> Result<Json<DeviceTelemetryResponse<BatteryLevelEntry>>, ApiError> {
    query.validate()?;

    let rows = BatteryRepository::new(state.pool.clone()).find(&query).await?;
    let entries: Vec<BatteryLevelEntry> = rows.into_iter().map(Into::into).collect();
    Ok(Json(DeviceTelemetryResponse {
        devices: group_by_device(entries, |e| &e.id),
    }))
}
