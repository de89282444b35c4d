//! Device listing endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::Device;
use persistence::repositories::DeviceRepository;

#[derive(Debug, Serialize)]
pub struct DevicesResponse {
    pub devices: Vec<Device>,
}

/// Grouped tablets and staff tablets, sorted by name.
///
/// GET /ipad_list/devices
pub async fn list_devices(State(state): State<AppState>) -> Result<Json<DevicesResponse>, ApiError> {
    let repo = DeviceRepository::new(state.pool.clone());
    let devices = repo.find_listed().await?;
    Ok(Json(DevicesResponse {
        devices: devices.into_iter().map(Into::into).collect(),
    }))
}
