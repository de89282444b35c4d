//! Device entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the devices table.
#[derive(Debug, Clone, FromRow)]
pub struct DeviceEntity {
    pub id: String,
    pub name: String,
    pub loggedin_user: String,
    pub device_type: i32,
    pub battery_level: i32,
    pub is_charging: bool,
    pub device_group: i32,
    pub device_group_index: String,
    pub last_modified: DateTime<Utc>,
    pub last_connection: DateTime<Utc>,
    pub status: String,
}

impl From<DeviceEntity> for domain::models::Device {
    fn from(entity: DeviceEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            loggedin_user: entity.loggedin_user,
            device_type: entity.device_type,
            battery_level: entity.battery_level,
            is_charging: entity.is_charging,
            device_group: entity.device_group,
            device_group_index: entity.device_group_index,
            last_modified: entity.last_modified,
            last_connection: entity.last_connection,
            status: entity.status,
        }
    }
}
