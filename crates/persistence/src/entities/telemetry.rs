//! History and battery sample entities.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the history table.
#[derive(Debug, Clone, FromRow)]
pub struct HistoryEntity {
    pub id: String,
    pub level: i32,
    pub loggedin_user: String,
    pub status: String,
    pub last_connection: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
}

impl From<HistoryEntity> for domain::models::HistoryEntry {
    fn from(entity: HistoryEntity) -> Self {
        Self {
            id: entity.id,
            level: entity.level,
            loggedin_user: entity.loggedin_user,
            status: entity.status,
            last_connection: entity.last_connection,
            modified: entity.modified,
            timestamp: entity.timestamp,
        }
    }
}

/// Database row mapping for the battery table.
#[derive(Debug, Clone, FromRow)]
pub struct BatteryLevelEntity {
    pub id: String,
    pub level: i32,
    pub timestamp: DateTime<Utc>,
}

impl From<BatteryLevelEntity> for domain::models::BatteryLevelEntry {
    fn from(entity: BatteryLevelEntity) -> Self {
        Self {
            id: entity.id,
            level: entity.level,
            timestamp: entity.timestamp,
        }
    }
}
