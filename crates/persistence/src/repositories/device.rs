//! Device repository for database operations.

use sqlx::PgPool;

use crate::entities::DeviceEntity;
use crate::metrics::QueryTimer;
use domain::models::Device;

const DEVICE_COLUMNS: &str = "id, name, loggedin_user, device_type, battery_level, is_charging, \
     device_group, device_group_index, last_modified, last_connection, status";

/// Repository for device-related database operations.
#[derive(Clone)]
pub struct DeviceRepository {
    pool: PgPool,
}

impl DeviceRepository {
    /// Creates a new DeviceRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All stored devices.
    pub async fn find_all(&self) -> Result<Vec<DeviceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_all_devices");
        let result = sqlx::query_as::<_, DeviceEntity>(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices"
        ))
        .fetch_all(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Grouped tablets and staff tablets, sorted by name.
    pub async fn find_listed(&self) -> Result<Vec<DeviceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_listed_devices");
        let result = sqlx::query_as::<_, DeviceEntity>(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices \
             WHERE device_group != 0 OR device_type = 1 \
             ORDER BY name ASC"
        ))
        .fetch_all(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Inserts the device or overwrites the stored row.
    pub async fn upsert(&self, device: &Device) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("upsert_device");
        let result = sqlx::query(
            r#"
            INSERT INTO devices (id, name, loggedin_user, device_type, battery_level, is_charging,
                                 device_group, device_group_index, last_modified, last_connection, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                loggedin_user = EXCLUDED.loggedin_user,
                device_type = EXCLUDED.device_type,
                battery_level = EXCLUDED.battery_level,
                is_charging = EXCLUDED.is_charging,
                device_group = EXCLUDED.device_group,
                device_group_index = EXCLUDED.device_group_index,
                last_modified = EXCLUDED.last_modified,
                last_connection = EXCLUDED.last_connection,
                status = EXCLUDED.status
            "#,
        )
        .bind(&device.id)
        .bind(&device.name)
        .bind(&device.loggedin_user)
        .bind(device.device_type)
        .bind(device.battery_level)
        .bind(device.is_charging)
        .bind(device.device_group)
        .bind(&device.device_group_index)
        .bind(device.last_modified)
        .bind(device.last_connection)
        .bind(&device.status)
        .execute(&self.pool)
        .await
        .map(|_| ());
        timer.finish(result)
    }

    /// Distinct resource groups of devices in service, ascending.
    pub async fn resource_groups(&self) -> Result<Vec<i32>, sqlx::Error> {
        let timer = QueryTimer::new("find_resource_groups");
        let result = sqlx::query_scalar::<_, i32>(
            r#"
            SELECT DISTINCT device_group
            FROM devices
            WHERE device_group > 0
            ORDER BY device_group ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.finish(result)
    }
}
