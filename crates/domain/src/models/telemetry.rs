//! Device telemetry: the change journal and battery level samples.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use shared::validation::validate_device_ids;

use super::device::Device;

/// Immutable snapshot of the journaled subset of a device's state.
///
/// Keyed by `(id, modified)`; `timestamp` records when the snapshot was journaled
/// and drives retention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub level: i32,
    pub loggedin_user: String,
    pub status: String,
    pub last_connection: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn from_device(device: &Device, journaled_at: DateTime<Utc>) -> Self {
        Self {
            id: device.id.clone(),
            level: device.battery_level,
            loggedin_user: device.loggedin_user.clone(),
            status: device.status.clone(),
            last_connection: device.last_connection,
            modified: device.last_modified,
            timestamp: journaled_at,
        }
    }

    /// Compares two snapshots while ignoring the journaling timestamp.
    pub fn same_snapshot(&self, other: &Self) -> bool {
        self.id == other.id
            && self.level == other.level
            && self.loggedin_user == other.loggedin_user
            && self.status == other.status
            && shared::time::same_second(self.last_connection, other.last_connection)
            && shared::time::same_second(self.modified, other.modified)
    }
}

/// One battery level sample used by the charging lookback window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryLevelEntry {
    pub id: String,
    pub level: i32,
    pub timestamp: DateTime<Utc>,
}

impl BatteryLevelEntry {
    pub fn from_device(device: &Device, sampled_at: DateTime<Utc>) -> Self {
        Self {
            id: device.id.clone(),
            level: device.battery_level,
            timestamp: sampled_at,
        }
    }
}

/// Selection of telemetry rows: an id set (empty = every device) and a lower time bound.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct TelemetryQuery {
    #[serde(default)]
    #[validate(
        length(max = 500, message = "At most 500 device ids per query"),
        custom(function = "validate_device_ids")
    )]
    pub ids: Vec<String>,

    #[serde(default, alias = "date")]
    pub since: Option<DateTime<Utc>>,
}

impl TelemetryQuery {
    pub fn since(since: DateTime<Utc>) -> Self {
        Self {
            ids: Vec::new(),
            since: Some(since),
        }
    }
}

/// Groups rows by device id, keeping the incoming order inside each group.
pub fn group_by_device<T, F>(rows: Vec<T>, key: F) -> BTreeMap<String, Vec<T>>
where
    F: Fn(&T) -> &str,
{
    let mut grouped: BTreeMap<String, Vec<T>> = BTreeMap::new();
    for row in rows {
        grouped.entry(key(&row).to_string()).or_default().push(row);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::device::fixtures::{device, modified_at};
    use chrono::Duration;

    #[test]
    fn test_history_entry_from_device() {
        let d = device("a1b2c3d4e5f6", 77);
        let entry = HistoryEntry::from_device(&d, modified_at(60));
        assert_eq!(entry.id, d.id);
        assert_eq!(entry.level, 77);
        assert_eq!(entry.modified, d.last_modified);
        assert_eq!(entry.timestamp, modified_at(60));
    }

    #[test]
    fn test_same_snapshot_ignores_journal_timestamp() {
        let d = device("a1b2c3d4e5f6", 77);
        let a = HistoryEntry::from_device(&d, modified_at(60));
        let b = HistoryEntry::from_device(&d, modified_at(600));
        assert!(a.same_snapshot(&b));
    }

    #[test]
    fn test_same_snapshot_ignores_subsecond_differences() {
        let d = device("a1b2c3d4e5f6", 77);
        let a = HistoryEntry::from_device(&d, modified_at(60));
        let mut b = a.clone();
        b.last_connection = b.last_connection + Duration::milliseconds(400);
        assert!(a.same_snapshot(&b));
    }

    #[test]
    fn test_same_snapshot_detects_level_change() {
        let d = device("a1b2c3d4e5f6", 77);
        let a = HistoryEntry::from_device(&d, modified_at(60));
        let mut b = a.clone();
        b.level = 76;
        assert!(!a.same_snapshot(&b));
    }

    #[test]
    fn test_group_by_device_keeps_order() {
        let rows = vec![
            BatteryLevelEntry { id: "b".into(), level: 3, timestamp: modified_at(3) },
            BatteryLevelEntry { id: "a".into(), level: 2, timestamp: modified_at(2) },
            BatteryLevelEntry { id: "b".into(), level: 1, timestamp: modified_at(1) },
        ];
        let grouped = group_by_device(rows, |e| &e.id);
        assert_eq!(grouped.len(), 2);
        let levels: Vec<i32> = grouped["b"].iter().map(|e| e.level).collect();
        assert_eq!(levels, vec![3, 1]);
    }

    #[test]
    fn test_telemetry_query_accepts_date_alias() {
        let q: TelemetryQuery =
            serde_json::from_str(r#"{"ids":["a1b2c3d4e5f6"],"date":"2024-03-01T00:00:00Z"}"#)
                .unwrap();
        assert_eq!(q.ids.len(), 1);
        assert!(q.since.is_some());
        assert!(q.validate().is_ok());
    }

    #[test]
    fn test_telemetry_query_rejects_malformed_ids() {
        let q: TelemetryQuery = serde_json::from_str(r#"{"ids":["a1:b2:c3:d4:e5:f6"]}"#).unwrap();
        assert!(q.validate().is_err());
    }
}
