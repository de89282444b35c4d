//! Normalized projection of the device inventory payload.
//!
//! The inventory source returns a deeply nested record per device. Only the handful of
//! fields the reconciler needs are decoded; everything else is discarded here.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use super::device::{Device, DEVICE_TYPE_STAFF, DEVICE_TYPE_STANDARD, UNASSIGNED_GROUP};
use shared::time::from_epoch_millis;

lazy_static! {
    static ref GROUP_NUMBER: Regex = Regex::new(r"[0-9]+").unwrap();
    static ref GROUP_INDEX: Regex = Regex::new(r"[a-z]+").unwrap();
}

/// Envelope of the device listing endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InventoryResponse {
    pub status: Option<String>,
    pub message: Option<String>,
    pub total: Option<i64>,
    pub results: Vec<InventoryDevice>,
}

/// One raw inventory record, reduced to the fields that are used.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InventoryDevice {
    pub name: Option<String>,
    pub username: Option<String>,
    pub status: Option<String>,
    pub modification_date: Option<i64>,
    pub last_connection_date: Option<i64>,
    pub details: Option<InventoryDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InventoryDetails {
    #[serde(rename = "wifiMAC")]
    pub wifi_mac: Option<String>,
    pub battery_level: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("device '{0}' has no wifi hardware address")]
    MissingHardwareId(String),
}

/// A normalized device whose timestamps may still be unknown.
///
/// `device` carries epoch placeholders until [`ObservedDevice::resolve`] fills in the
/// timestamps against stored state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedDevice {
    pub device: Device,
    pub last_modified: Option<DateTime<Utc>>,
    pub last_connection: Option<DateTime<Utc>>,
}

impl ObservedDevice {
    /// Fills absent timestamps.
    ///
    /// A missing modification date keeps the stored one, or the pass time for a device
    /// seen for the first time. A missing connection date keeps the stored one, or epoch.
    pub fn resolve(self, stored: Option<&Device>, pass_time: DateTime<Utc>) -> Device {
        let mut device = self.device;
        device.last_modified = self
            .last_modified
            .or_else(|| stored.map(|s| s.last_modified))
            .unwrap_or_else(|| shared::time::truncate_to_second(pass_time));
        device.last_connection = self
            .last_connection
            .or_else(|| stored.map(|s| s.last_connection))
            .unwrap_or_default();
        device
    }
}

impl InventoryDevice {
    /// Normalizes the record into the stored device shape.
    ///
    /// `shared_device_user` is the placeholder account the inventory reports for
    /// unassigned tablets; it maps to an empty logged-in user.
    pub fn normalize(&self, shared_device_user: &str) -> Result<ObservedDevice, NormalizeError> {
        let raw_name = self.name.clone().unwrap_or_default();
        let details = self.details.clone().unwrap_or_default();

        let id = details
            .wifi_mac
            .as_deref()
            .map(|mac| mac.trim().replace(':', ""))
            .filter(|mac| !mac.is_empty())
            .ok_or_else(|| NormalizeError::MissingHardwareId(raw_name.clone()))?;

        let name = raw_name.to_lowercase();
        let device_type = if name.starts_with('l') {
            DEVICE_TYPE_STAFF
        } else {
            DEVICE_TYPE_STANDARD
        };
        let (device_group, device_group_index) = parse_group(&raw_name);

        let loggedin_user = match self.username.as_deref() {
            Some(user) if user != shared_device_user => user.to_string(),
            _ => String::new(),
        };

        let battery_level = details
            .battery_level
            .map(|level| (level * 100.0).floor() as i32)
            .unwrap_or(0);

        Ok(ObservedDevice {
            device: Device {
                id,
                name,
                loggedin_user,
                device_type,
                battery_level,
                is_charging: false,
                device_group,
                device_group_index,
                last_modified: DateTime::<Utc>::default(),
                last_connection: DateTime::<Utc>::default(),
                status: self.status.clone().unwrap_or_default(),
            },
            last_modified: self.modification_date.and_then(from_epoch_millis),
            last_connection: self.last_connection_date.and_then(from_epoch_millis),
        })
    }
}

/// Splits `<prefix>-<number><index>` names into a group number and sub-index.
fn parse_group(name: &str) -> (i32, String) {
    let parts: Vec<&str> = name.split('-').collect();
    if parts.len() != 2 {
        return (UNASSIGNED_GROUP, String::new());
    }

    let suffix = parts[1];
    let number = GROUP_NUMBER
        .find(suffix)
        .and_then(|m| m.as_str().parse::<i32>().ok());
    let index = GROUP_INDEX.find(suffix).map(|m| m.as_str().to_string());

    match (number, index) {
        (Some(number), Some(index)) => (number, index),
        _ => (UNASSIGNED_GROUP, String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::device::fixtures::{device, modified_at};

    const SHARED_USER: &str = "AACHEN-VSA Device User";

    fn record(name: &str, mac: Option<&str>, level: f64) -> InventoryDevice {
        InventoryDevice {
            name: Some(name.to_string()),
            username: Some("jdoe".to_string()),
            status: Some("COMPLIANT".to_string()),
            modification_date: Some(1_700_000_000_500),
            last_connection_date: Some(1_700_000_000_000),
            details: Some(InventoryDetails {
                wifi_mac: mac.map(str::to_string),
                battery_level: Some(level),
            }),
        }
    }

    #[test]
    fn test_normalize_grouped_tablet() {
        let observed = record("iPad-12c", Some("a1:b2:c3:d4:e5:f6"), 0.75)
            .normalize(SHARED_USER)
            .unwrap();
        let d = observed.device;
        assert_eq!(d.id, "a1b2c3d4e5f6");
        assert_eq!(d.name, "ipad-12c");
        assert_eq!(d.device_type, DEVICE_TYPE_STANDARD);
        assert_eq!(d.device_group, 12);
        assert_eq!(d.device_group_index, "c");
        assert_eq!(d.battery_level, 75);
        assert!(!d.is_charging);
        assert_eq!(observed.last_modified, Some(modified_at(0)));
        assert_eq!(observed.last_connection, Some(modified_at(0)));
    }

    #[test]
    fn test_normalize_staff_tablet() {
        let observed = record("Lehrer-iPad", Some("a1:b2:c3:d4:e5:f6"), 1.0)
            .normalize(SHARED_USER)
            .unwrap();
        assert_eq!(observed.device.device_type, DEVICE_TYPE_STAFF);
        assert_eq!(observed.device.device_group, UNASSIGNED_GROUP);
        assert_eq!(observed.device.battery_level, 100);
    }

    #[test]
    fn test_group_requires_number_and_index() {
        assert_eq!(parse_group("ipad-7"), (0, String::new()));
        assert_eq!(parse_group("ipad-b"), (0, String::new()));
        assert_eq!(parse_group("ipad-7-b"), (0, String::new()));
        assert_eq!(parse_group("ipad-7b"), (7, "b".to_string()));
        assert_eq!(parse_group("ipad"), (0, String::new()));
    }

    #[test]
    fn test_shared_user_maps_to_empty() {
        let mut raw = record("ipad-1a", Some("a1:b2:c3:d4:e5:f6"), 0.5);
        raw.username = Some(SHARED_USER.to_string());
        let observed = raw.normalize(SHARED_USER).unwrap();
        assert_eq!(observed.device.loggedin_user, "");
    }

    #[test]
    fn test_missing_mac_is_rejected() {
        let err = record("ipad-1a", None, 0.5).normalize(SHARED_USER).unwrap_err();
        assert_eq!(err, NormalizeError::MissingHardwareId("ipad-1a".to_string()));
    }

    #[test]
    fn test_tolerant_parse_ignores_unknown_fields() {
        let json = r#"{
            "status": "OK",
            "total": 1,
            "results": [{
                "uuid": "x",
                "name": "ipad-4d",
                "username": null,
                "modificationDate": 1700000000000,
                "installedApps": [{"name": "Safari"}],
                "details": {"wifiMAC": "00:11:22:33:44:55", "batteryLevel": 0.2, "location": {}}
            }]
        }"#;
        let response: InventoryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.results.len(), 1);
        let observed = response.results[0].normalize(SHARED_USER).unwrap();
        assert_eq!(observed.device.id, "001122334455");
        assert_eq!(observed.device.battery_level, 20);
        assert_eq!(observed.last_connection, None);
    }

    #[test]
    fn test_resolve_absent_timestamps() {
        let mut raw = record("ipad-1a", Some("a1:b2:c3:d4:e5:f6"), 0.5);
        raw.modification_date = None;
        raw.last_connection_date = Some(0);
        let observed = raw.normalize(SHARED_USER).unwrap();

        let fresh = observed.clone().resolve(None, modified_at(90));
        assert_eq!(fresh.last_modified, modified_at(90));
        assert_eq!(fresh.last_connection, DateTime::<Utc>::default());

        let mut stored = device("a1b2c3d4e5f6", 50);
        stored.last_modified = modified_at(30);
        stored.last_connection = modified_at(20);
        let known = observed.resolve(Some(&stored), modified_at(90));
        assert_eq!(known.last_modified, modified_at(30));
        assert_eq!(known.last_connection, modified_at(20));
    }
}
