//! Device domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classification flag for regular fleet tablets.
pub const DEVICE_TYPE_STANDARD: i32 = 0;

/// Classification flag for staff tablets (names starting with `l`).
pub const DEVICE_TYPE_STAFF: i32 = 1;

/// Group number of devices that are not assigned to any resource group.
pub const UNASSIGNED_GROUP: i32 = 0;

/// A tablet as last reported by the inventory source.
///
/// One row per physical device, keyed by the colon-less Wi-Fi hardware address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
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

impl Device {
    /// Devices worth listing: grouped tablets and staff tablets.
    pub fn is_listed(&self) -> bool {
        self.device_group != UNASSIGNED_GROUP || self.device_type == DEVICE_TYPE_STAFF
    }

    /// Whether the device belongs to a bookable resource group.
    pub fn is_in_service(&self) -> bool {
        self.device_group > UNASSIGNED_GROUP
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::device;
    use super::*;

    #[test]
    fn test_grouped_device_is_listed() {
        let d = device("a1b2c3d4e5f6", 50);
        assert!(d.is_listed());
        assert!(d.is_in_service());
    }

    #[test]
    fn test_staff_device_without_group_is_listed() {
        let mut d = device("a1b2c3d4e5f6", 50);
        d.device_group = UNASSIGNED_GROUP;
        d.device_type = DEVICE_TYPE_STAFF;
        assert!(d.is_listed());
        assert!(!d.is_in_service());
    }

    #[test]
    fn test_unassigned_standard_device_is_hidden() {
        let mut d = device("a1b2c3d4e5f6", 50);
        d.device_group = UNASSIGNED_GROUP;
        assert!(!d.is_listed());
    }

    #[test]
    fn test_device_serializes_snake_case() {
        let json = serde_json::to_value(device("a1b2c3d4e5f6", 42)).unwrap();
        assert_eq!(json["battery_level"], 42);
        assert_eq!(json["device_group_index"], "b");
        assert_eq!(json["is_charging"], false);
    }
}
