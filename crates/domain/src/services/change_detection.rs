//! Change classification and the device write policy.

use crate::models::Device;
use shared::time::{is_after_second, same_second};

/// How an incoming device differs from its stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceChange {
    Unchanged,
    /// Only the charging flag or connection time moved.
    Transient,
    Structural,
}

/// What to do with an incoming device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteDecision {
    New,
    Newer,
    TransientOnly,
    Unchanged,
    /// Structural change reported under an unchanged modification time.
    Inconsistent,
    /// Incoming modification time is older than the stored one.
    Stale,
}

/// Compares two device states field by field. Timestamps compare at second granularity.
pub fn classify_change(stored: &Device, incoming: &Device) -> DeviceChange {
    let structural = stored.id != incoming.id
        || stored.name != incoming.name
        || stored.loggedin_user != incoming.loggedin_user
        || stored.device_type != incoming.device_type
        || stored.battery_level != incoming.battery_level
        || stored.device_group != incoming.device_group
        || stored.device_group_index != incoming.device_group_index
        || stored.status != incoming.status
        || !same_second(stored.last_modified, incoming.last_modified);
    if structural {
        return DeviceChange::Structural;
    }

    let transient = stored.is_charging != incoming.is_charging
        || !same_second(stored.last_connection, incoming.last_connection);
    if transient {
        DeviceChange::Transient
    } else {
        DeviceChange::Unchanged
    }
}

/// Applies the write policy: never regress a device's modification time.
pub fn decide_write(stored: Option<&Device>, incoming: &Device) -> WriteDecision {
    let stored = match stored {
        Some(stored) => stored,
        None => return WriteDecision::New,
    };

    match classify_change(stored, incoming) {
        DeviceChange::Unchanged => WriteDecision::Unchanged,
        _ if is_after_second(incoming.last_modified, stored.last_modified) => {
            WriteDecision::Newer
        }
        _ if !same_second(incoming.last_modified, stored.last_modified) => WriteDecision::Stale,
        DeviceChange::Transient => WriteDecision::TransientOnly,
        DeviceChange::Structural => WriteDecision::Inconsistent,
    }
}
