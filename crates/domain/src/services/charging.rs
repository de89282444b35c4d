//! Charging state inference.
//!
//! The inventory does not report whether a tablet is plugged in, so the flag is derived
//! from battery level movement between passes plus a short window of recent samples.

use crate::models::{BatteryLevelEntry, Device};

/// Infers the charging flag for a device reporting `level`.
///
/// `recent` holds the device's samples inside the lookback window, newest first.
/// With an unchanged level a charging device stays charging until a higher sample
/// inside the window shows the level has been falling.
pub fn infer_charging(previous: Option<&Device>, level: i32, recent: &[BatteryLevelEntry]) -> bool {
    let previous = match previous {
        Some(previous) => previous,
        None => return false,
    };

    if level > previous.battery_level {
        return true;
    }
    if level < previous.battery_level || !previous.is_charging {
        return false;
    }

    for sample in recent {
        if sample.level > level {
            return false;
        }
        if sample.level < level {
            return true;
        }
    }
    true
}
