//! Second-granularity time helpers.
//!
//! All persisted timestamps are stored and compared at second granularity in UTC,
//! so every comparison between stored and incoming state goes through these helpers.

use chrono::{DateTime, SubsecRound, TimeZone, Utc};

/// Drops the sub-second part of a timestamp.
pub fn truncate_to_second(t: DateTime<Utc>) -> DateTime<Utc> {
    t.trunc_subsecs(0)
}

/// Returns true if both timestamps fall into the same second.
pub fn same_second(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    truncate_to_second(a) == truncate_to_second(b)
}

/// Returns true if `a` is strictly after `b` once both are truncated to seconds.
pub fn is_after_second(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    truncate_to_second(a) > truncate_to_second(b)
}

/// Converts a millisecond epoch into a second-truncated UTC timestamp.
///
/// Zero and out-of-range values are treated as absent.
pub fn from_epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    if millis <= 0 {
        return None;
    }
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(truncate_to_second)
}
