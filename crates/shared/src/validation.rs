//! Common validation utilities.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use validator::ValidationError;

/// Index of the time-unit segment inside a timetable id (`<a>-<b>-<c>-<unit>...`).
const TIMETABLE_UNIT_SEGMENT: usize = 3;

lazy_static! {
    static ref DEVICE_ID_PATTERN: Regex = Regex::new(r"^[0-9A-Fa-f]{12}$").unwrap();
}

/// Errors produced while decoding a timetable slot identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimetableIdError {
    #[error("timetable id has no unit segment")]
    MissingUnit,

    #[error("timetable unit '{0}' is not a non-negative number")]
    InvalidUnit(String),
}

/// Extracts the time unit encoded in a timetable id.
pub fn parse_timetable_unit(timetable_id: &str) -> Result<i32, TimetableIdError> {
    let segment = timetable_id
        .split('-')
        .nth(TIMETABLE_UNIT_SEGMENT)
        .ok_or(TimetableIdError::MissingUnit)?;

    match segment.trim().parse::<i32>() {
        Ok(unit) if unit >= 0 => Ok(unit),
        _ => Err(TimetableIdError::InvalidUnit(segment.to_string())),
    }
}

/// Validates that a timetable id carries a usable time unit.
pub fn validate_timetable_id(timetable_id: &str) -> Result<(), ValidationError> {
    parse_timetable_unit(timetable_id).map(|_| ()).map_err(|e| {
        let mut err = ValidationError::new("timetable_id");
        err.message = Some(e.to_string().into());
        err
    })
}

/// Validates that a device id is a colon-less hardware address (12 hex digits).
pub fn validate_device_id(id: &str) -> Result<(), ValidationError> {
    if DEVICE_ID_PATTERN.is_match(id) {
        Ok(())
    } else {
        let mut err = ValidationError::new("device_id");
        err.message = Some("Device id must be 12 hexadecimal characters".into());
        Err(err)
    }
}

/// Validates every id of a device id list.
pub fn validate_device_ids(ids: &[String]) -> Result<(), ValidationError> {
    ids.iter().try_for_each(|id| validate_device_id(id))
}

/// Validates a list of requested resource groups: positive and without duplicates.
pub fn validate_resource_groups(groups: &[i32]) -> Result<(), ValidationError> {
    if groups.iter().any(|g| *g <= 0) {
        let mut err = ValidationError::new("resource_group_range");
        err.message = Some("Resource group ids must be positive".into());
        return Err(err);
    }

    let mut seen = std::collections::HashSet::with_capacity(groups.len());
    if !groups.iter().all(|g| seen.insert(*g)) {
        let mut err = ValidationError::new("resource_group_duplicate");
        err.message = Some("Resource groups may only be requested once".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timetable_unit() {
        assert_eq!(parse_timetable_unit("5a-mon-math-3"), Ok(3));
        assert_eq!(parse_timetable_unit("5a-mon-math-0-extra"), Ok(0));
    }

    #[test]
    fn test_parse_timetable_unit_missing() {
        assert_eq!(
            parse_timetable_unit("5a-mon-math"),
            Err(TimetableIdError::MissingUnit)
        );
    }

    #[test]
    fn test_parse_timetable_unit_invalid() {
        assert_eq!(
            parse_timetable_unit("5a-mon-math-x"),
            Err(TimetableIdError::InvalidUnit("x".to_string()))
        );
        assert!(parse_timetable_unit("5a-mon-math--1").is_err());
    }

    #[test]
    fn test_validate_timetable_id_error_message() {
        let err = validate_timetable_id("nope").unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "timetable id has no unit segment"
        );
    }

    #[test]
    fn test_validate_device_id() {
        assert!(validate_device_id("a1b2c3d4e5f6").is_ok());
        assert!(validate_device_id("A1B2C3D4E5F6").is_ok());
        assert!(validate_device_id("a1:b2:c3:d4:e5:f6").is_err());
        assert!(validate_device_id("").is_err());
        assert!(validate_device_ids(&["a1b2c3d4e5f6".to_string()]).is_ok());
        assert!(validate_device_ids(&["a1b2c3d4e5f6".to_string(), "nope".to_string()]).is_err());
    }

    #[test]
    fn test_validate_resource_groups() {
        assert!(validate_resource_groups(&[1, 2, 3]).is_ok());
        assert!(validate_resource_groups(&[]).is_ok());
        assert!(validate_resource_groups(&[0]).is_err());
        assert!(validate_resource_groups(&[2, 2]).is_err());
    }
}
