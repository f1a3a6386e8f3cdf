use std::str::FromStr;

use chrono::NaiveDate;
use mongodb::bson::{DateTime, oid::ObjectId};

use crate::error::AppError;

pub(super) fn parse_object_id(value: &str, label: &str) -> Result<ObjectId, AppError> {
    ObjectId::from_str(value.trim()).map_err(|_| AppError::BadRequest(format!("invalid {label}")))
}

pub(super) fn parse_optional_object_id(
    value: Option<&str>,
    label: &str,
) -> Result<Option<ObjectId>, AppError> {
    match clean_opt(value.map(str::to_string)) {
        Some(v) => Ok(Some(parse_object_id(&v, label)?)),
        None => Ok(None),
    }
}

/// RFC 3339 timestamp, or a bare `YYYY-MM-DD` taken as midnight UTC.
pub(super) fn parse_datetime_field(value: &str, label: &str) -> Result<DateTime, AppError> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_rfc3339_str(value) {
        return Ok(dt);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| DateTime::from_chrono(naive.and_utc()))
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "{label} must be a date (2024-01-01) or RFC 3339 timestamp"
            ))
        })
}

pub(super) fn clean_opt(input: Option<String>) -> Option<String> {
    input.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

pub(super) fn hex(id: Option<ObjectId>) -> String {
    id.map(|id| id.to_hex()).unwrap_or_default()
}

pub(super) fn rfc3339(value: Option<DateTime>) -> Option<String> {
    value.and_then(|dt| dt.try_to_rfc3339_string().ok())
}
