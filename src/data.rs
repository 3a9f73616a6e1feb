use anyhow::{Result, anyhow, bail};
use chrono::{NaiveDate, NaiveDateTime};

use crate::types::StorageType;

pub fn parse_naive_date(value: &str) -> Result<NaiveDate> {
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}

pub fn parse_naive_datetime(value: &str) -> Result<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%d/%m/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as datetime"))
}

/// Accepts both full timestamps and bare dates (taken as midnight).
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    if let Ok(parsed) = parse_naive_datetime(value) {
        return Ok(parsed);
    }
    parse_naive_date(value)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| anyhow!("Failed to parse '{value}' as datetime"))
}

/// Literal boolean tokens as a columnar decoder reads them.
pub fn is_boolean_literal(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false")
}

pub fn parse_boolean(value: &str) -> Result<bool> {
    let lowered = value.to_ascii_lowercase();
    let parsed = match lowered.as_str() {
        "true" | "t" | "yes" | "y" | "1" => true,
        "false" | "f" | "no" | "n" | "0" => false,
        _ => bail!("Failed to parse '{value}' as boolean"),
    };
    Ok(parsed)
}

/// Tokens that a decoder reads as a missing value.
pub fn is_null_token(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || matches!(
            trimmed,
            "nan" | "NaN" | "NAN" | "NA" | "N/A" | "n/a" | "null" | "NULL" | "None" | "none"
        )
}

/// Checks that a non-missing value can be stored in a column of `ty`.
pub fn check_storable(value: &str, ty: StorageType) -> Result<()> {
    let trimmed = value.trim();
    match ty {
        StorageType::String | StorageType::Unicode => Ok(()),
        StorageType::Integer => trimmed
            .parse::<i64>()
            .map(|_| ())
            .map_err(|_| anyhow!("Failed to parse '{value}' as integer")),
        StorageType::Float | StorageType::Numeric => trimmed
            .parse::<f64>()
            .map(|_| ())
            .map_err(|_| anyhow!("Failed to parse '{value}' as number")),
        StorageType::Boolean => parse_boolean(trimmed).map(|_| ()),
        StorageType::DateTime => parse_timestamp(trimmed).map(|_| ()),
    }
}
