//! Textual renderings shared by the CSV and JSON writers.

use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::error::ExportError;

const CSV_TIMESTAMP: &str = "%Y/%m/%d %-I:%M:%S %p";
const ISO_DATE: &str = "%Y-%m-%d";
const FILE_ROUTE: &str = "/admin/applicant-files/";
const COORDINATE_SCALE: f64 = 1e8;

/// Characters left untouched when a file key is embedded in a URL.
const FILE_KEY: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'*');

/// Cents rendered as a dollar amount with two decimals, e.g. `12345` -> `123.45`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let magnitude = cents.unsigned_abs();
    format!("{sign}{}.{:02}", magnitude / 100, magnitude % 100)
}

pub fn cents_to_dollars(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Latitude or longitude in plain decimal notation, rounded to eight places.
pub fn format_coordinate(degrees: f64) -> String {
    let rounded = (degrees * COORDINATE_SCALE).round() / COORDINATE_SCALE;
    if rounded == 0.0 {
        return "0".to_string();
    }
    rounded.to_string()
}

pub fn format_iso_date(date: NaiveDate) -> String {
    date.format(ISO_DATE).to_string()
}

pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), ISO_DATE).ok()
}

/// Dates stored as epoch milliseconds resolve to their UTC calendar day.
pub fn date_from_epoch_millis(millis: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp_millis(millis).map(|instant| instant.date_naive())
}

pub fn format_csv_timestamp(instant: DateTime<Utc>, zone: FixedOffset) -> String {
    instant.with_timezone(&zone).format(CSV_TIMESTAMP).to_string()
}

pub fn format_json_timestamp(instant: DateTime<Utc>, zone: FixedOffset) -> String {
    instant
        .with_timezone(&zone)
        .to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Download link for an uploaded file key.
pub fn file_url(base_url: &str, file_key: &str) -> String {
    format!(
        "{}{}{}",
        base_url.trim_end_matches('/'),
        FILE_ROUTE,
        utf8_percent_encode(file_key, FILE_KEY)
    )
}

/// E.164 rendering of a stored phone number.
///
/// Only North American numbers are stored, so anything else is rejected.
pub fn format_e164(number: &str, country_code: &str) -> Result<String, ExportError> {
    let digits: String = number.chars().filter(char::is_ascii_digit).collect();
    match country_code.trim().to_ascii_uppercase().as_str() {
        "US" | "CA" => {
            let national = match digits.len() {
                10 => digits.as_str(),
                11 if digits.starts_with('1') => &digits[1..],
                _ => {
                    return Err(ExportError::InvalidAnswer {
                        path: "phone_number".to_string(),
                        reason: format!("'{number}' is not a ten digit number"),
                    })
                }
            };
            Ok(format!("+1{national}"))
        }
        other => Err(ExportError::InvalidAnswer {
            path: "country_code".to_string(),
            reason: format!("unsupported phone country '{other}'"),
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceAreaState {
    InArea,
    NotInArea,
    Failed,
}

impl ServiceAreaState {
    pub const fn serialized(self) -> &'static str {
        match self {
            Self::InArea => "InArea",
            Self::NotInArea => "NotInArea",
            Self::Failed => "Failed",
        }
    }
}

/// Result of checking an address against one service area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAreaInclusion {
    pub service_area_id: String,
    pub state: ServiceAreaState,
    pub timestamp: i64,
}

/// `springfieldCounty_InArea_1709069741,portland_NotInArea_1709069741`
pub fn format_service_areas(areas: &[ServiceAreaInclusion]) -> String {
    areas
        .iter()
        .map(|area| {
            format!(
                "{}_{}_{}",
                area.service_area_id,
                area.state.serialized(),
                area.timestamp
            )
        })
        .collect::<Vec<_>>()
        .join(",")
}
