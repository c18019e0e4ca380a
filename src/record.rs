//! Parsing of raw log lines into [`AppsInstalled`] records.
//!
//! A line is `device-type \t device-id \t lat \t lon \t app,app,...`.
//! Only structural problems (field count, empty identifiers) reject a line.
//! Malformed coordinates fall back to `0.0` and non-numeric app ids are
//! dropped; both are reported as warnings through the sink.

use crate::error::ParseError;
use crate::sink::Sink;
use serde::{Deserialize, Serialize};

const FIELD_COUNT: usize = 5;

/// One device and the apps installed on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppsInstalled {
    pub dev_type: String,
    pub dev_id: String,
    pub lat: f64,
    pub lon: f64,
    pub apps: Vec<u32>,
}

/// Parse one line.
///
/// Surrounding whitespace, tabs included, is stripped before the line is
/// split, so a trailing tab never creates an extra empty field.
///
/// # Examples
///
/// ```
/// use appsload::record::parse_appsinstalled;
/// use appsload::testing::MemorySink;
///
/// let sink = MemorySink::new();
/// let rec = parse_appsinstalled("idfa\tabc\t55.55\t42.42\t1,x,3", &sink).unwrap();
/// assert_eq!(rec.apps, vec![1, 3]);
/// ```
///
/// # Errors
///
/// Returns [`ParseError`] when the line does not have exactly 5 tab-separated
/// fields or when the device type or id is empty. Malformed coordinates and
/// app ids are never errors. Never panics.
pub fn parse_appsinstalled(line: &str, sink: &dyn Sink) -> Result<AppsInstalled, ParseError> {
    let line = line.trim();
    let parts: Vec<&str> = line.split('\t').collect();
    if parts.len() != FIELD_COUNT {
        return Err(ParseError::FieldCount { found: parts.len() });
    }
    let [dev_type, dev_id, lat, lon, raw_apps] = [parts[0], parts[1], parts[2], parts[3], parts[4]];
    if dev_type.is_empty() {
        return Err(ParseError::EmptyDeviceType);
    }
    if dev_id.is_empty() {
        return Err(ParseError::EmptyDeviceId);
    }

    let apps = match parse_apps_strict(raw_apps) {
        Some(apps) => apps,
        None => {
            sink.warn(&format!("Not all user apps are digits: `{line}`"));
            parse_apps_lenient(raw_apps)
        }
    };

    let lat = parse_coord(lat).unwrap_or_else(|| {
        sink.warn(&format!("Invalid latitude, using 0.0: `{line}`"));
        0.0
    });
    let lon = parse_coord(lon).unwrap_or_else(|| {
        sink.warn(&format!("Invalid longitude, using 0.0: `{line}`"));
        0.0
    });

    Ok(AppsInstalled {
        dev_type: dev_type.to_string(),
        dev_id: dev_id.to_string(),
        lat,
        lon,
        apps,
    })
}

/// Every comma-separated entry must parse, otherwise `None`.
fn parse_apps_strict(raw: &str) -> Option<Vec<u32>> {
    raw.split(',').map(|a| a.trim().parse::<u32>().ok()).collect()
}

/// Keeps only entries made entirely of ASCII digits that fit in a `u32`.
fn parse_apps_lenient(raw: &str) -> Vec<u32> {
    raw.split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty() && a.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|a| a.parse::<u32>().ok())
        .collect()
}

fn parse_coord(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok()
}
