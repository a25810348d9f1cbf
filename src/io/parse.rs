use tracing::{info, warn};

use super::error::ParseError;
use crate::domain::AppsInstalled;

/// Number of tab-separated fields in a record line
pub const FIELD_COUNT: usize = 5;

const EXCERPT_CHARS: usize = 40;

/// Whether a raw line carries no record and must be skipped without counting
pub fn is_skipped(line: &str, header_marker: &str) -> bool {
    let line = line.trim();
    line.is_empty() || (!header_marker.is_empty() && line.contains(header_marker))
}

/// Parse one `dev_type \t dev_id \t lat \t lon \t apps` line
///
/// Invalid geo coordinates and non-numeric app ids are logged and
/// dropped; only a wrong field count or an empty device type/id rejects
/// the line.
pub fn parse_line(line: &str) -> Result<AppsInstalled, ParseError> {
    // Tabs delimit fields, so only other whitespace is stripped from the ends
    let line = line.trim_matches(|c: char| c.is_whitespace() && c != '\t');
    let fields: Vec<&str> = line.split('\t').collect();

    if fields.len() < FIELD_COUNT {
        return Err(ParseError::TooFewFields(fields.len()));
    }
    if fields.len() > FIELD_COUNT {
        return Err(ParseError::TooManyFields(fields.len()));
    }

    let (dev_type, dev_id, raw_lat, raw_lon, raw_apps) =
        (fields[0], fields[1], fields[2], fields[3], fields[4]);

    if dev_type.is_empty() {
        return Err(ParseError::MissingDeviceType);
    }
    if dev_id.is_empty() {
        return Err(ParseError::MissingDeviceId);
    }

    let (apps, rejected) = parse_apps(raw_apps);
    if rejected > 0 {
        warn!(rejected, line = excerpt(line), "Not all user apps are digits");
    }

    let lat = parse_coord(raw_lat);
    let lon = parse_coord(raw_lon);
    if lat.is_none() || lon.is_none() {
        info!(line = excerpt(line), "Invalid geo coords");
    }

    Ok(AppsInstalled {
        dev_type: dev_type.to_string(),
        dev_id: dev_id.to_string(),
        lat,
        lon,
        apps,
    })
}

/// Split a comma-separated app list, returning the parsed ids and the number of rejected tokens
fn parse_apps(raw: &str) -> (Vec<u32>, usize) {
    let mut apps = Vec::new();
    let mut rejected = 0;

    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match token.parse::<u32>() {
            Ok(app) => apps.push(app),
            Err(_) => rejected += 1,
        }
    }

    (apps, rejected)
}

fn parse_coord(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Leading part of a line for log context
pub fn excerpt(line: &str) -> &str {
    match line.char_indices().nth(EXCERPT_CHARS) {
        Some((idx, _)) => &line[..idx],
        None => line,
    }
}
