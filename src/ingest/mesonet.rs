/// TexMesonet current-conditions client.
///
/// Turns the "current data" array into station candidates in canonical units
/// and, when a station list is available, fills in coordinates and names that
/// the current-data records lack. Field names have drifted between endpoint
/// versions, so a few spellings are accepted for each field.
///
/// Units as published:
///   - `precip24Hr`   millimetres, converted to inches
///   - `soilMoisture` volumetric fraction (0–1), converted to percent
///   - `airTemp`      °F
///   - `humidity`     %

use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::analysis::stations::StationCandidate;
use crate::model::SourceError;

const MM_PER_INCH: f64 = 25.4;

const ID_KEYS: &[&str] = &["stationId", "StationId", "station_id", "id"];
const NAME_KEYS: &[&str] = &["name", "stationName", "Name", "station_name"];
const LAT_KEYS: &[&str] = &["latitude", "Latitude", "lat"];
const LON_KEYS: &[&str] = &["longitude", "Longitude", "lon", "lng"];

/// Coordinates and name for one station from the station list.
#[derive(Debug, Clone, PartialEq)]
pub struct StationLocation {
    pub station_id: String,
    pub name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

// ============================================================================
// Unit conversion
// ============================================================================

/// Unrounded; thresholds are applied to the exact value and rounding happens
/// only in the regional totals.
pub fn mm_to_inches(mm: f64) -> f64 {
    mm / MM_PER_INCH
}

pub fn fraction_to_percent(fraction: f64) -> f64 {
    fraction * 100.0
}

// ============================================================================
// Parsing
// ============================================================================

/// Parses the current-data body into candidates in canonical units.
///
/// The records are expected under `data`; a bare top-level array is also
/// accepted. Anything else is a parse error. Records that are not objects
/// are skipped.
pub fn parse_current_data(body: &Value) -> Result<Vec<StationCandidate>, SourceError> {
    let records = records_of(body)
        .ok_or_else(|| SourceError::ParseError("current data has no `data` array".to_string()))?;

    Ok(records
        .iter()
        .filter_map(Value::as_object)
        .map(|record| StationCandidate {
            station_id: text_field(record, ID_KEYS).unwrap_or_default(),
            station_name: text_field(record, NAME_KEYS).unwrap_or_default(),
            latitude: numeric_field(record, LAT_KEYS),
            longitude: numeric_field(record, LON_KEYS),
            temperature_f: numeric_field(record, &["airTemp", "air_temp", "temperature"]),
            humidity_pct: numeric_field(record, &["humidity", "relativeHumidity"]),
            precipitation_24h_in: numeric_field(record, &["precip24Hr", "precip_24hr"])
                .map(mm_to_inches),
            soil_moisture_pct: numeric_field(record, &["soilMoisture", "soil_moisture"])
                .map(fraction_to_percent),
        })
        .collect())
}

/// Parses the station list. Entries without an id or coordinates are dropped.
pub fn parse_station_list(body: &Value) -> Vec<StationLocation> {
    records_of(body)
        .map(|records| {
            records
                .iter()
                .filter_map(Value::as_object)
                .filter_map(|record| {
                    Some(StationLocation {
                        station_id: text_field(record, ID_KEYS)?,
                        name: text_field(record, NAME_KEYS),
                        latitude: numeric_field(record, LAT_KEYS)?,
                        longitude: numeric_field(record, LON_KEYS)?,
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Fills missing coordinates and names from the station list, matched on id.
/// Values already present in the current-data record win.
pub fn backfill_locations(candidates: &mut [StationCandidate], stations: &[StationLocation]) {
    let by_id: HashMap<&str, &StationLocation> = stations
        .iter()
        .map(|s| (s.station_id.as_str(), s))
        .collect();

    for candidate in candidates.iter_mut() {
        let Some(station) = by_id.get(candidate.station_id.as_str()) else {
            continue;
        };
        if candidate.latitude.is_none() || candidate.longitude.is_none() {
            candidate.latitude = Some(station.latitude);
            candidate.longitude = Some(station.longitude);
        }
        if candidate.station_name.is_empty() {
            if let Some(name) = &station.name {
                candidate.station_name = name.clone();
            }
        }
    }
}

fn records_of(body: &Value) -> Option<&Vec<Value>> {
    body.get("data")
        .and_then(Value::as_array)
        .or_else(|| body.as_array())
}

/// First key present as a finite number or a numeric string.
fn numeric_field(record: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find_map(|value| match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .filter(|v| v.is_finite())
}

fn text_field(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find_map(|value| match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}
