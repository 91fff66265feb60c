/// Nearest-station selection around a target point.
///
/// Distance is a planar approximation: the Euclidean distance in degrees
/// scaled by 69 miles per degree. It ignores longitude convergence, which is
/// acceptable at the ~50 mile radii used here.

use crate::model::{Coordinate, StationReading};

pub const MILES_PER_DEGREE: f64 = 69.0;

/// A provider record in canonical units, before distance filtering.
///
/// Coordinates are optional because upstream records do not always carry
/// them; such records can never be selected.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StationCandidate {
    pub station_id: String,
    pub station_name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub temperature_f: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub precipitation_24h_in: Option<f64>,
    pub soil_moisture_pct: Option<f64>,
}

pub fn planar_distance_miles(target: Coordinate, lat: f64, lon: f64) -> f64 {
    let d_lat = target.lat - lat;
    let d_lon = target.lon - lon;
    (d_lat * d_lat + d_lon * d_lon).sqrt() * MILES_PER_DEGREE
}

/// Keeps stations within `radius_miles` of `target`, nearest first, at most
/// `limit` of them. Equal distances keep their input order.
pub fn select(
    stations: &[StationCandidate],
    target: Coordinate,
    radius_miles: f64,
    limit: usize,
) -> Vec<StationReading> {
    let mut nearby: Vec<StationReading> = stations
        .iter()
        .filter_map(|station| {
            let (lat, lon) = (station.latitude?, station.longitude?);
            let distance = planar_distance_miles(target, lat, lon);
            (distance <= radius_miles).then(|| StationReading {
                station_id: station.station_id.clone(),
                station_name: station.station_name.clone(),
                distance_miles: distance,
                temperature_f: station.temperature_f,
                humidity_pct: station.humidity_pct,
                precipitation_24h_in: station.precipitation_24h_in,
                soil_moisture_pct: station.soil_moisture_pct,
            })
        })
        .collect();

    // sort_by is stable, so ties stay in input order
    nearby.sort_by(|a, b| a.distance_miles.total_cmp(&b.distance_miles));
    nearby.truncate(limit);
    nearby
}
