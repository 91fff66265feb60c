//! Regional statistics over the selected stations.
//!
//! Mean-based fields are computed only over stations that reported a value
//! and are `None` when none did. Precipitation is a sum and is 0.0 when no
//! station reported it: "no rain recorded" and "no data" are
//! not distinguished for the total, unlike the averages.

use super::round_to;
use crate::model::{RegionalAverages, RegionalIndicators, RegionalStats, StationReading};

/// A station above this trailing-day total (inches) counts as a high-precipitation station.
pub const HIGH_PRECIP_THRESHOLD_IN: f64 = 0.5;

/// A station above this soil moisture (percent) counts as saturated.
pub const SATURATED_SOIL_THRESHOLD_PCT: f64 = 80.0;

/// Reduces `readings`, or `None` when there is nothing to reduce.
///
/// Callers treat `None` as "no usable regional data", which is different
/// from a region whose stations all reported zero.
pub fn aggregate(readings: &[StationReading]) -> Option<RegionalStats> {
    if readings.is_empty() {
        return None;
    }
    Some(summarize(readings))
}

/// Reduces `readings` unconditionally; an empty slice gives null averages
/// and a 0.0 precipitation total.
pub fn summarize(readings: &[StationReading]) -> RegionalStats {
    let temperatures = present(readings, |r| r.temperature_f);
    let humidity = present(readings, |r| r.humidity_pct);
    let precipitation = present(readings, |r| r.precipitation_24h_in);
    let soil = present(readings, |r| r.soil_moisture_pct);

    RegionalStats {
        stations_count: readings.len(),
        averages: RegionalAverages {
            temperature: mean(&temperatures),
            humidity: mean(&humidity),
            soil_saturation: mean(&soil),
        },
        precipitation_24h_total: round_to(precipitation.iter().sum(), 2),
        indicators: RegionalIndicators {
            high_precip_stations: precipitation
                .iter()
                .filter(|&&p| p > HIGH_PRECIP_THRESHOLD_IN)
                .count(),
            saturated_soil_stations: soil
                .iter()
                .filter(|&&s| s > SATURATED_SOIL_THRESHOLD_PCT)
                .count(),
        },
    }
}

fn present(readings: &[StationReading], field: impl Fn(&StationReading) -> Option<f64>) -> Vec<f64> {
    readings.iter().filter_map(field).collect()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(round_to(values.iter().sum::<f64>() / values.len() as f64, 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::mesonet;
    use serde_json::json;

    fn reading(
        id: &str,
        temperature_f: Option<f64>,
        humidity_pct: Option<f64>,
        precipitation_24h_in: Option<f64>,
        soil_moisture_pct: Option<f64>,
    ) -> StationReading {
        StationReading {
            station_id: id.to_string(),
            station_name: id.to_string(),
            distance_miles: 10.0,
            temperature_f,
            humidity_pct,
            precipitation_24h_in,
            soil_moisture_pct,
        }
    }

    #[test]
    fn test_empty_input_is_no_regional_data() {
        assert!(aggregate(&[]).is_none());
    }

    #[test]
    fn test_empty_summary_has_null_averages_but_zero_precip_total() {
        let stats = summarize(&[]);
        assert_eq!(stats.stations_count, 0);
        assert_eq!(stats.averages.temperature, None);
        assert_eq!(stats.averages.humidity, None);
        assert_eq!(stats.averages.soil_saturation, None);
        // Sum, not mean: absent precipitation totals 0.0 rather than null.
        assert_eq!(stats.precipitation_24h_total, 0.0);
    }

    #[test]
    fn test_all_null_fields_give_null_averages_and_zero_total() {
        let stats = aggregate(&[reading("A", None, None, None, None), reading("B", None, None, None, None)])
            .expect("non-empty input yields stats");

        assert_eq!(stats.stations_count, 2);
        assert_eq!(stats.averages.temperature, None);
        assert_eq!(stats.averages.humidity, None);
        assert_eq!(stats.averages.soil_saturation, None);
        assert_eq!(stats.precipitation_24h_total, 0.0);
        assert_eq!(stats.indicators.high_precip_stations, 0);
        assert_eq!(stats.indicators.saturated_soil_stations, 0);
    }

    #[test]
    fn test_nulls_are_excluded_not_counted_as_zero() {
        let stats = aggregate(&[
            reading("A", Some(70.0), None, Some(0.2), None),
            reading("B", None, Some(60.0), None, Some(90.0)),
            reading("C", Some(80.0), Some(80.0), Some(0.6), None),
        ])
        .unwrap();

        assert_eq!(stats.averages.temperature, Some(75.0), "mean of 70 and 80 only");
        assert_eq!(stats.averages.humidity, Some(70.0));
        assert_eq!(stats.averages.soil_saturation, Some(90.0));
        assert_eq!(stats.precipitation_24h_total, 0.8);
        assert_eq!(stats.stations_count, 3);
    }

    #[test]
    fn test_indicators_use_strict_thresholds() {
        let stats = aggregate(&[
            reading("A", None, None, Some(0.5), Some(80.0)),
            reading("B", None, None, Some(0.51), Some(80.1)),
            reading("C", None, None, Some(1.2), Some(95.0)),
            reading("D", None, None, None, None),
        ])
        .unwrap();

        assert_eq!(stats.indicators.high_precip_stations, 2, "0.5 exactly is not high");
        assert_eq!(stats.indicators.saturated_soil_stations, 2, "80 exactly is not saturated");
    }

    #[test]
    fn test_thresholds_see_unrounded_readings() {
        let just_over_half_inch = mesonet::mm_to_inches(12.8);
        let stats = aggregate(&[reading("A", None, None, Some(just_over_half_inch), Some(80.04))]).unwrap();

        assert_eq!(stats.indicators.high_precip_stations, 1, "0.504 in is over the threshold");
        assert_eq!(stats.indicators.saturated_soil_stations, 1);
        assert_eq!(stats.precipitation_24h_total, 0.5, "only the total is rounded");
    }

    #[test]
    fn test_averages_round_to_one_decimal() {
        let stats = aggregate(&[
            reading("A", Some(71.0), None, Some(0.111), None),
            reading("B", Some(72.0), None, Some(0.222), None),
            reading("C", Some(72.0), None, None, None),
        ])
        .unwrap();
        assert_eq!(stats.averages.temperature, Some(71.7));
        assert_eq!(stats.precipitation_24h_total, 0.33);
    }

    #[test]
    fn test_null_averages_serialize_as_present_keys() {
        let stats = summarize(&[]);
        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(
            value["averages"],
            json!({"temperature": null, "humidity": null, "soil_saturation": null})
        );
        assert_eq!(value["precipitation_24h_total"], json!(0.0));
    }
}
