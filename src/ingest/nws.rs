/// National Weather Service API chain.
///
/// The point endpoint resolves a coordinate to its forecast grid; the
/// forecast, hourly forecast and active alerts are then fetched concurrently.
/// A failed point lookup short-circuits the three dependents only.
///
/// API Documentation: https://www.weather.gov/documentation/services-web-api

use serde_json::Value;
use std::thread;

use crate::ingest::fetch::SourceFetcher;
use crate::model::{Coordinate, ProviderId, SourceResult, SourceStatus};

const PROVIDER: ProviderId = ProviderId::WeatherService;

// ============================================================================
// URL construction
// ============================================================================

/// NWS rejects points with more than 4 decimal places.
pub fn point_url(base_url: &str, target: Coordinate) -> String {
    format!("{}/points/{:.4},{:.4}", base_url, target.lat, target.lon)
}

pub fn alerts_url(base_url: &str, target: Coordinate) -> String {
    format!("{}/alerts/active?point={:.4},{:.4}", base_url, target.lat, target.lon)
}

/// Forecast URLs advertised by a point response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridEndpoints {
    pub forecast: Option<String>,
    pub hourly: Option<String>,
}

pub fn grid_endpoints(point: &Value) -> GridEndpoints {
    let property = |key: &str| {
        point
            .get("properties")
            .and_then(|p| p.get(key))
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    GridEndpoints {
        forecast: property("forecast"),
        hourly: property("forecastHourly"),
    }
}

/// Number of active alert features, 0 when the shape is not as expected.
pub fn count_alerts(payload: &Value) -> usize {
    payload
        .get("features")
        .and_then(Value::as_array)
        .map_or(0, Vec::len)
}

// ============================================================================
// Chain
// ============================================================================

/// Outcome of every step of the chain.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherChain {
    pub point: SourceResult,
    pub forecast: Option<SourceResult>,
    pub hourly: Option<SourceResult>,
    pub alerts: Option<SourceResult>,
}

impl WeatherChain {
    /// Folds the chain into a single provider result.
    ///
    /// Active iff at least one of forecast/hourly/alerts succeeded; the payload
    /// holds each dependent's body under its own key (null when it failed).
    pub fn into_source_result(self) -> SourceResult {
        if !self.point.is_active() {
            let reason = format!(
                "grid point resolution failed: {}",
                self.point.error_message().unwrap_or("unknown")
            );
            return match self.point.status() {
                SourceStatus::Unavailable => SourceResult::unavailable(PROVIDER, reason),
                _ => SourceResult::error(PROVIDER, reason),
            };
        }

        let steps = [
            ("forecast", &self.forecast),
            ("hourly", &self.hourly),
            ("alerts", &self.alerts),
        ];

        let mut payload = serde_json::Map::new();
        let mut failures = Vec::new();
        for (key, step) in steps {
            match step.as_ref().and_then(SourceResult::payload) {
                Some(body) => {
                    payload.insert(key.to_string(), body.clone());
                }
                None => {
                    payload.insert(key.to_string(), Value::Null);
                    let why = step
                        .as_ref()
                        .and_then(SourceResult::error_message)
                        .unwrap_or("not attempted");
                    failures.push(format!("{}: {}", key, why));
                }
            }
        }

        if failures.len() == steps.len() {
            SourceResult::error(PROVIDER, failures.join("; "))
        } else {
            SourceResult::active(PROVIDER, Value::Object(payload))
        }
    }
}

/// Runs the whole chain for `target`.
pub fn collect_weather(fetcher: &SourceFetcher<'_>, base_url: &str, target: Coordinate) -> WeatherChain {
    let point = fetcher.fetch_step(Some(&point_url(base_url, target)), PROVIDER, Some("point"));

    let Some(point_body) = point.payload() else {
        return WeatherChain { point, forecast: None, hourly: None, alerts: None };
    };

    let endpoints = grid_endpoints(point_body);
    let alerts_endpoint = alerts_url(base_url, target);

    let (forecast, hourly, alerts) = thread::scope(|s| {
        let forecast = s.spawn(|| {
            fetcher.fetch_step(endpoints.forecast.as_deref(), PROVIDER, Some("forecast"))
        });
        let hourly = s.spawn(|| {
            fetcher.fetch_step(endpoints.hourly.as_deref(), PROVIDER, Some("hourly"))
        });
        let alerts = fetcher.fetch_step(Some(&alerts_endpoint), PROVIDER, Some("alerts"));

        (
            joined(forecast.join(), "forecast"),
            joined(hourly.join(), "hourly"),
            alerts,
        )
    });

    WeatherChain {
        point,
        forecast: Some(forecast),
        hourly: Some(hourly),
        alerts: Some(alerts),
    }
}

/// A panicked worker is reported as an error result, never propagated.
pub(crate) fn joined(result: thread::Result<SourceResult>, step: &str) -> SourceResult {
    result.unwrap_or_else(|_| SourceResult::error(PROVIDER, format!("{} worker panicked", step)))
}
