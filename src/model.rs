/// Core data types for the flood forecast service.
///
/// This module defines the shared domain model imported by all other modules:
/// request parameters, per-provider results, station readings, regional
/// statistics, the fused snapshot, and the outbound forecast contract.
/// It contains no I/O.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// A WGS84 point supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// True when lat ∈ [-90, 90] and lon ∈ [-180, 180].
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }

    /// `[lat, lon]`, the shape echoed back in every response.
    pub fn as_pair(&self) -> [f64; 2] {
        [self.lat, self.lon]
    }
}

/// Forecast horizon exactly as the caller sent it.
///
/// Not validated against a fixed set of values; it is echoed verbatim into
/// the prompt and into `forecast_period`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastHours(String);

pub const DEFAULT_FORECAST_HOURS: &str = "24";

impl ForecastHours {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Label used for the `forecast_period` field, e.g. `"48_hours"`.
    pub fn period_label(&self) -> String {
        format!("{}_hours", self.0)
    }
}

impl Default for ForecastHours {
    fn default() -> Self {
        Self::new(DEFAULT_FORECAST_HOURS)
    }
}

impl fmt::Display for ForecastHours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One forecast request, already validated by the entry point.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    pub coordinate: Coordinate,
    pub location_name: String,
    pub forecast_hours: ForecastHours,
}

// ---------------------------------------------------------------------------
// Providers and per-source results
// ---------------------------------------------------------------------------

/// The external data sources consulted for every request.
///
/// Declaration order is the fixed collection order and also the iteration
/// order of `EnvironmentalSnapshot::per_provider`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProviderId {
    /// USGS NWIS instantaneous values (stream gauges).
    StreamGauge,
    /// State mesonet current conditions.
    Mesonet,
    /// NWS point / forecast / hourly / alerts chain.
    WeatherService,
    /// LCRA stage and flow for all sites.
    BasinFlow,
    /// LCRA Highland Lakes reservoir summary.
    BasinReservoirs,
    /// NEXRAD Level II object listing.
    Radar,
}

impl ProviderId {
    pub const ALL: [ProviderId; 6] = [
        ProviderId::StreamGauge,
        ProviderId::Mesonet,
        ProviderId::WeatherService,
        ProviderId::BasinFlow,
        ProviderId::BasinReservoirs,
        ProviderId::Radar,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ProviderId::StreamGauge => "USGS",
            ProviderId::Mesonet => "TexMesonet",
            ProviderId::WeatherService => "NWS",
            ProviderId::BasinFlow => "LCRA Flow",
            ProviderId::BasinReservoirs => "LCRA Lakes",
            ProviderId::Radar => "NEXRAD",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    Active,
    Unavailable,
    Error,
}

impl fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceStatus::Active => write!(f, "Active"),
            SourceStatus::Unavailable => write!(f, "Unavailable"),
            SourceStatus::Error => write!(f, "Error"),
        }
    }
}

/// Terminal state of one provider for one request.
///
/// `Unavailable` means a precondition was never met (no URL to call, no
/// nearby stations, empty listing). `Error` means the attempt was made and
/// failed in transport or parsing. Neither aborts the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutcome {
    Active(Value),
    Unavailable(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceResult {
    pub provider: ProviderId,
    pub outcome: SourceOutcome,
}

impl SourceResult {
    pub fn active(provider: ProviderId, payload: Value) -> Self {
        Self { provider, outcome: SourceOutcome::Active(payload) }
    }

    pub fn unavailable(provider: ProviderId, reason: impl Into<String>) -> Self {
        Self { provider, outcome: SourceOutcome::Unavailable(reason.into()) }
    }

    pub fn error(provider: ProviderId, message: impl Into<String>) -> Self {
        Self { provider, outcome: SourceOutcome::Error(message.into()) }
    }

    /// Maps a fetch failure onto the matching terminal state.
    pub fn from_source_error(provider: ProviderId, err: &SourceError) -> Self {
        match err {
            SourceError::MissingUrl(_) => Self::unavailable(provider, err.to_string()),
            _ => Self::error(provider, err.to_string()),
        }
    }

    pub fn status(&self) -> SourceStatus {
        match self.outcome {
            SourceOutcome::Active(_) => SourceStatus::Active,
            SourceOutcome::Unavailable(_) => SourceStatus::Unavailable,
            SourceOutcome::Error(_) => SourceStatus::Error,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status() == SourceStatus::Active
    }

    pub fn payload(&self) -> Option<&Value> {
        match &self.outcome {
            SourceOutcome::Active(payload) => Some(payload),
            _ => None,
        }
    }

    /// The reason or error text for a non-active result.
    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            SourceOutcome::Active(_) => None,
            SourceOutcome::Unavailable(reason) => Some(reason),
            SourceOutcome::Error(message) => Some(message),
        }
    }
}

// ---------------------------------------------------------------------------
// Station and regional types
// ---------------------------------------------------------------------------

/// A nearby mesonet station in canonical units (°F, %, inches).
///
/// Absent measurements stay `None`; they are never defaulted to zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationReading {
    pub station_id: String,
    pub station_name: String,
    pub distance_miles: f64,
    pub temperature_f: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub precipitation_24h_in: Option<f64>,
    pub soil_moisture_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalAverages {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub soil_saturation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalIndicators {
    pub high_precip_stations: usize,
    pub saturated_soil_stations: usize,
}

/// Reduction of the selected stations around the target point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalStats {
    pub stations_count: usize,
    pub averages: RegionalAverages,
    /// A sum, 0.0 when no station reported precipitation.
    pub precipitation_24h_total: f64,
    pub indicators: RegionalIndicators,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// The fused view of every provider for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentalSnapshot {
    pub source_count: usize,
    pub per_provider: BTreeMap<ProviderId, SourceResult>,
    pub regional: Option<RegionalStats>,
}

impl EnvironmentalSnapshot {
    /// Assembles a snapshot; `source_count` is the number of active results.
    pub fn assemble(results: Vec<SourceResult>, regional: Option<RegionalStats>) -> Self {
        let per_provider: BTreeMap<ProviderId, SourceResult> = results
            .into_iter()
            .map(|r| (r.provider, r))
            .collect();
        let source_count = per_provider.values().filter(|r| r.is_active()).count();

        Self { source_count, per_provider, regional }
    }

    pub fn result(&self, provider: ProviderId) -> Option<&SourceResult> {
        self.per_provider.get(&provider)
    }

    pub fn payload(&self, provider: ProviderId) -> Option<&Value> {
        self.result(provider).and_then(SourceResult::payload)
    }

    pub fn is_active(&self, provider: ProviderId) -> bool {
        self.result(provider).is_some_and(SourceResult::is_active)
    }

    /// Station count reported in the response, only when the mesonet was active.
    pub fn mesonet_stations(&self) -> Option<usize> {
        if !self.is_active(ProviderId::Mesonet) {
            return None;
        }
        self.regional.as_ref().map(|r| r.stations_count)
    }
}

// ---------------------------------------------------------------------------
// Output contract
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
    Error,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Moderate => "MODERATE",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
            RiskLevel::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// Successful forecast body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastReport {
    pub risk_level: RiskLevel,
    pub risk_score: u8,
    pub confidence: u8,
    pub key_factors: Vec<String>,
    pub reasoning: String,
    pub recommendations: Vec<String>,
    pub temporal_forecast: String,
    pub location: String,
    pub coordinates: [f64; 2],
    pub generated_at: String,
    pub model: String,
    pub sources_analyzed: usize,
    pub forecast_period: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texas_mesonet_stations: Option<usize>,
}

/// Failure body; `risk_level` is always `ERROR`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastFailure {
    pub risk_level: RiskLevel,
    pub error: String,
    pub location: String,
    pub coordinates: [f64; 2],
    pub forecast_period: String,
}

impl ForecastFailure {
    pub fn new(request: &ForecastRequest, error: impl Into<String>) -> Self {
        Self {
            risk_level: RiskLevel::Error,
            error: error.into(),
            location: request.location_name.clone(),
            coordinates: request.coordinate.as_pair(),
            forecast_period: request.forecast_hours.period_label(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ForecastResponse {
    Report(ForecastReport),
    Failure(ForecastFailure),
}

impl ForecastResponse {
    pub fn risk_level(&self) -> RiskLevel {
        match self {
            ForecastResponse::Report(r) => r.risk_level,
            ForecastResponse::Failure(f) => f.risk_level,
        }
    }

    pub fn is_error(&self) -> bool {
        self.risk_level() == RiskLevel::Error
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise while fetching from a single provider.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceError {
    /// Non-2xx HTTP response.
    HttpError(u16),
    /// Connection, TLS, or body read failure.
    Transport(String),
    /// The request did not complete within the per-source timeout.
    Timeout,
    /// The body was not the JSON (or listing) shape we expected.
    ParseError(String),
    /// A dependent URL was never produced upstream, so no call was made.
    MissingUrl(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::HttpError(code) => write!(f, "HTTP error: {}", code),
            SourceError::Transport(msg) => write!(f, "Transport error: {}", msg),
            SourceError::Timeout => write!(f, "Request timed out"),
            SourceError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            SourceError::MissingUrl(what) => write!(f, "No URL available for {}", what),
        }
    }
}

impl std::error::Error for SourceError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coordinate_range_validation() {
        assert!(Coordinate::new(30.3074, -97.7415).is_valid());
        assert!(Coordinate::new(-90.0, 180.0).is_valid());
        assert!(!Coordinate::new(90.5, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -180.1).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_forecast_hours_is_echoed_verbatim() {
        let hours = ForecastHours::new("48");
        assert_eq!(hours.as_str(), "48");
        assert_eq!(hours.period_label(), "48_hours");
        assert_eq!(ForecastHours::default().period_label(), "24_hours");

        let odd = ForecastHours::new("a week");
        assert_eq!(odd.period_label(), "a week_hours", "free text is not normalized");
    }

    #[test]
    fn test_missing_url_maps_to_unavailable_everything_else_to_error() {
        let missing = SourceResult::from_source_error(
            ProviderId::WeatherService,
            &SourceError::MissingUrl("hourly forecast".into()),
        );
        assert_eq!(missing.status(), SourceStatus::Unavailable);

        for err in [
            SourceError::HttpError(503),
            SourceError::Timeout,
            SourceError::Transport("connection reset".into()),
            SourceError::ParseError("expected value".into()),
        ] {
            let result = SourceResult::from_source_error(ProviderId::StreamGauge, &err);
            assert_eq!(result.status(), SourceStatus::Error, "{} should be an Error", err);
            assert!(result.payload().is_none());
            assert_eq!(result.error_message(), Some(err.to_string().as_str()));
        }
    }

    #[test]
    fn test_snapshot_counts_only_active_results() {
        let snapshot = EnvironmentalSnapshot::assemble(
            vec![
                SourceResult::active(ProviderId::StreamGauge, json!({})),
                SourceResult::error(ProviderId::Mesonet, "HTTP error: 500"),
                SourceResult::active(ProviderId::BasinFlow, json!([])),
                SourceResult::unavailable(ProviderId::Radar, "no objects"),
            ],
            None,
        );
        assert_eq!(snapshot.source_count, 2);
        assert!(snapshot.is_active(ProviderId::BasinFlow));
        assert!(!snapshot.is_active(ProviderId::Mesonet));
        assert!(snapshot.result(ProviderId::WeatherService).is_none());
    }

    #[test]
    fn test_per_provider_iterates_in_collection_order() {
        let snapshot = EnvironmentalSnapshot::assemble(
            vec![
                SourceResult::unavailable(ProviderId::Radar, "x"),
                SourceResult::unavailable(ProviderId::StreamGauge, "x"),
                SourceResult::unavailable(ProviderId::WeatherService, "x"),
            ],
            None,
        );
        let order: Vec<ProviderId> = snapshot.per_provider.keys().copied().collect();
        assert_eq!(
            order,
            vec![ProviderId::StreamGauge, ProviderId::WeatherService, ProviderId::Radar]
        );
    }

    #[test]
    fn test_mesonet_station_count_requires_active_mesonet() {
        let stats = RegionalStats {
            stations_count: 3,
            averages: RegionalAverages { temperature: None, humidity: None, soil_saturation: None },
            precipitation_24h_total: 0.0,
            indicators: RegionalIndicators { high_precip_stations: 0, saturated_soil_stations: 0 },
        };
        let active = EnvironmentalSnapshot::assemble(
            vec![SourceResult::active(ProviderId::Mesonet, json!([]))],
            Some(stats.clone()),
        );
        assert_eq!(active.mesonet_stations(), Some(3));

        let inactive = EnvironmentalSnapshot::assemble(
            vec![SourceResult::error(ProviderId::Mesonet, "boom")],
            Some(stats),
        );
        assert_eq!(inactive.mesonet_stations(), None);
    }

    #[test]
    fn test_risk_level_serializes_uppercase() {
        assert_eq!(serde_json::to_value(RiskLevel::Moderate).unwrap(), json!("MODERATE"));
        let parsed: RiskLevel = serde_json::from_value(json!("CRITICAL")).unwrap();
        assert_eq!(parsed, RiskLevel::Critical);
        assert!(serde_json::from_value::<RiskLevel>(json!("severe")).is_err());
    }

    #[test]
    fn test_failure_shape_echoes_request() {
        let request = ForecastRequest {
            coordinate: Coordinate::new(30.0, -98.0),
            location_name: "Kickapoo Kamp".into(),
            forecast_hours: ForecastHours::new("12"),
        };
        let body = serde_json::to_value(ForecastResponse::Failure(ForecastFailure::new(
            &request,
            "model unreachable",
        )))
        .unwrap();

        assert_eq!(
            body,
            json!({
                "risk_level": "ERROR",
                "error": "model unreachable",
                "location": "Kickapoo Kamp",
                "coordinates": [30.0, -98.0],
                "forecast_period": "12_hours"
            })
        );
    }
}
