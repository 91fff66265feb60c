/// Request entry adapter.
///
/// Takes the raw query-string map, runs collect → prompt → synthesize and
/// wraps the JSON body with a status code and CORS header. Every response
/// body, success or failure, is one of the two forecast shapes.

use std::collections::{BTreeMap, HashMap};

use serde_json::json;

use crate::config::ForecastConfig;
use crate::forecast::claude::ModelClient;
use crate::forecast::prompt;
use crate::forecast::synthesis::ForecastSynthesizer;
use crate::ingest::fetch::JsonTransport;
use crate::ingest::radar::ObjectLister;
use crate::logging::{self, DataSource};
use crate::model::{Coordinate, ForecastHours, ForecastRequest, ForecastResponse};
use crate::orchestrator::SourceOrchestrator;

// ---------------------------------------------------------------------------
// Request parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RequestError {
    #[error("missing required parameter '{0}'")]
    Missing(&'static str),

    #[error("parameter '{field}' is not a number: '{value}'")]
    NotANumber { field: &'static str, value: String },

    #[error("coordinates out of range: lat {lat}, lon {lon}")]
    OutOfRange { lat: f64, lon: f64 },
}

fn required<'p>(params: &'p HashMap<String, String>, field: &'static str) -> Result<&'p str, RequestError> {
    params
        .get(field)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or(RequestError::Missing(field))
}

fn number(params: &HashMap<String, String>, field: &'static str) -> Result<f64, RequestError> {
    let raw = required(params, field)?;
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| RequestError::NotANumber { field, value: raw.to_string() })
}

/// Verbatim when present; blank counts as absent.
fn forecast_hours(params: &HashMap<String, String>) -> ForecastHours {
    params
        .get("forecastHours")
        .filter(|v| !v.trim().is_empty())
        .map(|v| ForecastHours::new(v.as_str()))
        .unwrap_or_default()
}

/// Parses `lat`, `lon`, `location` and optional `forecastHours`.
pub fn parse_request(params: &HashMap<String, String>) -> Result<ForecastRequest, RequestError> {
    let lat = number(params, "lat")?;
    let lon = number(params, "lon")?;
    let location = required(params, "location")?;

    let coordinate = Coordinate::new(lat, lon);
    if !coordinate.is_valid() {
        return Err(RequestError::OutOfRange { lat, lon });
    }

    Ok(ForecastRequest {
        coordinate,
        location_name: location.to_string(),
        forecast_hours: forecast_hours(params),
    })
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    fn json(status_code: u16, body: String) -> Self {
        let headers = BTreeMap::from([
            ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
            ("Content-Type".to_string(), "application/json".to_string()),
        ]);
        Self { status_code, headers, body }
    }

    fn from_forecast(response: &ForecastResponse) -> Self {
        match serde_json::to_string(response) {
            Ok(body) => Self::json(200, body),
            Err(e) => Self::json(
                500,
                json!({"risk_level": "ERROR", "error": format!("could not encode response: {}", e)})
                    .to_string(),
            ),
        }
    }

    /// ERROR body for a request that never reached the pipeline. Fields
    /// that could be parsed are echoed; the rest are null.
    fn bad_request(params: &HashMap<String, String>, err: &RequestError) -> Self {
        let coordinates = match (number(params, "lat"), number(params, "lon")) {
            (Ok(lat), Ok(lon)) => json!([lat, lon]),
            _ => serde_json::Value::Null,
        };
        let body = json!({
            "risk_level": "ERROR",
            "error": err.to_string(),
            "location": required(params, "location").ok(),
            "coordinates": coordinates,
            "forecast_period": forecast_hours(params).period_label(),
        });
        Self::json(400, body.to_string())
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// The whole forecast pipeline over injected collaborators.
pub struct ForecastService<'a> {
    orchestrator: SourceOrchestrator<'a>,
    synthesizer: ForecastSynthesizer<'a>,
}

impl<'a> ForecastService<'a> {
    pub fn new(
        config: &'a ForecastConfig,
        transport: &'a dyn JsonTransport,
        lister: &'a dyn ObjectLister,
        model: &'a dyn ModelClient,
    ) -> Self {
        Self {
            orchestrator: SourceOrchestrator::new(config, transport, lister),
            synthesizer: ForecastSynthesizer::new(model),
        }
    }

    /// Collects, renders and synthesizes. Never fails: synthesis errors come
    /// back as the ERROR shape.
    pub fn run_forecast(&self, request: &ForecastRequest) -> ForecastResponse {
        logging::info(
            DataSource::System,
            Some(&request.location_name),
            &format!(
                "Forecast requested for ({}, {}), {} hours",
                request.coordinate.lat, request.coordinate.lon, request.forecast_hours
            ),
        );
        let snapshot = self.orchestrator.collect(request.coordinate);
        let payload = prompt::build(&snapshot, request);
        self.synthesizer.respond(&payload)
    }

    pub fn handle(&self, params: &HashMap<String, String>) -> HttpResponse {
        match parse_request(params) {
            Ok(request) => HttpResponse::from_forecast(&self.run_forecast(&request)),
            Err(e) => {
                logging::warn(DataSource::System, None, &format!("Rejected request: {}", e));
                HttpResponse::bad_request(params, &e)
            }
        }
    }
}
