/// Prompt rendering for the risk-assessment model.
///
/// The template is fixed. The only optional part is the mesonet block, which
/// is included when regional statistics exist. The forecast horizon is
/// substituted wherever the template talks about time; no hour value is
/// hardcoded.

use crate::ingest::{lcra, nws, usgs};
use crate::model::{EnvironmentalSnapshot, ForecastRequest, ProviderId, RegionalStats};
use crate::analysis::regional::{HIGH_PRECIP_THRESHOLD_IN, SATURATED_SOIL_THRESHOLD_PCT};

/// Everything the synthesizer needs: the rendered prompt plus the request
/// metadata it merges into the response.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptPayload {
    pub prompt: String,
    pub request: ForecastRequest,
    pub sources_analyzed: usize,
    pub mesonet_stations: Option<usize>,
}

pub fn build(snapshot: &EnvironmentalSnapshot, request: &ForecastRequest) -> PromptPayload {
    PromptPayload {
        prompt: render(snapshot, request),
        request: request.clone(),
        sources_analyzed: snapshot.source_count,
        mesonet_stations: snapshot.mesonet_stations(),
    }
}

fn render(snapshot: &EnvironmentalSnapshot, request: &ForecastRequest) -> String {
    let hours = request.forecast_hours.as_str();
    let count = |provider: ProviderId, counter: fn(&serde_json::Value) -> usize| {
        snapshot.payload(provider).map_or(0, counter)
    };
    let alerts = snapshot
        .payload(ProviderId::WeatherService)
        .and_then(|p| p.get("alerts"))
        .map_or(0, nws::count_alerts);
    let radar = if snapshot.is_active(ProviderId::Radar) { "reporting" } else { "not reporting" };

    let mut prompt = format!(
        "Generate a {hours}-hour flood forecast for {location} at {lat}, {lon}.\n\n\
         Data sources: {active} active\n\
         USGS gauges: {gauges}\n\
         LCRA stations: {flow}\n\
         Highland Lakes reservoirs: {lakes}\n\
         Weather alerts: {alerts}\n\
         NEXRAD radar: {radar}\n",
        location = request.location_name,
        lat = request.coordinate.lat,
        lon = request.coordinate.lon,
        active = snapshot.source_count,
        gauges = count(ProviderId::StreamGauge, usgs::count_time_series),
        flow = count(ProviderId::BasinFlow, lcra::count_entries),
        lakes = count(ProviderId::BasinReservoirs, lcra::count_entries),
    );

    if let Some(regional) = &snapshot.regional {
        prompt.push('\n');
        prompt.push_str(&regional_block(regional));
    }

    prompt.push_str(&format!(
        "\nAssess the flood risk over the next {hours} hours.\n\n\
         Respond with a single JSON object only, with no text before or after it, using exactly these fields:\n\
         {{\n\
         \x20   \"risk_level\": one of \"LOW\", \"MODERATE\", \"HIGH\", \"CRITICAL\",\n\
         \x20   \"risk_score\": integer from 0 to 100,\n\
         \x20   \"confidence\": integer from 0 to 100,\n\
         \x20   \"key_factors\": array of strings,\n\
         \x20   \"reasoning\": string, analysis specific to the {hours}-hour period,\n\
         \x20   \"recommendations\": array of strings,\n\
         \x20   \"temporal_forecast\": string, how the risk progresses over the {hours} hours\n\
         }}\n"
    ));

    prompt
}

fn regional_block(regional: &RegionalStats) -> String {
    let or_unknown = |value: Option<f64>| value.map_or_else(|| "unknown".to_string(), |v| v.to_string());
    let avg = &regional.averages;

    format!(
        "TexMesonet data ({stations} stations):\n\
         - Regional temperature: {temp}°F\n\
         - Regional humidity: {humidity}%\n\
         - Trailing-day precipitation total: {precip} inches\n\
         - Soil saturation: {soil}%\n\
         - Stations over {HIGH_PRECIP_THRESHOLD_IN} in of rain: {high}\n\
         - Stations with soil over {SATURATED_SOIL_THRESHOLD_PCT}% saturated: {saturated}\n",
        stations = regional.stations_count,
        temp = or_unknown(avg.temperature),
        humidity = or_unknown(avg.humidity),
        precip = regional.precipitation_24h_total,
        soil = or_unknown(avg.soil_saturation),
        high = regional.indicators.high_precip_stations,
        saturated = regional.indicators.saturated_soil_stations,
    )
}
