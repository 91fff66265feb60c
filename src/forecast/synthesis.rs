/// Turns a rendered prompt into a validated forecast.
///
/// The model's text must be exactly one JSON object. It is parsed strictly:
/// no fence stripping, no repair. Metadata fields are always taken from the
/// request and snapshot, never from the model.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::claude::{ModelClient, ModelError};
use super::prompt::PromptPayload;
use crate::logging::{self, DataSource};
use crate::model::{ForecastFailure, ForecastReport, ForecastRequest, ForecastResponse, RiskLevel};

#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("model call failed: {0}")]
    Model(#[from] ModelError),

    #[error("model output is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("model output does not match the forecast schema: {0}")]
    Schema(String),
}

/// The model-authored half of a report.
#[derive(Debug, Deserialize)]
struct Assessment {
    risk_level: RiskLevel,
    risk_score: i64,
    confidence: i64,
    key_factors: Vec<String>,
    reasoning: String,
    recommendations: Vec<String>,
    temporal_forecast: String,
}

impl Assessment {
    fn parse(text: &str) -> Result<Self, SynthesisError> {
        let value: Value = serde_json::from_str(text)?;
        if !value.is_object() {
            return Err(SynthesisError::Schema("expected a JSON object".to_string()));
        }
        let assessment: Assessment =
            serde_json::from_value(value).map_err(|e| SynthesisError::Schema(e.to_string()))?;

        if assessment.risk_level == RiskLevel::Error {
            return Err(SynthesisError::Schema("risk_level ERROR is reserved for failures".to_string()));
        }
        Ok(assessment)
    }

    fn score(name: &str, value: i64) -> Result<u8, SynthesisError> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= 100)
            .ok_or_else(|| SynthesisError::Schema(format!("{} {} is outside 0..=100", name, value)))
    }
}

pub struct ForecastSynthesizer<'a> {
    model: &'a dyn ModelClient,
}

impl<'a> ForecastSynthesizer<'a> {
    pub fn new(model: &'a dyn ModelClient) -> Self {
        Self { model }
    }

    pub fn synthesize(&self, payload: &PromptPayload) -> Result<ForecastReport, SynthesisError> {
        self.synthesize_at(payload, Utc::now())
    }

    /// As [`synthesize`](Self::synthesize), stamping `generated_at` with `now`.
    pub fn synthesize_at(
        &self,
        payload: &PromptPayload,
        now: DateTime<Utc>,
    ) -> Result<ForecastReport, SynthesisError> {
        let text = self.model.complete(&payload.prompt)?;
        let assessment = Assessment::parse(text.trim())?;
        let request = &payload.request;

        Ok(ForecastReport {
            risk_level: assessment.risk_level,
            risk_score: Assessment::score("risk_score", assessment.risk_score)?,
            confidence: Assessment::score("confidence", assessment.confidence)?,
            key_factors: assessment.key_factors,
            reasoning: assessment.reasoning,
            recommendations: assessment.recommendations,
            temporal_forecast: assessment.temporal_forecast,
            location: request.location_name.clone(),
            coordinates: request.coordinate.as_pair(),
            generated_at: now.to_rfc3339_opts(SecondsFormat::Secs, true),
            model: self.model.model_label().to_string(),
            sources_analyzed: payload.sources_analyzed,
            forecast_period: request.forecast_hours.period_label(),
            texas_mesonet_stations: payload.mesonet_stations,
        })
    }

    /// Synthesizes, collapsing any failure into the ERROR response shape.
    pub fn respond(&self, payload: &PromptPayload) -> ForecastResponse {
        match self.synthesize(payload) {
            Ok(report) => {
                logging::info(
                    DataSource::Model,
                    Some(self.model.model_label()),
                    &format!("Forecast {} ({}/100)", report.risk_level, report.risk_score),
                );
                ForecastResponse::Report(report)
            }
            Err(e) => failure(&payload.request, &e),
        }
    }
}

/// Builds and logs the ERROR response for `request`.
pub fn failure(request: &ForecastRequest, error: &dyn std::fmt::Display) -> ForecastResponse {
    let message = error.to_string();
    logging::error(DataSource::Model, None, &format!("Forecast failed: {}", message));
    ForecastResponse::Failure(ForecastFailure::new(request, message))
}
