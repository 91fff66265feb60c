/// Multi-source flood risk forecasting for a single point.
///
/// A request fans out to six environmental providers, fuses what comes back
/// into an `EnvironmentalSnapshot`, renders a prompt from it and asks a
/// generative model for a structured risk verdict.

pub mod analysis;
pub mod config;
pub mod forecast;
pub mod handler;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod orchestrator;
