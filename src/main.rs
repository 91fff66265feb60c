/// flocast: run one flood forecast from the terminal.
///
/// Usage: flocast <lat> <lon> <location> [forecastHours]
///
/// Environment (a `.env` file in the working directory is honoured):
/// - `ANTHROPIC_API_KEY` (or the variable named by `[model] api_key_env`)
/// - `FLOCAST_CONFIG`: config path, default `forecast.toml`
/// - `FLOCAST_LOG_FILE`: optional append-only log file

use std::collections::HashMap;
use std::env;
use std::process::ExitCode;

use flocast_service::config::{self, DEFAULT_CONFIG_PATH};
use flocast_service::forecast::claude::ClaudeClient;
use flocast_service::handler::ForecastService;
use flocast_service::ingest::fetch::HttpClient;
use flocast_service::logging::{self, DataSource, LogLevel};

const USAGE: &str = "usage: flocast <lat> <lon> <location> [forecastHours]";

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let log_file = env::var("FLOCAST_LOG_FILE").ok();
    logging::init_logger(LogLevel::Info, log_file.as_deref(), false);

    let args: Vec<String> = env::args().skip(1).collect();
    if !(3..=4).contains(&args.len()) {
        eprintln!("{}", USAGE);
        return ExitCode::from(2);
    }

    let mut params = HashMap::new();
    for (key, value) in ["lat", "lon", "location", "forecastHours"].iter().zip(&args) {
        params.insert(key.to_string(), value.clone());
    }

    let config_path = env::var("FLOCAST_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = match config::load_config_or_default(&config_path) {
        Ok(config) => config,
        Err(e) => {
            logging::error(DataSource::System, Some(&config_path), &e.to_string());
            return ExitCode::FAILURE;
        }
    };

    let http = match HttpClient::new(&config.service.user_agent) {
        Ok(http) => http,
        Err(e) => {
            logging::error(DataSource::System, None, &format!("Could not build HTTP client: {}", e));
            return ExitCode::FAILURE;
        }
    };
    let model = match ClaudeClient::from_config(&config.model) {
        Ok(model) => model,
        Err(e) => {
            logging::error(DataSource::Model, None, &e.to_string());
            return ExitCode::FAILURE;
        }
    };

    let service = ForecastService::new(&config, &http, &http, &model);
    let response = service.handle(&params);

    let body = serde_json::from_str::<serde_json::Value>(&response.body)
        .and_then(|value| serde_json::to_string_pretty(&value))
        .unwrap_or(response.body);
    println!("{}", body);

    if response.status_code == 200 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
