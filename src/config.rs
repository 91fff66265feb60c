/// Service configuration loader - parses forecast.toml
///
/// Keeps provider endpoints, station selection limits, radar probe settings
/// and model parameters out of the code. Every key is optional; anything not
/// present in the file falls back to the built-in default, so
/// `ForecastConfig::default()` is a complete working configuration.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "forecast.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// TOML Configuration Structures
// ============================================================================

/// Root TOML structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub service: ServiceConfig,
    pub stations: StationConfig,
    pub providers: ProviderConfig,
    pub radar: RadarConfig,
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub user_agent: String,
    /// Per-provider request timeout.
    pub fetch_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            user_agent: "TexasFloodForecast/1.0".to_string(),
            fetch_timeout_secs: 8,
        }
    }
}

impl ServiceConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Nearest-station selection around the request point.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    pub radius_miles: f64,
    pub limit: usize,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self { radius_miles: 50.0, limit: 5 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub usgs_iv_url: String,
    /// Half-width of the stream-gauge bounding box, in degrees.
    pub usgs_bbox_half_width_deg: f64,
    pub nws_base_url: String,
    pub lcra_flow_url: String,
    pub lcra_lakes_url: String,
    pub mesonet_current_url: String,
    /// Station list used to fill in coordinates missing from current data.
    /// `None` or an empty string disables the lookup.
    pub mesonet_stations_url: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            usgs_iv_url: "https://waterservices.usgs.gov/nwis/iv/".to_string(),
            usgs_bbox_half_width_deg: 0.5,
            nws_base_url: "https://api.weather.gov".to_string(),
            lcra_flow_url: "https://hydromet.lcra.org/api/GetStageFlowForAllSites".to_string(),
            lcra_lakes_url: "https://hydromet.lcra.org/api/GetHighlandLakesSummary".to_string(),
            mesonet_current_url: "https://www.texmesonet.org/api/CurrentData".to_string(),
            mesonet_stations_url: Some("https://www.texmesonet.org/api/Stations".to_string()),
        }
    }
}

impl ProviderConfig {
    pub fn station_list_url(&self) -> Option<&str> {
        self.mesonet_stations_url.as_deref().filter(|url| !url.trim().is_empty())
    }
}

/// NEXRAD Level II availability probe.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RadarConfig {
    pub bucket: String,
    pub site: String,
    pub max_keys: u32,
    /// `{bucket}` is replaced with the bucket name.
    pub endpoint: String,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            bucket: "noaa-nexrad-level2".to_string(),
            site: "KEWX".to_string(),
            max_keys: 3,
            endpoint: "https://{bucket}.s3.amazonaws.com".to_string(),
        }
    }
}

impl RadarConfig {
    pub fn bucket_url(&self) -> String {
        self.endpoint.replace("{bucket}", &self.bucket)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub api_url: String,
    pub api_version: String,
    pub model_id: String,
    /// Short name reported in the `model` response field.
    pub label: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub api_key_env: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.anthropic.com/v1/messages".to_string(),
            api_version: "2023-06-01".to_string(),
            model_id: "claude-3-haiku-20240307".to_string(),
            label: "claude-3-haiku".to_string(),
            max_tokens: 800,
            timeout_secs: 30,
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
        }
    }
}

impl ModelConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Parses configuration from a TOML string and checks it for sanity.
pub fn parse_config(contents: &str, origin: &str) -> Result<ForecastConfig, ConfigError> {
    let config: ForecastConfig = toml::from_str(contents).map_err(|source| ConfigError::Parse {
        path: origin.to_string(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

/// Loads configuration from a TOML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ForecastConfig, ConfigError> {
    let display = path.as_ref().display().to_string();
    let contents = fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::Read {
        path: display.clone(),
        source,
    })?;
    parse_config(&contents, &display)
}

/// Loads `path` if it exists, otherwise returns the built-in defaults.
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<ForecastConfig, ConfigError> {
    if path.as_ref().exists() {
        load_config(path)
    } else {
        Ok(ForecastConfig::default())
    }
}

impl ForecastConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.service.fetch_timeout_secs == 0 {
            return Err(ConfigError::Invalid("service.fetch_timeout_secs must be > 0".into()));
        }
        if !(self.stations.radius_miles.is_finite() && self.stations.radius_miles > 0.0) {
            return Err(ConfigError::Invalid("stations.radius_miles must be positive".into()));
        }
        if self.stations.limit == 0 {
            return Err(ConfigError::Invalid("stations.limit must be > 0".into()));
        }
        if self.model.max_tokens == 0 {
            return Err(ConfigError::Invalid("model.max_tokens must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_service_constants() {
        let config = ForecastConfig::default();
        assert_eq!(config.service.fetch_timeout(), Duration::from_secs(8));
        assert_eq!(config.stations.radius_miles, 50.0);
        assert_eq!(config.stations.limit, 5);
        assert_eq!(config.providers.usgs_bbox_half_width_deg, 0.5);
        assert_eq!(config.radar.site, "KEWX");
        assert_eq!(config.model.max_tokens, 800);
        assert_eq!(
            config.providers.station_list_url(),
            Some("https://www.texmesonet.org/api/Stations"),
            "station-list matching is on by default"
        );
    }

    #[test]
    fn test_empty_station_list_url_disables_lookup() {
        let config = parse_config("[providers]\nmesonet_stations_url = \"\"\n", "inline").unwrap();
        assert_eq!(config.providers.station_list_url(), None);
    }

    #[test]
    fn test_partial_file_keeps_defaults_for_missing_keys() {
        let config = parse_config(
            r#"
            [stations]
            radius_miles = 25.0

            [radar]
            site = "KGRK"
            "#,
            "inline",
        )
        .expect("partial config should parse");

        assert_eq!(config.stations.radius_miles, 25.0);
        assert_eq!(config.stations.limit, 5, "limit should fall back to default");
        assert_eq!(config.radar.site, "KGRK");
        assert_eq!(config.radar.bucket, "noaa-nexrad-level2");
        assert_eq!(config.service.fetch_timeout_secs, 8);
    }

    #[test]
    fn test_empty_file_is_default_config() {
        let config = parse_config("", "inline").expect("empty config should parse");
        assert_eq!(config.model.model_id, ForecastConfig::default().model.model_id);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = parse_config("[stations]\nlimit = 0\n", "inline").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "got {:?}", err);

        let err = parse_config("[service]\nfetch_timeout_secs = 0\n", "inline").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "got {:?}", err);
    }

    #[test]
    fn test_malformed_toml_reports_origin() {
        let err = parse_config("[stations\nlimit = 3", "broken.toml").unwrap_err();
        assert!(err.to_string().contains("broken.toml"), "got: {}", err);
    }

    #[test]
    fn test_bucket_url_substitutes_bucket_name() {
        let radar = RadarConfig::default();
        assert_eq!(radar.bucket_url(), "https://noaa-nexrad-level2.s3.amazonaws.com");
    }

    #[test]
    fn test_shipped_config_file_loads() {
        let config = load_config(DEFAULT_CONFIG_PATH).expect("forecast.toml should load");
        assert_eq!(config.stations.limit, 5);
        assert_eq!(config.service.fetch_timeout_secs, 8);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = load_config_or_default("does-not-exist.toml").expect("defaults");
        assert_eq!(config.stations.radius_miles, 50.0);
        assert!(load_config("does-not-exist.toml").is_err());
    }
}
