/// Live provider checks against the real public endpoints.
///
/// These make real network calls and are ignored by default. Upstream
/// outages, rate limits or schema drift will show up here first.
///
/// Run with: cargo test --test live_sources -- --ignored --nocapture

use chrono::Utc;

use flocast_service::config::ForecastConfig;
use flocast_service::ingest::fetch::{HttpClient, JsonTransport, SourceFetcher};
use flocast_service::ingest::radar::{self, ObjectLister};
use flocast_service::ingest::{lcra, mesonet, nws, usgs};
use flocast_service::model::{Coordinate, ProviderId, SourceStatus};
use flocast_service::orchestrator::SourceOrchestrator;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

/// Downtown Austin, inside every provider's coverage area.
fn austin() -> Coordinate {
    Coordinate::new(30.2672, -97.7431)
}

fn client(config: &ForecastConfig) -> HttpClient {
    HttpClient::new(&config.service.user_agent).expect("HTTP client builds")
}

// ---------------------------------------------------------------------------
// Individual providers
// ---------------------------------------------------------------------------

#[test]
#[ignore]
fn test_usgs_bbox_returns_time_series() {
    let config = ForecastConfig::default();
    let http = client(&config);
    let url = usgs::build_bbox_url(
        &config.providers.usgs_iv_url,
        austin(),
        config.providers.usgs_bbox_half_width_deg,
    );

    let body = http
        .get_json(&url, config.service.fetch_timeout())
        .expect("USGS responds with JSON");
    let count = usgs::count_time_series(&body);
    println!("USGS: {} time series around Austin", count);
    assert!(count > 0, "expected active gauges around Austin");
}

#[test]
#[ignore]
fn test_nws_chain_resolves_grid_point() {
    let config = ForecastConfig::default();
    let http = client(&config);
    let fetcher = SourceFetcher::new(&http, config.service.fetch_timeout());

    let chain = nws::collect_weather(&fetcher, &config.providers.nws_base_url, austin());
    println!("NWS point: {}", chain.point.status());
    assert!(chain.point.is_active(), "grid point should resolve for Austin");

    let result = chain.into_source_result();
    assert_eq!(result.status(), SourceStatus::Active);
}

#[test]
#[ignore]
fn test_mesonet_current_data_parses() {
    let config = ForecastConfig::default();
    let http = client(&config);

    let body = http
        .get_json(&config.providers.mesonet_current_url, config.service.fetch_timeout())
        .expect("mesonet responds with JSON");
    let candidates = mesonet::parse_current_data(&body).expect("current data shape");
    println!("TexMesonet: {} stations reporting", candidates.len());
    for c in candidates.iter().take(5) {
        println!(
            "  {} {} temp={:?} soil={:?} precip={:?}",
            c.station_id, c.station_name, c.temperature_f, c.soil_moisture_pct, c.precipitation_24h_in
        );
    }
}

#[test]
#[ignore]
fn test_lcra_endpoints_return_arrays() {
    let config = ForecastConfig::default();
    let http = client(&config);

    for (name, url) in [
        ("flow", &config.providers.lcra_flow_url),
        ("lakes", &config.providers.lcra_lakes_url),
    ] {
        let body = http
            .get_json(url, config.service.fetch_timeout())
            .unwrap_or_else(|e| panic!("LCRA {} failed: {}", name, e));
        println!("LCRA {}: {} entries", name, lcra::count_entries(&body));
        assert!(body.is_array(), "LCRA {} should be a flat array", name);
    }
}

#[test]
#[ignore]
fn test_nexrad_bucket_lists_today() {
    let config = ForecastConfig::default();
    let http = client(&config);
    let prefix = radar::radar_prefix(Utc::now().date_naive(), &config.radar.site);

    let keys = http
        .list_keys(
            &config.radar.bucket_url(),
            &prefix,
            config.radar.max_keys,
            config.service.fetch_timeout(),
        )
        .expect("bucket listing succeeds");
    println!("NEXRAD {}: {:?}", prefix, keys);
}

// ---------------------------------------------------------------------------
// Full collection
// ---------------------------------------------------------------------------

#[test]
#[ignore]
fn test_full_collection_around_austin() {
    let config = ForecastConfig::default();
    let http = client(&config);

    let snapshot = SourceOrchestrator::new(&config, &http, &http).collect(austin());

    println!("{} of {} providers active", snapshot.source_count, ProviderId::ALL.len());
    for (provider, result) in &snapshot.per_provider {
        println!(
            "  {:<12} {:<12} {}",
            provider.label(),
            result.status(),
            result.error_message().unwrap_or("")
        );
    }
    if let Some(regional) = &snapshot.regional {
        println!("  regional: {:?}", regional);
    }
    assert_eq!(snapshot.per_provider.len(), ProviderId::ALL.len());
}
