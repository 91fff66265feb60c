/// Multi-source collection for one forecast request.
///
/// Every provider runs on its own scoped worker with its own request
/// timeout; the scope is the join barrier, so the snapshot is only assembled
/// once all providers have settled. A provider that fails, times out or
/// panics ends up as a non-active `SourceResult` and never affects the others.
///
/// There is no cancellation hook. A caller that stops waiting does not abort
/// in-flight calls; each one still runs to completion or to its own timeout.
/// None of them write anything, so an abandoned collection leaves no state.

use chrono::{NaiveDate, Utc};
use serde_json::json;
use std::thread::{self, ScopedJoinHandle};

use crate::analysis::{regional, stations};
use crate::config::ForecastConfig;
use crate::ingest::fetch::{JsonTransport, SourceFetcher};
use crate::ingest::radar::{self, ObjectLister};
use crate::ingest::{mesonet, nws, usgs};
use crate::logging;
use crate::model::{Coordinate, EnvironmentalSnapshot, ProviderId, RegionalStats, SourceResult};

pub struct SourceOrchestrator<'a> {
    config: &'a ForecastConfig,
    transport: &'a dyn JsonTransport,
    lister: &'a dyn ObjectLister,
}

impl<'a> SourceOrchestrator<'a> {
    pub fn new(
        config: &'a ForecastConfig,
        transport: &'a dyn JsonTransport,
        lister: &'a dyn ObjectLister,
    ) -> Self {
        Self { config, transport, lister }
    }

    /// Collects every provider for `target`, probing today's (UTC) radar prefix.
    pub fn collect(&self, target: Coordinate) -> EnvironmentalSnapshot {
        self.collect_on(target, Utc::now().date_naive())
    }

    /// As `collect`, with an explicit date for the radar probe.
    pub fn collect_on(&self, target: Coordinate, radar_date: NaiveDate) -> EnvironmentalSnapshot {
        let timeout = self.config.service.fetch_timeout();
        let fetcher = SourceFetcher::new(self.transport, timeout);
        let fetcher = &fetcher;
        let providers = &self.config.providers;

        let (results, regional) = thread::scope(|s| {
            let stream_gauge = s.spawn(move || {
                let url = usgs::build_bbox_url(
                    &providers.usgs_iv_url,
                    target,
                    providers.usgs_bbox_half_width_deg,
                );
                fetcher.fetch(Some(&url), ProviderId::StreamGauge)
            });
            let mesonet = s.spawn(move || self.collect_mesonet(fetcher, target));
            let weather = s.spawn(move || {
                nws::collect_weather(fetcher, &providers.nws_base_url, target).into_source_result()
            });
            let flow = s.spawn(move || {
                fetcher.fetch(Some(&providers.lcra_flow_url), ProviderId::BasinFlow)
            });
            let lakes = s.spawn(move || {
                fetcher.fetch(Some(&providers.lcra_lakes_url), ProviderId::BasinReservoirs)
            });
            let radar = s.spawn(move || {
                radar::probe_radar(self.lister, &self.config.radar, radar_date, timeout)
            });

            let (mesonet_result, regional) = settle(mesonet, || {
                (panicked(ProviderId::Mesonet), None)
            });

            let results = vec![
                settle(stream_gauge, || panicked(ProviderId::StreamGauge)),
                mesonet_result,
                settle(weather, || panicked(ProviderId::WeatherService)),
                settle(flow, || panicked(ProviderId::BasinFlow)),
                settle(lakes, || panicked(ProviderId::BasinReservoirs)),
                settle(radar, || panicked(ProviderId::Radar)),
            ];
            (results, regional)
        });

        let snapshot = EnvironmentalSnapshot::assemble(results, regional);
        logging::log_collection_summary(snapshot.source_count, ProviderId::ALL.len());
        snapshot
    }

    /// Current data (plus the optional station list) → nearest stations →
    /// regional statistics. Active iff at least one station is in range.
    fn collect_mesonet(
        &self,
        fetcher: &SourceFetcher<'_>,
        target: Coordinate,
    ) -> (SourceResult, Option<RegionalStats>) {
        const PROVIDER: ProviderId = ProviderId::Mesonet;
        let providers = &self.config.providers;
        let selection = &self.config.stations;

        let (current, station_list) = thread::scope(|s| {
            let station_list = providers.station_list_url().map(|url| {
                s.spawn(move || fetcher.fetch_json(Some(url), PROVIDER, Some("stations")))
            });
            let current =
                fetcher.fetch_json(Some(&providers.mesonet_current_url), PROVIDER, Some("current data"));
            let station_list = station_list.and_then(|handle| handle.join().ok()?.ok());
            (current, station_list)
        });

        let body = match current {
            Ok(body) => body,
            Err(err) => return (SourceResult::from_source_error(PROVIDER, &err), None),
        };
        let mut candidates = match mesonet::parse_current_data(&body) {
            Ok(candidates) => candidates,
            Err(err) => {
                logging::log_source_failure(PROVIDER, Some("current data"), &err.to_string());
                return (SourceResult::from_source_error(PROVIDER, &err), None);
            }
        };

        if let Some(list) = station_list {
            mesonet::backfill_locations(&mut candidates, &mesonet::parse_station_list(&list));
        }

        let readings = stations::select(&candidates, target, selection.radius_miles, selection.limit);
        match regional::aggregate(&readings) {
            Some(stats) => {
                let payload = json!({ "stations": readings, "regional": stats });
                (SourceResult::active(PROVIDER, payload), Some(stats))
            }
            None => {
                let reason = format!(
                    "No stations within {} miles ({} reporting)",
                    selection.radius_miles,
                    candidates.len()
                );
                logging::log_source_failure(PROVIDER, None, &reason);
                (SourceResult::unavailable(PROVIDER, reason), None)
            }
        }
    }
}

fn settle<T>(handle: ScopedJoinHandle<'_, T>, on_panic: impl FnOnce() -> T) -> T {
    handle.join().unwrap_or_else(|_| on_panic())
}

fn panicked(provider: ProviderId) -> SourceResult {
    SourceResult::error(provider, "collection worker panicked")
}
