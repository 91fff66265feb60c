/// NEXRAD Level II availability probe.
///
/// The radar archive is a public object-storage bucket keyed as
/// `YYYY/MM/DD/SITE/...`. The probe lists at most a few objects under
/// today's prefix for one radar site: any object means the radar is
/// reporting. This source is not JSON, and every listing failure is reported
/// as `Unavailable` rather than `Error`.

use chrono::NaiveDate;
use serde_json::json;
use std::time::Duration;

use crate::config::RadarConfig;
use crate::ingest::fetch::HttpClient;
use crate::logging;
use crate::model::{ProviderId, SourceError, SourceResult};

const PROVIDER: ProviderId = ProviderId::Radar;

/// Lists object keys under a prefix in a bucket.
pub trait ObjectLister: Sync {
    fn list_keys(
        &self,
        bucket_url: &str,
        prefix: &str,
        max_keys: u32,
        timeout: Duration,
    ) -> Result<Vec<String>, SourceError>;
}

/// Anonymous S3 ListObjectsV2 over plain HTTP.
impl ObjectLister for HttpClient {
    fn list_keys(
        &self,
        bucket_url: &str,
        prefix: &str,
        max_keys: u32,
        timeout: Duration,
    ) -> Result<Vec<String>, SourceError> {
        let url = format!(
            "{}/?list-type=2&prefix={}&max-keys={}",
            bucket_url.trim_end_matches('/'),
            prefix,
            max_keys
        );
        let body = self.get_text(&url, timeout)?;
        if !body.contains("<ListBucketResult") {
            return Err(SourceError::ParseError("response is not a bucket listing".to_string()));
        }
        Ok(extract_keys(&body))
    }
}

/// Pulls every `<Key>` value out of a ListObjectsV2 response body.
pub fn extract_keys(listing: &str) -> Vec<String> {
    const OPEN: &str = "<Key>";
    const CLOSE: &str = "</Key>";

    let mut keys = Vec::new();
    let mut rest = listing;
    while let Some(start) = rest.find(OPEN) {
        let after = &rest[start + OPEN.len()..];
        let Some(end) = after.find(CLOSE) else {
            break;
        };
        keys.push(after[..end].to_string());
        rest = &after[end + CLOSE.len()..];
    }
    keys
}

/// `2026/10/15/KEWX/`
pub fn radar_prefix(date: NaiveDate, site: &str) -> String {
    format!("{}/{}/", date.format("%Y/%m/%d"), site)
}

/// Active iff at least one object exists under the day's prefix.
pub fn probe_radar(
    lister: &dyn ObjectLister,
    config: &RadarConfig,
    date: NaiveDate,
    timeout: Duration,
) -> SourceResult {
    let prefix = radar_prefix(date, &config.site);

    let result = match lister.list_keys(&config.bucket_url(), &prefix, config.max_keys, timeout) {
        Ok(keys) if !keys.is_empty() => SourceResult::active(
            PROVIDER,
            json!({
                "radar_site": config.site,
                "objects_listed": keys.len(),
                "latest_key": keys.last(),
            }),
        ),
        Ok(_) => SourceResult::unavailable(PROVIDER, format!("No radar objects under {}", prefix)),
        Err(err) => SourceResult::unavailable(PROVIDER, err.to_string()),
    };

    match result.error_message() {
        None => logging::log_source_success(PROVIDER, Some(&config.site)),
        Some(reason) => logging::log_source_failure(PROVIDER, Some(&config.site), reason),
    }

    result
}
