/// Bounded single-attempt HTTP GET against one provider.
///
/// `JsonTransport` is the seam between the pipeline and the network: the
/// production implementation wraps a blocking `reqwest` client, tests plug in
/// canned responses. `SourceFetcher` turns every transport or parse failure
/// into a `SourceResult` state; nothing here returns a pipeline error.

use serde_json::Value;
use std::time::Duration;

use crate::logging;
use crate::model::{ProviderId, SourceError, SourceResult};

/// Performs one GET and returns the parsed JSON body.
///
/// Implementations must be shareable across the collection workers.
pub trait JsonTransport: Sync {
    fn get_json(&self, url: &str, timeout: Duration) -> Result<Value, SourceError>;
}

// ============================================================================
// reqwest implementation
// ============================================================================

/// Blocking HTTP client shared by every provider in a request.
pub struct HttpClient {
    client: reqwest::blocking::Client,
}

impl HttpClient {
    pub fn new(user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// GET `url` and return the body as text. Non-2xx is an error.
    pub fn get_text(&self, url: &str, timeout: Duration) -> Result<String, SourceError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(SourceError::HttpError(response.status().as_u16()));
        }

        response.text().map_err(transport_error)
    }
}

impl JsonTransport for HttpClient {
    fn get_json(&self, url: &str, timeout: Duration) -> Result<Value, SourceError> {
        let body = self.get_text(url, timeout)?;
        serde_json::from_str(&body).map_err(|e| SourceError::ParseError(e.to_string()))
    }
}

fn transport_error(err: reqwest::Error) -> SourceError {
    if err.is_timeout() {
        SourceError::Timeout
    } else {
        SourceError::Transport(err.to_string())
    }
}

// ============================================================================
// Fetcher
// ============================================================================

pub struct SourceFetcher<'a> {
    transport: &'a dyn JsonTransport,
    timeout: Duration,
}

impl<'a> SourceFetcher<'a> {
    pub fn new(transport: &'a dyn JsonTransport, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Fetch `url` for `provider`. A `None` url means the precondition for
    /// this call was never met and yields `Unavailable` without any I/O.
    pub fn fetch(&self, url: Option<&str>, provider: ProviderId) -> SourceResult {
        self.fetch_step(url, provider, None)
    }

    /// Like `fetch`, with a step label (e.g. `"hourly"`) for logging.
    pub fn fetch_step(&self, url: Option<&str>, provider: ProviderId, step: Option<&str>) -> SourceResult {
        match self.fetch_json(url, provider, step) {
            Ok(payload) => SourceResult::active(provider, payload),
            Err(err) => SourceResult::from_source_error(provider, &err),
        }
    }

    /// The raw result, for providers that post-process the body themselves.
    pub fn fetch_json(
        &self,
        url: Option<&str>,
        provider: ProviderId,
        step: Option<&str>,
    ) -> Result<Value, SourceError> {
        let outcome = match url {
            Some(url) => self.transport.get_json(url, self.timeout),
            None => Err(SourceError::MissingUrl(step.unwrap_or(provider.label()).to_string())),
        };

        match &outcome {
            Ok(_) => logging::log_source_success(provider, step),
            Err(err) => logging::log_source_failure(provider, step, &err.to_string()),
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceStatus;
    use serde_json::json;
    use std::sync::Mutex;

    /// Returns a fixed result and records the timeout it was called with.
    struct FixedTransport {
        result: Result<Value, SourceError>,
        seen: Mutex<Vec<(String, Duration)>>,
    }

    impl FixedTransport {
        fn new(result: Result<Value, SourceError>) -> Self {
            Self { result, seen: Mutex::new(Vec::new()) }
        }
    }

    impl JsonTransport for FixedTransport {
        fn get_json(&self, url: &str, timeout: Duration) -> Result<Value, SourceError> {
            self.seen.lock().unwrap().push((url.to_string(), timeout));
            self.result.clone()
        }
    }

    #[test]
    fn test_success_is_active_with_parsed_payload() {
        let transport = FixedTransport::new(Ok(json!({"value": {"timeSeries": []}})));
        let fetcher = SourceFetcher::new(&transport, Duration::from_secs(8));

        let result = fetcher.fetch(Some("https://example.test/iv"), ProviderId::StreamGauge);

        assert_eq!(result.status(), SourceStatus::Active);
        assert_eq!(result.payload(), Some(&json!({"value": {"timeSeries": []}})));
        assert!(result.error_message().is_none());
    }

    #[test]
    fn test_every_request_carries_the_configured_timeout() {
        let transport = FixedTransport::new(Ok(json!([])));
        let fetcher = SourceFetcher::new(&transport, Duration::from_secs(8));
        fetcher.fetch(Some("https://example.test/a"), ProviderId::BasinFlow);

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].1, Duration::from_secs(8));
    }

    #[test]
    fn test_timeout_and_parse_failures_become_error_state() {
        for err in [SourceError::Timeout, SourceError::ParseError("trailing characters".into())] {
            let transport = FixedTransport::new(Err(err.clone()));
            let fetcher = SourceFetcher::new(&transport, Duration::from_secs(8));

            let result = fetcher.fetch(Some("https://example.test"), ProviderId::BasinReservoirs);

            assert_eq!(result.status(), SourceStatus::Error);
            assert!(result.payload().is_none());
            assert_eq!(result.error_message(), Some(err.to_string().as_str()));
        }
    }

    #[test]
    fn test_missing_url_is_unavailable_and_makes_no_call() {
        let transport = FixedTransport::new(Ok(json!({})));
        let fetcher = SourceFetcher::new(&transport, Duration::from_secs(8));

        let result = fetcher.fetch_step(None, ProviderId::WeatherService, Some("hourly"));

        assert_eq!(result.status(), SourceStatus::Unavailable);
        assert!(result.error_message().unwrap().contains("hourly"));
        assert!(transport.seen.lock().unwrap().is_empty(), "no request should be sent");
    }
}
