//! USGS earthquake feed client.
//!
//! Provides async HTTP access to the USGS GeoJSON summary feeds.
//! Uses reqwest with rustls for TLS.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::errors::FetchError;
use crate::models::{RawFeature, RawFeedEnvelope};

/// Default request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// User agent string for feed requests.
const USER_AGENT: &str = concat!("quakemap/", env!("CARGO_PKG_VERSION"));

/// USGS base URL for earthquake feeds.
const USGS_BASE_URL: &str = "https://earthquake.usgs.gov";

/// Magnitude threshold of a summary feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedMagnitude {
    All,
    M1,
    M25,
    M45,
    Significant,
}

impl FeedMagnitude {
    const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::M1 => "1.0",
            Self::M25 => "2.5",
            Self::M45 => "4.5",
            Self::Significant => "significant",
        }
    }
}

/// Time window of a summary feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedWindow {
    Hour,
    Day,
    Week,
    Month,
}

impl FeedWindow {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

/// A USGS summary feed, named `<magnitude>_<window>` (e.g. `all_day`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedType {
    pub magnitude: FeedMagnitude,
    pub window: FeedWindow,
}

impl FeedType {
    /// Every earthquake from the past day.
    pub const ALL_DAY: Self = Self {
        magnitude: FeedMagnitude::All,
        window: FeedWindow::Day,
    };

    /// Full URL of this feed.
    #[must_use]
    pub fn url(self) -> String {
        format!("{USGS_BASE_URL}/earthquakes/feed/v1.0/summary/{self}.geojson")
    }
}

impl Default for FeedType {
    fn default() -> Self {
        Self::ALL_DAY
    }
}

impl fmt::Display for FeedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.magnitude.as_str(), self.window.as_str())
    }
}

impl std::str::FromStr for FeedType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        let (mag, window) = lower
            .rsplit_once('_')
            .ok_or_else(|| format!("unknown feed type: {s} (expected <magnitude>_<window>)"))?;

        let magnitude = match mag {
            "all" => FeedMagnitude::All,
            "1.0" => FeedMagnitude::M1,
            "2.5" => FeedMagnitude::M25,
            "4.5" => FeedMagnitude::M45,
            "significant" => FeedMagnitude::Significant,
            _ => return Err(format!("unknown feed magnitude: {mag}")),
        };
        let window = match window {
            "hour" => FeedWindow::Hour,
            "day" => FeedWindow::Day,
            "week" => FeedWindow::Week,
            "month" => FeedWindow::Month,
            _ => return Err(format!("unknown feed window: {window}")),
        };

        Ok(Self { magnitude, window })
    }
}

/// Anything that can produce one batch of raw features per call.
///
/// The poller only talks to this seam, so tests can script responses.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the current feed contents.
    async fn fetch_events(&self) -> Result<Vec<RawFeature>, FetchError>;
}

/// Client for a USGS summary feed.
pub struct FeedClient {
    client: Client,
    url: String,
}

impl FeedClient {
    /// Create a client for a feed URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn with_url(url: impl Into<String>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl FeedSource for FeedClient {
    #[instrument(skip(self))]
    async fn fetch_events(&self) -> Result<Vec<RawFeature>, FetchError> {
        debug!("fetching feed from {}", self.url);

        let response = self.client.get(&self.url).send().await?;

        // Check status before parsing
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        let envelope = parse_envelope(&body)?;

        if let Some(meta) = &envelope.metadata {
            debug!(title = ?meta.title, generated = ?meta.generated, count = ?meta.count, "feed metadata");
        }
        debug!("fetched {} events", envelope.features.len());
        Ok(envelope.features)
    }
}

/// Decode and validate a feed body.
///
/// # Errors
///
/// Returns [`FetchError::Parse`] for malformed JSON or missing fields and
/// [`FetchError::InvalidResponse`] when the envelope is not a feature collection.
pub fn parse_envelope(body: &str) -> Result<RawFeedEnvelope, FetchError> {
    let envelope: RawFeedEnvelope = serde_json::from_str(body)?;
    envelope.validate()?;
    Ok(envelope)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_type_parse_and_display() {
        for name in ["all_day", "2.5_week", "significant_month", "4.5_hour"] {
            let parsed: FeedType = name.parse().expect("failed to parse");
            assert_eq!(parsed.to_string(), name);
        }
        assert!("all".parse::<FeedType>().is_err());
        assert!("3.0_day".parse::<FeedType>().is_err());
        assert!("all_year".parse::<FeedType>().is_err());
    }

    #[test]
    fn test_default_feed_url() {
        assert_eq!(
            FeedType::default().url(),
            "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_day.geojson"
        );
    }

    #[test]
    fn test_parse_envelope_sample() {
        let body = include_str!("../tests/fixtures/all_day_sample.json");
        let envelope = parse_envelope(body).expect("sample is valid");
        assert_eq!(envelope.features.len(), 3);
    }

    #[test]
    fn test_parse_envelope_empty_features() {
        let envelope =
            parse_envelope(r#"{"type":"FeatureCollection","features":[]}"#).expect("valid");
        assert!(envelope.features.is_empty());
    }

    #[test]
    fn test_parse_envelope_errors() {
        assert!(matches!(
            parse_envelope("<html>oops</html>"),
            Err(FetchError::Parse(_))
        ));
        assert!(matches!(
            parse_envelope(r#"{"type":"Nope","features":[]}"#),
            Err(FetchError::InvalidResponse(_))
        ));
    }

    /// Serve a tiny feed mirror on an ephemeral loopback port.
    async fn spawn_mirror() -> String {
        use axum::{Router, http::StatusCode, routing::get};

        let app = Router::new()
            .route(
                "/all_day.geojson",
                get(|| async { include_str!("../tests/fixtures/all_day_sample.json") }),
            )
            .route(
                "/down.geojson",
                get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mirror");
        let addr = listener.local_addr().expect("mirror addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_fetch_from_mirror() {
        let base = spawn_mirror().await;
        let client = FeedClient::with_url(format!("{base}/all_day.geojson")).expect("client");

        let features = client.fetch_events().await.expect("fetch");
        assert_eq!(features.len(), 3);
        assert_eq!(features[1].id, "nc73912345");
    }

    #[tokio::test]
    async fn test_non_success_status_is_api_error() {
        let base = spawn_mirror().await;
        let client = FeedClient::with_url(format!("{base}/down.geojson")).expect("client");

        match client.fetch_events().await {
            Err(FetchError::Api { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "maintenance");
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_refused_connection_is_http_error() {
        // Bind then drop to get a loopback port nobody listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let client = FeedClient::with_url(format!("http://{addr}/feed.geojson")).expect("client");
        assert!(matches!(
            client.fetch_events().await,
            Err(FetchError::Http(_))
        ));
    }
}
