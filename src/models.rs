//! Data models for the USGS GeoJSON summary feed and the normalized event.
//!
//! The raw types mirror the feed's wire shape and only carry the fields the
//! map needs. Every feature field they do carry is required: a missing or
//! `null` value fails the whole envelope instead of being defaulted. Only
//! the metadata block is lenient.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::FetchError;

/// Top-level GeoJSON response from a USGS summary feed.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFeedEnvelope {
    /// Always "FeatureCollection"
    #[serde(rename = "type")]
    pub type_: String,

    /// Feed metadata, used for logging only
    #[serde(default)]
    pub metadata: Option<FeedMetadata>,

    /// Earthquake events, in feed order
    pub features: Vec<RawFeature>,
}

impl RawFeedEnvelope {
    /// Validate the response structure.
    pub fn validate(&self) -> Result<(), FetchError> {
        if self.type_ != "FeatureCollection" {
            return Err(FetchError::InvalidResponse(format!(
                "expected type 'FeatureCollection', got '{}'",
                self.type_
            )));
        }
        Ok(())
    }
}

/// Metadata block of a summary feed. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeedMetadata {
    /// When this feed was generated (ms since epoch)
    pub generated: Option<i64>,

    /// Human-readable title
    pub title: Option<String>,

    /// Number of events in response
    pub count: Option<usize>,
}

/// A single earthquake event as delivered by the feed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawFeature {
    /// Feed-assigned event ID, unique within one response
    pub id: String,

    pub properties: RawProperties,

    pub geometry: RawGeometry,
}

/// Event properties from the feed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawProperties {
    /// Magnitude value (negative for very small quakes)
    pub mag: f64,

    /// Human-readable place description
    pub place: String,

    /// Event time, delivered as ms since epoch
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub time: DateTime<Utc>,

    /// Event page URL
    pub url: String,

    /// Human-readable title
    pub title: String,

    /// Alert level: null, "green", "yellow", "orange", "red"
    pub alert: Option<String>,

    /// Tsunami flag: 0 or 1
    pub tsunami: i32,
}

/// Point geometry for an event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawGeometry {
    /// Coordinates: [longitude, latitude, depth_km]
    pub coordinates: [f64; 3],
}

/// Position of an event. Depth is in kilometers, positive down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    pub depth_km: f64,
}

/// Normalized earthquake event held by the map view.
///
/// Values are taken verbatim from the feed; only the shape changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub id: String,
    pub magnitude: f64,
    pub coordinates: Coordinates,
    pub title: String,
    pub place: String,
    pub url: String,
    pub alert: Option<String>,
    pub tsunami: bool,
    pub time: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = include_str!("../tests/fixtures/all_day_sample.json");

    #[test]
    fn test_parse_sample_feed() {
        let feed: RawFeedEnvelope =
            serde_json::from_str(SAMPLE).expect("failed to parse sample feed");

        feed.validate().expect("invalid feed");
        assert_eq!(feed.features.len(), 3);
        assert_eq!(feed.metadata.as_ref().and_then(|m| m.count), Some(3));

        let first = &feed.features[0];
        assert_eq!(first.id, "us7000abcd");
        assert!((first.properties.mag - 6.5).abs() < f64::EPSILON);
        assert_eq!(first.properties.tsunami, 1);
        assert_eq!(first.properties.alert.as_deref(), Some("yellow"));
        assert_eq!(first.properties.time.timestamp_millis(), 1_705_312_800_000);
        assert!((first.geometry.coordinates[2] - 35.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_wrong_envelope_type_is_rejected() {
        let json = r#"{"type":"Feature","features":[]}"#;
        let feed: RawFeedEnvelope = serde_json::from_str(json).expect("shape is valid");
        assert!(matches!(
            feed.validate(),
            Err(FetchError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_partial_metadata_is_accepted() {
        let json = r#"{
            "type": "FeatureCollection",
            "metadata": {"generated": 1705312900000, "status": 200},
            "features": []
        }"#;
        let feed: RawFeedEnvelope = serde_json::from_str(json).expect("metadata is lenient");
        let meta = feed.metadata.expect("metadata present");
        assert_eq!(meta.generated, Some(1_705_312_900_000));
        assert_eq!(meta.count, None);
        assert_eq!(meta.title, None);

        let json = r#"{"type": "FeatureCollection", "metadata": {"count": null}, "features": []}"#;
        assert!(serde_json::from_str::<RawFeedEnvelope>(json).is_ok());
    }

    #[test]
    fn test_null_magnitude_fails_whole_envelope() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [{
                "id": "x1",
                "properties": {
                    "mag": null, "place": "p", "time": 0, "url": "u",
                    "title": "t", "alert": null, "tsunami": 0
                },
                "geometry": {"type": "Point", "coordinates": [1.0, 2.0, 3.0]}
            }]
        }"#;
        assert!(serde_json::from_str::<RawFeedEnvelope>(json).is_err());
    }

    #[test]
    fn test_short_coordinates_are_rejected() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [{
                "id": "x1",
                "properties": {
                    "mag": 1.0, "place": "p", "time": 0, "url": "u",
                    "title": "t", "alert": null, "tsunami": 0
                },
                "geometry": {"type": "Point", "coordinates": [1.0, 2.0]}
            }]
        }"#;
        assert!(serde_json::from_str::<RawFeedEnvelope>(json).is_err());
    }
}
