//! Conversion from raw feed features into map events.

use crate::models::{Coordinates, Event, RawFeature};

/// Map one raw feature into an [`Event`].
///
/// Pure: values pass through unchanged, no unit conversion.
#[must_use]
pub fn normalize(feature: &RawFeature) -> Event {
    let [longitude, latitude, depth_km] = feature.geometry.coordinates;
    let props = &feature.properties;

    Event {
        id: feature.id.clone(),
        magnitude: props.mag,
        coordinates: Coordinates {
            latitude,
            longitude,
            depth_km,
        },
        title: props.title.clone(),
        place: props.place.clone(),
        url: props.url.clone(),
        alert: props.alert.clone(),
        tsunami: props.tsunami == 1,
        time: props.time,
    }
}

/// Normalize a whole response, keeping feed order.
#[must_use]
pub fn normalize_all(features: &[RawFeature]) -> Vec<Event> {
    features.iter().map(normalize).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawFeedEnvelope;

    fn sample_features() -> Vec<RawFeature> {
        let json = include_str!("../tests/fixtures/all_day_sample.json");
        let feed: RawFeedEnvelope = serde_json::from_str(json).expect("sample parses");
        feed.features
    }

    #[test]
    fn test_fields_pass_through() {
        let features = sample_features();
        let raw = &features[0];
        let event = normalize(raw);

        assert_eq!(event.id, raw.id);
        assert_eq!(event.magnitude.to_bits(), raw.properties.mag.to_bits());
        assert_eq!(event.coordinates.longitude.to_bits(), raw.geometry.coordinates[0].to_bits());
        assert_eq!(event.coordinates.latitude.to_bits(), raw.geometry.coordinates[1].to_bits());
        assert_eq!(event.coordinates.depth_km.to_bits(), raw.geometry.coordinates[2].to_bits());
        assert_eq!(event.title, raw.properties.title);
        assert_eq!(event.place, raw.properties.place);
        assert_eq!(event.url, raw.properties.url);
        assert_eq!(event.alert, raw.properties.alert);
        assert_eq!(event.time, raw.properties.time);
        assert!(event.tsunami);
    }

    #[test]
    fn test_order_and_length_preserved() {
        let features = sample_features();
        let events = normalize_all(&features);

        assert_eq!(events.len(), features.len());
        for (event, raw) in events.iter().zip(&features) {
            assert_eq!(event.id, raw.id);
        }
        assert!(!events[1].tsunami);
    }

    #[test]
    fn test_negative_magnitude_untouched() {
        let features = sample_features();
        let event = normalize(&features[2]);
        assert!((event.magnitude - (-0.4)).abs() < f64::EPSILON);
        assert!((event.coordinates.depth_km - (-1.3)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let features = sample_features();
        assert_eq!(normalize(&features[0]), normalize(&features[0]));
        assert_eq!(normalize_all(&features), normalize_all(&features));
    }

    #[test]
    fn test_empty_input() {
        assert!(normalize_all(&[]).is_empty());
    }
}
