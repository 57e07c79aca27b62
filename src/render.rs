//! Map markers, popups and the view payload sent to the browser.

use chrono::{DateTime, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};
use serde::Serialize;

use crate::encoding::{MarkerStyle, color_for};
use crate::models::Event;
use crate::poller::PollState;

/// Popup timestamp layout, e.g. `Jan 15, 2024 10:00:00`.
const TIMESTAMP_FORMAT: &str = "%b %-d, %Y %H:%M:%S";

/// Format an event time for display (UTC).
#[must_use]
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

/// Detail popup for one event.
#[must_use]
pub fn popup_html(event: &Event) -> String {
    let tsunami_banner = if event.tsunami {
        r#"
  <div class="tsunami-banner">&#9888; <strong>Tsunami Warning Active</strong></div>"#
    } else {
        ""
    };

    format!(
        r#"<div class="earthquake-popup">
  <h3>{title}</h3>
  <div class="popup-row"><span class="mag-dot" style="background-color:{color}">M</span><b>Magnitude:</b> {mag:.1}</div>
  <div class="popup-row"><b>Depth:</b> {depth:.1} km</div>
  <div class="popup-row"><b>Time:</b> {time} UTC</div>{tsunami_banner}
  <a href="{url}" target="_blank" rel="noopener noreferrer">View detailed report &rarr;</a>
</div>"#,
        title = encode_text(&event.title),
        color = color_for(event.magnitude),
        mag = event.magnitude,
        depth = event.coordinates.depth_km,
        time = format_timestamp(event.time),
        url = encode_double_quoted_attribute(&event.url),
    )
}

/// A circle marker ready for Leaflet.
#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    pub style: MarkerStyle,
    pub popup: String,
}

impl Marker {
    #[must_use]
    pub fn from_event(event: &Event) -> Self {
        Self {
            id: event.id.clone(),
            lat: event.coordinates.latitude,
            lon: event.coordinates.longitude,
            style: MarkerStyle::for_magnitude(event.magnitude),
            popup: popup_html(event),
        }
    }
}

/// Everything the page needs to draw the current state.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MapPayload {
    Loading,
    Error { message: String },
    Ready { count: usize, markers: Vec<Marker> },
}

impl MapPayload {
    #[must_use]
    pub fn from_state(state: &PollState) -> Self {
        match state {
            PollState::Loading => Self::Loading,
            PollState::Error(message) => Self::Error {
                message: message.clone(),
            },
            PollState::Ready(events) => Self::Ready {
                count: events.len(),
                markers: events.iter().map(Marker::from_event).collect(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinates;

    fn event(magnitude: f64, tsunami: bool) -> Event {
        Event {
            id: "us7000abcd".into(),
            magnitude,
            coordinates: Coordinates {
                latitude: 32.112,
                longitude: 140.301,
                depth_km: 35.04,
            },
            title: "M 6.5 - 120 km SSE of Hachijo-jima, Japan".into(),
            place: "120 km SSE of Hachijo-jima, Japan".into(),
            url: "https://earthquake.usgs.gov/earthquakes/eventpage/us7000abcd".into(),
            alert: None,
            tsunami,
            time: DateTime::from_timestamp_millis(1_705_312_800_000).expect("valid"),
        }
    }

    #[test]
    fn test_timestamp_format() {
        let t = DateTime::from_timestamp_millis(1_705_312_800_000).expect("valid");
        assert_eq!(format_timestamp(t), "Jan 15, 2024 10:00:00");

        let single_digit_day = DateTime::from_timestamp_millis(1_704_157_205_000).expect("valid");
        assert_eq!(format_timestamp(single_digit_day), "Jan 2, 2024 01:00:05");
    }

    #[test]
    fn test_popup_contents() {
        let html = popup_html(&event(6.46, true));
        assert!(html.contains("<h3>M 6.5 - 120 km SSE of Hachijo-jima, Japan</h3>"));
        assert!(html.contains("<b>Magnitude:</b> 6.5"));
        assert!(html.contains("<b>Depth:</b> 35.0 km"));
        assert!(html.contains("Jan 15, 2024 10:00:00"));
        assert!(html.contains("Tsunami Warning Active"));
        assert!(html.contains(r#"href="https://earthquake.usgs.gov/earthquakes/eventpage/us7000abcd""#));
        assert!(html.contains("#dc2626"));
    }

    #[test]
    fn test_popup_without_tsunami() {
        let html = popup_html(&event(2.1, false));
        assert!(!html.contains("Tsunami"));
        assert!(html.contains("#ca8a04"));
    }

    #[test]
    fn test_popup_escapes_title() {
        let mut e = event(1.0, false);
        e.title = "<script>alert(1)</script>".into();
        let html = popup_html(&e);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_marker_position_and_style() {
        let marker = Marker::from_event(&event(4.0, false));
        assert!((marker.lat - 32.112).abs() < 1e-9);
        assert!((marker.lon - 140.301).abs() < 1e-9);
        assert_eq!(marker.style.fill_color, "#ea580c");
        assert!(!marker.style.pulse);
    }

    #[test]
    fn test_payload_shapes() {
        let loading = serde_json::to_value(MapPayload::from_state(&PollState::Loading))
            .expect("serialize");
        assert_eq!(loading, serde_json::json!({"status": "loading"}));

        let error = serde_json::to_value(MapPayload::from_state(&PollState::Error(
            "Failed to fetch earthquake data".into(),
        )))
        .expect("serialize");
        assert_eq!(error["status"], "error");
        assert_eq!(error["message"], "Failed to fetch earthquake data");

        let ready = serde_json::to_value(MapPayload::from_state(&PollState::Ready(vec![
            event(6.5, true),
            event(1.2, false),
        ])))
        .expect("serialize");
        assert_eq!(ready["status"], "ready");
        assert_eq!(ready["count"], 2);
        assert_eq!(ready["markers"][0]["style"]["pulse"], true);
        assert_eq!(ready["markers"][1]["style"]["radius"], 5.0);
    }
}
