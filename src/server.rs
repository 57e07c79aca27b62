//! Local display host for the earthquake map.
//!
//! Serves a Leaflet page that follows the map view's state using:
//! - Axum for HTTP
//! - SSE (Server-Sent Events) pushing each state replacement
//! - a JSON snapshot endpoint for one-off reads

use std::convert::Infallible;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    response::{
        Html,
        sse::{Event, KeepAlive, Sse},
    },
    routing::get,
};
use tokio::sync::watch;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::WatchStream;

use crate::client::FeedSource;
use crate::encoding::{LegendEntry, legend};
use crate::poller::{MapView, PollConfig, PollState};
use crate::render::MapPayload;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub poll: PollConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            poll: PollConfig::default(),
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Map view state, replaced wholesale by each poll cycle
    state: watch::Receiver<PollState>,
    /// Rendered index page
    page: Arc<str>,
}

impl AppState {
    #[must_use]
    pub fn new(state: watch::Receiver<PollState>, poll_interval: Duration) -> Self {
        Self {
            state,
            page: index_page(poll_interval).into(),
        }
    }
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/stream", get(sse_handler))
        .route("/api/state", get(state_handler))
        .route("/api/legend", get(legend_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Mount the map view and serve it until Ctrl+C.
pub async fn run_server(config: ServerConfig, source: Arc<dyn FeedSource>) -> anyhow::Result<()> {
    let view = MapView::mount(source, config.poll);
    let state = AppState::new(view.subscribe(), config.poll.interval);
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("🌍 quakemap starting at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    view.unmount();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Main page handler - serves the map.
async fn index_handler(State(state): State<AppState>) -> Html<String> {
    Html(state.page.to_string())
}

/// SSE stream: the current state first, then every replacement.
async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let stream = WatchStream::new(state.state).filter_map(|poll_state| {
        let payload = MapPayload::from_state(&poll_state);
        Event::default()
            .event("state")
            .json_data(&payload)
            .ok()
            .map(Ok)
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Current state as JSON.
async fn state_handler(State(state): State<AppState>) -> Json<MapPayload> {
    let payload = {
        let current = state.state.borrow();
        MapPayload::from_state(&current)
    };
    Json(payload)
}

/// Legend rows as JSON.
async fn legend_handler() -> Json<Vec<LegendEntry>> {
    Json(legend())
}

/// Health check endpoint.
async fn health_handler() -> &'static str {
    "OK"
}

// ============================================================================
// HTML Template (embedded for single-binary deployment)
// ============================================================================

/// Render the index page with the legend and refresh cadence filled in.
fn index_page(poll_interval: Duration) -> String {
    let mut rows = String::new();
    for entry in legend() {
        let _ = write!(
            rows,
            r#"<div class="legend-row"><span class="swatch" style="background-color:{color}"></span><span class="range">{range}</span><span class="tier">({label})</span></div>"#,
            color = entry.color,
            range = entry.range,
            label = entry.label,
        );
    }

    INDEX_HTML
        .replace("<!-- LEGEND_ROWS -->", &rows)
        .replace("<!-- REFRESH -->", &describe_interval(poll_interval))
}

/// "Live Updates Every 5 Minutes" style cadence text.
fn describe_interval(interval: Duration) -> String {
    let secs = interval.as_secs();
    match secs {
        60 => "Live Updates Every Minute".to_string(),
        s if s % 60 == 0 => format!("Live Updates Every {} Minutes", s / 60),
        s => format!("Live Updates Every {s} Seconds"),
    }
}

const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Global Earthquake Monitor</title>

    <!-- Leaflet -->
    <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" />
    <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>

    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }

        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Inter', sans-serif;
            background: #f9fafb;
            color: #111827;
            display: flex;
            flex-direction: column;
            height: 100vh;
        }

        .glass {
            background: rgba(255, 255, 255, 0.85);
            backdrop-filter: blur(12px);
            -webkit-backdrop-filter: blur(12px);
        }

        /* ===== HEADER ===== */
        header { box-shadow: 0 4px 6px -1px rgba(0,0,0,0.1); z-index: 1100; }
        .header-inner {
            max-width: 80rem;
            margin: 0 auto;
            padding: 1.5rem 1rem;
            display: flex;
            justify-content: space-between;
            align-items: center;
        }
        .brand { display: flex; align-items: center; gap: 0.75rem; }
        .beacon { position: relative; width: 12px; height: 12px; }
        .beacon span {
            position: absolute; inset: 0;
            border-radius: 9999px;
            background: #ef4444;
        }
        .beacon span:first-child { animation: ping 1.5s cubic-bezier(0, 0, 0.2, 1) infinite; }
        h1 { font-size: 1.5rem; font-weight: 700; letter-spacing: -0.02em; }
        .subtitle { font-size: 0.875rem; color: #4b5563; margin-top: 0.25rem; }
        .cadence { font-size: 0.875rem; color: #4b5563; }

        /* ===== MAP ===== */
        main { flex: 1; position: relative; }
        #map { height: 100%; width: 100%; }

        .overlay {
            position: absolute; inset: 0;
            display: flex; align-items: center; justify-content: center;
            background: #f9fafb;
            z-index: 1050;
            text-align: center;
        }
        .overlay.hidden { display: none; }
        .spinner {
            width: 4rem; height: 4rem;
            border: 4px solid #e5e7eb;
            border-top-color: #3b82f6;
            border-radius: 9999px;
            margin: 0 auto 1rem;
            animation: spin 1s linear infinite;
        }
        .error-title { font-size: 1.125rem; font-weight: 600; margin-bottom: 0.5rem; }

        /* ===== LEGEND ===== */
        .legend {
            position: absolute; bottom: 1.25rem; right: 1.25rem;
            padding: 1rem;
            border-radius: 0.75rem;
            box-shadow: 0 10px 15px -3px rgba(0,0,0,0.1);
            z-index: 1000;
        }
        .legend h3 { font-size: 0.875rem; font-weight: 600; color: #374151; margin-bottom: 0.75rem; }
        .legend-row { display: flex; align-items: center; gap: 0.75rem; margin-top: 0.5rem; }
        .swatch { width: 1rem; height: 1rem; border-radius: 9999px; transition: transform 0.2s; }
        .legend-row:hover .swatch { transform: scale(1.25); }
        .range { font-size: 0.875rem; font-weight: 500; color: #374151; }
        .tier { font-size: 0.75rem; color: #6b7280; }

        /* ===== POPUP ===== */
        .earthquake-popup h3 { font-size: 1.05rem; margin-bottom: 0.75rem; }
        .popup-row { display: flex; align-items: center; gap: 0.5rem; font-size: 0.875rem; margin-top: 0.4rem; }
        .mag-dot {
            width: 1.25rem; height: 1.25rem;
            border-radius: 9999px;
            color: white; font-size: 0.7rem; font-weight: 700;
            display: inline-flex; align-items: center; justify-content: center;
        }
        .tsunami-banner {
            margin-top: 0.75rem; padding: 0.5rem;
            background: #fef2f2; border: 1px solid #fecaca; border-radius: 0.5rem;
            color: #b91c1c; font-size: 0.875rem;
        }
        .earthquake-popup a { display: inline-block; margin-top: 0.75rem; font-size: 0.875rem; color: #2563eb; }

        .marker-pulse { animation: pulse 2s infinite; }

        @keyframes pulse {
            0%, 100% { fill-opacity: 0.8; stroke-width: 1.5; }
            50% { fill-opacity: 0.4; stroke-width: 6; }
        }
        @keyframes ping { 75%, 100% { transform: scale(2); opacity: 0; } }
        @keyframes spin { to { transform: rotate(360deg); } }
    </style>
</head>
<body>
    <header class="glass">
        <div class="header-inner">
            <div class="brand">
                <div class="beacon"><span></span><span></span></div>
                <div>
                    <h1>Global Earthquake Monitor</h1>
                    <p class="subtitle">Real-time visualization of seismic activity worldwide</p>
                </div>
            </div>
            <div class="cadence"><!-- REFRESH --></div>
        </div>
    </header>

    <main>
        <div id="map"></div>

        <div id="overlay" class="overlay">
            <div id="overlay-body">
                <div class="spinner"></div>
                <p>Loading earthquake data...</p>
            </div>
        </div>

        <div class="legend glass">
            <h3>Magnitude Scale</h3>
            <!-- LEGEND_ROWS -->
        </div>
    </main>

    <script>
        const map = L.map('map', {
            center: [20, 0],
            zoom: 2,
            minZoom: 2,
            zoomControl: false,
            worldCopyJump: true
        });
        L.tileLayer('https://tiles.stadiamaps.com/tiles/alidade_smooth/{z}/{x}/{y}{r}.png', {
            attribution: '&copy; <a href="https://stadiamaps.com/" target="_blank">Stadia Maps</a>',
            maxZoom: 20
        }).addTo(map);
        L.control.zoom({ position: 'bottomleft' }).addTo(map);

        const markers = L.layerGroup().addTo(map);
        const overlay = document.getElementById('overlay');
        const overlayBody = document.getElementById('overlay-body');

        function showError(message) {
            overlayBody.innerHTML = '<p class="error-title">Data Error</p><p></p>';
            overlayBody.lastChild.textContent = message;
            overlay.classList.remove('hidden');
        }

        function render(payload) {
            if (payload.status === 'loading') {
                overlay.classList.remove('hidden');
                return;
            }
            markers.clearLayers();
            if (payload.status === 'error') {
                showError(payload.message);
                return;
            }
            overlay.classList.add('hidden');
            for (const m of payload.markers) {
                const { pulse, ...style } = m.style;
                L.circleMarker([m.lat, m.lon], { ...style, className: pulse ? 'marker-pulse' : '' })
                    .bindPopup(m.popup, { className: 'earthquake-popup' })
                    .addTo(markers);
            }
        }

        const source = new EventSource('/stream');
        source.addEventListener('state', (e) => render(JSON.parse(e.data)));
    </script>
</body>
</html>
"##;
