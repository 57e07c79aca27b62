//! Poll lifecycle of the map view.
//!
//! A mounted [`MapView`] owns a single [`PollState`] behind a `watch`
//! channel. A timer task fires immediately and then on every interval; each
//! tick spawns an independent fetch cycle whose result replaces the whole
//! state. Unmounting aborts the timer only. Cycles already in flight run to
//! completion, but their results are dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::client::FeedSource;
use crate::errors::FETCH_ERROR_MESSAGE;
use crate::models::Event;
use crate::normalize::normalize_all;

/// Time between poll cycles (5 minutes).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(300_000);

/// What the map view currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    /// No cycle has resolved yet
    Loading,
    /// Events from the most recently applied response, in feed order
    Ready(Vec<Event>),
    /// The most recently applied cycle failed
    Error(String),
}

impl PollState {
    /// Events on display, if any.
    #[cfg(test)]
    #[must_use]
    pub fn events(&self) -> Option<&[Event]> {
        match self {
            Self::Ready(events) => Some(events),
            _ => None,
        }
    }
}

/// Which response wins when cycles resolve out of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseOrdering {
    /// Whichever response resolves last is shown
    #[default]
    LastResolved,
    /// A response from an older cycle than the one on display is dropped
    LatestInitiated,
}

/// Polling configuration.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub interval: Duration,
    pub ordering: ResponseOrdering,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            ordering: ResponseOrdering::default(),
        }
    }
}

/// State shared between the view, its timer and in-flight cycles.
struct Shared {
    state: watch::Sender<PollState>,
    mounted: AtomicBool,
    cycles: AtomicU64,
    newest_applied: AtomicU64,
    ordering: ResponseOrdering,
}

impl Shared {
    fn begin_cycle(&self) -> u64 {
        self.cycles.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Replace the state with a cycle's outcome unless it must be dropped.
    fn apply(&self, cycle: u64, next: PollState) -> bool {
        // The watch lock serializes concurrent cycles
        self.state.send_if_modified(|current| {
            if !self.mounted.load(Ordering::Acquire) {
                debug!(cycle, "view unmounted, discarding result");
                return false;
            }
            if self.ordering == ResponseOrdering::LatestInitiated {
                let newest = self.newest_applied.load(Ordering::Acquire);
                if cycle < newest {
                    debug!(cycle, newest, "discarding stale response");
                    return false;
                }
                self.newest_applied.store(cycle, Ordering::Release);
            }
            *current = next;
            true
        })
    }
}

/// The polling half of the map view.
///
/// Dropping the view unmounts it.
pub struct MapView {
    shared: Arc<Shared>,
    timer: JoinHandle<()>,
}

impl MapView {
    /// Mount the view: state becomes `Loading`, a first fetch cycle starts
    /// right away and the repeating timer is armed.
    ///
    /// Must be called from within a tokio runtime. A zero interval falls
    /// back to [`DEFAULT_POLL_INTERVAL`].
    #[must_use]
    pub fn mount(source: Arc<dyn FeedSource>, mut config: PollConfig) -> Self {
        if config.interval.is_zero() {
            warn!("poll interval is zero, using the default");
            config.interval = DEFAULT_POLL_INTERVAL;
        }

        let (state, _) = watch::channel(PollState::Loading);
        let shared = Arc::new(Shared {
            state,
            mounted: AtomicBool::new(true),
            cycles: AtomicU64::new(0),
            newest_applied: AtomicU64::new(0),
            ordering: config.ordering,
        });

        info!(
            interval_secs = config.interval.as_secs(),
            ordering = ?config.ordering,
            "map view mounted"
        );

        let timer = tokio::spawn(run_timer(Arc::clone(&shared), source, config.interval));
        Self { shared, timer }
    }

    /// Receiver that observes every state replacement.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.shared.state.subscribe()
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> PollState {
        self.shared.state.borrow().clone()
    }

    /// Tear the view down. Late results from in-flight cycles are ignored.
    pub fn unmount(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.shared.mounted.swap(false, Ordering::AcqRel) {
            self.timer.abort();
            info!("map view unmounted");
        }
    }
}

impl Drop for MapView {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Fire once immediately, then every `interval`, never waiting on cycles.
async fn run_timer(shared: Arc<Shared>, source: Arc<dyn FeedSource>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let cycle = shared.begin_cycle();
        tokio::spawn(run_cycle(Arc::clone(&shared), Arc::clone(&source), cycle));
    }
}

/// One fetch-and-replace iteration.
async fn run_cycle(shared: Arc<Shared>, source: Arc<dyn FeedSource>, cycle: u64) {
    debug!(cycle, "poll cycle started");

    let next = match source.fetch_events().await {
        Ok(features) => {
            let events = normalize_all(&features);
            info!(cycle, count = events.len(), "feed refreshed");
            PollState::Ready(events)
        }
        Err(e) => {
            warn!(cycle, "fetch failed, will retry next cycle: {e}");
            PollState::Error(FETCH_ERROR_MESSAGE.to_string())
        }
    };

    if shared.apply(cycle, next) {
        debug!(cycle, "state replaced");
    }
}
