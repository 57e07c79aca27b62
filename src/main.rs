//! quakemap - Near-real-time earthquake map.
//!
//! Polls the USGS summary feed, normalizes each event and shows it as a
//! magnitude-encoded marker on a Leaflet map, or follows it from the terminal.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;

mod cli;
mod client;
mod encoding;
mod errors;
mod models;
mod normalize;
mod output;
mod poller;
mod render;
mod server;

use cli::{Cli, Command, PollArgs};
use client::{FeedClient, FeedSource};
use errors::FETCH_ERROR_MESSAGE;
use models::Event;
use poller::{MapView, PollConfig, PollState, ResponseOrdering};

/// Shortest accepted poll interval in seconds.
const MIN_POLL_INTERVAL_SECS: u64 = 30;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::Watch(args) => cmd_watch(args),
        Command::Snapshot(args) => cmd_snapshot(args),
    }
}

/// Initialize tracing subscriber.
fn init_tracing(verbose: bool, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Map poll flags to a config, clamping the interval.
fn poll_config(args: &PollArgs) -> PollConfig {
    let secs = args.poll_interval.max(MIN_POLL_INTERVAL_SECS);
    if secs != args.poll_interval {
        tracing::warn!("poll interval clamped to minimum of {MIN_POLL_INTERVAL_SECS} seconds");
    }

    PollConfig {
        interval: Duration::from_secs(secs),
        ordering: if args.discard_stale {
            ResponseOrdering::LatestInitiated
        } else {
            ResponseOrdering::LastResolved
        },
    }
}

fn feed_source(url: String) -> Result<Arc<dyn FeedSource>> {
    let client = FeedClient::with_url(url).context("failed to create feed client")?;
    Ok(Arc::new(client))
}

/// Execute the `snapshot` command - one-shot fetch and print.
fn cmd_snapshot(args: cli::SnapshotArgs) -> Result<()> {
    let source = feed_source(args.feed.url())?;
    let runtime = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;

    let features = runtime.block_on(source.fetch_events()).map_err(|e| {
        tracing::warn!("fetch failed: {e}");
        anyhow::anyhow!(FETCH_ERROR_MESSAGE)
    })?;

    let mut events = normalize::normalize_all(&features);
    if let Some(limit) = args.limit {
        events.truncate(limit);
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_events(&mut handle, &events, args.format)?;

    Ok(())
}

/// Execute the `watch` command - follow the map state in the terminal.
fn cmd_watch(args: cli::WatchArgs) -> Result<()> {
    let source = feed_source(args.feed.url())?;
    let config = poll_config(&args.poll);

    {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "\x1b[1m🌍 quakemap watch\x1b[0m")?;
        writeln!(
            handle,
            "\x1b[2mFeed: {} | Poll: {}s | Press Ctrl+C to stop\x1b[0m",
            args.feed.url(),
            config.interval.as_secs()
        )?;
    }

    tokio::runtime::Runtime::new()
        .context("failed to create tokio runtime")?
        .block_on(async move {
            let view = MapView::mount(source, config);
            let mut rx = view.subscribe();
            print_state(&view.state(), args.top)?;

            loop {
                tokio::select! {
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let state = rx.borrow_and_update().clone();
                        print_state(&state, args.top)?;
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }

            view.unmount();
            Ok::<(), anyhow::Error>(())
        })
}

/// Print one state replacement.
fn print_state(state: &PollState, top: usize) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let stamp = chrono::Utc::now().format("%H:%M:%S");

    match state {
        PollState::Loading => writeln!(handle, "\x1b[2m[{stamp}] loading...\x1b[0m")?,
        PollState::Error(message) => writeln!(handle, "\x1b[91m[{stamp}] {message}\x1b[0m")?,
        PollState::Ready(events) => {
            writeln!(
                handle,
                "\x1b[2m[{stamp}] ─── {} events, strongest:\x1b[0m",
                events.len()
            )?;
            output::write_human(&mut handle, &strongest(events, top))?;
        }
    }
    handle.flush()
}

/// The `n` largest-magnitude events, strongest first.
fn strongest(events: &[Event], n: usize) -> Vec<Event> {
    let mut sorted = events.to_vec();
    sorted.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));
    sorted.truncate(n);
    sorted
}

/// Execute the `serve` command - start the map host.
fn cmd_serve(args: cli::ServeArgs) -> Result<()> {
    let source = feed_source(args.feed.url())?;
    let config = server::ServerConfig {
        port: args.port,
        host: args.host.clone(),
        poll: poll_config(&args.poll),
    };

    // Print startup message
    let url = format!("http://{}:{}", args.host, args.port);
    println!("\x1b[1m🌍 Global Earthquake Monitor\x1b[0m");
    println!("\x1b[2m───────────────────────────────────────\x1b[0m");
    println!("  Local:   \x1b[96m{url}\x1b[0m");
    println!("  Feed:    {}", args.feed.url());
    println!("  Poll:    {}s", config.poll.interval.as_secs());
    println!("\x1b[2m───────────────────────────────────────\x1b[0m");
    println!("\x1b[2mPress Ctrl+C to stop\x1b[0m\n");

    // Open browser if requested (using xdg-open/open command)
    if args.open {
        #[cfg(target_os = "linux")]
        let _ = std::process::Command::new("xdg-open").arg(&url).spawn();
        #[cfg(target_os = "macos")]
        let _ = std::process::Command::new("open").arg(&url).spawn();
        #[cfg(target_os = "windows")]
        let _ = std::process::Command::new("cmd").args(["/c", "start", &url]).spawn();
    }

    // Run the async server on tokio runtime
    tokio::runtime::Runtime::new()
        .context("failed to create tokio runtime")?
        .block_on(server::run_server(config, source))
}
