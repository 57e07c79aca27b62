//! Command-line interface definitions.
//!
//! Uses clap derive API for argument parsing.

use clap::{Args, Parser, Subcommand};

use crate::client::FeedType;
use crate::output::Format;

/// Near-real-time earthquake map fed by the USGS summary feed.
#[derive(Parser, Debug)]
#[command(name = "quakemap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    pub quiet: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the live map in a local browser
    Serve(ServeArgs),

    /// Follow the map state from the terminal
    Watch(WatchArgs),

    /// Fetch the feed once and print the events
    Snapshot(SnapshotArgs),
}

/// Which feed to read.
#[derive(Args, Debug)]
pub struct FeedArgs {
    /// Summary feed: <all|1.0|2.5|4.5|significant>_<hour|day|week|month>
    #[arg(long, default_value = "all_day", value_parser = parse_feed_type)]
    pub feed: FeedType,

    /// Full feed URL, overrides --feed (e.g. a mirror)
    #[arg(long)]
    pub feed_url: Option<String>,
}

impl FeedArgs {
    /// URL to fetch.
    #[must_use]
    pub fn url(&self) -> String {
        self.feed_url.clone().unwrap_or_else(|| self.feed.url())
    }
}

/// How to poll.
#[derive(Args, Debug)]
pub struct PollArgs {
    /// Poll interval in seconds (minimum 30)
    #[arg(long, default_value = "300")]
    pub poll_interval: u64,

    /// Drop responses that resolve after a newer cycle's response
    #[arg(long)]
    pub discard_stale: bool,
}

/// Arguments for the `serve` command.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub feed: FeedArgs,

    #[command(flatten)]
    pub poll: PollArgs,

    /// Port to listen on
    #[arg(long, short = 'p', default_value = "8080")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Open browser automatically
    #[arg(long)]
    pub open: bool,
}

/// Arguments for the `watch` command.
#[derive(Parser, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub feed: FeedArgs,

    #[command(flatten)]
    pub poll: PollArgs,

    /// Number of strongest events to print per refresh
    #[arg(long, default_value = "5")]
    pub top: usize,
}

/// Arguments for the `snapshot` command.
#[derive(Parser, Debug)]
pub struct SnapshotArgs {
    #[command(flatten)]
    pub feed: FeedArgs,

    /// Maximum number of events to show, in feed order
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Parse a feed type from string.
fn parse_feed_type(s: &str) -> Result<FeedType, String> {
    s.parse()
}

/// Parse an output format from string.
fn parse_format(s: &str) -> Result<Format, String> {
    s.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::try_parse_from(["quakemap", "serve"]).expect("parse");
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.port, 8080);
        assert_eq!(args.poll.poll_interval, 300);
        assert!(!args.poll.discard_stale);
        assert_eq!(
            args.feed.url(),
            "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_day.geojson"
        );
    }

    #[test]
    fn test_feed_url_override() {
        let cli = Cli::try_parse_from([
            "quakemap",
            "snapshot",
            "--feed",
            "4.5_week",
            "--feed-url",
            "http://localhost:9000/feed.geojson",
            "-f",
            "ndjson",
        ])
        .expect("parse");
        let Command::Snapshot(args) = cli.command else {
            panic!("expected snapshot");
        };
        assert_eq!(args.feed.url(), "http://localhost:9000/feed.geojson");
        assert_eq!(args.format, Format::Ndjson);
    }

    #[test]
    fn test_bad_feed_rejected() {
        assert!(Cli::try_parse_from(["quakemap", "watch", "--feed", "all_century"]).is_err());
    }
}
