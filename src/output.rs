//! Terminal output for earthquake events.
//!
//! Supports human-readable (with colors), JSON, and NDJSON formats.

use std::io::{self, Write};

use crate::encoding::{Tier, terminal_color};
use crate::models::Event;
use crate::render::format_timestamp;

// ANSI styling
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

const ICON_QUAKE: &str = "🌍";
const ICON_TSUNAMI: &str = "🌊";

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Human-readable terminal output (default)
    #[default]
    Human,
    /// JSON array
    Json,
    /// Newline-delimited JSON (one object per line)
    Ndjson,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "ndjson" => Ok(Self::Ndjson),
            _ => Err(format!("unknown format: {s} (expected: human, json, ndjson)")),
        }
    }
}

/// Write events one per line, colored by magnitude tier.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human<W: Write>(writer: &mut W, events: &[Event]) -> io::Result<()> {
    for event in events {
        let tier = Tier::for_magnitude(event.magnitude);
        let color = terminal_color(tier);
        let label = tier.label();
        let mag = event.magnitude;
        let depth = event.coordinates.depth_km;
        let time = format_timestamp(event.time);
        let place = &event.place;
        let tsunami = if event.tsunami {
            format!(" {ICON_TSUNAMI}")
        } else {
            String::new()
        };

        writeln!(
            writer,
            "{ICON_QUAKE} {color}{BOLD}M{mag:.1}{RESET} │ \
             {color}{label:8}{RESET} │ \
             {DIM}{depth:>6.1}km{RESET} │ \
             {time} UTC │ \
             {place}{tsunami}"
        )?;
    }
    Ok(())
}

/// Write events as a JSON array.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<W: Write>(writer: &mut W, events: &[Event]) -> io::Result<()> {
    let json = serde_json::to_string_pretty(events)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{json}")
}

/// Write events as newline-delimited JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_ndjson<W: Write>(writer: &mut W, events: &[Event]) -> io::Result<()> {
    for event in events {
        let json = serde_json::to_string(event)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writeln!(writer, "{json}")?;
    }
    Ok(())
}

/// Write events in the specified format.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_events<W: Write>(writer: &mut W, events: &[Event], format: Format) -> io::Result<()> {
    match format {
        Format::Human => write_human(writer, events),
        Format::Json => write_json(writer, events),
        Format::Ndjson => write_ndjson(writer, events),
    }
}
