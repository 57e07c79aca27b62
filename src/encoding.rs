//! Magnitude to visual encoding.
//!
//! Four tiers with closed lower bounds at 6.0, 4.0 and 2.0. The map markers
//! and the legend use two separate shade tables keyed by the same tiers.

use serde::Serialize;

/// Smallest marker radius, so negative and tiny magnitudes stay visible.
pub const MIN_RADIUS: f64 = 5.0;

/// Radius units per magnitude unit.
const RADIUS_SCALE: f64 = 3.0;

/// Magnitude at and above which a marker pulses.
pub const MAJOR_THRESHOLD: f64 = 6.0;

/// Lower bound of the moderate tier.
pub const MODERATE_THRESHOLD: f64 = 4.0;

/// Lower bound of the minor tier.
pub const MINOR_THRESHOLD: f64 = 2.0;

/// Magnitude band driving marker color and legend entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Major,
    Moderate,
    Minor,
    Micro,
}

impl Tier {
    /// All tiers, strongest first (legend order).
    pub const ALL: [Self; 4] = [Self::Major, Self::Moderate, Self::Minor, Self::Micro];

    /// Classify a magnitude. Boundary values belong to the higher tier.
    #[must_use]
    pub fn for_magnitude(magnitude: f64) -> Self {
        match magnitude {
            m if m >= MAJOR_THRESHOLD => Self::Major,
            m if m >= MODERATE_THRESHOLD => Self::Moderate,
            m if m >= MINOR_THRESHOLD => Self::Minor,
            _ => Self::Micro,
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Major => "Major",
            Self::Moderate => "Moderate",
            Self::Minor => "Minor",
            Self::Micro => "Micro",
        }
    }

    /// Magnitude range as printed in the legend.
    #[must_use]
    pub const fn range(self) -> &'static str {
        match self {
            Self::Major => "6.0+",
            Self::Moderate => "4.0-5.9",
            Self::Minor => "2.0-3.9",
            Self::Micro => "0-1.9",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Major => 0,
            Self::Moderate => 1,
            Self::Minor => 2,
            Self::Micro => 3,
        }
    }
}

/// Marker fill colors, indexed like [`Tier::ALL`].
pub const MARKER_PALETTE: [&str; 4] = ["#dc2626", "#ea580c", "#ca8a04", "#16a34a"];

/// Legend swatch colors, indexed like [`Tier::ALL`].
pub const LEGEND_PALETTE: [&str; 4] = ["#ef4444", "#f97316", "#eab308", "#22c55e"];

// ANSI colors for terminal output
const ANSI_RED: &str = "\x1b[91m";
const ANSI_ORANGE: &str = "\x1b[38;5;208m";
const ANSI_YELLOW: &str = "\x1b[93m";
const ANSI_GREEN: &str = "\x1b[92m";

/// Marker fill color for a magnitude.
#[must_use]
pub fn color_for(magnitude: f64) -> &'static str {
    MARKER_PALETTE[Tier::for_magnitude(magnitude).index()]
}

/// Legend swatch color for a tier.
#[must_use]
pub const fn legend_color(tier: Tier) -> &'static str {
    LEGEND_PALETTE[tier.index()]
}

/// Terminal escape for a tier.
#[must_use]
pub const fn terminal_color(tier: Tier) -> &'static str {
    match tier {
        Tier::Major => ANSI_RED,
        Tier::Moderate => ANSI_ORANGE,
        Tier::Minor => ANSI_YELLOW,
        Tier::Micro => ANSI_GREEN,
    }
}

/// Marker radius: `max(3 * magnitude, 5)`.
#[must_use]
pub fn radius_for(magnitude: f64) -> f64 {
    (magnitude * RADIUS_SCALE).max(MIN_RADIUS)
}

/// Whether a magnitude gets the pulsing treatment.
#[must_use]
pub fn is_major(magnitude: f64) -> bool {
    magnitude >= MAJOR_THRESHOLD
}

/// Circle marker options, serialized with Leaflet's option names.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerStyle {
    pub radius: f64,
    pub fill_color: &'static str,
    pub color: &'static str,
    pub weight: f64,
    pub opacity: f64,
    pub fill_opacity: f64,
    pub pulse: bool,
}

impl MarkerStyle {
    #[must_use]
    pub fn for_magnitude(magnitude: f64) -> Self {
        Self {
            radius: radius_for(magnitude),
            fill_color: color_for(magnitude),
            color: "white",
            weight: 1.5,
            opacity: 1.0,
            fill_opacity: 0.8,
            pulse: is_major(magnitude),
        }
    }
}

/// One legend row.
#[derive(Debug, Clone, Serialize)]
pub struct LegendEntry {
    pub tier: Tier,
    pub range: &'static str,
    pub label: &'static str,
    pub color: &'static str,
}

/// Legend rows, strongest tier first.
#[must_use]
pub fn legend() -> Vec<LegendEntry> {
    Tier::ALL
        .iter()
        .map(|&tier| LegendEntry {
            tier,
            range: tier.range(),
            label: tier.label(),
            color: legend_color(tier),
        })
        .collect()
}
