//! Phase classification for the countdown.
//!
//! Guided mode splits the exercise into three coloured stages keyed to the
//! remaining time. Standard mode only has a single warning threshold.
//!
//! ```text
//! remaining   > 360  green  "Data Gathering"
//! 60 < r <=   360    amber  "Clinical Management"
//! r <= 60            red    "Clinical Management"
//! ```
//!
//! Two evaluation policies exist on purpose. [`classify`] is a range test and
//! is applied when the timer starts, so a timer resumed mid-phase picks up the
//! right colour. [`boundary_crossing`] only fires at the exact boundary values
//! and is what the per-second tick uses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Remaining seconds at which guided mode turns amber.
pub const AMBER_BOUNDARY_SECS: u32 = 360;
/// Remaining seconds at which guided mode turns red.
pub const RED_BOUNDARY_SECS: u32 = 60;
/// Remaining seconds at or below which standard mode shows the warning tier.
pub const WARNING_THRESHOLD_SECS: u32 = 60;

pub const DATA_GATHERING: &str = "Data Gathering";
pub const CLINICAL_MANAGEMENT: &str = "Clinical Management";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Standard,
    Guided,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Standard => "standard",
            Mode::Guided => "guided",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Mode::Standard),
            "guided" => Ok(Mode::Guided),
            _ => Err(ValidationError::InvalidMode),
        }
    }
}

/// Visual tier shown by the rendering layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    None,
    Green,
    Amber,
    Red,
    Warning,
}

impl Tier {
    /// CSS class for this tier on the web page.
    pub fn css_class(&self) -> Option<&'static str> {
        match self {
            Tier::None => None,
            Tier::Green => Some("guided-green"),
            Tier::Amber => Some("guided-amber"),
            Tier::Red => Some("guided-red"),
            Tier::Warning => Some("warning"),
        }
    }
}

/// A derived phase: never stored, always recomputed from `(mode, remaining)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Phase {
    pub label: Option<&'static str>,
    pub tier: Tier,
}

impl Phase {
    pub const NONE: Phase = Phase {
        label: None,
        tier: Tier::None,
    };

    const fn guided(tier: Tier, label: &'static str) -> Self {
        Phase {
            label: Some(label),
            tier,
        }
    }
}

/// Range classification used when the timer starts.
pub fn classify(mode: Mode, remaining_secs: u32) -> Phase {
    match mode {
        Mode::Guided => {
            if remaining_secs > AMBER_BOUNDARY_SECS {
                Phase::guided(Tier::Green, DATA_GATHERING)
            } else if remaining_secs > RED_BOUNDARY_SECS {
                Phase::guided(Tier::Amber, CLINICAL_MANAGEMENT)
            } else {
                Phase::guided(Tier::Red, CLINICAL_MANAGEMENT)
            }
        }
        Mode::Standard => {
            if remaining_secs <= WARNING_THRESHOLD_SECS {
                Phase {
                    label: None,
                    tier: Tier::Warning,
                }
            } else {
                Phase::NONE
            }
        }
    }
}

/// Edge-triggered transition used on every tick.
///
/// Returns `Some` only when `remaining_secs` lands exactly on a guided
/// boundary. A tick sequence that skips 360 or 60 misses the transition.
pub fn boundary_crossing(mode: Mode, remaining_secs: u32) -> Option<Phase> {
    if mode != Mode::Guided {
        return None;
    }
    match remaining_secs {
        AMBER_BOUNDARY_SECS => Some(Phase::guided(Tier::Amber, CLINICAL_MANAGEMENT)),
        RED_BOUNDARY_SECS => Some(Phase::guided(Tier::Red, CLINICAL_MANAGEMENT)),
        _ => None,
    }
}
