use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Mode, Tier};

/// Every state change of the timer produces an Event.
/// The rendering layer subscribes to them; commands also return them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        remaining_seconds: u32,
        mode: Mode,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_seconds: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        total_seconds: u32,
        at: DateTime<Utc>,
    },
    /// One second elapsed while running.
    Tick {
        remaining_seconds: u32,
        display: String,
        at: DateTime<Utc>,
    },
    /// Guided phase applied, either on start or at an exact boundary.
    PhaseChanged {
        tier: Tier,
        label: Option<String>,
        at: DateTime<Utc>,
    },
    /// Standard mode crossed into its final minute.
    WarningEntered {
        remaining_seconds: u32,
        at: DateTime<Utc>,
    },
    TimerCompleted {
        mode: Mode,
        message: String,
        at: DateTime<Utc>,
    },
    /// All tier styling and phase text removed.
    StylingCleared {
        at: DateTime<Utc>,
    },
    ModeSwitched {
        mode: Mode,
        at: DateTime<Utc>,
    },
    SoundToggled {
        enabled: bool,
        at: DateTime<Utc>,
    },
    /// The audio cue was asked to play. `played` is false when the audio
    /// subsystem was unavailable.
    CuePlayed {
        played: bool,
        at: DateTime<Utc>,
    },
    FeedbackAcknowledged {
        message: String,
        at: DateTime<Utc>,
    },
    /// Phase text emptied without touching the tier.
    TextCleared {
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Snake-case name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Event::TimerStarted { .. } => "timer_started",
            Event::TimerPaused { .. } => "timer_paused",
            Event::TimerReset { .. } => "timer_reset",
            Event::Tick { .. } => "tick",
            Event::PhaseChanged { .. } => "phase_changed",
            Event::WarningEntered { .. } => "warning_entered",
            Event::TimerCompleted { .. } => "timer_completed",
            Event::StylingCleared { .. } => "styling_cleared",
            Event::ModeSwitched { .. } => "mode_switched",
            Event::SoundToggled { .. } => "sound_toggled",
            Event::CuePlayed { .. } => "cue_played",
            Event::FeedbackAcknowledged { .. } => "feedback_acknowledged",
            Event::TextCleared { .. } => "text_cleared",
        }
    }
}
