mod engine;
mod phase;
mod runner;

pub use engine::{
    format_clock, Controls, Styling, TimerEngine, TimerObserver, TimerSettings, TimerState,
    COMPLETION_MESSAGE, DEFAULT_TOTAL_SECONDS, FEEDBACK_THANKS, GRACE_DELAY,
};
pub use phase::{
    boundary_crossing, classify, Mode, Phase, Tier, AMBER_BOUNDARY_SECS, CLINICAL_MANAGEMENT,
    DATA_GATHERING, RED_BOUNDARY_SECS, WARNING_THRESHOLD_SECS,
};
pub use runner::{Command, TimerRunner};
