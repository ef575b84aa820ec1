//! # SCA Timer Core Library
//!
//! Business logic for a twelve-minute clinical simulation countdown and its
//! anonymous feedback endpoint. The `scatimer` binary is a thin terminal and
//! server front end over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a second-granular state machine with a guided
//!   three-phase mode and a standard single-warning mode; the caller drives
//!   `tick()`
//! - **Timer Runner**: tokio task that drives the engine and handles the
//!   post-completion grace delay
//! - **Audio Cue**: best-effort 800 Hz completion beep
//! - **Feedback**: flat JSON file store, HTTP API and client
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: core timer state machine
//! - [`classify`]: phase classification
//! - [`FeedbackApi`]: HTTP contract for feedback collection
//! - [`Config`]: application configuration management

pub mod api;
pub mod audio;
pub mod error;
pub mod events;
pub mod feedback;
pub mod storage;
pub mod timer;

pub use api::{ApiResponse, ApiServer, FeedbackApi};
pub use audio::{default_cue, AudioCue, SilentCue, ToneSpec};
pub use error::{ConfigError, CoreError, ValidationError};
pub use events::Event;
pub use feedback::{FeedbackClient, FeedbackEntry, FeedbackGate, FeedbackSummary, Rating};
pub use storage::{Config, Deployment, FeedbackStore};
pub use timer::{
    classify, format_clock, Command, Mode, Phase, Tier, TimerEngine, TimerObserver, TimerRunner,
    TimerSettings, TimerState,
};
