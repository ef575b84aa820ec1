//! Timer engine implementation.
//!
//! The engine is a second-granular state machine. It does not use internal
//! threads or clocks: the caller (see [`super::TimerRunner`]) invokes `tick()`
//! once per elapsed second while running and fires the post-completion clear
//! after [`GRACE_DELAY`].
//!
//! ## State Transitions
//!
//! ```text
//! Paused(total) -> Running -> Paused(n) -> Running -> ... -> Completed(0)
//!        ^                                                      |
//!        +------------------------ reset -----------------------+
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(TimerSettings::default(), Box::new(SilentCue));
//! engine.subscribe(Box::new(|e: &Event| println!("{}", e.name())));
//! engine.start();
//! // once per second:
//! engine.tick();
//! ```

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::phase::{self, Mode, Phase, Tier};
use crate::audio::AudioCue;
use crate::events::Event;

/// Length of the exercise: twelve minutes.
pub const DEFAULT_TOTAL_SECONDS: u32 = 12 * 60;
/// Delay between completion and the automatic styling clear.
pub const GRACE_DELAY: Duration = Duration::from_secs(2);

pub const COMPLETION_MESSAGE: &str = "Timer Complete!";
pub const FEEDBACK_THANKS: &str = "Thank you for your feedback!";

/// Injected configuration for a new engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettings {
    pub total_seconds: u32,
    pub mode: Mode,
    pub sound_enabled: bool,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            total_seconds: DEFAULT_TOTAL_SECONDS,
            mode: Mode::Standard,
            sound_enabled: true,
        }
    }
}

/// Countdown state. `remaining_seconds` is always within `0..=total_seconds`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub total_seconds: u32,
    pub remaining_seconds: u32,
    pub running: bool,
    pub mode: Mode,
}

/// What the rendering layer currently shows besides the clock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Styling {
    pub tier: Tier,
    /// Phase label, completion message or feedback acknowledgement.
    pub text: String,
}

impl Styling {
    pub fn is_clear(&self) -> bool {
        self.tier == Tier::None && self.text.is_empty()
    }
}

/// Enabled state of the start/pause buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Controls {
    pub start_enabled: bool,
    pub pause_enabled: bool,
}

/// Receives every event the engine emits.
pub trait TimerObserver: Send {
    fn on_event(&mut self, event: &Event);
}

impl<F> TimerObserver for F
where
    F: FnMut(&Event) + Send,
{
    fn on_event(&mut self, event: &Event) {
        self(event)
    }
}

/// Core timer engine.
pub struct TimerEngine {
    state: TimerState,
    sound_enabled: bool,
    styling: Styling,
    cue: Box<dyn AudioCue>,
    observers: Vec<Box<dyn TimerObserver>>,
}

impl fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerEngine")
            .field("state", &self.state)
            .field("sound_enabled", &self.sound_enabled)
            .field("styling", &self.styling)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl TimerEngine {
    /// Create a paused engine with the full duration remaining.
    pub fn new(settings: TimerSettings, cue: Box<dyn AudioCue>) -> Self {
        Self {
            state: TimerState {
                total_seconds: settings.total_seconds,
                remaining_seconds: settings.total_seconds,
                running: false,
                mode: settings.mode,
            },
            sound_enabled: settings.sound_enabled,
            styling: Styling::default(),
            cue,
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: Box<dyn TimerObserver>) {
        self.observers.push(observer);
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.state.remaining_seconds
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    pub fn styling(&self) -> &Styling {
        &self.styling
    }

    pub fn controls(&self) -> Controls {
        Controls {
            start_enabled: !self.state.running,
            pause_enabled: self.state.running,
        }
    }

    /// Phase derived from the current mode and remaining time.
    pub fn phase(&self) -> Phase {
        phase::classify(self.state.mode, self.state.remaining_seconds)
    }

    /// Remaining time as `MM:SS`.
    pub fn display(&self) -> String {
        format_clock(self.state.remaining_seconds)
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Vec<Event> {
        if self.state.running {
            return Vec::new();
        }
        let mut out = Vec::new();
        self.cue.resume();
        self.state.running = true;
        out.push(Event::TimerStarted {
            remaining_seconds: self.state.remaining_seconds,
            mode: self.state.mode,
            at: Utc::now(),
        });
        if self.state.mode == Mode::Guided {
            // Range test, not edge test: start may happen mid-phase.
            let phase = phase::classify(Mode::Guided, self.state.remaining_seconds);
            self.apply_phase(phase, &mut out);
        }
        self.dispatch(out)
    }

    pub fn pause(&mut self) -> Vec<Event> {
        let mut out = Vec::new();
        self.pause_into(&mut out);
        self.dispatch(out)
    }

    pub fn reset(&mut self) -> Vec<Event> {
        let mut out = Vec::new();
        self.reset_into(&mut out);
        self.dispatch(out)
    }

    /// Advance by one second. Does nothing unless running.
    pub fn tick(&mut self) -> Vec<Event> {
        if !self.state.running {
            return Vec::new();
        }
        let mut out = Vec::new();
        self.state.remaining_seconds = self.state.remaining_seconds.saturating_sub(1);
        let remaining = self.state.remaining_seconds;
        out.push(Event::Tick {
            remaining_seconds: remaining,
            display: format_clock(remaining),
            at: Utc::now(),
        });

        match self.state.mode {
            Mode::Guided => {
                if let Some(phase) = phase::boundary_crossing(Mode::Guided, remaining) {
                    self.apply_phase(phase, &mut out);
                }
            }
            Mode::Standard => {
                if remaining <= phase::WARNING_THRESHOLD_SECS && self.styling.tier != Tier::Warning
                {
                    self.styling.tier = Tier::Warning;
                    out.push(Event::WarningEntered {
                        remaining_seconds: remaining,
                        at: Utc::now(),
                    });
                }
            }
        }

        if remaining == 0 {
            self.complete_into(&mut out);
        }
        self.dispatch(out)
    }

    /// Change mode. Always resets the countdown and clears styling.
    pub fn switch_mode(&mut self, mode: Mode) -> Vec<Event> {
        let mut out = Vec::new();
        self.state.mode = mode;
        out.push(Event::ModeSwitched {
            mode,
            at: Utc::now(),
        });
        self.reset_into(&mut out);
        self.clear_styling_into(&mut out);
        self.dispatch(out)
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) -> Vec<Event> {
        self.sound_enabled = enabled;
        let out = vec![Event::SoundToggled {
            enabled,
            at: Utc::now(),
        }];
        self.dispatch(out)
    }

    /// Play the cue on demand. Skipped entirely while sound is off.
    pub fn play_test_sound(&mut self) -> Vec<Event> {
        let mut out = Vec::new();
        self.play_cue_into(&mut out);
        self.dispatch(out)
    }

    /// Remove all tier styling and phase text.
    ///
    /// This is what fires [`GRACE_DELAY`] after completion.
    pub fn clear_styling(&mut self) -> Vec<Event> {
        let mut out = Vec::new();
        self.clear_styling_into(&mut out);
        self.dispatch(out)
    }

    pub fn acknowledge_feedback(&mut self) -> Vec<Event> {
        self.styling.text = FEEDBACK_THANKS.to_string();
        let out = vec![Event::FeedbackAcknowledged {
            message: FEEDBACK_THANKS.to_string(),
            at: Utc::now(),
        }];
        self.dispatch(out)
    }

    /// Empty the phase text, leaving the tier alone.
    pub fn clear_text(&mut self) -> Vec<Event> {
        if self.styling.text.is_empty() {
            return Vec::new();
        }
        self.styling.text.clear();
        let out = vec![Event::TextCleared { at: Utc::now() }];
        self.dispatch(out)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn pause_into(&mut self, out: &mut Vec<Event>) {
        if !self.state.running {
            return;
        }
        self.state.running = false;
        out.push(Event::TimerPaused {
            remaining_seconds: self.state.remaining_seconds,
            at: Utc::now(),
        });
    }

    fn reset_into(&mut self, out: &mut Vec<Event>) {
        self.pause_into(out);
        self.state.remaining_seconds = self.state.total_seconds;
        self.clear_styling_into(out);
        out.push(Event::TimerReset {
            total_seconds: self.state.total_seconds,
            at: Utc::now(),
        });
    }

    fn complete_into(&mut self, out: &mut Vec<Event>) {
        self.pause_into(out);
        self.state.remaining_seconds = 0;
        self.play_cue_into(out);
        self.styling.text = COMPLETION_MESSAGE.to_string();
        out.push(Event::TimerCompleted {
            mode: self.state.mode,
            message: COMPLETION_MESSAGE.to_string(),
            at: Utc::now(),
        });
    }

    fn play_cue_into(&mut self, out: &mut Vec<Event>) {
        if !self.sound_enabled {
            return;
        }
        let played = self.cue.play();
        out.push(Event::CuePlayed {
            played,
            at: Utc::now(),
        });
    }

    fn apply_phase(&mut self, phase: Phase, out: &mut Vec<Event>) {
        self.styling.tier = phase.tier;
        self.styling.text = phase.label.unwrap_or_default().to_string();
        out.push(Event::PhaseChanged {
            tier: phase.tier,
            label: phase.label.map(str::to_string),
            at: Utc::now(),
        });
    }

    fn clear_styling_into(&mut self, out: &mut Vec<Event>) {
        if self.styling.is_clear() {
            return;
        }
        self.styling = Styling::default();
        out.push(Event::StylingCleared { at: Utc::now() });
    }

    fn dispatch(&mut self, events: Vec<Event>) -> Vec<Event> {
        for event in &events {
            for observer in self.observers.iter_mut() {
                observer.on_event(event);
            }
        }
        events
    }
}

/// Format seconds as zero-padded `MM:SS`.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SilentCue;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Counts plays and resumes.
    #[derive(Clone, Default)]
    struct CountingCue {
        plays: Arc<AtomicUsize>,
        resumes: Arc<AtomicUsize>,
    }

    impl AudioCue for CountingCue {
        fn resume(&mut self) {
            self.resumes.fetch_add(1, Ordering::SeqCst);
        }

        fn play(&mut self) -> bool {
            self.plays.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    fn engine(mode: Mode) -> TimerEngine {
        TimerEngine::new(
            TimerSettings {
                mode,
                ..TimerSettings::default()
            },
            Box::new(SilentCue),
        )
    }

    /// Tick a paused engine down to `remaining` without emitting phase logic
    /// for the skipped seconds.
    fn jump_to(engine: &mut TimerEngine, remaining: u32) {
        engine.state.remaining_seconds = remaining;
    }

    fn count<F: Fn(&Event) -> bool>(events: &[Event], pred: F) -> usize {
        events.iter().filter(|e| pred(e)).count()
    }

    #[test]
    fn new_engine_is_paused_at_full_duration() {
        let e = engine(Mode::Standard);
        assert_eq!(e.remaining_seconds(), 720);
        assert!(!e.is_running());
        assert_eq!(
            e.controls(),
            Controls {
                start_enabled: true,
                pause_enabled: false
            }
        );
        assert_eq!(e.display(), "12:00");
    }

    #[test]
    fn start_and_pause_are_idempotent() {
        let mut e = engine(Mode::Standard);
        assert!(e.pause().is_empty());
        assert_eq!(e.start().len(), 1);
        assert!(e.start().is_empty());
        assert!(e.controls().pause_enabled);
        assert_eq!(e.pause().len(), 1);
        assert!(e.pause().is_empty());
    }

    #[test]
    fn tick_only_counts_while_running() {
        let mut e = engine(Mode::Standard);
        assert!(e.tick().is_empty());
        assert_eq!(e.remaining_seconds(), 720);
        e.start();
        e.tick();
        e.tick();
        assert_eq!(e.remaining_seconds(), 718);
        e.pause();
        e.tick();
        assert_eq!(e.remaining_seconds(), 718);
    }

    #[test]
    fn guided_start_applies_range_classification() {
        for (remaining, tier, label) in [
            (400, Tier::Green, phase::DATA_GATHERING),
            (200, Tier::Amber, phase::CLINICAL_MANAGEMENT),
            (30, Tier::Red, phase::CLINICAL_MANAGEMENT),
        ] {
            let mut e = engine(Mode::Guided);
            jump_to(&mut e, remaining);
            let events = e.start();
            assert_eq!(e.styling().tier, tier, "remaining {remaining}");
            assert_eq!(e.styling().text, label);
            assert_eq!(
                count(&events, |ev| matches!(ev, Event::PhaseChanged { .. })),
                1
            );
        }
    }

    #[test]
    fn guided_tick_fires_amber_then_red_exactly_once() {
        let mut e = engine(Mode::Guided);
        jump_to(&mut e, 361);
        e.start();
        assert_eq!(e.styling().tier, Tier::Green);

        let events = e.tick();
        assert_eq!(e.remaining_seconds(), 360);
        assert_eq!(e.styling().tier, Tier::Amber);
        assert_eq!(
            count(&events, |ev| matches!(
                ev,
                Event::PhaseChanged {
                    tier: Tier::Amber,
                    ..
                }
            )),
            1
        );
        let events = e.tick();
        assert_eq!(count(&events, |ev| matches!(ev, Event::PhaseChanged { .. })), 0);

        jump_to(&mut e, 61);
        let events = e.tick();
        assert_eq!(e.styling().tier, Tier::Red);
        assert_eq!(
            count(&events, |ev| matches!(
                ev,
                Event::PhaseChanged {
                    tier: Tier::Red,
                    ..
                }
            )),
            1
        );
        let events = e.tick();
        assert_eq!(count(&events, |ev| matches!(ev, Event::PhaseChanged { .. })), 0);
    }

    #[test]
    fn guided_tick_misses_skipped_boundary() {
        let mut e = engine(Mode::Guided);
        e.start();
        assert_eq!(e.styling().tier, Tier::Green);
        // Skip over 360 without landing on it.
        jump_to(&mut e, 359);
        e.tick();
        assert_eq!(e.styling().tier, Tier::Green);
        // Only a restart self-corrects.
        e.pause();
        e.start();
        assert_eq!(e.styling().tier, Tier::Amber);
    }

    #[test]
    fn standard_warning_is_idempotent() {
        let mut e = engine(Mode::Standard);
        jump_to(&mut e, 62);
        e.start();
        e.tick();
        assert_eq!(e.styling().tier, Tier::None);
        let events = e.tick();
        assert_eq!(e.styling().tier, Tier::Warning);
        assert_eq!(e.styling().text, "");
        assert_eq!(
            count(&events, |ev| matches!(ev, Event::WarningEntered { .. })),
            1
        );
        let events = e.tick();
        assert_eq!(e.styling().tier, Tier::Warning);
        assert_eq!(
            count(&events, |ev| matches!(ev, Event::WarningEntered { .. })),
            0
        );
    }

    #[test]
    fn completion_pins_zero_and_plays_cue() {
        let cue = CountingCue::default();
        let mut e = TimerEngine::new(
            TimerSettings {
                total_seconds: 2,
                mode: Mode::Guided,
                sound_enabled: true,
            },
            Box::new(cue.clone()),
        );
        e.start();
        assert_eq!(cue.resumes.load(Ordering::SeqCst), 1);
        e.tick();
        let events = e.tick();
        assert_eq!(e.remaining_seconds(), 0);
        assert!(!e.is_running());
        assert_eq!(e.styling().text, COMPLETION_MESSAGE);
        assert_eq!(cue.plays.load(Ordering::SeqCst), 1);
        assert!(events
            .iter()
            .any(|ev| matches!(ev, Event::TimerCompleted { .. })));
        assert!(events
            .iter()
            .any(|ev| matches!(ev, Event::CuePlayed { played: true, .. })));

        // Tier survives until the grace clear.
        assert_eq!(e.styling().tier, Tier::Red);
        e.clear_styling();
        assert!(e.styling().is_clear());
    }

    #[test]
    fn completion_respects_sound_toggle() {
        let cue = CountingCue::default();
        let mut e = TimerEngine::new(
            TimerSettings {
                total_seconds: 1,
                mode: Mode::Standard,
                sound_enabled: false,
            },
            Box::new(cue.clone()),
        );
        e.start();
        e.tick();
        assert_eq!(cue.plays.load(Ordering::SeqCst), 0);
        assert!(e.play_test_sound().is_empty());

        e.set_sound_enabled(true);
        e.play_test_sound();
        assert_eq!(cue.plays.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reset_restores_full_duration_and_clears_styling() {
        let mut e = engine(Mode::Guided);
        jump_to(&mut e, 100);
        e.start();
        assert_eq!(e.styling().tier, Tier::Amber);
        e.reset();
        assert_eq!(e.remaining_seconds(), 720);
        assert!(!e.is_running());
        assert!(e.styling().is_clear());
        assert_eq!(
            e.controls(),
            Controls {
                start_enabled: true,
                pause_enabled: false
            }
        );
    }

    #[test]
    fn switch_mode_resets() {
        let mut e = engine(Mode::Standard);
        jump_to(&mut e, 30);
        e.start();
        e.tick();
        assert_eq!(e.styling().tier, Tier::Warning);
        let events = e.switch_mode(Mode::Guided);
        assert_eq!(e.mode(), Mode::Guided);
        assert_eq!(e.remaining_seconds(), 720);
        assert!(!e.is_running());
        assert!(e.styling().is_clear());
        assert!(matches!(
            events.first(),
            Some(Event::ModeSwitched {
                mode: Mode::Guided,
                ..
            })
        ));
    }

    #[test]
    fn feedback_text_is_shown_and_cleared() {
        let mut e = engine(Mode::Guided);
        e.start();
        e.acknowledge_feedback();
        assert_eq!(e.styling().text, FEEDBACK_THANKS);
        e.clear_text();
        assert_eq!(e.styling().text, "");
        assert_eq!(e.styling().tier, Tier::Green);
        assert!(e.clear_text().is_empty());
    }

    #[test]
    fn observers_see_every_event() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut e = engine(Mode::Guided);
        e.subscribe(Box::new(move |ev: &Event| {
            sink.lock().unwrap().push(ev.name());
        }));
        e.start();
        e.tick();
        e.reset();
        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                "timer_started",
                "phase_changed",
                "tick",
                "timer_paused",
                "styling_cleared",
                "timer_reset"
            ]
        );
    }

    #[test]
    fn clock_formatting() {
        assert_eq!(format_clock(61), "01:01");
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(719), "11:59");
        assert_eq!(format_clock(720), "12:00");
    }
}
