//! Cooperative driver for [`TimerEngine`].
//!
//! One task owns the engine and multiplexes:
//! - the one-second tick, polled only while running
//! - user commands, applied between ticks
//! - the post-completion styling clear, [`GRACE_DELAY`] after each completion
//! - feedback submissions, their 2 second button cooldown, and the text
//!   clear 2 seconds after each server answer
//!
//! Nothing here runs concurrently with a tick, so the engine needs no lock.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::engine::{TimerEngine, GRACE_DELAY};
use super::phase::Mode;
use crate::events::Event;
use crate::feedback::{FeedbackClient, FeedbackGate, Rating, FEEDBACK_COOLDOWN};

const TICK: Duration = Duration::from_secs(1);

/// User actions, one per button on the timer page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    Reset,
    SwitchMode(Mode),
    SetSound(bool),
    TestSound,
    Feedback(Rating),
    Quit,
}

pub struct TimerRunner {
    engine: TimerEngine,
    client: Option<FeedbackClient>,
    gate: FeedbackGate,
}

impl TimerRunner {
    pub fn new(engine: TimerEngine) -> Self {
        Self {
            engine,
            client: None,
            gate: FeedbackGate::default(),
        }
    }

    /// Send feedback clicks to this server.
    pub fn with_feedback(mut self, client: FeedbackClient) -> Self {
        self.client = Some(client);
        self
    }

    /// Run until `Quit` or the command channel closes. Returns the engine.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) -> TimerEngine {
        let mut ticker = time::interval_at(Instant::now() + TICK, TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // One pending clear per completion; reset does not cancel them.
        let mut grace_clears: VecDeque<Instant> = VecDeque::new();
        let mut feedback_reset: Option<Instant> = None;
        let (result_tx, mut results) = mpsc::channel::<bool>(4);

        loop {
            let next_clear = grace_clears.front().copied();
            let far = Instant::now() + Duration::from_secs(86_400);

            tokio::select! {
                _ = ticker.tick(), if self.engine.is_running() => {
                    let events = self.engine.tick();
                    schedule_grace_clears(&events, &mut grace_clears);
                }
                cmd = commands.recv() => {
                    let Some(cmd) = cmd else { break };
                    if cmd == Command::Quit {
                        break;
                    }
                    if cmd == Command::Start && !self.engine.is_running() {
                        // First tick one full second after start.
                        ticker.reset();
                    }
                    if let Command::Feedback(rating) = cmd {
                        if let Some(deadline) = self.submit_feedback(rating, &result_tx) {
                            feedback_reset = Some(deadline);
                        }
                        continue;
                    }
                    let events = self.apply(cmd);
                    schedule_grace_clears(&events, &mut grace_clears);
                }
                _ = time::sleep_until(next_clear.unwrap_or(far)), if next_clear.is_some() => {
                    grace_clears.pop_front();
                    self.engine.clear_styling();
                }
                _ = time::sleep_until(feedback_reset.unwrap_or(far)), if feedback_reset.is_some() => {
                    feedback_reset = None;
                    self.engine.clear_text();
                }
                Some(accepted) = results.recv() => {
                    if accepted {
                        self.engine.acknowledge_feedback();
                    }
                    // Counted from the answer, however long the request took.
                    feedback_reset = Some(Instant::now() + FEEDBACK_COOLDOWN);
                }
            }
        }
        self.engine
    }

    fn apply(&mut self, cmd: Command) -> Vec<Event> {
        match cmd {
            Command::Start => self.engine.start(),
            Command::Pause => self.engine.pause(),
            Command::Reset => self.engine.reset(),
            Command::SwitchMode(mode) => self.engine.switch_mode(mode),
            Command::SetSound(enabled) => self.engine.set_sound_enabled(enabled),
            Command::TestSound => self.engine.play_test_sound(),
            Command::Feedback(_) | Command::Quit => Vec::new(),
        }
    }

    /// Fire-and-forget submission. Returns when to clear the text if no
    /// request went out; otherwise the answer on `results` schedules it.
    fn submit_feedback(&mut self, rating: Rating, results: &mpsc::Sender<bool>) -> Option<Instant> {
        let now = Instant::now();
        if !self.gate.try_click(now) {
            tracing::debug!(%rating, "feedback buttons disabled, click ignored");
            return None;
        }
        let mode = self.engine.mode();
        match self.client.clone() {
            Some(client) => {
                let results = results.clone();
                tokio::spawn(async move {
                    let accepted = match client.submit(rating, mode).await {
                        Ok(()) => true,
                        Err(e) => {
                            // Never surfaced to the user.
                            tracing::debug!(error = %e, "feedback submission failed");
                            false
                        }
                    };
                    let _ = results.send(accepted).await;
                });
                None
            }
            None => {
                tracing::debug!(%rating, "no feedback server configured");
                self.gate.reenable_at()
            }
        }
    }
}

fn schedule_grace_clears(events: &[Event], clears: &mut VecDeque<Instant>) {
    for event in events {
        if matches!(event, Event::TimerCompleted { .. }) {
            clears.push_back(Instant::now() + GRACE_DELAY);
        }
    }
}
