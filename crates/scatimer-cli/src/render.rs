//! Terminal rendering of timer events.
//!
//! Stands in for the browser page: one line per tick with the clock, the
//! current tier and the phase text.

use std::io::Write;

use scatimer_core::{Event, Tier, TimerObserver};

pub struct TerminalRenderer<W: Write + Send> {
    out: W,
    tier: Tier,
    text: String,
}

impl TerminalRenderer<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            tier: Tier::None,
            text: String::new(),
        }
    }

    /// Update the tracked styling and return the line to print, if any.
    pub fn line_for(&mut self, event: &Event) -> Option<String> {
        match event {
            Event::TimerStarted {
                remaining_seconds,
                mode,
                ..
            } => Some(format!(
                "started ({mode}) at {}",
                scatimer_core::format_clock(*remaining_seconds)
            )),
            Event::TimerPaused {
                remaining_seconds, ..
            } => Some(format!(
                "paused at {}",
                scatimer_core::format_clock(*remaining_seconds)
            )),
            Event::TimerReset { total_seconds, .. } => Some(format!(
                "reset to {}",
                scatimer_core::format_clock(*total_seconds)
            )),
            Event::Tick { display, .. } => Some(self.status(display)),
            Event::PhaseChanged { tier, label, .. } => {
                self.tier = *tier;
                self.text = label.clone().unwrap_or_default();
                None
            }
            Event::WarningEntered { .. } => {
                self.tier = Tier::Warning;
                Some("one minute remaining".to_string())
            }
            Event::TimerCompleted { message, .. } => {
                self.text = message.clone();
                Some(self.status("00:00"))
            }
            Event::StylingCleared { .. } => {
                self.tier = Tier::None;
                self.text.clear();
                None
            }
            Event::ModeSwitched { mode, .. } => Some(format!("mode: {mode}")),
            Event::SoundToggled { enabled, .. } => {
                Some(format!("sound {}", if *enabled { "on" } else { "off" }))
            }
            Event::CuePlayed { played: false, .. } => Some("\u{7}".to_string()),
            Event::CuePlayed { played: true, .. } => None,
            Event::FeedbackAcknowledged { message, .. } => {
                self.text = message.clone();
                Some(message.clone())
            }
            Event::TextCleared { .. } => {
                self.text.clear();
                None
            }
        }
    }

    fn status(&self, clock: &str) -> String {
        let badge = match self.tier {
            Tier::None => "",
            Tier::Green => "[GREEN] ",
            Tier::Amber => "[AMBER] ",
            Tier::Red => "[RED] ",
            Tier::Warning => "[!] ",
        };
        if self.text.is_empty() {
            format!("{badge}{clock}")
        } else {
            format!("{badge}{clock}  {}", self.text)
        }
    }
}

impl<W: Write + Send> TimerObserver for TerminalRenderer<W> {
    fn on_event(&mut self, event: &Event) {
        if let Some(line) = self.line_for(event) {
            // A closed stdout is not worth stopping the timer for.
            let _ = writeln!(self.out, "{line}");
            let _ = self.out.flush();
        }
    }
}
