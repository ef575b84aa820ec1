//! Best-effort completion tone.
//!
//! The cue is a single 800 Hz sine beep with a short attack and an
//! exponential tail. Playback never reports an error to the caller: if no
//! output device can be opened the cue is simply skipped.
//!
//! Real output goes through rodio and is only compiled with the `audio`
//! feature. Without it [`default_cue`] returns a [`SilentCue`].

use std::f32::consts::TAU;
use std::time::Duration;

/// Sample rate used when rendering the tone.
pub const SAMPLE_RATE: u32 = 44_100;

/// Shape of the completion beep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSpec {
    pub frequency_hz: f32,
    /// Gain reached at the end of the attack.
    pub peak_gain: f32,
    /// Gain reached at the end of the tone.
    pub floor_gain: f32,
    pub attack: Duration,
    pub duration: Duration,
}

impl Default for ToneSpec {
    fn default() -> Self {
        Self {
            frequency_hz: 800.0,
            peak_gain: 0.3,
            floor_gain: 0.01,
            attack: Duration::from_millis(10),
            duration: Duration::from_millis(500),
        }
    }
}

impl ToneSpec {
    /// Envelope gain at time `t` after the tone starts.
    ///
    /// Linear ramp `0 -> peak` over the attack, then an exponential ramp
    /// `peak -> floor` ending at `duration`. Silent afterwards.
    pub fn gain_at(&self, t: Duration) -> f32 {
        if t > self.duration {
            return 0.0;
        }
        let t = t.as_secs_f32();
        let attack = self.attack.as_secs_f32();
        if t <= attack {
            if attack == 0.0 {
                return self.peak_gain;
            }
            return self.peak_gain * (t / attack);
        }
        let decay = self.duration.as_secs_f32() - attack;
        if decay <= 0.0 {
            return self.floor_gain;
        }
        let progress = (t - attack) / decay;
        self.peak_gain * (self.floor_gain / self.peak_gain).powf(progress)
    }

    pub fn sample_at(&self, t: Duration) -> f32 {
        self.gain_at(t) * (TAU * self.frequency_hz * t.as_secs_f32()).sin()
    }

    /// Mono samples for the whole tone at `sample_rate`.
    pub fn samples(&self, sample_rate: u32) -> ToneSamples {
        let total = (self.duration.as_secs_f64() * sample_rate as f64).round() as usize;
        ToneSamples {
            spec: *self,
            sample_rate,
            index: 0,
            total,
        }
    }
}

/// Finite iterator over the rendered tone.
#[derive(Debug, Clone)]
pub struct ToneSamples {
    spec: ToneSpec,
    sample_rate: u32,
    index: usize,
    total: usize,
}

impl ToneSamples {
    pub fn rate(&self) -> u32 {
        self.sample_rate
    }
}

impl Iterator for ToneSamples {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.index >= self.total {
            return None;
        }
        let t = Duration::from_secs_f64(self.index as f64 / self.sample_rate as f64);
        self.index += 1;
        Some(self.spec.sample_at(t))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.total - self.index;
        (left, Some(left))
    }
}

impl ExactSizeIterator for ToneSamples {}

/// Something that can play the completion cue.
pub trait AudioCue: Send {
    /// Opportunistically wake a suspended output. Never fails.
    fn resume(&mut self) {}

    /// Fire the tone. Returns whether playback was attempted.
    fn play(&mut self) -> bool;
}

/// Cue used when no audio subsystem is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentCue;

impl AudioCue for SilentCue {
    fn play(&mut self) -> bool {
        false
    }
}

/// Best cue available in this build.
pub fn default_cue() -> Box<dyn AudioCue> {
    #[cfg(feature = "audio")]
    {
        Box::new(output::RodioCue::new(ToneSpec::default()))
    }
    #[cfg(not(feature = "audio"))]
    {
        Box::new(SilentCue)
    }
}

#[cfg(feature = "audio")]
pub use output::RodioCue;

#[cfg(feature = "audio")]
mod output {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::{AudioCue, ToneSamples, ToneSpec, SAMPLE_RATE};

    impl rodio::Source for ToneSamples {
        fn current_frame_len(&self) -> Option<usize> {
            None
        }

        fn channels(&self) -> u16 {
            1
        }

        fn sample_rate(&self) -> u32 {
            self.rate()
        }

        fn total_duration(&self) -> Option<Duration> {
            None
        }
    }

    /// Plays the tone on the default output device.
    ///
    /// Each playback runs on its own thread because the output stream is
    /// not `Send` on every platform. A failed open marks the device as
    /// suspended; `resume` and every `play` clear the mark and try again.
    pub struct RodioCue {
        spec: ToneSpec,
        suspended: Arc<AtomicBool>,
    }

    impl RodioCue {
        pub fn new(spec: ToneSpec) -> Self {
            Self {
                spec,
                suspended: Arc::new(AtomicBool::new(false)),
            }
        }

        /// True when the last playback could not open an output device.
        pub fn is_suspended(&self) -> bool {
            self.suspended.load(Ordering::Relaxed)
        }
    }

    impl AudioCue for RodioCue {
        fn resume(&mut self) {
            self.suspended.store(false, Ordering::Relaxed);
        }

        fn play(&mut self) -> bool {
            self.resume();
            let samples = self.spec.samples(SAMPLE_RATE);
            let suspended = Arc::clone(&self.suspended);
            let spawned = std::thread::Builder::new()
                .name("scatimer-cue".into())
                .spawn(move || {
                    use rodio::{OutputStream, Sink};

                    let Ok((_stream, handle)) = OutputStream::try_default() else {
                        tracing::debug!("no audio output device, skipping cue");
                        suspended.store(true, Ordering::Relaxed);
                        return;
                    };
                    let Ok(sink) = Sink::try_new(&handle) else {
                        suspended.store(true, Ordering::Relaxed);
                        return;
                    };
                    sink.append(samples);
                    sink.sleep_until_end();
                });
            spawned.is_ok()
        }
    }
}
