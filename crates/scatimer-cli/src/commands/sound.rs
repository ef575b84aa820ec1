use std::time::Duration;

use clap::Subcommand;
use scatimer_core::{default_cue, ToneSpec};

#[derive(Subcommand)]
pub enum SoundAction {
    /// Play the completion tone once
    Test,
}

pub fn run(action: SoundAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SoundAction::Test => {
            let mut cue = default_cue();
            if cue.play() {
                // Playback runs on its own thread; outlive the tone.
                std::thread::sleep(ToneSpec::default().duration + Duration::from_millis(200));
                println!("played");
            } else {
                return Err("audio output unavailable (build with --features audio)".into());
            }
        }
    }
    Ok(())
}
