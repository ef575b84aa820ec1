use clap::Args;
use scatimer_core::{
    default_cue, Command, Config, FeedbackClient, Mode, Rating, TimerEngine, TimerRunner,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::render::TerminalRenderer;

const HELP: &str = "\
commands:
  s, start          start or resume
  p, pause          pause
  r, reset          reset to the full duration
  m, mode <mode>    switch to standard or guided (resets)
  sound on|off      toggle the completion sound
  t, test           play the completion sound
  +, good           positive feedback
  -, bad            negative feedback
  q, quit           exit";

#[derive(Args)]
pub struct RunArgs {
    /// Timer mode (standard or guided)
    #[arg(long)]
    mode: Option<Mode>,
    /// Countdown length in seconds
    #[arg(long)]
    seconds: Option<u32>,
    /// Disable the completion sound
    #[arg(long)]
    no_sound: bool,
    /// Feedback server base URL
    #[arg(long)]
    server: Option<String>,
    /// Do not send feedback anywhere
    #[arg(long, conflicts_with = "server")]
    offline: bool,
    /// Start counting immediately
    #[arg(long)]
    autostart: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum ParseError {
    Empty,
    Help,
    Unknown(String),
}

/// Map one line of terminal input to a runner command.
fn parse_line(line: &str) -> Result<Command, ParseError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err(ParseError::Empty);
    };
    let arg = words.next();
    match (head.to_ascii_lowercase().as_str(), arg) {
        ("s" | "start", None) => Ok(Command::Start),
        ("p" | "pause", None) => Ok(Command::Pause),
        ("r" | "reset", None) => Ok(Command::Reset),
        ("t" | "test", None) => Ok(Command::TestSound),
        ("q" | "quit" | "exit", None) => Ok(Command::Quit),
        ("+" | "good" | "positive", None) => Ok(Command::Feedback(Rating::Positive)),
        ("-" | "bad" | "negative", None) => Ok(Command::Feedback(Rating::Negative)),
        ("m" | "mode", Some(mode)) => mode
            .parse::<Mode>()
            .map(Command::SwitchMode)
            .map_err(|_| ParseError::Unknown(line.trim().to_string())),
        ("sound", Some("on")) => Ok(Command::SetSound(true)),
        ("sound", Some("off")) => Ok(Command::SetSound(false)),
        ("?" | "h" | "help", _) => Err(ParseError::Help),
        _ => Err(ParseError::Unknown(line.trim().to_string())),
    }
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let mut settings = config.timer.settings();
    if let Some(mode) = args.mode {
        settings.mode = mode;
    }
    if let Some(seconds) = args.seconds {
        settings.total_seconds = seconds;
    }
    if args.no_sound {
        settings.sound_enabled = false;
    }

    let mut engine = TimerEngine::new(settings, default_cue());
    engine.subscribe(Box::new(TerminalRenderer::stdout()));

    let mut runner = TimerRunner::new(engine);
    if !args.offline {
        let url = args.server.unwrap_or(config.client.server_url);
        runner = runner.with_feedback(FeedbackClient::new(&url)?);
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(drive(runner, args.autostart))
}

async fn drive(runner: TimerRunner, autostart: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (tx, rx) = mpsc::channel(16);
    let handle = tokio::spawn(runner.run(rx));

    println!("type ? for help");
    if autostart {
        tx.send(Command::Start).await?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Ok(Command::Quit) => break,
            Ok(cmd) => {
                if tx.send(cmd).await.is_err() {
                    break;
                }
            }
            Err(ParseError::Empty) => {}
            Err(ParseError::Help) => println!("{HELP}"),
            Err(ParseError::Unknown(input)) => eprintln!("unknown command: {input} (? for help)"),
        }
    }

    // Closing the channel stops the runner.
    drop(tx);
    let engine = handle.await?;
    tracing::debug!(remaining = engine.remaining_seconds(), "timer stopped");
    Ok(())
}
