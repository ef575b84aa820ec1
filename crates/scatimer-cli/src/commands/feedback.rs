use std::path::PathBuf;

use clap::Subcommand;
use scatimer_core::{Config, FeedbackClient, FeedbackStore, Mode, Rating};

#[derive(Subcommand)]
pub enum FeedbackAction {
    /// Submit a rating to the feedback server
    Send {
        /// positive or negative
        rating: Rating,
        /// Mode the rating refers to
        #[arg(long, default_value = "standard")]
        mode: Mode,
        /// Feedback server base URL
        #[arg(long)]
        server: Option<String>,
    },
    /// Print the feedback summary as JSON
    Summary {
        /// Read a local data file instead of asking the server
        #[arg(long, conflicts_with = "server")]
        data: Option<PathBuf>,
        /// Feedback server base URL
        #[arg(long)]
        server: Option<String>,
    },
}

pub fn run(action: FeedbackAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        FeedbackAction::Send { rating, mode, server } => {
            let client = client(server)?;
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(client.submit(rating, mode))?;
            println!("Feedback recorded");
        }
        FeedbackAction::Summary {
            data: Some(path), ..
        } => {
            let summary = FeedbackStore::new(path).summary();
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        FeedbackAction::Summary { data: None, server } => {
            let client = client(server)?;
            let runtime = tokio::runtime::Runtime::new()?;
            let summary = runtime.block_on(client.summary())?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }
    Ok(())
}

fn client(server: Option<String>) -> Result<FeedbackClient, Box<dyn std::error::Error>> {
    let url = server.unwrap_or_else(|| Config::load_or_default().client.server_url);
    Ok(FeedbackClient::new(&url)?)
}
