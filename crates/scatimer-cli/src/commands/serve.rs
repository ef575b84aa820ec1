use std::path::PathBuf;

use clap::Args;
use scatimer_core::{ApiServer, Config, Deployment, FeedbackApi, FeedbackStore};

#[derive(Args)]
pub struct ServeArgs {
    /// Port to listen on (overrides PORT and the config file)
    #[arg(long)]
    port: Option<u16>,
    /// Feedback data file
    #[arg(long)]
    data: Option<PathBuf>,
    /// Directory served for GET requests outside /api
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

pub fn run(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let deployment = Deployment::from_env();
    if deployment == Deployment::Serverless {
        // The host owns the socket and calls `FeedbackApi::handle` per request.
        return Err("serverless deployment (VERCEL=1) does not start a listener".into());
    }
    let port = args.port.unwrap_or_else(|| config.server.resolved_port());
    let path = args
        .data
        .unwrap_or_else(|| config.server.feedback_path(deployment));

    let mut api = FeedbackApi::new(FeedbackStore::new(path));
    if let Some(dir) = args.static_dir.or(config.server.static_dir) {
        api = api.with_static_dir(dir);
    }

    let server = ApiServer::bind(api, port)?;
    println!("SCA Timer server running on port {port}");
    server.run();
    Ok(())
}
