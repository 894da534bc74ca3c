use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use emotion_assist_lib::{init_logging, run, Config};

/// Web server for webcam emotion detection, speech and a local LLM
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the JSON config file (default: ~/.emotion-assist/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the config file
    #[arg(short, long)]
    bind: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(),
    };

    if let Some(bind) = args.bind {
        config.bind_address = bind;
        config = config.normalized()?;
    }

    run(config).await
}
