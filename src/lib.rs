pub mod config;
pub mod emotion;
pub mod frame_store;
pub mod llm_client;
pub mod server;
pub mod service;
pub mod speech;

#[cfg(test)]
mod test_support;

use tracing::info;
use tracing_subscriber::EnvFilter;

pub use config::Config;

/// Initialize logging; `RUST_LOG` wins over the default level
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

/// Run the web server with the given configuration until shutdown
pub async fn run(config: Config) -> anyhow::Result<()> {
    info!("Emotion Assist starting...");
    info!("Language model: {} at {}", config.llm_model, config.llm_api_url);
    info!("Classifier: {}", config.classifier_url);
    info!("Confusion emotions: {:?}", config.confusion_emotions);

    server::serve(config).await
}
