use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};

use transfeed::feed::HttpFeedSource;
use transfeed::translate::{Credentials, GoogleTranslator, TitleTranslator};
use transfeed::web::{AppState, WebServer};
use transfeed::{Config, RequestPipeline};

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration
    let mut config = match Config::load("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };
    config.apply_env_overrides();

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        return ExitCode::FAILURE;
    }

    // Initialize logging
    if let Err(e) = transfeed::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        transfeed::logging::init_console_only(&config.logging.level);
    }

    info!("transfeed {}", env!("CARGO_PKG_VERSION"));

    match run(&config).await {
        Ok(()) => {
            info!("Server stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Server failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &Config) -> transfeed::Result<()> {
    let target = config.target_language()?;
    let credentials = Credentials::resolve(&config.translate)?;

    let source = HttpFeedSource::new(&config.fetch)?;
    let translator = GoogleTranslator::new(&config.translate, credentials)?;
    let pipeline = RequestPipeline::new(
        Arc::new(source),
        TitleTranslator::new(Arc::new(translator), target),
    );

    info!(
        target_language = %config.translate.target_language,
        cache_capacity = config.cache.capacity,
        cache_ttl_secs = config.cache.ttl_secs,
        "Server configured on {}:{}",
        config.server.host,
        config.server.port
    );

    let server = WebServer::new(config, AppState::new(pipeline, config)?)?;
    server.run().await?;
    Ok(())
}
