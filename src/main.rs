use std::process::ExitCode;

use catalog_store::{CatalogLoader, LoadError, LoadOutcome, LoaderConfig, load_dotenv};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file when present.
    let dotenv = load_dotenv(".env");

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();

    match dotenv {
        Ok(Some(path)) => info!("Loaded environment from {:?}", path),
        Ok(None) => info!("No .env file, using process environment"),
        Err(e) => {
            error!("Product load failed at {} stage: {e}", e.stage());
            return ExitCode::from(e.exit_code());
        }
    }

    match run().await {
        Ok(LoadOutcome::Skipped { index }) => {
            info!("Index '{index}' already exists, products were not reloaded");
            ExitCode::SUCCESS
        }
        Ok(LoadOutcome::Loaded { index, records }) => {
            info!("Loaded {records} products into '{index}'");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Product load failed at {} stage: {e}", e.stage());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<LoadOutcome, LoadError> {
    let cfg = LoaderConfig::from_env()?;
    info!(
        "Config: data={:?} schema={:?} concurrency={}",
        cfg.data_location, cfg.schema_path, cfg.write_concurrency
    );
    CatalogLoader::new(cfg)?.run().await
}
