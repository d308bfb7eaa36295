use anyhow::Result;
use clap::Parser;
use tracing::info;

use access_codes_api::app::{self, AppState};
use access_codes_api::config::Config;
use access_codes_api::error::ApiError;
use access_codes_api::{cli::Cli, commands, logging, metrics};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    logging::init_logging(&config.logging);

    info!("Starting access-codes v{}", env!("CARGO_PKG_VERSION"));

    let metrics_handle = match cli.metrics_out {
        Some(_) => Some(metrics::init_metrics()?),
        None => None,
    };

    let state = match connect(config).await {
        Ok(state) => state,
        Err(err) => exit_with(err),
    };

    let result = commands::run(cli.command, &state, cli.operator.as_deref()).await;

    if let (Some(handle), Some(path)) = (&metrics_handle, &cli.metrics_out) {
        tokio::fs::write(path, metrics::render_snapshot(handle, &state.pool)).await?;
        info!(path = %path.display(), "Metrics snapshot written");
    }

    match result {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(err) => exit_with(err),
    }
}

/// Creates the database pool and wires the application state.
async fn connect(config: Config) -> Result<AppState, ApiError> {
    let pool = persistence::create_pool(&config.database).await?;
    app::create_app(config, pool)
}

/// Prints the error body as JSON on stderr and exits with its code.
fn exit_with(err: ApiError) -> ! {
    let exit_code = err.exit_code();
    if let Ok(body) = serde_json::to_string(&err.into_body()) {
        eprintln!("{}", body);
    }
    std::process::exit(exit_code);
}
