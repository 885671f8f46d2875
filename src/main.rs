use anyhow::Result;
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use price_watcher::cli::{self, Cli, Commands};
use price_watcher::config::LoggingConfig;
use price_watcher::AppConfig;

/// stderr always; a daily rolling file too when `logging.directory` is set.
fn init_tracing(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.filter))?;
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    match &logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "price-watcher.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();

    let config = AppConfig::load(args.config.as_deref())?;
    let _guard = init_tracing(&config.logging)?;

    match args.command {
        Commands::Run => cli::run_once(&config).await,
        Commands::Serve { host, port } => cli::serve(&config, host, port).await,
        Commands::Rules { action } => cli::rules(&config, action),
        Commands::State { action } => cli::state(&config, action),
    }
}
