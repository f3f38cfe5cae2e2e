//! podtext CLI entry point.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use podtext::cli::{commands, Cli, Commands, Output};
use podtext::config::Config;
use podtext::PodtextError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("podtext={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match run(cli).await {
        Ok(()) => {}
        Err(e) => {
            Output::error(&e.to_string());
            // Usage and configuration problems exit 2, runtime failures 1.
            let code = match e.downcast_ref::<PodtextError>() {
                Some(pe) if pe.is_usage_error() => 2,
                _ => 1,
            };
            std::process::exit(code);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Load configuration
    let config = match &cli.config {
        Some(path) => Config::load_from(std::path::Path::new(path))?,
        None => Config::load()?,
    };

    match &cli.command {
        Commands::Search { query, limit } => {
            commands::run_search(query, *limit, &config).await?;
        }

        Commands::Episodes { feed_url, limit } => {
            commands::run_episodes(feed_url, *limit, &config).await?;
        }

        Commands::Transcribe {
            feed_url,
            indices,
            model,
            output_dir,
            skip_language_check,
            overwrite,
        } => {
            commands::run_transcribe(
                feed_url,
                indices,
                model.clone(),
                output_dir.clone(),
                *skip_language_check,
                *overwrite,
                config,
            )
            .await?;
        }
    }

    Ok(())
}
