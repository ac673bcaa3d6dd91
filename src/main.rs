// src/main.rs — router_agent entry point

use clap::Parser;

use calai::cli::{Cli, Commands};
use calai::infra::config::Config;
use calai::infra::logger;

#[tokio::main]
async fn main() {
    // .env first so the API key and overrides are visible to config.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    logger::init_logging(if cli.verbose { "info" } else { "warn" });

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = match cli.config {
        Some(ref path) => {
            let mut c = Config::load_from(path)?;
            c.apply_env_overrides();
            c
        }
        None => Config::load()?,
    };
    config.validate()?;
    tracing::debug!(
        estimation = %config.estimation.base_url,
        model = %config.reasoning.model,
        "Config loaded"
    );

    match cli.command {
        Some(Commands::History { session, limit }) => {
            calai::cli::history::show_history(&session, limit, cli.json).await?;
            Ok(true)
        }
        Some(Commands::Health) => calai::cli::health::check_health(&config, cli.json).await,
        None => {
            let (Some(session), Some(query)) = (cli.session, cli.query) else {
                eprintln!("Usage: router_agent <session_path> <query> [image_path]");
                eprintln!("Run router_agent --help for examples.");
                return Ok(false);
            };
            // An empty query is meaningful (estimate only), so pass it through.
            calai::cli::ask::run_ask(&session, &query, cli.image.as_deref(), &config, cli.json)
                .await
        }
    }
}
