use clap::{Parser, Subcommand};
use std::sync::Arc;
use strikebot_broker::PaperBroker;
use strikebot_core::ConfigLoader;
use strikebot_engine::Engine;
use strikebot_scheduler::JobRunner;
use strikebot_web_api::{ApiContext, ApiServer};
use tracing::info;

#[derive(Parser)]
#[command(name = "strikebot")]
#[command(about = "Signal-driven options trading controller", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the trading controller with webhook server and timers
    Run {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Run { config } => {
            run_controller(&config).await?;
        }
    }

    Ok(())
}

async fn run_controller(config_path: &str) -> anyhow::Result<()> {
    let config = ConfigLoader::load(config_path)?;

    // Paper execution only; live brokerage connectivity plugs in behind
    // the same traits.
    let broker = Arc::new(PaperBroker::new());

    let engine = Arc::new(Engine::new(
        config.trading.clone(),
        config.session.hours,
        broker.clone(),
        broker.clone(),
    ));

    let runner = JobRunner::new(config.schedule.clone(), engine.clone());
    let _scheduler = runner.start().await?;

    let context = Arc::new(ApiContext::new(
        engine,
        config.auth.webhook_token.clone(),
        config.trading.policy_rejection_as_forbidden,
    ));
    let server = ApiServer::new(context);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!(addr = %addr, "Starting webhook server");
    server.serve(&addr).await
}
