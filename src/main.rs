use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use wakeline::api::{ApiServer, ApiState};
use wakeline::engine::{Clock, IngestPipeline, SystemClock};
use wakeline::services::{AnswerService, IntentService, OpenAiAnswer, WeatherClient};
use wakeline::Config;

/// Wakeline - wake-phrase gateway for streamed voice transcripts
#[derive(Parser)]
#[command(name = "wakeline", version, about)]
struct Cli {
    /// Port to listen on (overrides config)
    #[arg(long, env = "WAKELINE_PORT")]
    port: Option<u16>,

    /// Path to a TOML config file
    #[arg(long, env = "WAKELINE_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,wakeline=info",
        1 => "info,wakeline=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let engine = IngestPipeline::new(config.engine.clone(), clock.now());

    let answer: Option<Arc<dyn AnswerService>> = config
        .api_keys
        .openai
        .clone()
        .map(|key| Arc::new(OpenAiAnswer::new(key, &config.llm)) as Arc<dyn AnswerService>);
    if answer.is_none() {
        tracing::warn!("OPENAI_API_KEY not set; finalized questions get a canned reply");
    }

    let weather = config.api_keys.openweather.clone().map(WeatherClient::new);
    let intent = config
        .api_keys
        .openai
        .clone()
        .map(|key| IntentService::new(key, &config.llm, weather));

    let state = Arc::new(ApiState::new(engine, clock, answer, intent));
    ApiServer::new(state, config.server.port).run().await?;

    Ok(())
}
