//! One-shot connectivity check against an Ollama server
//!
//! Waits for the server to come up, checks that the configured model is pulled, sends a single
//! prompt and prints the reply. Exits non-zero on any failure, so it works as a container
//! readiness script.

use clap::Parser;
use ollama_relay::backend::BackendClient;
use ollama_relay::client::create_hyper_client;
use ollama_relay::config::BackendArgs;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, warn};

const PING_TEST_PROMPT: &str = "ping test";

#[derive(Parser, Debug)]
#[command(name = "relay-ping")]
#[command(about = "Check that the Ollama server is up and answering")]
struct Args {
    #[command(flatten)]
    backend: BackendArgs,

    /// Time to wait before the first request, for servers still starting (ms)
    #[arg(long, env = "STARTUP_DELAY_MS", default_value_t = 2000)]
    startup_delay_ms: u64,

    /// Prompt to send once the model is confirmed
    #[arg(long, default_value = PING_TEST_PROMPT)]
    prompt: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let backend_args = args.backend.validate()?;
    let config = backend_args.backend_config();
    info!("Checking Ollama connection at {}", config.base_url);

    if args.startup_delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(args.startup_delay_ms)).await;
    }

    let backend = BackendClient::new(create_hyper_client(1, Duration::from_secs(10)), config);
    let model = backend.config().default_model.clone();

    let has_model = match backend.has_model(&model).await {
        Ok(has_model) => has_model,
        Err(e) if e.is_connect() => {
            anyhow::bail!("Cannot connect to Ollama ({e}). Make sure the server is running.")
        }
        Err(e) => return Err(e.into()),
    };
    info!("Ollama is running");

    if !has_model {
        warn!("Model {} not found. Pull it with: ollama pull {}", model, model);
        anyhow::bail!("model {model} is not available");
    }
    info!("Model {} is available, sending prompt", model);

    let response = backend.generate(&model, &args.prompt).await?;

    println!("{}", "─".repeat(50));
    println!("{}", response.response);
    println!("{}", "─".repeat(50));
    info!("Ping successful, {} is answering", response.model);
    Ok(())
}
