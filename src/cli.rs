//! Headless entrypoint: loads configuration and the agent roster, boots
//! the `Runtime`, and runs until interrupted.

use std::sync::Arc;

use agentco::ai::provider::LLMProvider;
use agentco::ai::providers::{OpenAICompatibleConfig, OpenAICompatibleProvider};
use agentco::config::{AppConfig, default_config_path, load_config, load_default_config};
use agentco::runtime::Runtime;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "agentco", about = "Concurrent multi-agent orchestration runtime")]
struct Cli {
    /// Path to config.toml. Defaults to ~/.agentco/config.toml.
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Boot the runtime and keep it running until Ctrl-C.
    Run,
    /// Print the resolved configuration and exit.
    PrintConfig,
}

fn load_cli_config(path: Option<&str>) -> AppConfig {
    match path {
        Some(p) => load_config(std::path::Path::new(p)).unwrap_or_else(|e| {
            tracing::warn!("failed to load config at {p}: {e}, falling back to defaults");
            AppConfig::default()
        }),
        None => match default_config_path() {
            Ok(p) if p.exists() => load_config(&p).unwrap_or_else(|_| load_default_config()),
            _ => load_default_config(),
        },
    }
}

fn build_provider(config: &AppConfig) -> Arc<dyn LLMProvider> {
    let api_key = std::env::var("AGENTCO_LLM_API_KEY").unwrap_or_default();
    let provider_config = OpenAICompatibleConfig::with_model(
        api_key,
        "https://api.openai.com/v1",
        config.provider.default_model.clone(),
    );
    match OpenAICompatibleProvider::new(provider_config, config.provider.default_id.clone()) {
        Ok(provider) => Arc::new(provider),
        Err(e) => panic!("failed to construct LLM provider '{}': {e}", config.provider.default_id),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = load_cli_config(cli.config.as_deref());

    match cli.command.unwrap_or(Command::Run) {
        Command::PrintConfig => {
            println!("{}", toml::to_string_pretty(&config).unwrap_or_default());
        }
        Command::Run => {
            let provider = build_provider(&config);
            let runtime = Runtime::build_from_config(&config, provider)
                .await
                .unwrap_or_else(|e| {
                    tracing::error!("failed to build runtime: {e}");
                    std::process::exit(1);
                });

            tracing::info!("agentco runtime running; press Ctrl-C to stop");
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("failed to listen for ctrl-c: {e}");
            }
            runtime.stop().await;
        }
    }
}
