use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

use gamkers::constants::{DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_TEMPERATURE};
use gamkers::{chat, web_server, Config, ConversationLog, DecisionStrategy, GenerationConfig};

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Language model API key.
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true, global = true)]
    google_api_key: Option<String>,

    /// Web search API key.
    #[arg(long, env = "SERPER_API_KEY", hide_env_values = true, global = true)]
    serper_api_key: Option<String>,

    /// How to decide whether a question needs a web search.
    #[arg(long, value_enum, env = "GAMKERS_DECISION", default_value_t = DecisionStrategy::Keyword, global = true)]
    decision: DecisionStrategy,

    /// Sampling temperature for every reply, within [0, 1].
    #[arg(long, env = "GAMKERS_TEMPERATURE", default_value_t = DEFAULT_TEMPERATURE, global = true)]
    temperature: f32,

    /// Hard cap on reply length in tokens.
    #[arg(long, env = "GAMKERS_MAX_OUTPUT_TOKENS", default_value_t = DEFAULT_MAX_OUTPUT_TOKENS, global = true)]
    max_output_tokens: u32,

    #[command(subcommand)]
    command: Commands,
}

// Define the available subcommands
#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Serve the browser chat UI.
    Serve {
        #[arg(long, default_value_t = 9900, help = "Port for the web server.")]
        port: u16,
    },
    /// Chat in the terminal.
    Chat,
    /// Ask a single question and print the answer.
    Ask {
        /// The question to ask.
        prompt: String,
    },
}

fn main() -> ExitCode {
    // Load .env file if present (for GOOGLE_API_KEY / SERPER_API_KEY)
    dotenvy::dotenv().ok();

    // Reads log level from RUST_LOG (e.g., RUST_LOG=info,gamkers=debug)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let generation = GenerationConfig {
        temperature: cli.temperature,
        max_output_tokens: cli.max_output_tokens,
    };
    // Missing secrets stop us here, before any input is accepted
    let config = match Config::new(
        cli.google_api_key,
        cli.serper_api_key,
        cli.decision,
        generation,
    ) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            eprintln!("Configuration error: {}", e);
            return ExitCode::from(2);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli.command, config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:?}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: Config) -> Result<()> {
    info!("Gamkers starting with command: {:?}", command);
    let orchestrator = Arc::new(config.build_orchestrator());

    match command {
        Commands::Serve { port } => {
            info!("Starting Gamkers web UI on port {}...", port);
            let mut web_server_handle = tokio::spawn({
                let orchestrator = orchestrator.clone();
                async move { web_server::start_web_server(port, orchestrator).await }
            });

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Ctrl-C received, initiating shutdown...");
                    web_server_handle.abort();
                }
                res = &mut web_server_handle => {
                    match res {
                        Ok(Ok(())) => info!("Web server task completed unexpectedly."),
                        Ok(Err(e)) => return Err(e),
                        Err(e) if e.is_panic() => error!("Web server task panicked: {:?}", e),
                        Err(e) => error!("Web server task failed: {:?}", e),
                    }
                }
            }
            info!("Shutdown complete.");
        }
        Commands::Chat => {
            let stdin = std::io::stdin();
            chat::run_chat(&orchestrator, stdin.lock(), std::io::stdout())
                .await
                .context("Chat session failed")?;
        }
        Commands::Ask { prompt } => {
            let mut log = ConversationLog::new();
            let outcome = orchestrator.exchange(&mut log, &prompt).await;
            println!("{}", chat::render_outcome(&outcome));
            if outcome.reply().is_none() {
                anyhow::bail!("No answer was produced");
            }
        }
    }

    Ok(())
}
