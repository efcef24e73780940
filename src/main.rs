// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use nodeflow::app::{agent_flow, batch_flow, keys, qa_flow, Mode};
use nodeflow::backends::{GeminiClient, JsonFileSink, TavilySearch};
use nodeflow::config::{resolve_config, validate_config, AppConfig};
use nodeflow::engine::RunContext;
use nodeflow::observability::messages::session::SessionStarted;
use nodeflow::observability::messages::StructuredLog;
use nodeflow::session::{read_input, render_answer, Input, Session, INPUT_HINT};
use nodeflow::store::SharedStore;
use nodeflow::traits::{TextCompleter, WebSearcher};

/// Ask questions of a language model from the terminal.
#[derive(Parser, Debug)]
#[command(name = "nodeflow", version, about)]
struct Cli {
    /// Flow to run for each question
    #[arg(long, value_enum, default_value_t = Mode::Qa)]
    mode: Mode,

    /// Model name, overriding the config file
    #[arg(long)]
    model: Option<String>,

    /// Comma-separated image paths attached to every question
    #[arg(long, value_delimiter = ',')]
    images: Vec<PathBuf>,

    /// YAML config file (defaults to ./nodeflow.yaml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = resolve_config(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(model) = cli.model {
        config.model.name = model;
    }
    validate_config(&config).map_err(|problems| anyhow!("Invalid configuration: {}", problems.join("; ")))?;

    let token = CancellationToken::new();
    let listener = token.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        listener.cancel();
    });
    let ctx = RunContext::with_token(token);

    match cli.mode {
        Mode::Batch => run_batch(&ctx, &config).await,
        mode => run_interactive(mode, &ctx, &config, cli.images).await,
    }
}

async fn run_batch(ctx: &RunContext, config: &AppConfig) -> Result<()> {
    let flow = batch_flow(config)?;
    let store = SharedStore::new();
    let report = flow.run(ctx, &store).await.context("Batch flow failed")?;

    println!("{}", store.require::<String>(keys::FINAL_RESULTS)?);
    println!("Completed {} steps in {:?}", report.steps(), report.duration);
    Ok(())
}

async fn run_interactive(
    mode: Mode,
    ctx: &RunContext,
    config: &AppConfig,
    images: Vec<PathBuf>,
) -> Result<()> {
    let completer: Arc<dyn TextCompleter> = Arc::new(GeminiClient::from_env()?);
    let flow = match mode {
        Mode::Agent => {
            let searcher: Arc<dyn WebSearcher> =
                Arc::new(TavilySearch::from_env(config.search.clone())?);
            agent_flow(completer, searcher, config)?
        }
        _ => qa_flow(completer, config)?,
    };

    SessionStarted {
        mode: mode.as_str(),
        model: &config.model.name,
        image_count: images.len(),
    }
    .log();

    let sink = Arc::new(JsonFileSink::new(config.session.conversation_dir.clone()));
    let mut session = Session::new(flow, sink).with_images(images);

    loop {
        print!("\nYou: ");
        println!("{}", INPUT_HINT);
        io::stdout().flush()?;

        let input = tokio::select! {
            _ = ctx.token().cancelled() => break,
            input = tokio::task::spawn_blocking(|| read_input(&mut io::stdin().lock())) => input??,
        };

        let question = match input {
            Input::Question(question) => question,
            Input::Blank => continue,
            Input::Quit | Input::Closed => break,
        };

        match session.ask(ctx, &question).await {
            Ok(answer) => {
                println!("\nAI:");
                render_answer(&config.session.renderer, &answer);
            }
            Err(error) if ctx.is_cancelled() => {
                tracing::debug!(error = %error, "Turn interrupted by shutdown");
                break;
            }
            Err(error) => eprintln!("Error: {}. Please try again.", error),
        }
    }

    match session.persist_history() {
        Ok(Some(path)) => println!("\nConversation saved to {}", path.display()),
        Ok(None) => {}
        Err(error) => eprintln!("Failed to save conversation: {}", error),
    }

    // A blocked stdin read would otherwise hold the runtime open.
    if ctx.is_cancelled() {
        std::process::exit(0);
    }
    Ok(())
}
