//! chathrd - Main CLI Entry Point

use anyhow::{Context, Result};
use chathrd::cli::{Args, Commands, Verbosity};
use chathrd::doctor::{self, Doctor, HealthStatus};
use chathrd::retrieval::lexical::{build_from_store, Bm25Params};
use chathrd::retrieval::{OllamaEmbedder, QdrantStore};
use chathrd::telemetry::format_summary;
use chathrd::{Config, PipelineBuilder, PipelineOrchestrator, PipelineResult};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbosity());

    let config = load_config(&args)?;

    match &args.command {
        Commands::Ask {
            query,
            timeout,
            json,
        } => {
            ask(&args, config, query, timeout.map(Duration::from_secs), *json).await?;
        }
        Commands::Chat => {
            chat(&args, config).await?;
        }
        Commands::Doctor => {
            run_doctor(config).await?;
        }
        Commands::BuildLexical { output } => {
            build_lexical(&config, output.clone()).await?;
        }
        Commands::Config => {
            show_config(&args, &config)?;
        }
    }

    Ok(())
}

fn init_tracing(verbosity: Verbosity) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = Config::load(args.config.clone()).context("Failed to load configuration")?;
    if let Some(model) = &args.model {
        config.llm.model = model.clone();
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn spinner(verbosity: Verbosity, message: &str) -> Option<ProgressBar> {
    if !verbosity.show_progress() {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

async fn answer(
    orchestrator: &PipelineOrchestrator,
    query: &str,
    deadline: Option<Duration>,
) -> chathrd::Result<PipelineResult> {
    match deadline {
        Some(deadline) => orchestrator.process_with_timeout(query, deadline).await,
        None => orchestrator.process(query).await,
    }
}

async fn ask(args: &Args, config: Config, query: &str, deadline: Option<Duration>, json: bool) -> Result<()> {
    let verbosity = args.verbosity();
    let orchestrator = PipelineBuilder::from_config(config)
        .await
        .context("Failed to initialize pipeline")?;

    let pb = spinner(verbosity, "Ищу ответ...");
    let result = answer(&orchestrator, query, deadline).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let result = result.context("Failed to answer query")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result.answer);
    }

    if verbosity.show_stats() {
        eprintln!("\n{}", format_summary(orchestrator.telemetry()).dimmed());
    }

    Ok(())
}

async fn chat(args: &Args, config: Config) -> Result<()> {
    let verbosity = args.verbosity();
    let model = config.llm.model.clone();
    let orchestrator = PipelineBuilder::from_config(config)
        .await
        .context("Failed to initialize pipeline")?;

    let history_path = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".chathrd")
        .join("history");

    let mut editor = DefaultEditor::new()?;
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
    }

    println!("{} {}", "chathrd".bold().cyan(), format!("({})", model).dimmed());
    println!("{}", "Type /stats for session statistics, /exit to quit.".dimmed());

    loop {
        let line = match editor.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("\nUse /exit to quit gracefully");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(input);

        match input {
            "/exit" | "/quit" => break,
            "/stats" => {
                println!("{}", format_summary(orchestrator.telemetry()));
                continue;
            }
            _ => {}
        }

        let pb = spinner(verbosity, "Ищу ответ...");
        let result = orchestrator.process(input).await;
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        match result {
            Ok(result) => {
                println!("{}", result.answer);
                if verbosity.show_stats() {
                    println!("{}", format!("[{}]", result.branch).dimmed());
                }
            }
            Err(e) => {
                eprintln!("{}: {}", "Error".red().bold(), e);
            }
        }
    }

    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    editor.save_history(&history_path)?;

    Ok(())
}

async fn run_doctor(config: Config) -> Result<()> {
    println!("\n{}\n", "chathrd diagnostics".bold());

    let checks = Doctor::new(config).run_diagnostics().await;
    for check in &checks {
        match &check.status {
            HealthStatus::Pass => println!("  {} {}", "✓".green(), check.name),
            HealthStatus::Warn(msg) => println!("  {} {}: {}", "⚠".yellow(), check.name, msg),
            HealthStatus::Fail(msg) => println!("  {} {}: {}", "✗".red(), check.name, msg),
        }
    }
    println!();

    std::process::exit(if doctor::is_healthy(&checks) { 0 } else { 1 });
}

async fn build_lexical(config: &Config, output: Option<PathBuf>) -> Result<()> {
    let path = output.unwrap_or_else(|| config.lexical_index_path());

    let embedder = Arc::new(OllamaEmbedder::from_config(&config.llm, &config.embedding)?);
    let store = QdrantStore::connect(&config.index.qdrant_url, &config.index.collection, embedder)
        .context("Failed to connect to the vector store")?;

    let count = build_from_store(&store, &path, Bm25Params::default())
        .await
        .context("Failed to build lexical index")?;

    println!("{} Indexed {} documents into {}", "✓".green(), count, path.display());
    Ok(())
}

fn show_config(args: &Args, config: &Config) -> Result<()> {
    let source = args
        .config
        .clone()
        .or_else(Config::default_path)
        .filter(|path| path.exists())
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "built-in defaults".to_string());

    println!("# {}", source);
    println!("{}", toml::to_string_pretty(config).context("Failed to render configuration")?);
    Ok(())
}
