use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use polaris_rag_core::config::{Config, StorageMode};
use polaris_rag_core::provider::OllamaProvider;
use polaris_rag_core::rag::{Metric, SearchReport, StoreOptions, VectorStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "polaris-rag")]
#[command(about = "CLI for querying a polaris-rag vector store", long_about = None)]
#[command(version)]
struct Cli {
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Show current configuration")]
    Show,

    #[command(about = "Distance metric commands")]
    Metric {
        #[command(subcommand)]
        command: MetricCommands,
    },

    #[command(about = "Index a corpus file and search it")]
    Search {
        #[arg(long, help = "Text file with one document per line")]
        corpus: PathBuf,

        #[arg(short, long, help = "Number of results (defaults to search.top_k)")]
        k: Option<usize>,

        query: String,
    },
}

#[derive(Subcommand)]
enum MetricCommands {
    #[command(about = "Set the distance metric")]
    Set {
        #[arg(help = "One of: cosine, euclidean, dot")]
        metric: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Show => show_config(&cli.config),
        Commands::Metric { command } => match command {
            MetricCommands::Set { metric } => set_metric(&cli.config, &metric),
        },
        Commands::Search { corpus, k, query } => search(&cli.config, &corpus, k, &query).await,
    }
}

fn load_config(config_path: &Path) -> Result<Config> {
    if config_path.exists() {
        Config::load(config_path).context("Failed to load config")
    } else {
        Ok(Config::default())
    }
}

fn show_config(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;

    println!("{}", "Current Configuration:".bold().green());
    println!();
    println!("{}", "Embedding:".bold());
    println!("  Model:     {}", config.embedding.model.cyan());
    println!("  Base URL:  {}", config.embedding.base_url);
    match config.embedding.dimension {
        Some(dimension) => println!("  Dimension: {}", dimension),
        None => println!("  Dimension: {}", "probed".dimmed()),
    }
    println!();
    println!("{}", "Storage:".bold());
    match &config.storage.storage_mode {
        StorageMode::Ephemeral => println!("  Mode:      ephemeral"),
        StorageMode::Durable { path } => println!("  Mode:      durable @ {}", path),
    }
    println!("  Metric:    {}", config.storage.metric.to_string().cyan());
    println!();
    println!("{}", "Search:".bold());
    println!("  Top K:     {}", config.search.top_k);

    Ok(())
}

fn set_metric(config_path: &Path, metric: &str) -> Result<()> {
    let metric: Metric = metric.parse()?;

    let content = std::fs::read_to_string(config_path)
        .context("Failed to read config file")?;

    let mut config: serde_yaml::Value = serde_yaml::from_str(&content)
        .context("Failed to parse config")?;

    let root = config
        .as_mapping_mut()
        .context("Config root must be a mapping")?;
    let storage = match root.get("storage") {
        Some(serde_yaml::Value::Mapping(_)) => None,
        Some(serde_yaml::Value::Null) | None => Some(serde_yaml::Mapping::new()),
        Some(_) => anyhow::bail!("`storage` in {} must be a mapping", config_path.display()),
    };
    if let Some(empty) = storage {
        root.insert(
            serde_yaml::Value::String("storage".to_string()),
            serde_yaml::Value::Mapping(empty),
        );
    }
    let storage_map = root
        .get_mut("storage")
        .and_then(|s| s.as_mapping_mut())
        .context("`storage` must be a mapping")?;
    storage_map.insert(
        serde_yaml::Value::String("metric".to_string()),
        serde_yaml::Value::String(metric.to_string()),
    );

    let updated_content = serde_yaml::to_string(&config)
        .context("Failed to serialize config")?;

    std::fs::write(config_path, updated_content)
        .context("Failed to write config file")?;

    println!(
        "{} Metric updated to: {}",
        "✓".green().bold(),
        metric.to_string().cyan()
    );
    println!(
        "{}",
        "Existing durable collections keep the metric they were created with.".yellow()
    );

    Ok(())
}

async fn search(config_path: &Path, corpus: &Path, k: Option<usize>, query: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let k = k.unwrap_or(config.search.top_k);

    let content = std::fs::read_to_string(corpus)
        .with_context(|| format!("Failed to read corpus {}", corpus.display()))?;
    let texts: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    println!(
        "{} Indexing {} documents with {}...",
        "→".blue(),
        texts.len(),
        config.embedding.model.cyan()
    );

    let embedder = Arc::new(OllamaProvider::new(&config));
    let store = VectorStore::from_texts(texts, embedder, None, StoreOptions::from(&config))
        .await
        .context("Failed to build vector store. Is Ollama running?")?;

    let report = store
        .similarity_search_with_report(query, k)
        .await
        .context("Search failed")?;

    print_report(&report, store.metric());
    Ok(())
}

fn print_report(report: &SearchReport, metric: Metric) {
    println!();
    if report.matches.is_empty() {
        println!("{}", "No matching documents.".yellow());
    } else {
        println!("{} ({} distance, lower is closer)", "Results:".bold().green(), metric);
        println!();
        for (i, (document, score)) in report.matches.iter().enumerate() {
            println!("  {} [{:.4}] {}", format!("{}.", i + 1).cyan(), score, document.content);
        }
    }

    if !report.is_complete() {
        println!();
        println!(
            "{} {} of {} backend hits had no stored document: {:?}",
            "!".yellow().bold(),
            report.dropped.len(),
            report.hits.len(),
            report.dropped
        );
    }
}
