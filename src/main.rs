//! # Citation Validation Pipeline Driver
//!
//! ## Purpose
//! Main entry point for the citation validation pipeline. Loads the rule
//! corpus and footnote input, runs the concurrent validation run, and writes
//! the per-citation report for the surrounding tooling to consume.
//!
//! ## Input/Output Specification
//! - **Input**: Configuration file, footnotes JSON (array of number + text)
//! - **Output**: Validation report JSON; non-zero exit on fatal startup errors
//!
//! ## Architecture Flow
//! 1. Parse command line arguments and load configuration
//! 2. Initialize logging and tracing
//! 3. Load the rule corpus (fatal if malformed)
//! 4. Read footnotes and run the orchestrator
//! 5. Write the report

use anyhow::Context;
use clap::{Arg, Command};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use citecheck::{
    config::Config, corpus::RuleCorpus, orchestrator::Orchestrator, Footnote, ValidationReport,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = Command::new("citecheck")
        .version("0.1.0")
        .author("Legal Review Team")
        .about("Citation parsing and concurrent validation pipeline for legal footnotes")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("citecheck.toml"),
        )
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("FILE")
                .help("Footnotes JSON file")
                .required_unless_present("check-corpus"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Report output path (stdout if omitted)"),
        )
        .arg(
            Arg::new("workers")
                .short('w')
                .long("workers")
                .value_name("N")
                .help("Worker pool size override")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("check-corpus")
                .long("check-corpus")
                .help("Load and validate the rule corpus, then exit")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config").unwrap();
    let mut config = Config::from_file(config_path).context("failed to load configuration")?;

    if let Some(workers) = matches.get_one::<usize>("workers") {
        config.orchestrator.worker_count = *workers;
    }

    let config = Arc::new(config);
    init_logging(&config)?;

    info!("Starting citecheck v0.1.0");
    info!("Configuration loaded from: {}", config_path);

    let corpus = Arc::new(
        RuleCorpus::load(&config.corpus.corpus_path).context("failed to load rule corpus")?,
    );
    let (primary_rules, general_rules) = corpus.tier_sizes();
    info!(primary_rules, general_rules, "Rule corpus ready");

    if matches.get_flag("check-corpus") {
        println!(
            "Corpus OK: {} primary rules, {} general rules",
            primary_rules, general_rules
        );
        return Ok(());
    }

    let input_path = PathBuf::from(matches.get_one::<String>("input").unwrap());
    let footnotes = read_footnotes(&input_path)?;
    info!(footnotes = footnotes.len(), "Footnotes loaded from {:?}", input_path);

    let orchestrator =
        Orchestrator::new(config.clone(), corpus).context("failed to initialize pipeline")?;
    let timer = citecheck::utils::Timer::new("validation-run");
    let report = orchestrator.run(footnotes).await?;
    timer.stop();

    write_report(&report, matches.get_one::<String>("output"))?;

    info!(
        spans = report.stats.total_spans,
        manual_review = report.stats.manual_review,
        "Done"
    );
    Ok(())
}

/// Initialize logging and tracing
fn init_logging(config: &Arc<Config>) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.logging.level.clone()));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_level(true);

    if config.logging.json_format {
        tracing_subscriber::registry()
            .with(fmt_layer.json().with_filter(filter))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt_layer.with_filter(filter))
            .init();
    }

    Ok(())
}

/// Read the footnote input file
fn read_footnotes(path: &PathBuf) -> anyhow::Result<Vec<Footnote>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read footnotes from {:?}", path))?;
    let footnotes: Vec<Footnote> =
        serde_json::from_str(&content).context("footnotes file is not valid JSON")?;
    Ok(footnotes)
}

/// Write the report to a file or stdout
fn write_report(report: &ValidationReport, output: Option<&String>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    match output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("failed to write {}", path))?;
            info!("Report written to {}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}
