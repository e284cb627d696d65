mod enricher;
mod formatting;
mod grading;
mod loader;
mod models;
mod report;
mod subjects;

use anyhow::{Context, Result};
use clap::{Arg, Command};
use enricher::ReportCardEnricher;
use loader::TableLoader;
use models::{Config, OutputFormat};
use std::fs;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let matches = Command::new("result-cards")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Normalizes student records and produces report card data")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("CSV")
                .help("Student sheet to read, overrides input_file"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .help("Output directory, overrides output_directory"),
        )
        .get_matches();

    let config_file = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("config.toml");

    // Load or create configuration
    let mut config = if Path::new(config_file).exists() {
        println!("📋 Loading configuration from: {}", config_file);
        Config::load_from_file(config_file)
            .with_context(|| format!("Failed to load configuration from {}", config_file))?
    } else {
        println!("📝 Creating default configuration file: {}", config_file);
        Config::default().save_to_file(config_file)?;
        println!("⚠️  Please review {} (input file and column names), then run the program again.", config_file);
        return Ok(());
    };

    if let Some(input) = matches.get_one::<String>("input") {
        config.input_file = input.clone();
    }
    if let Some(output) = matches.get_one::<String>("output") {
        config.output_directory = Some(output.clone());
    }

    init_logging(&config);

    let output_dir = config.output_directory.as_deref().unwrap_or("output");
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir))?;
    report::clean_output_directory(output_dir)?;

    println!("📂 Reading student sheet: {}", config.input_file);
    println!("📄 Output directory: {}", output_dir);

    let loader = TableLoader::new(config.columns.clone());
    let records = loader
        .load_file(&config.input_file)
        .with_context(|| format!("Failed to load {}", config.input_file))?;

    if records.is_empty() {
        println!("❌ No student rows found in {}", config.input_file);
        return Ok(());
    }
    info!("Loaded {} student records", records.len());

    let enricher = ReportCardEnricher::new(config.day_first);
    let outcome = enricher.enrich_table(&records);

    for diagnostic in &outcome.diagnostics {
        warn!("{}", diagnostic);
    }

    for format in &config.output_formats {
        match format {
            OutputFormat::Csv => report::write_cards_csv(&outcome.cards, output_dir)?,
            OutputFormat::Json => report::write_cards_json(&outcome.cards, output_dir)?,
        }
    }
    report::write_diagnostics_csv(&outcome.diagnostics, output_dir)?;
    report::write_class_summary(&outcome, output_dir)?;

    report::print_summary(&outcome);

    println!("\n✅ Report card data generated for {} students!", outcome.cards.len());
    println!("📂 Results: {}", output_dir);
    Ok(())
}

fn init_logging(config: &Config) {
    let default_level = config.log_level.as_deref().unwrap_or("info");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}
