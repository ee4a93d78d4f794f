//! Seasonlens CLI
//!
//! Command-line interface for the overlay engine:
//! - Process a CSV file into series catalogs
//! - Inspect a CSV file's columns
//! - Generate a default config file

use anyhow::Context;
use clap::{Parser, Subcommand};
use seasonlens::config::{generate_default_config, Config};
use seasonlens::frame::{self, export, CsvImporter, RawFrame};
use seasonlens::pipeline::{available_years, Pipeline, Predicate, ProcessOptions};
use seasonlens::telemetry::init_logging;
use seasonlens::SeasonalMode;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "seasonlens")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Seasonal and intraday overlays for tabular time-series data")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// CSV field delimiter
    #[arg(long, default_value = ",", global = true)]
    pub delimiter: char,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Process a CSV file and write the catalogs as JSON
    Process {
        /// Path to CSV file
        path: PathBuf,
        /// Date column (default: first date-like column)
        #[arg(short, long)]
        date_column: Option<String>,
        /// Time column to merge into the date ("none" to skip)
        #[arg(short, long)]
        time_column: Option<String>,
        /// Keep the time column separate
        #[arg(long)]
        no_merge: bool,
        /// Rewrite 24:00 to 23:59:59 before merging
        #[arg(long)]
        handle_24hour: bool,
        /// Field to analyse (default: first numeric column)
        #[arg(short, long)]
        field: Option<String>,
        /// Resampling granularity (raw, 15min, hourly, daily, weekly, monthly)
        #[arg(short, long, default_value = "raw")]
        granularity: String,
        /// Bucket reducer (mean, sum, last, max, min)
        #[arg(short, long, default_value = "mean")]
        reducer: String,
        /// Seasonal grouping (monthly, daily)
        #[arg(short, long, default_value = "monthly")]
        seasonal_mode: SeasonalMode,
        /// Forward fill missing values of the field
        #[arg(long)]
        forward_fill: bool,
        /// Years to keep (comma-separated)
        #[arg(long, value_delimiter = ',')]
        years: Vec<i32>,
        /// Months to keep, 1-12 (comma-separated)
        #[arg(long, value_delimiter = ',')]
        months: Vec<u32>,
        /// Value filter, e.g. "flow >= 2.5"
        #[arg(long)]
        filter: Option<String>,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also write the processed frame as CSV
        #[arg(long)]
        export_csv: Option<PathBuf>,
    },

    /// Show columns, suggested defaults and summary statistics
    Inspect {
        /// Path to CSV file
        path: PathBuf,
        /// Date column used to list available years
        #[arg(short, long)]
        date_column: Option<String>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    init_logging(&config.logging);

    match cli.command {
        Commands::Process {
            path,
            date_column,
            time_column,
            no_merge,
            handle_24hour,
            field,
            granularity,
            reducer,
            seasonal_mode,
            forward_fill,
            years,
            months,
            filter,
            output,
            export_csv,
        } => {
            let raw = load_csv(&path, cli.delimiter)?;
            let defaults = frame::default_selection(&raw);

            let date_column = date_column
                .or(defaults.date_column)
                .context("No date column given and none detected")?;
            let field = field
                .or(defaults.field)
                .context("No field given and no numeric column detected")?;

            let mut options = ProcessOptions::new(date_column, field)
                .with_granularity(granularity)
                .with_reducer(reducer)
                .with_seasonal_mode(seasonal_mode)
                .with_forward_fill(forward_fill)
                .with_years(years)
                .with_months(months);
            if let Some(time_column) = time_column {
                options = options.with_time_column(time_column, handle_24hour);
                options.merge_datetime = !no_merge;
            }
            if let Some(expr) = filter {
                let predicate = Predicate::parse_expr(&expr)
                    .with_context(|| format!("Invalid filter expression: {}", expr))?;
                options = options.with_filter(predicate);
            }

            let pipeline = Pipeline::new(config.engine);
            let result = match pipeline.process(&raw, &options) {
                Ok(result) => result,
                Err(e) if e.is_no_match() => {
                    eprintln!("No rows matched: {}", e);
                    std::process::exit(2);
                }
                Err(e) => return Err(e.into()),
            };

            let json = serde_json::to_string_pretty(&result)?;
            match output {
                Some(out_path) => {
                    std::fs::write(&out_path, json)?;
                    println!("Wrote catalogs to {:?}", out_path);
                }
                None => println!("{}", json),
            }

            if let Some(csv_path) = export_csv {
                std::fs::write(&csv_path, export::to_csv(&result.frame)?)?;
                eprintln!("Wrote {} rows to {:?}", result.frame.len(), csv_path);
            }
        }

        Commands::Inspect { path, date_column } => {
            let raw = load_csv(&path, cli.delimiter)?;
            print_inspection(&raw, date_column.as_deref());
        }

        Commands::Config { output } => {
            let config = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    println!("{}", config);
                }
            }
        }
    }

    Ok(())
}

fn load_csv(path: &Path, delimiter: char) -> anyhow::Result<RawFrame> {
    let delimiter = u8::try_from(delimiter).context("Delimiter must be a single-byte character")?;
    let result = CsvImporter::new()
        .with_delimiter(delimiter)
        .import(path)
        .with_context(|| format!("Failed to read {:?}", path))?;

    if result.rows_failed > 0 {
        tracing::warn!(
            failed = result.rows_failed,
            processed = result.rows_processed,
            "Some CSV rows could not be read"
        );
        for error in result.errors.iter().take(10) {
            tracing::warn!("{}", error);
        }
    }

    Ok(result.frame)
}

fn print_inspection(raw: &RawFrame, date_column: Option<&str>) {
    println!("Rows: {}", raw.len());
    println!();
    println!("{:<24} {}", "Column", "Type");
    println!("{}", "-".repeat(34));
    for column in &raw.columns {
        let kind = raw
            .column_kind(column)
            .map(|k| k.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{:<24} {}", column, kind);
    }

    let defaults = frame::default_selection(raw);
    println!();
    println!("Date-like columns: {}", frame::date_like_columns(raw).join(", "));
    println!("Numeric columns:   {}", frame::numeric_columns(raw).join(", "));
    println!(
        "Suggested: date = {}, field = {}",
        defaults.date_column.as_deref().unwrap_or("-"),
        defaults.field.as_deref().unwrap_or("-")
    );

    if let Some(date_column) = date_column.or(defaults.date_column.as_deref()) {
        match available_years(raw, date_column) {
            Ok(years) => {
                let years: Vec<String> = years.iter().map(|y| y.to_string()).collect();
                println!("Years in '{}': {}", date_column, years.join(", "));
            }
            Err(e) => println!("Years: {}", e),
        }
    }

    let summaries = frame::describe(raw);
    if summaries.is_empty() {
        return;
    }

    println!();
    println!(
        "{:<20} {:>8} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "Column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
    );
    println!("{}", "-".repeat(108));
    for s in summaries {
        println!(
            "{:<20} {:>8} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
            s.column,
            s.count,
            fmt_stat(s.mean),
            fmt_stat(s.std),
            fmt_stat(s.min),
            fmt_stat(s.q25),
            fmt_stat(s.median),
            fmt_stat(s.q75),
            fmt_stat(s.max)
        );
    }
}

fn fmt_stat(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.3}", v))
        .unwrap_or_else(|| "-".to_string())
}
