use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

mod aggregate;
mod cache;
mod config;
mod error;
mod export;
mod insights;
mod models;
mod normalize;
mod predict;
mod report;
mod session;
mod table;

use aggregate::{Selector, DEFAULT_TOP_N};
use config::{Config, ConfigArgs, DatasetSource};
use predict::{Plan, PredictionInput};

#[derive(Parser)]
#[command(name = "churn-insights")]
#[command(about = "Telecom customer churn analysis and prediction", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,
    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

fn parse_top_n(raw: &str) -> Result<usize, String> {
    session::parse_top_n(raw)
}

#[derive(Subcommand)]
enum Commands {
    /// Show partition shapes, a preview and feature definitions
    Info {
        #[arg(long, default_value_t = 5)]
        preview_rows: usize,
    },
    /// Run one analysis and print it
    Analyze {
        /// Analysis id, menu number or title
        analysis: Selector,
        #[arg(long, default_value_t = DEFAULT_TOP_N, value_parser = parse_top_n)]
        top_n: usize,
        /// Write the result as CSV to this file or directory (`-` for stdout only)
        #[arg(long = "export")]
        export_to: Option<PathBuf>,
        /// Print the result as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List the available analyses
    List,
    /// Generate a markdown report of every analysis
    Report {
        #[arg(long, default_value_t = DEFAULT_TOP_N, value_parser = parse_top_n)]
        top_n: usize,
        #[arg(long, default_value = "churn_report.md")]
        out: PathBuf,
    },
    /// Explore analyses interactively
    Explore {
        #[arg(long, default_value_t = DEFAULT_TOP_N, value_parser = parse_top_n)]
        top_n: usize,
    },
    /// Predict churn for a single customer
    Predict {
        #[arg(long, value_enum, default_value_t = Plan::No)]
        international_plan: Plan,
        #[arg(long, value_enum, default_value_t = Plan::No)]
        voice_mail_plan: Plan,
        #[arg(long, default_value_t = 120)]
        account_length: u32,
        #[arg(long, default_value_t = 10)]
        number_vmail_messages: u32,
        #[arg(long, default_value_t = 30.56)]
        total_day_charge: f64,
        #[arg(long, default_value_t = 17.08)]
        total_eve_charge: f64,
        #[arg(long, default_value_t = 9.04)]
        total_night_charge: f64,
        #[arg(long, default_value_t = 10.0)]
        total_intl_minutes: f64,
        #[arg(long, default_value_t = 4)]
        total_intl_calls: u32,
        #[arg(long, default_value_t = 2.76)]
        total_intl_charge: f64,
        #[arg(long, default_value_t = 1)]
        customer_service_calls: u32,
    },
}

fn init_logging(level: &str, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn source_label(source: &DatasetSource) -> String {
    match source {
        DatasetSource::Partitions { train, test } => {
            format!("{} + {}", train.display(), test.display())
        }
        DatasetSource::Upload(path) => path.display().to_string(),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.quiet);
    let config = Config::from(cli.config);

    match cli.command {
        Commands::Info { preview_rows } => {
            let partitions = config
                .source
                .load_partitions()
                .context("failed to load dataset")?;
            print!("{}", report::render_info(&partitions, preview_rows));
        }
        Commands::List => {
            println!("{}", session::list_text());
        }
        Commands::Analyze {
            analysis,
            top_n,
            export_to,
            json,
        } => {
            let canonical = config
                .source
                .load_canonical()
                .context("failed to prepare dataset")?;
            let result = match aggregate::aggregate(&canonical, analysis, Some(top_n)) {
                Ok(result) => result,
                Err(err) if err.is_missing_column() => {
                    warn!(error = %err, "analysis unavailable");
                    println!("Warning: {err}");
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
            };

            let csv_to_stdout = export_to
                .as_deref()
                .is_some_and(|path| path.as_os_str() == "-");
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else if !csv_to_stdout {
                print!("{}", report::render_analysis(analysis, &result));
            }

            match export_to {
                Some(_) if csv_to_stdout => print!("{}", export::to_csv_string(&result)?),
                Some(path) => {
                    let path = if path.is_dir() {
                        path.join(export::default_file_name(&result))
                    } else {
                        path
                    };
                    export::export_to_path(&result, &path)
                        .with_context(|| format!("failed to export to {}", path.display()))?;
                    println!("Exported {} rows to {}.", result.len(), path.display());
                }
                None => {}
            }
        }
        Commands::Report { top_n, out } => {
            let canonical = config
                .source
                .load_canonical()
                .context("failed to prepare dataset")?;
            let report = report::build_report(
                &canonical,
                &source_label(&config.source),
                Utc::now(),
                top_n,
            );
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Explore { top_n } => {
            info!(ttl_secs = config.cache_ttl.num_seconds(), "starting session");
            session::run(session::Session::new(config.source, config.cache_ttl, top_n))?;
        }
        Commands::Predict {
            international_plan,
            voice_mail_plan,
            account_length,
            number_vmail_messages,
            total_day_charge,
            total_eve_charge,
            total_night_charge,
            total_intl_minutes,
            total_intl_calls,
            total_intl_charge,
            customer_service_calls,
        } => {
            let input = PredictionInput {
                account_length,
                international_plan,
                voice_mail_plan,
                number_vmail_messages,
                total_day_charge,
                total_eve_charge,
                total_night_charge,
                total_intl_minutes,
                total_intl_calls,
                total_intl_charge,
                customer_service_calls,
            };
            let model = predict::LogisticModel::from_path(&config.model_path).with_context(|| {
                format!(
                    "failed to load classifier from {}",
                    config.model_path.display()
                )
            })?;
            let verdict = predict::predict_churn(&model, &input)?;
            print!("{}", report::render_verdict(&verdict));
        }
    }

    Ok(())
}
