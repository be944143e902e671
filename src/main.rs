use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

mod aging;
mod models;
mod report;
mod source;
mod trends;

use models::{DiagnosisRecord, TrendChart};

#[derive(Parser)]
#[command(name = "skin-trends")]
#[command(about = "Severity trends and skin-age estimates from skincare scan exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate per-concern severity trends into chart series
    Trends {
        /// Diagnosis export (.json or .csv)
        #[arg(long)]
        input: PathBuf,
        /// Restrict to these concern keys (repeatable)
        #[arg(long = "concern")]
        concerns: Vec<String>,
        #[arg(long)]
        since_days: Option<i64>,
        /// Print chart series as JSON
        #[arg(long)]
        json: bool,
    },
    /// Estimate skin age and aging pace
    Aging {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, env = "SKIN_TRENDS_AGE_GROUP")]
        age_group: Option<i32>,
        #[arg(long)]
        since_days: Option<i64>,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, env = "SKIN_TRENDS_AGE_GROUP")]
        age_group: Option<i32>,
        #[arg(long)]
        since_days: Option<i64>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn load(input: &Path, since_days: Option<i64>) -> anyhow::Result<Vec<DiagnosisRecord>> {
    let records = source::load_diagnoses(input)
        .with_context(|| format!("failed to load diagnoses from {}", input.display()))?;
    Ok(match since_days {
        Some(days) => source::within_window(records, days),
        None => records,
    })
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Trends {
            input,
            concerns,
            since_days,
            json,
        } => {
            let records = load(&input, since_days)?;
            let visible = (!concerns.is_empty()).then_some(concerns);
            let concern_trends = trends::concern_trends(&records, visible.as_deref());
            let chart = trends::aggregate(&concern_trends, visible.as_deref());

            if json {
                let summaries = trends::summarize_concerns(&concern_trends);
                let payload = serde_json::json!({ "chart": chart, "summaries": summaries });
                println!("{}", serde_json::to_string_pretty(&payload)?);
                return Ok(());
            }

            match chart {
                TrendChart::NoData => println!("No data for the selected concerns."),
                TrendChart::Ready { labels, series } => {
                    let first = labels.first().and_then(|l| l.label.as_deref()).unwrap_or("?");
                    let last = labels.last().and_then(|l| l.label.as_deref()).unwrap_or("?");
                    println!("{} scan dates ({} to {}):", labels.len(), first, last);
                    for line in series.iter() {
                        let values: Vec<String> =
                            line.points.iter().map(|p| p.value.to_string()).collect();
                        println!("- {} [{}]: {}", line.key, line.color, values.join(" "));
                    }
                }
            }
        }
        Commands::Aging {
            input,
            age_group,
            since_days,
            json,
        } => {
            let records = load(&input, since_days)?;
            let scores = aging::aging_scores(&records);
            let estimate = aging::estimate(age_group, &scores);

            if json {
                println!("{}", serde_json::to_string_pretty(&estimate)?);
            } else {
                println!(
                    "Skin age {:.1}, aging pace {:.2}x ({}) from {} aging scores.",
                    estimate.skin_age,
                    estimate.aging_pace,
                    estimate.pace_label(),
                    scores.len()
                );
            }
        }
        Commands::Report {
            input,
            age_group,
            since_days,
            out,
        } => {
            let records = load(&input, since_days)?;
            let report = report::build_report(age_group, since_days, &records);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
