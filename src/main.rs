use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::SqlitePool;

mod aggregate;
mod catalog;
mod charts;
mod config;
mod db;
mod error;
mod flows;
mod models;
mod report;
mod scoring;

use crate::catalog::QUESTIONS;
use crate::charts::file_stem;
use crate::config::Config;
use crate::error::FlowError;
use crate::flows::{Answer, ObservationView};
use crate::report::ReportFormat;

#[derive(Parser)]
#[command(name = "preschool-observations", version)]
#[command(about = "Record classroom observations and chart student and class skill profiles", long_about = None)]
struct Cli {
    /// SQLite database URL (defaults to $DATABASE_URL or sqlite://preschool_data.db)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Directory for rendered SVG charts (defaults to $CHART_DIR or ./charts)
    #[arg(long, global = true)]
    chart_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Print the ten questions and their answers
    Questions,
    /// Record a new observation and chart it
    Record {
        #[arg(long)]
        student: String,
        /// KEY=LABEL, e.g. q2="Usually waits"; unanswered questions take the best label
        #[arg(long = "answer")]
        answers: Vec<Answer>,
    },
    /// List every student with observations
    Students,
    /// List a student's observations, newest first
    History {
        #[arg(long)]
        student: String,
    },
    /// Chart a stored observation
    Show {
        #[arg(long)]
        id: i64,
    },
    /// Change answers on a stored observation
    Edit {
        #[arg(long)]
        id: i64,
        #[arg(long = "answer")]
        answers: Vec<Answer>,
    },
    /// Delete an observation
    Delete {
        #[arg(long)]
        id: i64,
    },
    /// Chart class averages across every observation
    Class {
        /// Print the class view as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Write a class report
    Report {
        #[arg(long, value_enum, default_value_t = ReportFormat::Markdown)]
        format: ReportFormat,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Load demo observations into an empty database
    Seed,
    /// Import observations from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Export every observation to a CSV file
    Export {
        #[arg(long)]
        csv: PathBuf,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("preschool_observations=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_env()?.with_overrides(cli.database_url, cli.chart_dir);

    if let Commands::Questions = cli.command {
        print_questions();
        return Ok(());
    }

    let pool = db::connect(&config).await?;
    db::init_db(&pool)
        .await
        .context("failed to prepare the observations table")?;

    let result = dispatch(&pool, &config, cli.command).await;
    pool.close().await;
    result
}

async fn dispatch(pool: &SqlitePool, config: &Config, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::InitDb => {
            println!("Schema ready.");
        }
        Commands::Questions => print_questions(),
        Commands::Record { student, answers } => {
            let view = flows::record(pool, &student, &answers).await?;
            println!(
                "Observation for {} saved (ID: {}).",
                view.observation.student_name, view.observation.id
            );
            print_view(config, &view)?;
        }
        Commands::Students => {
            let students = flows::students(pool).await?;
            if students.is_empty() {
                println!("No observations yet. Record one first.");
            }
            for name in students {
                println!("{name}");
            }
        }
        Commands::History { student } => {
            let history = flows::history(pool, &student).await?;
            if history.is_empty() {
                println!("No observations for {student}.");
            }
            for observation in history {
                println!("{}", observation.display_label());
            }
        }
        Commands::Show { id } => {
            let view = flows::show(pool, id).await?;
            println!(
                "Observation {} for {} ({})",
                id,
                view.observation.student_name,
                view.observation.timestamp.format("%Y-%m-%d %H:%M")
            );
            print_view(config, &view)?;
        }
        Commands::Edit { id, answers } => {
            let view = flows::edit(pool, id, &answers).await?;
            println!("Record ID {id} updated.");
            print_view(config, &view)?;
        }
        Commands::Delete { id } => {
            let outcome = flows::delete(pool, id).await?;
            println!(
                "Record ID {id} for {} deleted.",
                outcome.deleted.student_name
            );
            if outcome.remaining_history.is_empty() {
                println!("No observations left for {}.", outcome.deleted.student_name);
            } else {
                println!("Remaining observations:");
                for observation in &outcome.remaining_history {
                    println!("  {}", observation.display_label());
                }
            }
        }
        Commands::Class { json } => {
            let view = match flows::class_view(pool).await {
                Err(e) if matches!(e.downcast_ref::<FlowError>(), Some(FlowError::NoData)) => {
                    println!("No observations yet. Record one first.");
                    return Ok(());
                }
                other => other?,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
                return Ok(());
            }

            println!(
                "Class average across {} observations from {} students:",
                view.observation_count,
                view.students.len()
            );
            print_bars(&view.charts);
            if view.unrecognized > 0 {
                println!(
                    "Warning: {} ratings use labels outside the catalog and were scored 0.",
                    view.unrecognized
                );
            }
            let (radar, bar) = view.charts.write_svgs(&config.chart_dir, "class")?;
            println!("Charts written to {} and {}.", radar.display(), bar.display());
        }
        Commands::Report { format, out } => {
            let observations = db::list_all(pool).await?;
            let now = chrono::Utc::now().naive_utc();
            let body = match format {
                ReportFormat::Markdown => report::build_report(&observations, now),
                ReportFormat::Html => report::build_html(&observations, now),
            };
            std::fs::write(&out, body)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Seed => {
            let inserted = db::seed(pool).await?;
            println!("Seed data inserted ({inserted} observations).");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(pool, &csv).await?;
            println!("Inserted {inserted} observations from {}.", csv.display());
        }
        Commands::Export { csv } => {
            let written = db::export_csv(pool, &csv).await?;
            println!("Exported {written} observations to {}.", csv.display());
        }
    }

    Ok(())
}

fn print_questions() {
    for question in QUESTIONS.iter() {
        println!("{} ({})", question.key, question.category);
        println!("  {}", question.prompt);
        for label in question.labels {
            println!("  {} = {}", scoring::score_label(label), label);
        }
    }
}

fn print_bars(charts: &charts::ChartSet) {
    for bar in &charts.bar.bars {
        println!("  {:<14} {:>4}  {:.2}", bar.category, bar.label, bar.score);
    }
}

fn print_view(config: &Config, view: &ObservationView) -> anyhow::Result<()> {
    print_bars(&view.charts);
    let stem = format!(
        "{}-{}",
        file_stem(&view.observation.student_name),
        view.observation.id
    );
    let (radar, bar) = view.charts.write_svgs(&config.chart_dir, &stem)?;
    println!("Charts written to {} and {}.", radar.display(), bar.display());
    Ok(())
}
