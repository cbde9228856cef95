pub mod catalog;
pub mod cli;
pub mod conflict;
pub mod error;
pub mod ical;
pub mod models;
pub mod planner;
pub mod settings;
pub mod solver;
pub mod time;
pub mod validation;

use clap::Parser;
use tracing::info;

use crate::cli::{Cli, Commands, ConflictsReport, SolveReport};
use crate::ical::ICalExporter;
use crate::planner::Planner;
use crate::settings::Settings;

pub use crate::conflict::{OverlapChecker, has_conflict};
pub use crate::error::PlanError;
pub use crate::models::{CourseRequestGroup, MeetingBlock, Schedule, Section, Weekday};
pub use crate::solver::{Solver, solve};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut settings = Settings::from_env()?;
    cli.apply(&mut settings);

    let env_filter = if settings.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let planner = Planner::load(&settings).await?;

    let output = execute(cli.command, &planner, &settings).await?;
    println!("{output}");
    Ok(())
}

/// Runs one command against a loaded catalog and renders the JSON answer.
pub async fn execute(
    command: Commands,
    planner: &Planner,
    settings: &Settings,
) -> Result<String, Box<dyn std::error::Error>> {
    match command {
        Commands::Solve { codes, ical, .. } => {
            let schedule = planner.plan(codes.as_slice())?;
            if let (Some(path), Some(found)) = (ical, &schedule) {
                let term = settings
                    .term()
                    .ok_or("APP_TERM_START and APP_TERM_END must be set to export a calendar")?;
                let exporter = ICalExporter::new(term)?;
                tokio::fs::write(&path, exporter.generate(found)).await?;
                info!(path = %path.display(), "schedule exported");
            }
            Ok(serde_json::to_string_pretty(&SolveReport::from(schedule.as_ref()))?)
        }
        Commands::Conflicts { class_nums } => {
            let conflicts = planner.conflicts(&class_nums)?;
            Ok(serde_json::to_string_pretty(&ConflictsReport {
                conflict_count: conflicts.len(),
                conflicts: &conflicts,
            })?)
        }
    }
}
