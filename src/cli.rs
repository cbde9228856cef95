use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::catalog::SectionOrder;
use crate::conflict::ConflictReport;
use crate::models::{Schedule, Section};
use crate::settings::Settings;
use crate::solver::GroupOrdering;
use crate::time::{OverlapPolicy, TimeUnit};

#[derive(Debug, Parser)]
#[command(name = "schedugator")]
#[command(about = "Build a conflict-free class schedule from a course catalog snapshot")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Catalog JSON snapshot
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Axis meeting times are compared on
    #[arg(long, value_enum, global = true)]
    pub unit: Option<TimeUnit>,

    /// Whether back-to-back meetings conflict
    #[arg(long, value_enum, global = true)]
    pub policy: Option<OverlapPolicy>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Pick one section per course so that no meetings overlap.
    Solve {
        /// Course codes, e.g. COP3502C MAC2312
        #[arg(required = true)]
        codes: Vec<String>,
        #[arg(long, value_enum)]
        ordering: Option<GroupOrdering>,
        #[arg(long, value_enum)]
        section_order: Option<SectionOrder>,
        /// Give up after trying this many candidate sections
        #[arg(long)]
        node_limit: Option<u64>,
        /// Also write the schedule as an iCalendar file (needs APP_TERM_START and APP_TERM_END)
        #[arg(long)]
        ical: Option<PathBuf>,
    },
    /// Explain which of the given class numbers overlap.
    Conflicts {
        #[arg(required = true)]
        class_nums: Vec<u32>,
    },
}

impl Cli {
    /// Command-line flags win over configured values.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(path) = &self.catalog {
            settings.catalog_path = path.clone();
        }
        settings.debug |= self.verbose;
        if let Some(unit) = self.unit {
            settings.time_unit = unit;
        }
        if let Some(policy) = self.policy {
            settings.overlap_policy = policy;
        }
        if let Commands::Solve {
            ordering,
            section_order,
            node_limit,
            ..
        } = &self.command
        {
            if let Some(ordering) = ordering {
                settings.group_ordering = *ordering;
            }
            if let Some(order) = section_order {
                settings.section_order = *order;
            }
            if node_limit.is_some() {
                settings.node_limit = *node_limit;
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SolveReport<'a> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<&'a [Section]>,
    pub courses_scheduled: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

impl<'a> From<Option<&'a Schedule>> for SolveReport<'a> {
    fn from(schedule: Option<&'a Schedule>) -> Self {
        match schedule {
            Some(schedule) => Self {
                success: true,
                schedule: Some(schedule.sections()),
                courses_scheduled: schedule.len(),
                error: None,
            },
            None => Self {
                success: false,
                schedule: None,
                courses_scheduled: 0,
                error: Some("No conflict-free schedule found"),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConflictsReport<'a> {
    pub conflict_count: usize,
    pub conflicts: &'a [ConflictReport],
}
