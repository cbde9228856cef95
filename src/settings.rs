use std::path::PathBuf;

use chrono::NaiveDate;
use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

use crate::catalog::SectionOrder;
use crate::ical::ScheduleTerm;
use crate::solver::GroupOrdering;
use crate::time::{OverlapPolicy, TimeUnit};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    pub catalog_path: PathBuf,
    pub debug: bool,
    pub time_unit: TimeUnit,
    pub overlap_policy: OverlapPolicy,
    pub group_ordering: GroupOrdering,
    pub section_order: SectionOrder,
    pub node_limit: Option<u64>,
    pub term_start: Option<NaiveDate>,
    pub term_end: Option<NaiveDate>,
    pub timezone: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let config = Config::builder()
            // APP_CATALOG_PATH -> catalog_path
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("catalog_path", "data/universal_base_catalog.json")?
            .set_default("debug", false)?
            .set_default("time_unit", "minutes")?
            .set_default("overlap_policy", "closed")?
            .set_default("group_ordering", "as_given")?
            .set_default("section_order", "catalog")?
            .set_default("timezone", "America/New_York")?
            .build()?;

        config.try_deserialize()
    }

    /// The export term, when both ends are configured.
    pub fn term(&self) -> Option<ScheduleTerm> {
        Some(ScheduleTerm {
            start: self.term_start?,
            end: self.term_end?,
            timezone: self.timezone.clone(),
        })
    }
}
