//! Course codes in, conflict-free schedule out.

use std::sync::Arc;

use tracing::{debug, info};

use crate::catalog::{Catalog, SectionOrder};
use crate::conflict::{ConflictReport, OverlapChecker};
use crate::error::PlanError;
use crate::models::{Schedule, Section};
use crate::settings::Settings;
use crate::solver::{GroupOrdering, Solver};
use crate::time::OverlapPolicy;
use crate::validation::validate_course_codes;

/// Immutable; one planner serves any number of concurrent requests.
#[derive(Debug, Clone)]
pub struct Planner {
    catalog: Arc<Catalog>,
    solver: Solver,
    section_order: SectionOrder,
    node_limit: Option<u64>,
}

impl Planner {
    /// Compares intervals on the catalog's own axis.
    pub fn new(catalog: Arc<Catalog>, policy: OverlapPolicy) -> Self {
        let checker = OverlapChecker::new(catalog.unit(), policy);
        Self {
            catalog,
            solver: Solver::new(checker),
            section_order: SectionOrder::default(),
            node_limit: None,
        }
    }

    pub fn from_settings(catalog: Arc<Catalog>, settings: &Settings) -> Self {
        Self::new(catalog, settings.overlap_policy)
            .with_ordering(settings.group_ordering)
            .with_section_order(settings.section_order)
            .with_node_limit(settings.node_limit)
    }

    /// Reads the configured catalog snapshot and builds a planner over it.
    pub async fn load(settings: &Settings) -> Result<Self, PlanError> {
        let catalog = Catalog::load(&settings.catalog_path, settings.time_unit).await?;
        Ok(Self::from_settings(Arc::new(catalog), settings))
    }

    pub fn with_ordering(mut self, ordering: GroupOrdering) -> Self {
        self.solver = self.solver.with_ordering(ordering);
        self
    }

    pub fn with_section_order(mut self, order: SectionOrder) -> Self {
        self.section_order = order;
        self
    }

    pub fn with_node_limit(mut self, limit: Option<u64>) -> Self {
        self.node_limit = limit;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// `Ok(None)` when every course exists but no combination of sections fits.
    pub fn plan<S: AsRef<str>>(&self, codes: &[S]) -> Result<Option<Schedule>, PlanError> {
        let codes = validate_course_codes(codes)?;
        let groups = self.catalog.resolve(codes.as_slice(), self.section_order)?;
        debug!(
            courses = ?codes,
            candidates = groups.iter().map(|g| g.sections.len()).sum::<usize>(),
            "planning schedule"
        );

        let schedule = match self.node_limit {
            Some(limit) => self.solver.solve_bounded(&groups, limit)?,
            None => self.solver.solve(&groups),
        };
        match &schedule {
            Some(found) => info!(classes = ?found.class_numbers(), "conflict-free schedule found"),
            None => info!(courses = ?codes, "no conflict-free schedule exists"),
        }
        Ok(schedule)
    }

    /// Pairwise clashes among hand-picked sections.
    pub fn conflicts(&self, class_nums: &[u32]) -> Result<Vec<ConflictReport>, PlanError> {
        let sections = class_nums
            .iter()
            .map(|&num| {
                self.catalog
                    .section(num)
                    .cloned()
                    .ok_or(PlanError::UnknownSection(num))
            })
            .collect::<Result<Vec<Section>, _>>()?;
        Ok(self.solver.checker().conflicts(&sections))
    }
}
