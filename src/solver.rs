//! Backtracking assignment of one section per requested course.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use crate::conflict::OverlapChecker;
use crate::models::{CourseRequestGroup, Schedule, Section};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SolveError {
    #[error("search abandoned after trying {explored} candidate sections")]
    NodeLimitExceeded { explored: u64 },
}

/// Order in which course groups are decided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum GroupOrdering {
    /// Caller's order.
    #[default]
    AsGiven,
    /// Fewest candidates first. The returned schedule is still in the caller's order.
    MostConstrainedFirst,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Solver {
    checker: OverlapChecker,
    ordering: GroupOrdering,
}

enum Step {
    Found,
    Exhausted,
    LimitReached,
}

struct Search<'a> {
    checker: &'a OverlapChecker,
    groups: Vec<&'a CourseRequestGroup>,
    chosen: Vec<&'a Section>,
    explored: u64,
    limit: Option<u64>,
}

impl<'a> Search<'a> {
    fn extend(&mut self, depth: usize) -> Step {
        let Some(group) = self.groups.get(depth).copied() else {
            return Step::Found;
        };
        for candidate in &group.sections {
            self.explored += 1;
            if self.limit.is_some_and(|limit| self.explored > limit) {
                return Step::LimitReached;
            }
            self.chosen.push(candidate);
            if !self.checker.has_conflict(self.chosen.iter().copied()) {
                match self.extend(depth + 1) {
                    Step::Exhausted => {}
                    step => return step,
                }
            }
            self.chosen.pop();
        }
        trace!(course = %group.code, depth, "no candidate fits, backtracking");
        Step::Exhausted
    }
}

impl Solver {
    pub fn new(checker: OverlapChecker) -> Self {
        Self {
            checker,
            ordering: GroupOrdering::default(),
        }
    }

    pub fn with_ordering(mut self, ordering: GroupOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn checker(&self) -> &OverlapChecker {
        &self.checker
    }

    /// First conflict-free assignment in candidate order, or `None` when no
    /// combination fits (including when a group has no candidates).
    pub fn solve(&self, groups: &[CourseRequestGroup]) -> Option<Schedule> {
        match self.run(groups, None) {
            (Step::Found, schedule) => schedule,
            _ => None,
        }
    }

    /// Like [`Solver::solve`], but gives up after trying `node_limit` candidates.
    pub fn solve_bounded(
        &self,
        groups: &[CourseRequestGroup],
        node_limit: u64,
    ) -> Result<Option<Schedule>, SolveError> {
        match self.run(groups, Some(node_limit)) {
            (Step::Found, schedule) => Ok(schedule),
            (Step::Exhausted, _) => Ok(None),
            (Step::LimitReached, _) => Err(SolveError::NodeLimitExceeded {
                explored: node_limit,
            }),
        }
    }

    fn run(&self, groups: &[CourseRequestGroup], limit: Option<u64>) -> (Step, Option<Schedule>) {
        let mut order: Vec<usize> = (0..groups.len()).collect();
        if self.ordering == GroupOrdering::MostConstrainedFirst {
            order.sort_by_key(|&i| groups[i].sections.len());
        }

        let mut search = Search {
            checker: &self.checker,
            groups: order.iter().map(|&i| &groups[i]).collect(),
            chosen: Vec::with_capacity(groups.len()),
            explored: 0,
            limit,
        };
        let step = search.extend(0);
        debug!(
            groups = groups.len(),
            explored = search.explored,
            found = matches!(step, Step::Found),
            "schedule search finished"
        );
        if !matches!(step, Step::Found) {
            return (step, None);
        }

        let mut placed: Vec<Option<Section>> = vec![None; groups.len()];
        for (&input_index, section) in order.iter().zip(&search.chosen) {
            placed[input_index] = Some((*section).clone());
        }
        let schedule = Schedule::new(placed.into_iter().flatten().collect());
        (step, Some(schedule))
    }
}

/// [`Solver::solve`] with the default checker and the caller's group order.
pub fn solve(groups: &[CourseRequestGroup]) -> Option<Schedule> {
    Solver::default().solve(groups)
}
