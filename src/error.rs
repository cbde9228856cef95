use thiserror::Error;
use tracing::error;

use crate::catalog::CatalogError;
use crate::solver::SolveError;

/// Reasons a schedule request cannot be answered.
///
/// "No conflict-free schedule exists" is not one of them: planners return
/// `Ok(None)` for that.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("no course codes were requested")]
    EmptyRequest,
    #[error("'{0}' is not a valid course code")]
    InvalidCourseCode(String),
    #[error("courses not found in catalog: {}", .0.join(", "))]
    UnknownCourses(Vec<String>),
    #[error("section {0} not found in catalog")]
    UnknownSection(u32),
    #[error(transparent)]
    Solve(#[from] SolveError),
    #[error("catalog unavailable")]
    Catalog(#[source] CatalogError),
}

impl PlanError {
    /// True when the request itself is at fault and rephrasing it could help.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            PlanError::EmptyRequest
                | PlanError::InvalidCourseCode(_)
                | PlanError::UnknownCourses(_)
                | PlanError::UnknownSection(_)
        )
    }
}

impl From<CatalogError> for PlanError {
    fn from(value: CatalogError) -> Self {
        error!("catalog error: {value}");
        PlanError::Catalog(value)
    }
}
