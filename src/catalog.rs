use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::error::PlanError;
use crate::models::{Course, CourseRequestGroup, RawCourse, Section};
use crate::time::TimeUnit;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Order in which a course's sections are offered to the solver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SectionOrder {
    /// As listed in the catalog.
    #[default]
    Catalog,
    /// Earliest first meeting first; sections without a time go last.
    EarliestFirst,
    /// Latest first meeting first; sections without a time go last.
    LatestFirst,
}

impl SectionOrder {
    pub fn apply(self, sections: &mut [Section], unit: TimeUnit) {
        match self {
            SectionOrder::Catalog => {}
            SectionOrder::EarliestFirst => {
                sections.sort_by_key(|s| {
                    let start = s.first_start(unit);
                    (start.is_none(), start)
                });
            }
            SectionOrder::LatestFirst => {
                sections.sort_by_key(|s| {
                    let start = s.first_start(unit);
                    (start.is_none(), std::cmp::Reverse(start))
                });
            }
        }
    }
}

/// Read-only snapshot of every course offered in a term.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    courses: Vec<Course>,
    by_code: HashMap<String, usize>,
    unit: TimeUnit,
}

fn lookup_key(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

impl Catalog {
    /// Courses listed more than once have their sections merged under the first entry.
    pub fn from_courses(courses: Vec<Course>, unit: TimeUnit) -> Self {
        let mut catalog = Self {
            courses: Vec::with_capacity(courses.len()),
            by_code: HashMap::with_capacity(courses.len()),
            unit,
        };
        for course in courses {
            let key = lookup_key(&course.code);
            match catalog.by_code.get(&key) {
                Some(&index) => catalog.courses[index].sections.extend(course.sections),
                None => {
                    catalog.by_code.insert(key, catalog.courses.len());
                    catalog.courses.push(course);
                }
            }
        }
        catalog
    }

    pub fn from_json_str(json: &str, unit: TimeUnit) -> Result<Self, CatalogError> {
        let raw: Vec<RawCourse> = serde_json::from_str(json)?;
        let courses = raw
            .into_iter()
            .filter(|c| {
                let listed = !c.code.trim().is_empty();
                if !listed {
                    warn!(name = %c.name, "skipping course without a code");
                }
                listed
            })
            .map(|c| Course::from_raw(c, unit))
            .collect();
        Ok(Self::from_courses(courses, unit))
    }

    pub async fn load(path: impl AsRef<Path>, unit: TimeUnit) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let body = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| CatalogError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let catalog = Self::from_json_str(&body, unit)?;
        info!(path = %path.display(), courses = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    /// Axis the catalog's meeting blocks were resolved for.
    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn course(&self, code: &str) -> Option<&Course> {
        self.by_code
            .get(&lookup_key(code))
            .map(|&index| &self.courses[index])
    }

    pub fn section(&self, class_num: u32) -> Option<&Section> {
        self.courses
            .iter()
            .flat_map(|c| c.sections.iter())
            .find(|s| s.class_num == class_num)
    }

    /// Turns course codes into solver input.
    ///
    /// Unknown codes are an error, listed in request order. A known course with
    /// no sections becomes an empty group, which the solver reports as no solution.
    pub fn resolve<S: AsRef<str>>(
        &self,
        codes: &[S],
        order: SectionOrder,
    ) -> Result<Vec<CourseRequestGroup>, PlanError> {
        if codes.is_empty() {
            return Err(PlanError::EmptyRequest);
        }

        let mut groups: Vec<CourseRequestGroup> = Vec::with_capacity(codes.len());
        let mut unknown = Vec::new();
        for code in codes {
            let key = lookup_key(code.as_ref());
            if groups.iter().any(|g| g.code == key) || unknown.contains(&key) {
                continue;
            }
            match self.course(&key) {
                Some(course) => {
                    let mut sections = course.sections.clone();
                    order.apply(&mut sections, self.unit);
                    groups.push(CourseRequestGroup::new(key, sections));
                }
                None => unknown.push(key),
            }
        }

        if !unknown.is_empty() {
            warn!(courses = ?unknown, "requested courses not found in catalog");
            return Err(PlanError::UnknownCourses(unknown));
        }
        Ok(groups)
    }
}
