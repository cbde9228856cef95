//! Day/time overlap detection between sections.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{Section, Weekday};
use crate::time::{Interval, OverlapPolicy, TimeUnit};

/// Intervals already committed to each weekday.
#[derive(Debug, Clone, Default)]
pub struct DayOccupancy {
    slots: BTreeMap<Weekday, Vec<Interval>>,
}

impl DayOccupancy {
    pub fn clashes(&self, day: Weekday, interval: &Interval, policy: OverlapPolicy) -> bool {
        self.slots
            .get(&day)
            .is_some_and(|taken| taken.iter().any(|t| t.overlaps(interval, policy)))
    }

    pub fn commit(&mut self, day: Weekday, interval: Interval) {
        self.slots.entry(day).or_default().push(interval);
    }

    pub fn intervals(&self, day: Weekday) -> &[Interval] {
        self.slots.get(&day).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Stateless overlap test configured for one deployment's unit and policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlapChecker {
    pub unit: TimeUnit,
    pub policy: OverlapPolicy,
}

impl OverlapChecker {
    pub fn new(unit: TimeUnit, policy: OverlapPolicy) -> Self {
        Self { unit, policy }
    }

    /// True when blocks of two different sections share a day and overlap.
    ///
    /// Blocks without a span (TBA, unparseable) are ignored entirely. Blocks of
    /// the same section are never compared with each other.
    pub fn has_conflict<'a, I>(&self, sections: I) -> bool
    where
        I: IntoIterator<Item = &'a Section>,
    {
        let mut occupancy = DayOccupancy::default();
        for section in sections {
            let occupied: Vec<(Weekday, Interval)> = section.occupied(self.unit).collect();
            if occupied
                .iter()
                .any(|(day, interval)| occupancy.clashes(*day, interval, self.policy))
            {
                return true;
            }
            for (day, interval) in occupied {
                occupancy.commit(day, interval);
            }
        }
        false
    }

    /// Every overlapping pair in `sections`, reported with the first clashing block pair.
    pub fn conflicts(&self, sections: &[Section]) -> Vec<ConflictReport> {
        let mut reports = Vec::new();
        for (i, first) in sections.iter().enumerate() {
            for second in &sections[i + 1..] {
                if let Some(report) = self.pair_conflict(first, second) {
                    reports.push(report);
                }
            }
        }
        reports
    }

    fn pair_conflict(&self, first: &Section, second: &Section) -> Option<ConflictReport> {
        for a in &first.meet_times {
            let Some(ia) = a.interval(self.unit) else {
                continue;
            };
            for b in &second.meet_times {
                let Some(ib) = b.interval(self.unit) else {
                    continue;
                };
                if !ia.overlaps(&ib, self.policy) {
                    continue;
                }
                let days: Vec<Weekday> =
                    a.days.iter().copied().filter(|d| b.days.contains(d)).collect();
                if days.is_empty() {
                    continue;
                }
                return Some(ConflictReport {
                    first: SectionRef::from(first),
                    second: SectionRef::from(second),
                    days,
                    window: ia.intersection(&ib)?,
                    unit: self.unit,
                });
            }
        }
        None
    }
}

/// [`OverlapChecker::has_conflict`] with the default minutes axis and closed intervals.
pub fn has_conflict(sections: &[Section]) -> bool {
    OverlapChecker::default().has_conflict(sections)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionRef {
    pub class_num: u32,
    pub course_code: String,
}

impl From<&Section> for SectionRef {
    fn from(section: &Section) -> Self {
        Self {
            class_num: section.class_num,
            course_code: section.course_code.clone(),
        }
    }
}

/// Why two sections cannot be taken together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictReport {
    pub first: SectionRef,
    pub second: SectionRef,
    pub days: Vec<Weekday>,
    pub window: Interval,
    pub unit: TimeUnit,
}
