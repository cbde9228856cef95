use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use chrono_tz::Tz;
use icalendar::{Calendar, CalendarDateTime, Component, DatePerhapsTime, Event, EventLike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{MeetingBlock, Schedule, Section, Weekday};
use crate::time::TimeUnit;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExportError {
    #[error("unknown timezone '{0}'")]
    UnknownTimezone(String),
    #[error("term ends on {end} before it starts on {start}")]
    InvalidTerm { start: NaiveDate, end: NaiveDate },
}

/// Dates between which weekly meetings repeat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleTerm {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub timezone: String,
}

#[derive(Debug, Clone)]
pub struct ICalExporter {
    term: ScheduleTerm,
    tz: Tz,
}

fn ical_day(day: Weekday) -> &'static str {
    match day {
        Weekday::Monday => "MO",
        Weekday::Tuesday => "TU",
        Weekday::Wednesday => "WE",
        Weekday::Thursday => "TH",
        Weekday::Friday => "FR",
        Weekday::Saturday => "SA",
    }
}

fn first_on_or_after(start: NaiveDate, day: Weekday) -> NaiveDate {
    let target = day.to_chrono().num_days_from_monday();
    let current = start.weekday().num_days_from_monday();
    start + Duration::days(i64::from((7 + target - current) % 7))
}

fn clock_time(minutes: u16) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(u32::from(minutes / 60), u32::from(minutes % 60), 0)
}

impl ICalExporter {
    pub fn new(term: ScheduleTerm) -> Result<Self, ExportError> {
        let tz: Tz = term
            .timezone
            .parse()
            .map_err(|_| ExportError::UnknownTimezone(term.timezone.clone()))?;
        if term.end < term.start {
            return Err(ExportError::InvalidTerm {
                start: term.start,
                end: term.end,
            });
        }
        Ok(Self { term, tz })
    }

    fn local(&self, date_time: NaiveDateTime) -> DatePerhapsTime {
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone {
            date_time,
            tzid: self.tz.name().to_string(),
        })
    }

    fn block_event(&self, section: &Section, block: &MeetingBlock, index: usize) -> Option<Event> {
        let interval = block.interval(TimeUnit::Minutes)?;
        let first_date = block
            .days
            .iter()
            .map(|day| first_on_or_after(self.term.start, *day))
            .min()?;
        if first_date > self.term.end {
            return None;
        }
        let start = first_date.and_time(clock_time(interval.start)?);
        let end = first_date.and_time(clock_time(interval.end)?);

        let by_day = block
            .days
            .iter()
            .map(|d| ical_day(*d))
            .collect::<Vec<_>>()
            .join(",");
        let rrule = format!(
            "FREQ=WEEKLY;BYDAY={by_day};UNTIL={}T235959",
            self.term.end.format("%Y%m%d")
        );
        let summary = if section.course_name.is_empty() {
            section.course_code.clone()
        } else {
            format!("{} - {}", section.course_code, section.course_name)
        };
        let instructors = if section.instructors.is_empty() {
            "TBA".to_string()
        } else {
            section.instructors.join(", ")
        };

        let mut event = Event::new();
        event.summary(&summary);
        event.starts(self.local(start));
        event.ends(self.local(end));
        event.add_property("RRULE", rrule);
        event.description(&format!("Instructor: {instructors}"));
        if let Some(location) = block.location() {
            event.location(&location);
        }
        event.uid(&format!(
            "{}-{}-{}@schedugator",
            section.course_code, section.class_num, index
        ));
        Some(event)
    }

    /// Weekly recurring events for every timed meeting block. TBA blocks are left out.
    pub fn generate(&self, schedule: &Schedule) -> Vec<u8> {
        if schedule.is_empty() {
            return Vec::new();
        }

        let mut calendar = Calendar::new();
        calendar.name("Class Schedule");

        for section in schedule.sections() {
            for (index, block) in section.meet_times.iter().enumerate() {
                if let Some(event) = self.block_event(section, block, index) {
                    calendar.push(event);
                }
            }
        }

        calendar.to_string().into_bytes()
    }
}
