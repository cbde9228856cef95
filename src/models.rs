use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::time::{Interval, TimeSpan, TimeSpec, TimeUnit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weekday {
    #[serde(rename = "M")]
    Monday,
    #[serde(rename = "T")]
    Tuesday,
    #[serde(rename = "W")]
    Wednesday,
    #[serde(rename = "R")]
    Thursday,
    #[serde(rename = "F")]
    Friday,
    #[serde(rename = "S")]
    Saturday,
}

impl Weekday {
    /// Accepts the catalog symbols `M T W R F S`, plus `Th` for Thursday.
    pub fn parse(symbol: &str) -> Option<Self> {
        match symbol.trim().to_ascii_uppercase().as_str() {
            "M" => Some(Weekday::Monday),
            "T" => Some(Weekday::Tuesday),
            "W" => Some(Weekday::Wednesday),
            "R" | "TH" => Some(Weekday::Thursday),
            "F" => Some(Weekday::Friday),
            "S" => Some(Weekday::Saturday),
            _ => None,
        }
    }

    pub fn to_chrono(self) -> chrono::Weekday {
        match self {
            Weekday::Monday => chrono::Weekday::Mon,
            Weekday::Tuesday => chrono::Weekday::Tue,
            Weekday::Wednesday => chrono::Weekday::Wed,
            Weekday::Thursday => chrono::Weekday::Thu,
            Weekday::Friday => chrono::Weekday::Fri,
            Weekday::Saturday => chrono::Weekday::Sat,
        }
    }
}

/// Parses a compact day pattern such as `"MWF"`, `"TR"` or `"TTh"`.
pub fn parse_days(pattern: &str) -> Vec<Weekday> {
    let mut days = Vec::new();
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        let day = if c.eq_ignore_ascii_case(&'T')
            && chars.next_if(|next| next.eq_ignore_ascii_case(&'H')).is_some()
        {
            Some(Weekday::Thursday)
        } else {
            Weekday::parse(&c.to_string())
        };
        if let Some(day) = day.filter(|d| !days.contains(d)) {
            days.push(day);
        }
    }
    days
}

/// Reads an explicit JSON `null` the same way as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Keeps a string value; any other JSON value counts as absent.
fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(text)) => Some(text),
        _ => None,
    })
}

/// A list of strings where `null` and non-string entries are dropped.
fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Vec<serde_json::Value> = null_as_default(deserializer)?;
    Ok(values
        .into_iter()
        .filter_map(|value| match value {
            serde_json::Value::String(text) => Some(text),
            _ => None,
        })
        .collect())
}

/// One recurring weekly time span of a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingBlock {
    pub days: Vec<Weekday>,
    /// `None` for TBA or unparseable times; such blocks never take part in conflicts.
    pub span: Option<TimeSpan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
}

impl MeetingBlock {
    pub fn new(days: Vec<Weekday>, span: Option<TimeSpan>) -> Self {
        Self {
            days,
            span,
            building: None,
            room: None,
        }
    }

    /// A block on `days` (e.g. `"MWF"`) spanning periods `begin..=end`.
    pub fn periods(days: &str, begin: u8, end: u8) -> Self {
        Self::new(parse_days(days), TimeSpan::periods(begin, end))
    }

    /// A block on `days` between two clock strings such as `"10:40 AM"`.
    pub fn clock(days: &str, begin: &str, end: &str) -> Self {
        Self::new(parse_days(days), TimeSpan::clock(begin, end))
    }

    pub fn tba(days: &str) -> Self {
        Self::new(parse_days(days), None)
    }

    /// Resolves one unit family for both ends. The family native to `unit`
    /// wins when both are present; the other one is the fallback.
    pub fn from_raw(raw: &RawMeetTime, unit: TimeUnit) -> Self {
        let periods = raw
            .meet_period_begin
            .as_ref()
            .and_then(PeriodCode::to_spec)
            .zip(raw.meet_period_end.as_ref().and_then(PeriodCode::to_spec))
            .and_then(|(begin, end)| TimeSpan::new(begin, end));
        let clock = raw
            .meet_time_begin
            .as_deref()
            .zip(raw.meet_time_end.as_deref())
            .and_then(|(begin, end)| TimeSpan::clock(begin, end));
        let span = match unit {
            TimeUnit::Minutes => clock.or(periods),
            TimeUnit::Periods => periods.or(clock),
        };

        let mut days = Vec::with_capacity(raw.meet_days.len());
        for symbol in &raw.meet_days {
            match Weekday::parse(symbol) {
                Some(day) if !days.contains(&day) => days.push(day),
                Some(_) => {}
                None => warn!(day = %symbol, "dropping unknown meeting day"),
            }
        }

        Self {
            days,
            span,
            building: raw.meet_building.clone().filter(|b| !b.trim().is_empty()),
            room: raw.meet_room.clone().filter(|r| !r.trim().is_empty()),
        }
    }

    pub fn interval(&self, unit: TimeUnit) -> Option<Interval> {
        self.span.and_then(|span| span.interval(unit))
    }

    pub fn location(&self) -> Option<String> {
        match (&self.building, &self.room) {
            (Some(building), Some(room)) => Some(format!("{building} {room}")),
            _ => None,
        }
    }
}

/// One schedulable offering of a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub class_num: u32,
    pub course_code: String,
    #[serde(default)]
    pub course_name: String,
    #[serde(default)]
    pub instructors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits: Option<f64>,
    pub meet_times: Vec<MeetingBlock>,
}

impl Section {
    pub fn new(
        class_num: u32,
        course_code: impl Into<String>,
        meet_times: Vec<MeetingBlock>,
    ) -> Self {
        Self {
            class_num,
            course_code: course_code.into(),
            course_name: String::new(),
            instructors: Vec::new(),
            credits: None,
            meet_times,
        }
    }

    /// Every `(day, interval)` this section occupies on `unit`'s axis.
    pub fn occupied(&self, unit: TimeUnit) -> impl Iterator<Item = (Weekday, Interval)> + '_ {
        self.meet_times.iter().flat_map(move |block| {
            let interval = block.interval(unit);
            block
                .days
                .iter()
                .filter_map(move |day| interval.map(|i| (*day, i)))
        })
    }

    /// Start of the first meeting block that has a position on `unit`'s axis.
    pub fn first_start(&self, unit: TimeUnit) -> Option<u16> {
        self.meet_times
            .iter()
            .find_map(|block| block.interval(unit))
            .map(|i| i.start)
    }
}

/// A catalog course and all of its sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub code: String,
    pub name: String,
    pub dept: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prereqs: Option<String>,
    #[serde(rename = "isAI", default)]
    pub is_ai: bool,
    pub sections: Vec<Section>,
}

impl Course {
    pub fn from_raw(raw: RawCourse, unit: TimeUnit) -> Self {
        let code = raw.code.trim().to_ascii_uppercase();
        let mut sections = Vec::with_capacity(raw.sections.len());
        for section in raw.sections {
            let Some(class_num) = section.class_num.number() else {
                warn!(
                    course = %code,
                    class_num = ?section.class_num,
                    "skipping section with unreadable class number"
                );
                continue;
            };
            sections.push(Section {
                class_num,
                course_code: code.clone(),
                course_name: raw.name.clone(),
                instructors: section.instructors,
                credits: section.credits.as_ref().and_then(serde_json::Value::as_f64),
                meet_times: section
                    .meet_times
                    .iter()
                    .map(|m| MeetingBlock::from_raw(m, unit))
                    .collect(),
            });
        }
        Self {
            code,
            name: raw.name,
            dept: raw.dept,
            description: raw.description.filter(|d| !d.is_empty()),
            prereqs: raw.prereqs.filter(|p| !p.is_empty()),
            is_ai: raw.is_ai,
            sections,
        }
    }
}

/// Solver input: one course and its candidate sections, tried first to last.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseRequestGroup {
    pub code: String,
    pub sections: Vec<Section>,
}

impl CourseRequestGroup {
    pub fn new(code: impl Into<String>, sections: Vec<Section>) -> Self {
        Self {
            code: code.into(),
            sections,
        }
    }
}

/// One chosen section per requested course, in request order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schedule {
    sections: Vec<Section>,
}

impl Schedule {
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn class_numbers(&self) -> Vec<u32> {
        self.sections.iter().map(|s| s.class_num).collect()
    }
}

/// Catalog course record as stored in the JSON snapshot.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCourse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dept: String,
    #[serde(default, deserialize_with = "string_or_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub prereqs: Option<String>,
    #[serde(rename = "isAI", default, deserialize_with = "null_as_default")]
    pub is_ai: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sections: Vec<RawSection>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSection {
    #[serde(default)]
    pub class_num: RawClassNum,
    #[serde(default, deserialize_with = "string_list")]
    pub instructors: Vec<String>,
    #[serde(default)]
    pub credits: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub meet_times: Vec<RawMeetTime>,
}

/// Class numbers arrive as numbers or digit strings; anything else is kept
/// so the section can be skipped with a warning instead of failing the load.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawClassNum {
    Number(u32),
    Text(String),
    Other(serde_json::Value),
}

impl Default for RawClassNum {
    fn default() -> Self {
        RawClassNum::Other(serde_json::Value::Null)
    }
}

impl RawClassNum {
    pub fn number(&self) -> Option<u32> {
        match self {
            RawClassNum::Number(n) => Some(*n),
            RawClassNum::Text(text) => text.trim().parse().ok(),
            RawClassNum::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMeetTime {
    #[serde(default, deserialize_with = "string_list")]
    pub meet_days: Vec<String>,
    #[serde(default)]
    pub meet_period_begin: Option<PeriodCode>,
    #[serde(default)]
    pub meet_period_end: Option<PeriodCode>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub meet_time_begin: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub meet_time_end: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub meet_building: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub meet_room: Option<String>,
}

/// Period codes arrive as numbers (`3`) or strings (`"3"`, `"E1"`, `"TBA"`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PeriodCode {
    Number(i64),
    Text(String),
    Other(serde_json::Value),
}

impl PeriodCode {
    pub fn to_spec(&self) -> Option<TimeSpec> {
        match self {
            PeriodCode::Number(n) => u8::try_from(*n).ok().and_then(TimeSpec::from_period_number),
            PeriodCode::Text(text) => TimeSpec::parse_period(text),
            PeriodCode::Other(_) => None,
        }
    }
}
