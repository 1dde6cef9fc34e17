use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::TimetableError;

pub const DAY_COUNT: usize = 6;
pub const SLOT_COUNT: usize = 8;
pub const BREAK_SUBJECT: &str = "Break";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Day {
    pub const ALL: [Day; DAY_COUNT] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
            Day::Saturday => "Saturday",
        }
    }

    pub fn parse(raw: &str) -> Option<Day> {
        Day::ALL.into_iter().find(|d| d.name() == raw.trim())
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Day {
    type Err = TimetableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Day::parse(s).ok_or_else(|| TimetableError::UnknownDay(s.to_string()))
    }
}

/// One of the fixed teaching intervals. `Break` (11:00 - 11:30) is the same
/// slot for every day and can never hold a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimeSlot {
    First,
    Second,
    Third,
    Fourth,
    Break,
    Fifth,
    Sixth,
    Seventh,
}

impl TimeSlot {
    pub const ALL: [TimeSlot; SLOT_COUNT] = [
        TimeSlot::First,
        TimeSlot::Second,
        TimeSlot::Third,
        TimeSlot::Fourth,
        TimeSlot::Break,
        TimeSlot::Fifth,
        TimeSlot::Sixth,
        TimeSlot::Seventh,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TimeSlot::First => "08:00 - 08:45",
            TimeSlot::Second => "08:45 - 09:30",
            TimeSlot::Third => "09:30 - 10:15",
            TimeSlot::Fourth => "10:15 - 11:00",
            TimeSlot::Break => "11:00 - 11:30",
            TimeSlot::Fifth => "11:30 - 12:15",
            TimeSlot::Sixth => "12:15 - 13:00",
            TimeSlot::Seventh => "13:00 - 13:45",
        }
    }

    pub fn parse(raw: &str) -> Option<TimeSlot> {
        let raw = raw.trim();
        TimeSlot::ALL.into_iter().find(|s| s.label() == raw)
    }

    pub fn is_break(self) -> bool {
        self == TimeSlot::Break
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimeSlot {
    type Err = TimetableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeSlot::parse(s).ok_or_else(|| TimetableError::UnknownTimeSlot(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    Break,
    Free,
    Assigned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Period {
    pub subject: String,
    pub teacher_name: String,
    pub teacher_id: i64,
    pub section: String,
    pub grade: String,
    pub kind: PeriodKind,
}

impl Period {
    pub fn break_period() -> Self {
        Period {
            subject: BREAK_SUBJECT.to_string(),
            kind: PeriodKind::Break,
            ..Period::free()
        }
    }

    pub fn free() -> Self {
        Period {
            subject: String::new(),
            teacher_name: String::new(),
            teacher_id: 0,
            section: String::new(),
            grade: String::new(),
            kind: PeriodKind::Free,
        }
    }

    pub fn assigned(draft: PeriodDraft) -> Self {
        Period {
            subject: draft.subject,
            teacher_name: draft.teacher_name,
            teacher_id: draft.teacher_id,
            section: draft.section,
            grade: draft.grade,
            kind: PeriodKind::Assigned,
        }
    }

    /// The cell a freshly initialized grid holds at `slot`.
    pub fn initial(slot: TimeSlot) -> Self {
        if slot.is_break() {
            Period::break_period()
        } else {
            Period::free()
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.kind == PeriodKind::Assigned
    }

    pub fn to_draft(&self) -> PeriodDraft {
        PeriodDraft {
            subject: self.subject.clone(),
            teacher_name: self.teacher_name.clone(),
            teacher_id: self.teacher_id,
            section: self.section.clone(),
            grade: self.grade.clone(),
        }
    }
}

/// Editable form of a period, as handed to and returned from the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PeriodDraft {
    pub subject: String,
    #[serde(alias = "teacher")]
    pub teacher_name: String,
    pub teacher_id: i64,
    pub section: String,
    pub grade: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyGrid {
    cells: [[Period; SLOT_COUNT]; DAY_COUNT],
}

impl WeeklyGrid {
    pub fn initialized() -> Self {
        WeeklyGrid {
            cells: std::array::from_fn(|_| Self::initial_day()),
        }
    }

    pub(crate) fn initial_day() -> [Period; SLOT_COUNT] {
        std::array::from_fn(|i| Period::initial(TimeSlot::ALL[i]))
    }

    pub(crate) fn from_days(cells: [[Period; SLOT_COUNT]; DAY_COUNT]) -> Self {
        let mut grid = WeeklyGrid { cells };
        for day in Day::ALL {
            grid.cells[day.index()][TimeSlot::Break.index()] = Period::break_period();
        }
        grid
    }

    pub fn cell(&self, day: Day, slot: TimeSlot) -> &Period {
        &self.cells[day.index()][slot.index()]
    }

    /// Only reachable through the engine, which rejects the break slot first.
    pub(crate) fn set_cell(&mut self, day: Day, slot: TimeSlot, period: Period) {
        debug_assert!(!slot.is_break());
        self.cells[day.index()][slot.index()] = period;
    }

    pub fn day(&self, day: Day) -> impl Iterator<Item = (TimeSlot, &Period)> + '_ {
        TimeSlot::ALL
            .into_iter()
            .zip(self.cells[day.index()].iter())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Day, TimeSlot, &Period)> + '_ {
        Day::ALL
            .into_iter()
            .flat_map(move |d| self.day(d).map(move |(s, p)| (d, s, p)))
    }

    pub fn count_kind(&self, kind: PeriodKind) -> usize {
        self.iter().filter(|(_, _, p)| p.kind == kind).count()
    }
}

impl Default for WeeklyGrid {
    fn default() -> Self {
        WeeklyGrid::initialized()
    }
}

/// A saved copy of the grid. The grid is owned, so later edits to the live
/// schedule never reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: String,
    pub timestamp: String,
    pub grid: WeeklyGrid,
    pub assigned_period_count: usize,
}

/// True when at least one cell is assigned with both a subject and a teacher.
/// An all-blank schedule is never worth saving.
pub fn has_useful_content(grid: &WeeklyGrid) -> bool {
    grid.iter().any(|(_, _, p)| {
        p.is_assigned() && !p.subject.is_empty() && !p.teacher_name.is_empty()
    })
}

pub fn assigned_period_count(grid: &WeeklyGrid) -> usize {
    grid.iter()
        .filter(|(_, _, p)| p.is_assigned() && !p.subject.is_empty())
        .count()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: i64,
    #[serde(alias = "full_name")]
    pub full_name: String,
    #[serde(alias = "employee_code", default, deserialize_with = "null_as_empty")]
    pub employee_code: String,
    #[serde(
        alias = "current_subjects",
        default,
        deserialize_with = "string_or_list"
    )]
    pub current_subjects: Vec<String>,
    #[serde(
        alias = "current_classes_taught",
        default,
        deserialize_with = "string_or_list"
    )]
    pub current_classes_taught: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
}

impl Teacher {
    /// Label stored on assigned periods, e.g. "Ali Khan - T001".
    pub fn display_name(&self) -> String {
        if self.employee_code.trim().is_empty() {
            self.full_name.clone()
        } else {
            format!("{} - {}", self.full_name, self.employee_code)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinator {
    pub id: i64,
    #[serde(alias = "full_name", default)]
    pub full_name: String,
    #[serde(alias = "employee_code", default)]
    pub employee_code: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<String>),
        Text(String),
        Null,
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::List(v) => v,
        Raw::Text(s) => s
            .split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect(),
        Raw::Null => Vec::new(),
    })
}
