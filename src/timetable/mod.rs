//! Coordinator time-table: a Monday..Saturday x eight-slot grid with a fixed
//! break period, cell editing, and saved snapshots.

mod engine;
mod error;
mod model;
pub mod wire;

pub use engine::{
    AssignDefaults, OpenDraft, TimeTableEngine, DEFAULT_SCHEDULE_KEY, HISTORY_KEY,
    SETUP_KEY,
};
pub use error::TimetableError;
pub use model::{
    assigned_period_count, has_useful_content, Coordinator, Day, Period, PeriodDraft, PeriodKind,
    Snapshot, Teacher, TimeSlot, WeeklyGrid, BREAK_SUBJECT, DAY_COUNT, SLOT_COUNT,
};
