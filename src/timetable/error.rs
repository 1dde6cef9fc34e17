use thiserror::Error;

use super::model::{Day, TimeSlot};

/// Failures surfaced by [`TimeTableEngine`](super::TimeTableEngine).
///
/// None of these are fatal to the session; the IPC layer maps each one to a
/// stable error code through [`TimetableError::code`].
#[derive(Debug, Error)]
pub enum TimetableError {
    #[error("the break period ({slot}) on {day} cannot be edited")]
    BreakPeriodImmutable { day: Day, slot: TimeSlot },

    #[error("fill at least one period with a subject and a teacher before saving")]
    NothingToSave,

    #[error("no saved schedule found")]
    NoSavedSchedule,

    #[error("snapshot '{0}' not found")]
    SnapshotNotFound(String),

    #[error("unknown day: '{0}'")]
    UnknownDay(String),

    #[error("unknown time slot: '{0}'")]
    UnknownTimeSlot(String),

    #[error("stored schedule is not valid JSON: {0}")]
    CorruptSchedule(#[from] serde_json::Error),

    #[error(transparent)]
    Persistence(#[from] anyhow::Error),
}

impl TimetableError {
    pub fn code(&self) -> &'static str {
        match self {
            TimetableError::BreakPeriodImmutable { .. } => "break_period_immutable",
            TimetableError::NothingToSave => "nothing_to_save",
            TimetableError::NoSavedSchedule => "no_saved_schedule",
            TimetableError::SnapshotNotFound(_) => "snapshot_not_found",
            TimetableError::UnknownDay(_) | TimetableError::UnknownTimeSlot(_) => "bad_params",
            TimetableError::CorruptSchedule(_) => "corrupt_schedule",
            TimetableError::Persistence(_) => "db_query_failed",
        }
    }
}
