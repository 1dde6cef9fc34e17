use chrono::{SecondsFormat, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::TimetableError;
use super::model::{
    assigned_period_count, has_useful_content, Day, Period, PeriodDraft, Snapshot, Teacher,
    TimeSlot, WeeklyGrid,
};
use super::wire;
use crate::store::KeyValueStore;

pub const DEFAULT_SCHEDULE_KEY: &str = "coordinator_timetable";
pub const HISTORY_KEY: &str = "coordinator_timetable_history";
/// Settings row holding the [`AssignDefaults`] of a workspace.
pub const SETUP_KEY: &str = "setup.timetable";

/// Values a new assignment starts with when a teacher is pre-selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignDefaults {
    pub section: String,
    pub grade: String,
}

impl Default for AssignDefaults {
    fn default() -> Self {
        AssignDefaults {
            section: "A".to_string(),
            grade: "Grade 1".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenDraft {
    pub day: Day,
    pub slot: TimeSlot,
    pub draft: PeriodDraft,
}

/// Owns the live weekly grid for one session.
///
/// Cell operations never touch storage. Only `save_snapshot`,
/// `load_default_schedule`, `clear_all` and the history helpers take a
/// [`KeyValueStore`].
#[derive(Debug, Default)]
pub struct TimeTableEngine {
    grid: WeeklyGrid,
    selected_teacher: Option<Teacher>,
    open_draft: Option<OpenDraft>,
    snapshots: Vec<Snapshot>,
    defaults: AssignDefaults,
}

impl TimeTableEngine {
    pub fn new(defaults: AssignDefaults) -> Self {
        TimeTableEngine {
            defaults,
            ..Default::default()
        }
    }

    pub fn grid(&self) -> &WeeklyGrid {
        &self.grid
    }

    pub fn cell(&self, day: Day, slot: TimeSlot) -> &Period {
        self.grid.cell(day, slot)
    }

    pub fn selected_teacher(&self) -> Option<&Teacher> {
        self.selected_teacher.as_ref()
    }

    pub fn open_draft(&self) -> Option<&OpenDraft> {
        self.open_draft.as_ref()
    }

    pub fn defaults(&self) -> &AssignDefaults {
        &self.defaults
    }

    pub fn set_defaults(&mut self, defaults: AssignDefaults) {
        self.defaults = defaults;
    }

    pub fn initialize(&mut self) {
        self.grid = WeeklyGrid::initialized();
        self.open_draft = None;
    }

    pub fn select_teacher(&mut self, teacher: Option<Teacher>) {
        debug!(teacher_id = teacher.as_ref().map(|t| t.id), "select teacher");
        self.selected_teacher = teacher;
    }

    pub fn begin_assign(
        &mut self,
        day: Day,
        slot: TimeSlot,
    ) -> Result<PeriodDraft, TimetableError> {
        ensure_editable(day, slot)?;

        let cell = self.grid.cell(day, slot);
        let draft = if cell.is_assigned() {
            cell.to_draft()
        } else if let Some(t) = &self.selected_teacher {
            PeriodDraft {
                subject: String::new(),
                teacher_name: t.display_name(),
                teacher_id: t.id,
                section: self.defaults.section.clone(),
                grade: self.defaults.grade.clone(),
            }
        } else {
            PeriodDraft::default()
        };

        self.open_draft = Some(OpenDraft {
            day,
            slot,
            draft: draft.clone(),
        });
        Ok(draft)
    }

    pub fn commit_assign(
        &mut self,
        day: Day,
        slot: TimeSlot,
        mut draft: PeriodDraft,
    ) -> Result<&Period, TimetableError> {
        ensure_editable(day, slot)?;

        if draft.teacher_name.is_empty() {
            if let Some(t) = &self.selected_teacher {
                draft.teacher_name = t.display_name();
                draft.teacher_id = t.id;
            }
        }

        debug!(day = %day, slot = %slot, subject = %draft.subject, "assign period");
        self.grid.set_cell(day, slot, Period::assigned(draft));
        self.open_draft = None;
        Ok(self.grid.cell(day, slot))
    }

    pub fn clear_cell(&mut self, day: Day, slot: TimeSlot) -> Result<(), TimetableError> {
        ensure_editable(day, slot)?;
        debug!(day = %day, slot = %slot, "clear period");
        self.grid.set_cell(day, slot, Period::free());
        Ok(())
    }

    /// Persists the grid as the default schedule, archives a copy of it, and
    /// starts a new blank schedule.
    pub fn save_snapshot(
        &mut self,
        store: &dyn KeyValueStore,
    ) -> Result<&Snapshot, TimetableError> {
        if !has_useful_content(&self.grid) {
            return Err(TimetableError::NothingToSave);
        }

        store.put(DEFAULT_SCHEDULE_KEY, &wire::encode_grid(&self.grid)?)?;

        let snapshot = Snapshot {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            grid: self.grid.clone(),
            assigned_period_count: assigned_period_count(&self.grid),
        };
        info!(
            snapshot_id = %snapshot.id,
            assigned = snapshot.assigned_period_count,
            "saved timetable"
        );
        self.snapshots.insert(0, snapshot);
        self.persist_history(store);

        self.reset_session();
        Ok(&self.snapshots[0])
    }

    pub fn load_default_schedule(
        &mut self,
        store: &dyn KeyValueStore,
    ) -> Result<(), TimetableError> {
        let Some(text) = store.get(DEFAULT_SCHEDULE_KEY)? else {
            return Err(TimetableError::NoSavedSchedule);
        };
        self.grid = wire::decode_grid(&text)?;
        self.open_draft = None;
        Ok(())
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn load_snapshot(&mut self, snapshot_id: &str) -> Result<(), TimetableError> {
        let snapshot = self
            .snapshots
            .iter()
            .find(|s| s.id == snapshot_id)
            .ok_or_else(|| TimetableError::SnapshotNotFound(snapshot_id.to_string()))?;
        self.grid = snapshot.grid.clone();
        self.open_draft = None;
        Ok(())
    }

    /// Returns whether a snapshot was removed. Unknown ids are not an error.
    pub fn remove_snapshot(&mut self, snapshot_id: &str, store: &dyn KeyValueStore) -> bool {
        let before = self.snapshots.len();
        self.snapshots.retain(|s| s.id != snapshot_id);
        let removed = self.snapshots.len() != before;
        if removed {
            self.persist_history(store);
        }
        removed
    }

    pub fn clear_all(&mut self, store: &dyn KeyValueStore) -> Result<(), TimetableError> {
        store.remove(DEFAULT_SCHEDULE_KEY)?;
        self.reset_session();
        Ok(())
    }

    /// Replaces the in-memory snapshot list with the persisted history.
    /// Unreadable history leaves the list empty.
    pub fn restore_history(&mut self, store: &dyn KeyValueStore) {
        self.snapshots.clear();
        let text = match store.get(HISTORY_KEY) {
            Ok(Some(text)) => text,
            Ok(None) => return,
            Err(e) => {
                warn!("failed to read timetable history: {:#}", e);
                return;
            }
        };
        match serde_json::from_str::<Vec<Snapshot>>(&text) {
            Ok(list) => self.snapshots = list,
            Err(e) => warn!("ignoring unreadable timetable history: {}", e),
        }
    }

    // The default schedule is the durable record; history is best-effort.
    fn persist_history(&self, store: &dyn KeyValueStore) {
        let result = serde_json::to_string(&self.snapshots)
            .map_err(anyhow::Error::from)
            .and_then(|text| store.put(HISTORY_KEY, &text));
        if let Err(e) = result {
            warn!("failed to persist timetable history: {:#}", e);
        }
    }

    fn reset_session(&mut self) {
        self.selected_teacher = None;
        self.initialize();
    }
}

fn ensure_editable(day: Day, slot: TimeSlot) -> Result<(), TimetableError> {
    if slot.is_break() {
        return Err(TimetableError::BreakPeriodImmutable { day, slot });
    }
    Ok(())
}
