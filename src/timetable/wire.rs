//! Storage shape of a weekly grid:
//!
//! ```text
//! { "Monday": { "08:00 - 08:45": { subject, teacher, teacherId, section, grade, isBreak, isFree } } }
//! ```
//!
//! The two flags stand in for [`PeriodKind`] on disk. Decoding never yields a
//! partial grid: missing days or slots are filled the way `initialize` fills
//! them, and the break slot always decodes as a break.

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use super::model::{Day, Period, PeriodKind, TimeSlot, WeeklyGrid, DAY_COUNT, SLOT_COUNT};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodJson {
    #[serde(default, deserialize_with = "lenient_string")]
    pub subject: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub teacher: String,
    #[serde(default, deserialize_with = "lenient_id")]
    pub teacher_id: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub section: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub grade: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_break: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_free: Option<bool>,
}

impl From<&Period> for PeriodJson {
    fn from(p: &Period) -> Self {
        PeriodJson {
            subject: p.subject.clone(),
            teacher: p.teacher_name.clone(),
            teacher_id: p.teacher_id,
            section: p.section.clone(),
            grade: p.grade.clone(),
            is_break: Some(p.kind == PeriodKind::Break),
            is_free: Some(p.kind == PeriodKind::Free),
        }
    }
}

pub fn decode_period(slot: TimeSlot, raw: PeriodJson) -> Period {
    if slot.is_break() {
        return Period::break_period();
    }
    if raw.is_break.unwrap_or(false) || raw.is_free.unwrap_or(false) {
        return Period::free();
    }
    Period {
        subject: raw.subject,
        teacher_name: raw.teacher,
        teacher_id: raw.teacher_id,
        section: raw.section,
        grade: raw.grade,
        kind: PeriodKind::Assigned,
    }
}

type RawGrid = HashMap<String, HashMap<String, PeriodJson>>;

fn grid_from_raw(mut raw: RawGrid) -> WeeklyGrid {
    let mut days: [[Period; SLOT_COUNT]; DAY_COUNT] =
        std::array::from_fn(|_| WeeklyGrid::initial_day());

    for (i, day) in Day::ALL.into_iter().enumerate() {
        let Some(mut slots) = raw.remove(day.name()) else {
            warn!(day = %day, "stored schedule has no entry for day; filling with defaults");
            continue;
        };
        for (j, slot) in TimeSlot::ALL.into_iter().enumerate() {
            match slots.remove(slot.label()) {
                Some(p) => days[i][j] = decode_period(slot, p),
                None => warn!(day = %day, slot = %slot, "stored schedule is missing slot"),
            }
        }
        for label in slots.keys() {
            warn!(day = %day, slot = %label, "ignoring unknown time slot in stored schedule");
        }
    }
    for name in raw.keys() {
        warn!(day = %name, "ignoring unknown day in stored schedule");
    }

    WeeklyGrid::from_days(days)
}

struct DayJson<'a>(&'a WeeklyGrid, Day);

impl Serialize for DayJson<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(SLOT_COUNT))?;
        for (slot, period) in self.0.day(self.1) {
            map.serialize_entry(slot.label(), &PeriodJson::from(period))?;
        }
        map.end()
    }
}

impl Serialize for WeeklyGrid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(DAY_COUNT))?;
        for day in Day::ALL {
            map.serialize_entry(day.name(), &DayJson(self, day))?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for WeeklyGrid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawGrid::deserialize(deserializer)?;
        Ok(grid_from_raw(raw))
    }
}

pub fn decode_grid(text: &str) -> Result<WeeklyGrid, serde_json::Error> {
    serde_json::from_str(text)
}

pub fn encode_grid(grid: &WeeklyGrid) -> Result<String, serde_json::Error> {
    serde_json::to_string(grid)
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

// Older stores wrote ids as strings ("" when unset). Anything unusable
// becomes 0 so one bad cell cannot cost the rest of the grid.
fn lenient_id<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    let raw = serde_json::Value::deserialize(d)?;
    let id = match &raw {
        serde_json::Value::Null => Some(0),
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) if s.trim().is_empty() => Some(0),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    Ok(id.unwrap_or_else(|| {
        warn!(teacher_id = %raw, "unusable teacherId in stored schedule; using 0");
        0
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assigned_json() -> serde_json::Value {
        json!({
            "subject": "Math",
            "teacher": "Ali Khan - T001",
            "teacherId": 7,
            "section": "A",
            "grade": "Grade 3",
            "isBreak": false,
            "isFree": false
        })
    }

    #[test]
    fn missing_saturday_is_synthesized() {
        let mut grid = serde_json::to_value(WeeklyGrid::initialized()).expect("encode");
        grid["Monday"]["08:00 - 08:45"] = assigned_json();
        grid.as_object_mut().expect("object").remove("Saturday");

        let decoded: WeeklyGrid = serde_json::from_value(grid).expect("decode");
        assert_eq!(decoded.iter().count(), 48);
        let saturday: Vec<_> = decoded.day(Day::Saturday).map(|(_, p)| p.kind).collect();
        assert_eq!(
            saturday.iter().filter(|k| **k == PeriodKind::Break).count(),
            1
        );
        assert_eq!(
            saturday.iter().filter(|k| **k == PeriodKind::Free).count(),
            7
        );
        let monday = decoded.cell(Day::Monday, TimeSlot::First);
        assert_eq!(monday.kind, PeriodKind::Assigned);
        assert_eq!(monday.teacher_id, 7);
    }

    #[test]
    fn break_slot_cannot_be_smuggled_in_from_storage() {
        let mut grid = serde_json::to_value(WeeklyGrid::initialized()).expect("encode");
        grid["Friday"]["11:00 - 11:30"] = assigned_json();
        let decoded: WeeklyGrid = serde_json::from_value(grid).expect("decode");
        assert_eq!(decoded.cell(Day::Friday, TimeSlot::Break), &Period::break_period());
    }

    #[test]
    fn flags_map_onto_kinds() {
        let free = decode_period(
            TimeSlot::Third,
            serde_json::from_value(json!({ "subject": "", "isFree": true })).expect("json"),
        );
        assert_eq!(free, Period::free());

        let stray_break = decode_period(
            TimeSlot::Third,
            serde_json::from_value(json!({ "subject": "Break", "isBreak": true })).expect("json"),
        );
        assert_eq!(stray_break, Period::free());

        let assigned = decode_period(
            TimeSlot::Third,
            serde_json::from_value(json!({ "subject": "Art", "teacherId": "12" })).expect("json"),
        );
        assert_eq!(assigned.kind, PeriodKind::Assigned);
        assert_eq!(assigned.teacher_id, 12);
    }

    #[test]
    fn encoded_flags_follow_kind() {
        let v = serde_json::to_value(WeeklyGrid::initialized()).expect("encode");
        assert_eq!(v["Tuesday"]["11:00 - 11:30"]["isBreak"], json!(true));
        assert_eq!(v["Tuesday"]["11:00 - 11:30"]["subject"], json!("Break"));
        assert_eq!(v["Tuesday"]["08:00 - 08:45"]["isFree"], json!(true));
        assert_eq!(v["Tuesday"]["08:00 - 08:45"]["teacherId"], json!(0));
    }

    #[test]
    fn unusable_teacher_id_keeps_the_rest_of_the_grid() {
        let mut grid = serde_json::to_value(WeeklyGrid::initialized()).expect("encode");
        grid["Monday"]["08:00 - 08:45"] = assigned_json();
        grid["Monday"]["08:00 - 08:45"]["teacherId"] = json!("T7");
        grid["Tuesday"]["08:45 - 09:30"] = assigned_json();
        grid["Wednesday"]["09:30 - 10:15"] = assigned_json();
        grid["Wednesday"]["09:30 - 10:15"]["teacherId"] = json!({ "id": 7 });

        let decoded = decode_grid(&grid.to_string()).expect("decode");
        let monday = decoded.cell(Day::Monday, TimeSlot::First);
        assert_eq!(monday.kind, PeriodKind::Assigned);
        assert_eq!(monday.subject, "Math");
        assert_eq!(monday.teacher_id, 0);
        assert_eq!(decoded.cell(Day::Wednesday, TimeSlot::Third).teacher_id, 0);
        assert_eq!(decoded.cell(Day::Tuesday, TimeSlot::Second).teacher_id, 7);
    }
}
