use serde_json::json;

use crate::timetable::TimetableError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

pub fn timetable_err(id: &str, e: &TimetableError) -> serde_json::Value {
    let details = match e {
        TimetableError::BreakPeriodImmutable { day, slot } => Some(json!({
            "day": day.name(),
            "slot": slot.label(),
        })),
        TimetableError::SnapshotNotFound(snapshot_id) => Some(json!({ "snapshotId": snapshot_id })),
        _ => None,
    };
    err(id, e.code(), e.to_string(), details)
}

/// Like [`timetable_err`], for requests that write: storage failures are
/// reported as `db_update_failed`.
pub fn timetable_write_err(id: &str, e: &TimetableError) -> serde_json::Value {
    match e {
        TimetableError::Persistence(_) => err(id, "db_update_failed", format!("{e:#}"), None),
        _ => timetable_err(id, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timetable::{Day, TimeSlot};

    #[test]
    fn storage_failures_on_writes_are_update_failures() {
        let failed = TimetableError::Persistence(anyhow::anyhow!("disk I/O error"));
        assert_eq!(timetable_err("1", &failed)["error"]["code"], "db_query_failed");
        let resp = timetable_write_err("1", &failed);
        assert_eq!(resp["error"]["code"], "db_update_failed");
        assert_eq!(resp["error"]["message"], "disk I/O error");

        let nothing = timetable_write_err("2", &TimetableError::NothingToSave);
        assert_eq!(nothing["error"]["code"], "nothing_to_save");

        let brk = timetable_write_err(
            "3",
            &TimetableError::BreakPeriodImmutable {
                day: Day::Monday,
                slot: TimeSlot::Break,
            },
        );
        assert_eq!(brk["error"]["details"]["slot"], "11:00 - 11:30");
    }
}
