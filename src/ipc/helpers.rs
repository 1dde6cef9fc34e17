use rusqlite::Connection;
use serde_json::json;

use crate::ipc::error::err;
use crate::ipc::types::Request;
use crate::timetable::{Day, TimeSlot};

pub fn db_conn<'a>(
    db: &'a Option<Connection>,
    req: &Request,
) -> Result<&'a Connection, serde_json::Value> {
    db.as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn day_and_slot(req: &Request) -> Result<(Day, TimeSlot), serde_json::Value> {
    let day_raw = required_str(req, "day")?;
    let slot_raw = required_str(req, "slot")?;
    let Some(day) = Day::parse(&day_raw) else {
        return Err(err(
            &req.id,
            "bad_params",
            format!("unknown day: {}", day_raw),
            Some(json!({ "days": Day::ALL.map(Day::name) })),
        ));
    };
    let Some(slot) = TimeSlot::parse(&slot_raw) else {
        return Err(err(
            &req.id,
            "bad_params",
            format!("unknown time slot: {}", slot_raw),
            Some(json!({ "slots": TimeSlot::ALL.map(TimeSlot::label) })),
        ));
    };
    Ok((day, slot))
}
