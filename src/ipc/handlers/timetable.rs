use crate::ipc::error::{err, ok, timetable_err, timetable_write_err};
use crate::ipc::helpers::{day_and_slot, db_conn, required_str};
use crate::ipc::types::{AppState, Request};
use crate::timetable::{
    has_useful_content, Day, Period, PeriodDraft, Snapshot, Teacher, TimeSlot, TimeTableEngine,
};
use serde_json::json;

fn period_json(p: &Period) -> serde_json::Value {
    json!({
        "subject": p.subject,
        "teacher": p.teacher_name,
        "teacherId": p.teacher_id,
        "section": p.section,
        "grade": p.grade,
        "kind": p.kind,
    })
}

fn snapshot_json(s: &Snapshot) -> serde_json::Value {
    json!({
        "id": s.id,
        "timestamp": s.timestamp,
        "assignedPeriodCount": s.assigned_period_count,
        "grid": s.grid,
    })
}

fn state_json(engine: &TimeTableEngine) -> serde_json::Value {
    let open_draft = engine.open_draft().map(|d| {
        json!({
            "day": d.day.name(),
            "slot": d.slot.label(),
            "draft": d.draft,
        })
    });
    json!({
        "days": Day::ALL.map(Day::name),
        "slots": TimeSlot::ALL.map(TimeSlot::label),
        "breakSlot": TimeSlot::Break.label(),
        "grid": engine.grid(),
        "canSave": has_useful_content(engine.grid()),
        "selectedTeacher": engine.selected_teacher(),
        "openDraft": open_draft,
        "snapshotCount": engine.snapshots().len(),
    })
}

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, state_json(&state.engine))
}

fn handle_initialize(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.engine.initialize();
    ok(&req.id, state_json(&state.engine))
}

fn handle_select_teacher(state: &mut AppState, req: &Request) -> serde_json::Value {
    let teacher = match req.params.get("teacher") {
        None | Some(serde_json::Value::Null) => None,
        Some(v) => match serde_json::from_value::<Teacher>(v.clone()) {
            Ok(t) => Some(t),
            Err(e) => {
                return err(
                    &req.id,
                    "bad_params",
                    format!("invalid teacher: {}", e),
                    None,
                )
            }
        },
    };
    state.engine.select_teacher(teacher);
    ok(
        &req.id,
        json!({ "selectedTeacher": state.engine.selected_teacher() }),
    )
}

fn handle_begin_assign(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (day, slot) = match day_and_slot(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match state.engine.begin_assign(day, slot) {
        Ok(draft) => ok(
            &req.id,
            json!({ "day": day.name(), "slot": slot.label(), "draft": draft }),
        ),
        Err(e) => timetable_err(&req.id, &e),
    }
}

fn handle_commit_assign(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (day, slot) = match day_and_slot(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let draft = match req.params.get("draft") {
        Some(v) if v.is_object() => match serde_json::from_value::<PeriodDraft>(v.clone()) {
            Ok(d) => d,
            Err(e) => {
                return err(
                    &req.id,
                    "bad_params",
                    format!("invalid draft: {}", e),
                    None,
                )
            }
        },
        _ => return err(&req.id, "bad_params", "draft must be an object", None),
    };
    match state.engine.commit_assign(day, slot, draft) {
        Ok(cell) => ok(
            &req.id,
            json!({ "day": day.name(), "slot": slot.label(), "period": period_json(cell) }),
        ),
        Err(e) => timetable_err(&req.id, &e),
    }
}

fn handle_clear_cell(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (day, slot) = match day_and_slot(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match state.engine.clear_cell(day, slot) {
        Ok(()) => ok(
            &req.id,
            json!({
                "day": day.name(),
                "slot": slot.label(),
                "period": period_json(state.engine.cell(day, slot)),
            }),
        ),
        Err(e) => timetable_err(&req.id, &e),
    }
}

fn handle_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(&state.db, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let snapshot = match state.engine.save_snapshot(conn) {
        Ok(s) => snapshot_json(s),
        Err(e) => return timetable_write_err(&req.id, &e),
    };
    ok(
        &req.id,
        json!({ "snapshot": snapshot, "state": state_json(&state.engine) }),
    )
}

fn handle_load_default(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(&state.db, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match state.engine.load_default_schedule(conn) {
        Ok(()) => ok(&req.id, state_json(&state.engine)),
        Err(e) => timetable_err(&req.id, &e),
    }
}

fn handle_snapshots_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let snapshots: Vec<_> = state.engine.snapshots().iter().map(snapshot_json).collect();
    ok(&req.id, json!({ "snapshots": snapshots }))
}

fn handle_snapshots_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    let snapshot_id = match required_str(req, "snapshotId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match state.engine.load_snapshot(&snapshot_id) {
        Ok(()) => ok(&req.id, state_json(&state.engine)),
        Err(e) => timetable_err(&req.id, &e),
    }
}

fn handle_snapshots_remove(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(&state.db, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let snapshot_id = match required_str(req, "snapshotId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let removed = state.engine.remove_snapshot(&snapshot_id, conn);
    ok(
        &req.id,
        json!({ "removed": removed, "snapshotCount": state.engine.snapshots().len() }),
    )
}

fn handle_clear_all(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(&state.db, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match state.engine.clear_all(conn) {
        Ok(()) => ok(&req.id, state_json(&state.engine)),
        Err(e) => timetable_write_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "timetable.get" => Some(handle_get(state, req)),
        "timetable.initialize" => Some(handle_initialize(state, req)),
        "timetable.selectTeacher" => Some(handle_select_teacher(state, req)),
        "timetable.beginAssign" => Some(handle_begin_assign(state, req)),
        "timetable.commitAssign" => Some(handle_commit_assign(state, req)),
        "timetable.clearCell" => Some(handle_clear_cell(state, req)),
        "timetable.save" => Some(handle_save(state, req)),
        "timetable.loadDefault" => Some(handle_load_default(state, req)),
        "timetable.snapshots.list" => Some(handle_snapshots_list(state, req)),
        "timetable.snapshots.load" => Some(handle_snapshots_load(state, req)),
        "timetable.snapshots.remove" => Some(handle_snapshots_remove(state, req)),
        "timetable.clearAll" => Some(handle_clear_all(state, req)),
        _ => None,
    }
}
