use crate::directory::teachers_for_coordinator;
use crate::ipc::error::ok;
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

// Always answers ok: an unreachable directory is reported as a notice with an
// empty list so the grid stays usable.
fn handle_for_coordinator(state: &mut AppState, req: &Request) -> serde_json::Value {
    let employee_code = match required_str(req, "employeeCode") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let lookup = teachers_for_coordinator(state.directory.as_ref(), &employee_code);
    ok(
        &req.id,
        json!({
            "coordinator": lookup.coordinator,
            "teachers": lookup.teachers,
            "notice": lookup.notice,
            "unavailable": lookup.notice.is_some(),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "teachers.forCoordinator" => Some(handle_for_coordinator(state, req)),
        _ => None,
    }
}
