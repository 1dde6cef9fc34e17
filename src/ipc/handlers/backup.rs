use crate::backup;
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::core::load_engine;
use crate::ipc::helpers::db_conn;
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn path_param(req: &Request, key: &str) -> Result<PathBuf, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

fn handle_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(&state.db, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let out_path = match path_param(req, "outPath") {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    match backup::export_bundle(conn, &out_path) {
        Ok(summary) => ok(
            &req.id,
            json!({
                "bundleFormat": summary.bundle_format,
                "entryCount": summary.entry_count,
                "assignedPeriodCount": summary.assigned_period_count,
                "snapshotCount": summary.snapshot_count,
                "outPath": out_path.to_string_lossy(),
            }),
        ),
        Err(e) => err(&req.id, "backup_export_failed", format!("{e:#}"), None),
    }
}

// The session is only rebuilt after a successful import; a rejected input
// leaves the live grid and selection untouched.
fn handle_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(&state.db, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let in_path = match path_param(req, "inPath") {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let summary = match backup::import_bundle(&in_path, conn) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(source = %in_path.display(), "import rejected: {:#}", e);
            return err(&req.id, "backup_import_failed", format!("{e:#}"), None);
        }
    };

    let (engine, loaded_default) = load_engine(conn);
    state.engine = engine;
    ok(
        &req.id,
        json!({
            "bundleFormatDetected": summary.bundle_format_detected,
            "hasDefaultSchedule": summary.has_default_schedule,
            "snapshotCount": summary.snapshot_count,
            "loadedDefault": loaded_default,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "backup.exportWorkspaceBundle" => Some(handle_export(state, req)),
        "backup.importWorkspaceBundle" => Some(handle_import(state, req)),
        _ => None,
    }
}
