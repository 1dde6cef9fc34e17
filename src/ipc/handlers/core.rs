use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::setup::load_assign_defaults;
use crate::ipc::types::{AppState, Request};
use crate::timetable::{TimeTableEngine, TimetableError};
use rusqlite::Connection;
use serde_json::json;
use std::path::{Path, PathBuf};

/// Builds an engine from a workspace store: setup defaults, snapshot history,
/// then the default schedule if one exists. Returns whether a default loaded.
pub fn load_engine(conn: &Connection) -> (TimeTableEngine, bool) {
    let mut engine = TimeTableEngine::new(load_assign_defaults(conn));
    engine.restore_history(conn);
    let loaded_default = match engine.load_default_schedule(conn) {
        Ok(()) => true,
        Err(TimetableError::NoSavedSchedule) => false,
        // A broken default must not keep the workspace from opening.
        Err(e) => {
            tracing::warn!("could not load default schedule: {}", e);
            engine.initialize();
            false
        }
    };
    (engine, loaded_default)
}

/// Opens (or creates) the workspace database and rebuilds the engine from it.
pub fn open_workspace(state: &mut AppState, path: &Path) -> anyhow::Result<bool> {
    let conn = db::open_db(path)?;
    let (engine, loaded_default) = load_engine(&conn);

    tracing::info!(
        workspace = %path.display(),
        loaded_default,
        snapshots = engine.snapshots().len(),
        "workspace opened"
    );
    state.engine = engine;
    state.workspace = Some(path.to_path_buf());
    state.db = Some(conn);
    Ok(loaded_default)
}

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match open_workspace(state, &path) {
        Ok(loaded_default) => ok(
            &req.id,
            json!({
                "workspacePath": path.to_string_lossy(),
                "loadedDefault": loaded_default,
                "snapshotCount": state.engine.snapshots().len(),
            }),
        ),
        Err(e) => err(&req.id, "db_open_failed", format!("{e:?}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
