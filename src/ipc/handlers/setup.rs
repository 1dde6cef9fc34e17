use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::db_conn;
use crate::ipc::types::{AppState, Request};
use crate::timetable::{AssignDefaults, SETUP_KEY};
use rusqlite::Connection;
use serde_json::{json, Map, Value};

const FIELD_MAX_LEN: usize = 40;

#[derive(Clone, Copy)]
enum SetupSection {
    Timetable,
}

impl SetupSection {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "timetable" => Some(Self::Timetable),
            _ => None,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Timetable => SETUP_KEY,
        }
    }
}

fn default_section(section: SetupSection) -> Value {
    match section {
        SetupSection::Timetable => {
            let d = AssignDefaults::default();
            json!({
                "defaultSection": d.section,
                "defaultGrade": d.grade
            })
        }
    }
}

fn parse_label(v: &Value, key: &str) -> Result<String, String> {
    let s = v.as_str().ok_or_else(|| format!("{} must be string", key))?;
    let s = s.trim();
    if s.is_empty() {
        return Err(format!("{} must not be empty", key));
    }
    if s.chars().count() > FIELD_MAX_LEN {
        return Err(format!("{} length must be <= {}", key, FIELD_MAX_LEN));
    }
    Ok(s.to_string())
}

fn merge_section_patch(
    section: SetupSection,
    current: &mut Value,
    patch: &Map<String, Value>,
) -> Result<(), String> {
    let obj = current
        .as_object_mut()
        .ok_or_else(|| "internal setup object must be a JSON object".to_string())?;
    for (k, v) in patch {
        match section {
            SetupSection::Timetable => match k.as_str() {
                "defaultSection" | "defaultGrade" => {
                    obj.insert(k.clone(), Value::String(parse_label(v, k)?));
                }
                _ => return Err(format!("unknown timetable field: {}", k)),
            },
        }
    }
    Ok(())
}

fn load_section(conn: &Connection, section: SetupSection) -> anyhow::Result<Value> {
    let mut current = default_section(section);
    if let Some(saved) = db::settings_get_json(conn, section.key())? {
        if let Some(saved_obj) = saved.as_object() {
            // Apply field by field so one bad historical value does not hide the rest.
            for (k, v) in saved_obj {
                let mut single = Map::new();
                single.insert(k.clone(), v.clone());
                let _ = merge_section_patch(section, &mut current, &single);
            }
        }
    }
    Ok(current)
}

fn assign_defaults_from(section: &Value) -> AssignDefaults {
    let fallback = AssignDefaults::default();
    let pick = |key: &str, default: String| {
        section
            .get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or(default)
    };
    AssignDefaults {
        section: pick("defaultSection", fallback.section),
        grade: pick("defaultGrade", fallback.grade),
    }
}

/// Pre-fill values for new assignments in this workspace. Falls back to the
/// built-in defaults when the setting cannot be read.
pub fn load_assign_defaults(conn: &Connection) -> AssignDefaults {
    match load_section(conn, SetupSection::Timetable) {
        Ok(v) => assign_defaults_from(&v),
        Err(e) => {
            tracing::warn!("failed to read timetable setup: {:#}", e);
            AssignDefaults::default()
        }
    }
}

fn handle_setup_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(&state.db, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let timetable = match load_section(conn, SetupSection::Timetable) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    ok(&req.id, json!({ "timetable": timetable }))
}

fn handle_setup_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(&state.db, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let Some(section_raw) = req.params.get("section").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing section", None);
    };
    let Some(section) = SetupSection::parse(section_raw) else {
        return err(&req.id, "bad_params", "unknown section", None);
    };
    let Some(patch_obj) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };

    let mut current = match load_section(conn, section) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    if let Err(msg) = merge_section_patch(section, &mut current, patch_obj) {
        return err(&req.id, "bad_params", msg, None);
    }
    if let Err(e) = db::settings_set_json(conn, section.key(), &current) {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }

    match section {
        SetupSection::Timetable => state.engine.set_defaults(assign_defaults_from(&current)),
    }
    ok(&req.id, json!({ "ok": true, "timetable": current }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "setup.get" => Some(handle_setup_get(state, req)),
        "setup.update" => Some(handle_setup_update(state, req)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_saved_fields_fall_back_individually() {
        let dir = tempfile::tempdir().expect("tempdir");
        let conn = db::open_db(dir.path()).expect("open db");
        db::settings_set_json(
            &conn,
            "setup.timetable",
            &json!({ "defaultSection": "B", "defaultGrade": 3, "legacy": true }),
        )
        .expect("seed");

        let d = load_assign_defaults(&conn);
        assert_eq!(d.section, "B");
        assert_eq!(d.grade, "Grade 1");
    }

    #[test]
    fn patch_validation() {
        let mut current = default_section(SetupSection::Timetable);
        let bad: Map<String, Value> = serde_json::from_value(json!({ "defaultGrade": "  " }))
            .expect("map");
        assert!(merge_section_patch(SetupSection::Timetable, &mut current, &bad).is_err());

        let unknown: Map<String, Value> =
            serde_json::from_value(json!({ "room": "B4" })).expect("map");
        assert!(merge_section_patch(SetupSection::Timetable, &mut current, &unknown).is_err());

        let good: Map<String, Value> =
            serde_json::from_value(json!({ "defaultGrade": " Grade 2 " })).expect("map");
        merge_section_patch(SetupSection::Timetable, &mut current, &good).expect("merge");
        assert_eq!(current["defaultGrade"], "Grade 2");
    }
}
