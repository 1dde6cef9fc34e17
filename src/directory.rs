//! Teacher lookups against the school backend.
//!
//! List endpoints answer with a bare array, `{ "teachers": [...] }` or
//! `{ "results": [...] }` depending on pagination settings; all three are
//! accepted.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::timetable::{Coordinator, Teacher};

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),

    #[error("no coordinator with employee code '{0}'")]
    CoordinatorNotFound(String),
}

pub trait TeacherDirectory {
    fn resolve_coordinator_by_code(
        &self,
        employee_code: &str,
    ) -> Result<Option<Coordinator>, DirectoryError>;

    fn list_teachers_for_coordinator(
        &self,
        coordinator_id: i64,
    ) -> Result<Vec<Teacher>, DirectoryError>;
}

/// Result of the fail-open lookup handed to the UI.
#[derive(Debug, Clone, Default)]
pub struct TeacherLookup {
    pub coordinator: Option<Coordinator>,
    pub teachers: Vec<Teacher>,
    pub notice: Option<String>,
}

/// Teachers scoped to the coordinator with `employee_code`. Any failure
/// degrades to an empty list plus a notice; the grid stays usable without it.
pub fn teachers_for_coordinator(
    directory: &dyn TeacherDirectory,
    employee_code: &str,
) -> TeacherLookup {
    let result = directory
        .resolve_coordinator_by_code(employee_code)
        .and_then(|c| c.ok_or_else(|| DirectoryError::CoordinatorNotFound(employee_code.to_string())))
        .and_then(|c| {
            let teachers = directory.list_teachers_for_coordinator(c.id)?;
            Ok((c, teachers))
        });

    match result {
        Ok((coordinator, teachers)) => {
            debug!(
                coordinator_id = coordinator.id,
                count = teachers.len(),
                "loaded teachers"
            );
            TeacherLookup {
                coordinator: Some(coordinator),
                teachers,
                notice: None,
            }
        }
        Err(e) => {
            warn!(employee_code, "teacher directory unavailable: {}", e);
            TeacherLookup {
                coordinator: None,
                teachers: Vec::new(),
                notice: Some(format!(
                    "Could not load teachers ({}). You can still fill periods manually; try again later.",
                    e
                )),
            }
        }
    }
}

pub fn normalize_list<T: DeserializeOwned>(body: Value) -> Result<Vec<T>, DirectoryError> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("teachers").or_else(|| obj.remove("results")) {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(DirectoryError::UnexpectedShape(
                    "object without a teachers/results array".to_string(),
                ))
            }
        },
        other => {
            return Err(DirectoryError::UnexpectedShape(format!(
                "expected array or object, got {}",
                json_kind(&other)
            )))
        }
    };
    items
        .into_iter()
        .map(|v| serde_json::from_value(v).map_err(|e| DirectoryError::UnexpectedShape(e.to_string())))
        .collect()
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub struct HttpTeacherDirectory {
    client: reqwest::blocking::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpTeacherDirectory {
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(HttpTeacherDirectory {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, DirectoryError> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.get(&url).query(query);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let resp = req.send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DirectoryError::Status {
                url,
                status: status.as_u16(),
            });
        }
        Ok(resp.json()?)
    }
}

impl TeacherDirectory for HttpTeacherDirectory {
    fn resolve_coordinator_by_code(
        &self,
        employee_code: &str,
    ) -> Result<Option<Coordinator>, DirectoryError> {
        let code = employee_code.trim();
        let body = self.get_json("/coordinators/", &[("employee_code", code)])?;
        let coordinators: Vec<Coordinator> = match body {
            Value::Object(ref obj) if obj.contains_key("coordinators") => {
                normalize_list(obj.get("coordinators").cloned().unwrap_or(Value::Null))?
            }
            other => normalize_list(other)?,
        };
        Ok(coordinators
            .into_iter()
            .find(|c| c.employee_code.trim().eq_ignore_ascii_case(code)))
    }

    fn list_teachers_for_coordinator(
        &self,
        coordinator_id: i64,
    ) -> Result<Vec<Teacher>, DirectoryError> {
        let body = self.get_json(&format!("/coordinators/{}/teachers/", coordinator_id), &[])?;
        normalize_list(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    fn teacher_json(id: i64) -> Value {
        json!({
            "id": id,
            "full_name": "Ali Khan",
            "employee_code": "T001",
            "current_subjects": "Math",
            "current_classes_taught": "Grade 3",
            "email": null
        })
    }

    #[test]
    fn normalizes_all_three_shapes() {
        let bare: Vec<Teacher> = normalize_list(json!([teacher_json(1)])).expect("bare");
        let wrapped: Vec<Teacher> =
            normalize_list(json!({ "teachers": [teacher_json(2)] })).expect("teachers");
        let paged: Vec<Teacher> =
            normalize_list(json!({ "count": 1, "results": [teacher_json(3)] })).expect("results");
        assert_eq!(bare[0].id, 1);
        assert_eq!(wrapped[0].id, 2);
        assert_eq!(paged[0].id, 3);
        assert_eq!(paged[0].email, "");
    }

    #[test]
    fn rejects_other_shapes() {
        assert!(matches!(
            normalize_list::<Teacher>(json!({ "detail": "nope" })),
            Err(DirectoryError::UnexpectedShape(_))
        ));
        assert!(matches!(
            normalize_list::<Teacher>(json!("teachers")),
            Err(DirectoryError::UnexpectedShape(_))
        ));
    }

    struct FakeDirectory {
        coordinator: Option<Coordinator>,
        fail_listing: bool,
        list_calls: Cell<usize>,
    }

    impl TeacherDirectory for FakeDirectory {
        fn resolve_coordinator_by_code(
            &self,
            _employee_code: &str,
        ) -> Result<Option<Coordinator>, DirectoryError> {
            Ok(self.coordinator.clone())
        }

        fn list_teachers_for_coordinator(
            &self,
            coordinator_id: i64,
        ) -> Result<Vec<Teacher>, DirectoryError> {
            self.list_calls.set(self.list_calls.get() + 1);
            if self.fail_listing {
                return Err(DirectoryError::Status {
                    url: format!("/coordinators/{}/teachers/", coordinator_id),
                    status: 503,
                });
            }
            normalize_list(json!([teacher_json(9)]))
        }
    }

    fn coordinator() -> Coordinator {
        Coordinator {
            id: 4,
            full_name: "Nadia Rahman".into(),
            employee_code: "C010".into(),
        }
    }

    #[test]
    fn lookup_returns_teachers() {
        let dir = FakeDirectory {
            coordinator: Some(coordinator()),
            fail_listing: false,
            list_calls: Cell::new(0),
        };
        let lookup = teachers_for_coordinator(&dir, "C010");
        assert_eq!(lookup.teachers.len(), 1);
        assert!(lookup.notice.is_none());
        assert_eq!(lookup.coordinator.map(|c| c.id), Some(4));
    }

    #[test]
    fn lookup_fails_open() {
        let unknown = FakeDirectory {
            coordinator: None,
            fail_listing: false,
            list_calls: Cell::new(0),
        };
        let lookup = teachers_for_coordinator(&unknown, "C999");
        assert!(lookup.teachers.is_empty());
        assert!(lookup.notice.is_some());
        assert_eq!(unknown.list_calls.get(), 0);

        let failing = FakeDirectory {
            coordinator: Some(coordinator()),
            fail_listing: true,
            list_calls: Cell::new(0),
        };
        let lookup = teachers_for_coordinator(&failing, "C010");
        assert!(lookup.teachers.is_empty());
        assert!(lookup.notice.expect("notice").contains("503"));
        assert_eq!(failing.list_calls.get(), 1);
    }

    #[test]
    fn unreachable_backend_fails_open() {
        let dir = HttpTeacherDirectory::new("http://127.0.0.1:9/api", None, Duration::from_secs(2))
            .expect("client");
        let lookup = teachers_for_coordinator(&dir, "C010");
        assert!(lookup.teachers.is_empty());
        assert!(lookup.notice.is_some());
    }
}
