use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

use crate::directory::TeacherDirectory;
use crate::timetable::TimeTableEngine;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub engine: TimeTableEngine,
    pub directory: Box<dyn TeacherDirectory>,
}

impl AppState {
    pub fn new(directory: Box<dyn TeacherDirectory>) -> Self {
        AppState {
            workspace: None,
            db: None,
            engine: TimeTableEngine::default(),
            directory,
        }
    }
}
