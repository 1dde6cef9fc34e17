//! Time-table sidecar for the school management UI.
//!
//! ```text
//! lib.rs
//! ├── timetable/   – grid model, storage shape, editing engine
//! ├── store        – key-value persistence used by the engine
//! ├── db           – workspace sqlite (settings table)
//! ├── directory    – teacher lookups against the school backend
//! ├── backup       – time-table bundles (export/import)
//! ├── config       – process flags
//! └── ipc/         – JSON-lines request routing
//! ```

pub mod backup;
pub mod config;
pub mod db;
pub mod directory;
pub mod ipc;
pub mod store;
pub mod timetable;
