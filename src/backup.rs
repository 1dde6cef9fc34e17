//! Time-table bundles: a zip carrying the default schedule, the snapshot
//! history and the timetable setup section of a workspace, each entry listed
//! with its SHA-256 in `manifest.json`.
//!
//! An import decodes its whole input before writing anything, then writes the
//! keys through the store in one transaction. The workspace database file is
//! never replaced.

use anyhow::{anyhow, bail, Context};
use rusqlite::{Connection, OpenFlags};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{info, warn};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::store::KeyValueStore;
use crate::timetable::{
    assigned_period_count, wire, Snapshot, WeeklyGrid, DEFAULT_SCHEDULE_KEY, HISTORY_KEY,
    SETUP_KEY,
};

const MANIFEST_ENTRY: &str = "manifest.json";
const DEFAULT_ENTRY: &str = "timetable/default.json";
const HISTORY_ENTRY: &str = "timetable/history.json";
const SETUP_ENTRY: &str = "setup/timetable.json";
pub const BUNDLE_FORMAT_V1: &str = "timetable-bundle-v1";
pub const RAW_SQLITE_FORMAT: &str = "raw-sqlite3";

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const SQLITE_MAGIC: &[u8] = b"SQLite format 3\0";

/// The time-table state of one workspace, decoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimetableBundle {
    pub default_schedule: Option<WeeklyGrid>,
    pub history: Vec<Snapshot>,
    pub setup: Option<Value>,
}

impl TimetableBundle {
    pub fn is_empty(&self) -> bool {
        self.default_schedule.is_none() && self.history.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
    pub assigned_period_count: Option<usize>,
    pub snapshot_count: usize,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub bundle_format_detected: String,
    pub has_default_schedule: bool,
    pub snapshot_count: usize,
}

pub fn collect_bundle(store: &dyn KeyValueStore) -> anyhow::Result<TimetableBundle> {
    let default_schedule = match store.get(DEFAULT_SCHEDULE_KEY)? {
        Some(text) => {
            Some(wire::decode_grid(&text).context("stored default schedule is unreadable")?)
        }
        None => None,
    };
    let history = match store.get(HISTORY_KEY)? {
        Some(text) => decode_history(text.as_bytes())?,
        None => Vec::new(),
    };
    let setup = match store.get(SETUP_KEY)? {
        Some(text) => Some(decode_setup(text.as_bytes())?),
        None => None,
    };
    Ok(TimetableBundle {
        default_schedule,
        history,
        setup,
    })
}

/// Writes `bundle` over the time-table keys of `store`. A bundle without a
/// default schedule removes the stored one; a bundle without setup leaves the
/// stored setup alone.
pub fn apply_bundle(store: &dyn KeyValueStore, bundle: &TimetableBundle) -> anyhow::Result<()> {
    match &bundle.default_schedule {
        Some(grid) => store.put(DEFAULT_SCHEDULE_KEY, &wire::encode_grid(grid)?)?,
        None => store.remove(DEFAULT_SCHEDULE_KEY)?,
    }
    store.put(HISTORY_KEY, &serde_json::to_string(&bundle.history)?)?;
    if let Some(setup) = &bundle.setup {
        store.put(SETUP_KEY, &serde_json::to_string(setup)?)?;
    }
    Ok(())
}

pub fn export_bundle(store: &dyn KeyValueStore, out_path: &Path) -> anyhow::Result<ExportSummary> {
    let bundle = collect_bundle(store)?;
    if bundle.is_empty() {
        bail!("workspace has no saved schedule or snapshots to export");
    }

    let mut entries: Vec<(&str, Vec<u8>)> = Vec::new();
    if let Some(grid) = &bundle.default_schedule {
        entries.push((DEFAULT_ENTRY, wire::encode_grid(grid)?.into_bytes()));
    }
    entries.push((HISTORY_ENTRY, serde_json::to_vec(&bundle.history)?));
    if let Some(setup) = &bundle.setup {
        entries.push((SETUP_ENTRY, serde_json::to_vec(setup)?));
    }

    let checksums: Map<String, Value> = entries
        .iter()
        .map(|(name, bytes)| (name.to_string(), Value::String(sha256_hex(bytes))))
        .collect();
    let assigned = bundle.default_schedule.as_ref().map(assigned_period_count);
    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": chrono::Utc::now().to_rfc3339(),
        "assignedPeriodCount": assigned,
        "snapshotCount": bundle.history.len(),
        "entries": checksums,
    });

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    let out_file = File::create(out_path)
        .with_context(|| format!("failed to create output file {}", out_path.display()))?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(serde_json::to_string_pretty(&manifest)?.as_bytes())
        .context("failed to write manifest entry")?;
    for (name, bytes) in &entries {
        zip.start_file(*name, opts)
            .with_context(|| format!("failed to start {} entry", name))?;
        zip.write_all(bytes)
            .with_context(|| format!("failed to write {} entry", name))?;
    }
    zip.finish().context("failed to finalize zip bundle")?;

    info!(
        out = %out_path.display(),
        snapshots = bundle.history.len(),
        "exported timetable bundle"
    );
    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        entry_count: entries.len() + 1,
        assigned_period_count: assigned,
        snapshot_count: bundle.history.len(),
    })
}

/// Decodes a bundle zip or a workspace sqlite file. Any other input is
/// rejected.
pub fn read_bundle(in_path: &Path) -> anyhow::Result<(TimetableBundle, &'static str)> {
    let mut head = Vec::with_capacity(SQLITE_MAGIC.len());
    File::open(in_path)
        .with_context(|| format!("failed to open input file {}", in_path.display()))?
        .take(SQLITE_MAGIC.len() as u64)
        .read_to_end(&mut head)
        .context("failed to read file signature")?;

    if head.starts_with(ZIP_MAGIC) {
        Ok((read_zip_bundle(in_path)?, BUNDLE_FORMAT_V1))
    } else if head == SQLITE_MAGIC {
        Ok((read_sqlite_workspace(in_path)?, RAW_SQLITE_FORMAT))
    } else {
        bail!(
            "{} is neither a timetable bundle nor a SQLite workspace database",
            in_path.display()
        )
    }
}

/// Replaces the time-table keys in `conn` with the contents of `in_path`.
/// Nothing is written unless the whole input decodes.
pub fn import_bundle(in_path: &Path, conn: &Connection) -> anyhow::Result<ImportSummary> {
    let (bundle, format) = read_bundle(in_path)?;

    let tx = conn
        .unchecked_transaction()
        .context("failed to start import transaction")?;
    apply_bundle(&*tx, &bundle)?;
    tx.commit().context("failed to commit import")?;

    info!(
        source = %in_path.display(),
        format,
        snapshots = bundle.history.len(),
        "imported timetable bundle"
    );
    Ok(ImportSummary {
        bundle_format_detected: format.to_string(),
        has_default_schedule: bundle.default_schedule.is_some(),
        snapshot_count: bundle.history.len(),
    })
}

fn read_zip_bundle(in_path: &Path) -> anyhow::Result<TimetableBundle> {
    let file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.display()))?;
    let mut archive = ZipArchive::new(file).context("invalid zip archive")?;

    let manifest: Value = serde_json::from_slice(&read_entry(&mut archive, MANIFEST_ENTRY)?)
        .context("manifest.json is invalid JSON")?;
    let format = manifest
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if format != BUNDLE_FORMAT_V1 {
        bail!("unsupported bundle format: {}", format);
    }
    let checksums = manifest
        .get("entries")
        .and_then(|v| v.as_object())
        .ok_or_else(|| anyhow!("manifest.json has no entries map"))?;

    let mut verified: HashMap<&str, Vec<u8>> = HashMap::new();
    for (name, expected) in checksums {
        let expected = expected
            .as_str()
            .ok_or_else(|| anyhow!("checksum for {} is not a string", name))?;
        let bytes = read_entry(&mut archive, name)?;
        let actual = sha256_hex(&bytes);
        if !actual.eq_ignore_ascii_case(expected) {
            bail!(
                "checksum mismatch for {} (manifest {}, bundle {})",
                name,
                expected,
                actual
            );
        }
        verified.insert(name.as_str(), bytes);
    }

    let default_schedule = match verified.remove(DEFAULT_ENTRY) {
        Some(bytes) => Some(
            serde_json::from_slice::<WeeklyGrid>(&bytes)
                .context("default schedule entry is unreadable")?,
        ),
        None => None,
    };
    let history = match verified.remove(HISTORY_ENTRY) {
        Some(bytes) => decode_history(&bytes)?,
        None => bail!("bundle missing {}", HISTORY_ENTRY),
    };
    let setup = match verified.remove(SETUP_ENTRY) {
        Some(bytes) => Some(decode_setup(&bytes)?),
        None => None,
    };
    for name in verified.keys() {
        warn!(entry = %name, "ignoring unknown bundle entry");
    }

    Ok(TimetableBundle {
        default_schedule,
        history,
        setup,
    })
}

fn read_sqlite_workspace(in_path: &Path) -> anyhow::Result<TimetableBundle> {
    let conn = Connection::open_with_flags(in_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("failed to open {}", in_path.display()))?;
    collect_bundle(&conn)
        .with_context(|| format!("{} is not a timetable workspace", in_path.display()))
}

fn read_entry(archive: &mut ZipArchive<File>, name: &str) -> anyhow::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    archive
        .by_name(name)
        .with_context(|| format!("bundle missing {}", name))?
        .read_to_end(&mut bytes)
        .with_context(|| format!("failed to read {}", name))?;
    Ok(bytes)
}

fn decode_history(bytes: &[u8]) -> anyhow::Result<Vec<Snapshot>> {
    serde_json::from_slice(bytes).context("snapshot history is unreadable")
}

fn decode_setup(bytes: &[u8]) -> anyhow::Result<Value> {
    let setup: Value = serde_json::from_slice(bytes).context("timetable setup is unreadable")?;
    if !setup.is_object() {
        bail!("timetable setup must be a JSON object");
    }
    Ok(setup)
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
