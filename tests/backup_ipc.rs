mod test_support;

use serde_json::json;
use test_support::spawn_sidecar;

fn draft(subject: &str) -> serde_json::Value {
    json!({
        "subject": subject,
        "teacherName": "Ali Khan - T001",
        "teacherId": 7,
        "section": "A",
        "grade": "Grade 3"
    })
}

fn teacher() -> serde_json::Value {
    json!({
        "id": 7,
        "fullName": "Ali Khan",
        "employeeCode": "T001"
    })
}

#[test]
fn failed_import_keeps_the_live_session() {
    let workspace = tempfile::tempdir().expect("workspace");
    let mut sidecar = spawn_sidecar();
    sidecar.request_ok(
        "workspace.select",
        json!({ "path": workspace.path().to_string_lossy() }),
    );
    sidecar.request_ok("timetable.selectTeacher", json!({ "teacher": teacher() }));
    sidecar.request_ok(
        "timetable.commitAssign",
        json!({ "day": "Monday", "slot": "08:00 - 08:45", "draft": draft("Math") }),
    );

    let missing = workspace.path().join("does-not-exist.zip");
    assert_eq!(
        sidecar.request_err(
            "backup.importWorkspaceBundle",
            json!({ "inPath": missing.to_string_lossy() }),
        ),
        "backup_import_failed"
    );

    let state = sidecar.request_ok("timetable.get", json!({}));
    assert_eq!(state["grid"]["Monday"]["08:00 - 08:45"]["subject"], "Math");
    assert_eq!(state["grid"]["Monday"]["08:00 - 08:45"]["isFree"], false);
    assert_eq!(state["selectedTeacher"]["id"], 7);
}

#[test]
fn non_database_file_is_rejected_and_workspace_stays_usable() {
    let workspace = tempfile::tempdir().expect("workspace");
    let path = workspace.path().to_string_lossy().to_string();
    let mut sidecar = spawn_sidecar();
    sidecar.request_ok("workspace.select", json!({ "path": path }));
    sidecar.request_ok(
        "timetable.commitAssign",
        json!({ "day": "Thursday", "slot": "13:00 - 13:45", "draft": draft("Geography") }),
    );
    sidecar.request_ok("timetable.save", json!({}));

    let text_file = workspace.path().join("notes.txt");
    std::fs::write(&text_file, "not a timetable").expect("write text file");
    let resp = sidecar.request(
        "backup.importWorkspaceBundle",
        json!({ "inPath": text_file.to_string_lossy() }),
    );
    assert_eq!(resp["ok"], false);
    assert_eq!(resp["error"]["code"], "backup_import_failed");

    let state = sidecar.request_ok("timetable.loadDefault", json!({}));
    assert_eq!(state["grid"]["Thursday"]["13:00 - 13:45"]["subject"], "Geography");
    let snapshots = sidecar.request_ok("timetable.snapshots.list", json!({}));
    assert_eq!(snapshots["snapshots"].as_array().map(|s| s.len()), Some(1));

    drop(sidecar);
    let mut reopened = spawn_sidecar();
    let opened = reopened.request_ok("workspace.select", json!({ "path": path }));
    assert_eq!(opened["loadedDefault"], true);
    assert_eq!(opened["snapshotCount"], 1);
}

#[test]
fn import_into_another_workspace_rebuilds_the_session() {
    let source = tempfile::tempdir().expect("source");
    let target = tempfile::tempdir().expect("target");
    let bundle = source.path().join("export").join("week.ttbundle.zip");

    let mut sidecar = spawn_sidecar();
    assert_eq!(
        sidecar.request_err(
            "backup.exportWorkspaceBundle",
            json!({ "outPath": bundle.to_string_lossy() }),
        ),
        "no_workspace"
    );

    sidecar.request_ok(
        "workspace.select",
        json!({ "path": source.path().to_string_lossy() }),
    );
    assert_eq!(
        sidecar.request_err(
            "backup.exportWorkspaceBundle",
            json!({ "outPath": bundle.to_string_lossy() }),
        ),
        "backup_export_failed"
    );
    sidecar.request_ok(
        "timetable.commitAssign",
        json!({ "day": "Friday", "slot": "11:30 - 12:15", "draft": draft("Biology") }),
    );
    sidecar.request_ok("timetable.save", json!({}));
    let exported = sidecar.request_ok(
        "backup.exportWorkspaceBundle",
        json!({ "outPath": bundle.to_string_lossy() }),
    );
    assert_eq!(exported["bundleFormat"], "timetable-bundle-v1");
    assert_eq!(exported["assignedPeriodCount"], 1);

    sidecar.request_ok(
        "workspace.select",
        json!({ "path": target.path().to_string_lossy() }),
    );
    sidecar.request_ok(
        "timetable.commitAssign",
        json!({ "day": "Monday", "slot": "08:00 - 08:45", "draft": draft("Math") }),
    );
    let imported = sidecar.request_ok(
        "backup.importWorkspaceBundle",
        json!({ "inPath": bundle.to_string_lossy() }),
    );
    assert_eq!(imported["bundleFormatDetected"], "timetable-bundle-v1");
    assert_eq!(imported["loadedDefault"], true);
    assert_eq!(imported["snapshotCount"], 1);

    let state = sidecar.request_ok("timetable.get", json!({}));
    assert_eq!(state["grid"]["Friday"]["11:30 - 12:15"]["subject"], "Biology");
    assert_eq!(state["grid"]["Monday"]["08:00 - 08:45"]["isFree"], true);
    assert_eq!(state["snapshotCount"], 1);
}
