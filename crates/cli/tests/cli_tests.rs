// Integration tests for the `collecteur` binary.
//
// stdout from --json commands must be exactly one JSON value; logs and the
// human summary go to stderr.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use rusqlite::Connection;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

/// Runs with a settings path that does not exist, so user settings never leak in.
fn collecteur(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_collecteur"));
    cmd.arg("--config").arg(dir.join("no-settings.toml"));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn seeded_db(dir: &Path) -> PathBuf {
    let db = dir.join("actes.db");
    let out = collecteur(dir).arg("init-db").arg(&db).output().unwrap();
    assert!(out.status.success(), "init-db failed: {}", String::from_utf8_lossy(&out.stderr));

    let conn = Connection::open(&db).unwrap();
    conn.execute_batch(
        "INSERT INTO oc_intervention VALUES ('INT1', 'D100', 'VN1');
         INSERT INTO o_venue VALUES ('VN1', 'V200');
         INSERT INTO oc_actengap VALUES ('1', 'C', 1.5, 'INT1', '2025-01-01 09:00:00');
         INSERT INTO oc_acteccam VALUES ('2', 'ABC', '1', 'INT1', '2025-01-02 10:30:00');
         INSERT INTO oc_acteccam VALUES ('3', 'XYZ', '1', 'INT1', '2025-01-02 12:00:00');
         INSERT INTO w_serveracte VALUES ('C9', 'D300', 'V300');",
    )
    .unwrap();
    db
}

fn assert_single_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let trimmed = stdout.trim();
    assert!(!trimmed.is_empty(), "stdout should not be empty\nstderr: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_str(trimmed)
        .unwrap_or_else(|e| panic!("stdout must be one JSON value: {e}\nstdout:\n{trimmed}"))
}

// ===========================================================================
// check
// ===========================================================================

#[test]
fn check_json_reports_missing_acts() {
    let dir = tempfile::tempdir().unwrap();
    let db = seeded_db(dir.path());

    let out = collecteur(dir.path())
        .arg("check")
        .arg(fixture("actes.csv"))
        .arg("--db")
        .arg(&db)
        .arg("--json")
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(3), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let val = assert_single_json(&out);

    assert_eq!(val["ok"], true);
    assert_eq!(val["stats"]["skipped_rows"], 1);
    assert!(val["stats"]["t_parse_ms"].is_u64());
    assert!(val["stats"]["t_sql_ms"].is_u64());

    let result = &val["result"];
    assert_eq!(result["total_csv"], 4);
    assert_eq!(result["total_found"], 2);
    assert_eq!(result["total_missing"], 2);
    assert_eq!(result["missing_acts_list"][0]["id"], "3");
    assert_eq!(result["missing_acts_list"][0]["type"], "CCAM");
    assert_eq!(result["missing_acts_list"][0]["reason"], "date_mismatch");
    assert_eq!(result["missing_acts_list"][1]["reason"], "dossier_en_C9");
    assert_eq!(result["by_type"]["NGAP"]["found"], 1);
    assert_eq!(result["by_type"]["CCAM"]["missing"], 2);
}

#[test]
fn check_tolerance_flag_widens_date_window() {
    let dir = tempfile::tempdir().unwrap();
    let db = seeded_db(dir.path());

    let out = collecteur(dir.path())
        .args(["check", "--tolerance", "60", "--json"])
        .arg(fixture("actes.csv"))
        .arg("--db")
        .arg(&db)
        .output()
        .unwrap();

    let val = assert_single_json(&out);
    assert_eq!(val["result"]["total_found"], 3);
}

#[test]
fn check_all_found_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let db = seeded_db(dir.path());

    let out = collecteur(dir.path())
        .arg("check")
        .arg(fixture("all_found.csv"))
        .arg("--db")
        .arg(&db)
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert!(out.stdout.is_empty(), "human mode keeps stdout empty");
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("2 acts checked: 2 found, 0 missing"), "stderr: {stderr}");
}

#[test]
fn check_writes_output_and_export() {
    let dir = tempfile::tempdir().unwrap();
    let db = seeded_db(dir.path());
    let report = dir.path().join("report.json");
    let exports = dir.path().join("exports");
    std::fs::create_dir(&exports).unwrap();

    let out = collecteur(dir.path())
        .arg("check")
        .arg(fixture("actes.csv"))
        .arg("--db")
        .arg(&db)
        .arg("--output")
        .arg(&report)
        .arg("--export-missing")
        .arg(&exports)
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(3));

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(saved["result"]["total_missing"], 2);

    let files: Vec<PathBuf> = std::fs::read_dir(&exports)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("Actes_Manquants_") && name.ends_with(".csv"), "name: {name}");
    assert_eq!(
        std::fs::read_to_string(&files[0]).unwrap(),
        "acte_id;type_acte;raison_discordance\n3;CCAM;date_mismatch\n4;CCAM;dossier_en_C9\n"
    );
}

#[test]
fn check_settings_file_supplies_database_and_tolerance() {
    let dir = tempfile::tempdir().unwrap();
    let db = seeded_db(dir.path());
    let settings = dir.path().join("settings.toml");
    std::fs::write(
        &settings,
        format!(
            "[database]\npath = {:?}\n\n[matching]\ndate_tolerance_minutes = 60\n",
            db.to_string_lossy()
        ),
    )
    .unwrap();

    let out = Command::new(env!("CARGO_BIN_EXE_collecteur"))
        .arg("--config")
        .arg(&settings)
        .arg("check")
        .arg(fixture("actes.csv"))
        .arg("--json")
        .output()
        .unwrap();

    let val = assert_single_json(&out);
    assert_eq!(val["result"]["total_found"], 3);
}

// ===========================================================================
// errors
// ===========================================================================

fn assert_json_error(out: &Output, exit: i32, code: &str) -> serde_json::Value {
    assert_eq!(out.status.code(), Some(exit), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let val = assert_single_json(out);
    assert_eq!(val["error"]["code"], code);
    assert!(val["error"]["message"].is_string());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("error: "), "stderr: {stderr}");
    val
}

#[test]
fn missing_file_is_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = collecteur(dir.path())
        .arg("check")
        .arg(dir.path().join("absent.csv"))
        .arg("--json")
        .output()
        .unwrap();
    assert_json_error(&out, 4, "NO_FILE");
}

#[test]
fn wrong_extension_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("actes.txt");
    std::fs::copy(fixture("actes.csv"), &path).unwrap();

    let out = collecteur(dir.path()).arg("check").arg(&path).arg("--json").output().unwrap();
    assert_json_error(&out, 4, "INVALID_EXTENSION");
}

#[test]
fn comma_file_fails_header_check() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("comma.csv");
    let content = std::fs::read_to_string(fixture("all_found.csv")).unwrap().replace(';', ",");
    std::fs::write(&path, content).unwrap();

    let out = collecteur(dir.path()).arg("check").arg(&path).arg("--json").output().unwrap();
    let val = assert_json_error(&out, 4, "INVALID_HEADERS");
    assert!(val["error"]["message"]
        .as_str()
        .unwrap()
        .contains("DATE_ACTE;NUM_INTERVENTION;NUM_VENUE;ACTE_ID;CODE_ACTE;ACTIVITE_OU_COEFF;TYPE_ACTE"));
}

#[test]
fn header_only_file_has_no_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("header.csv");
    std::fs::write(&path, "DATE_ACTE;NUM_INTERVENTION;NUM_VENUE;ACTE_ID;CODE_ACTE;ACTIVITE_OU_COEFF;TYPE_ACTE\n")
        .unwrap();

    let out = collecteur(dir.path()).arg("check").arg(&path).arg("--json").output().unwrap();
    assert_json_error(&out, 4, "NO_ROWS");
}

#[test]
fn too_many_ids_reports_limit() {
    let dir = tempfile::tempdir().unwrap();
    let settings = dir.path().join("settings.toml");
    std::fs::write(&settings, "[limits]\nmax_ids = 2\n").unwrap();

    let out = Command::new(env!("CARGO_BIN_EXE_collecteur"))
        .arg("--config")
        .arg(&settings)
        .arg("check")
        .arg(fixture("actes.csv"))
        .arg("--json")
        .output()
        .unwrap();
    let val = assert_json_error(&out, 4, "TOO_MANY_IDS");
    assert_eq!(val["error"]["limit"], 2);
}

#[test]
fn file_too_large_reports_max() {
    let dir = tempfile::tempdir().unwrap();
    let settings = dir.path().join("settings.toml");
    std::fs::write(&settings, "[limits]\nupload_max_size = 10\n").unwrap();

    let out = Command::new(env!("CARGO_BIN_EXE_collecteur"))
        .arg("--config")
        .arg(&settings)
        .arg("check")
        .arg(fixture("actes.csv"))
        .arg("--json")
        .output()
        .unwrap();
    let val = assert_json_error(&out, 4, "FILE_TOO_LARGE");
    assert_eq!(val["error"]["max"], 10);
}

#[test]
fn missing_database_is_db_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let out = collecteur(dir.path())
        .arg("check")
        .arg(fixture("actes.csv"))
        .arg("--db")
        .arg(dir.path().join("absent.db"))
        .arg("--json")
        .output()
        .unwrap();
    assert_json_error(&out, 6, "DB_UNAVAILABLE");
}

#[test]
fn malformed_settings_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let settings = dir.path().join("settings.toml");
    std::fs::write(&settings, "[limits\n").unwrap();

    let out = Command::new(env!("CARGO_BIN_EXE_collecteur"))
        .arg("--config")
        .arg(&settings)
        .arg("check")
        .arg(fixture("actes.csv"))
        .arg("--json")
        .output()
        .unwrap();
    assert_json_error(&out, 2, "CONFIG_INVALID");
}

// ===========================================================================
// validate
// ===========================================================================

#[test]
fn validate_counts_rows_without_database() {
    let dir = tempfile::tempdir().unwrap();
    let out = collecteur(dir.path())
        .arg("validate")
        .arg(fixture("actes.csv"))
        .arg("--json")
        .output()
        .unwrap();

    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let val = assert_single_json(&out);
    assert_eq!(val["ok"], true);
    assert_eq!(val["rows"], 4);
    assert_eq!(val["skipped_rows"], 1);
    assert_eq!(val["distinct_ids"], 4);
}

#[test]
fn version_includes_build_info() {
    let dir = tempfile::tempdir().unwrap();
    let out = collecteur(dir.path()).arg("--version").output().unwrap();
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).starts_with("collecteur "));
}
