//! Plan files on disk through loader, analyzer and reporters.

use std::path::{Path, PathBuf};

use migration_guard::input::{FilePlanLoader, LoadError, PlanLoader};
use migration_guard::output::{JsonReporter, Reporter, TextReporter};
use migration_guard::{Config, Safety, analyze};

fn write_plan(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write plan");
    path
}

const PHASED_NOT_NULL: &str = r#"
[[units]]
name = "001_check"

[[units.operations]]
kind = "add_check_constraint"
table = "users"
name = "users_email_not_null"
expression = "email IS NOT NULL"
validate = false

[[units]]
name = "002_validate"

[[units.operations]]
kind = "validate_check_constraint"
table = "users"
name = "users_email_not_null"
"#;

const SET_NOT_NULL: &str = r#"
[[units]]
name = "003_not_null"

[[units.operations]]
kind = "set_not_null"
table = "users"
column = "email"
validate = false
"#;

#[test]
fn multiple_files_concatenate_in_argument_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let first = write_plan(dir.path(), "001.toml", PHASED_NOT_NULL);
    let second = write_plan(dir.path(), "002.toml", SET_NOT_NULL);

    let batch = FilePlanLoader::new()
        .load(&[first, second])
        .expect("load plans");
    let names: Vec<&str> = batch.units().iter().map(|u| u.name()).collect();
    assert_eq!(names, vec!["001_check", "002_validate", "003_not_null"]);

    let report = analyze(&batch, &migration_guard::Engine::postgres(12));
    assert!(report.violations().is_empty());
    assert_eq!(
        report.operations().last().expect("operation").verdict.status,
        Safety::Safe
    );
}

#[test]
fn reversed_order_escalates_set_not_null() {
    let dir = tempfile::tempdir().expect("tempdir");
    let first = write_plan(dir.path(), "001.toml", PHASED_NOT_NULL);
    let second = write_plan(dir.path(), "002.toml", SET_NOT_NULL);

    let batch = FilePlanLoader::new()
        .load(&[second, first])
        .expect("load plans");
    let report = analyze(&batch, &migration_guard::Engine::postgres(12));

    assert!(report.has_blocking_issues());
    assert_eq!(
        report.violations()[0].rule.as_str(),
        "set-not-null-requires-validated-check"
    );
}

#[test]
fn json_plan_with_concurrent_index() {
    let dir = tempfile::tempdir().expect("tempdir");
    let plan = write_plan(
        dir.path(),
        "plan.json",
        r#"{
          "units": [
            {
              "name": "001_index",
              "disable_ddl_transaction": true,
              "operations": [
                {"kind": "create_index", "table": "orders", "column": "status", "concurrently": true}
              ]
            }
          ]
        }"#,
    );

    let batch = FilePlanLoader::new().load(&[plan]).expect("load plan");
    let report = analyze(&batch, &migration_guard::Engine::postgres(16));
    assert_eq!(report.worst_severity(), Safety::Safe);
}

#[test]
fn missing_plan_file_is_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = FilePlanLoader::new()
        .load(&[dir.path().join("missing.toml")])
        .unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
}

#[test]
fn invalid_operation_reports_file_unit_and_position() {
    let dir = tempfile::tempdir().expect("tempdir");
    let plan = write_plan(
        dir.path(),
        "bad.toml",
        r#"
[[units]]
name = "001_bad"

[[units.operations]]
kind = "alter_column_type"
table = "orders"
column = "total"
from_type = "integer"
"#,
    );

    let err = FilePlanLoader::new().load(&[plan]).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("bad.toml"), "got: {message}");
    assert!(message.contains("unit '001_bad', operation 1"), "got: {message}");
    assert!(message.contains("to_type"), "got: {message}");
}

#[test]
fn reports_written_to_output_dir() {
    let dir = tempfile::tempdir().expect("tempdir");
    let plan = write_plan(dir.path(), "plan.toml", SET_NOT_NULL);
    let batch = FilePlanLoader::new().load(&[plan]).expect("load plan");
    let report = analyze(&batch, &migration_guard::Engine::postgres(16));

    let out = dir.path().join("reports");
    TextReporter::new(false).emit(&report, &out).expect("text");
    JsonReporter::new(false).emit(&report, &out).expect("json");

    let text = std::fs::read_to_string(out.join("report.txt")).expect("read text");
    let first_line = text.lines().next().expect("line");
    insta::assert_snapshot!(
        first_line,
        @"UNSAFE MG015 003_not_null#1 users: full table scan expected: no validated CHECK (email IS NOT NULL) on users earlier in the batch"
    );

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("report.json")).expect("read"))
            .expect("valid JSON");
    assert_eq!(json["violations"][0]["rule"], "set-not-null-requires-validated-check");
    assert_eq!(json["units"][0]["operations"][0]["verdict"]["status"], "UNSAFE");
}

#[test]
fn config_file_drives_engine_and_gate() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config_path = write_plan(
        dir.path(),
        "migration-guard.toml",
        "[engine]\nkind = \"postgres\"\nversion = \"10\"\n\n[cli]\nfail_on = \"conditionally_safe\"\n",
    );
    let config = Config::from_file(&config_path).expect("config");
    let engine = config.engine.build().expect("engine");

    let plan = write_plan(
        dir.path(),
        "plan.toml",
        r#"
[[units]]
name = "001"

[[units.operations]]
kind = "add_column_with_default"
table = "users"
column = "approved"
column_type = "boolean"
default = "false"
"#,
    );
    let batch = FilePlanLoader::new().load(&[plan]).expect("load plan");
    let report = analyze(&batch, &engine);

    let threshold = config.fail_on().expect("fail_on").expect("gate enabled");
    assert!(report.exceeds(threshold));
    assert_eq!(report.worst_severity(), Safety::Unsafe);
}
