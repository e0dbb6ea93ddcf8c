use std::fs;
use std::path::{Path, PathBuf};
use std::process::Output;

use serde_json::{Value, json};
use tempfile::TempDir;

const BIN: &str = env!("CARGO_BIN_EXE_op-merge");

fn run(args: &[&str]) -> Output {
    std::process::Command::new(BIN)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run op-merge")
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp path is not UTF-8")
}

fn write_descriptor(dir: &TempDir, name: &str, descriptor: &Value) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, serde_json::to_string_pretty(descriptor).unwrap())
        .expect("failed to write descriptor");
    path
}

/// Descriptor for creating a widget with one JSON response.
fn widget_descriptor() -> Value {
    json!({
        "method": "POST",
        "summary": "Create a widget",
        "responses": [{
            "statusCode": "200",
            "description": "ok",
            "content": [{
                "mediaType": "application/json",
                "type": { "named": { "name": "Widget", "fields": [
                    { "name": "id", "type": { "primitive": "long" }, "required": true }
                ] } }
            }],
            "headers": [{ "name": "ETag", "type": { "primitive": "string" } }]
        }]
    })
}

// ---------------------------------------------------------------------------
// merge
// ---------------------------------------------------------------------------

#[test]
fn merge_writes_operation_and_components() {
    let dir = TempDir::new().unwrap();
    let descriptor = write_descriptor(&dir, "create.json", &widget_descriptor());

    let out = run(&["merge", "--descriptor", path_str(&descriptor)]);

    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    let merged: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(merged["operation"]["method"], "POST");
    assert_eq!(merged["operation"]["summary"], "Create a widget");
    assert_eq!(merged["operation"]["produces"], json!(["application/json"]));
    assert_eq!(
        merged["operation"]["responses"]["200"]["schema"],
        json!({ "$ref": "#/components/schemas/Widget" })
    );
    assert_eq!(
        merged["operation"]["responses"]["200"]["headers"]["ETag"],
        json!({ "type": "string" })
    );
    assert_eq!(
        merged["components"]["schemas"]["Widget"]["required"],
        json!(["id"])
    );
}

#[test]
fn merge_into_existing_operation_keeps_inferred_fields() {
    let dir = TempDir::new().unwrap();
    let descriptor = write_descriptor(&dir, "create.json", &widget_descriptor());
    let operation = dir.path().join("operation.yaml");
    fs::write(
        &operation,
        "method: GET\ndescription: inferred\noperationId: createWidget\nproduces:\n  - application/json\n",
    )
    .unwrap();

    let out = run(&[
        "merge",
        "--descriptor",
        path_str(&descriptor),
        "--operation",
        path_str(&operation),
    ]);

    assert!(out.status.success());
    let merged: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(merged["operation"]["method"], "POST");
    assert_eq!(merged["operation"]["description"], "inferred");
    assert_eq!(merged["operation"]["operationId"], "createWidget");
    assert_eq!(
        merged["operation"]["produces"],
        json!(["application/json", "application/json"])
    );
}

#[test]
fn merge_rejects_default_status_code() {
    let dir = TempDir::new().unwrap();
    let descriptor = write_descriptor(
        &dir,
        "bad.json",
        &json!({ "responses": [{ "statusCode": "default" }] }),
    );

    let out = run(&["merge", "--descriptor", path_str(&descriptor)]);

    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains("status code must be defined"),
        "stderr: {stderr}"
    );
}

#[test]
fn merge_uses_config_ref_prefix_and_yaml_output() {
    let dir = TempDir::new().unwrap();
    let descriptor = write_descriptor(&dir, "create.json", &widget_descriptor());
    let config = dir.path().join("op-merge.yaml");
    fs::write(
        &config,
        "registry:\n  ref_prefix: \"#/definitions/\"\noutput:\n  format: yaml\n",
    )
    .unwrap();
    let output = dir.path().join("out").join("merged.yaml");

    let out = run(&[
        "merge",
        "--config",
        path_str(&config),
        "--descriptor",
        path_str(&descriptor),
        "--output",
        path_str(&output),
    ]);

    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    let raw = fs::read_to_string(&output).unwrap();
    let merged: Value = serde_yaml::from_str(&raw).unwrap();
    assert_eq!(
        merged["operation"]["responses"]["200"]["schema"]["$ref"],
        "#/definitions/Widget"
    );
}

#[test]
fn merge_format_flag_overrides_config() {
    let dir = TempDir::new().unwrap();
    let descriptor = write_descriptor(&dir, "create.json", &widget_descriptor());

    let out = run(&[
        "merge",
        "--descriptor",
        path_str(&descriptor),
        "--format",
        "yaml",
    ]);

    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("method: POST"), "stdout: {stdout}");
}

#[test]
fn merge_writes_bare_output_filename_into_working_directory() {
    let dir = TempDir::new().unwrap();
    let descriptor = write_descriptor(&dir, "create.json", &widget_descriptor());

    let out = std::process::Command::new(BIN)
        .args(["merge", "--descriptor", path_str(&descriptor), "--output", "merged.json"])
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run op-merge");

    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    let raw = fs::read_to_string(dir.path().join("merged.json")).unwrap();
    let merged: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(merged["operation"]["method"], "POST");
}

// ---------------------------------------------------------------------------
// validate / init-config
// ---------------------------------------------------------------------------

#[test]
fn validate_reports_missing_header_name() {
    let dir = TempDir::new().unwrap();
    let good = write_descriptor(&dir, "good.json", &widget_descriptor());
    let bad = write_descriptor(
        &dir,
        "bad.json",
        &json!({ "responses": [{
            "statusCode": "200",
            "headers": [{ "name": "", "type": { "primitive": "string" } }]
        }] }),
    );

    let out = run(&["validate", path_str(&good)]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("Validated 1 descriptor file(s)."));

    let out = run(&["validate", path_str(&good), path_str(&bad)]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("header name must be defined"), "stderr: {stderr}");
    assert!(stderr.contains("bad.json"), "stderr: {stderr}");
}

#[test]
fn init_config_refuses_to_overwrite() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("op-merge.yaml");

    let out = run(&["init-config", path_str(&config)]);
    assert!(out.status.success());
    let raw = fs::read_to_string(&config).unwrap();
    assert!(raw.contains("ref_prefix"));

    let out = run(&["init-config", path_str(&config)]);
    assert!(!out.status.success());

    let out = run(&["init-config", path_str(&config), "--force"]);
    assert!(out.status.success());
}
