// run both generators against fixtures in a temp dir
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::tempdir;

const MODEL: &str = r#"{
    "records": [{"name": "point", "fields": [{"name": "x", "kind": "scalar", "c_type": "gint"}]}],
    "aliases": [{"name": "__jsongen_parser_point", "target": "point"}]
}"#;

const SCHEMA: &str = r#"{
    "root": "svc",
    "context": {"c_type": "struct ctx*"},
    "request": {"c_type": "struct req*"},
    "response": {"c_type": "struct resp*"},
    "endpoints": {"get": {"topic_parts": {"id": {"conversion": "unsigned"}}}}
}"#;

fn empty_headers(dir: &Path) -> PathBuf {
    let headers = dir.join("headers");
    fs::create_dir_all(&headers).expect("headers dir");
    headers
}

fn command(bin: &str, dir: &Path, config: &str) -> Command {
    let config_path = dir.join("config.toml");
    fs::write(&config_path, config).expect("config fixture");
    let mut cmd = match bin {
        "jsongen" => Command::new(assert_cmd::cargo::cargo_bin!("jsongen")),
        _ => Command::new(assert_cmd::cargo::cargo_bin!("rpcgen")),
    };
    cmd.env("SCHEMAGEN_CONFIG", &config_path).env_remove("RUST_LOG");
    cmd
}

#[test]
fn jsongen_writes_artifact() {
    let tmp = tempdir().expect("tempdir");
    let headers = empty_headers(tmp.path());
    let input = tmp.path().join("point.json");
    fs::write(&input, MODEL).expect("model fixture");
    let output = tmp.path().join("point.c");

    let mut cmd = command("jsongen", tmp.path(), "");
    cmd.arg("--input").arg(&input).arg("--output").arg(&output).arg("--headers").arg(&headers);
    cmd.assert().success();

    let text = fs::read_to_string(&output).expect("artifact");
    assert!(text.starts_with("//generated by jsongen from "));
    assert!(
        text.contains("__jsongen_point_from_json(struct point* point, const JsonObject* root){")
    );
}

#[test]
fn rpcgen_honors_configured_indent() {
    let tmp = tempdir().expect("tempdir");
    let input = tmp.path().join("svc.json");
    fs::write(&input, SCHEMA).expect("schema fixture");
    let output = tmp.path().join("svc.c");

    let mut cmd = command("rpcgen", tmp.path(), "[codegen]\nindent_width = 2\n");
    cmd.arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .arg("--headers")
        .arg(empty_headers(tmp.path()));
    cmd.assert().success();

    let text = fs::read_to_string(&output).expect("artifact");
    assert!(text.contains("\n  int ret = SVC_RESULT_NONE;\n"));
    assert!(!text.contains('\t'));
}

#[test]
fn missing_flag_fails() {
    let tmp = tempdir().expect("tempdir");
    let mut cmd = command("jsongen", tmp.path(), "");
    cmd.arg("--input").arg(tmp.path().join("point.json"));
    cmd.assert().failure().stderr(predicate::str::contains("--output"));
}

#[test]
fn invalid_schema_fails_without_output() {
    let tmp = tempdir().expect("tempdir");
    let input = tmp.path().join("svc.json");
    fs::write(&input, SCHEMA.replace("\"get\"", "\"get-all\"")).expect("schema fixture");
    let output = tmp.path().join("svc.c");

    let mut cmd = command("rpcgen", tmp.path(), "");
    cmd.arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .arg("--headers")
        .arg(empty_headers(tmp.path()));
    cmd.assert().failure().code(1).stderr(predicate::str::contains("get-all"));
    assert!(!output.exists());
}

#[test]
fn invalid_config_fails() {
    let tmp = tempdir().expect("tempdir");
    let input = tmp.path().join("point.json");
    fs::write(&input, MODEL).expect("model fixture");

    let mut cmd = command("jsongen", tmp.path(), "[codegen]\njson_tag = \"bad-tag\"\n");
    cmd.arg("--input").arg(&input).arg("--output").arg(tmp.path().join("out.c"));
    cmd.arg("--headers").arg(empty_headers(tmp.path()));
    cmd.assert().failure().stderr(predicate::str::contains("configuration error"));
}
