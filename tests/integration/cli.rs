//! End-to-end runs of the `pacfile` binary against a local source.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use crate::fixtures::{compact, document, json};

/// A project directory with `pacfile.toml` pointing at `docs/`.
struct Project {
    dir: TempDir,
}

impl Project {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("pacfile.toml"), "[source]\nkind = \"local\"\nroot = \"docs\"\n")
            .unwrap();
        let project = Self {
            dir,
        };
        for name in ["mod1", "mod2", "mod3"] {
            project.write(name, document(name));
        }
        project.write("pacfile", document("df"));
        project
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn config(&self) -> PathBuf {
        self.path().join("pacfile.toml")
    }

    fn write(&self, name: &str, contents: &str) {
        let path = self.path().join("docs").join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("pacfile").unwrap();
        cmd.current_dir(self.path())
            .env_remove("PACFILE_CONFIG")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1")
            .arg("--config")
            .arg(self.config());
        cmd
    }
}

#[test]
fn render_prints_the_default_document() {
    let project = Project::new();
    let output = project.cmd().arg("render").assert().success();
    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    assert_eq!(
        compact(&stdout),
        r#"{"stages":[{"foo":"bar","type":"deploy"},{"type":"jenkins"}]}"#
    );
}

#[test]
fn var_arguments_override_defaults() {
    let project = Project::new();
    let output = project
        .cmd()
        .args(["render", "pacfile", "--var", "type=cli"])
        .assert()
        .success();
    let rendered = json(&String::from_utf8_lossy(&output.get_output().stdout));
    assert_eq!(rendered["stages"][0]["type"], "cli");
    assert_eq!(rendered["stages"][1]["type"], "cli");
}

#[test]
fn vars_file_sits_below_var_arguments() {
    let project = Project::new();
    let vars = project.path().join("vars.json");
    fs::write(&vars, r#"{"type": "from-file", "foo": "file"}"#).unwrap();
    project.write("both", r#"{"a": "{{ var "type" }}", "b": "{{ var "foo" }}"}"#);

    project
        .cmd()
        .args(["render", "both", "--var", "type=from-flag", "--vars-file"])
        .arg(&vars)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"a": "from-flag", "b": "file"}"#));
}

#[test]
fn malformed_var_is_rejected() {
    let project = Project::new();
    project
        .cmd()
        .args(["render", "--var", "novalue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid variable 'novalue'"));
}

#[test]
fn check_json_rejects_broken_output() {
    let project = Project::new();
    project.write("broken", document("varfunc_not_defined"));

    project
        .cmd()
        .args(["render", "broken", "--check-json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not valid JSON"));

    // without the check the raw output is still printed
    project
        .cmd()
        .args(["render", "broken"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""test": "#));
}

#[test]
fn render_all_writes_every_document() {
    let project = Project::new();
    project.write("svc/pacfile", document("df4"));
    let out = project.path().join("out");

    project
        .cmd()
        .args(["render", "--all", "--output"])
        .arg(&out)
        .assert()
        .success();

    let root = fs::read_to_string(out.join("pacfile")).unwrap();
    assert!(root.contains("jenkins"));
    assert_eq!(fs::read_to_string(out.join("svc/pacfile")).unwrap(), r#"{"foo": ""}"#);
}

#[test]
fn render_failure_names_the_missing_module() {
    let project = Project::new();
    project.write("pacfile", document("missing_module"));

    project
        .cmd()
        .arg("render")
        .assert()
        .failure()
        .stderr(predicate::str::contains("missingFragment"));
}

#[test]
fn validate_reports_each_document() {
    let project = Project::new();
    project.write("bad/pacfile", document("varfunc_not_defined"));

    let output = project.cmd().args(["validate", "--all"]).assert().failure();
    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let stderr = String::from_utf8_lossy(&output.get_output().stderr);

    assert!(stdout.lines().any(|l| l.contains('✓') && l.ends_with("pacfile") && !l.contains("bad")));
    assert!(stdout.lines().any(|l| l.contains('✗') && l.contains("bad/pacfile")));
    assert!(stderr.contains("1 of 2 documents failed to render"), "{stderr}");
}

#[test]
fn validate_json_report() {
    let project = Project::new();
    project.write("bad/pacfile", document("template_parse_fail"));

    let output = project.cmd().args(["validate", "--all", "--format", "json"]).assert().failure();
    let report = json(&String::from_utf8_lossy(&output.get_output().stdout));

    assert_eq!(report["valid"], false);
    assert_eq!(report["documents"][0]["path"], "bad/pacfile");
    assert_eq!(report["documents"][0]["valid"], false);
    assert!(report["documents"][0]["error"].as_str().unwrap().contains("nope"));
    assert_eq!(report["documents"][1], serde_json::json!({"path": "pacfile", "valid": true}));
}

#[test]
fn syntax_only_validation_skips_modules() {
    let project = Project::new();
    project.write("pacfile", document("missing_module"));
    project.write("bad/pacfile", document("df_bad"));

    let output = project
        .cmd()
        .args(["validate", "--all", "--syntax-only", "--format", "json"])
        .assert()
        .failure();
    let report = json(&String::from_utf8_lossy(&output.get_output().stdout));

    assert_eq!(report["documents"][0]["valid"], false);
    assert!(report["documents"][0]["error"].as_str().unwrap().starts_with("line "));
    assert_eq!(report["documents"][1]["valid"], true);
}

#[test]
fn missing_config_file_is_an_error() {
    let project = Project::new();
    let mut cmd = Command::cargo_bin("pacfile").unwrap();
    cmd.current_dir(project.path())
        .env_remove("PACFILE_CONFIG")
        .args(["--config", "nope.toml", "render"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration file not found"));
}

#[test]
fn config_path_from_environment() {
    let project = Project::new();
    let mut cmd = Command::cargo_bin("pacfile").unwrap();
    cmd.current_dir(project.path())
        .env("PACFILE_CONFIG", project.config())
        .env_remove("RUST_LOG")
        .arg("render")
        .assert()
        .success()
        .stdout(predicate::str::contains("jenkins"));
}

#[test]
fn git_source_requires_org_and_repo() {
    let project = Project::new();
    fs::write(project.config(), "[source]\nkind = \"git\"\nroot = \"docs\"\n").unwrap();

    project
        .cmd()
        .arg("render")
        .assert()
        .failure()
        .stderr(predicate::str::contains("needs --org and --repo"));
}

#[test]
fn unknown_config_keys_are_rejected() {
    let project = Project::new();
    fs::write(project.config(), "[source]\nflavour = \"svn\"\n").unwrap();

    project
        .cmd()
        .arg("render")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}
