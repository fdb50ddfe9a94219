use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Two trees, a base INI and an isolated home/working directory
struct Fixture {
    temp: TempDir,
}

impl Fixture {
    fn new(includes: &str, excludes: &str) -> Self {
        let temp = TempDir::new().expect("temp dir");
        for dir in ["dir1", "dir2", "home", "work"] {
            fs::create_dir_all(temp.path().join(dir)).expect("create dir");
        }
        fs::write(
            temp.path().join("base.ini"),
            format!("[default]\nrglob_includes = {includes}\nrglob_excludes = {excludes}\n"),
        )
        .expect("write base ini");
        Self { temp }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.temp.path().join(name)
    }

    fn write(&self, relative: &str, contents: &str) {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, contents).expect("write file");
    }

    fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("compare_files").expect("binary built");
        cmd.current_dir(self.path("work"))
            .env("HOME", self.path("home"))
            .env_remove("RUST_LOG")
            .arg("--base-ini")
            .arg(self.path("base.ini"))
            .arg("--dir1")
            .arg(self.path("dir1"));
        cmd
    }

    fn run_json(&self, args: &[&str]) -> Value {
        let output = self
            .command()
            .arg("--dir2")
            .arg(self.path("dir2"))
            .arg("--json")
            .args(args)
            .output()
            .expect("run compare_files");
        assert!(
            output.status.success(),
            "compare_files failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("invalid json output")
    }
}

fn names(list: &Value) -> Vec<String> {
    list.as_array()
        .expect("array")
        .iter()
        .map(|item| match item {
            Value::String(path) => path.clone(),
            pair => pair["left"].as_str().expect("left path").to_string(),
        })
        .collect()
}

#[test]
fn test_match_path_with_unified_diff() {
    let fixture = Fixture::new("*.txt", ".git");
    fixture.write("dir1/x.txt", "a\nb\n");
    fixture.write("dir2/x.txt", "a\nc\n");
    fixture.write("dir1/y.txt", "z\n");

    fixture
        .command()
        .args(["-d2"])
        .arg(fixture.path("dir2"))
        .args(["-mp", "-di", "unified"])
        .assert()
        .success()
        .stderr(predicate::str::contains("x.txt => files are different"))
        .stderr(predicate::str::contains("y.txt => file not found in dir2!"))
        .stderr(predicate::str::contains("\n-b\n+c"));
}

#[test]
fn test_json_summary() {
    let fixture = Fixture::new("*.txt", ".git");
    fixture.write("dir1/x.txt", "a\nb\n");
    fixture.write("dir2/x.txt", "a\nc\n");
    fixture.write("dir1/y.txt", "z\n");
    fixture.write("dir1/same.txt", "same\n");
    fixture.write("dir2/same.txt", "same\n");

    let report = fixture.run_json(&["--match_path"]);

    assert_eq!(report["match_mode"], "Path");
    assert_eq!(report["summary"]["total"], 3);
    assert_eq!(names(&report["equal"]), vec!["same.txt"]);
    assert_eq!(names(&report["different"]), vec!["x.txt"]);
    assert_eq!(names(&report["not_found"]), vec!["y.txt"]);
}

#[test]
fn test_search_mode_finds_counterpart_by_name() {
    let fixture = Fixture::new("*.txt", ".git");
    fixture.write("dir1/x.txt", "hello\n");
    fixture.write("dir2/nested/deep/x.txt", "hello\n");

    let report = fixture.run_json(&[]);
    assert_eq!(names(&report["equal"]), vec!["x.txt"]);

    let right = report["equal"][0]["right"].as_str().expect("right path");
    assert!(Path::new(right).ends_with("nested/deep/x.txt"));
}

#[test]
fn test_match_path_never_searches() {
    let fixture = Fixture::new("*.txt", ".git");
    fixture.write("dir1/x.txt", "hello\n");
    fixture.write("dir2/nested/x.txt", "hello\n");

    let report = fixture.run_json(&["--match_path"]);
    assert_eq!(names(&report["not_found"]), vec!["x.txt"]);
}

#[test]
fn test_excluded_paths_never_classified() {
    let fixture = Fixture::new("*.txt", "build");
    fixture.write("dir1/keep.txt", "1\n");
    fixture.write("dir1/build/out.txt", "2\n");
    fixture.write("dir2/keep.txt", "1\n");
    fixture.write("dir2/build/out.txt", "2\n");

    let report = fixture.run_json(&["--match_path"]);
    assert_eq!(report["summary"]["total"], 1);
    assert_eq!(names(&report["equal"]), vec!["keep.txt"]);
}

#[test]
fn test_limit_truncates_candidates() {
    let fixture = Fixture::new("*.txt", ".git");
    for name in ["a.txt", "b.txt", "c.txt"] {
        fixture.write(&format!("dir1/{name}"), name);
    }

    let report = fixture.run_json(&["-lim", "2"]);
    assert_eq!(report["summary"]["total"], 2);
    assert_eq!(names(&report["not_found"]), vec!["a.txt", "b.txt"]);
}

#[test]
fn test_override_file_supplies_dir2() {
    let fixture = Fixture::new("*.txt", ".git");
    fixture.write("dir1/x.txt", "same\n");
    fixture.write("dir2/x.txt", "same\n");
    fixture.write("dir1/notes.md", "same\n");
    fixture.write("dir2/notes.md", "same\n");
    fs::write(
        fixture.path("overrides.toml"),
        format!(
            "dir2 = {:?}\nmatch_path = true\nrglob_includes = [\"*.md\"]\n",
            fixture.path("dir2").display().to_string()
        ),
    )
    .expect("write overrides");

    let output = fixture
        .command()
        .arg("--config")
        .arg(fixture.path("overrides.toml"))
        .arg("--json")
        .output()
        .expect("run compare_files");
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(names(&report["equal"]), vec!["x.txt", "notes.md"]);
}

#[test]
fn test_missing_base_ini_is_fatal() {
    let fixture = Fixture::new("*.txt", ".git");
    Command::cargo_bin("compare_files")
        .expect("binary built")
        .current_dir(fixture.path("work"))
        .env("HOME", fixture.path("home"))
        .arg("--base-ini")
        .arg(fixture.path("absent.ini"))
        .arg("--dir2")
        .arg(fixture.path("dir2"))
        .assert()
        .code(1);
}

#[test]
fn test_invalid_override_key_is_fatal() {
    let fixture = Fixture::new("*.txt", ".git");
    fs::write(fixture.path("overrides.toml"), "colour = \"always\"\n").expect("write overrides");

    fixture
        .command()
        .arg("--config")
        .arg(fixture.path("overrides.toml"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("colour"));
}

#[test]
fn test_missing_dir2_is_fatal() {
    let fixture = Fixture::new("*.txt", ".git");
    fixture
        .command()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--dir2 is required"));
}
