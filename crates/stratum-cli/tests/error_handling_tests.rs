//! Exit codes and error messages.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use assert_cmd::cargo;
use predicates::prelude::*;
use tempfile::TempDir;

const ROOT_BASE: &str = "---\nagent_type: engineer\n---\nShared rules that every agent in this corpus follows closely.\n";

fn leaf(id: &str, extra: &str) -> String {
    format!(
        "---\nname: {id}\ndescription: The {id} agent\nagent_id: {id}\nskills: [review]\n{extra}---\nRules for {id}.\n"
    )
}

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn stratum(dir: &Path) -> Command {
    let mut cmd = cargo::cargo_bin_cmd!("stratum");
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .arg("--no-color");
    cmd
}

#[test]
fn duplicate_identity_exits_one() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "agents/BASE-AGENT.md", ROOT_BASE);
    write(temp.path(), "agents/a.md", &leaf("twin", ""));
    write(temp.path(), "agents/b.md", &leaf("twin", ""));
    write(temp.path(), "agents/c.md", &leaf("fine", ""));

    stratum(temp.path())
        .arg("build")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("duplicate-identity"))
        .stderr(predicate::str::contains("validation error"));

    // Documents without errors are still written.
    assert!(temp.path().join("dist/c.md").is_file());
    assert!(!temp.path().join("dist/a.md").exists());
}

#[test]
fn strict_build_writes_nothing() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "agents/BASE-AGENT.md", ROOT_BASE);
    write(
        temp.path(),
        "agents/a.md",
        &leaf("a", "interactions:\n  handoff_to: [ghost]\n"),
    );
    write(temp.path(), "agents/c.md", &leaf("fine", ""));

    stratum(temp.path())
        .args(["build", "--strict"])
        .assert()
        .code(1);

    assert!(!temp.path().join("dist").exists());
}

#[test]
fn lenient_refs_downgrades_unresolved_references() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "agents/BASE-AGENT.md", ROOT_BASE);
    write(
        temp.path(),
        "agents/a.md",
        &leaf("a", "interactions:\n  handoff_to: [ghost]\n"),
    );

    stratum(temp.path())
        .args(["build", "--lenient-refs"])
        .assert()
        .success();
}

#[test]
fn parse_error_exits_two() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "agents/BASE-AGENT.md", ROOT_BASE);
    write(temp.path(), "agents/broken.md", "no frontmatter at all");

    stratum(temp.path())
        .arg("build")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("broken.md"));
}

#[test]
fn missing_corpus_exits_two() {
    let temp = TempDir::new().unwrap();

    stratum(temp.path())
        .args(["build", "--corpus", "nowhere"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("nowhere"));
}

#[test]
fn unknown_document_exits_two_with_suggestion() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "agents/BASE-AGENT.md", ROOT_BASE);
    write(temp.path(), "agents/a.md", &leaf("a", ""));

    stratum(temp.path())
        .args(["build", "ghost"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("stratum list"));
}

#[test]
fn missing_config_file_exits_two() {
    let temp = TempDir::new().unwrap();

    stratum(temp.path())
        .args(["--config", "absent.toml", "list"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn unknown_config_key_exits_two() {
    let temp = TempDir::new().unwrap();

    stratum(temp.path())
        .args(["config", "get", "build.nope"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown config key"));
}
