//! End-to-end runs of the `testid` binary.

use std::fs;
use std::process::Command;

fn testid() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_testid"));
    cmd.env_remove("RUST_LOG").env_remove("TESTID_MARKER").env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_check_then_write_then_check() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test_cli.py");
    fs::write(&path, "class TestA:\n    def test_a(self):\n        pass\n").unwrap();

    let check = testid().current_dir(dir.path()).arg("--check").arg(".").output().unwrap();
    assert_eq!(check.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&check.stdout).contains("TestA.test_a"));

    let write = testid().current_dir(dir.path()).arg(".").output().unwrap();
    assert_eq!(write.status.code(), Some(0));
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("class TestA:\n    @pytest.mark.test_id('"));

    let recheck = testid().current_dir(dir.path()).args(["--check", "."]).output().unwrap();
    assert_eq!(recheck.status.code(), Some(0));
}

#[test]
fn test_json_report_with_config_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("testid.toml"), "marker = \"trace.case\"\n").unwrap();
    let path = dir.path().join("test_cfg.py");
    fs::write(&path, "def test_a():\n    pass\n").unwrap();

    let out = testid()
        .current_dir(dir.path())
        .args(["--dry-run", "--format", "json", "test_cfg.py"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(0));
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["mode"], "dry_run");
    assert_eq!(json["files"][0]["status"], "needs_markers");
    assert_eq!(fs::read_to_string(&path).unwrap(), "def test_a():\n    pass\n");
}

#[test]
fn test_invalid_marker_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let out = testid()
        .current_dir(dir.path())
        .args(["--marker", "not valid", "."])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("not a dotted identifier path"));
}

#[test]
fn test_check_conflicts_with_dry_run() {
    let out = testid().args(["--check", "--dry-run", "."]).output().unwrap();
    assert!(!out.status.success());
}
