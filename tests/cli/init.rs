//! Tests for `dotsync init`.

use crate::support::*;
use std::fs;

#[test]
fn test_init_creates_project_and_salt() {
    let t = Test::new();

    let output = t.init_cmd();
    assert_success(&output);
    assert_stdout_contains(&output, "created project");
    assert_stdout_contains(&output, "team team");
    assert_stderr_contains(&output, "dotsync link");

    let id = t.init();
    assert!(t.remote_path().join("projects").join(&id).join("project.json").exists());
    assert!(t.remote_path().join("salts").join("team.salt").exists());
}

#[test]
fn test_init_reuses_team_salt() {
    let t = Test::new();
    t.init();
    let salt = fs::read(t.remote_path().join("salts/team.salt")).unwrap();

    let peer = t.peer();
    peer.init();
    assert_eq!(fs::read(t.remote_path().join("salts/team.salt")).unwrap(), salt);
}

#[test]
fn test_init_links_current_directory() {
    let t = Test::new();
    t.init();

    let output = t.status();
    assert_success(&output);
    assert_eq!(status_field(&output, "action"), "none");
    assert_eq!(status_field(&output, "remote"), "(empty)");
}

#[test]
fn test_init_rejects_bad_stage() {
    let t = Test::new();
    let output = t.run(&["init", "--team", TEAM, "--stage", "../prod"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "invalid stage");
}
