//! Tests for `dotsync link` and `dotsync unlink`.

use crate::support::*;

#[test]
fn test_link_existing_project() {
    let t = Test::new();
    let id = t.init();

    let peer = t.peer();
    let output = peer.link(&id);
    assert_success(&output);
    assert_stdout_contains(&output, "linked");
    assert_stdout_contains(&output, &id);
}

#[test]
fn test_link_unknown_project_fails() {
    let t = Test::new();
    let output = t.link("no-such-project");
    assert_failure(&output);
    assert_stderr_contains(&output, "not found");
    assert_stderr_contains(&output, "retry");
}

#[test]
fn test_unlink() {
    let t = Test::new();
    t.init();

    let output = t.run(&["unlink"]);
    assert_success(&output);
    assert_stdout_contains(&output, "unlinked");

    let output = t.run(&["unlink"]);
    assert_success(&output);
    assert_stdout_contains(&output, "nothing linked");

    assert_failure(&t.status());
}

#[test]
fn test_stages_link_independently() {
    let t = Test::new();
    let id = t.init();

    assert_success(&t.run(&["link", &id, "--stage", "production"]));
    t.write_env("A=1\n");
    std::fs::write(t.dir.path().join(".env.production"), "P=1\n").unwrap();

    let output = t.run(&["push", "--stage", "production"]);
    assert_success(&output);
    assert_stdout_contains(&output, "(production)");

    let output = t.status();
    assert_eq!(status_field(&output, "action"), "push");
    let output = t.run(&["status", "--stage", "production"]);
    assert_eq!(status_field(&output, "action"), "none");
}
