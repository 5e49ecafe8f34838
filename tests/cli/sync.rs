//! Tests for push, pull and sync between two working directories.

use crate::support::*;

#[test]
fn test_push_then_pull_in_second_directory() {
    let t = Test::new();
    let id = t.init();
    t.write_env("A=1\nB=two words\n");

    let output = t.push();
    assert_success(&output);
    assert_stdout_contains(&output, "pushed 2 changes");
    assert_stdout_contains(&output, "+ A");

    let peer = t.peer();
    assert_success(&peer.link(&id));
    let output = peer.pull();
    assert_success(&output);
    assert_stdout_contains(&output, "pulled 2 changes");
    assert_eq!(peer.read_env(), "A=1\nB=\"two words\"\n");

    assert_stdout_contains(&peer.pull(), "already up to date");
}

#[test]
fn test_sync_moves_changes_both_ways() {
    let t = Test::new();
    let id = t.init();
    t.write_env("A=1\n");
    assert_stdout_contains(&t.sync(), "pushed 1 change");

    let peer = t.peer();
    assert_success(&peer.link(&id));
    assert_stdout_contains(&peer.sync(), "pulled 1 change");

    peer.write_env("A=1\nB=2\n");
    let output = peer.sync();
    assert_success(&output);
    assert_stdout_contains(&output, "+ B");

    let output = t.sync();
    assert_success(&output);
    assert_stdout_contains(&output, "+ B");
    assert_eq!(t.read_env(), "A=1\nB=2\n");

    assert_stdout_contains(&t.sync(), "in sync");
    assert_stdout_contains(&peer.sync(), "in sync");
}

#[test]
fn test_push_removes_deleted_names() {
    let t = Test::new();
    let id = t.init();
    t.write_env("A=1\nB=2\n");
    assert_success(&t.push());

    t.write_env("A=1\n");
    let output = t.push();
    assert_success(&output);
    assert_stdout_contains(&output, "- B");

    let peer = t.peer();
    assert_success(&peer.link(&id));
    assert_success(&peer.pull());
    assert_eq!(peer.read_env(), "A=1\n");
}

/// Both sides edit `A` after a common sync.
fn diverged() -> (Test, Test) {
    let t = Test::new();
    let id = t.init();
    t.write_env("A=1\n");
    assert_success(&t.push());

    let peer = t.peer();
    assert_success(&peer.link(&id));
    assert_success(&peer.pull());
    peer.write_env("A=2\n");
    assert_success(&peer.push());

    t.write_env("A=3\n");
    (t, peer)
}

#[test]
fn test_conflict_without_terminal_aborts() {
    let (t, _peer) = diverged();

    let output = t.sync();
    assert_failure(&output);
    assert_eq!(output.status.code(), Some(1));
    assert_stderr_contains(&output, "conflict");
    assert_stderr_contains(&output, "--on-conflict");
    assert_eq!(t.read_env(), "A=3\n");
}

#[test]
fn test_conflict_resolved_by_pull() {
    let (t, _peer) = diverged();

    let output = t.run(&["sync", "--on-conflict", "pull"]);
    assert_success(&output);
    assert_stdout_contains(&output, "~ A");
    assert_eq!(t.read_env(), "A=2\n");
    assert_eq!(status_field(&t.status(), "action"), "none");
}

#[test]
fn test_conflict_resolved_by_push() {
    let (t, peer) = diverged();

    assert_success(&t.run(&["sync", "--on-conflict", "push"]));
    assert_success(&peer.pull());
    assert_eq!(peer.read_env(), "A=3\n");
}

#[test]
fn test_pull_keep_policy_preserves_local() {
    let (t, _peer) = diverged();

    let output = t.run(&["pull", "--policy", "keep"]);
    assert_success(&output);
    assert_stdout_contains(&output, "= A");
    assert_eq!(t.read_env(), "A=3\n");
}

#[test]
fn test_confirm_policy_without_terminal_keeps_local() {
    let (t, _peer) = diverged();

    assert_success(&t.run(&["pull", "--policy", "confirm"]));
    assert_eq!(t.read_env(), "A=3\n");
}
