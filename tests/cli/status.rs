//! Tests for `dotsync status`.

use crate::support::*;

#[test]
fn test_status_tracks_local_edits() {
    let t = Test::new();
    t.init();
    t.write_env("A=1\n");

    let output = t.status();
    assert_success(&output);
    assert_eq!(status_field(&output, "action"), "push");
    assert_eq!(status_field(&output, "synced"), "(empty)");

    assert_success(&t.push());
    let output = t.status();
    assert_eq!(status_field(&output, "action"), "none");
    assert_eq!(
        status_field(&output, "local"),
        status_field(&output, "remote")
    );
}

#[test]
fn test_status_shows_remote_change() {
    let t = Test::new();
    let id = t.init();
    let peer = t.peer();
    assert_success(&peer.link(&id));
    peer.write_env("A=1\n");
    assert_success(&peer.push());

    let output = t.status();
    assert_eq!(status_field(&output, "action"), "pull");
    assert_stderr_contains(&output, "dotsync pull");
}

#[test]
fn test_status_all_lists_links() {
    let t = Test::new();
    let id = t.init();
    assert_success(&t.run(&["link", &id, "--stage", "staging"]));

    let output = t.run(&["status", "--all"]);
    assert_success(&output);
    assert_stdout_contains(&output, "@development");
    assert_stdout_contains(&output, "@staging");
    assert_stdout_contains(&output, &id);
}
