//! Error reporting and hints.

use crate::support::*;
use predicates::prelude::*;

#[test]
fn test_not_linked_hints_link() {
    let t = Test::new();
    for args in [["status"], ["push"], ["pull"], ["sync"]] {
        let output = t.run(&args);
        assert_failure(&output);
        assert_stderr_contains(&output, "not linked");
        assert_stderr_contains(&output, "dotsync link");
    }
}

#[test]
fn test_missing_pepper() {
    let t = Test::new();
    t.cmd()
        .env_remove("DOTSYNC_PEPPER")
        .arg("status")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("no pepper"))
        .stderr(predicate::str::contains("set DOTSYNC_PEPPER"));
}

#[test]
fn test_short_pepper_rejected() {
    let t = Test::new();
    t.cmd()
        .env("DOTSYNC_PEPPER", "short")
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("pepper too short"));
}

#[test]
fn test_pepper_file() {
    let t = Test::new();
    let pepper_file = t.home.path().join("pepper");
    std::fs::write(&pepper_file, format!("{}\n", PEPPER)).unwrap();
    t.cmd()
        .env_remove("DOTSYNC_PEPPER")
        .env("DOTSYNC_PEPPER_FILE", &pepper_file)
        .args(["init", "--team", TEAM])
        .assert()
        .success();
}

#[test]
fn test_missing_remote() {
    let t = Test::new();
    t.cmd()
        .env_remove("DOTSYNC_REMOTE")
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no remote configured"))
        .stderr(predicate::str::contains("DOTSYNC_REMOTE"));
}

#[test]
fn test_invalid_batch_size() {
    let t = Test::new();
    t.cmd()
        .env("DOTSYNC_BATCH_SIZE", "0")
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value for batch_size"));
}

#[test]
fn test_wrong_pepper_fails_to_decrypt() {
    let t = Test::new();
    let id = t.init();
    t.write_env("SECRET=1\n");
    assert_success(&t.push());

    let peer = t.peer();
    assert_success(&peer.link(&id));
    let output = peer
        .cmd()
        .env("DOTSYNC_PEPPER", "a-completely-different-pepper")
        .arg("pull")
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "failed to decrypt 'SECRET'");
    assert!(!peer.env_path().exists());
}

#[test]
fn test_malformed_env_file() {
    let t = Test::new();
    t.init();
    t.write_env("not a variable\n");
    let output = t.push();
    assert_failure(&output);
    assert_stderr_contains(&output, "malformed line 1");
}
