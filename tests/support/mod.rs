//! Test support utilities for dotsync integration tests.
//!
//! Every `Test` owns a working directory and a home directory. Peers share the
//! remote directory, so two `Test`s model two machines syncing one project.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;

#[allow(unused_imports)]
pub use assertions::*;

use std::fs;
use std::path::Path;
use std::rc::Rc;

use tempfile::TempDir;

pub const PEPPER: &str = "integration-test-pepper-0123456789";
pub const TEAM: &str = "team";

/// Isolated environment for one dotsync user.
pub struct Test {
    /// Working directory holding the `.env` files
    pub dir: TempDir,
    /// Home directory holding settings and links
    pub home: TempDir,
    /// Remote store, shared with peers
    pub remote: Rc<TempDir>,
}

impl Test {
    /// A fresh environment with its own empty remote.
    pub fn new() -> Self {
        let remote = TempDir::new().expect("failed to create temp remote");
        Self::with_remote(Rc::new(remote))
    }

    fn with_remote(remote: Rc<TempDir>) -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
            home: TempDir::new().expect("failed to create temp home"),
            remote,
        }
    }

    /// Another user on the same remote.
    pub fn peer(&self) -> Self {
        Self::with_remote(Rc::clone(&self.remote))
    }

    /// Run `init` and return the new project id.
    pub fn init(&self) -> String {
        let output = self.init_cmd();
        assert_success(&output);
        project_id(&stdout(&output))
    }

    /// Write the default-stage `.env` file.
    pub fn write_env(&self, contents: &str) {
        fs::write(self.env_path(), contents).expect("failed to write .env");
    }

    /// Read the default-stage `.env` file.
    pub fn read_env(&self) -> String {
        fs::read_to_string(self.env_path()).expect("failed to read .env")
    }

    pub fn env_path(&self) -> std::path::PathBuf {
        self.dir.path().join(".env")
    }

    pub fn remote_path(&self) -> &Path {
        self.remote.path()
    }
}

/// Extract the project id from `init` output.
fn project_id(out: &str) -> String {
    out.split("created project ")
        .nth(1)
        .and_then(|rest| rest.split_whitespace().next())
        .map(str::to_string)
        .unwrap_or_else(|| panic!("no project id in output: {}", out))
}
