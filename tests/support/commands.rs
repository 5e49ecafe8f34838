//! Command helper methods for Test.

use super::{Test, PEPPER, TEAM};
use assert_cmd::Command;
use std::process::Output;

impl Test {
    /// A dotsync command bound to this environment.
    ///
    /// Settings come from the environment only; the pepper is fixed so peers
    /// derive the same keys.
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("dotsync").expect("failed to find dotsync binary");
        cmd.env("HOME", self.home.path());
        cmd.env("USERPROFILE", self.home.path());
        cmd.env("DOTSYNC_HOME", self.home.path().join(".dotsync"));
        cmd.env("DOTSYNC_REMOTE", self.remote_path());
        cmd.env("DOTSYNC_PEPPER", PEPPER);
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("DOTSYNC_PEPPER_FILE");
        cmd.env_remove("DOTSYNC_BATCH_SIZE");
        cmd.env_remove("DOTSYNC_LOG");
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Run dotsync with `args`.
    pub fn run(&self, args: &[&str]) -> Output {
        self.cmd()
            .args(args)
            .output()
            .expect("failed to run dotsync")
    }

    /// Shortcut for `dotsync init --team team`.
    pub fn init_cmd(&self) -> Output {
        self.run(&["init", "--team", TEAM])
    }

    /// Shortcut for `dotsync link <id>`.
    pub fn link(&self, project_id: &str) -> Output {
        self.run(&["link", project_id])
    }

    pub fn push(&self) -> Output {
        self.run(&["push"])
    }

    pub fn pull(&self) -> Output {
        self.run(&["pull"])
    }

    pub fn sync(&self) -> Output {
        self.run(&["sync"])
    }

    pub fn status(&self) -> Output {
        self.run(&["status"])
    }
}
