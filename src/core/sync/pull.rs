//! Pull: fold remote values into the local file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use super::Reconciler;
use crate::core::domain::{Env, PullReport};
use crate::core::merge::{self, KeyChange, KeyStatus, MergePolicy};
use crate::core::store;
use crate::core::types::Fingerprint;
use crate::error::Result;

/// Bytes of a local file before a pull replaced it, or `None` if it did not
/// exist.
struct Snapshot {
    path: PathBuf,
    contents: Option<Zeroizing<Vec<u8>>>,
}

impl Snapshot {
    fn take(path: &Path) -> Result<Self> {
        let contents = match fs::read(path) {
            Ok(bytes) => Some(Zeroizing::new(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path: path.to_path_buf(),
            contents,
        })
    }

    /// Put the file back as it was. Failures are logged; the caller is
    /// already returning an error.
    fn restore(&self) {
        let restored = match &self.contents {
            Some(bytes) => store::write_atomic(&self.path, bytes),
            None => fs::remove_file(&self.path),
        };
        match restored {
            Ok(()) => debug!(path = %self.path.display(), "local file restored"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to restore local file"),
        }
    }
}

impl Reconciler {
    /// Pull the remote variables for `stage` into the local file.
    ///
    /// The remote is asked for changes relative to the confirmed hash; if it
    /// reports none, nothing happens. Otherwise every value is decrypted,
    /// merged with the local file under `policy` (see [`merge::merge`]), and
    /// the result replaces the file atomically. The confirmed hash becomes
    /// the fingerprint of the file as written.
    ///
    /// # Errors
    ///
    /// `Error::Decrypt` names the variable that failed, and
    /// `Error::InvalidRemoteVariable` a remote name that cannot be written
    /// locally. Any error leaves the local file and confirmed hash untouched;
    /// if one happens after the file was replaced, the old file is put back.
    pub fn pull(
        &self,
        stage: &str,
        policy: MergePolicy,
        confirm: &mut dyn FnMut(&KeyChange<'_>) -> bool,
    ) -> Result<PullReport> {
        let project = self.linked(stage)?;
        let remote = self.fetch(&project, &project.last_synced_hash)?;

        if !remote.changed {
            debug!(stage = %stage, "remote unchanged since last sync");
            return Ok(PullReport {
                unchanged: true,
                synced_hash: project.last_synced_hash,
                ..Default::default()
            });
        }

        Self::check_names(&project, remote.variables.iter().map(|v| &v.name))?;
        let incoming = self.decrypt_all(&project, &remote.variables)?;
        let env = self.local_env(stage)?;
        let existing = env.to_map();

        let result = merge::merge(&existing, &incoming, policy, confirm);
        let snapshot = if result.merged != existing {
            let snapshot = Snapshot::take(env.path())?;
            Env::from_map(result.merged.clone(), env.path().to_path_buf()).save()?;
            Some(snapshot)
        } else {
            None
        };

        let confirmed = self.local_hash(stage).and_then(|hash: Fingerprint| {
            self.store.write(&project.with_synced_hash(hash.clone()))?;
            Ok(hash)
        });
        let synced_hash = match confirmed {
            Ok(hash) => hash,
            Err(e) => {
                if let Some(snapshot) = &snapshot {
                    snapshot.restore();
                }
                return Err(e);
            }
        };

        let report = PullReport {
            unchanged: false,
            added: result.names(KeyStatus::Added),
            changed: result.names(KeyStatus::Changed),
            removed: result.names(KeyStatus::Removed),
            kept: result.names(KeyStatus::Kept),
            synced_hash,
        };

        info!(
            stage = %stage,
            added = report.added.len(),
            changed = report.changed.len(),
            removed = report.removed.len(),
            kept = report.kept.len(),
            "pull complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{fixture, linked};
    use crate::core::domain::{LinkedProject, SyncAction};
    use crate::core::fingerprint;
    use crate::core::merge::{KeyChange, MergePolicy};
    use crate::core::remote::{AddVariablesRequest, Remote, VariableValue};
    use crate::core::store::{Filesystem, Store};
    use crate::error::{Error, Result, StoreError};
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store that accepts a fixed number of writes, then fails.
    struct FlakyStore {
        inner: Filesystem,
        writes_left: AtomicUsize,
    }

    impl Store for FlakyStore {
        fn write(&self, project: &LinkedProject) -> Result<()> {
            let left = self.writes_left.load(Ordering::SeqCst);
            if left == 0 {
                return Err(StoreError::WriteFailed {
                    path: "flaky".to_string(),
                    source: std::io::Error::other("disk full"),
                }
                .into());
            }
            self.writes_left.store(left - 1, Ordering::SeqCst);
            self.inner.write(project)
        }

        fn read(&self, working_dir: &Path, stage: &str) -> Result<LinkedProject> {
            self.inner.read(working_dir, stage)
        }

        fn find(&self, working_dir: &Path, stage: &str) -> Result<Option<LinkedProject>> {
            self.inner.find(working_dir, stage)
        }

        fn remove(&self, working_dir: &Path, stage: &str) -> Result<bool> {
            self.inner.remove(working_dir, stage)
        }

        fn list(&self) -> Result<Vec<LinkedProject>> {
            self.inner.list()
        }
    }

    fn accept(_: &KeyChange<'_>) -> bool {
        true
    }

    #[test]
    fn test_pull_into_fresh_checkout() {
        let f = fixture();
        let project = linked(&f);
        fs::write(f.work.path().join(".env"), "A=1\nB=two words\n").unwrap();
        f.reconciler.push("development").unwrap();

        let other = tempfile::TempDir::new().unwrap();
        let peer = f.peer(other.path());
        peer.link(&project.remote_project_id, "development").unwrap();
        let report = peer
            .pull("development", MergePolicy::OverrideAll, &mut accept)
            .unwrap();

        assert_eq!(report.added, vec!["A", "B"]);
        assert_eq!(
            fs::read_to_string(other.path().join(".env")).unwrap(),
            "A=1\nB=\"two words\"\n"
        );
        assert_eq!(peer.status("development").unwrap().action, SyncAction::None);
    }

    #[test]
    fn test_pull_unchanged_is_noop() {
        let f = fixture();
        linked(&f);
        fs::write(f.work.path().join(".env"), "A=1\n").unwrap();
        f.reconciler.push("development").unwrap();

        let report = f
            .reconciler
            .pull("development", MergePolicy::OverrideAll, &mut accept)
            .unwrap();
        assert!(report.unchanged);
    }

    #[test]
    fn test_pull_after_remote_change() {
        let f = fixture();
        let project = linked(&f);
        let env = f.work.path().join(".env");
        fs::write(&env, "A=1\nB=2\n").unwrap();
        f.reconciler.push("development").unwrap();

        // Another checkout pushes a change.
        let other = tempfile::TempDir::new().unwrap();
        let peer = f.peer(other.path());
        peer.link(&project.remote_project_id, "development").unwrap();
        fs::write(other.path().join(".env"), "A=1\nB=3\nC=new\n").unwrap();
        peer.push("development").unwrap();

        assert_eq!(
            f.reconciler.status("development").unwrap().action,
            SyncAction::Pull
        );
        let report = f
            .reconciler
            .pull("development", MergePolicy::OverrideAll, &mut accept)
            .unwrap();
        assert_eq!(report.added, vec!["C"]);
        assert_eq!(report.changed, vec!["B"]);
        assert_eq!(fs::read_to_string(&env).unwrap(), "A=1\nB=3\nC=new\n");

        let expected = fingerprint::fingerprint([("A", "1"), ("B", "3"), ("C", "new")]);
        assert_eq!(report.synced_hash, expected);
        assert_eq!(
            f.reconciler.status("development").unwrap().action,
            SyncAction::None
        );
    }

    #[test]
    fn test_keep_all_preserves_local_values() {
        let f = fixture();
        let project = linked(&f);
        let env = f.work.path().join(".env");

        let other = tempfile::TempDir::new().unwrap();
        let peer = f.peer(other.path());
        peer.link(&project.remote_project_id, "development").unwrap();
        fs::write(other.path().join(".env"), "A=remote\nB=2\n").unwrap();
        peer.push("development").unwrap();

        fs::write(&env, "A=local\n").unwrap();
        let report = f
            .reconciler
            .pull("development", MergePolicy::KeepAll, &mut accept)
            .unwrap();
        assert_eq!(report.kept, vec!["A"]);
        assert_eq!(report.added, vec!["B"]);
        assert_eq!(fs::read_to_string(&env).unwrap(), "A=local\nB=2\n");
        assert_eq!(
            report.synced_hash,
            fingerprint::fingerprint([("A", "local"), ("B", "2")])
        );
    }

    #[test]
    fn test_failed_decrypt_leaves_file_untouched() {
        let f = fixture();
        let project = linked(&f);
        let other = tempfile::TempDir::new().unwrap();
        let peer = f.peer_with_pepper(other.path(), "a-different-pepper-value!");
        peer.link(&project.remote_project_id, "development").unwrap();
        fs::write(other.path().join(".env"), "A=1\n").unwrap();
        peer.push("development").unwrap();

        let env = f.work.path().join(".env");
        fs::write(&env, "LOCAL=1\n").unwrap();
        let err = f
            .reconciler
            .pull("development", MergePolicy::OverrideAll, &mut accept)
            .unwrap_err();
        assert!(err.to_string().contains("'A'"));
        assert_eq!(fs::read_to_string(&env).unwrap(), "LOCAL=1\n");
        assert_eq!(
            f.reconciler
                .status("development")
                .unwrap()
                .last_synced_hash,
            ""
        );
    }

    #[test]
    fn test_invalid_remote_name_leaves_file_untouched() {
        let f = fixture();
        let project = linked(&f);
        let key = f.reconciler.scope_key(&project).unwrap();
        f.remote
            .add_variables(&AddVariablesRequest {
                scope: project.team_id.clone(),
                project_id: project.remote_project_id.clone(),
                stage: project.stage.clone(),
                variables: vec![VariableValue {
                    name: "BAD NAME".to_string(),
                    value: key.seal("x").unwrap(),
                }],
                content_hash: None,
            })
            .unwrap();

        let env = f.work.path().join(".env");
        fs::write(&env, "LOCAL=1\n").unwrap();
        let err = f
            .reconciler
            .pull("development", MergePolicy::OverrideAll, &mut accept)
            .unwrap_err();

        assert!(matches!(err, Error::InvalidRemoteVariable { ref key, .. } if key == "BAD NAME"));
        assert_eq!(fs::read_to_string(&env).unwrap(), "LOCAL=1\n");
        let status = f.reconciler.status("development").unwrap();
        assert_eq!(status.last_synced_hash, "");
        assert_eq!(status.local_hash, fingerprint::fingerprint([("LOCAL", "1")]));
    }

    #[test]
    fn test_push_clears_invalid_remote_name() {
        let f = fixture();
        let project = linked(&f);
        let key = f.reconciler.scope_key(&project).unwrap();
        f.remote
            .add_variables(&AddVariablesRequest {
                scope: project.team_id.clone(),
                project_id: project.remote_project_id.clone(),
                stage: project.stage.clone(),
                variables: vec![VariableValue {
                    name: "BAD NAME".to_string(),
                    value: key.seal("x").unwrap(),
                }],
                content_hash: None,
            })
            .unwrap();

        fs::write(f.work.path().join(".env"), "LOCAL=1\n").unwrap();
        let report = f.reconciler.push("development").unwrap();
        assert_eq!(report.removed, vec!["BAD NAME"]);
        assert!(f
            .reconciler
            .pull("development", MergePolicy::OverrideAll, &mut accept)
            .unwrap()
            .unchanged);
    }

    #[test]
    fn test_failed_confirmation_restores_file() {
        let f = fixture();
        let project = linked(&f);
        fs::write(f.work.path().join(".env"), "A=1\n").unwrap();
        f.reconciler.push("development").unwrap();

        let other = tempfile::TempDir::new().unwrap();
        let store = FlakyStore {
            inner: Filesystem::new(f.home.path().join("flaky-projects")),
            writes_left: AtomicUsize::new(1),
        };
        let peer = f.peer_with_store(other.path(), Box::new(store));
        peer.link(&project.remote_project_id, "development").unwrap();

        let env = other.path().join(".env");
        fs::write(&env, "LOCAL=1\n").unwrap();
        let err = peer
            .pull("development", MergePolicy::OverrideAll, &mut accept)
            .unwrap_err();

        assert!(matches!(err, Error::Store(StoreError::WriteFailed { .. })));
        assert_eq!(fs::read_to_string(&env).unwrap(), "LOCAL=1\n");
        assert_eq!(peer.status("development").unwrap().last_synced_hash, "");
    }

    #[test]
    fn test_failed_confirmation_removes_new_file() {
        let f = fixture();
        let project = linked(&f);
        fs::write(f.work.path().join(".env"), "A=1\n").unwrap();
        f.reconciler.push("development").unwrap();

        let other = tempfile::TempDir::new().unwrap();
        let store = FlakyStore {
            inner: Filesystem::new(f.home.path().join("flaky-projects")),
            writes_left: AtomicUsize::new(1),
        };
        let peer = f.peer_with_store(other.path(), Box::new(store));
        peer.link(&project.remote_project_id, "development").unwrap();

        assert!(peer
            .pull("development", MergePolicy::OverrideAll, &mut accept)
            .is_err());
        assert!(!other.path().join(".env").exists());
    }
}
