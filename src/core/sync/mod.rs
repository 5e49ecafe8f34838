//! Sync reconciler.
//!
//! Keeps a stage's local secret file and its remote copy consistent. Every
//! operation starts from fresh hashes:
//!
//! - `L`: fingerprint of the local file
//! - `S`: last confirmed synchronized fingerprint, from the linked project
//! - `R`: fingerprint the remote vouches for, if any
//!
//! and either completes fully or leaves the local file, `S`, and the remote
//! hash claim as they were.

mod link;
mod pull;
mod push;

use std::collections::BTreeMap;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;
use zeroize::Zeroize;

use crate::core::cipher::{EnvelopeCipher, SealingKey};
use crate::core::constants::DEFAULT_BATCH_SIZE;
use crate::core::domain::{
    ConflictDecision, Env, LinkedProject, SyncAction, SyncReport, SyncStatus, Variable,
};
use crate::core::fingerprint;
use crate::core::keys::ScopeKeys;
use crate::core::merge::{KeyChange, MergePolicy};
use crate::core::remote::{GetVariablesRequest, GetVariablesResponse, Remote};
use crate::core::store::Store;
use crate::core::types::Fingerprint;
use crate::core::validation::{validate_key, validate_stage};
use crate::error::{Error, Result};

/// Decrypted remote values, keyed by name. Values are wiped on drop.
pub struct Plaintexts(BTreeMap<String, String>);

impl Deref for Plaintexts {
    type Target = BTreeMap<String, String>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Drop for Plaintexts {
    fn drop(&mut self) {
        for value in self.0.values_mut() {
            value.zeroize();
        }
    }
}

impl std::fmt::Debug for Plaintexts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}

/// Orchestrates push, pull and sync for one working directory.
pub struct Reconciler {
    pub(super) working_dir: PathBuf,
    pub(super) remote: Arc<dyn Remote>,
    pub(super) store: Box<dyn Store>,
    pub(super) cipher: EnvelopeCipher,
    pub(super) keys: ScopeKeys,
    pub(super) batch_size: usize,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("working_dir", &self.working_dir)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Create a reconciler for `working_dir`.
    ///
    /// The cipher carries the pepper; the store holds linked-project records.
    pub fn new(
        working_dir: impl Into<PathBuf>,
        remote: Arc<dyn Remote>,
        store: Box<dyn Store>,
        cipher: EnvelopeCipher,
    ) -> Self {
        Self {
            working_dir: working_dir.into(),
            keys: ScopeKeys::new(remote.clone()),
            remote,
            store,
            cipher,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Maximum number of names per remote mutation request (at least 1).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Working directory this reconciler syncs.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Path of the local secret file for `stage`.
    pub fn env_path(&self, stage: &str) -> PathBuf {
        Env::stage_path(&self.working_dir, stage)
    }

    /// Current local, last-synced and remote hashes, and what a sync would do.
    ///
    /// # Errors
    ///
    /// `Error::NotLinked` if the stage has no binding, `ValidationError` for a
    /// malformed local file, or any remote error.
    pub fn status(&self, stage: &str) -> Result<SyncStatus> {
        let project = self.linked(stage)?;
        let local_hash = fingerprint::of_map(&self.local_env(stage)?.to_map());
        let remote = self.fetch(&project, &project.last_synced_hash)?;
        let action = SyncAction::decide(
            &local_hash,
            &project.last_synced_hash,
            remote.hash.as_deref(),
        );

        debug!(
            stage = %stage,
            local = %local_hash,
            synced = %project.last_synced_hash,
            remote = ?remote.hash,
            action = %action,
            "sync status"
        );

        Ok(SyncStatus {
            stage: stage.to_string(),
            local_hash,
            last_synced_hash: project.last_synced_hash,
            remote_hash: remote.hash,
            action,
        })
    }

    /// Bring local and remote together.
    ///
    /// Pushes or pulls as the hashes dictate. When both sides changed,
    /// `on_conflict` decides; [`ConflictDecision::Abort`] returns
    /// `Error::Conflict` without touching either side.
    pub fn sync(
        &self,
        stage: &str,
        on_conflict: &mut dyn FnMut(&SyncStatus) -> ConflictDecision,
        policy: MergePolicy,
        confirm: &mut dyn FnMut(&KeyChange<'_>) -> bool,
    ) -> Result<SyncReport> {
        let status = self.status(stage)?;

        match status.action {
            SyncAction::None => Ok(SyncReport::UpToDate),
            SyncAction::Push => self.push(stage).map(SyncReport::Pushed),
            SyncAction::Pull => self.pull(stage, policy, confirm).map(SyncReport::Pulled),
            SyncAction::Conflict => match on_conflict(&status) {
                ConflictDecision::Push => self.push(stage).map(SyncReport::Pushed),
                ConflictDecision::Pull => {
                    self.pull(stage, policy, confirm).map(SyncReport::Pulled)
                }
                ConflictDecision::Abort => Err(Error::Conflict {
                    stage: stage.to_string(),
                }),
            },
        }
    }

    // --- Shared helpers ---

    /// Binding for `stage` in this working directory.
    pub(super) fn linked(&self, stage: &str) -> Result<LinkedProject> {
        validate_stage(stage)?;
        self.store.read(&self.working_dir, stage)
    }

    pub(super) fn local_env(&self, stage: &str) -> Result<Env> {
        Env::load_or_empty(self.env_path(stage))
    }

    /// Fingerprint of the local file as it is on disk right now.
    pub(super) fn local_hash(&self, stage: &str) -> Result<Fingerprint> {
        Ok(fingerprint::of_map(&self.local_env(stage)?.to_map()))
    }

    pub(super) fn fetch(
        &self,
        project: &LinkedProject,
        local_hash: &str,
    ) -> Result<GetVariablesResponse> {
        self.remote.get_variables(&GetVariablesRequest {
            scope: project.team_id.clone(),
            project_id: project.remote_project_id.clone(),
            stage: project.stage.clone(),
            local_hash: local_hash.to_string(),
        })
    }

    /// Derived key of the project's scope.
    pub(super) fn scope_key(&self, project: &LinkedProject) -> Result<SealingKey> {
        let salt = self.keys.get_or_create_salt(&project.team_id)?;
        self.cipher.key_for(&salt)
    }

    /// Decrypt remote variables in parallel.
    ///
    /// A failure names the variable, stage and scope.
    pub(super) fn decrypt_all(
        &self,
        project: &LinkedProject,
        variables: &[Variable],
    ) -> Result<Plaintexts> {
        if variables.is_empty() {
            return Ok(Plaintexts(BTreeMap::new()));
        }

        let key = self.scope_key(project)?;
        let pairs = variables
            .par_iter()
            .map(|var| {
                key.open(&var.value)
                    .map(|mut plain| (var.name.clone(), std::mem::take(&mut *plain)))
                    .map_err(|e| match e {
                        Error::Cipher(source) => Error::Decrypt {
                            key: var.name.clone(),
                            stage: project.stage.clone(),
                            scope: project.team_id.clone(),
                            source,
                        },
                        other => other,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Plaintexts(pairs.into_iter().collect()))
    }

    /// Reject remote names that could not be written to the local file.
    pub(super) fn check_names<'a>(
        project: &LinkedProject,
        names: impl IntoIterator<Item = &'a String>,
    ) -> Result<()> {
        for name in names {
            validate_key(name).map_err(|e| match e {
                Error::Validation(source) => Error::InvalidRemoteVariable {
                    key: name.clone(),
                    stage: project.stage.clone(),
                    scope: project.team_id.clone(),
                    source,
                },
                other => other,
            })?;
        }
        Ok(())
    }
}
