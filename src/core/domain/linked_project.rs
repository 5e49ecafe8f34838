//! Linked project type.
//!
//! Binds a working directory and stage to a remote project, and remembers the
//! fingerprint of the last state both sides agreed on.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::fingerprint;
use crate::core::store::{canonical_dir, project_name};
use crate::core::types::{Fingerprint, ProjectId, ScopeId, Stage};

/// Local binding between a working context and a remote project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedProject {
    /// Remote project identifier
    pub remote_project_id: ProjectId,
    /// Team scope that owns the project's salt
    pub team_id: ScopeId,
    /// Local project name (working directory name)
    pub name: String,
    /// Canonical working directory the binding belongs to
    #[serde(default)]
    pub working_dir: PathBuf,
    /// Stage this binding syncs
    pub stage: Stage,
    /// Fingerprint of the last confirmed synchronized state
    pub last_synced_hash: Fingerprint,
    /// When the binding was created
    pub linked_at: DateTime<Utc>,
}

impl LinkedProject {
    /// A fresh binding for `working_dir` that has never been synchronized.
    ///
    /// The name is the directory's final component; the directory is stored
    /// canonicalized.
    pub fn new(
        remote_project_id: impl Into<ProjectId>,
        team_id: impl Into<ScopeId>,
        working_dir: &Path,
        stage: impl Into<Stage>,
    ) -> Self {
        Self {
            remote_project_id: remote_project_id.into(),
            team_id: team_id.into(),
            name: project_name(working_dir),
            working_dir: canonical_dir(working_dir),
            stage: stage.into(),
            last_synced_hash: fingerprint::EMPTY.to_string(),
            linked_at: Utc::now(),
        }
    }

    /// Copy of this binding with a new confirmed hash.
    pub fn with_synced_hash(&self, hash: impl Into<Fingerprint>) -> Self {
        Self {
            last_synced_hash: hash.into(),
            ..self.clone()
        }
    }

    /// Whether a sync has ever been confirmed for this binding.
    pub fn has_synced(&self) -> bool {
        !self.last_synced_hash.is_empty()
    }
}
