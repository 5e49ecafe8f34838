//! Directory-backed remote store.
//!
//! Layout under the root directory:
//!
//! ```text
//! projects/<project-id>/project.json    ProjectInfo
//! projects/<project-id>/<stage>.json    StageDoc
//! salts/<scope>.salt                    base64 salt, never rewritten
//! ```
//!
//! Identifiers are used as path components verbatim. One that is not already
//! `[A-Za-z0-9_-]+` is rejected, so two ids never share a file.
//!
//! Documents are replaced atomically. Salt files are published with a
//! no-clobber rename, which is the uniqueness constraint for first-time salt
//! creation: exactly one concurrent inserter wins, across processes.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use super::{
    AddVariablesRequest, CreateProjectRequest, GetProjectRequest, GetVariablesRequest,
    GetVariablesResponse, InsertOutcome, MutationResponse, ProjectInfo, Remote,
    RemoveVariablesRequest, StageDoc, UpdateVariablesRequest,
};
use crate::core::domain::ScopeSalt;
use crate::core::store::{create_private_dir, sanitize, write_atomic};
use crate::error::{RemoteError, Result};

/// Remote store kept in a shared directory.
#[derive(Debug, Clone)]
pub struct FsRemote {
    root: PathBuf,
}

impl FsRemote {
    /// Remote rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn project_dir(&self, project_id: &str) -> Result<PathBuf> {
        if !is_component(project_id) {
            return Err(RemoteError::ProjectNotFound(project_id.to_string()).into());
        }
        Ok(self.root.join("projects").join(project_id))
    }

    fn stage_path(&self, project_id: &str, stage: &str) -> Result<PathBuf> {
        if !is_component(stage) {
            return Err(RemoteError::InvalidId(stage.to_string()).into());
        }
        Ok(self.project_dir(project_id)?.join(format!("{}.json", stage)))
    }

    fn salt_path(&self, scope: &str) -> Result<PathBuf> {
        if !is_component(scope) {
            return Err(RemoteError::InvalidId(scope.to_string()).into());
        }
        Ok(self.root.join("salts").join(format!("{}.salt", scope)))
    }

    fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(RemoteError::Io(e).into()),
        };

        serde_json::from_str(&contents).map(Some).map_err(|e| {
            RemoteError::Corrupt {
                path: path.display().to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            create_private_dir(parent).map_err(RemoteError::Io)?;
        }
        let contents = serde_json::to_vec_pretty(value).map_err(|e| RemoteError::Corrupt {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        write_atomic(path, &contents).map_err(RemoteError::Io)?;
        Ok(())
    }

    /// Load a project and check it belongs to `scope`.
    fn scoped_project(&self, scope: &str, project_id: &str) -> Result<ProjectInfo> {
        let project = self.get_project(&GetProjectRequest {
            project_id: project_id.to_string(),
        })?;
        if project.team_id != scope {
            return Err(RemoteError::ProjectNotFound(project_id.to_string()).into());
        }
        Ok(project)
    }

    /// Read-modify-write a stage document.
    fn mutate_stage(
        &self,
        scope: &str,
        project_id: &str,
        stage: &str,
        apply: impl FnOnce(&mut StageDoc) -> MutationResponse,
    ) -> Result<MutationResponse> {
        self.scoped_project(scope, project_id)?;

        let path = self.stage_path(project_id, stage)?;
        let mut doc: StageDoc = Self::read_json(&path)?.unwrap_or_default();
        let response = apply(&mut doc);
        Self::write_json(&path, &doc)?;

        debug!(
            project = %project_id,
            stage = %stage,
            additions = response.additions.len(),
            modifications = response.modifications.len(),
            removals = response.removals.len(),
            "stage updated"
        );
        Ok(response)
    }
}

/// Whether `id` can be used as a path component unchanged.
fn is_component(id: &str) -> bool {
    sanitize(id) == id
}

impl Remote for FsRemote {
    fn get_project(&self, req: &GetProjectRequest) -> Result<ProjectInfo> {
        let path = self.project_dir(&req.project_id)?.join("project.json");
        Self::read_json(&path)?
            .ok_or_else(|| RemoteError::ProjectNotFound(req.project_id.clone()).into())
    }

    fn create_project(&self, req: &CreateProjectRequest) -> Result<ProjectInfo> {
        if !is_component(&req.team_id) {
            return Err(RemoteError::InvalidId(req.team_id.clone()).into());
        }
        let project = ProjectInfo {
            id: uuid::Uuid::new_v4().to_string(),
            team_id: req.team_id.clone(),
            name: req.name.clone(),
            created_at: Utc::now(),
        };
        let path = self.project_dir(&project.id)?.join("project.json");
        Self::write_json(&path, &project)?;

        info!(project = %project.id, team = %project.team_id, "project created");
        Ok(project)
    }

    fn get_variables(&self, req: &GetVariablesRequest) -> Result<GetVariablesResponse> {
        self.scoped_project(&req.scope, &req.project_id)?;
        let doc: StageDoc =
            Self::read_json(&self.stage_path(&req.project_id, &req.stage)?)?.unwrap_or_default();
        Ok(doc.snapshot(&req.local_hash))
    }

    fn add_variables(&self, req: &AddVariablesRequest) -> Result<MutationResponse> {
        self.mutate_stage(&req.scope, &req.project_id, &req.stage, |doc| {
            doc.upsert(&req.stage, &req.variables, req.content_hash.clone())
        })
    }

    fn update_variables(&self, req: &UpdateVariablesRequest) -> Result<MutationResponse> {
        self.mutate_stage(&req.scope, &req.project_id, &req.stage, |doc| {
            doc.upsert(&req.stage, &req.variables, req.content_hash.clone())
        })
    }

    fn remove_variables(&self, req: &RemoveVariablesRequest) -> Result<MutationResponse> {
        self.mutate_stage(&req.scope, &req.project_id, &req.stage, |doc| {
            doc.remove(&req.names, req.content_hash.clone())
        })
    }

    fn read_salt(&self, scope: &str) -> Result<Option<ScopeSalt>> {
        let path = self.salt_path(scope)?;
        let contents = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(RemoteError::Io(e).into()),
        };

        ScopeSalt::from_base64(&contents).map(Some).ok_or_else(|| {
            RemoteError::Corrupt {
                path: path.display().to_string(),
                reason: "salt must be 32 base64-encoded bytes".to_string(),
            }
            .into()
        })
    }

    fn insert_salt(&self, scope: &str, salt: &ScopeSalt) -> Result<InsertOutcome> {
        let path = self.salt_path(scope)?;
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        create_private_dir(&dir).map_err(RemoteError::Io)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(RemoteError::Io)?;
        tmp.write_all(salt.to_base64().as_bytes())
            .map_err(RemoteError::Io)?;
        tmp.as_file().sync_all().map_err(RemoteError::Io)?;

        match tmp.persist_noclobber(&path) {
            Ok(_) => {
                info!(scope = %scope, "scope salt created");
                Ok(InsertOutcome::Inserted)
            }
            Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
                debug!(scope = %scope, "scope salt already exists");
                Ok(InsertOutcome::Conflict)
            }
            Err(e) => Err(RemoteError::Io(e.error).into()),
        }
    }
}
