//! Binding a working directory to remote projects.

use tracing::info;

use super::Reconciler;
use crate::core::domain::LinkedProject;
use crate::core::remote::{CreateProjectRequest, GetProjectRequest};
use crate::core::store::project_name;
use crate::core::validation::validate_stage;
use crate::error::Result;

impl Reconciler {
    /// Bind this working directory's `stage` to an existing remote project.
    ///
    /// Replaces any previous binding for the stage. The new binding has never
    /// been synchronized.
    ///
    /// # Errors
    ///
    /// `RemoteError::ProjectNotFound` if the remote has no such project.
    pub fn link(&self, remote_project_id: &str, stage: &str) -> Result<LinkedProject> {
        validate_stage(stage)?;
        let remote = self.remote.get_project(&GetProjectRequest {
            project_id: remote_project_id.to_string(),
        })?;

        let project = LinkedProject::new(remote.id, remote.team_id, &self.working_dir, stage);
        self.store.write(&project)?;

        info!(
            project = %project.remote_project_id,
            team = %project.team_id,
            stage = %stage,
            "linked"
        );
        Ok(project)
    }

    /// Remove the binding for `stage`. Returns whether one existed.
    pub fn unlink(&self, stage: &str) -> Result<bool> {
        validate_stage(stage)?;
        let removed = self.store.remove(&self.working_dir, stage)?;
        if removed {
            info!(stage = %stage, "unlinked");
        }
        Ok(removed)
    }

    /// Create a remote project owned by `team_id` and link it.
    ///
    /// `name` defaults to the working directory name. The team's salt is
    /// created now if the team has none, so the first push does not race.
    pub fn init(&self, name: Option<&str>, team_id: &str, stage: &str) -> Result<LinkedProject> {
        validate_stage(stage)?;
        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| project_name(&self.working_dir));

        self.keys.get_or_create_salt(team_id)?;
        let remote = self.remote.create_project(&CreateProjectRequest {
            name,
            team_id: team_id.to_string(),
        })?;

        self.link(&remote.id, stage)
    }

    /// Every binding in the local store, across directories and stages.
    pub fn links(&self) -> Result<Vec<LinkedProject>> {
        self.store.list()
    }
}
