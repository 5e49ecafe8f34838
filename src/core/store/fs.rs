//! Filesystem-based linked-project storage.
//!
//! Stores bindings as JSON in `~/.dotsync/projects/<name>-<tag>@<stage>.json`,
//! where `tag` identifies the full working directory path, so two checkouts
//! with the same directory name keep separate bindings.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{
    canonical_dir, create_private_dir, dir_tag, project_name, sanitize, write_atomic, Store,
};
use crate::core::constants;
use crate::core::domain::LinkedProject;
use crate::error::{Error, Result, StoreError};

/// Filesystem-based linked-project storage.
#[derive(Debug, Clone)]
pub struct Filesystem {
    root: PathBuf,
}

impl Filesystem {
    /// Store rooted at `root` (created on first write).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the records.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Record path for a (working directory, stage) pair.
    fn record_path(&self, working_dir: &Path, stage: &str) -> PathBuf {
        self.root.join(format!(
            "{}-{}@{}.json",
            sanitize(&project_name(working_dir)),
            dir_tag(working_dir),
            sanitize(stage)
        ))
    }

    fn load(path: &Path) -> Result<LinkedProject> {
        #[cfg(unix)]
        {
            if crate::core::validation::validate_file_permissions(path, constants::FILE_MODE)
                .is_err()
            {
                warn!(path = %path.display(), "insecure linked project permissions");
            }
        }

        let contents = fs::read_to_string(path).map_err(|source| StoreError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            StoreError::InvalidFormat {
                path: path.display().to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }
}

impl Store for Filesystem {
    fn write(&self, project: &LinkedProject) -> Result<()> {
        let path = self.record_path(&project.working_dir, &project.stage);
        debug!(path = %path.display(), hash = %project.last_synced_hash, "writing linked project");

        let write_failed = |source| StoreError::WriteFailed {
            path: path.display().to_string(),
            source,
        };

        create_private_dir(&self.root).map_err(write_failed)?;

        let contents = serde_json::to_vec_pretty(project).map_err(|e| StoreError::InvalidFormat {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        write_atomic(&path, &contents).map_err(write_failed)?;

        Ok(())
    }

    fn read(&self, working_dir: &Path, stage: &str) -> Result<LinkedProject> {
        self.find(working_dir, stage)?.ok_or_else(|| Error::NotLinked {
            project: project_name(working_dir),
            stage: stage.to_string(),
        })
    }

    fn find(&self, working_dir: &Path, stage: &str) -> Result<Option<LinkedProject>> {
        let path = self.record_path(working_dir, stage);
        if !path.exists() {
            debug!(path = %path.display(), "no linked project");
            return Ok(None);
        }

        let project = Self::load(&path)?;
        if canonical_dir(&project.working_dir) != canonical_dir(working_dir) {
            debug!(
                path = %path.display(),
                recorded = %project.working_dir.display(),
                "linked project belongs to another directory"
            );
            return Ok(None);
        }
        Ok(Some(project))
    }

    fn remove(&self, working_dir: &Path, stage: &str) -> Result<bool> {
        let path = self.record_path(working_dir, stage);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "linked project removed");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StoreError::WriteFailed {
                path: path.display().to_string(),
                source,
            }
            .into()),
        }
    }

    fn list(&self) -> Result<Vec<LinkedProject>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut projects = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            projects.push(Self::load(&path)?);
        }

        projects.sort_by(|a, b| (&a.name, &a.stage).cmp(&(&b.name, &b.stage)));
        Ok(projects)
    }
}
