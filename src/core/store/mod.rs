//! Linked-project storage.
//!
//! Keeps one [`LinkedProject`] record per (project, stage) under a
//! user-scoped directory, so a working directory knows which remote project
//! it syncs with and which state was last confirmed on both sides.
//!
//! ## Adding a New Storage Backend
//!
//! 1. Implement the `Store` trait
//! 2. Publish writes atomically: readers must never see half a record
//! 3. Re-export from this module

use std::io::Write;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::core::constants;
use crate::core::domain::LinkedProject;
use crate::error::Result;

mod fs;

pub use fs::Filesystem;

/// Linked-project storage trait.
pub trait Store: Send + Sync {
    /// Persist a binding, replacing any previous one for the same
    /// (project, stage).
    fn write(&self, project: &LinkedProject) -> Result<()>;

    /// Load the binding for a working directory and stage.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotLinked` if there is none.
    fn read(&self, working_dir: &Path, stage: &str) -> Result<LinkedProject>;

    /// Like `read`, but a missing binding is `None`.
    fn find(&self, working_dir: &Path, stage: &str) -> Result<Option<LinkedProject>>;

    /// Delete a binding. Returns whether one existed.
    fn remove(&self, working_dir: &Path, stage: &str) -> Result<bool>;

    /// All bindings, sorted by name then stage.
    fn list(&self) -> Result<Vec<LinkedProject>>;
}

/// Local project name for a working directory (its final path component).
pub fn project_name(working_dir: &Path) -> String {
    working_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "default".to_string())
}

/// Resolve a working directory to its canonical form, falling back to the path
/// as given when it cannot be resolved (for example, it no longer exists).
pub fn canonical_dir(working_dir: &Path) -> PathBuf {
    std::fs::canonicalize(working_dir).unwrap_or_else(|_| working_dir.to_path_buf())
}

/// Short stable tag for a working directory: the first 12 hex characters of
/// the SHA-256 of its canonical path.
pub fn dir_tag(working_dir: &Path) -> String {
    let digest = Sha256::digest(canonical_dir(working_dir).to_string_lossy().as_bytes());
    digest[..6].iter().map(|b| format!("{:02x}", b)).collect()
}

/// Reduce a string to a safe single path component.
///
/// Keeps `[A-Za-z0-9_-]` and replaces everything else with `_`. An empty input
/// becomes `_`. The result can never be `.`/`..` or contain a separator.
pub fn sanitize(component: &str) -> String {
    let cleaned: String = component
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

/// Create a directory (and parents) with owner-only permissions.
pub(crate) fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        std::fs::DirBuilder::new()
            .recursive(true)
            .mode(constants::DIR_MODE)
            .create(dir)
    }

    #[cfg(not(unix))]
    {
        std::fs::create_dir_all(dir)
    }
}

/// Write `contents` to `path` via a temp file in the same directory and an
/// atomic rename. The file ends up with mode 0600.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(constants::FILE_MODE))?;
    }

    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
