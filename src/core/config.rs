//! User settings.
//!
//! Read from `~/.dotsync/config.toml`, then overridden by environment
//! variables:
//!
//! | Variable              | Setting       |
//! |-----------------------|---------------|
//! | `DOTSYNC_HOME`        | state directory (replaces `~/.dotsync`) |
//! | `DOTSYNC_REMOTE`      | `remote`      |
//! | `DOTSYNC_PEPPER`      | pepper value  |
//! | `DOTSYNC_PEPPER_FILE` | `pepper_file` |
//! | `DOTSYNC_BATCH_SIZE`  | `batch_size`  |
//!
//! The pepper itself is never read from the settings file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::core::cipher::Pepper;
use crate::core::constants;
use crate::error::{ConfigError, Result};

/// Settings shared by every command.
#[derive(Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Remote store directory
    pub remote: Option<PathBuf>,
    /// File holding the pepper
    pub pepper_file: Option<PathBuf>,
    /// Names per remote mutation request
    pub batch_size: Option<usize>,
    /// Team scope used by `init` when none is given
    pub team: Option<String>,

    #[serde(skip)]
    pepper: Option<Zeroizing<String>>,
    #[serde(skip)]
    path: PathBuf,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("remote", &self.remote)
            .field("pepper_file", &self.pepper_file)
            .field("batch_size", &self.batch_size)
            .field("team", &self.team)
            .field("pepper", &self.pepper.as_ref().map(|_| ".."))
            .field("path", &self.path)
            .finish()
    }
}

/// State directory: `DOTSYNC_HOME`, else `~/.dotsync`.
pub fn home_dir() -> Result<PathBuf> {
    home_dir_with(|key| std::env::var(key).ok())
}

fn home_dir_with(lookup: impl Fn(&str) -> Option<String>) -> Result<PathBuf> {
    if let Some(home) = lookup(constants::ENV_HOME).filter(|h| !h.is_empty()) {
        return Ok(PathBuf::from(home));
    }
    dirs::home_dir()
        .map(|h| h.join(constants::HOME_DIR))
        .ok_or_else(|| ConfigError::NoHome.into())
}

/// Directory holding linked-project records.
pub fn projects_dir(home: &Path) -> PathBuf {
    home.join(constants::PROJECTS_DIR)
}

impl Settings {
    /// Load settings from the state directory and the process environment.
    ///
    /// A missing settings file is not an error.
    ///
    /// # Errors
    ///
    /// `ConfigError` if the file cannot be read or parsed, or an environment
    /// override is invalid.
    pub fn load() -> Result<Self> {
        let lookup = |key: &str| std::env::var(key).ok();
        Self::load_with(&home_dir_with(lookup)?, lookup)
    }

    /// Load from `home`, taking overrides from `lookup` instead of the
    /// process environment.
    pub fn load_with(home: &Path, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let path = home.join(constants::SETTINGS_FILE);

        let mut settings = if path.exists() {
            debug!(path = %path.display(), "loading settings");
            let contents = std::fs::read_to_string(&path).map_err(ConfigError::ReadFile)?;
            toml::from_str::<Self>(&contents).map_err(ConfigError::Parse)?
        } else {
            Self::default()
        };
        settings.path = path;
        settings.apply_env(lookup)?;
        settings.validate()?;

        debug!(
            remote = ?settings.remote,
            batch_size = settings.batch_size(),
            "settings loaded"
        );
        Ok(settings)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key| lookup(key).filter(|v: &String| !v.is_empty());

        if let Some(remote) = get(constants::ENV_REMOTE) {
            self.remote = Some(PathBuf::from(remote));
        }
        if let Some(file) = get(constants::ENV_PEPPER_FILE) {
            self.pepper_file = Some(PathBuf::from(file));
        }
        if let Some(pepper) = get(constants::ENV_PEPPER) {
            self.pepper = Some(Zeroizing::new(pepper));
        }
        if let Some(size) = get(constants::ENV_BATCH_SIZE) {
            let size: usize = size.parse().map_err(|e| ConfigError::InvalidValue {
                field: constants::ENV_BATCH_SIZE,
                reason: format!("{}", e),
            })?;
            self.batch_size = Some(size);
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.batch_size == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "batch_size",
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Path of the settings file (whether or not it exists).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names per remote mutation request.
    pub fn batch_size(&self) -> usize {
        self.batch_size.unwrap_or(constants::DEFAULT_BATCH_SIZE)
    }

    /// Remote store directory.
    ///
    /// # Errors
    ///
    /// `ConfigError::NoRemote` if neither the file nor the environment set one.
    pub fn remote_root(&self) -> Result<&Path> {
        self.remote.as_deref().ok_or_else(|| {
            ConfigError::NoRemote {
                path: self.path.display().to_string(),
            }
            .into()
        })
    }

    /// The pepper: `DOTSYNC_PEPPER` if set, else the contents of the pepper
    /// file with trailing line breaks removed.
    ///
    /// # Errors
    ///
    /// `ConfigError::NoPepper` if neither is set, `ConfigError::ReadFile` if
    /// the file cannot be read, `ValidationError::WeakPepper` if too short.
    pub fn pepper(&self) -> Result<Pepper> {
        if let Some(pepper) = &self.pepper {
            return Pepper::new(pepper.as_bytes());
        }

        let file = self.pepper_file.as_deref().ok_or(ConfigError::NoPepper)?;

        #[cfg(unix)]
        if crate::core::validation::validate_file_permissions(file, constants::FILE_MODE).is_err() {
            warn!(path = %file.display(), "pepper file is readable by others");
        }

        let contents = Zeroizing::new(std::fs::read(file).map_err(ConfigError::ReadFile)?);
        let trimmed = contents
            .iter()
            .rposition(|b| *b != b'\n' && *b != b'\r')
            .map_or(&contents[..0], |end| &contents[..=end]);
        Pepper::new(trimmed)
    }
}
