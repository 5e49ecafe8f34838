//! Constants used throughout dotsync.
//!
//! Centralizes file names, environment variables and fixed parameters.

/// Default stage when none is given.
pub const DEFAULT_STAGE: &str = "development";

/// Secret file for the default stage. Other stages use `.env.<stage>`.
pub const ENV_FILE: &str = ".env";

/// Per-user state directory relative to HOME (~/.dotsync).
pub const HOME_DIR: &str = ".dotsync";

/// Linked-project records live under `<home>/projects`.
pub const PROJECTS_DIR: &str = "projects";

/// Settings file name inside the state directory.
pub const SETTINGS_FILE: &str = "config.toml";

/// Overrides the state directory (defaults to ~/.dotsync).
pub const ENV_HOME: &str = "DOTSYNC_HOME";

/// Remote store location.
pub const ENV_REMOTE: &str = "DOTSYNC_REMOTE";

/// Pepper value.
pub const ENV_PEPPER: &str = "DOTSYNC_PEPPER";

/// File containing the pepper.
pub const ENV_PEPPER_FILE: &str = "DOTSYNC_PEPPER_FILE";

/// Maximum names per remote mutation request.
pub const ENV_BATCH_SIZE: &str = "DOTSYNC_BATCH_SIZE";

/// Default number of names per remote mutation request.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Scope salt length in bytes.
pub const SALT_LEN: usize = 32;

/// Minimum pepper length in bytes.
pub const MIN_PEPPER_LEN: usize = 16;

/// Owner-only file mode for everything dotsync writes locally.
pub const FILE_MODE: u32 = 0o600;

/// Owner-only directory mode.
pub const DIR_MODE: u32 = 0o700;
