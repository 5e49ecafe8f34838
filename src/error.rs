//! Error types.
//!
//! Every fallible operation returns [`Result`]. Sub-errors are grouped by the
//! component that raises them and converted into [`Error`] with `?`.

use thiserror::Error;

/// Top-level error for all dotsync operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// No linked project for this working directory and stage.
    #[error("not linked: no project bound to '{project}' for stage '{stage}'")]
    NotLinked { project: String, stage: String },

    /// A value could not be decrypted while syncing. Every [`CipherError`]
    /// raised while opening a remote value lands here.
    #[error("failed to decrypt '{key}' (stage '{stage}', scope '{scope}'): {source}")]
    Decrypt {
        key: String,
        stage: String,
        scope: String,
        #[source]
        source: CipherError,
    },

    /// A remote variable name that cannot be written to a local file.
    #[error("invalid remote variable '{key}' (stage '{stage}', scope '{scope}'): {source}")]
    InvalidRemoteVariable {
        key: String,
        stage: String,
        scope: String,
        #[source]
        source: ValidationError,
    },

    /// Local and remote both diverged from the last synchronized state.
    #[error("conflict: local and remote both changed since last sync (stage '{stage}')")]
    Conflict { stage: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Settings errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no remote configured: set DOTSYNC_REMOTE or `remote` in {path}")]
    NoRemote { path: String },

    #[error("no pepper configured: set DOTSYNC_PEPPER or DOTSYNC_PEPPER_FILE")]
    NoPepper,

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read settings: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unable to determine home directory")]
    NoHome,
}

/// Input and local-content validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("variable name cannot be empty")]
    EmptyKey,

    #[error("invalid variable name '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("malformed line {line} in {path}: expected NAME=value")]
    MalformedLine { path: String, line: usize },

    #[error("duplicate variable '{key}' in {path}")]
    DuplicateKey { path: String, key: String },

    #[error("invalid stage '{0}': use letters, digits, '-' or '_'")]
    InvalidStage(String),

    #[error("pepper too short: need at least {min} bytes, got {actual}")]
    WeakPepper { min: usize, actual: usize },

    #[error("insecure permissions on {path}: expected {expected}, found {actual}")]
    InvalidPermissions {
        path: String,
        expected: String,
        actual: String,
    },
}

/// Envelope encryption errors.
///
/// Any of these coming out of a decrypt, `UnsupportedVersion` included, means
/// the value could not be decrypted.
#[derive(Error, Debug)]
pub enum CipherError {
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("unsupported envelope version {0}")]
    UnsupportedVersion(u64),

    #[error("key derivation failed: {0}")]
    KdfFailed(String),
}

/// Failures reported by the remote store. All are safe to retry.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("remote unavailable: {0}")]
    Unavailable(String),

    #[error("remote project not found: {0}")]
    ProjectNotFound(String),

    #[error("salt for scope '{0}' could not be read after insert conflict")]
    SaltUnavailable(String),

    #[error("invalid remote identifier '{0}': use letters, digits, '-' or '_'")]
    InvalidId(String),

    #[error("corrupt remote record {path}: {reason}")]
    Corrupt { path: String, reason: String },

    #[error("remote io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Linked-project store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to read linked project {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write linked project {path}: {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid linked project {path}: {reason}")]
    InvalidFormat { path: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// A follow-up command to suggest to the user, if any.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Error::NotLinked { .. } => Some("run: dotsync link <project-id> (or dotsync init)"),
            Error::Conflict { .. } => Some("run: dotsync sync --on-conflict pull|push"),
            Error::Config(ConfigError::NoRemote { .. }) => Some("set DOTSYNC_REMOTE=<dir>"),
            Error::Config(ConfigError::NoPepper) => Some("set DOTSYNC_PEPPER"),
            Error::InvalidRemoteVariable { .. } => {
                Some("run: dotsync push (removes the name from the remote); the local file is unchanged")
            }
            Error::Remote(_) => Some("the operation left local state untouched; retry"),
            _ => None,
        }
    }
}
