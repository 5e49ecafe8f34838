//! Env type.
//!
//! Represents a parsed .env file with typed access. This is the local side of
//! every sync: its entries are what gets fingerprinted and pushed, and pulls
//! publish a new one atomically.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::constants;
use crate::core::store;
use crate::core::validation::validate_key;
use crate::error::{Result, ValidationError};

/// A parsed .env file
#[derive(Debug, Clone)]
pub struct Env {
    entries: Vec<(String, String)>,
    path: PathBuf,
}

impl Env {
    /// Parse an .env file from disk
    ///
    /// Skips empty lines and comments (lines starting with #).
    /// Supports values with or without quotes and an optional `export ` prefix.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if a line is not `NAME=value`, a name is not a
    /// valid variable name, or a name appears twice. Returns an io error if the
    /// file cannot be read.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let env = Self::parse(&contents, path)?;
        debug!(path = %path.display(), entries = env.len(), "env loaded");
        Ok(env)
    }

    /// Like [`Env::load`], but a missing file is an empty env.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "env missing, treating as empty");
            return Ok(Self::from_pairs(Vec::new(), path.to_path_buf()));
        }
        Self::load(path)
    }

    /// Parse .env content. `path` is only used for error messages.
    pub fn parse(contents: &str, path: &Path) -> Result<Self> {
        let mut entries: Vec<(String, String)> = Vec::new();
        let display = path.display().to_string();

        for (i, line) in contents.lines().enumerate() {
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=').ok_or(ValidationError::MalformedLine {
                path: display.clone(),
                line: i + 1,
            })?;

            let key = key.trim().to_string();
            validate_key(&key)?;
            if entries.iter().any(|(k, _)| *k == key) {
                return Err(ValidationError::DuplicateKey {
                    path: display,
                    key,
                }
                .into());
            }

            entries.push((key, parse_env_value(value.trim())));
        }

        Ok(Self {
            entries,
            path: path.to_path_buf(),
        })
    }

    /// Create from raw key-value pairs
    pub fn from_pairs(pairs: Vec<(String, String)>, path: PathBuf) -> Self {
        Self {
            entries: pairs,
            path,
        }
    }

    /// Create from a map; entries are written in name order.
    pub fn from_map(map: BTreeMap<String, String>, path: PathBuf) -> Self {
        Self::from_pairs(map.into_iter().collect(), path)
    }

    /// Path of the secret file for a stage inside `dir`.
    ///
    /// `.env` for the default stage, `.env.<stage>` for every other stage.
    pub fn stage_path(dir: &Path, stage: &str) -> PathBuf {
        if stage == constants::DEFAULT_STAGE {
            dir.join(constants::ENV_FILE)
        } else {
            dir.join(format!("{}.{}", constants::ENV_FILE, stage))
        }
    }

    /// Write the env file to disk atomically
    ///
    /// Content goes to a temporary file in the same directory with mode 0600,
    /// which is then renamed over the target. Readers see either the old file
    /// or the new one, never a partial write.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written or renamed.
    pub fn save(&self) -> Result<()> {
        store::write_atomic(&self.path, self.to_env_string().as_bytes())?;
        debug!(path = %self.path.display(), entries = self.len(), "env saved");
        Ok(())
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All entries as key-value pairs
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Entries as a name-ordered map.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.entries.iter().cloned().collect()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// File path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialize to .env format string
    ///
    /// Quotes values that contain spaces or special characters.
    fn to_env_string(&self) -> String {
        let mut output = String::new();

        for (key, value) in &self.entries {
            if needs_quotes(value) {
                output.push_str(&format!("{}=\"{}\"\n", key, escape_env_value(value)));
            } else {
                output.push_str(&format!("{}={}\n", key, value));
            }
        }

        output
    }
}

fn parse_env_value(raw: &str) -> String {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        return unescape_double_quoted(&raw[1..raw.len() - 1]);
    }

    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return raw[1..raw.len() - 1].to_string();
    }

    raw.to_string()
}

fn unescape_double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }

        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

fn needs_quotes(value: &str) -> bool {
    value.is_empty()
        || value.chars().any(|ch| ch.is_whitespace())
        || value.contains('#')
        || value.contains('=')
        || value.contains('"')
        || value.contains('\'')
        || value.contains('\\')
}

fn escape_env_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());

    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            _ => escaped.push(ch),
        }
    }

    escaped
}

impl std::fmt::Display for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_env_string())
    }
}
