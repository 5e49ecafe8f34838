//! Sync decision and result types.

use crate::core::types::{Fingerprint, Stage};

/// What a sync should do, derived from local, last-synced and remote hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// Both sides match the last synchronized state.
    None,
    /// Only the local side changed.
    Push,
    /// Only the remote side changed.
    Pull,
    /// Both sides changed; the caller must choose.
    Conflict,
}

impl SyncAction {
    /// Three-way comparison against the last synchronized hash.
    ///
    /// A remote hash of `None` means the remote could not vouch for its
    /// content (e.g. after an interrupted push) and counts as changed.
    pub fn decide(local: &str, last_synced: &str, remote: Option<&str>) -> Self {
        let local_changed = local != last_synced;
        let remote_changed = remote != Some(last_synced);

        match (local_changed, remote_changed) {
            (false, false) => Self::None,
            (true, false) => Self::Push,
            (false, true) => Self::Pull,
            (true, true) => Self::Conflict,
        }
    }
}

impl std::fmt::Display for SyncAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Push => "push",
            Self::Pull => "pull",
            Self::Conflict => "conflict",
        };
        write!(f, "{}", name)
    }
}

/// The caller's answer to a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictDecision {
    /// Take the remote state (merged under the pull policy).
    Pull,
    /// Overwrite the remote with the local state.
    Push,
    /// Leave both sides untouched.
    Abort,
}

/// Snapshot of the three hashes and the resulting action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncStatus {
    pub stage: Stage,
    pub local_hash: Fingerprint,
    pub last_synced_hash: Fingerprint,
    pub remote_hash: Option<Fingerprint>,
    pub action: SyncAction,
}

/// Result of a push.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushReport {
    /// Names created remotely
    pub added: Vec<String>,
    /// Names whose remote value changed
    pub updated: Vec<String>,
    /// Names deleted remotely
    pub removed: Vec<String>,
    /// Confirmed hash recorded locally
    pub synced_hash: Fingerprint,
}

impl PushReport {
    /// Whether the remote was modified.
    pub fn changed(&self) -> bool {
        !(self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty())
    }
}

/// Result of a pull.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullReport {
    /// Remote reported no change; nothing was written
    pub unchanged: bool,
    pub added: Vec<String>,
    pub changed: Vec<String>,
    pub removed: Vec<String>,
    /// Names where the local value was kept over the remote one
    pub kept: Vec<String>,
    /// Confirmed hash recorded locally
    pub synced_hash: Fingerprint,
}

/// Result of a sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncReport {
    /// Nothing to do.
    UpToDate,
    Pushed(PushReport),
    Pulled(PullReport),
}
