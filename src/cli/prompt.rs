//! Interactive decisions for pull and sync.
//!
//! Without a terminal nothing is asked: per-key prompts keep the local value
//! and conflicts abort.

use std::io::{self, IsTerminal};

use dialoguer::{Confirm, Select};
use tracing::warn;

use crate::cli::output;
use crate::core::domain::{ConflictDecision, SyncStatus};
use crate::core::merge::KeyChange;

fn interactive() -> bool {
    io::stdin().is_terminal() && io::stderr().is_terminal()
}

/// Ask whether to take the remote side of one name.
pub fn confirm_key(change: &KeyChange<'_>) -> bool {
    if !interactive() {
        return false;
    }

    let prompt = if change.is_removal() {
        format!("{} was removed remotely. Remove locally?", output::key(change.name))
    } else if change.existing.is_none() {
        format!("Add {} from remote?", output::key(change.name))
    } else {
        format!("{} changed remotely. Take remote value?", output::key(change.name))
    };

    match Confirm::new().with_prompt(prompt).default(false).interact() {
        Ok(answer) => answer,
        Err(e) => {
            warn!(error = %e, "prompt failed, keeping local value");
            false
        }
    }
}

/// Ask how to resolve a conflict.
pub fn resolve_conflict(status: &SyncStatus) -> ConflictDecision {
    output::warn(&format!(
        "local and remote both changed since the last sync (stage {})",
        status.stage
    ));
    if !interactive() {
        return ConflictDecision::Abort;
    }

    let choices = [
        "pull (merge remote into local)",
        "push (overwrite remote)",
        "abort",
    ];
    match Select::new()
        .with_prompt("Resolve conflict")
        .items(&choices)
        .default(2)
        .interact()
    {
        Ok(0) => ConflictDecision::Pull,
        Ok(1) => ConflictDecision::Push,
        Ok(_) => ConflictDecision::Abort,
        Err(e) => {
            warn!(error = %e, "prompt failed, aborting");
            ConflictDecision::Abort
        }
    }
}
