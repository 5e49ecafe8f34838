//! Sync command - push or pull, whichever side changed.

use tracing::info;

use crate::cli::{output, prompt, pull, push, reconciler, OnConflict};
use crate::core::config::Settings;
use crate::core::domain::{ConflictDecision, SyncReport, SyncStatus};
use crate::core::merge::MergePolicy;
use crate::error::Result;

/// Sync the local file with the remote.
///
/// Conflicts are resolved by `on_conflict` when given, otherwise by asking.
pub fn execute(stage: &str, policy: MergePolicy, on_conflict: Option<OnConflict>) -> Result<()> {
    let sync = reconciler(&Settings::load()?)?;

    let mut decide = |status: &SyncStatus| match on_conflict {
        Some(OnConflict::Pull) => ConflictDecision::Pull,
        Some(OnConflict::Push) => ConflictDecision::Push,
        Some(OnConflict::Abort) => ConflictDecision::Abort,
        None => prompt::resolve_conflict(status),
    };

    let report = sync.sync(stage, &mut decide, policy, &mut prompt::confirm_key)?;
    info!(stage = %stage, "sync finished");

    match report {
        SyncReport::UpToDate => output::success(&format!("in sync ({})", stage)),
        SyncReport::Pushed(report) => push::print_report(stage, &report),
        SyncReport::Pulled(report) => pull::print_report(stage, &report),
    }
    Ok(())
}
