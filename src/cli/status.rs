//! Status command.

use crate::cli::{output, reconciler};
use crate::core::config::Settings;
use crate::core::domain::SyncAction;
use crate::error::Result;

/// Show the three hashes for a stage, or every binding with `all`.
pub fn execute(stage: &str, all: bool) -> Result<()> {
    let sync = reconciler(&Settings::load()?)?;

    if all {
        let links = sync.links()?;
        output::section("Linked projects");
        if links.is_empty() {
            output::dimmed("none");
        }
        for link in links {
            output::kv(
                &format!("{}@{}", link.name, link.stage),
                format!(
                    "{}  synced {}  {}",
                    link.remote_project_id,
                    output::hash(Some(&link.last_synced_hash)),
                    output::path(&link.working_dir.display().to_string())
                ),
            );
        }
        return Ok(());
    }

    let status = sync.status(stage)?;

    output::section("Sync status");
    output::kv("stage", &status.stage);
    output::kv("file", output::path(&sync.env_path(stage).display().to_string()));
    output::kv("local", output::hash(Some(&status.local_hash)));
    output::kv("synced", output::hash(Some(&status.last_synced_hash)));
    output::kv("remote", output::hash(status.remote_hash.as_deref()));
    output::kv("action", status.action);

    match status.action {
        SyncAction::None => output::success("in sync"),
        SyncAction::Push => output::hint(&format!("run: {}", output::cmd("dotsync push"))),
        SyncAction::Pull => output::hint(&format!("run: {}", output::cmd("dotsync pull"))),
        SyncAction::Conflict => output::warn(&format!(
            "both sides changed; run: {}",
            output::cmd("dotsync sync --on-conflict pull|push")
        )),
    }
    Ok(())
}
