//! Link and unlink commands.

use crate::cli::{output, reconciler};
use crate::core::config::Settings;
use crate::error::Result;

/// Bind the current directory to an existing remote project.
pub fn link(project_id: &str, stage: &str) -> Result<()> {
    let sync = reconciler(&Settings::load()?)?;
    let project = sync.link(project_id, stage)?;

    output::success(&format!(
        "linked {} to {} ({})",
        output::key(&project.name),
        project.remote_project_id,
        project.stage
    ));
    output::hint(&format!("next: {}", output::cmd("dotsync sync")));
    Ok(())
}

/// Remove the current directory's binding.
pub fn unlink(stage: &str) -> Result<()> {
    let sync = reconciler(&Settings::load()?)?;
    if sync.unlink(stage)? {
        output::success(&format!("unlinked ({})", stage));
    } else {
        output::warn(&format!("nothing linked for stage {}", stage));
    }
    Ok(())
}
