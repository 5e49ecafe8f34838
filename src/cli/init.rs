//! Init command - create a remote project and link it.

use tracing::info;

use crate::cli::{output, reconciler};
use crate::core::config::Settings;
use crate::error::Result;

/// Create a remote project for the current directory.
///
/// The team defaults to the `team` setting, then to the current user name.
pub fn execute(name: Option<&str>, team: Option<String>, stage: &str) -> Result<()> {
    let settings = Settings::load()?;
    let team = team
        .or_else(|| settings.team.clone())
        .unwrap_or_else(whoami::username);

    info!(team = %team, stage = %stage, "initializing");
    let sync = reconciler(&settings)?;
    let project = sync.init(name, &team, stage)?;

    output::success(&format!(
        "created project {} (team {})",
        output::key(&project.remote_project_id),
        team
    ));
    output::kv("stage", &project.stage);
    output::kv("file", output::path(&sync.env_path(stage).display().to_string()));
    output::hint(&format!(
        "share the id; others run: {}",
        output::cmd(&format!("dotsync link {}", project.remote_project_id))
    ));
    Ok(())
}
