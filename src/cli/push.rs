//! Push command.

use crate::cli::{output, reconciler};
use crate::core::config::Settings;
use crate::core::domain::PushReport;
use crate::error::Result;

/// Push the local file to the remote.
pub fn execute(stage: &str) -> Result<()> {
    let sync = reconciler(&Settings::load()?)?;
    let report = sync.push(stage)?;
    print_report(stage, &report);
    Ok(())
}

pub(crate) fn print_report(stage: &str, report: &PushReport) {
    if !report.changed() {
        output::success(&format!("remote already up to date ({})", stage));
        return;
    }

    let total = report.added.len() + report.updated.len() + report.removed.len();
    output::success(&format!(
        "pushed {} change{} ({})",
        total,
        if total == 1 { "" } else { "s" },
        stage
    ));
    for name in &report.added {
        output::change('+', name);
    }
    for name in &report.updated {
        output::change('~', name);
    }
    for name in &report.removed {
        output::change('-', name);
    }
}
