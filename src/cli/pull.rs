//! Pull command.

use crate::cli::{output, prompt, reconciler};
use crate::core::config::Settings;
use crate::core::domain::PullReport;
use crate::core::merge::MergePolicy;
use crate::error::Result;

/// Pull remote changes into the local file.
pub fn execute(stage: &str, policy: MergePolicy) -> Result<()> {
    let sync = reconciler(&Settings::load()?)?;
    let report = sync.pull(stage, policy, &mut prompt::confirm_key)?;
    print_report(stage, &report);
    Ok(())
}

pub(crate) fn print_report(stage: &str, report: &PullReport) {
    if report.unchanged {
        output::success(&format!("already up to date ({})", stage));
        return;
    }

    let total = report.added.len() + report.changed.len() + report.removed.len();
    output::success(&format!(
        "pulled {} change{} ({})",
        total,
        if total == 1 { "" } else { "s" },
        stage
    ));
    for name in &report.added {
        output::change('+', name);
    }
    for name in &report.changed {
        output::change('~', name);
    }
    for name in &report.removed {
        output::change('-', name);
    }
    for name in &report.kept {
        output::change('=', name);
    }
}
