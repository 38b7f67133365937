//! Human-readable output for command results.

use chirp_common::hooks::HookShape;
use chirp_common::{Action, ChirpError, HookStatus, Outcome, StatusReport, WorkflowReport};

pub fn workflow(report: &WorkflowReport) -> String {
    let path = report.path.display();
    let count = report.hooks.len();
    let names = report.hooks.join(", ");
    match (report.action, report.outcome) {
        (Action::Install, Outcome::Changed) => {
            format!("Installed {} in {path}: {names}", plural(count))
        }
        (Action::Install, Outcome::Unchanged) => {
            format!("chirp hooks already installed in {path}")
        }
        (Action::Install, Outcome::WouldChange) => {
            format!("Would install {} in {path}: {names}", plural(count))
        }
        (Action::Uninstall, Outcome::Changed) => {
            format!("Removed {} from {path}: {names}", plural(count))
        }
        (Action::Uninstall, Outcome::Unchanged) => format!("No chirp hooks found in {path}"),
        (Action::Uninstall, Outcome::WouldChange) => {
            format!("Would remove {} from {path}: {names}", plural(count))
        }
    }
}

pub fn status(report: &StatusReport) -> String {
    let mut out = format!(
        "{} ({} scope): {}",
        report.path.display(),
        report.scope,
        report.status
    );
    if !report.exists {
        out.push_str("\n  settings file does not exist");
    }
    for hook in &report.detected {
        let shape = match hook.shape {
            HookShape::Structured => "ok",
            HookShape::LegacyScalar => "legacy entry, reinstall to update",
        };
        out.push_str(&format!("\n  {}: {shape}", hook.name));
    }
    if report.status != HookStatus::NotInstalled && !report.missing.is_empty() {
        out.push_str(&format!("\n  missing: {}", report.missing.join(", ")));
    }
    out
}

/// `error[Kind]: message (CODE)`
pub fn error_line(err: &ChirpError) -> String {
    let kind = err.kind();
    format!("error[{}]: {} ({})", kind.name(), err, kind.code_string())
}

fn plural(count: usize) -> String {
    if count == 1 {
        "1 chirp hook".to_string()
    } else {
        format!("{count} chirp hooks")
    }
}
