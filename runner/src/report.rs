use std::fmt::Write as _;

use scan_core::{CaseState, SuiteReport};

/// Render a suite report as one line per case plus a summary line.
pub(crate) fn render(report: &SuiteReport) -> String {
    let mut out = String::new();
    for case in &report.cases {
        let status = case.status.map_or_else(|| "---".to_string(), |s| s.to_string());
        let _ = write!(out, "{}::{:<3} {:<40} {:>3} {}", report.suite, case.index, case.label, status, case.state);
        if case.state == CaseState::Failed {
            if let Some(error) = &case.error {
                let _ = write!(out, "  {error}");
            }
        }
        out.push('\n');
    }
    let _ = writeln!(
        out,
        "{}: {} passed, {} failed",
        report.suite,
        report.passed(),
        report.failed()
    );
    out
}
