//! Human-readable text output reporter
//!
//! Produces plain text output suitable for terminal display:
//! ```text
//! UNSAFE MG004 001_add_approved#1 users: default rewrites the table
//!   fix: add the column without a default, then set the default in a separate step
//!
//! VIOLATION validation-must-be-deferred 002_rename#1: validate in a later migration
//! ```

use crate::model::OperationRef;
use crate::output::{ReportError, Reporter, TextReporter, write_output};
use crate::report::{AnalysisReport, OperationReport};
use crate::rules::Safety;
use crate::sequencer::SequencingViolation;
use std::fmt::Write as FmtWrite;
use std::path::Path;

/// `unit#op`, with a one-based operation index.
fn location(report: &AnalysisReport, at: OperationRef) -> String {
    match report.units.get(at.unit) {
        Some(unit) => format!("{}#{}", unit.name, at.index + 1),
        None => at.to_string(),
    }
}

fn format_operation(report: &AnalysisReport, op: &OperationReport) -> String {
    let mut buf = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(
        buf,
        "{} {} {} {}: {}",
        op.verdict.status,
        op.verdict.rule,
        location(report, op.at),
        op.table,
        op.verdict.rationale
    );
    if op.verdict.status != Safety::Safe
        && let Some(instruction) = op.verdict.remediation.instruction()
    {
        let _ = writeln!(buf, "  fix: {}", instruction);
    }
    buf
}

fn format_violation(report: &AnalysisReport, violation: &SequencingViolation) -> String {
    format!(
        "VIOLATION {} {}: {}\n",
        violation.rule,
        location(report, violation.at),
        violation.message
    )
}

fn format_summary(report: &AnalysisReport) -> String {
    let counts = report.count_by_status();
    let count = |status: Safety| counts.get(&status).copied().unwrap_or(0);
    format!(
        "{} operations: {} unsafe, {} conditionally safe, {} safe; {} sequencing violations\n",
        report.operations().count(),
        count(Safety::Unsafe),
        count(Safety::ConditionallySafe),
        count(Safety::Safe),
        report.violations().len()
    )
}

/// Format the whole report. Operations first in batch order, then
/// violations, then a summary line.
pub(crate) fn format_report(report: &AnalysisReport) -> String {
    let mut output = String::new();
    for op in report.operations() {
        output.push_str(&format_operation(report, op));
    }
    if !report.violations().is_empty() {
        output.push('\n');
        for violation in report.violations() {
            output.push_str(&format_violation(report, violation));
        }
    }
    output.push('\n');
    output.push_str(&format_summary(report));
    output
}

impl Reporter for TextReporter {
    /// Emit the report as human-readable text.
    ///
    /// If `use_stdout` is true, writes to stdout. Otherwise writes
    /// `report.txt` to the given `output_dir`.
    fn emit(&self, report: &AnalysisReport, output_dir: &Path) -> Result<(), ReportError> {
        write_output(
            self.use_stdout,
            &format_report(report),
            output_dir,
            "report.txt",
        )
    }
}
