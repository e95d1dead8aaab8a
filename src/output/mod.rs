//! Output reporters for different formats
//!
//! Supports human-readable text and pretty-printed JSON.

use crate::report::AnalysisReport;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error writing report: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Trait for output format reporters.
pub trait Reporter {
    /// Write the report to stdout or to the given output directory.
    /// The filename is determined by the reporter (e.g., "report.json").
    fn emit(&self, report: &AnalysisReport, output_dir: &Path) -> Result<(), ReportError>;
}

/// Text reporter; writes to stdout or `report.txt`.
pub struct TextReporter {
    pub use_stdout: bool,
}

impl TextReporter {
    pub fn new(use_stdout: bool) -> Self {
        Self { use_stdout }
    }
}

/// JSON reporter; writes to stdout or `report.json`.
pub struct JsonReporter {
    pub use_stdout: bool,
}

impl JsonReporter {
    pub fn new(use_stdout: bool) -> Self {
        Self { use_stdout }
    }
}

/// Write `contents` to stdout, or to `output_dir/file_name`, creating the
/// directory if needed.
fn write_output(
    use_stdout: bool,
    contents: &str,
    output_dir: &Path,
    file_name: &str,
) -> Result<(), ReportError> {
    use std::io::Write;

    if use_stdout {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        handle.write_all(contents.as_bytes())?;
        handle.flush()?;
    } else {
        std::fs::create_dir_all(output_dir)?;
        std::fs::write(output_dir.join(file_name), contents)?;
    }
    Ok(())
}

pub mod json;
pub mod text;

#[cfg(test)]
pub mod test_helpers;
