//! JSON output reporter
//!
//! Serializes the full [`AnalysisReport`] with serde_json, pretty-printed.

use crate::output::{JsonReporter, ReportError, Reporter, write_output};
use crate::report::AnalysisReport;
use std::path::Path;

impl Reporter for JsonReporter {
    fn emit(&self, report: &AnalysisReport, output_dir: &Path) -> Result<(), ReportError> {
        let mut json = serde_json::to_string_pretty(report)
            .map_err(|e| ReportError::Serialization(e.to_string()))?;
        json.push('\n');
        write_output(self.use_stdout, &json, output_dir, "report.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::test_helpers::test_report;

    fn emit_and_parse() -> serde_json::Value {
        let dir = tempfile::tempdir().expect("tempdir");
        JsonReporter::new(false)
            .emit(&test_report(), dir.path())
            .expect("emit");
        let content = std::fs::read_to_string(dir.path().join("report.json")).expect("read");
        serde_json::from_str(&content).expect("valid JSON")
    }

    #[test]
    fn verdict_fields_serialized() {
        let json = emit_and_parse();
        let verdict = &json["units"][0]["operations"][0]["verdict"];
        assert_eq!(verdict["rule"], "MG004");
        assert_eq!(verdict["status"], "UNSAFE");
        assert_eq!(verdict["remediation"], "add_then_set_default_separately");
    }

    #[test]
    fn engine_serialized_as_strings() {
        let json = emit_and_parse();
        assert_eq!(json["engine"]["kind"], "postgres");
        assert_eq!(json["engine"]["version"], "10.0.0");
        assert!(json["engine"].get("time_zone").is_none());
    }

    #[test]
    fn violation_serialized_with_rule_id() {
        let json = emit_and_parse();
        let violation = &json["violations"][0];
        assert_eq!(violation["rule"], "validation-must-be-deferred");
        assert_eq!(violation["at"]["unit"], 1);
        assert_eq!(violation["related"]["unit"], 0);
    }

    #[test]
    fn unit_flags_serialized() {
        let json = emit_and_parse();
        assert_eq!(json["units"][1]["name"], "002_rename");
        assert_eq!(json["units"][1]["disable_ddl_transaction"], false);
    }
}
