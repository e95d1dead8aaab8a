//! Report model
//!
//! One `AnalysisReport` per analyzed batch: a verdict for every operation in
//! batch order, plus the sequencing violations. Read-only once built.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{Engine, OperationKind, OperationRef};
use crate::rules::{Safety, Verdict};
use crate::sequencer::SequencingViolation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationReport {
    pub at: OperationRef,
    pub kind: OperationKind,
    pub table: String,
    /// Human-readable rendering of the operation.
    pub description: String,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitReport {
    pub name: String,
    pub disable_ddl_transaction: bool,
    pub disable_migration_lock: bool,
    pub operations: Vec<OperationReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    pub engine: Engine,
    pub units: Vec<UnitReport>,
    pub violations: Vec<SequencingViolation>,
}

impl AnalysisReport {
    pub(crate) fn new(
        engine: Engine,
        units: Vec<UnitReport>,
        violations: Vec<SequencingViolation>,
    ) -> Self {
        Self {
            engine,
            units,
            violations,
        }
    }

    /// Every operation report, in batch order.
    pub fn operations(&self) -> impl Iterator<Item = &OperationReport> {
        self.units.iter().flat_map(|unit| unit.operations.iter())
    }

    pub fn verdicts(&self) -> impl Iterator<Item = &Verdict> {
        self.operations().map(|op| &op.verdict)
    }

    pub fn unsafe_operations(&self) -> Vec<&OperationReport> {
        self.operations()
            .filter(|op| op.verdict.is_unsafe())
            .collect()
    }

    pub fn violations(&self) -> &[SequencingViolation] {
        &self.violations
    }

    /// Worst status over all verdicts. `Safe` for an empty batch.
    pub fn worst_severity(&self) -> Safety {
        self.verdicts()
            .map(|v| v.status)
            .max()
            .unwrap_or(Safety::Safe)
    }

    /// Any unsafe verdict or any sequencing violation.
    pub fn has_blocking_issues(&self) -> bool {
        !self.violations.is_empty() || self.verdicts().any(Verdict::is_unsafe)
    }

    pub fn count_by_status(&self) -> BTreeMap<Safety, usize> {
        let mut counts = BTreeMap::new();
        for verdict in self.verdicts() {
            *counts.entry(verdict.status).or_insert(0) += 1;
        }
        counts
    }

    /// Whether the report should fail a gate set at `threshold`.
    ///
    /// A sequencing violation counts as `Unsafe`.
    pub fn exceeds(&self, threshold: Safety) -> bool {
        if self.operations().next().is_none() && self.violations.is_empty() {
            return false;
        }
        let worst = if self.violations.is_empty() {
            self.worst_severity()
        } else {
            Safety::Unsafe
        };
        worst >= threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locks::Blocking;
    use crate::rules::{RemediationStrategy, RuleId};
    use crate::sequencer::SequencingRule;

    fn op_report(index: usize, status: Safety) -> OperationReport {
        OperationReport {
            at: OperationRef::new(0, index),
            kind: OperationKind::AddColumn,
            table: "orders".to_string(),
            description: "add column".to_string(),
            verdict: Verdict {
                rule: RuleId::Mg003,
                status,
                lock_mode: None,
                blocking: Blocking::Unknown,
                rationale: "test".to_string(),
                remediation: RemediationStrategy::None,
            },
        }
    }

    fn report(statuses: &[Safety], violations: Vec<SequencingViolation>) -> AnalysisReport {
        AnalysisReport::new(
            Engine::postgres(16),
            vec![UnitReport {
                name: "001".to_string(),
                disable_ddl_transaction: false,
                disable_migration_lock: false,
                operations: statuses
                    .iter()
                    .enumerate()
                    .map(|(i, s)| op_report(i, *s))
                    .collect(),
            }],
            violations,
        )
    }

    #[test]
    fn test_worst_severity_picks_unsafe() {
        let r = report(&[Safety::Safe, Safety::Unsafe], vec![]);
        assert_eq!(r.worst_severity(), Safety::Unsafe);
        assert_eq!(r.unsafe_operations().len(), 1);
        assert_eq!(r.unsafe_operations()[0].at, OperationRef::new(0, 1));
    }

    #[test]
    fn test_empty_report_is_safe() {
        let r = report(&[], vec![]);
        assert_eq!(r.worst_severity(), Safety::Safe);
        assert!(!r.has_blocking_issues());
        assert!(!r.exceeds(Safety::Safe));
    }

    #[test]
    fn test_conditionally_safe_is_not_blocking() {
        let r = report(&[Safety::Safe, Safety::ConditionallySafe], vec![]);
        assert!(!r.has_blocking_issues());
        assert!(r.exceeds(Safety::ConditionallySafe));
        assert!(!r.exceeds(Safety::Unsafe));
    }

    #[test]
    fn test_violation_is_blocking() {
        let violation = SequencingViolation {
            rule: SequencingRule::ValidationMustBeDeferred,
            at: OperationRef::new(0, 0),
            related: None,
            message: "m".to_string(),
        };
        let r = report(&[Safety::Safe], vec![violation]);
        assert!(r.has_blocking_issues());
        assert!(r.exceeds(Safety::Unsafe));
        assert_eq!(r.violations().len(), 1);
    }

    #[test]
    fn test_count_by_status() {
        let r = report(&[Safety::Safe, Safety::Safe, Safety::Unsafe], vec![]);
        let counts = r.count_by_status();
        assert_eq!(counts.get(&Safety::Safe), Some(&2));
        assert_eq!(counts.get(&Safety::Unsafe), Some(&1));
        assert_eq!(counts.get(&Safety::ConditionallySafe), None);
    }
}
