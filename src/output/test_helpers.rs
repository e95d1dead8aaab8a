//! Shared test helpers for output module tests.

use crate::locks::{Blocking, LockMode};
use crate::model::{Engine, OperationKind, OperationRef};
use crate::report::{AnalysisReport, OperationReport, UnitReport};
use crate::rules::{RemediationStrategy, RuleId, Safety, Verdict};
use crate::sequencer::{SequencingRule, SequencingViolation};

/// A two-unit report: one unsafe operation, one safe, one violation.
pub fn test_report() -> AnalysisReport {
    AnalysisReport::new(
        Engine::postgres(10),
        vec![
            UnitReport {
                name: "001_add_approved".to_string(),
                disable_ddl_transaction: false,
                disable_migration_lock: false,
                operations: vec![OperationReport {
                    at: OperationRef::new(0, 0),
                    kind: OperationKind::AddColumnWithDefault,
                    table: "users".to_string(),
                    description: "add column users.approved boolean default false".to_string(),
                    verdict: Verdict {
                        rule: RuleId::Mg004,
                        status: Safety::Unsafe,
                        lock_mode: Some(LockMode::AccessExclusive),
                        blocking: Blocking::Blocking,
                        rationale: "default rewrites the table".to_string(),
                        remediation: RemediationStrategy::AddThenSetDefaultSeparately,
                    },
                }],
            },
            UnitReport {
                name: "002_rename".to_string(),
                disable_ddl_transaction: false,
                disable_migration_lock: false,
                operations: vec![OperationReport {
                    at: OperationRef::new(1, 0),
                    kind: OperationKind::AddColumn,
                    table: "users".to_string(),
                    description: "add column users.nickname text".to_string(),
                    verdict: Verdict {
                        rule: RuleId::Mg003,
                        status: Safety::Safe,
                        lock_mode: Some(LockMode::AccessExclusive),
                        blocking: Blocking::NonBlocking,
                        rationale: "metadata-only change".to_string(),
                        remediation: RemediationStrategy::None,
                    },
                }],
            },
        ],
        vec![SequencingViolation {
            rule: SequencingRule::ValidationMustBeDeferred,
            at: OperationRef::new(1, 0),
            related: Some(OperationRef::new(0, 0)),
            message: "validate in a later migration".to_string(),
        }],
    )
}
