use std::collections::HashSet;

use tracing::debug;

use crate::model::{Engine, MigrationBatch, Operation, OperationRef};
use crate::rules::thresholds::{Feature, supports};
use crate::rules::{RemediationStrategy, Safety};
use crate::sequencer::{
    Refinement, SequencerOutcome, SequencingRule, SequencingViolation, VerdictGrid, verdict_at,
};

pub(super) const DESCRIPTION: &str =
    "SET NOT NULL needs a validated CHECK (col IS NOT NULL) earlier in the batch";

pub(super) const EXPLAIN: &str = "set-not-null-requires-validated-check\n\
         \n\
         What it detects:\n\
         A SET NOT NULL relying on the constraint-first approach, with no\n\
         validated CHECK (col IS NOT NULL) for that column earlier in the\n\
         batch.\n\
         \n\
         Why it matters:\n\
         Without a validated check the engine falls back to scanning every\n\
         row under ACCESS EXCLUSIVE. The verdict is escalated to UNSAFE.\n\
         \n\
         When a validated check does exist earlier and the engine can use it\n\
         (PostgreSQL 12+), the scan is skipped and the SET NOT NULL is\n\
         reported as SAFE, even if it was issued directly.\n\
         \n\
         Fix:\n\
           -- migration 1:\n\
           ALTER TABLE users ADD CONSTRAINT users_email_not_null\n\
             CHECK (email IS NOT NULL) NOT VALID;\n\
           -- migration 2:\n\
           ALTER TABLE users VALIDATE CONSTRAINT users_email_not_null;\n\
           -- migration 3:\n\
           ALTER TABLE users ALTER COLUMN email SET NOT NULL;";

/// `(table, column)`, lowercased.
type ColumnKey = (String, String);

fn column_key(table: &str, column: &str) -> ColumnKey {
    (table.to_lowercase(), column.to_lowercase())
}

/// An unvalidated not-null check waiting for its validation.
struct PendingCheck {
    at: OperationRef,
    table: String,
    name: String,
    column: String,
}

/// Walk the batch in order, tracking which columns have a validated
/// not-null check, and refine each `SET NOT NULL` verdict accordingly.
pub(super) fn check(
    batch: &MigrationBatch,
    engine: &Engine,
    verdicts: &VerdictGrid,
    outcome: &mut SequencerOutcome,
) {
    let mut pending: Vec<PendingCheck> = Vec::new();
    let mut validated: HashSet<ColumnKey> = HashSet::new();

    for (at, op) in batch.operations() {
        match op {
            Operation::AddCheckConstraint(check) => {
                let Some(column) = check.not_null_column() else {
                    continue;
                };
                if check.validate {
                    validated.insert(column_key(&check.table, &column));
                } else {
                    pending.push(PendingCheck {
                        at,
                        table: check.table.clone(),
                        name: check.name.clone(),
                        column,
                    });
                }
            }
            Operation::ValidateCheckConstraint(v) => {
                for p in pending.iter().filter(|p| {
                    p.table.eq_ignore_ascii_case(&v.table) && p.name.eq_ignore_ascii_case(&v.name)
                }) {
                    validated.insert(column_key(&p.table, &p.column));
                }
            }
            Operation::SetNotNull(snn) => {
                let Some(verdict) = verdict_at(verdicts, at) else {
                    continue;
                };
                let key = column_key(&snn.table, &snn.column);

                if validated.contains(&key) {
                    match supports(Feature::NotNullFromValidatedCheck, engine) {
                        Ok(true) => {
                            debug!(at = %at, "SET NOT NULL backed by validated check");
                            outcome.refinements.push(Refinement {
                                at,
                                verdict: verdict.refined(
                                    Safety::Safe,
                                    "validated CHECK (col IS NOT NULL) lets the engine skip the table scan",
                                    RemediationStrategy::None,
                                ),
                            });
                        }
                        Ok(false) if verdict.status == Safety::ConditionallySafe => {
                            let message = format!(
                                "full table scan expected: {engine} cannot use the validated \
                                 check on {}.{} to skip the scan",
                                snn.table, snn.column
                            );
                            escalate(outcome, at, None, verdict, message);
                        }
                        // Unknown engine keeps its first-pass verdict.
                        Ok(false) | Err(_) => {}
                    }
                    continue;
                }

                if verdict.status != Safety::ConditionallySafe {
                    continue;
                }
                let unvalidated = pending
                    .iter()
                    .find(|p| column_key(&p.table, &p.column) == key)
                    .map(|p| p.at);
                let message = match unvalidated {
                    Some(check_at) => format!(
                        "full table scan expected: the CHECK on {}.{} created at {check_at} \
                         is not validated before this SET NOT NULL",
                        snn.table, snn.column
                    ),
                    None => format!(
                        "full table scan expected: no validated CHECK ({} IS NOT NULL) \
                         on {} earlier in the batch",
                        snn.column, snn.table
                    ),
                };
                escalate(outcome, at, unvalidated, verdict, message);
            }
            _ => {}
        }
    }
}

fn escalate(
    outcome: &mut SequencerOutcome,
    at: OperationRef,
    related: Option<OperationRef>,
    verdict: &crate::rules::Verdict,
    message: String,
) {
    debug!(at = %at, "SET NOT NULL escalated to unsafe");
    outcome.refinements.push(Refinement {
        at,
        verdict: verdict.refined(
            Safety::Unsafe,
            message.clone(),
            RemediationStrategy::DisableValidationThenValidateSeparately,
        ),
    });
    outcome.violations.push(SequencingViolation {
        rule: SequencingRule::SetNotNullRequiresValidatedCheck,
        at,
        related,
        message,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MigrationUnit;
    use crate::rules::{RuleContext, Verdict, classify};

    fn grid(batch: &MigrationBatch, engine: &Engine) -> Vec<Vec<Verdict>> {
        batch
            .units()
            .iter()
            .map(|unit| {
                let ctx = RuleContext::for_unit(engine, unit);
                unit.operations().iter().map(|op| classify(op, &ctx)).collect()
            })
            .collect()
    }

    fn run(batch: &MigrationBatch, engine: &Engine) -> SequencerOutcome {
        let mut outcome = SequencerOutcome::default();
        check(batch, engine, &grid(batch, engine), &mut outcome);
        outcome
    }

    fn not_null_check(validate: bool) -> Operation {
        Operation::add_check_constraint("users", "users_email_nn", "email IS NOT NULL", validate)
            .expect("valid operation")
    }

    fn set_not_null(validate: bool) -> Operation {
        Operation::set_not_null("users", "email", validate).expect("valid operation")
    }

    #[test]
    fn test_escalated_without_prior_check() {
        let batch = MigrationBatch::new(vec![MigrationUnit::new("001", vec![set_not_null(false)])]);
        let outcome = run(&batch, &Engine::postgres(16));

        assert_eq!(outcome.violations.len(), 1);
        assert_eq!(
            outcome.violations[0].rule,
            SequencingRule::SetNotNullRequiresValidatedCheck
        );
        assert_eq!(outcome.refinements.len(), 1);
        assert_eq!(outcome.refinements[0].verdict.status, Safety::Unsafe);
        assert!(
            outcome.refinements[0]
                .verdict
                .rationale
                .starts_with("full table scan expected")
        );
    }

    #[test]
    fn test_unvalidated_check_does_not_count() {
        let batch = MigrationBatch::new(vec![
            MigrationUnit::new("001", vec![not_null_check(false)]),
            MigrationUnit::new("002", vec![set_not_null(false)]),
        ]);
        let outcome = run(&batch, &Engine::postgres(16));
        assert_eq!(outcome.violations.len(), 1);
        assert_eq!(outcome.violations[0].related, Some(OperationRef::new(0, 0)));
    }

    #[test]
    fn test_phased_approach_refined_to_safe() {
        let batch = MigrationBatch::new(vec![
            MigrationUnit::new("001", vec![not_null_check(false)]),
            MigrationUnit::new(
                "002",
                vec![
                    Operation::validate_check_constraint("users", "users_email_nn")
                        .expect("valid"),
                ],
            ),
            MigrationUnit::new("003", vec![set_not_null(false)]),
        ]);
        let outcome = run(&batch, &Engine::postgres(12));
        assert!(outcome.violations.is_empty());
        assert_eq!(outcome.refinements.len(), 1);
        assert_eq!(outcome.refinements[0].at, OperationRef::new(2, 0));
        assert_eq!(outcome.refinements[0].verdict.status, Safety::Safe);
    }

    #[test]
    fn test_direct_set_not_null_after_validated_check_is_safe() {
        let batch = MigrationBatch::new(vec![
            MigrationUnit::new("001", vec![not_null_check(true)]),
            MigrationUnit::new("002", vec![set_not_null(true)]),
        ]);
        let outcome = run(&batch, &Engine::postgres(16));
        assert!(outcome.violations.is_empty());
        assert_eq!(outcome.refinements[0].verdict.status, Safety::Safe);
    }

    #[test]
    fn test_old_postgres_cannot_use_check() {
        let batch = MigrationBatch::new(vec![
            MigrationUnit::new("001", vec![not_null_check(true)]),
            MigrationUnit::new("002", vec![set_not_null(false)]),
        ]);
        let outcome = run(&batch, &Engine::postgres(11));
        assert_eq!(outcome.violations.len(), 1);
        assert_eq!(outcome.refinements[0].verdict.status, Safety::Unsafe);
    }

    #[test]
    fn test_direct_unsafe_left_alone() {
        let batch = MigrationBatch::new(vec![MigrationUnit::new("001", vec![set_not_null(true)])]);
        let outcome = run(&batch, &Engine::postgres(16));
        assert!(outcome.violations.is_empty());
        assert!(outcome.refinements.is_empty());
    }

    #[test]
    fn test_check_on_other_column_ignored() {
        let batch = MigrationBatch::new(vec![
            MigrationUnit::new(
                "001",
                vec![
                    Operation::add_check_constraint(
                        "users",
                        "users_name_nn",
                        "name IS NOT NULL",
                        true,
                    )
                    .expect("valid"),
                ],
            ),
            MigrationUnit::new("002", vec![set_not_null(false)]),
        ]);
        let outcome = run(&batch, &Engine::postgres(16));
        assert_eq!(outcome.violations.len(), 1);
    }
}
