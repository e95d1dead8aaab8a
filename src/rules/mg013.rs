//! MG013 — Check constraint creation

use crate::model::Operation;
use crate::rules::{
    EngineMatch, RemediationStrategy, RuleContext, Safety, SafetyRule, UnsupportedEngineVersion,
    otherwise, when,
};

pub(super) const DESCRIPTION: &str = "Validated check constraint creation scans under an exclusive lock";

pub(super) const EXPLAIN: &str = "MG013 — Check constraint creation\n\
         \n\
         What it detects:\n\
         A CHECK constraint added with validation of existing rows.\n\
         \n\
         Why it's dangerous:\n\
         Adding a CHECK constraint takes ACCESS EXCLUSIVE and scans the whole\n\
         table to verify existing rows, blocking reads and writes for the\n\
         duration of the scan.\n\
         \n\
         Example (bad):\n\
           ALTER TABLE orders ADD CONSTRAINT total_positive CHECK (total > 0);\n\
         \n\
         Fix:\n\
           ALTER TABLE orders ADD CONSTRAINT total_positive\n\
             CHECK (total > 0) NOT VALID;\n\
           -- later, separate migration:\n\
           ALTER TABLE orders VALIDATE CONSTRAINT total_positive;";

fn not_validated(op: &Operation, _ctx: &RuleContext<'_>) -> Result<bool, UnsupportedEngineVersion> {
    Ok(matches!(op, Operation::AddCheckConstraint(check) if !check.validate))
}

pub(super) static RULES: &[SafetyRule] = &[
    when(
        EngineMatch::Any,
        not_validated,
        Safety::ConditionallySafe,
        "unvalidated check applies to new rows only; validate it in a later unit",
        RemediationStrategy::DisableValidationThenValidateSeparately,
    ),
    otherwise(
        Safety::Unsafe,
        "validating existing rows scans the table under an exclusive lock",
        RemediationStrategy::DisableValidationThenValidateSeparately,
    ),
];

#[cfg(test)]
mod tests {
    use crate::model::{Engine, Operation};
    use crate::rules::test_helpers::verdict;
    use crate::rules::{RemediationStrategy, RuleId, Safety};

    fn check(validate: bool) -> Operation {
        Operation::add_check_constraint("orders", "total_positive", "total > 0", validate)
            .expect("valid operation")
    }

    #[test]
    fn test_validated_check_unsafe() {
        let v = verdict(&check(true), &Engine::postgres(16));
        assert_eq!(v.rule, RuleId::Mg013);
        assert_eq!(v.status, Safety::Unsafe);
        assert_eq!(
            v.remediation,
            RemediationStrategy::DisableValidationThenValidateSeparately
        );
    }

    #[test]
    fn test_unvalidated_check_conditionally_safe() {
        let v = verdict(&check(false), &Engine::postgres(16));
        assert_eq!(v.status, Safety::ConditionallySafe);
        assert_eq!(
            v.remediation,
            RemediationStrategy::DisableValidationThenValidateSeparately
        );
    }
}
