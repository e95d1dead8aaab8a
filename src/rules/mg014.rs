//! MG014 — Check constraint validation

use crate::rules::{RemediationStrategy, Safety, SafetyRule, otherwise};

pub(super) const DESCRIPTION: &str = "Check constraint validation only takes SHARE UPDATE EXCLUSIVE";

pub(super) const EXPLAIN: &str = "MG014 — Check constraint validation\n\
         \n\
         What it detects:\n\
         Validation of a previously unvalidated CHECK constraint.\n\
         \n\
         Why it's safe:\n\
         VALIDATE CONSTRAINT scans the table under SHARE UPDATE EXCLUSIVE and\n\
         does not block reads or writes. It must run in a later migration\n\
         than the NOT VALID creation, which the sequencer checks.";

pub(super) static RULES: &[SafetyRule] = &[otherwise(
    Safety::Safe,
    "validation scans rows under SHARE UPDATE EXCLUSIVE without blocking writes",
    RemediationStrategy::None,
)];

#[cfg(test)]
mod tests {
    use crate::model::{Engine, Operation};
    use crate::rules::test_helpers::verdict;
    use crate::rules::{RuleId, Safety};

    #[test]
    fn test_validate_check_safe() {
        let op = Operation::validate_check_constraint("orders", "total_positive")
            .expect("valid operation");
        let v = verdict(&op, &Engine::postgres(12));
        assert_eq!(v.rule, RuleId::Mg014);
        assert_eq!(v.status, Safety::Safe);
    }
}
