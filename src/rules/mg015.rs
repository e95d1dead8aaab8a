//! MG015 — `SET NOT NULL`
//!
//! A direct `SET NOT NULL` scans the table under ACCESS EXCLUSIVE. The
//! constraint-first approach (unvalidated `CHECK (col IS NOT NULL)`,
//! validated later) is reported as conditionally safe here; the sequencer
//! then looks for that validated check earlier in the batch.

use crate::model::Operation;
use crate::rules::{
    EngineMatch, RemediationStrategy, RuleContext, Safety, SafetyRule, UnsupportedEngineVersion,
    otherwise, when,
};

pub(super) const DESCRIPTION: &str = "SET NOT NULL scans the table under ACCESS EXCLUSIVE";

pub(super) const EXPLAIN: &str = "MG015 — SET NOT NULL\n\
         \n\
         What it detects:\n\
         A column made NOT NULL directly on a table with existing rows.\n\
         \n\
         Why it's dangerous:\n\
         SET NOT NULL takes ACCESS EXCLUSIVE and scans every row to check for\n\
         NULLs, blocking reads and writes for the whole scan.\n\
         \n\
         Fix (PostgreSQL 12+):\n\
           ALTER TABLE users ADD CONSTRAINT users_email_not_null\n\
             CHECK (email IS NOT NULL) NOT VALID;\n\
           -- separate migration:\n\
           ALTER TABLE users VALIDATE CONSTRAINT users_email_not_null;\n\
           -- separate migration, no scan needed now:\n\
           ALTER TABLE users ALTER COLUMN email SET NOT NULL;\n\
         \n\
         See also the set-not-null-requires-validated-check sequencing rule,\n\
         which escalates a SET NOT NULL with no validated check before it.";

fn not_validated(op: &Operation, _ctx: &RuleContext<'_>) -> Result<bool, UnsupportedEngineVersion> {
    Ok(matches!(op, Operation::SetNotNull(snn) if !snn.validate))
}

pub(super) static RULES: &[SafetyRule] = &[
    when(
        EngineMatch::Any,
        not_validated,
        Safety::ConditionallySafe,
        "relies on a validated CHECK (col IS NOT NULL) to avoid the full table scan",
        RemediationStrategy::DisableValidationThenValidateSeparately,
    ),
    otherwise(
        Safety::Unsafe,
        "SET NOT NULL scans every row under ACCESS EXCLUSIVE",
        RemediationStrategy::DisableValidationThenValidateSeparately,
    ),
];

#[cfg(test)]
mod tests {
    use crate::locks::LockMode;
    use crate::model::{Engine, Operation};
    use crate::rules::test_helpers::verdict;
    use crate::rules::{RemediationStrategy, RuleId, Safety};

    #[test]
    fn test_direct_set_not_null_unsafe() {
        let op = Operation::set_not_null("users", "email", true).expect("valid operation");
        let v = verdict(&op, &Engine::postgres(16));
        assert_eq!(v.rule, RuleId::Mg015);
        assert_eq!(v.status, Safety::Unsafe);
        assert_eq!(v.lock_mode, Some(LockMode::AccessExclusive));
    }

    #[test]
    fn test_constraint_first_conditionally_safe() {
        let op = Operation::set_not_null("users", "email", false).expect("valid operation");
        let v = verdict(&op, &Engine::postgres(16));
        assert_eq!(v.status, Safety::ConditionallySafe);
        assert_eq!(
            v.remediation,
            RemediationStrategy::DisableValidationThenValidateSeparately
        );
    }
}
