//! MG007 — Column default change
//!
//! `ALTER COLUMN ... SET DEFAULT` on its own only changes the catalog and
//! affects future inserts. Issued in the same statement as a type change it
//! becomes part of a rewrite.

use crate::model::Operation;
use crate::rules::{
    EngineMatch, RemediationStrategy, RuleContext, Safety, SafetyRule, UnsupportedEngineVersion,
    otherwise, when,
};

pub(super) const DESCRIPTION: &str = "Default change bundled with a type change triggers a rewrite";

pub(super) const EXPLAIN: &str = "MG007 — Column default change\n\
         \n\
         What it detects:\n\
         A column default change issued in the same statement as a column\n\
         type change.\n\
         \n\
         Why it's dangerous:\n\
         A default-only change touches the catalog and applies to rows\n\
         inserted afterwards; existing rows are not rewritten. Migration\n\
         frameworks that express the default change through a full column\n\
         redefinition (change_column, MODIFY COLUMN) send a type change along\n\
         with it, and that statement rewrites the table.\n\
         \n\
         Example (bad):\n\
           ALTER TABLE users MODIFY COLUMN approved tinyint(1) DEFAULT 0;\n\
         \n\
         Fix:\n\
           ALTER TABLE users ALTER COLUMN approved SET DEFAULT 0;";

fn bundled_with_type_change(
    op: &Operation,
    _ctx: &RuleContext<'_>,
) -> Result<bool, UnsupportedEngineVersion> {
    Ok(matches!(op, Operation::AlterColumnDefault(ad) if ad.with_type_change))
}

pub(super) static RULES: &[SafetyRule] = &[
    when(
        EngineMatch::Any,
        bundled_with_type_change,
        Safety::Unsafe,
        "default change is bundled with a type change that may rewrite the table",
        RemediationStrategy::IsolateDefaultChange,
    ),
    otherwise(
        Safety::Safe,
        "default-only change updates the catalog and affects future inserts only",
        RemediationStrategy::None,
    ),
];

#[cfg(test)]
mod tests {
    use crate::model::{Engine, Operation};
    use crate::rules::test_helpers::verdict;
    use crate::rules::{RemediationStrategy, RuleId, Safety};

    #[test]
    fn test_default_only_safe() {
        let op = Operation::alter_column_default("users", "approved", Some("false"), false)
            .expect("valid operation");
        let v = verdict(&op, &Engine::postgres(10));
        assert_eq!(v.rule, RuleId::Mg007);
        assert_eq!(v.status, Safety::Safe);

        let drop = Operation::alter_column_default("users", "approved", None, false)
            .expect("valid operation");
        assert_eq!(verdict(&drop, &Engine::mysql(5, 7, 0)).status, Safety::Safe);
    }

    #[test]
    fn test_bundled_with_type_change_unsafe() {
        let op = Operation::alter_column_default("users", "approved", Some("0"), true)
            .expect("valid operation");
        let v = verdict(&op, &Engine::mysql(8, 0, 30));
        assert_eq!(v.status, Safety::Unsafe);
        assert_eq!(v.remediation, RemediationStrategy::IsolateDefaultChange);
    }
}
