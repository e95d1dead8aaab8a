//! MG010 — Table rename

use crate::rules::{RemediationStrategy, Safety, SafetyRule, otherwise};

pub(super) const DESCRIPTION: &str = "Table rename breaks code still using the old name";

pub(super) const EXPLAIN: &str = "MG010 — Table rename\n\
         \n\
         What it detects:\n\
         Any table rename.\n\
         \n\
         Why it matters:\n\
         Queries, views and application code that name the old table fail\n\
         as soon as the rename commits.\n\
         \n\
         Fix:\n\
         Create the new table, write to both, backfill, move reads, then drop\n\
         the old table. Alternatively deploy code that reads from a view\n\
         covering both names first.";

pub(super) static RULES: &[SafetyRule] = &[otherwise(
    Safety::ConditionallySafe,
    "requires out-of-band coordination: running code referencing the old table name fails after the rename",
    RemediationStrategy::ApplicationCodeFirst,
)];

#[cfg(test)]
mod tests {
    use crate::model::{Engine, Operation};
    use crate::rules::test_helpers::verdict;
    use crate::rules::{RemediationStrategy, RuleId, Safety};

    #[test]
    fn test_rename_table_conditionally_safe() {
        let op = Operation::rename_table("users", "accounts").expect("valid operation");
        let v = verdict(&op, &Engine::mariadb(10, 11, 0));
        assert_eq!(v.rule, RuleId::Mg010);
        assert_eq!(v.status, Safety::ConditionallySafe);
        assert_eq!(v.remediation, RemediationStrategy::ApplicationCodeFirst);
    }
}
