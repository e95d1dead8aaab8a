//! MG005 — `json` column added
//!
//! PostgreSQL's `json` type stores raw text and defines no equality
//! operator. `jsonb` has one and is what should be used. MySQL and MariaDB
//! have a single JSON type and are not affected.

use crate::model::Operation;
use crate::rules::thresholds::{Feature, supports};
use crate::rules::{
    EngineMatch, RemediationStrategy, RuleContext, Safety, SafetyRule, UnsupportedEngineVersion,
    always, otherwise, when,
};

pub(super) const DESCRIPTION: &str = "json column type lacks an equality operator; use jsonb";

pub(super) const EXPLAIN: &str = "MG005 — json column added\n\
         \n\
         What it detects:\n\
         A column of type json added on PostgreSQL.\n\
         \n\
         Why it's dangerous:\n\
         json has no equality operator. Any query using DISTINCT, UNION,\n\
         GROUP BY or an equality comparison on the row type starts failing\n\
         with \"could not identify an equality operator for type json\"\n\
         once the column exists.\n\
         \n\
         Example (bad):\n\
           ALTER TABLE events ADD COLUMN payload json;\n\
         \n\
         Fix:\n\
           ALTER TABLE events ADD COLUMN payload jsonb;";

fn json_lacks_equality(
    _op: &Operation,
    ctx: &RuleContext<'_>,
) -> Result<bool, UnsupportedEngineVersion> {
    supports(Feature::JsonWithoutEquality, ctx.engine)
}

pub(super) static RULES: &[SafetyRule] = &[
    always(
        EngineMatch::Postgres,
        Safety::Unsafe,
        "json has no equality operator, breaking DISTINCT, UNION and GROUP BY on the table",
        RemediationStrategy::UseJsonB,
    ),
    when(
        EngineMatch::Any,
        json_lacks_equality,
        Safety::Unsafe,
        "json has no equality operator on this engine",
        RemediationStrategy::UseJsonB,
    ),
    otherwise(
        Safety::Safe,
        "engine has a single JSON type with equality semantics",
        RemediationStrategy::None,
    ),
];

#[cfg(test)]
mod tests {
    use crate::model::{Engine, EngineKind, Operation, Version};
    use crate::rules::test_helpers::verdict;
    use crate::rules::{RemediationStrategy, RuleId, Safety};

    fn json_column() -> Operation {
        Operation::add_json_column("events", "payload").expect("valid operation")
    }

    #[test]
    fn test_unsafe_on_every_postgres_version() {
        for major in [9, 12, 16] {
            let v = verdict(&json_column(), &Engine::postgres(major));
            assert_eq!(v.rule, RuleId::Mg005);
            assert_eq!(v.status, Safety::Unsafe);
            assert_eq!(v.remediation, RemediationStrategy::UseJsonB);
        }
    }

    #[test]
    fn test_safe_on_mysql_family() {
        assert_eq!(verdict(&json_column(), &Engine::mysql(8, 0, 30)).status, Safety::Safe);
        assert_eq!(
            verdict(&json_column(), &Engine::mariadb(10, 6, 0)).status,
            Safety::Safe
        );
    }

    #[test]
    fn test_unknown_engine_not_assumed_safe() {
        let engine = Engine::new(EngineKind::Other("sqlite".to_string()), Version::major(3));
        assert_eq!(
            verdict(&json_column(), &engine).status,
            Safety::ConditionallySafe
        );
    }
}
