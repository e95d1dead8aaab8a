//! MG003 — Column added without a default
//!
//! Adding a nullable column without a default only touches the catalog on
//! every supported engine. A `json` column added this way on PostgreSQL is
//! still flagged because of the type itself (see MG005).

use crate::model::Operation;
use crate::rules::{
    EngineMatch, RemediationStrategy, RuleContext, Safety, SafetyRule, UnsupportedEngineVersion,
    otherwise, when,
};

pub(super) const DESCRIPTION: &str = "Adding a column without a default is metadata-only";

pub(super) const EXPLAIN: &str = "MG003 — Column added without a default\n\
         \n\
         What it detects:\n\
         A column added with no default value.\n\
         \n\
         Why it's safe:\n\
         Existing rows read the new column as NULL without being rewritten,\n\
         so the brief ACCESS EXCLUSIVE lock is only held for the catalog\n\
         update.\n\
         \n\
         Exception:\n\
         On PostgreSQL a column of type json is flagged as unsafe because the\n\
         type has no equality operator. Use jsonb instead.\n\
         \n\
         Example (fine):\n\
           ALTER TABLE users ADD COLUMN approved boolean;";

fn json_column(op: &Operation, _ctx: &RuleContext<'_>) -> Result<bool, UnsupportedEngineVersion> {
    Ok(matches!(op, Operation::AddColumn(ac) if ac.column_type.is_json()))
}

pub(super) static RULES: &[SafetyRule] = &[
    when(
        EngineMatch::Postgres,
        json_column,
        Safety::Unsafe,
        "json has no equality operator, breaking DISTINCT, UNION and GROUP BY on the table",
        RemediationStrategy::UseJsonB,
    ),
    otherwise(
        Safety::Safe,
        "nullable column without a default is a catalog-only change",
        RemediationStrategy::None,
    ),
];
