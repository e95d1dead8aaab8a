//! MG004 — Column added with a default
//!
//! Since PostgreSQL 11, MySQL 8.0.12 and MariaDB 10.3.2, a non-volatile
//! default is stored once in the catalog and existing rows are not touched.
//! Older versions, and any volatile default, rewrite every row while the
//! table is locked.

use crate::model::Operation;
use crate::rules::thresholds::{Feature, supports};
use crate::rules::{
    EngineMatch, RemediationStrategy, RuleContext, Safety, SafetyRule, UnsupportedEngineVersion,
    otherwise, when,
};

pub(super) const DESCRIPTION: &str =
    "Adding a column with a default rewrites the table on older engines or volatile defaults";

pub(super) const EXPLAIN: &str = "MG004 — Column added with a default\n\
         \n\
         What it detects:\n\
         A column added together with a default value, where either the\n\
         engine version predates catalog-stored defaults or the default is\n\
         volatile.\n\
         \n\
         Why it's dangerous:\n\
         Before PostgreSQL 11 (MySQL 8.0.12, MariaDB 10.3.2) the engine fills\n\
         the default into every existing row, rewriting the table while it\n\
         holds an exclusive lock. A volatile default (gen_random_uuid(),\n\
         random(), clock_timestamp(), nextval(), ...) must be evaluated per\n\
         row, so it rewrites the table on every version. now() is stable\n\
         within a statement and does not force a rewrite.\n\
         \n\
         Example (bad, PostgreSQL 10):\n\
           ALTER TABLE users ADD COLUMN approved boolean DEFAULT false;\n\
         \n\
         Fix:\n\
           ALTER TABLE users ADD COLUMN approved boolean;\n\
           -- separate migration:\n\
           ALTER TABLE users ALTER COLUMN approved SET DEFAULT false;\n\
           -- backfill existing rows in batches if needed";

fn volatile_default(op: &Operation, _ctx: &RuleContext<'_>) -> Result<bool, UnsupportedEngineVersion> {
    Ok(matches!(op, Operation::AddColumnWithDefault(ac) if ac.is_volatile()))
}

fn fast_default(_op: &Operation, ctx: &RuleContext<'_>) -> Result<bool, UnsupportedEngineVersion> {
    supports(Feature::FastColumnDefault, ctx.engine)
}

pub(super) static RULES: &[SafetyRule] = &[
    when(
        EngineMatch::Any,
        volatile_default,
        Safety::Unsafe,
        "volatile default is evaluated per row and rewrites the whole table",
        RemediationStrategy::AddThenSetDefaultSeparately,
    ),
    when(
        EngineMatch::Any,
        fast_default,
        Safety::Safe,
        "non-volatile default is stored in the catalog without rewriting rows",
        RemediationStrategy::None,
    ),
    otherwise(
        Safety::Unsafe,
        "engine version writes the default into every existing row under an exclusive lock",
        RemediationStrategy::AddThenSetDefaultSeparately,
    ),
];
