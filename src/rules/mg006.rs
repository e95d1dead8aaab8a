//! MG006 — Column type change
//!
//! Most type changes rewrite the table under an exclusive lock. A fixed
//! allow-list of conversions (see [`super::type_change`]) are metadata-only
//! on the engine versions that support them.

use crate::model::Operation;
use crate::model::operation::AlterColumnType;
use crate::rules::thresholds::{Feature, supports};
use crate::rules::type_change::{
    is_binary_coercible, is_time_zone_swap, is_varchar_in_bucket_extension,
};
use crate::rules::{
    EngineMatch, RemediationStrategy, RuleContext, Safety, SafetyRule, UnsupportedEngineVersion,
    otherwise, when,
};

pub(super) const DESCRIPTION: &str = "Column type change rewrites the table unless allow-listed";

pub(super) const EXPLAIN: &str = "MG006 — Column type change\n\
         \n\
         What it detects:\n\
         A column type change that is not on the allow-list of conversions\n\
         the target engine applies without a rewrite.\n\
         \n\
         Why it's dangerous:\n\
         Changing a column's type usually rewrites every row and rebuilds\n\
         every index on the table while an exclusive lock is held. On a large\n\
         table this is extended downtime.\n\
         \n\
         Allowed (PostgreSQL 9.2+):\n\
         - varchar(N) -> varchar(M) where M >= N, or -> varchar\n\
         - varchar(N) -> text, text -> varchar\n\
         - numeric(P,S) -> numeric(P2,S) where P2 >= P, or -> numeric\n\
         - varbit(N) -> varbit(M) where M >= N\n\
         - cidr -> inet, citext <-> text\n\
         Allowed (PostgreSQL 12+, session time zone UTC):\n\
         - timestamp <-> timestamptz\n\
         Allowed (MySQL 5.7+, MariaDB 10.2.2+):\n\
         - varchar(N) -> varchar(M) where M >= N and both lengths are on the\n\
           same side of 255 (the length prefix stays one or two bytes)\n\
         \n\
         Example (bad):\n\
           ALTER TABLE orders ALTER COLUMN amount TYPE bigint;\n\
         \n\
         Fix:\n\
           -- Split into phases: add a new column, dual-write, backfill,\n\
           -- switch reads, then drop the old column.\n\
           ALTER TABLE orders ADD COLUMN amount_new bigint;";

fn type_change(op: &Operation) -> Option<&AlterColumnType> {
    match op {
        Operation::AlterColumnType(change) => Some(change),
        _ => None,
    }
}

fn binary_coercible(op: &Operation, ctx: &RuleContext<'_>) -> Result<bool, UnsupportedEngineVersion> {
    let Some(change) = type_change(op) else {
        return Ok(false);
    };
    Ok(is_binary_coercible(&change.from_type, &change.to_type)
        && supports(Feature::BinaryCoercibleTypeChange, ctx.engine)?)
}

fn utc_time_zone_swap(
    op: &Operation,
    ctx: &RuleContext<'_>,
) -> Result<bool, UnsupportedEngineVersion> {
    let Some(change) = type_change(op) else {
        return Ok(false);
    };
    Ok(is_time_zone_swap(&change.from_type, &change.to_type)
        && ctx.engine.is_utc_session()
        && supports(Feature::TimestampTimeZoneSwap, ctx.engine)?)
}

fn in_place_varchar_extension(
    op: &Operation,
    ctx: &RuleContext<'_>,
) -> Result<bool, UnsupportedEngineVersion> {
    let Some(change) = type_change(op) else {
        return Ok(false);
    };
    Ok(is_varchar_in_bucket_extension(&change.from_type, &change.to_type)
        && supports(Feature::InPlaceVarcharExtension, ctx.engine)?)
}

pub(super) static RULES: &[SafetyRule] = &[
    when(
        EngineMatch::Any,
        binary_coercible,
        Safety::Safe,
        "binary-coercible type change skips the table rewrite",
        RemediationStrategy::None,
    ),
    when(
        EngineMatch::Any,
        utc_time_zone_swap,
        Safety::Safe,
        "timestamp/timestamptz swap under a UTC session skips the table rewrite",
        RemediationStrategy::None,
    ),
    when(
        EngineMatch::Any,
        in_place_varchar_extension,
        Safety::Safe,
        "VARCHAR extension within the same length-byte bucket is applied in place",
        RemediationStrategy::None,
    ),
    otherwise(
        Safety::Unsafe,
        "type change rewrites the table and its indexes while blocking writes",
        RemediationStrategy::SplitIntoPhases,
    ),
];
