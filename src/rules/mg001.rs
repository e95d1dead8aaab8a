//! MG001 — Index build
//!
//! A plain `CREATE INDEX` on PostgreSQL holds a SHARE lock for the whole
//! build, blocking every write to the table. `CONCURRENTLY` avoids that but
//! cannot run inside a transaction block. A concurrent build inside a DDL
//! transaction is flagged on every engine. Otherwise MySQL 5.6+ and
//! MariaDB 10.0+ build secondary indexes online.

use crate::model::Operation;
use crate::rules::thresholds::{Feature, supports};
use crate::rules::{
    EngineMatch, RemediationStrategy, RuleContext, Safety, SafetyRule, UnsupportedEngineVersion,
    otherwise, when,
};

pub(super) const DESCRIPTION: &str = "Index build blocks writes unless run concurrently";

pub(super) const EXPLAIN: &str = "MG001 — Index build\n\
         \n\
         What it detects:\n\
         An index creation that is not run concurrently on PostgreSQL, or a\n\
         concurrent build inside a migration that still runs in a DDL\n\
         transaction.\n\
         \n\
         Why it's dangerous:\n\
         CREATE INDEX takes a SHARE lock on the table for the entire build.\n\
         Reads continue, but every INSERT, UPDATE and DELETE waits until the\n\
         index is finished, which can take minutes on a large table.\n\
         CREATE INDEX CONCURRENTLY only takes SHARE UPDATE EXCLUSIVE, but\n\
         PostgreSQL refuses to run it inside a transaction block.\n\
         \n\
         Example (bad):\n\
           CREATE INDEX idx_orders_status ON orders (status);\n\
         \n\
         Fix:\n\
           -- in a migration with the DDL transaction disabled, alone:\n\
           CREATE INDEX CONCURRENTLY idx_orders_status ON orders (status);\n\
         \n\
         MySQL 5.6+ and MariaDB 10.0+ build indexes online, so plain builds\n\
         are not flagged there. A concurrent build is still flagged on any\n\
         engine when the migration keeps its DDL transaction.";

fn concurrent_outside_transaction(
    op: &Operation,
    ctx: &RuleContext<'_>,
) -> Result<bool, UnsupportedEngineVersion> {
    Ok(op.is_concurrent_index() && ctx.disable_ddl_transaction)
}

fn concurrent(op: &Operation, _ctx: &RuleContext<'_>) -> Result<bool, UnsupportedEngineVersion> {
    Ok(op.is_concurrent_index())
}

fn online_build(_op: &Operation, ctx: &RuleContext<'_>) -> Result<bool, UnsupportedEngineVersion> {
    supports(Feature::OnlineIndexBuild, ctx.engine)
}

pub(super) static RULES: &[SafetyRule] = &[
    when(
        EngineMatch::Any,
        concurrent_outside_transaction,
        Safety::Safe,
        "concurrent build outside a transaction lets writes continue",
        RemediationStrategy::None,
    ),
    when(
        EngineMatch::Any,
        concurrent,
        Safety::Unsafe,
        "CONCURRENTLY requires disabling the DDL transaction.",
        RemediationStrategy::DisableDdlTransaction,
    ),
    when(
        EngineMatch::Any,
        online_build,
        Safety::Safe,
        "engine builds the index online without blocking writes",
        RemediationStrategy::None,
    ),
    otherwise(
        Safety::Unsafe,
        "index build holds a SHARE lock that blocks writes for its full duration",
        RemediationStrategy::UseConcurrentIndex,
    ),
];
