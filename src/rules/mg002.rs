//! MG002 — Index drop
//!
//! `DROP INDEX` takes ACCESS EXCLUSIVE on the parent table on PostgreSQL.
//! The concurrent form waits for in-flight transactions instead and shares
//! the transaction-block restriction of concurrent builds, which is
//! enforced on every engine.

use crate::model::Operation;
use crate::rules::thresholds::{Feature, supports};
use crate::rules::{
    EngineMatch, RemediationStrategy, RuleContext, Safety, SafetyRule, UnsupportedEngineVersion,
    otherwise, when,
};

pub(super) const DESCRIPTION: &str = "Index drop blocks reads and writes unless run concurrently";

pub(super) const EXPLAIN: &str = "MG002 — Index drop\n\
         \n\
         What it detects:\n\
         An index removal that is not run concurrently on PostgreSQL, or a\n\
         concurrent drop inside a migration that still runs in a DDL\n\
         transaction.\n\
         \n\
         Why it's dangerous:\n\
         DROP INDEX acquires an ACCESS EXCLUSIVE lock on the table. The drop\n\
         itself is quick, but the lock request queues behind any long-running\n\
         query and every query arriving afterwards queues behind it.\n\
         \n\
         Example (bad):\n\
           DROP INDEX idx_orders_status;\n\
         \n\
         Fix:\n\
           -- in a migration with the DDL transaction disabled, alone:\n\
           DROP INDEX CONCURRENTLY idx_orders_status;";

fn concurrent_outside_transaction(
    op: &Operation,
    ctx: &RuleContext<'_>,
) -> Result<bool, UnsupportedEngineVersion> {
    Ok(op.is_concurrent_index() && ctx.disable_ddl_transaction)
}

fn concurrent(op: &Operation, _ctx: &RuleContext<'_>) -> Result<bool, UnsupportedEngineVersion> {
    Ok(op.is_concurrent_index())
}

fn online_drop(_op: &Operation, ctx: &RuleContext<'_>) -> Result<bool, UnsupportedEngineVersion> {
    supports(Feature::OnlineIndexBuild, ctx.engine)
}

pub(super) static RULES: &[SafetyRule] = &[
    when(
        EngineMatch::Any,
        concurrent_outside_transaction,
        Safety::Safe,
        "concurrent drop outside a transaction does not block new queries",
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
        online_drop,
        Safety::Safe,
        "engine drops the index in place without blocking writes",
        RemediationStrategy::None,
    ),
    otherwise(
        Safety::Unsafe,
        "index drop takes ACCESS EXCLUSIVE on the table and queues all queries behind it",
        RemediationStrategy::UseConcurrentIndex,
    ),
];

#[cfg(test)]
mod tests {
    use crate::locks::LockMode;
    use crate::model::{Engine, Operation};
    use crate::rules::test_helpers::{ctx, ctx_without_ddl_transaction, verdict};
    use crate::rules::{RemediationStrategy, RuleId, Safety, classify};

    fn drop_index(concurrently: bool) -> Operation {
        Operation::remove_index("orders", "idx_orders_status", concurrently)
            .expect("valid operation")
    }

    #[test]
    fn test_plain_drop_unsafe() {
        let v = verdict(&drop_index(false), &Engine::postgres(14));
        assert_eq!(v.rule, RuleId::Mg002);
        assert_eq!(v.status, Safety::Unsafe);
        assert_eq!(v.lock_mode, Some(LockMode::AccessExclusive));
        assert_eq!(v.remediation, RemediationStrategy::UseConcurrentIndex);
    }

    #[test]
    fn test_concurrent_drop_needs_ddl_transaction_disabled() {
        let engine = Engine::postgres(14);
        assert_eq!(verdict(&drop_index(true), &engine).status, Safety::Unsafe);
        let v = classify(&drop_index(true), &ctx_without_ddl_transaction(&engine));
        assert_eq!(v.status, Safety::Safe);
        assert_eq!(v.lock_mode, Some(LockMode::ShareUpdateExclusive));
    }

    #[test]
    fn test_concurrent_drop_in_transaction_unsafe_on_mysql() {
        let engine = Engine::mysql(8, 0, 30);
        let v = classify(&drop_index(true), &ctx(&engine));
        assert_eq!(v.status, Safety::Unsafe);
        assert_eq!(v.remediation, RemediationStrategy::DisableDdlTransaction);
    }

    #[test]
    fn test_mariadb_drop_online() {
        assert_eq!(
            verdict(&drop_index(false), &Engine::mariadb(10, 4, 0)).status,
            Safety::Safe
        );
    }
}
