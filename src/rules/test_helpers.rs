//! Shared test helpers for rule unit tests.

use crate::model::{Engine, Operation};
use crate::rules::{RuleContext, Verdict, classify};

/// Build a `RuleContext` with default unit flags (in a DDL transaction).
pub fn ctx(engine: &Engine) -> RuleContext<'_> {
    RuleContext {
        engine,
        disable_ddl_transaction: false,
        disable_migration_lock: false,
    }
}

/// Build a `RuleContext` for a unit that runs outside a DDL transaction.
pub fn ctx_without_ddl_transaction(engine: &Engine) -> RuleContext<'_> {
    RuleContext {
        engine,
        disable_ddl_transaction: true,
        disable_migration_lock: false,
    }
}

/// Classify an operation inside a default unit.
pub fn verdict(op: &Operation, engine: &Engine) -> Verdict {
    classify(op, &ctx(engine))
}
