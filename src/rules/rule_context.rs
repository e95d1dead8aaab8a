use crate::model::{Engine, MigrationUnit};

/// Context available to rules during classification.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// Target engine for the whole analysis run.
    pub engine: &'a Engine,

    /// Whether the containing unit runs outside a DDL transaction.
    /// `CONCURRENTLY` index operations need this.
    pub disable_ddl_transaction: bool,

    /// Whether the containing unit skips the framework's migration lock.
    pub disable_migration_lock: bool,
}

impl<'a> RuleContext<'a> {
    pub fn for_unit(engine: &'a Engine, unit: &MigrationUnit) -> Self {
        Self {
            engine,
            disable_ddl_transaction: unit.disable_ddl_transaction(),
            disable_migration_lock: unit.disable_migration_lock(),
        }
    }
}
