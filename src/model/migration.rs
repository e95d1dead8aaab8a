//! Migration units and batches.

use std::fmt;

use serde::Serialize;

use super::operation::Operation;

/// Position of an operation within a batch. Ordering follows applied order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct OperationRef {
    /// Zero-based unit index within the batch.
    pub unit: usize,
    /// Zero-based operation index within the unit.
    pub index: usize,
}

impl OperationRef {
    pub fn new(unit: usize, index: usize) -> Self {
        Self { unit, index }
    }
}

impl fmt::Display for OperationRef {
    /// One-based `unit:operation` for human-facing output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.unit + 1, self.index + 1)
    }
}

/// Operations that share one transactional boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationUnit {
    name: String,
    operations: Vec<Operation>,
    disable_ddl_transaction: bool,
    disable_migration_lock: bool,
}

impl MigrationUnit {
    pub fn new(name: impl Into<String>, operations: Vec<Operation>) -> Self {
        Self {
            name: name.into(),
            operations,
            disable_ddl_transaction: false,
            disable_migration_lock: false,
        }
    }

    /// Run the unit outside a wrapping DDL transaction.
    #[must_use]
    pub fn without_ddl_transaction(mut self) -> Self {
        self.disable_ddl_transaction = true;
        self
    }

    /// Run the unit without the framework's migration advisory lock.
    #[must_use]
    pub fn without_migration_lock(mut self) -> Self {
        self.disable_migration_lock = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn disable_ddl_transaction(&self) -> bool {
        self.disable_ddl_transaction
    }

    pub fn disable_migration_lock(&self) -> bool {
        self.disable_migration_lock
    }
}

/// A deployment's full migration plan, in applied order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationBatch {
    units: Vec<MigrationUnit>,
}

impl MigrationBatch {
    pub fn new(units: Vec<MigrationUnit>) -> Self {
        Self { units }
    }

    pub fn units(&self) -> &[MigrationUnit] {
        &self.units
    }

    pub fn is_empty(&self) -> bool {
        self.units.iter().all(|u| u.operations().is_empty())
    }

    /// Every operation in applied order, with its position.
    pub fn operations(&self) -> impl Iterator<Item = (OperationRef, &Operation)> {
        self.units.iter().enumerate().flat_map(|(u, unit)| {
            unit.operations()
                .iter()
                .enumerate()
                .map(move |(i, op)| (OperationRef::new(u, i), op))
        })
    }

    pub fn get(&self, at: OperationRef) -> Option<&Operation> {
        self.units.get(at.unit)?.operations().get(at.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operations_in_applied_order() {
        let batch = MigrationBatch::new(vec![
            MigrationUnit::new(
                "001_add_columns",
                vec![
                    Operation::add_column("users", "approved", "boolean").expect("valid"),
                    Operation::add_column("users", "banned", "boolean").expect("valid"),
                ],
            ),
            MigrationUnit::new(
                "002_add_index",
                vec![
                    Operation::create_index("users", None, ["approved"], false, true)
                        .expect("valid"),
                ],
            )
            .without_ddl_transaction(),
        ]);

        let positions: Vec<OperationRef> = batch.operations().map(|(at, _)| at).collect();
        assert_eq!(
            positions,
            vec![
                OperationRef::new(0, 0),
                OperationRef::new(0, 1),
                OperationRef::new(1, 0),
            ]
        );
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(batch.units()[1].disable_ddl_transaction());
        assert!(!batch.units()[1].disable_migration_lock());
        assert!(batch.get(OperationRef::new(1, 1)).is_none());
    }

    #[test]
    fn test_operation_ref_display_is_one_based() {
        assert_eq!(OperationRef::new(0, 2).to_string(), "1:3");
    }
}
