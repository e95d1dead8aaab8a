use crate::model::{MigrationBatch, OperationRef};
use crate::sequencer::{SequencingRule, SequencingViolation};

pub(super) const DESCRIPTION: &str = "Concurrent index operations must be alone in their migration";

pub(super) const EXPLAIN: &str = "concurrent-index-must-be-isolated\n\
         \n\
         What it detects:\n\
         A migration unit that contains a concurrent index build or drop\n\
         together with any other operation.\n\
         \n\
         Why it matters:\n\
         Concurrent index operations need the unit's DDL transaction\n\
         disabled. Every other operation in that unit then runs without a\n\
         transaction as well, so a failure halfway leaves the schema\n\
         partially migrated. A failed concurrent build also leaves an\n\
         INVALID index behind that has to be dropped by hand.\n\
         \n\
         Fix:\n\
         Move the concurrent index operation into its own migration.";

/// One violation per sibling of each concurrent index operation.
pub(super) fn check(batch: &MigrationBatch) -> Vec<SequencingViolation> {
    let mut violations = Vec::new();

    for (u, unit) in batch.units().iter().enumerate() {
        let operations = unit.operations();
        for (i, index_op) in operations.iter().enumerate() {
            if !index_op.is_concurrent_index() {
                continue;
            }
            let index_at = OperationRef::new(u, i);
            for (j, sibling) in operations.iter().enumerate() {
                if j == i {
                    continue;
                }
                violations.push(SequencingViolation {
                    rule: SequencingRule::ConcurrentIndexMustBeIsolated,
                    at: OperationRef::new(u, j),
                    related: Some(index_at),
                    message: format!(
                        "'{sibling}' shares migration '{unit}' with concurrent index operation \
                         '{index_op}' at {index_at}; concurrent index operations must run alone",
                        unit = unit.name(),
                    ),
                });
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MigrationUnit, Operation};

    fn concurrent_index() -> Operation {
        Operation::create_index("orders", Some("idx_orders_status"), ["status"], false, true)
            .expect("valid operation")
    }

    #[test]
    fn test_isolated_concurrent_index_passes() {
        let batch = MigrationBatch::new(vec![
            MigrationUnit::new("001", vec![concurrent_index()]).without_ddl_transaction(),
        ]);
        assert!(check(&batch).is_empty());
    }

    #[test]
    fn test_one_violation_per_sibling() {
        let batch = MigrationBatch::new(vec![MigrationUnit::new(
            "001",
            vec![
                Operation::add_column("orders", "status", "text").expect("valid"),
                concurrent_index(),
                Operation::add_column("orders", "region", "text").expect("valid"),
            ],
        )]);

        let violations = check(&batch);
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].at, OperationRef::new(0, 0));
        assert_eq!(violations[1].at, OperationRef::new(0, 2));
        assert!(
            violations
                .iter()
                .all(|v| v.related == Some(OperationRef::new(0, 1)))
        );
        assert!(violations[0].message.contains("concurrent index"));
    }

    #[test]
    fn test_plain_index_with_siblings_passes() {
        let batch = MigrationBatch::new(vec![MigrationUnit::new(
            "001",
            vec![
                Operation::add_column("orders", "status", "text").expect("valid"),
                Operation::create_index("orders", None, ["status"], false, false).expect("valid"),
            ],
        )]);
        assert!(check(&batch).is_empty());
    }

    #[test]
    fn test_concurrent_drop_also_isolated() {
        let batch = MigrationBatch::new(vec![MigrationUnit::new(
            "001",
            vec![
                Operation::remove_index("orders", "idx_old", true).expect("valid"),
                Operation::remove_column("orders", ["old"]).expect("valid"),
            ],
        )]);
        let violations = check(&batch);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].at, OperationRef::new(0, 1));
    }
}
