use crate::model::operation::{AddCheckConstraint, AddForeignKey};
use crate::model::{MigrationBatch, Operation, OperationRef};
use crate::sequencer::{SequencingRule, SequencingViolation};

pub(super) const DEFERRED_DESCRIPTION: &str =
    "Constraint validation must run in a later migration than its creation";

pub(super) const DEFERRED_EXPLAIN: &str = "validation-must-be-deferred\n\
         \n\
         What it detects:\n\
         A foreign key or check constraint created unvalidated and validated\n\
         again within the same migration unit.\n\
         \n\
         Why it matters:\n\
         The point of creating the constraint unvalidated is to take the\n\
         short lock now and run the long scan separately. Validating in the\n\
         same transaction keeps the creation's strong lock for the whole\n\
         scan, which is exactly what the phased approach avoids.\n\
         \n\
         Fix:\n\
         Move the validation into a later migration.";

pub(super) const ORDER_DESCRIPTION: &str = "Constraint validated before it is created";

pub(super) const ORDER_EXPLAIN: &str = "validate-before-create\n\
         \n\
         What it detects:\n\
         A constraint validation that appears earlier in the batch than the\n\
         unvalidated creation it targets.\n\
         \n\
         Why it matters:\n\
         The validation fails at deploy time because the constraint does not\n\
         exist yet, or it validates an older constraint of the same name.\n\
         \n\
         Fix:\n\
         Order the migrations so the creation comes first.";

/// An unvalidated constraint creation that a later validation can target.
enum Creation<'a> {
    ForeignKey(&'a AddForeignKey),
    Check(&'a AddCheckConstraint),
}

fn is_validated_by(creation: &Creation<'_>, validation: &Operation) -> bool {
    match (creation, validation) {
        (Creation::ForeignKey(fk), Operation::ValidateForeignKey(v)) => v.targets(fk),
        (Creation::Check(check), Operation::ValidateCheckConstraint(v)) => {
            v.table.eq_ignore_ascii_case(&check.table) && v.name.eq_ignore_ascii_case(&check.name)
        }
        _ => false,
    }
}

fn unvalidated_creations(batch: &MigrationBatch) -> Vec<(OperationRef, Creation<'_>)> {
    batch
        .operations()
        .filter_map(|(at, op)| match op {
            Operation::AddForeignKey(fk) if !fk.validate => Some((at, Creation::ForeignKey(fk))),
            Operation::AddCheckConstraint(check) if !check.validate => {
                Some((at, Creation::Check(check)))
            }
            _ => None,
        })
        .collect()
}

pub(super) fn check(batch: &MigrationBatch) -> Vec<SequencingViolation> {
    let creations = unvalidated_creations(batch);
    let mut violations = Vec::new();

    for (validation_at, validation) in batch.operations() {
        if !matches!(
            validation,
            Operation::ValidateForeignKey(_) | Operation::ValidateCheckConstraint(_)
        ) {
            continue;
        }

        let matching: Vec<OperationRef> = creations
            .iter()
            .filter(|(_, creation)| is_validated_by(creation, validation))
            .map(|(at, _)| *at)
            .collect();

        let same_unit: Vec<OperationRef> = matching
            .iter()
            .copied()
            .filter(|at| at.unit == validation_at.unit)
            .collect();

        for created_at in &same_unit {
            violations.push(SequencingViolation {
                rule: SequencingRule::ValidationMustBeDeferred,
                at: validation_at,
                related: Some(*created_at),
                message: format!(
                    "'{validation}' runs in the same migration as the unvalidated creation at \
                     {created_at}; validate in a later migration"
                ),
            });
        }

        // Ordering is checked across the whole batch, including within one unit.
        let created_earlier = matching.iter().any(|at| *at < validation_at);
        let created_later = matching.iter().copied().find(|at| *at > validation_at);
        if let (false, Some(created_at)) = (created_earlier, created_later) {
            violations.push(SequencingViolation {
                rule: SequencingRule::ValidateBeforeCreate,
                at: validation_at,
                related: Some(created_at),
                message: format!(
                    "'{validation}' runs before the constraint is created at {created_at}"
                ),
            });
        }
    }

    violations
}
