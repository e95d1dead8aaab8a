//! MG011 — Foreign key creation
//!
//! Adding a validated foreign key scans the referencing table while holding
//! SHARE ROW EXCLUSIVE on both tables. Creating it unvalidated skips the
//! scan; validation can then run later under a weaker lock.

use crate::model::Operation;
use crate::rules::{
    EngineMatch, RemediationStrategy, RuleContext, Safety, SafetyRule, UnsupportedEngineVersion,
    otherwise, when,
};

pub(super) const DESCRIPTION: &str = "Validated foreign key creation blocks writes on both tables";

pub(super) const EXPLAIN: &str = "MG011 — Foreign key creation\n\
         \n\
         What it detects:\n\
         A foreign key added with validation of existing rows.\n\
         \n\
         Why it's dangerous:\n\
         The engine checks every existing row of the referencing table while\n\
         holding SHARE ROW EXCLUSIVE on both the referencing and the\n\
         referenced table, blocking writes to both for the whole scan.\n\
         \n\
         Example (bad):\n\
           ALTER TABLE orders ADD CONSTRAINT fk_user\n\
             FOREIGN KEY (user_id) REFERENCES users (id);\n\
         \n\
         Fix (split into phases):\n\
           ALTER TABLE orders ADD CONSTRAINT fk_user\n\
             FOREIGN KEY (user_id) REFERENCES users (id) NOT VALID;\n\
           -- later, separate migration:\n\
           ALTER TABLE orders VALIDATE CONSTRAINT fk_user;\n\
         \n\
         An unvalidated foreign key is reported as conditionally safe: it is\n\
         only safe if the validation really lands in a later migration.";

fn not_validated(op: &Operation, _ctx: &RuleContext<'_>) -> Result<bool, UnsupportedEngineVersion> {
    Ok(matches!(op, Operation::AddForeignKey(fk) if !fk.validate))
}

pub(super) static RULES: &[SafetyRule] = &[
    when(
        EngineMatch::Any,
        not_validated,
        Safety::ConditionallySafe,
        "unvalidated foreign key skips the scan of existing rows; validate it in a later unit",
        RemediationStrategy::SplitIntoPhases,
    ),
    otherwise(
        Safety::Unsafe,
        "validating existing rows locks both tables against writes for the whole scan",
        RemediationStrategy::SplitIntoPhases,
    ),
];
