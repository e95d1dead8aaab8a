//! MG012 — Foreign key validation
//!
//! Safe on its own. Where it sits relative to the creation is checked by
//! the sequencer.

use crate::rules::{RemediationStrategy, Safety, SafetyRule, otherwise};

pub(super) const DESCRIPTION: &str = "Foreign key validation only takes SHARE UPDATE EXCLUSIVE";

pub(super) const EXPLAIN: &str = "MG012 — Foreign key validation\n\
         \n\
         What it detects:\n\
         Validation of a previously unvalidated foreign key.\n\
         \n\
         Why it's safe:\n\
         VALIDATE CONSTRAINT scans the table under SHARE UPDATE EXCLUSIVE,\n\
         which does not block reads or writes, plus ROW SHARE on the\n\
         referenced table.\n\
         \n\
         Related sequencing checks:\n\
         validation-must-be-deferred and validate-before-create report a\n\
         validation placed in the same migration as, or before, the\n\
         creation it validates.";

pub(super) static RULES: &[SafetyRule] = &[otherwise(
    Safety::Safe,
    "validation scans rows under SHARE UPDATE EXCLUSIVE without blocking writes",
    RemediationStrategy::None,
)];
