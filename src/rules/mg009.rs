//! MG009 — Column rename

use crate::rules::{RemediationStrategy, Safety, SafetyRule, otherwise};

pub(super) const DESCRIPTION: &str = "Column rename breaks code still using the old name";

pub(super) const EXPLAIN: &str = "MG009 — Column rename\n\
         \n\
         What it detects:\n\
         Any column rename.\n\
         \n\
         Why it matters:\n\
         The rename is a catalog change, but every running query that uses\n\
         the old name fails from the moment it commits. There is no point at\n\
         which both the old and the new application release work unless the\n\
         change is coordinated outside the migration.\n\
         \n\
         Fix:\n\
         Add a new column, write to both, backfill, move reads to the new\n\
         column, then drop the old one. Or deploy code that tolerates both\n\
         names first.";

pub(super) static RULES: &[SafetyRule] = &[otherwise(
    Safety::ConditionallySafe,
    "requires out-of-band coordination: running code referencing the old column name fails after the rename",
    RemediationStrategy::ApplicationCodeFirst,
)];
