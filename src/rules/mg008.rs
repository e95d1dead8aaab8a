//! MG008 — Column removal
//!
//! Dropping a column is quick for the database, but application instances
//! still running the previous release keep selecting and inserting it.
//! Whether that has happened is outside what a static analysis can see.

use crate::rules::{RemediationStrategy, Safety, SafetyRule, otherwise};

pub(super) const DESCRIPTION: &str =
    "Column removal needs application code deployed first";

pub(super) const EXPLAIN: &str = "MG008 — Column removal\n\
         \n\
         What it detects:\n\
         Any column removal.\n\
         \n\
         Why it matters:\n\
         Running application instances may still reference the column,\n\
         either explicitly or through an ORM that caches the column list.\n\
         Once the column is gone their queries fail. Whether the application\n\
         has already stopped using it cannot be seen from the migration plan,\n\
         so the operation is reported as conditionally safe.\n\
         \n\
         Fix:\n\
         Deploy application code that no longer reads or writes the column\n\
         (for ORMs, mark it ignored) before running the migration that drops\n\
         it.";

pub(super) static RULES: &[SafetyRule] = &[otherwise(
    Safety::ConditionallySafe,
    "requires out-of-band coordination: application code must stop using the column before it is removed",
    RemediationStrategy::ApplicationCodeFirst,
)];
