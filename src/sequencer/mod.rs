//! Migration sequencer
//!
//! Second pass over the whole batch, run after every operation has a
//! verdict. Detects operations that must not share a migration unit and
//! validations placed before the constraint they validate, and refines
//! `SET NOT NULL` verdicts with what earlier units established.

use std::fmt;

use serde::Serialize;
use strum::IntoEnumIterator;
use strum_macros::{EnumIter, EnumString, IntoStaticStr};
use tracing::debug;

use crate::model::{Engine, MigrationBatch, OperationRef};
use crate::rules::Verdict;

mod isolation;
mod not_null;
mod validation;

/// Identifier of a cross-operation rule.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, EnumString, IntoStaticStr,
)]
pub enum SequencingRule {
    /// Concurrent index operation shares its unit with other operations.
    #[strum(serialize = "concurrent-index-must-be-isolated")]
    ConcurrentIndexMustBeIsolated,
    /// Unvalidated constraint creation and its validation share a unit.
    #[strum(serialize = "validation-must-be-deferred")]
    ValidationMustBeDeferred,
    /// Validation precedes the unvalidated creation it targets.
    #[strum(serialize = "validate-before-create")]
    ValidateBeforeCreate,
    /// `SET NOT NULL` without a validated `CHECK (col IS NOT NULL)` before it.
    #[strum(serialize = "set-not-null-requires-validated-check")]
    SetNotNullRequiresValidatedCheck,
}

impl SequencingRule {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::ConcurrentIndexMustBeIsolated => isolation::DESCRIPTION,
            Self::ValidationMustBeDeferred => validation::DEFERRED_DESCRIPTION,
            Self::ValidateBeforeCreate => validation::ORDER_DESCRIPTION,
            Self::SetNotNullRequiresValidatedCheck => not_null::DESCRIPTION,
        }
    }

    pub fn explain(&self) -> &'static str {
        match self {
            Self::ConcurrentIndexMustBeIsolated => isolation::EXPLAIN,
            Self::ValidationMustBeDeferred => validation::DEFERRED_EXPLAIN,
            Self::ValidateBeforeCreate => validation::ORDER_EXPLAIN,
            Self::SetNotNullRequiresValidatedCheck => not_null::EXPLAIN,
        }
    }

    /// Iterator over every sequencing rule, for `--explain` listings.
    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }
}

impl fmt::Display for SequencingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SequencingRule {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A cross-operation constraint broken by the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequencingViolation {
    pub rule: SequencingRule,
    /// The operation reported.
    pub at: OperationRef,
    /// The other operation involved, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related: Option<OperationRef>,
    pub message: String,
}

/// A verdict replaced using batch-wide context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refinement {
    pub at: OperationRef,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequencerOutcome {
    pub violations: Vec<SequencingViolation>,
    pub refinements: Vec<Refinement>,
}

/// Verdicts from the first pass, indexed `[unit][operation]`.
pub type VerdictGrid = [Vec<Verdict>];

fn verdict_at(verdicts: &VerdictGrid, at: OperationRef) -> Option<&Verdict> {
    verdicts.get(at.unit)?.get(at.index)
}

/// Run every sequencing rule over the batch.
///
/// Violations come back ordered by the position of the reported operation.
pub fn check(batch: &MigrationBatch, engine: &Engine, verdicts: &VerdictGrid) -> SequencerOutcome {
    let mut outcome = SequencerOutcome::default();

    outcome.violations.extend(isolation::check(batch));
    outcome.violations.extend(validation::check(batch));
    not_null::check(batch, engine, verdicts, &mut outcome);

    outcome
        .violations
        .sort_by(|a, b| (a.at, a.rule, a.related).cmp(&(b.at, b.rule, b.related)));

    for violation in &outcome.violations {
        debug!(
            rule = %violation.rule,
            at = %violation.at,
            "sequencing violation"
        );
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_ids_are_kebab_case() {
        let ids: Vec<&str> = SequencingRule::all().map(|r| r.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "concurrent-index-must-be-isolated",
                "validation-must-be-deferred",
                "validate-before-create",
                "set-not-null-requires-validated-check",
            ]
        );
        assert_eq!(
            "validate-before-create".parse::<SequencingRule>(),
            Ok(SequencingRule::ValidateBeforeCreate)
        );
    }

    #[test]
    fn test_every_rule_explained() {
        for rule in SequencingRule::all() {
            assert!(rule.explain().starts_with(rule.as_str()));
            assert!(!rule.description().is_empty());
        }
    }
}
