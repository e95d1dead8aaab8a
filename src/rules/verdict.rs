use std::fmt;

use serde::Serialize;

use crate::locks::{Blocking, LockMode};
use crate::rules::RuleId;

/// Classification of one operation. Ordered so that `max()` is the worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Safety {
    Safe,
    ConditionallySafe,
    Unsafe,
}

impl Safety {
    /// Parse from config string. Case-insensitive; accepts `-` or `_`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "safe" => Some(Self::Safe),
            "conditionally_safe" => Some(Self::ConditionallySafe),
            "unsafe" => Some(Self::Unsafe),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "SAFE",
            Self::ConditionallySafe => "CONDITIONALLY_SAFE",
            Self::Unsafe => "UNSAFE",
        }
    }
}

impl fmt::Display for Safety {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The safer alternative a verdict points at. Names the strategy only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationStrategy {
    /// Break the change into separately deployed steps.
    SplitIntoPhases,
    /// Create the constraint unvalidated, validate in a later unit.
    DisableValidationThenValidateSeparately,
    /// Build or drop the index concurrently.
    UseConcurrentIndex,
    /// Add the column without a default, then set the default separately.
    AddThenSetDefaultSeparately,
    /// Deploy application code that stops depending on the old shape first.
    ApplicationCodeFirst,
    /// Use `jsonb` instead of `json`.
    UseJsonB,
    /// Issue the default change as its own default-only statement.
    IsolateDefaultChange,
    /// Run the unit outside the wrapping DDL transaction.
    DisableDdlTransaction,
    None,
}

impl RemediationStrategy {
    /// One-line instruction for human-facing output.
    pub fn instruction(&self) -> Option<&'static str> {
        let text = match self {
            Self::SplitIntoPhases => {
                "split the change into phases deployed as separate migrations"
            }
            Self::DisableValidationThenValidateSeparately => {
                "create the constraint with validation disabled, then validate it in a later migration"
            }
            Self::UseConcurrentIndex => "build or drop the index concurrently",
            Self::AddThenSetDefaultSeparately => {
                "add the column without a default, then set the default in a separate step"
            }
            Self::ApplicationCodeFirst => {
                "deploy application code that no longer depends on the old schema first"
            }
            Self::UseJsonB => "use jsonb instead of json",
            Self::IsolateDefaultChange => {
                "issue the default change as a separate default-only statement"
            }
            Self::DisableDdlTransaction => {
                "disable the DDL transaction for this migration and keep the operation alone in it"
            }
            Self::None => return None,
        };
        Some(text)
    }
}

/// Result of classifying one operation against one engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub rule: RuleId,
    pub status: Safety,
    /// Strongest PostgreSQL lock taken. `None` on engines without lock modes.
    pub lock_mode: Option<LockMode>,
    pub blocking: Blocking,
    pub rationale: String,
    pub remediation: RemediationStrategy,
}

impl Verdict {
    /// Replace status, rationale and remediation, keeping lock information.
    /// Used when batch-wide context changes the classification.
    #[must_use]
    pub fn refined(
        &self,
        status: Safety,
        rationale: impl Into<String>,
        remediation: RemediationStrategy,
    ) -> Self {
        Self {
            status,
            rationale: rationale.into(),
            remediation,
            ..self.clone()
        }
    }

    pub fn is_unsafe(&self) -> bool {
        self.status == Safety::Unsafe
    }
}
