//! Safety rule engine
//!
//! Each operation kind has a rule family (`mgNNN.rs`) holding an ordered
//! table of [`SafetyRule`] entries. Classification walks the table and takes
//! the first entry whose engine match and predicate both hold; every table
//! ends in a catch-all, so exactly one verdict is produced per operation.
//! Evaluation is stateless: a verdict depends only on the operation, the
//! engine and the flags of the containing unit.

use tracing::{debug, trace};

use crate::locks::{self, LockRequirement};
use crate::model::{Engine, Operation};

pub mod rule_context;
pub mod rule_id;
pub mod thresholds;
pub mod type_change;
pub mod verdict;

#[cfg(test)]
pub mod test_helpers;

mod mg001;
mod mg002;
mod mg003;
mod mg004;
mod mg005;
mod mg006;
mod mg007;
mod mg008;
mod mg009;
mod mg010;
mod mg011;
mod mg012;
mod mg013;
mod mg014;
mod mg015;

pub use rule_context::RuleContext;
pub use rule_id::RuleId;
pub use thresholds::{Feature, UnsupportedEngineVersion};
pub use verdict::{RemediationStrategy, Safety, Verdict};

/// A classification rule family.
pub trait Rule: Send + Sync {
    /// Stable rule identifier.
    fn id(&self) -> RuleId;

    /// Human-readable short description.
    fn description(&self) -> &'static str;

    /// Detailed explanation for --explain. Includes failure mode and fix.
    fn explain(&self) -> &'static str;

    /// Classify a single operation in the context of its unit.
    fn classify(&self, operation: &Operation, ctx: &RuleContext<'_>) -> Verdict;
}

/// Engines a rule entry applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMatch {
    Any,
    Postgres,
    MySqlFamily,
}

impl EngineMatch {
    pub fn matches(&self, engine: &Engine) -> bool {
        match self {
            Self::Any => true,
            Self::Postgres => engine.is_postgres(),
            Self::MySqlFamily => engine.kind().is_mysql_family(),
        }
    }
}

/// Flag/payload predicate of a rule entry. An `Err` means the predicate
/// needed a version threshold the engine has no documentation for.
pub type Predicate = fn(&Operation, &RuleContext<'_>) -> Result<bool, UnsupportedEngineVersion>;

/// Verdict produced when a rule entry matches.
#[derive(Debug, Clone, Copy)]
pub struct VerdictTemplate {
    pub status: Safety,
    pub rationale: &'static str,
    pub remediation: RemediationStrategy,
}

/// One row of a rule family table.
#[derive(Debug, Clone, Copy)]
pub struct SafetyRule {
    pub engines: EngineMatch,
    /// `None` matches unconditionally.
    pub when: Option<Predicate>,
    pub verdict: VerdictTemplate,
}

impl SafetyRule {
    pub fn is_catch_all(&self) -> bool {
        self.engines == EngineMatch::Any && self.when.is_none()
    }
}

/// Build a catch-all row.
pub(crate) const fn otherwise(
    status: Safety,
    rationale: &'static str,
    remediation: RemediationStrategy,
) -> SafetyRule {
    SafetyRule {
        engines: EngineMatch::Any,
        when: None,
        verdict: VerdictTemplate {
            status,
            rationale,
            remediation,
        },
    }
}

/// Build an unconditional row restricted to some engines.
pub(crate) const fn always(
    engines: EngineMatch,
    status: Safety,
    rationale: &'static str,
    remediation: RemediationStrategy,
) -> SafetyRule {
    SafetyRule {
        engines,
        when: None,
        verdict: VerdictTemplate {
            status,
            rationale,
            remediation,
        },
    }
}

/// Build a conditional row.
pub(crate) const fn when(
    engines: EngineMatch,
    predicate: Predicate,
    status: Safety,
    rationale: &'static str,
    remediation: RemediationStrategy,
) -> SafetyRule {
    SafetyRule {
        engines,
        when: Some(predicate),
        verdict: VerdictTemplate {
            status,
            rationale,
            remediation,
        },
    }
}

fn build_verdict(
    rule: RuleId,
    template: &VerdictTemplate,
    locks: &LockRequirement,
) -> Verdict {
    Verdict {
        rule,
        status: template.status,
        lock_mode: locks.strongest(),
        blocking: locks.blocking(),
        rationale: template.rationale.to_string(),
        remediation: template.remediation,
    }
}

fn unknown_engine_verdict(
    rule: RuleId,
    err: &UnsupportedEngineVersion,
    locks: &LockRequirement,
) -> Verdict {
    Verdict {
        rule,
        status: Safety::ConditionallySafe,
        lock_mode: locks.strongest(),
        blocking: locks.blocking(),
        rationale: format!("unknown engine behavior: {err}"),
        remediation: RemediationStrategy::None,
    }
}

/// Walk a family table for one operation.
fn evaluate(rule: RuleId, operation: &Operation, ctx: &RuleContext<'_>) -> Verdict {
    let locks = locks::locks_for(operation, ctx.engine);

    for (position, entry) in rule.table().iter().enumerate() {
        if !entry.engines.matches(ctx.engine) {
            continue;
        }
        let matched = match entry.when {
            None => Ok(true),
            Some(predicate) => predicate(operation, ctx),
        };
        match matched {
            Ok(true) => {
                trace!(rule = %rule, entry = position, "rule entry matched");
                return build_verdict(rule, &entry.verdict, &locks);
            }
            Ok(false) => {}
            Err(err) => {
                debug!(rule = %rule, error = %err, "no threshold for engine");
                return unknown_engine_verdict(rule, &err, &locks);
            }
        }
    }

    // Tables end in a catch-all; reaching here means a family table is broken.
    Verdict {
        rule,
        status: Safety::ConditionallySafe,
        lock_mode: locks.strongest(),
        blocking: locks.blocking(),
        rationale: "no rule entry matched this operation".to_string(),
        remediation: RemediationStrategy::None,
    }
}

/// Classify one operation. Pure and deterministic.
pub fn classify(operation: &Operation, ctx: &RuleContext<'_>) -> Verdict {
    let verdict = RuleId::for_kind(operation.kind()).classify(operation, ctx);
    debug!(
        rule = %verdict.rule,
        status = %verdict.status,
        operation = %operation,
        "operation classified"
    );
    verdict
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locks::{Blocking, LockMode};
    use crate::model::{EngineKind, Version};
    use crate::rules::test_helpers::{ctx, ctx_without_ddl_transaction};

    #[test]
    fn test_classify_dispatches_by_kind() {
        let engine = Engine::postgres(16);
        let op = Operation::add_column("users", "approved", "boolean").expect("valid");
        let verdict = classify(&op, &ctx(&engine));
        assert_eq!(verdict.rule, RuleId::Mg003);
        assert_eq!(verdict.status, Safety::Safe);
        assert_eq!(verdict.lock_mode, Some(LockMode::AccessExclusive));
    }

    #[test]
    fn test_unknown_engine_is_conditionally_safe_never_safe() {
        let engine = Engine::new(EngineKind::Other("cockroachdb".to_string()), Version::major(23));
        let op = Operation::add_column_with_default("users", "approved", "boolean", "false", false)
            .expect("valid");
        let verdict = classify(&op, &ctx(&engine));
        assert_eq!(verdict.status, Safety::ConditionallySafe);
        assert!(verdict.rationale.starts_with("unknown engine behavior"));
        assert_eq!(verdict.remediation, RemediationStrategy::None);
        assert_eq!(verdict.blocking, Blocking::Unknown);
        assert_eq!(verdict.lock_mode, None);
    }

    #[test]
    fn test_lock_information_attached() {
        let engine = Engine::postgres(16);
        let op = Operation::create_index("orders", None, ["status"], false, true).expect("valid");
        let verdict = classify(&op, &ctx_without_ddl_transaction(&engine));
        assert_eq!(verdict.lock_mode, Some(LockMode::ShareUpdateExclusive));
        assert_eq!(verdict.blocking, Blocking::NonBlocking);
    }

    #[test]
    fn test_engine_match() {
        assert!(EngineMatch::MySqlFamily.matches(&Engine::mariadb(10, 5, 0)));
        assert!(!EngineMatch::MySqlFamily.matches(&Engine::postgres(12)));
        assert!(EngineMatch::Postgres.matches(&Engine::postgres(12)));
        assert!(EngineMatch::Any.matches(&Engine::mysql(5, 7, 0)));
    }
}
