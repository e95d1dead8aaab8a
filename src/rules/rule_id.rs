use serde::Serialize;
use strum_macros::{EnumIter, EnumString, IntoStaticStr};

use crate::model::{Operation, OperationKind};
use crate::rules::{Rule, RuleContext, SafetyRule, Verdict};

/// Strongly-typed rule identifier, one per operation kind.
///
/// Match statements are exhaustive: adding an operation kind forces a new
/// rule family here and everywhere a rule ID is dispatched on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, EnumString, IntoStaticStr,
)]
pub enum RuleId {
    /// Index build.
    #[strum(serialize = "MG001")]
    Mg001,
    /// Index drop.
    #[strum(serialize = "MG002")]
    Mg002,
    /// Column added without a default.
    #[strum(serialize = "MG003")]
    Mg003,
    /// Column added with a default.
    #[strum(serialize = "MG004")]
    Mg004,
    /// `json` column added.
    #[strum(serialize = "MG005")]
    Mg005,
    /// Column type change.
    #[strum(serialize = "MG006")]
    Mg006,
    /// Column default change.
    #[strum(serialize = "MG007")]
    Mg007,
    /// Column removal.
    #[strum(serialize = "MG008")]
    Mg008,
    /// Column rename.
    #[strum(serialize = "MG009")]
    Mg009,
    /// Table rename.
    #[strum(serialize = "MG010")]
    Mg010,
    /// Foreign key creation.
    #[strum(serialize = "MG011")]
    Mg011,
    /// Foreign key validation.
    #[strum(serialize = "MG012")]
    Mg012,
    /// Check constraint creation.
    #[strum(serialize = "MG013")]
    Mg013,
    /// Check constraint validation.
    #[strum(serialize = "MG014")]
    Mg014,
    /// `SET NOT NULL`.
    #[strum(serialize = "MG015")]
    Mg015,
}

impl RuleId {
    /// Zero-allocation string representation.
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// The rule family that classifies an operation kind.
    pub fn for_kind(kind: OperationKind) -> Self {
        match kind {
            OperationKind::CreateIndex => Self::Mg001,
            OperationKind::RemoveIndex => Self::Mg002,
            OperationKind::AddColumn => Self::Mg003,
            OperationKind::AddColumnWithDefault => Self::Mg004,
            OperationKind::AddJsonColumn => Self::Mg005,
            OperationKind::AlterColumnType => Self::Mg006,
            OperationKind::AlterColumnDefault => Self::Mg007,
            OperationKind::RemoveColumn => Self::Mg008,
            OperationKind::RenameColumn => Self::Mg009,
            OperationKind::RenameTable => Self::Mg010,
            OperationKind::AddForeignKey => Self::Mg011,
            OperationKind::ValidateForeignKey => Self::Mg012,
            OperationKind::AddCheckConstraint => Self::Mg013,
            OperationKind::ValidateCheckConstraint => Self::Mg014,
            OperationKind::SetNotNull => Self::Mg015,
        }
    }

    /// Ordered rule table for this family. Always ends in a catch-all.
    pub(crate) fn table(&self) -> &'static [SafetyRule] {
        match self {
            Self::Mg001 => super::mg001::RULES,
            Self::Mg002 => super::mg002::RULES,
            Self::Mg003 => super::mg003::RULES,
            Self::Mg004 => super::mg004::RULES,
            Self::Mg005 => super::mg005::RULES,
            Self::Mg006 => super::mg006::RULES,
            Self::Mg007 => super::mg007::RULES,
            Self::Mg008 => super::mg008::RULES,
            Self::Mg009 => super::mg009::RULES,
            Self::Mg010 => super::mg010::RULES,
            Self::Mg011 => super::mg011::RULES,
            Self::Mg012 => super::mg012::RULES,
            Self::Mg013 => super::mg013::RULES,
            Self::Mg014 => super::mg014::RULES,
            Self::Mg015 => super::mg015::RULES,
        }
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RuleId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for RuleId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s: String = serde::Deserialize::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// `FromStr` is derived via `EnumString`; `Err` type is `strum::ParseError`.

impl Rule for RuleId {
    fn id(&self) -> Self {
        *self
    }

    fn description(&self) -> &'static str {
        match self {
            Self::Mg001 => super::mg001::DESCRIPTION,
            Self::Mg002 => super::mg002::DESCRIPTION,
            Self::Mg003 => super::mg003::DESCRIPTION,
            Self::Mg004 => super::mg004::DESCRIPTION,
            Self::Mg005 => super::mg005::DESCRIPTION,
            Self::Mg006 => super::mg006::DESCRIPTION,
            Self::Mg007 => super::mg007::DESCRIPTION,
            Self::Mg008 => super::mg008::DESCRIPTION,
            Self::Mg009 => super::mg009::DESCRIPTION,
            Self::Mg010 => super::mg010::DESCRIPTION,
            Self::Mg011 => super::mg011::DESCRIPTION,
            Self::Mg012 => super::mg012::DESCRIPTION,
            Self::Mg013 => super::mg013::DESCRIPTION,
            Self::Mg014 => super::mg014::DESCRIPTION,
            Self::Mg015 => super::mg015::DESCRIPTION,
        }
    }

    fn explain(&self) -> &'static str {
        match self {
            Self::Mg001 => super::mg001::EXPLAIN,
            Self::Mg002 => super::mg002::EXPLAIN,
            Self::Mg003 => super::mg003::EXPLAIN,
            Self::Mg004 => super::mg004::EXPLAIN,
            Self::Mg005 => super::mg005::EXPLAIN,
            Self::Mg006 => super::mg006::EXPLAIN,
            Self::Mg007 => super::mg007::EXPLAIN,
            Self::Mg008 => super::mg008::EXPLAIN,
            Self::Mg009 => super::mg009::EXPLAIN,
            Self::Mg010 => super::mg010::EXPLAIN,
            Self::Mg011 => super::mg011::EXPLAIN,
            Self::Mg012 => super::mg012::EXPLAIN,
            Self::Mg013 => super::mg013::EXPLAIN,
            Self::Mg014 => super::mg014::EXPLAIN,
            Self::Mg015 => super::mg015::EXPLAIN,
        }
    }

    fn classify(&self, operation: &Operation, ctx: &RuleContext<'_>) -> Verdict {
        super::evaluate(*self, operation, ctx)
    }
}
