//! Engine-version thresholds for behavior the rules depend on.
//!
//! A row `(feature, engine, Some(v))` means the engine has the behavior from
//! version `v` on; `None` means the engine never has it. A missing row means
//! the behavior is undocumented for that engine, which the rule engine
//! reports as "unknown engine behavior" rather than guessing.

use serde::Serialize;
use strum_macros::{Display, EnumIter};
use thiserror::Error;

use crate::model::{Engine, EngineKind, Version};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display, Serialize)]
pub enum Feature {
    /// Non-volatile column defaults are stored in the catalog instead of
    /// rewriting every row.
    FastColumnDefault,
    /// Binary-coercible type changes (varchar widening, varchar to text,
    /// numeric precision increase) skip the table rewrite.
    BinaryCoercibleTypeChange,
    /// timestamp <-> timestamptz skips the rewrite when the session time zone is UTC.
    TimestampTimeZoneSwap,
    /// Extending a VARCHAR within the same length-byte bucket is in-place.
    InPlaceVarcharExtension,
    /// Index builds and drops permit concurrent DML without a special keyword.
    OnlineIndexBuild,
    /// SET NOT NULL skips the full-table scan when a validated
    /// `CHECK (col IS NOT NULL)` exists.
    NotNullFromValidatedCheck,
    /// The `json` type has no equality operator, breaking DISTINCT and
    /// UNION on tables that use it.
    JsonWithoutEquality,
}

const fn v(major: u32, minor: u32, patch: u32) -> Option<Version> {
    Some(Version::new(major, minor, patch))
}

static THRESHOLDS: &[(Feature, EngineKind, Option<Version>)] = &[
    (Feature::FastColumnDefault, EngineKind::Postgres, v(11, 0, 0)),
    (Feature::FastColumnDefault, EngineKind::MySql, v(8, 0, 12)),
    (Feature::FastColumnDefault, EngineKind::MariaDb, v(10, 3, 2)),
    (Feature::BinaryCoercibleTypeChange, EngineKind::Postgres, v(9, 2, 0)),
    (Feature::BinaryCoercibleTypeChange, EngineKind::MySql, None),
    (Feature::BinaryCoercibleTypeChange, EngineKind::MariaDb, None),
    (Feature::TimestampTimeZoneSwap, EngineKind::Postgres, v(12, 0, 0)),
    (Feature::TimestampTimeZoneSwap, EngineKind::MySql, None),
    (Feature::TimestampTimeZoneSwap, EngineKind::MariaDb, None),
    (Feature::InPlaceVarcharExtension, EngineKind::Postgres, None),
    (Feature::InPlaceVarcharExtension, EngineKind::MySql, v(5, 7, 0)),
    (Feature::InPlaceVarcharExtension, EngineKind::MariaDb, v(10, 2, 2)),
    (Feature::OnlineIndexBuild, EngineKind::Postgres, None),
    (Feature::OnlineIndexBuild, EngineKind::MySql, v(5, 6, 0)),
    (Feature::OnlineIndexBuild, EngineKind::MariaDb, v(10, 0, 0)),
    (Feature::NotNullFromValidatedCheck, EngineKind::Postgres, v(12, 0, 0)),
    (Feature::NotNullFromValidatedCheck, EngineKind::MySql, None),
    (Feature::NotNullFromValidatedCheck, EngineKind::MariaDb, None),
    (Feature::JsonWithoutEquality, EngineKind::Postgres, v(9, 2, 0)),
    (Feature::JsonWithoutEquality, EngineKind::MySql, None),
    (Feature::JsonWithoutEquality, EngineKind::MariaDb, None),
];

/// No version threshold is documented for a feature on the target engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no documented {feature} threshold for {engine}")]
pub struct UnsupportedEngineVersion {
    pub feature: Feature,
    pub engine: Engine,
}

/// Whether `engine` has `feature` at its version.
pub fn supports(feature: Feature, engine: &Engine) -> Result<bool, UnsupportedEngineVersion> {
    THRESHOLDS
        .iter()
        .find(|(f, kind, _)| *f == feature && kind == engine.kind())
        .map(|(_, _, since)| since.is_some_and(|since| engine.version() >= since))
        .ok_or_else(|| UnsupportedEngineVersion {
            feature,
            engine: engine.clone(),
        })
}
