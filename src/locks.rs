//! Lock knowledge base
//!
//! Static lock-conflict matrix for PostgreSQL table-level lock modes and the
//! locks each operation kind acquires per engine. MySQL and MariaDB only
//! document whether an online DDL operation permits concurrent DML, so they
//! use a two-state blocking model instead of lock modes.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use strum_macros::{EnumIter, IntoStaticStr};

use crate::model::{Engine, EngineKind, Operation, OperationKind};

/// PostgreSQL table-level lock modes, ordered by exclusivity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, IntoStaticStr, Serialize,
)]
pub enum LockMode {
    #[strum(serialize = "ACCESS SHARE")]
    AccessShare,
    #[strum(serialize = "ROW SHARE")]
    RowShare,
    #[strum(serialize = "ROW EXCLUSIVE")]
    RowExclusive,
    #[strum(serialize = "SHARE UPDATE EXCLUSIVE")]
    ShareUpdateExclusive,
    #[strum(serialize = "SHARE")]
    Share,
    #[strum(serialize = "SHARE ROW EXCLUSIVE")]
    ShareRowExclusive,
    #[strum(serialize = "EXCLUSIVE")]
    Exclusive,
    #[strum(serialize = "ACCESS EXCLUSIVE")]
    AccessExclusive,
}

/// Conflict bitmasks, one row per mode in enum order. Bit `n` set in row `m`
/// means mode `m` conflicts with mode `n`. Reproduces the table in the
/// PostgreSQL "Explicit Locking" documentation.
const CONFLICTS: [u8; 8] = [
    0b1000_0000, // ACCESS SHARE
    0b1100_0000, // ROW SHARE
    0b1111_0000, // ROW EXCLUSIVE
    0b1111_1000, // SHARE UPDATE EXCLUSIVE
    0b1110_1100, // SHARE
    0b1111_1100, // SHARE ROW EXCLUSIVE
    0b1111_1110, // EXCLUSIVE
    0b1111_1111, // ACCESS EXCLUSIVE
];

impl LockMode {
    fn bit(self) -> u8 {
        1 << (self as u8)
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Plain `SELECT` takes ACCESS SHARE.
    pub fn blocks_reads(self) -> bool {
        conflicts(self, LockMode::AccessShare)
    }

    /// `INSERT`/`UPDATE`/`DELETE` take ROW EXCLUSIVE.
    pub fn blocks_writes(self) -> bool {
        conflicts(self, LockMode::RowExclusive)
    }
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether two lock modes conflict. Symmetric.
pub fn conflicts(a: LockMode, b: LockMode) -> bool {
    CONFLICTS[a as usize] & b.bit() != 0
}

/// Whether an operation blocks concurrent application traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Blocking {
    Blocking,
    NonBlocking,
    Unknown,
}

/// Locks an operation acquires on the target engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockRequirement {
    /// PostgreSQL lock modes taken across the tables involved.
    Modes(BTreeSet<LockMode>),
    /// MySQL/MariaDB online DDL behavior.
    Online(Blocking),
    /// No lock knowledge for this engine.
    Unknown,
}

impl LockRequirement {
    fn modes(modes: &[LockMode]) -> Self {
        Self::Modes(modes.iter().copied().collect())
    }

    /// The most exclusive mode held, if the engine uses lock modes.
    pub fn strongest(&self) -> Option<LockMode> {
        match self {
            Self::Modes(modes) => modes.iter().next_back().copied(),
            Self::Online(_) | Self::Unknown => None,
        }
    }

    /// Collapse into the two-state model: any mode that conflicts with
    /// ordinary writes counts as blocking.
    pub fn blocking(&self) -> Blocking {
        match self {
            Self::Modes(modes) => {
                if modes.iter().any(|m| m.blocks_writes()) {
                    Blocking::Blocking
                } else {
                    Blocking::NonBlocking
                }
            }
            Self::Online(blocking) => *blocking,
            Self::Unknown => Blocking::Unknown,
        }
    }
}

fn postgres_locks(kind: OperationKind) -> &'static [LockMode] {
    use LockMode::*;
    use OperationKind as K;
    match kind {
        K::AddColumn
        | K::AddColumnWithDefault
        | K::AddJsonColumn
        | K::AlterColumnType
        | K::AlterColumnDefault
        | K::RemoveColumn
        | K::RenameColumn
        | K::RenameTable
        | K::RemoveIndex
        | K::AddCheckConstraint
        | K::SetNotNull => &[AccessExclusive],
        K::CreateIndex => &[Share],
        // SHARE ROW EXCLUSIVE on both the referencing and referenced table.
        K::AddForeignKey => &[ShareRowExclusive],
        // ROW SHARE on the referenced table while rows are checked.
        K::ValidateForeignKey => &[RowShare, ShareUpdateExclusive],
        K::ValidateCheckConstraint => &[ShareUpdateExclusive],
    }
}

fn mysql_blocking(kind: OperationKind) -> Blocking {
    use OperationKind as K;
    match kind {
        K::AlterColumnType | K::AddForeignKey | K::AddCheckConstraint => Blocking::Blocking,
        K::AddColumn
        | K::AddColumnWithDefault
        | K::AddJsonColumn
        | K::AlterColumnDefault
        | K::RemoveColumn
        | K::RenameColumn
        | K::RenameTable
        | K::CreateIndex
        | K::RemoveIndex
        | K::ValidateForeignKey
        | K::ValidateCheckConstraint
        | K::SetNotNull => Blocking::NonBlocking,
    }
}

/// Locks acquired by an operation kind in its default (non-concurrent) form.
pub fn locks_required_by(kind: OperationKind, engine: &Engine) -> LockRequirement {
    match engine.kind() {
        EngineKind::Postgres => LockRequirement::modes(postgres_locks(kind)),
        EngineKind::MySql | EngineKind::MariaDb => LockRequirement::Online(mysql_blocking(kind)),
        EngineKind::Other(_) => LockRequirement::Unknown,
    }
}

/// Locks acquired by a concrete operation, accounting for `CONCURRENTLY`.
pub fn locks_for(operation: &Operation, engine: &Engine) -> LockRequirement {
    if operation.is_concurrent_index() && engine.is_postgres() {
        return LockRequirement::modes(&[LockMode::ShareUpdateExclusive]);
    }
    locks_required_by(operation.kind(), engine)
}
