//! Operation model
//!
//! Normalized representation of schema-change operations, the migration units
//! and batches that group them, and the engine context they are analyzed
//! against. Everything here is immutable once constructed.

use thiserror::Error;

pub mod engine;
pub mod migration;
pub mod operation;
pub mod spec;
pub mod types;

pub use engine::{Engine, EngineKind, Version, VersionParseError};
pub use migration::{MigrationBatch, MigrationUnit, OperationRef};
pub use operation::{Operation, OperationKind};
pub use spec::OperationSpec;
pub use types::{DefaultExpr, TypeName};

/// Malformed or contradictory operation input.
///
/// Raised at construction time; a batch containing such an operation cannot
/// be built, so the analyzer never sees one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidOperation {
    #[error("operation kind is missing")]
    MissingKind,

    #[error("{kind}: missing required field '{field}'")]
    MissingField {
        kind: OperationKind,
        field: &'static str,
    },

    #[error("{kind}: field '{field}' does not apply to this operation")]
    UnexpectedField {
        kind: OperationKind,
        field: &'static str,
    },

    #[error("{kind}: invalid type '{value}' for field '{field}'")]
    InvalidType {
        kind: OperationKind,
        field: &'static str,
        value: String,
    },

    #[error("{kind}: {reason}")]
    Contradiction {
        kind: OperationKind,
        reason: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = InvalidOperation::UnexpectedField {
            kind: OperationKind::AddColumn,
            field: "concurrently",
        };
        assert_eq!(
            err.to_string(),
            "AddColumn: field 'concurrently' does not apply to this operation"
        );
    }
}
