//! Migration plan loading
//!
//! Supports TOML and JSON plan files. A plan lists migration units in
//! applied order, each with its operations in `OperationSpec` shape:
//!
//! ```toml
//! [[units]]
//! name = "20240101_add_index"
//! disable_ddl_transaction = true
//!
//! [[units.operations]]
//! kind = "create_index"
//! table = "orders"
//! column = "status"
//! concurrently = true
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::model::{InvalidOperation, MigrationBatch, MigrationUnit, Operation, OperationSpec};

/// Trait for plan loaders. Each input format implements this.
pub trait PlanLoader {
    /// Load one batch from the given files, concatenated in argument order.
    fn load(&self, paths: &[PathBuf]) -> Result<MigrationBatch, LoadError>;
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Unsupported plan file {path}: expected .toml or .json")]
    UnsupportedFormat { path: PathBuf },

    #[error("Invalid operation in {path}, unit '{unit}', operation {index}: {source}")]
    InvalidOperation {
        path: PathBuf,
        unit: String,
        /// One-based position within the unit.
        index: usize,
        #[source]
        source: InvalidOperation,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlanFile {
    #[serde(default)]
    units: Vec<UnitSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UnitSpec {
    name: String,
    #[serde(default)]
    disable_ddl_transaction: bool,
    #[serde(default)]
    disable_migration_lock: bool,
    #[serde(default)]
    operations: Vec<OperationSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlanFormat {
    Toml,
    Json,
}

impl PlanFormat {
    fn for_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Loads `.toml` and `.json` plan files from disk.
#[derive(Debug, Default)]
pub struct FilePlanLoader;

impl FilePlanLoader {
    pub fn new() -> Self {
        Self
    }

    /// Parse plan text already read from `path`.
    pub fn parse_str(&self, path: &Path, contents: &str) -> Result<Vec<MigrationUnit>, LoadError> {
        let format = PlanFormat::for_path(path).ok_or_else(|| LoadError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;

        let plan: PlanFile = match format {
            PlanFormat::Toml => toml::from_str(contents).map_err(|e| LoadError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?,
            PlanFormat::Json => serde_json::from_str(contents).map_err(|e| LoadError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?,
        };

        plan.units
            .into_iter()
            .map(|unit| build_unit(path, unit))
            .collect()
    }
}

fn build_unit(path: &Path, spec: UnitSpec) -> Result<MigrationUnit, LoadError> {
    let operations = spec
        .operations
        .into_iter()
        .enumerate()
        .map(|(i, op)| {
            Operation::try_from(op).map_err(|source| LoadError::InvalidOperation {
                path: path.to_path_buf(),
                unit: spec.name.clone(),
                index: i + 1,
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut unit = MigrationUnit::new(spec.name, operations);
    if spec.disable_ddl_transaction {
        unit = unit.without_ddl_transaction();
    }
    if spec.disable_migration_lock {
        unit = unit.without_migration_lock();
    }
    Ok(unit)
}

impl PlanLoader for FilePlanLoader {
    fn load(&self, paths: &[PathBuf]) -> Result<MigrationBatch, LoadError> {
        let mut units = Vec::new();
        for path in paths {
            let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            })?;
            let loaded = self.parse_str(path, &contents)?;
            debug!(path = %path.display(), units = loaded.len(), "loaded plan file");
            units.extend(loaded);
        }
        Ok(MigrationBatch::new(units))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OperationKind;

    fn parse(name: &str, contents: &str) -> Result<Vec<MigrationUnit>, LoadError> {
        FilePlanLoader::new().parse_str(Path::new(name), contents)
    }

    #[test]
    fn test_toml_plan() {
        let units = parse(
            "plan.toml",
            r#"
            [[units]]
            name = "001_index"
            disable_ddl_transaction = true

            [[units.operations]]
            kind = "create_index"
            table = "orders"
            column = "status"
            concurrently = true
            "#,
        )
        .unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].name(), "001_index");
        assert!(units[0].disable_ddl_transaction());
        assert!(!units[0].disable_migration_lock());
        assert_eq!(units[0].operations()[0].kind(), OperationKind::CreateIndex);
    }

    #[test]
    fn test_json_plan() {
        let units = parse(
            "plan.json",
            r#"{"units": [{"name": "001", "operations": [
                {"kind": "rename_table", "table": "users", "new_name": "accounts"}
            ]}]}"#,
        )
        .unwrap();
        assert_eq!(units[0].operations()[0].kind(), OperationKind::RenameTable);
    }

    #[test]
    fn test_invalid_operation_carries_position() {
        let err = parse(
            "plan.toml",
            r#"
            [[units]]
            name = "001"

            [[units.operations]]
            kind = "add_column"
            table = "users"
            column = "approved"
            column_type = "boolean"

            [[units.operations]]
            kind = "add_column"
            table = "users"
            column = "status"
            column_type = "text"
            concurrently = true
            "#,
        )
        .unwrap_err();
        let LoadError::InvalidOperation { unit, index, .. } = &err else {
            panic!("expected InvalidOperation, got {err:?}");
        };
        assert_eq!(unit, "001");
        assert_eq!(*index, 2);
        assert!(err.to_string().contains("concurrently"));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = parse("plan.yaml", "").unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = parse("broken.toml", "[[units]]\nname = ").unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }
}
