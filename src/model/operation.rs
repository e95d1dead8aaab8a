//! Normalized schema-change operations.
//!
//! Each [`Operation`] variant wraps a payload struct carrying only the fields
//! the safety rules need. Payloads are `#[non_exhaustive]`: outside this crate
//! they can be read and matched but only built through the validating
//! constructors on [`Operation`] (or `TryFrom<OperationSpec>`).

use std::fmt;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, IntoStaticStr};

use super::InvalidOperation;
use super::types::{DefaultExpr, TypeName};

/// Discriminant of [`Operation`], used for rule dispatch and lock lookup.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter,
    IntoStaticStr,
    Display,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    AddColumn,
    AddColumnWithDefault,
    AddJsonColumn,
    AlterColumnType,
    AlterColumnDefault,
    RemoveColumn,
    RenameColumn,
    RenameTable,
    CreateIndex,
    RemoveIndex,
    AddForeignKey,
    ValidateForeignKey,
    AddCheckConstraint,
    ValidateCheckConstraint,
    SetNotNull,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct AddColumn {
    pub table: String,
    pub column: String,
    pub column_type: TypeName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct AddColumnWithDefault {
    pub table: String,
    pub column: String,
    pub column_type: TypeName,
    pub default: DefaultExpr,
    /// Declared volatile by the adapter. See [`AddColumnWithDefault::is_volatile`].
    pub volatile_default: bool,
}

impl AddColumnWithDefault {
    /// Volatile if declared so, or if the default calls a known volatile function.
    pub fn is_volatile(&self) -> bool {
        self.volatile_default || self.default.is_known_volatile()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct AddJsonColumn {
    pub table: String,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct AlterColumnType {
    pub table: String,
    pub column: String,
    pub from_type: TypeName,
    pub to_type: TypeName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct AlterColumnDefault {
    pub table: String,
    pub column: String,
    /// `None` drops the default.
    pub default: Option<DefaultExpr>,
    /// The default change is issued in the same statement as a type change.
    pub with_type_change: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct RemoveColumn {
    pub table: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct RenameColumn {
    pub table: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct RenameTable {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct CreateIndex {
    pub table: String,
    pub name: Option<String>,
    pub columns: Vec<String>,
    pub unique: bool,
    pub concurrently: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct RemoveIndex {
    pub table: String,
    pub name: String,
    pub concurrently: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct AddForeignKey {
    pub table: String,
    pub columns: Vec<String>,
    pub references: String,
    pub name: Option<String>,
    pub validate: bool,
}

/// PostgreSQL identifiers are limited to `NAMEDATALEN - 1` bytes.
const MAX_IDENTIFIER_BYTES: usize = 63;

fn clip_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    let mut end = max_bytes.min(s.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Generated `<name1>_<name2>_<label>` constraint name. When it would exceed
/// the identifier limit, the longer of the two names is shortened one byte
/// at a time so the label always survives.
fn generated_constraint_name(name1: &str, name2: &str, label: &str) -> String {
    let available = MAX_IDENTIFIER_BYTES.saturating_sub(label.len() + 2);
    let (mut len1, mut len2) = (name1.len(), name2.len());
    while len1 + len2 > available {
        if len1 > len2 {
            len1 -= 1;
        } else {
            len2 -= 1;
        }
    }
    format!(
        "{}_{}_{}",
        clip_to_char_boundary(name1, len1),
        clip_to_char_boundary(name2, len2),
        label
    )
}

impl AddForeignKey {
    /// Constraint name, defaulting to PostgreSQL's `<table>_<cols>_fkey`
    /// shortened to fit the 63-byte identifier limit.
    pub fn effective_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => generated_constraint_name(&self.table, &self.columns.join("_"), "fkey"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ValidateForeignKey {
    pub table: String,
    pub name: Option<String>,
    pub references: Option<String>,
}

impl ValidateForeignKey {
    /// Whether this validation targets the given foreign key creation.
    ///
    /// Matches by constraint name when one is given, otherwise by the
    /// referenced table.
    pub fn targets(&self, fk: &AddForeignKey) -> bool {
        if !self.table.eq_ignore_ascii_case(&fk.table) {
            return false;
        }
        match (&self.name, &self.references) {
            (Some(name), _) => name.eq_ignore_ascii_case(&fk.effective_name()),
            (None, Some(references)) => references.eq_ignore_ascii_case(&fk.references),
            (None, None) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct AddCheckConstraint {
    pub table: String,
    pub name: String,
    pub expression: String,
    pub validate: bool,
}

impl AddCheckConstraint {
    /// If the expression is exactly `<column> IS NOT NULL`, return the column.
    pub fn not_null_column(&self) -> Option<String> {
        let mut expr = self.expression.trim();
        while let Some(inner) = expr.strip_prefix('(').and_then(|e| e.strip_suffix(')')) {
            expr = inner.trim();
        }

        const SUFFIX: &str = " is not null";
        let lower = expr.to_lowercase();
        let column = lower.strip_suffix(SUFFIX)?.trim();
        let column = column
            .strip_prefix('"')
            .and_then(|c| c.strip_suffix('"'))
            .unwrap_or(column);

        let is_ident = !column.is_empty()
            && column
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
        is_ident.then(|| column.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ValidateCheckConstraint {
    pub table: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct SetNotNull {
    pub table: String,
    pub column: String,
    /// `false` when the column is made NOT NULL via the constraint-first
    /// phased approach rather than a direct validating scan.
    pub validate: bool,
}

/// A single normalized schema-change operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    AddColumn(AddColumn),
    AddColumnWithDefault(AddColumnWithDefault),
    AddJsonColumn(AddJsonColumn),
    AlterColumnType(AlterColumnType),
    AlterColumnDefault(AlterColumnDefault),
    RemoveColumn(RemoveColumn),
    RenameColumn(RenameColumn),
    RenameTable(RenameTable),
    CreateIndex(CreateIndex),
    RemoveIndex(RemoveIndex),
    AddForeignKey(AddForeignKey),
    ValidateForeignKey(ValidateForeignKey),
    AddCheckConstraint(AddCheckConstraint),
    ValidateCheckConstraint(ValidateCheckConstraint),
    SetNotNull(SetNotNull),
}

/// Trim a required name field, rejecting empty values.
fn required(
    kind: OperationKind,
    field: &'static str,
    value: impl Into<String>,
) -> Result<String, InvalidOperation> {
    let value = value.into().trim().to_string();
    if value.is_empty() {
        Err(InvalidOperation::MissingField { kind, field })
    } else {
        Ok(value)
    }
}

fn optional(value: Option<impl Into<String>>) -> Option<String> {
    value
        .map(|v| v.into().trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required_list<I, S>(
    kind: OperationKind,
    field: &'static str,
    values: I,
) -> Result<Vec<String>, InvalidOperation>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let values = values
        .into_iter()
        .map(|v| required(kind, field, v))
        .collect::<Result<Vec<_>, _>>()?;
    if values.is_empty() {
        return Err(InvalidOperation::MissingField { kind, field });
    }
    Ok(values)
}

fn parse_type(
    kind: OperationKind,
    field: &'static str,
    value: &str,
) -> Result<TypeName, InvalidOperation> {
    if value.trim().is_empty() {
        return Err(InvalidOperation::MissingField { kind, field });
    }
    TypeName::parse(value).ok_or_else(|| InvalidOperation::InvalidType {
        kind,
        field,
        value: value.to_string(),
    })
}

impl Operation {
    pub fn add_column(
        table: impl Into<String>,
        column: impl Into<String>,
        column_type: &str,
    ) -> Result<Self, InvalidOperation> {
        let kind = OperationKind::AddColumn;
        let column_type = parse_type(kind, "column_type", column_type)?;
        Ok(Self::AddColumn(AddColumn {
            table: required(kind, "table", table)?,
            column: required(kind, "column", column)?,
            column_type,
        }))
    }

    pub fn add_column_with_default(
        table: impl Into<String>,
        column: impl Into<String>,
        column_type: &str,
        default: &str,
        volatile_default: bool,
    ) -> Result<Self, InvalidOperation> {
        let kind = OperationKind::AddColumnWithDefault;
        let column_type = parse_type(kind, "column_type", column_type)?;
        let default = required(kind, "default", default)?;
        Ok(Self::AddColumnWithDefault(AddColumnWithDefault {
            table: required(kind, "table", table)?,
            column: required(kind, "column", column)?,
            column_type,
            default: DefaultExpr::parse(&default),
            volatile_default,
        }))
    }

    pub fn add_json_column(
        table: impl Into<String>,
        column: impl Into<String>,
    ) -> Result<Self, InvalidOperation> {
        let kind = OperationKind::AddJsonColumn;
        Ok(Self::AddJsonColumn(AddJsonColumn {
            table: required(kind, "table", table)?,
            column: required(kind, "column", column)?,
        }))
    }

    pub fn alter_column_type(
        table: impl Into<String>,
        column: impl Into<String>,
        from_type: &str,
        to_type: &str,
    ) -> Result<Self, InvalidOperation> {
        let kind = OperationKind::AlterColumnType;
        let from_type = parse_type(kind, "from_type", from_type)?;
        let to_type = parse_type(kind, "to_type", to_type)?;
        Ok(Self::AlterColumnType(AlterColumnType {
            table: required(kind, "table", table)?,
            column: required(kind, "column", column)?,
            from_type,
            to_type,
        }))
    }

    pub fn alter_column_default(
        table: impl Into<String>,
        column: impl Into<String>,
        default: Option<&str>,
        with_type_change: bool,
    ) -> Result<Self, InvalidOperation> {
        let kind = OperationKind::AlterColumnDefault;
        Ok(Self::AlterColumnDefault(AlterColumnDefault {
            table: required(kind, "table", table)?,
            column: required(kind, "column", column)?,
            default: optional(default).map(|d| DefaultExpr::parse(&d)),
            with_type_change,
        }))
    }

    pub fn remove_column<I, S>(table: impl Into<String>, columns: I) -> Result<Self, InvalidOperation>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let kind = OperationKind::RemoveColumn;
        Ok(Self::RemoveColumn(RemoveColumn {
            table: required(kind, "table", table)?,
            columns: required_list(kind, "columns", columns)?,
        }))
    }

    pub fn rename_column(
        table: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Result<Self, InvalidOperation> {
        let kind = OperationKind::RenameColumn;
        let from = required(kind, "column", from)?;
        let to = required(kind, "new_name", to)?;
        if from == to {
            return Err(InvalidOperation::Contradiction {
                kind,
                reason: "new name is identical to the current name",
            });
        }
        Ok(Self::RenameColumn(RenameColumn {
            table: required(kind, "table", table)?,
            from,
            to,
        }))
    }

    pub fn rename_table(
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Result<Self, InvalidOperation> {
        let kind = OperationKind::RenameTable;
        let from = required(kind, "table", from)?;
        let to = required(kind, "new_name", to)?;
        if from == to {
            return Err(InvalidOperation::Contradiction {
                kind,
                reason: "new name is identical to the current name",
            });
        }
        Ok(Self::RenameTable(RenameTable { from, to }))
    }

    pub fn create_index<I, S>(
        table: impl Into<String>,
        name: Option<&str>,
        columns: I,
        unique: bool,
        concurrently: bool,
    ) -> Result<Self, InvalidOperation>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let kind = OperationKind::CreateIndex;
        Ok(Self::CreateIndex(CreateIndex {
            table: required(kind, "table", table)?,
            name: optional(name),
            columns: required_list(kind, "columns", columns)?,
            unique,
            concurrently,
        }))
    }

    pub fn remove_index(
        table: impl Into<String>,
        name: impl Into<String>,
        concurrently: bool,
    ) -> Result<Self, InvalidOperation> {
        let kind = OperationKind::RemoveIndex;
        Ok(Self::RemoveIndex(RemoveIndex {
            table: required(kind, "table", table)?,
            name: required(kind, "name", name)?,
            concurrently,
        }))
    }

    pub fn add_foreign_key<I, S>(
        table: impl Into<String>,
        columns: I,
        references: impl Into<String>,
        name: Option<&str>,
        validate: bool,
    ) -> Result<Self, InvalidOperation>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let kind = OperationKind::AddForeignKey;
        Ok(Self::AddForeignKey(AddForeignKey {
            table: required(kind, "table", table)?,
            columns: required_list(kind, "columns", columns)?,
            references: required(kind, "references", references)?,
            name: optional(name),
            validate,
        }))
    }

    pub fn validate_foreign_key(
        table: impl Into<String>,
        name: Option<&str>,
        references: Option<&str>,
    ) -> Result<Self, InvalidOperation> {
        let kind = OperationKind::ValidateForeignKey;
        let name = optional(name);
        let references = optional(references);
        if name.is_none() && references.is_none() {
            return Err(InvalidOperation::MissingField {
                kind,
                field: "name",
            });
        }
        Ok(Self::ValidateForeignKey(ValidateForeignKey {
            table: required(kind, "table", table)?,
            name,
            references,
        }))
    }

    pub fn add_check_constraint(
        table: impl Into<String>,
        name: impl Into<String>,
        expression: impl Into<String>,
        validate: bool,
    ) -> Result<Self, InvalidOperation> {
        let kind = OperationKind::AddCheckConstraint;
        Ok(Self::AddCheckConstraint(AddCheckConstraint {
            table: required(kind, "table", table)?,
            name: required(kind, "name", name)?,
            expression: required(kind, "expression", expression)?,
            validate,
        }))
    }

    pub fn validate_check_constraint(
        table: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, InvalidOperation> {
        let kind = OperationKind::ValidateCheckConstraint;
        Ok(Self::ValidateCheckConstraint(ValidateCheckConstraint {
            table: required(kind, "table", table)?,
            name: required(kind, "name", name)?,
        }))
    }

    pub fn set_not_null(
        table: impl Into<String>,
        column: impl Into<String>,
        validate: bool,
    ) -> Result<Self, InvalidOperation> {
        let kind = OperationKind::SetNotNull;
        Ok(Self::SetNotNull(SetNotNull {
            table: required(kind, "table", table)?,
            column: required(kind, "column", column)?,
            validate,
        }))
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Self::AddColumn(_) => OperationKind::AddColumn,
            Self::AddColumnWithDefault(_) => OperationKind::AddColumnWithDefault,
            Self::AddJsonColumn(_) => OperationKind::AddJsonColumn,
            Self::AlterColumnType(_) => OperationKind::AlterColumnType,
            Self::AlterColumnDefault(_) => OperationKind::AlterColumnDefault,
            Self::RemoveColumn(_) => OperationKind::RemoveColumn,
            Self::RenameColumn(_) => OperationKind::RenameColumn,
            Self::RenameTable(_) => OperationKind::RenameTable,
            Self::CreateIndex(_) => OperationKind::CreateIndex,
            Self::RemoveIndex(_) => OperationKind::RemoveIndex,
            Self::AddForeignKey(_) => OperationKind::AddForeignKey,
            Self::ValidateForeignKey(_) => OperationKind::ValidateForeignKey,
            Self::AddCheckConstraint(_) => OperationKind::AddCheckConstraint,
            Self::ValidateCheckConstraint(_) => OperationKind::ValidateCheckConstraint,
            Self::SetNotNull(_) => OperationKind::SetNotNull,
        }
    }

    /// The table the operation acts on (the current name for renames).
    pub fn table(&self) -> &str {
        match self {
            Self::AddColumn(op) => &op.table,
            Self::AddColumnWithDefault(op) => &op.table,
            Self::AddJsonColumn(op) => &op.table,
            Self::AlterColumnType(op) => &op.table,
            Self::AlterColumnDefault(op) => &op.table,
            Self::RemoveColumn(op) => &op.table,
            Self::RenameColumn(op) => &op.table,
            Self::RenameTable(op) => &op.from,
            Self::CreateIndex(op) => &op.table,
            Self::RemoveIndex(op) => &op.table,
            Self::AddForeignKey(op) => &op.table,
            Self::ValidateForeignKey(op) => &op.table,
            Self::AddCheckConstraint(op) => &op.table,
            Self::ValidateCheckConstraint(op) => &op.table,
            Self::SetNotNull(op) => &op.table,
        }
    }

    /// Whether this is an index build or drop that runs `CONCURRENTLY`.
    pub fn is_concurrent_index(&self) -> bool {
        match self {
            Self::CreateIndex(op) => op.concurrently,
            Self::RemoveIndex(op) => op.concurrently,
            _ => false,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddColumn(op) => {
                write!(f, "add column {}.{} {}", op.table, op.column, op.column_type)
            }
            Self::AddColumnWithDefault(op) => write!(
                f,
                "add column {}.{} {} default {}",
                op.table, op.column, op.column_type, op.default
            ),
            Self::AddJsonColumn(op) => write!(f, "add column {}.{} json", op.table, op.column),
            Self::AlterColumnType(op) => write!(
                f,
                "alter column {}.{} type {} -> {}",
                op.table, op.column, op.from_type, op.to_type
            ),
            Self::AlterColumnDefault(op) => match &op.default {
                Some(default) => write!(
                    f,
                    "alter column {}.{} set default {}",
                    op.table, op.column, default
                ),
                None => write!(f, "alter column {}.{} drop default", op.table, op.column),
            },
            Self::RemoveColumn(op) => {
                write!(f, "remove column {}.{}", op.table, op.columns.join(", "))
            }
            Self::RenameColumn(op) => {
                write!(f, "rename column {}.{} to {}", op.table, op.from, op.to)
            }
            Self::RenameTable(op) => write!(f, "rename table {} to {}", op.from, op.to),
            Self::CreateIndex(op) => {
                f.write_str("create ")?;
                if op.unique {
                    f.write_str("unique ")?;
                }
                f.write_str("index ")?;
                if op.concurrently {
                    f.write_str("concurrently ")?;
                }
                if let Some(name) = &op.name {
                    write!(f, "{name} ")?;
                }
                write!(f, "on {} ({})", op.table, op.columns.join(", "))
            }
            Self::RemoveIndex(op) => {
                f.write_str("remove index ")?;
                if op.concurrently {
                    f.write_str("concurrently ")?;
                }
                write!(f, "{} on {}", op.name, op.table)
            }
            Self::AddForeignKey(op) => {
                write!(
                    f,
                    "add foreign key {} on {} ({}) references {}",
                    op.effective_name(),
                    op.table,
                    op.columns.join(", "),
                    op.references
                )?;
                if !op.validate {
                    f.write_str(" not valid")?;
                }
                Ok(())
            }
            Self::ValidateForeignKey(op) => match (&op.name, &op.references) {
                (Some(name), _) => write!(f, "validate foreign key {} on {}", name, op.table),
                (None, Some(references)) => write!(
                    f,
                    "validate foreign key on {} references {}",
                    op.table, references
                ),
                (None, None) => write!(f, "validate foreign key on {}", op.table),
            },
            Self::AddCheckConstraint(op) => {
                write!(
                    f,
                    "add check constraint {} on {} ({})",
                    op.name, op.table, op.expression
                )?;
                if !op.validate {
                    f.write_str(" not valid")?;
                }
                Ok(())
            }
            Self::ValidateCheckConstraint(op) => {
                write!(f, "validate check constraint {} on {}", op.name, op.table)
            }
            Self::SetNotNull(op) => {
                write!(f, "set not null on {}.{}", op.table, op.column)
            }
        }
    }
}
