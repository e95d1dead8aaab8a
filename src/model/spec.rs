//! Adapter-facing operation shape.
//!
//! Input adapters deserialize a flat [`OperationSpec`] (every field optional)
//! and convert it with `Operation::try_from`, which applies the same
//! validation as the typed constructors and additionally rejects fields that
//! have no meaning for the operation kind.

use serde::Deserialize;

use super::InvalidOperation;
use super::operation::{Operation, OperationKind};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperationSpec {
    pub kind: Option<OperationKind>,
    pub table: Option<String>,
    pub column: Option<String>,
    pub columns: Option<Vec<String>>,
    pub name: Option<String>,
    pub new_name: Option<String>,
    pub column_type: Option<String>,
    pub from_type: Option<String>,
    pub to_type: Option<String>,
    pub default: Option<String>,
    pub expression: Option<String>,
    pub references: Option<String>,
    pub concurrently: Option<bool>,
    pub validate: Option<bool>,
    pub volatile_default: Option<bool>,
    pub unique: Option<bool>,
    pub with_type_change: Option<bool>,
}

/// Fields each kind accepts besides `kind` and `table`.
fn allowed_fields(kind: OperationKind) -> &'static [&'static str] {
    use OperationKind::*;
    match kind {
        AddColumn => &["column", "column_type"],
        AddColumnWithDefault => &["column", "column_type", "default", "volatile_default"],
        AddJsonColumn => &["column"],
        AlterColumnType => &["column", "from_type", "to_type"],
        AlterColumnDefault => &["column", "default", "with_type_change"],
        RemoveColumn => &["column", "columns"],
        RenameColumn => &["column", "new_name"],
        RenameTable => &["new_name"],
        CreateIndex => &["name", "column", "columns", "unique", "concurrently"],
        RemoveIndex => &["name", "concurrently"],
        AddForeignKey => &["name", "column", "columns", "references", "validate"],
        ValidateForeignKey => &["name", "references"],
        AddCheckConstraint => &["name", "expression", "validate"],
        ValidateCheckConstraint => &["name"],
        SetNotNull => &["column", "validate"],
    }
}

impl OperationSpec {
    fn present_fields(&self) -> Vec<&'static str> {
        let fields: [(&'static str, bool); 15] = [
            ("column", self.column.is_some()),
            ("columns", self.columns.is_some()),
            ("name", self.name.is_some()),
            ("new_name", self.new_name.is_some()),
            ("column_type", self.column_type.is_some()),
            ("from_type", self.from_type.is_some()),
            ("to_type", self.to_type.is_some()),
            ("default", self.default.is_some()),
            ("expression", self.expression.is_some()),
            ("references", self.references.is_some()),
            ("concurrently", self.concurrently.is_some()),
            ("validate", self.validate.is_some()),
            ("volatile_default", self.volatile_default.is_some()),
            ("unique", self.unique.is_some()),
            ("with_type_change", self.with_type_change.is_some()),
        ];
        fields
            .into_iter()
            .filter_map(|(field, present)| present.then_some(field))
            .collect()
    }

    /// Column list from either `columns` or the single `column` shorthand.
    fn column_list(&self, kind: OperationKind) -> Result<Vec<String>, InvalidOperation> {
        match (&self.column, &self.columns) {
            (Some(_), Some(_)) => Err(InvalidOperation::Contradiction {
                kind,
                reason: "both 'column' and 'columns' given",
            }),
            (Some(column), None) => Ok(vec![column.clone()]),
            (None, Some(columns)) => Ok(columns.clone()),
            (None, None) => Err(InvalidOperation::MissingField {
                kind,
                field: "columns",
            }),
        }
    }
}

fn take(
    kind: OperationKind,
    field: &'static str,
    value: &Option<String>,
) -> Result<String, InvalidOperation> {
    value
        .clone()
        .ok_or(InvalidOperation::MissingField { kind, field })
}

impl TryFrom<OperationSpec> for Operation {
    type Error = InvalidOperation;

    fn try_from(spec: OperationSpec) -> Result<Self, Self::Error> {
        let kind = spec.kind.ok_or(InvalidOperation::MissingKind)?;

        let allowed = allowed_fields(kind);
        if let Some(field) = spec
            .present_fields()
            .into_iter()
            .find(|field| !allowed.contains(field))
        {
            return Err(InvalidOperation::UnexpectedField { kind, field });
        }

        let table = take(kind, "table", &spec.table)?;
        let column = || take(kind, "column", &spec.column);

        match kind {
            OperationKind::AddColumn => Operation::add_column(
                table,
                column()?,
                &take(kind, "column_type", &spec.column_type)?,
            ),
            OperationKind::AddColumnWithDefault => Operation::add_column_with_default(
                table,
                column()?,
                &take(kind, "column_type", &spec.column_type)?,
                &take(kind, "default", &spec.default)?,
                spec.volatile_default.unwrap_or(false),
            ),
            OperationKind::AddJsonColumn => Operation::add_json_column(table, column()?),
            OperationKind::AlterColumnType => Operation::alter_column_type(
                table,
                column()?,
                &take(kind, "from_type", &spec.from_type)?,
                &take(kind, "to_type", &spec.to_type)?,
            ),
            OperationKind::AlterColumnDefault => Operation::alter_column_default(
                table,
                column()?,
                spec.default.as_deref(),
                spec.with_type_change.unwrap_or(false),
            ),
            OperationKind::RemoveColumn => {
                Operation::remove_column(table, spec.column_list(kind)?)
            }
            OperationKind::RenameColumn => Operation::rename_column(
                table,
                column()?,
                take(kind, "new_name", &spec.new_name)?,
            ),
            OperationKind::RenameTable => {
                Operation::rename_table(table, take(kind, "new_name", &spec.new_name)?)
            }
            OperationKind::CreateIndex => Operation::create_index(
                table,
                spec.name.as_deref(),
                spec.column_list(kind)?,
                spec.unique.unwrap_or(false),
                spec.concurrently.unwrap_or(false),
            ),
            OperationKind::RemoveIndex => Operation::remove_index(
                table,
                take(kind, "name", &spec.name)?,
                spec.concurrently.unwrap_or(false),
            ),
            OperationKind::AddForeignKey => Operation::add_foreign_key(
                table,
                spec.column_list(kind)?,
                take(kind, "references", &spec.references)?,
                spec.name.as_deref(),
                spec.validate.unwrap_or(true),
            ),
            OperationKind::ValidateForeignKey => Operation::validate_foreign_key(
                table,
                spec.name.as_deref(),
                spec.references.as_deref(),
            ),
            OperationKind::AddCheckConstraint => Operation::add_check_constraint(
                table,
                take(kind, "name", &spec.name)?,
                take(kind, "expression", &spec.expression)?,
                spec.validate.unwrap_or(true),
            ),
            OperationKind::ValidateCheckConstraint => {
                Operation::validate_check_constraint(table, take(kind, "name", &spec.name)?)
            }
            OperationKind::SetNotNull => Operation::set_not_null(
                table,
                column()?,
                spec.validate.unwrap_or(true),
            ),
        }
    }
}
