//! Plan-time checks run before any tuple is evaluated.

use crate::data::{ColumnInfo, ExprType};
use crate::expression::{Expression, ExpressionError, ExpressionResult};

/// Verify every field reference in `expr` is bound by `schema`.
///
/// A qualified name such as `address.city` is accepted when its head names a
/// STRUCT column. A reference whose declared type disagrees with the schema
/// is rejected.
pub fn check_references(expr: &Expression, schema: &[ColumnInfo]) -> ExpressionResult<()> {
    for reference in expr.references() {
        match schema.iter().find(|column| column.name == reference.name) {
            Some(column) => {
                if column.expr_type != reference.expr_type {
                    return Err(ExpressionError::semantic(format!(
                        "field {} is declared as {} but referenced as {}",
                        reference.name, column.expr_type, reference.expr_type
                    )));
                }
            }
            None => {
                let nested = reference.name.split_once('.').is_some_and(|(head, _)| {
                    schema
                        .iter()
                        .any(|column| column.name == head && column.expr_type == ExprType::Struct)
                });
                if !nested {
                    return Err(ExpressionError::UnknownField(reference.name.clone()));
                }
            }
        }
    }
    Ok(())
}

/// Verify `expr` can serve as a filter condition
pub fn check_predicate(expr: &Expression) -> ExpressionResult<()> {
    match expr.expr_type() {
        ExprType::Boolean | ExprType::Null | ExprType::Undefined => Ok(()),
        other => Err(ExpressionError::semantic(format!(
            "filter condition {} must be BOOLEAN but is {}",
            expr, other
        ))),
    }
}
