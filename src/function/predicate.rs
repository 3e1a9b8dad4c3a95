//! Comparison, LIKE and boolean logic.
//!
//! `and`, `or` and `xor` evaluate their own truth tables: MISSING on either
//! side wins, then NULL follows SQL three-valued logic. `is null` and
//! `is not null` inspect NULL and MISSING directly. Everything else goes
//! through the null-missing guard.

use crate::data::{ExprType, ExprValue};
use crate::expression::{ExpressionError, ExpressionResult};
use crate::function::{FunctionResolver, RepositoryBuilder};
use crate::utils::WildcardMatcher;
use std::cmp::Ordering;

pub fn register(repo: &mut RepositoryBuilder) {
    repo.register(comparison("=", |ord| ord == Ordering::Equal));
    repo.register(comparison("!=", |ord| ord != Ordering::Equal));
    repo.register(comparison("<", |ord| ord == Ordering::Less));
    repo.register(comparison("<=", |ord| ord != Ordering::Greater));
    repo.register(comparison(">", |ord| ord == Ordering::Greater));
    repo.register(comparison(">=", |ord| ord != Ordering::Less));

    let matcher = WildcardMatcher::new();
    repo.register(FunctionResolver::new("like").scalar(
        &[ExprType::String, ExprType::String],
        ExprType::Boolean,
        move |args| {
            let text = args[0].string_value()?;
            let pattern = args[1].string_value()?;
            Ok(ExprValue::Boolean(matcher.matches(pattern, text)?))
        },
    ));

    repo.register(logical("and", and));
    repo.register(logical("or", or));
    repo.register(logical("xor", xor));
    repo.register(FunctionResolver::new("not").scalar(
        &[ExprType::Boolean],
        ExprType::Boolean,
        |args| Ok(ExprValue::Boolean(!args[0].boolean_value()?)),
    ));

    repo.register(null_test("is null", true));
    repo.register(null_test("is not null", false));
}

fn comparison(name: &str, test: fn(Ordering) -> bool) -> FunctionResolver {
    ExprType::SCALARS
        .into_iter()
        .fold(FunctionResolver::new(name), |resolver, ty| {
            resolver.scalar(&[ty, ty], ExprType::Boolean, move |args| {
                Ok(ExprValue::Boolean(test(args[0].compare(&args[1])?)))
            })
        })
}

fn logical(
    name: &str,
    table: fn(Option<bool>, Option<bool>) -> Option<bool>,
) -> FunctionResolver {
    FunctionResolver::new(name).unguarded(
        &[ExprType::Boolean, ExprType::Boolean],
        ExprType::Boolean,
        move |args| {
            if args.iter().any(ExprValue::is_missing) {
                return Ok(ExprValue::Missing);
            }
            let left = truth(&args[0])?;
            let right = truth(&args[1])?;
            Ok(table(left, right).map_or(ExprValue::Null, ExprValue::Boolean))
        },
    )
}

/// NULL becomes `None`
fn truth(value: &ExprValue) -> ExpressionResult<Option<bool>> {
    match value {
        ExprValue::Null => Ok(None),
        ExprValue::Boolean(b) => Ok(Some(*b)),
        other => Err(ExpressionError::evaluation(format!(
            "expected BOOLEAN operand but got {}",
            other.expr_type()
        ))),
    }
}

fn and(left: Option<bool>, right: Option<bool>) -> Option<bool> {
    match (left, right) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }
}

fn or(left: Option<bool>, right: Option<bool>) -> Option<bool> {
    match (left, right) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    }
}

fn xor(left: Option<bool>, right: Option<bool>) -> Option<bool> {
    Some(left? != right?)
}

fn null_test(name: &str, want_null: bool) -> FunctionResolver {
    ExprType::SCALARS
        .into_iter()
        .chain([ExprType::Struct, ExprType::Array])
        .fold(FunctionResolver::new(name), |resolver, ty| {
            resolver.unguarded(&[ty], ExprType::Boolean, move |args| {
                Ok(ExprValue::Boolean(args[0].is_null_or_missing() == want_null))
            })
        })
}
