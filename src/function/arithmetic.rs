//! Arithmetic operators over INTEGER, LONG, FLOAT and DOUBLE.
//!
//! Each operator has one `(T, T) -> T` overload per numeric type, so mixed
//! operands resolve to the wider type. Division or modulo by zero is NULL.

use crate::data::{ExprType, ExprValue};
use crate::expression::{ExpressionError, ExpressionResult};
use crate::function::{FunctionResolver, RepositoryBuilder};

pub fn register(repo: &mut RepositoryBuilder) {
    repo.register(binary("+", add));
    repo.register(binary("-", subtract));
    repo.register(binary("*", multiply));
    repo.register(binary("/", divide));
    repo.register(binary("%", modulo));
    repo.register(binary("mod", modulo));
    repo.register(
        ExprType::NUMBERS
            .into_iter()
            .fold(FunctionResolver::new("-"), |resolver, ty| {
                resolver.scalar(&[ty], ty, |args| negate(&args[0]))
            }),
    );
}

fn binary(
    name: &str,
    op: fn(&ExprValue, &ExprValue) -> ExpressionResult<ExprValue>,
) -> FunctionResolver {
    ExprType::NUMBERS
        .into_iter()
        .fold(FunctionResolver::new(name), |resolver, ty| {
            resolver.scalar(&[ty, ty], ty, move |args| op(&args[0], &args[1]))
        })
}

fn mismatch(op: &str, left: &ExprValue, right: &ExprValue) -> ExpressionError {
    ExpressionError::evaluation(format!(
        "unexpected operands for {}: {} and {}",
        op,
        left.expr_type(),
        right.expr_type()
    ))
}

fn add(left: &ExprValue, right: &ExprValue) -> ExpressionResult<ExprValue> {
    match (left, right) {
        (ExprValue::Integer(a), ExprValue::Integer(b)) => Ok(ExprValue::Integer(a.wrapping_add(*b))),
        (ExprValue::Long(a), ExprValue::Long(b)) => Ok(ExprValue::Long(a.wrapping_add(*b))),
        (ExprValue::Float(a), ExprValue::Float(b)) => Ok(ExprValue::Float(a + b)),
        (ExprValue::Double(a), ExprValue::Double(b)) => Ok(ExprValue::Double(a + b)),
        _ => Err(mismatch("+", left, right)),
    }
}

fn subtract(left: &ExprValue, right: &ExprValue) -> ExpressionResult<ExprValue> {
    match (left, right) {
        (ExprValue::Integer(a), ExprValue::Integer(b)) => Ok(ExprValue::Integer(a.wrapping_sub(*b))),
        (ExprValue::Long(a), ExprValue::Long(b)) => Ok(ExprValue::Long(a.wrapping_sub(*b))),
        (ExprValue::Float(a), ExprValue::Float(b)) => Ok(ExprValue::Float(a - b)),
        (ExprValue::Double(a), ExprValue::Double(b)) => Ok(ExprValue::Double(a - b)),
        _ => Err(mismatch("-", left, right)),
    }
}

fn multiply(left: &ExprValue, right: &ExprValue) -> ExpressionResult<ExprValue> {
    match (left, right) {
        (ExprValue::Integer(a), ExprValue::Integer(b)) => Ok(ExprValue::Integer(a.wrapping_mul(*b))),
        (ExprValue::Long(a), ExprValue::Long(b)) => Ok(ExprValue::Long(a.wrapping_mul(*b))),
        (ExprValue::Float(a), ExprValue::Float(b)) => Ok(ExprValue::Float(a * b)),
        (ExprValue::Double(a), ExprValue::Double(b)) => Ok(ExprValue::Double(a * b)),
        _ => Err(mismatch("*", left, right)),
    }
}

fn divide(left: &ExprValue, right: &ExprValue) -> ExpressionResult<ExprValue> {
    match (left, right) {
        (ExprValue::Integer(a), ExprValue::Integer(b)) => Ok(match a.checked_div(*b) {
            Some(v) => ExprValue::Integer(v),
            None if *b == 0 => ExprValue::Null,
            None => ExprValue::Integer(a.wrapping_div(*b)),
        }),
        (ExprValue::Long(a), ExprValue::Long(b)) => Ok(match a.checked_div(*b) {
            Some(v) => ExprValue::Long(v),
            None if *b == 0 => ExprValue::Null,
            None => ExprValue::Long(a.wrapping_div(*b)),
        }),
        (ExprValue::Float(a), ExprValue::Float(b)) => Ok(if *b == 0.0 {
            ExprValue::Null
        } else {
            ExprValue::Float(a / b)
        }),
        (ExprValue::Double(a), ExprValue::Double(b)) => Ok(if *b == 0.0 {
            ExprValue::Null
        } else {
            ExprValue::Double(a / b)
        }),
        _ => Err(mismatch("/", left, right)),
    }
}

fn modulo(left: &ExprValue, right: &ExprValue) -> ExpressionResult<ExprValue> {
    match (left, right) {
        (ExprValue::Integer(a), ExprValue::Integer(b)) => Ok(if *b == 0 {
            ExprValue::Null
        } else {
            ExprValue::Integer(a.wrapping_rem(*b))
        }),
        (ExprValue::Long(a), ExprValue::Long(b)) => Ok(if *b == 0 {
            ExprValue::Null
        } else {
            ExprValue::Long(a.wrapping_rem(*b))
        }),
        (ExprValue::Float(a), ExprValue::Float(b)) => Ok(if *b == 0.0 {
            ExprValue::Null
        } else {
            ExprValue::Float(a % b)
        }),
        (ExprValue::Double(a), ExprValue::Double(b)) => Ok(if *b == 0.0 {
            ExprValue::Null
        } else {
            ExprValue::Double(a % b)
        }),
        _ => Err(mismatch("%", left, right)),
    }
}

fn negate(value: &ExprValue) -> ExpressionResult<ExprValue> {
    match value {
        ExprValue::Integer(v) => Ok(ExprValue::Integer(v.wrapping_neg())),
        ExprValue::Long(v) => Ok(ExprValue::Long(v.wrapping_neg())),
        ExprValue::Float(v) => Ok(ExprValue::Float(-v)),
        ExprValue::Double(v) => Ok(ExprValue::Double(-v)),
        other => Err(ExpressionError::evaluation(format!(
            "unexpected operand for -: {}",
            other.expr_type()
        ))),
    }
}
