//! Builders for expression trees.
//!
//! Function and operator builders resolve through a repository, so a tree
//! built here is always bound to concrete signatures.

use crate::data::{ExprType, ExprValue};
use crate::expression::{
    BinaryOperator, Expression, ExpressionResult, NamedExpression, UnaryOperator,
};
use crate::function::{Aggregator, BuiltinFunctionRepository, NamedAggregator};

pub fn literal(value: impl Into<ExprValue>) -> Expression {
    Expression::literal(value)
}

/// Untyped NULL literal
pub fn null() -> Expression {
    Expression::Literal(ExprValue::Null)
}

/// DATE literal, validated now
pub fn date(text: &str) -> ExpressionResult<Expression> {
    ExprValue::date(text).map(Expression::Literal)
}

/// TIME literal, validated now
pub fn time(text: &str) -> ExpressionResult<Expression> {
    ExprValue::time(text).map(Expression::Literal)
}

/// DATETIME literal, validated now
pub fn datetime(text: &str) -> ExpressionResult<Expression> {
    ExprValue::datetime(text).map(Expression::Literal)
}

/// TIMESTAMP literal, validated now
pub fn timestamp(text: &str) -> ExpressionResult<Expression> {
    ExprValue::timestamp(text).map(Expression::Literal)
}

pub fn reference(name: impl Into<String>, expr_type: ExprType) -> Expression {
    Expression::reference(name, expr_type)
}

pub fn named(name: impl Into<String>, expr: Expression) -> NamedExpression {
    NamedExpression::new(name, expr)
}

/// Resolve and bind a function call
pub fn function(
    repo: &BuiltinFunctionRepository,
    name: &str,
    args: Vec<Expression>,
) -> ExpressionResult<Expression> {
    repo.compile(name, args)
}

pub fn binary(
    repo: &BuiltinFunctionRepository,
    op: BinaryOperator,
    left: Expression,
    right: Expression,
) -> ExpressionResult<Expression> {
    repo.compile(op.function_name(), vec![left, right])
}

pub fn unary(
    repo: &BuiltinFunctionRepository,
    op: UnaryOperator,
    operand: Expression,
) -> ExpressionResult<Expression> {
    repo.compile(op.function_name(), vec![operand])
}

/// Resolve an aggregation function over one argument
pub fn aggregate(
    repo: &BuiltinFunctionRepository,
    name: &str,
    arg: Expression,
) -> ExpressionResult<Aggregator> {
    repo.compile_aggregator(name, arg)
}

pub fn named_aggregate(
    repo: &BuiltinFunctionRepository,
    output: impl Into<String>,
    name: &str,
    arg: Expression,
) -> ExpressionResult<NamedAggregator> {
    Ok(NamedAggregator::new(output, aggregate(repo, name, arg)?))
}
