//! Expression layer for query evaluation.
//!
//! This module provides:
//! - The closed `Expression` tree (literals, field references, resolved calls)
//! - The evaluation `Environment` binding field names to values
//! - Per-tuple evaluation with argument widening
//! - Operator to function-name mapping and plan-time type checks
//! - A small `dsl` for building expressions in code and tests

pub mod dsl;
pub mod env;
pub mod error;
pub mod eval;
pub mod expr;
pub mod operator;
pub mod type_checker;

pub use env::Environment;
pub use error::{ErrorKind, ExpressionError, ExpressionResult};
pub use expr::{Expression, FunctionExpression, FunctionImpl, NamedExpression, ReferenceExpression};
pub use operator::{BinaryOperator, UnaryOperator};
pub use type_checker::{check_predicate, check_references};
