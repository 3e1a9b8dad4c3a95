//! Expression tree definitions.

use crate::data::{ExprType, ExprValue};
use crate::expression::operator::{BinaryOperator, UnaryOperator};
use crate::expression::ExpressionResult;
use crate::function::{FunctionName, FunctionSignature};
use std::fmt;
use std::sync::Arc;

/// Compiled body of a resolved function, called with already-widened arguments
pub type FunctionImpl = Arc<dyn Fn(&[ExprValue]) -> ExpressionResult<ExprValue> + Send + Sync>;

/// Field reference with the type the relation declares for it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferenceExpression {
    /// Field name, possibly qualified (`address.city`)
    pub name: String,
    pub expr_type: ExprType,
}

impl ReferenceExpression {
    pub fn new(name: impl Into<String>, expr_type: ExprType) -> Self {
        Self {
            name: name.into(),
            expr_type,
        }
    }
}

/// Function call bound to exactly one registered signature
#[derive(Clone)]
pub struct FunctionExpression {
    /// The signature the call resolved to
    pub signature: FunctionSignature,
    pub return_type: ExprType,
    pub args: Vec<Expression>,
    body: FunctionImpl,
}

impl FunctionExpression {
    pub fn new(
        signature: FunctionSignature,
        return_type: ExprType,
        args: Vec<Expression>,
        body: FunctionImpl,
    ) -> Self {
        Self {
            signature,
            return_type,
            args,
            body,
        }
    }

    pub fn name(&self) -> &FunctionName {
        &self.signature.name
    }

    /// Apply the body to argument values already converted to the signature
    pub fn apply(&self, args: &[ExprValue]) -> ExpressionResult<ExprValue> {
        (self.body)(args)
    }
}

impl fmt::Debug for FunctionExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionExpression")
            .field("signature", &self.signature)
            .field("return_type", &self.return_type)
            .field("args", &self.args)
            .finish()
    }
}

impl PartialEq for FunctionExpression {
    fn eq(&self, other: &Self) -> bool {
        self.signature == other.signature
            && self.return_type == other.return_type
            && self.args == other.args
    }
}

/// Expression tree node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Constant value
    Literal(ExprValue),

    /// Field of the current tuple
    Reference(ReferenceExpression),

    /// Resolved function or operator call
    Function(FunctionExpression),
}

impl Expression {
    pub fn literal(value: impl Into<ExprValue>) -> Self {
        Expression::Literal(value.into())
    }

    pub fn reference(name: impl Into<String>, expr_type: ExprType) -> Self {
        Expression::Reference(ReferenceExpression::new(name, expr_type))
    }

    /// Static type of the value this expression produces
    pub fn expr_type(&self) -> ExprType {
        match self {
            Expression::Literal(value) => value.expr_type(),
            Expression::Reference(reference) => reference.expr_type,
            Expression::Function(function) => function.return_type,
        }
    }

    /// Collect every field reference in this tree, left to right
    pub fn references(&self) -> Vec<&ReferenceExpression> {
        let mut found = Vec::new();
        self.collect_references(&mut found);
        found
    }

    fn collect_references<'a>(&'a self, found: &mut Vec<&'a ReferenceExpression>) {
        match self {
            Expression::Literal(_) => {}
            Expression::Reference(reference) => found.push(reference),
            Expression::Function(function) => {
                for arg in &function.args {
                    arg.collect_references(found);
                }
            }
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(value) => write!(f, "{}", value),
            Expression::Reference(reference) => write!(f, "{}", reference.name),
            Expression::Function(function) => {
                let name = function.name().as_str();
                match function.args.as_slice() {
                    [left, right] => {
                        if let Some(op) = BinaryOperator::from_function_name(name) {
                            return write!(f, "{} {} {}", left, op.function_name(), right);
                        }
                    }
                    [operand] => match UnaryOperator::from_function_name(name) {
                        Some(op) if op.is_postfix() => {
                            return write!(f, "{} {}", operand, op.function_name())
                        }
                        Some(UnaryOperator::Minus) => return write!(f, "-{}", operand),
                        Some(op) => return write!(f, "{} {}", op.function_name(), operand),
                        None => {}
                    },
                    _ => {}
                }
                write!(f, "{}(", name)?;
                for (i, arg) in function.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Expression with the output field name it is bound to
#[derive(Debug, Clone, PartialEq)]
pub struct NamedExpression {
    pub name: String,
    pub expr: Expression,
}

impl NamedExpression {
    pub fn new(name: impl Into<String>, expr: Expression) -> Self {
        Self {
            name: name.into(),
            expr,
        }
    }

    /// Name a bare expression after its own rendering
    pub fn unnamed(expr: Expression) -> Self {
        let name = match &expr {
            Expression::Reference(reference) => reference.name.clone(),
            other => other.to_string(),
        };
        Self { name, expr }
    }
}
