//! Expression evaluation implementation.

use crate::data::{ExprValue, Tuple};
use crate::expression::{Environment, Expression, ExpressionError, ExpressionResult, FunctionExpression};
use log::trace;

/// Evaluator for expressions against one environment
pub struct ExpressionEvaluator<'a> {
    env: &'a Environment<'a>,
}

impl<'a> ExpressionEvaluator<'a> {
    pub fn new(env: &'a Environment<'a>) -> Self {
        Self { env }
    }

    /// Evaluate an expression and return the result
    pub fn evaluate(&self, expr: &Expression) -> ExpressionResult<ExprValue> {
        match expr {
            Expression::Literal(value) => Ok(value.clone()),
            Expression::Reference(reference) => Ok(self.env.resolve(&reference.name)),
            Expression::Function(function) => self.evaluate_function(function),
        }
    }

    /// Evaluate the arguments, widen them to the resolved signature and
    /// hand them to the function body.
    fn evaluate_function(&self, function: &FunctionExpression) -> ExpressionResult<ExprValue> {
        let params = &function.signature.param_types;
        if params.len() != function.args.len() {
            return Err(ExpressionError::evaluation(format!(
                "function {} expects {} arguments but got {}",
                function.name(),
                params.len(),
                function.args.len()
            )));
        }
        let values = function
            .args
            .iter()
            .zip(params)
            .map(|(arg, ty)| self.evaluate(arg)?.cast_to(*ty))
            .collect::<ExpressionResult<Vec<_>>>()?;
        let result = function.apply(&values)?;
        trace!("{}({:?}) = {:?}", function.name(), values, result);
        Ok(result)
    }

    /// Evaluate a filter condition; only a TRUE result keeps the row
    pub fn evaluate_predicate(&self, expr: &Expression) -> ExpressionResult<bool> {
        match self.evaluate(expr)? {
            ExprValue::Boolean(b) => Ok(b),
            ExprValue::Null | ExprValue::Missing => Ok(false),
            other => Err(ExpressionError::evaluation(format!(
                "filter condition {} evaluated to non-boolean {}",
                expr, other
            ))),
        }
    }
}

impl Expression {
    /// Evaluate this expression in `env`
    pub fn value_of(&self, env: &Environment<'_>) -> ExpressionResult<ExprValue> {
        ExpressionEvaluator::new(env).evaluate(self)
    }
}

/// Evaluate an expression against a single tuple
pub fn evaluate_expression(expr: &Expression, tuple: &Tuple) -> ExpressionResult<ExprValue> {
    expr.value_of(&Environment::new(tuple))
}
