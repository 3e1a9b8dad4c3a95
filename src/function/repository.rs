use crate::data::ExprType;
use crate::expression::{Expression, ExpressionError, ExpressionResult, FunctionExpression};
use crate::function::{
    aggregate, arithmetic, datetime, math, predicate, text, Aggregator, FunctionBuilder,
    FunctionName, FunctionResolver, FunctionSignature,
};
use log::debug;
use std::collections::HashMap;

/// Accumulates resolvers before the repository is frozen
#[derive(Debug, Default)]
pub struct RepositoryBuilder {
    resolvers: HashMap<FunctionName, FunctionResolver>,
}

impl RepositoryBuilder {
    /// Add a resolver, merging with any earlier one of the same name
    pub fn register(&mut self, resolver: FunctionResolver) -> &mut Self {
        let name = resolver.name().clone();
        let merged = match self.resolvers.remove(&name) {
            Some(existing) => existing.merge(resolver),
            None => resolver,
        };
        self.resolvers.insert(name, merged);
        self
    }

    /// Register every built-in library
    pub fn with_builtins(mut self) -> Self {
        arithmetic::register(&mut self);
        predicate::register(&mut self);
        math::register(&mut self);
        datetime::register(&mut self);
        text::register(&mut self);
        aggregate::register(&mut self);
        self
    }

    pub fn build(self) -> BuiltinFunctionRepository {
        debug!("function repository built with {} functions", self.resolvers.len());
        BuiltinFunctionRepository {
            resolvers: self.resolvers,
        }
    }
}

/// Immutable mapping from function name to its overloads
#[derive(Debug)]
pub struct BuiltinFunctionRepository {
    resolvers: HashMap<FunctionName, FunctionResolver>,
}

impl Default for BuiltinFunctionRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinFunctionRepository {
    /// Repository holding every built-in function
    pub fn new() -> Self {
        RepositoryBuilder::default().with_builtins().build()
    }

    pub fn builder() -> RepositoryBuilder {
        RepositoryBuilder::default()
    }

    pub fn resolver(&self, name: &str) -> ExpressionResult<&FunctionResolver> {
        self.resolvers
            .get(&FunctionName::of(name))
            .ok_or_else(|| ExpressionError::UnknownFunction(name.to_string()))
    }

    pub fn resolvers(&self) -> impl Iterator<Item = &FunctionResolver> {
        self.resolvers.values()
    }

    /// Resolve a call site to exactly one registered signature
    pub fn resolve(
        &self,
        name: &str,
        arg_types: &[ExprType],
    ) -> ExpressionResult<(FunctionSignature, &FunctionBuilder)> {
        self.resolver(name)?.resolve(arg_types)
    }

    /// Resolve and bind a scalar function call
    pub fn compile(&self, name: &str, args: Vec<Expression>) -> ExpressionResult<Expression> {
        let arg_types: Vec<ExprType> = args.iter().map(Expression::expr_type).collect();
        let (signature, builder) = self.resolve(name, &arg_types)?;
        match builder {
            FunctionBuilder::Scalar { return_type, body } => Ok(Expression::Function(
                FunctionExpression::new(signature, *return_type, args, body.clone()),
            )),
            FunctionBuilder::Aggregate { .. } => Err(ExpressionError::semantic(format!(
                "aggregation function {} is only allowed in an aggregation",
                signature.name
            ))),
        }
    }

    /// Resolve and bind an aggregation over one argument
    pub fn compile_aggregator(&self, name: &str, arg: Expression) -> ExpressionResult<Aggregator> {
        let (signature, builder) = self.resolve(name, &[arg.expr_type()])?;
        match builder {
            FunctionBuilder::Aggregate { return_type, kind } => {
                Ok(Aggregator::new(signature, *kind, *return_type, arg))
            }
            FunctionBuilder::Scalar { .. } => Err(ExpressionError::semantic(format!(
                "{} is not an aggregation function",
                signature.name
            ))),
        }
    }
}
