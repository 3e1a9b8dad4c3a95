use crate::data::{ExprType, ExprValue};
use crate::expression::{ExpressionError, ExpressionResult, FunctionImpl};
use crate::function::guard::null_missing_handling;
use crate::function::{AggregationKind, FunctionName, FunctionSignature};
use indexmap::IndexMap;
use log::warn;
use std::fmt;
use std::sync::Arc;

/// What a resolved signature compiles into
#[derive(Clone)]
pub enum FunctionBuilder {
    /// Scalar body, already wrapped by the null-missing guard where required
    Scalar {
        return_type: ExprType,
        body: FunctionImpl,
    },
    /// Aggregation evaluated by the Aggregation operator
    Aggregate {
        return_type: ExprType,
        kind: AggregationKind,
    },
}

impl FunctionBuilder {
    pub fn return_type(&self) -> ExprType {
        match self {
            FunctionBuilder::Scalar { return_type, .. } => *return_type,
            FunctionBuilder::Aggregate { return_type, .. } => *return_type,
        }
    }
}

impl fmt::Debug for FunctionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionBuilder::Scalar { return_type, .. } => {
                write!(f, "Scalar -> {}", return_type)
            }
            FunctionBuilder::Aggregate { return_type, kind } => {
                write!(f, "Aggregate {:?} -> {}", kind, return_type)
            }
        }
    }
}

/// All overloads registered under one function name
#[derive(Debug, Clone)]
pub struct FunctionResolver {
    name: FunctionName,
    builders: IndexMap<Vec<ExprType>, FunctionBuilder>,
}

impl FunctionResolver {
    pub fn new(name: &str) -> Self {
        Self {
            name: FunctionName::of(name),
            builders: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &FunctionName {
        &self.name
    }

    /// Add one overload. A repeated parameter list replaces the earlier one.
    pub fn register(mut self, param_types: Vec<ExprType>, builder: FunctionBuilder) -> Self {
        if self.builders.contains_key(&param_types) {
            warn!(
                "signature {} registered twice, keeping the last one",
                FunctionSignature::new(self.name.clone(), param_types.clone())
            );
        }
        self.builders.insert(param_types, builder);
        self
    }

    /// Add a scalar overload wrapped by the null-missing guard
    pub fn scalar<F>(self, param_types: &[ExprType], return_type: ExprType, body: F) -> Self
    where
        F: Fn(&[ExprValue]) -> ExpressionResult<ExprValue> + Send + Sync + 'static,
    {
        let body = null_missing_handling(Arc::new(body));
        self.register(
            param_types.to_vec(),
            FunctionBuilder::Scalar { return_type, body },
        )
    }

    /// Add a scalar overload whose body sees NULL and MISSING itself
    pub fn unguarded<F>(self, param_types: &[ExprType], return_type: ExprType, body: F) -> Self
    where
        F: Fn(&[ExprValue]) -> ExpressionResult<ExprValue> + Send + Sync + 'static,
    {
        self.register(
            param_types.to_vec(),
            FunctionBuilder::Scalar {
                return_type,
                body: Arc::new(body),
            },
        )
    }

    /// Add an aggregation overload
    pub fn aggregate(self, param_types: &[ExprType], return_type: ExprType, kind: AggregationKind) -> Self {
        self.register(
            param_types.to_vec(),
            FunctionBuilder::Aggregate { return_type, kind },
        )
    }

    /// Merge the overloads of another resolver for the same name
    pub fn merge(mut self, other: FunctionResolver) -> Self {
        for (params, builder) in other.builders {
            self = self.register(params, builder);
        }
        self
    }

    pub fn signatures(&self) -> impl Iterator<Item = FunctionSignature> + '_ {
        self.builders
            .keys()
            .map(|params| FunctionSignature::new(self.name.clone(), params.clone()))
    }

    /// Pick the overload needing the least total widening for `arg_types`.
    ///
    /// No compatible overload is an unsupported-arguments error, two or more
    /// equally cheap overloads an ambiguity error.
    pub fn resolve(&self, arg_types: &[ExprType]) -> ExpressionResult<(FunctionSignature, &FunctionBuilder)> {
        let mut best: Option<(u32, &Vec<ExprType>, &FunctionBuilder)> = None;
        let mut tied = false;
        for (params, builder) in &self.builders {
            let signature = FunctionSignature::new(self.name.clone(), params.clone());
            let Some(distance) = signature.match_distance(arg_types) else {
                continue;
            };
            match best {
                Some((best_distance, _, _)) if distance > best_distance => {}
                Some((best_distance, _, _)) if distance == best_distance => tied = true,
                _ => {
                    best = Some((distance, params, builder));
                    tied = false;
                }
            }
        }
        match best {
            Some(_) if tied => Err(ExpressionError::AmbiguousSignature {
                function: self.name.to_string(),
                arg_types: arg_types.to_vec(),
            }),
            Some((_, params, builder)) => Ok((
                FunctionSignature::new(self.name.clone(), params.clone()),
                builder,
            )),
            None => Err(ExpressionError::UnsupportedArguments {
                function: self.name.to_string(),
                arg_types: arg_types.to_vec(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo(args: &[ExprValue]) -> ExpressionResult<ExprValue> {
        Ok(args[0].clone())
    }

    fn numeric_resolver() -> FunctionResolver {
        ExprType::NUMBERS
            .into_iter()
            .fold(FunctionResolver::new("f"), |resolver, ty| {
                resolver.scalar(&[ty, ty], ty, echo)
            })
    }

    #[test]
    fn test_exact_match_wins() -> ExpressionResult<()> {
        let resolver = numeric_resolver();
        let (signature, builder) = resolver.resolve(&[ExprType::Long, ExprType::Long])?;
        assert_eq!(signature.param_types, vec![ExprType::Long, ExprType::Long]);
        assert_eq!(builder.return_type(), ExprType::Long);
        Ok(())
    }

    #[test]
    fn test_least_widening_wins() -> ExpressionResult<()> {
        let resolver = numeric_resolver();
        let (signature, _) = resolver.resolve(&[ExprType::Integer, ExprType::Float])?;
        assert_eq!(signature.param_types, vec![ExprType::Float, ExprType::Float]);

        let (signature, _) = resolver.resolve(&[ExprType::Integer, ExprType::Long])?;
        assert_eq!(signature.param_types, vec![ExprType::Long, ExprType::Long]);
        Ok(())
    }

    #[test]
    fn test_no_match_is_unsupported() {
        let resolver = numeric_resolver();
        let err = resolver.resolve(&[ExprType::String, ExprType::Integer]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unsupported argument type for function f with arguments [STRING,INTEGER]"
        );
        assert!(resolver.resolve(&[ExprType::Integer]).is_err());
    }

    #[test]
    fn test_tie_is_ambiguous() {
        let resolver = FunctionResolver::new("g")
            .scalar(&[ExprType::Long, ExprType::Integer], ExprType::Long, echo)
            .scalar(&[ExprType::Integer, ExprType::Long], ExprType::Long, echo);
        let err = resolver.resolve(&[ExprType::Integer, ExprType::Integer]).unwrap_err();
        assert!(matches!(err, ExpressionError::AmbiguousSignature { .. }));
    }

    #[test]
    fn test_tie_broken_by_cheaper_match() -> ExpressionResult<()> {
        let resolver = FunctionResolver::new("g")
            .scalar(&[ExprType::Long, ExprType::Integer], ExprType::Long, echo)
            .scalar(&[ExprType::Integer, ExprType::Long], ExprType::Long, echo)
            .scalar(&[ExprType::Integer, ExprType::Integer], ExprType::Integer, echo);
        let (_, builder) = resolver.resolve(&[ExprType::Integer, ExprType::Integer])?;
        assert_eq!(builder.return_type(), ExprType::Integer);
        Ok(())
    }
}
