//! Filter executor implementation.
//!
//! This executor filters tuples from a child executor based on a boolean
//! condition. Only rows whose condition evaluates to TRUE pass; NULL and
//! MISSING results drop the row like FALSE.

use crate::data::{ColumnInfo, Tuple};
use crate::executor::Executor;
use crate::expression::eval::ExpressionEvaluator;
use crate::expression::{check_predicate, check_references, Environment, Expression};
use anyhow::{bail, Result};
use log::trace;

/// Executor that filters tuples based on an expression
pub struct FilterExecutor {
    /// Child executor that produces tuples
    child: Box<dyn Executor>,
    /// Filter expression that evaluates to boolean
    condition: Expression,
    /// Output schema (same as child's schema)
    output_schema: Vec<ColumnInfo>,
    /// Whether the executor has been initialized
    initialized: bool,
}

impl FilterExecutor {
    /// Create a new filter executor
    ///
    /// # Arguments
    /// * `child` - The child executor that produces tuples
    /// * `condition` - The filter expression that evaluates to boolean
    pub fn new(child: Box<dyn Executor>, condition: Expression) -> Self {
        Self {
            child,
            condition,
            output_schema: Vec::new(),
            initialized: false,
        }
    }
}

impl Executor for FilterExecutor {
    fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }

        self.child.init()?;
        self.output_schema = self.child.output_schema().to_vec();

        check_references(&self.condition, &self.output_schema)?;
        check_predicate(&self.condition)?;

        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Tuple>> {
        if !self.initialized {
            bail!("Executor not initialized. Call init() first.");
        }

        while let Some(tuple) = self.child.next()? {
            let env = Environment::new(&tuple);
            if ExpressionEvaluator::new(&env).evaluate_predicate(&self.condition)? {
                return Ok(Some(tuple));
            }
            trace!("filtered out {}", tuple);
        }
        Ok(None)
    }

    fn output_schema(&self) -> &[ColumnInfo] {
        &self.output_schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ExprType, ExprValue};
    use crate::executor::testing::MockExecutor;
    use crate::executor::{classify, collect};
    use crate::expression::{dsl, BinaryOperator, ErrorKind};
    use crate::function::BuiltinFunctionRepository;

    fn schema() -> Vec<ColumnInfo> {
        vec![
            ColumnInfo::new("name", ExprType::String),
            ColumnInfo::new("age", ExprType::Integer),
        ]
    }

    fn people() -> Vec<Tuple> {
        vec![
            Tuple::from_pairs([("name", ExprValue::string("alice")), ("age", ExprValue::Integer(30))]),
            Tuple::from_pairs([("name", ExprValue::string("bob")), ("age", ExprValue::Integer(15))]),
            Tuple::from_pairs([("name", ExprValue::string("carol")), ("age", ExprValue::Null)]),
            Tuple::from_pairs([("name", ExprValue::string("dave"))]),
            Tuple::from_pairs([("name", ExprValue::string("erin")), ("age", ExprValue::Integer(50))]),
        ]
    }

    fn adults(repo: &BuiltinFunctionRepository) -> Result<Expression> {
        Ok(dsl::binary(
            repo,
            BinaryOperator::Ge,
            dsl::reference("age", ExprType::Integer),
            dsl::literal(18),
        )?)
    }

    #[test]
    fn test_filter_basic() -> Result<()> {
        let repo = BuiltinFunctionRepository::new();
        let child = MockExecutor::new(people(), schema());
        let mut filter = FilterExecutor::new(Box::new(child), adults(&repo)?);

        let result = collect(&mut filter)?;
        let names: Vec<_> = result.iter().map(|t| t.resolve("name")).collect();
        assert_eq!(names, vec![ExprValue::string("alice"), ExprValue::string("erin")]);
        assert_eq!(filter.output_schema(), schema().as_slice());
        Ok(())
    }

    #[test]
    fn test_filter_is_null_sees_missing() -> Result<()> {
        let repo = BuiltinFunctionRepository::new();
        let condition = dsl::unary(
            &repo,
            crate::expression::UnaryOperator::IsNull,
            dsl::reference("age", ExprType::Integer),
        )?;
        let child = MockExecutor::new(people(), schema());
        let mut filter = FilterExecutor::new(Box::new(child), condition);

        let result = collect(&mut filter)?;
        assert_eq!(result.len(), 2);
        Ok(())
    }

    #[test]
    fn test_filter_unknown_field_is_semantic() -> Result<()> {
        let repo = BuiltinFunctionRepository::new();
        let condition = dsl::binary(
            &repo,
            BinaryOperator::Gt,
            dsl::reference("salary", ExprType::Integer),
            dsl::literal(0),
        )?;
        let child = MockExecutor::new(people(), schema());
        let mut filter = FilterExecutor::new(Box::new(child), condition);

        let err = filter.init().unwrap_err();
        assert_eq!(classify(&err), ErrorKind::SemanticCheck);
        Ok(())
    }

    #[test]
    fn test_filter_not_initialized() -> Result<()> {
        let repo = BuiltinFunctionRepository::new();
        let child = MockExecutor::new(people(), schema());
        let mut filter = FilterExecutor::new(Box::new(child), adults(&repo)?);
        assert!(filter.next().is_err());
        Ok(())
    }

    #[test]
    fn test_filter_upstream_failure() -> Result<()> {
        let repo = BuiltinFunctionRepository::new();
        let child = MockExecutor::new(people(), schema()).failing_at(2);
        let mut filter = FilterExecutor::new(Box::new(child), adults(&repo)?);
        filter.init()?;

        assert!(filter.next()?.is_some());
        let err = filter.next().unwrap_err();
        assert_eq!(classify(&err), ErrorKind::Upstream);
        Ok(())
    }
}
