//! Projection executor implementation.
//!
//! Keeps a list of named expressions (`fields a, b`) or drops a list of
//! fields (`fields - a, b`). A projected value that evaluates to MISSING is
//! left out of the output tuple rather than emitted as a field.

use crate::data::{ColumnInfo, Tuple};
use crate::executor::Executor;
use crate::expression::{check_references, Environment, NamedExpression};
use anyhow::{bail, Result};

enum Projection {
    Include(Vec<NamedExpression>),
    Exclude(Vec<String>),
}

/// Executor that projects specific fields from tuples
pub struct ProjectionExecutor {
    /// Child executor that produces tuples
    child: Box<dyn Executor>,
    projection: Projection,
    /// Output schema (projected fields only)
    output_schema: Vec<ColumnInfo>,
    /// Whether the executor has been initialized
    initialized: bool,
}

impl ProjectionExecutor {
    /// Create a projection keeping the given expressions, in order
    ///
    /// # Arguments
    /// * `child` - The child executor that produces tuples
    /// * `fields` - Named expressions to evaluate per row
    pub fn new(child: Box<dyn Executor>, fields: Vec<NamedExpression>) -> Self {
        Self::build(child, Projection::Include(fields))
    }

    /// Create a projection dropping the given fields and keeping the rest
    pub fn exclude(child: Box<dyn Executor>, fields: Vec<String>) -> Self {
        Self::build(child, Projection::Exclude(fields))
    }

    fn build(child: Box<dyn Executor>, projection: Projection) -> Self {
        Self {
            child,
            projection,
            output_schema: Vec::new(),
            initialized: false,
        }
    }
}

impl Executor for ProjectionExecutor {
    fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }

        self.child.init()?;
        let input = self.child.output_schema();

        self.output_schema = match &self.projection {
            Projection::Include(fields) => {
                for field in fields {
                    check_references(&field.expr, input)?;
                }
                fields
                    .iter()
                    .map(|field| ColumnInfo::new(field.name.clone(), field.expr.expr_type()))
                    .collect()
            }
            Projection::Exclude(names) => input
                .iter()
                .filter(|column| !names.contains(&column.name))
                .cloned()
                .collect(),
        };

        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Tuple>> {
        if !self.initialized {
            bail!("Executor not initialized. Call init() first.");
        }

        let Some(tuple) = self.child.next()? else {
            return Ok(None);
        };

        let projected = match &self.projection {
            Projection::Include(fields) => {
                let env = Environment::new(&tuple);
                let mut projected = Tuple::new();
                for field in fields {
                    let value = field.expr.value_of(&env)?;
                    if !value.is_missing() {
                        projected.insert(field.name.clone(), value);
                    }
                }
                projected
            }
            Projection::Exclude(names) => tuple
                .into_iter()
                .filter(|(name, value)| !names.contains(name) && !value.is_missing())
                .collect(),
        };
        Ok(Some(projected))
    }

    fn output_schema(&self) -> &[ColumnInfo] {
        &self.output_schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ExprType, ExprValue};
    use crate::executor::collect;
    use crate::executor::testing::MockExecutor;
    use crate::expression::{dsl, BinaryOperator};
    use crate::function::BuiltinFunctionRepository;

    fn schema() -> Vec<ColumnInfo> {
        vec![
            ColumnInfo::new("id", ExprType::Integer),
            ColumnInfo::new("name", ExprType::String),
            ColumnInfo::new("age", ExprType::Integer),
        ]
    }

    fn rows() -> Vec<Tuple> {
        vec![
            Tuple::from_pairs([
                ("id", ExprValue::Integer(1)),
                ("name", ExprValue::string("alice")),
                ("age", ExprValue::Integer(30)),
            ]),
            Tuple::from_pairs([("id", ExprValue::Integer(2)), ("name", ExprValue::string("bob"))]),
        ]
    }

    #[test]
    fn test_projection_reorders_fields() -> Result<()> {
        let child = MockExecutor::new(rows(), schema());
        let mut projection = ProjectionExecutor::new(
            Box::new(child),
            vec![
                dsl::named("name", dsl::reference("name", ExprType::String)),
                dsl::named("id", dsl::reference("id", ExprType::Integer)),
            ],
        );

        let result = collect(&mut projection)?;
        let names: Vec<_> = result[0].names().cloned().collect();
        assert_eq!(names, vec!["name", "id"]);
        assert_eq!(projection.output_schema()[0], ColumnInfo::new("name", ExprType::String));
        Ok(())
    }

    #[test]
    fn test_projection_omits_missing() -> Result<()> {
        let child = MockExecutor::new(rows(), schema());
        let mut projection = ProjectionExecutor::new(
            Box::new(child),
            vec![dsl::named("age", dsl::reference("age", ExprType::Integer))],
        );

        let result = collect(&mut projection)?;
        assert_eq!(result[0].resolve("age"), ExprValue::Integer(30));
        assert!(result[1].is_empty());
        Ok(())
    }

    #[test]
    fn test_projection_computed_field() -> Result<()> {
        let repo = BuiltinFunctionRepository::new();
        let next_year = dsl::binary(
            &repo,
            BinaryOperator::Add,
            dsl::reference("age", ExprType::Integer),
            dsl::literal(1),
        )?;
        let child = MockExecutor::new(rows(), schema());
        let mut projection =
            ProjectionExecutor::new(Box::new(child), vec![NamedExpression::unnamed(next_year)]);

        let result = collect(&mut projection)?;
        assert_eq!(result[0].resolve("age + 1"), ExprValue::Integer(31));
        assert!(!result[1].contains("age + 1"));
        Ok(())
    }

    #[test]
    fn test_projection_exclude() -> Result<()> {
        let child = MockExecutor::new(rows(), schema());
        let mut projection = ProjectionExecutor::exclude(Box::new(child), vec!["name".to_string()]);

        let result = collect(&mut projection)?;
        let names: Vec<_> = result[0].names().cloned().collect();
        assert_eq!(names, vec!["id", "age"]);
        assert_eq!(projection.output_schema().len(), 2);
        Ok(())
    }

    #[test]
    fn test_projection_unknown_field() {
        let child = MockExecutor::new(rows(), schema());
        let mut projection = ProjectionExecutor::new(
            Box::new(child),
            vec![dsl::named("salary", dsl::reference("salary", ExprType::Integer))],
        );
        assert!(projection.init().is_err());
    }

    #[test]
    fn test_projection_not_initialized() {
        let child = MockExecutor::new(rows(), schema());
        let mut projection = ProjectionExecutor::exclude(Box::new(child), vec![]);
        assert!(projection.next().is_err());
    }
}
