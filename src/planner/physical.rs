//! Physical planning: logical plan to executor chain.
//!
//! Each logical node maps to exactly one executor wrapping the executor built
//! for its input. Command options are read from the node's argument list and
//! validated here, so a bad option fails before any row is pulled.

use crate::config::EngineConfig;
use crate::data::ExprValue;
use crate::executor::{
    AggregationExecutor, DedupExecutor, DedupOptions, EvalExecutor, Executor, FilterExecutor,
    LimitExecutor, NullOrder, ProjectionExecutor, RareTopNExecutor, RelationExecutor,
    SortCriteria, SortExecutor, SortOrder, SortType, StorageEngine,
};
use crate::planner::logical::{
    argument, merge_arguments, rare_top_n_arguments, Argument, LogicalPlan, SortField,
};
use anyhow::{anyhow, bail, Result};
use log::{debug, warn};
use std::sync::Arc;

/// Compiles logical plans against a storage engine
pub struct PhysicalPlanner {
    storage: Arc<dyn StorageEngine>,
    config: EngineConfig,
}

impl PhysicalPlanner {
    pub fn new(storage: Arc<dyn StorageEngine>, config: EngineConfig) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build the executor chain for `plan`
    pub fn plan(&self, plan: &LogicalPlan) -> Result<Box<dyn Executor>> {
        match plan {
            LogicalPlan::Relation { name } => {
                debug!("planning scan of {}", name);
                Ok(Box::new(RelationExecutor::new(
                    name.clone(),
                    self.storage.scan(name)?,
                    self.storage.schema(name)?,
                )))
            }
            LogicalPlan::Filter { input, condition } => {
                let child = self.plan(input)?;
                Ok(Box::new(FilterExecutor::new(child, condition.clone())))
            }
            LogicalPlan::Project {
                input,
                fields,
                arguments,
            } => {
                let child = self.plan(input)?;
                if bool_argument(arguments, "exclude", false)? {
                    let names = fields.iter().map(|field| field.name.clone()).collect();
                    Ok(Box::new(ProjectionExecutor::exclude(child, names)))
                } else {
                    Ok(Box::new(ProjectionExecutor::new(child, fields.clone())))
                }
            }
            LogicalPlan::Eval { input, assignments } => {
                let child = self.plan(input)?;
                Ok(Box::new(EvalExecutor::new(child, assignments.clone())))
            }
            LogicalPlan::Aggregation {
                input,
                aggregators,
                group_by,
                arguments,
            } => {
                let partitions = integer_argument(arguments, "partitions", 1)?;
                if partitions < 1 {
                    bail!("stats partitions must be at least 1, got {}", partitions);
                }
                let child = self.plan(input)?;
                Ok(Box::new(AggregationExecutor::new(
                    child,
                    aggregators.clone(),
                    group_by.clone(),
                )))
            }
            LogicalPlan::Sort {
                input,
                fields,
                arguments,
            } => {
                let count = integer_argument(arguments, "count", self.config.sort_count())?;
                let offset = integer_argument(arguments, "offset", 0)?;
                let desc = bool_argument(arguments, "desc", false)?;
                let criteria = fields
                    .iter()
                    .map(|field| sort_criteria(field, desc))
                    .collect::<Result<Vec<_>>>()?;
                let child = self.plan(input)?;
                Ok(Box::new(SortExecutor::with_window(child, criteria, count, offset)?))
            }
            LogicalPlan::Limit {
                input,
                limit,
                offset,
            } => {
                let child = self.plan(input)?;
                Ok(Box::new(LimitExecutor::new(child, *limit, *offset)?))
            }
            LogicalPlan::Dedup {
                input,
                fields,
                arguments,
            } => {
                let number = integer_argument(arguments, "number", 1)?;
                let options = DedupOptions {
                    number: usize::try_from(number)
                        .map_err(|_| anyhow!("dedup number must be positive, got {}", number))?,
                    keepevents: bool_argument(arguments, "keepevents", false)?,
                    keepempty: bool_argument(arguments, "keepempty", false)?,
                    consecutive: bool_argument(arguments, "consecutive", false)?,
                };
                let child = self.plan(input)?;
                Ok(Box::new(DedupExecutor::new(child, fields.clone(), options)?))
            }
            LogicalPlan::RareTopN {
                input,
                command,
                fields,
                group_by,
                arguments,
            } => {
                let arguments = merge_arguments(
                    rare_top_n_arguments(self.config.default_rare_top_n),
                    arguments.clone(),
                );
                let results = integer_argument(&arguments, "noOfResults", 0)?;
                let results = usize::try_from(results).unwrap_or_else(|_| {
                    warn!("negative {:?} count {} treated as 0", command, results);
                    0
                });
                let child = self.plan(input)?;
                Ok(Box::new(RareTopNExecutor::new(
                    child,
                    *command,
                    results,
                    fields.clone(),
                    group_by.clone(),
                )))
            }
        }
    }
}

/// Translate one sort field. `exclude=true` sorts it descending, and a
/// command-level `desc` flips the direction again. An explicit `nulls`
/// option wins over the direction's default NULL placement.
fn sort_criteria(field: &SortField, desc: bool) -> Result<SortCriteria> {
    let order = if bool_argument(&field.arguments, "exclude", false)? {
        SortOrder::Desc
    } else {
        SortOrder::Asc
    };

    let mut criteria = match argument(&field.arguments, "nulls") {
        None => SortCriteria::new(field.expr.clone(), order),
        Some(ExprValue::String(nulls)) => {
            let null_order = match nulls.to_ascii_lowercase().as_str() {
                "first" => NullOrder::First,
                "last" => NullOrder::Last,
                other => bail!("unsupported null order: {}", other),
            };
            SortCriteria::with_null_order(field.expr.clone(), order, null_order)
        }
        Some(other) => bail!("sort option nulls must be a string, got {}", other),
    };

    criteria = match argument(&field.arguments, "type") {
        None | Some(ExprValue::Null) => criteria,
        Some(ExprValue::String(name)) => criteria.with_type(SortType::parse(name)?),
        Some(other) => bail!("sort option type must be a string, got {}", other),
    };

    Ok(if desc { criteria.reversed() } else { criteria })
}

fn bool_argument(arguments: &[Argument], name: &str, default: bool) -> Result<bool> {
    match argument(arguments, name) {
        None => Ok(default),
        Some(value) => Ok(value.boolean_value()?),
    }
}

fn integer_argument(arguments: &[Argument], name: &str, default: i64) -> Result<i64> {
    match argument(arguments, name) {
        None => Ok(default),
        Some(value @ (ExprValue::Integer(_) | ExprValue::Long(_))) => Ok(value.long_value()?),
        Some(other) => bail!("option {} must be an integer, got {}", name, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Dialect;
    use crate::data::{ColumnInfo, ExprType, Tuple};
    use crate::executor::{collect, MemoryStorage, RareTopNCommand};
    use crate::expression::{dsl, BinaryOperator, ReferenceExpression};
    use crate::function::BuiltinFunctionRepository;
    use serde_json::json;

    fn storage() -> Arc<dyn StorageEngine> {
        let rows = [
            json!({"name": "alice", "dept": "eng", "age": 30}),
            json!({"name": "bob", "dept": "ops", "age": null}),
            json!({"name": "carol", "dept": "eng", "age": 25}),
            json!({"name": "dave", "dept": "ops", "age": 41}),
        ]
        .into_iter()
        .filter_map(|row| match row {
            serde_json::Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();

        let mut storage = MemoryStorage::new();
        storage.insert_relation(
            "people",
            vec![
                ColumnInfo::new("name", ExprType::String),
                ColumnInfo::new("dept", ExprType::String),
                ColumnInfo::new("age", ExprType::Integer),
            ],
            rows,
        );
        Arc::new(storage)
    }

    fn run(plan: &LogicalPlan) -> Result<Vec<Tuple>> {
        let planner = PhysicalPlanner::new(storage(), EngineConfig::default());
        let mut executor = planner.plan(plan)?;
        collect(executor.as_mut())
    }

    fn names(tuples: &[Tuple]) -> Vec<ExprValue> {
        tuples.iter().map(|t| t.resolve("name")).collect()
    }

    fn age() -> crate::expression::Expression {
        dsl::reference("age", ExprType::Integer)
    }

    #[test]
    fn test_filter_sort_project() -> Result<()> {
        let repo = BuiltinFunctionRepository::new();
        let plan = LogicalPlan::relation("people")
            .filter(dsl::binary(&repo, BinaryOperator::Gt, age(), dsl::literal(20))?)
            .sort(Dialect::Ppl, vec![SortField::descending(age())], vec![])
            .project(vec![dsl::named("name", dsl::reference("name", ExprType::String))]);

        let result = run(&plan)?;
        assert_eq!(
            names(&result),
            vec![
                ExprValue::string("dave"),
                ExprValue::string("alice"),
                ExprValue::string("carol")
            ]
        );
        assert_eq!(result[0].len(), 1);
        Ok(())
    }

    #[test]
    fn test_sort_command_desc_keeps_null_placement() -> Result<()> {
        let plan = LogicalPlan::relation("people").sort(
            Dialect::Ppl,
            vec![SortField::new(age())],
            vec![Argument::new("desc", true)],
        );
        let result = run(&plan)?;
        assert_eq!(names(&result)[0], ExprValue::string("bob"));
        assert_eq!(names(&result)[1], ExprValue::string("dave"));
        Ok(())
    }

    #[test]
    fn test_sort_explicit_nulls_last() -> Result<()> {
        let field = SortField::new(age()).with_argument(Argument::new("nulls", "last"));
        let plan = LogicalPlan::relation("people").sort(Dialect::Ppl, vec![field], vec![]);
        let result = run(&plan)?;
        assert_eq!(names(&result)[0], ExprValue::string("carol"));
        assert_eq!(names(&result)[3], ExprValue::string("bob"));
        Ok(())
    }

    #[test]
    fn test_sort_count() -> Result<()> {
        let plan = LogicalPlan::relation("people").sort(
            Dialect::Ppl,
            vec![SortField::new(age())],
            vec![Argument::new("count", 2)],
        );
        assert_eq!(run(&plan)?.len(), 2);

        let all = LogicalPlan::relation("people").sort(
            Dialect::Ppl,
            vec![SortField::new(age())],
            vec![Argument::new("count", 0)],
        );
        assert_eq!(run(&all)?.len(), 4);
        Ok(())
    }

    #[test]
    fn test_aggregation_and_limit() -> Result<()> {
        let repo = BuiltinFunctionRepository::new();
        let plan = LogicalPlan::relation("people")
            .aggregate(
                vec![dsl::named_aggregate(&repo, "avg(age)", "avg", age())?],
                vec![dsl::named("dept", dsl::reference("dept", ExprType::String))],
            )
            .limit(1, 1);

        let result = run(&plan)?;
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].resolve("dept"), ExprValue::string("ops"));
        assert_eq!(result[0].resolve("avg(age)"), ExprValue::Double(41.0));
        Ok(())
    }

    #[test]
    fn test_dedup_and_exclude() -> Result<()> {
        let plan = LogicalPlan::relation("people")
            .dedup(vec![ReferenceExpression::new("dept", ExprType::String)], vec![])
            .project_exclude(vec![dsl::named("age", age())]);

        let result = run(&plan)?;
        assert_eq!(names(&result), vec![ExprValue::string("alice"), ExprValue::string("bob")]);
        assert!(!result[0].contains("age"));
        assert!(result[0].contains("dept"));
        Ok(())
    }

    #[test]
    fn test_top_uses_configured_default() -> Result<()> {
        let plan = LogicalPlan::relation("people").rare_top_n(
            RareTopNCommand::Top,
            vec![dsl::named("dept", dsl::reference("dept", ExprType::String))],
            vec![],
            vec![],
        );
        let planner = PhysicalPlanner::new(
            storage(),
            EngineConfig {
                default_rare_top_n: 1,
                ..EngineConfig::default()
            },
        );
        let result = collect(planner.plan(&plan)?.as_mut())?;
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].resolve("dept"), ExprValue::string("eng"));

        let explicit = LogicalPlan::relation("people").rare_top_n(
            RareTopNCommand::Top,
            vec![dsl::named("dept", dsl::reference("dept", ExprType::String))],
            vec![],
            vec![Argument::new("noOfResults", 2)],
        );
        assert_eq!(collect(planner.plan(&explicit)?.as_mut())?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_invalid_options() {
        let bad_number = LogicalPlan::relation("people").dedup(
            vec![ReferenceExpression::new("dept", ExprType::String)],
            vec![Argument::new("number", 0)],
        );
        assert!(run(&bad_number).is_err());

        let bad_type = LogicalPlan::relation("people").sort(
            Dialect::Ppl,
            vec![SortField::new(age()).with_argument(Argument::new("type", "color"))],
            vec![],
        );
        assert!(run(&bad_type).is_err());

        let bad_count = LogicalPlan::relation("people").sort(
            Dialect::Ppl,
            vec![SortField::new(age())],
            vec![Argument::new("count", "ten")],
        );
        assert!(run(&bad_count).is_err());

        assert!(run(&LogicalPlan::relation("nobody")).is_err());
    }
}
