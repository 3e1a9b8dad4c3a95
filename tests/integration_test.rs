use anyhow::{bail, Result};
use serde_json::json;
use std::sync::Arc;
use vibeql::config::{Dialect, EngineConfig};
use vibeql::data::{ColumnInfo, ExprType, ExprValue, Schema, Tuple};
use vibeql::executor::relation::{RawRow, RowSource, StorageEngine};
use vibeql::executor::{classify, collect, MemoryStorage, RareTopNCommand};
use vibeql::expression::eval::evaluate_expression;
use vibeql::expression::{dsl, BinaryOperator, ErrorKind, ReferenceExpression};
use vibeql::function::{BuiltinFunctionRepository, FunctionBuilder};
use vibeql::planner::{Argument, LogicalPlan, PhysicalPlanner, SortField};

fn rows(values: Vec<serde_json::Value>) -> Vec<RawRow> {
    values
        .into_iter()
        .filter_map(|value| match value {
            serde_json::Value::Object(map) => Some(map),
            _ => None,
        })
        .collect()
}

fn planner(name: &str, schema: Schema, data: Vec<serde_json::Value>, dialect: Dialect) -> PhysicalPlanner {
    let mut storage = MemoryStorage::new();
    storage.insert_relation(name, schema, rows(data));
    PhysicalPlanner::new(Arc::new(storage), EngineConfig::for_dialect(dialect))
}

fn run(planner: &PhysicalPlanner, plan: &LogicalPlan) -> Result<Vec<Tuple>> {
    let mut executor = planner.plan(plan)?;
    collect(executor.as_mut())
}

fn column(tuples: &[Tuple], name: &str) -> Vec<ExprValue> {
    tuples.iter().map(|tuple| tuple.resolve(name)).collect()
}

#[test]
fn test_sort_default_null_order() -> Result<()> {
    let schema = vec![ColumnInfo::new("a", ExprType::Integer)];
    let planner = planner(
        "t",
        schema,
        vec![json!({"a": 3}), json!({"a": null}), json!({"a": 1})],
        Dialect::Sql,
    );
    let a = || dsl::reference("a", ExprType::Integer);

    let ascending = LogicalPlan::relation("t").sort(Dialect::Sql, vec![SortField::new(a())], vec![]);
    assert_eq!(
        column(&run(&planner, &ascending)?, "a"),
        vec![ExprValue::Null, ExprValue::Integer(1), ExprValue::Integer(3)]
    );

    let descending =
        LogicalPlan::relation("t").sort(Dialect::Sql, vec![SortField::descending(a())], vec![]);
    assert_eq!(
        column(&run(&planner, &descending)?, "a"),
        vec![ExprValue::Integer(3), ExprValue::Integer(1), ExprValue::Null]
    );
    Ok(())
}

fn letters() -> PhysicalPlanner {
    planner(
        "letters",
        vec![ColumnInfo::new("name", ExprType::String)],
        ["A", "B", "C", "D"].iter().map(|name| json!({ "name": name })).collect(),
        Dialect::Ppl,
    )
}

#[test]
fn test_limit_offset_window() -> Result<()> {
    let planner = letters();

    let result = run(&planner, &LogicalPlan::relation("letters").limit(1, 2))?;
    assert_eq!(column(&result, "name"), vec![ExprValue::string("C")]);

    let result = run(&planner, &LogicalPlan::relation("letters").limit(1, 10))?;
    assert!(result.is_empty());
    Ok(())
}

#[test]
fn test_sort_count_zero_returns_everything() -> Result<()> {
    let planner = letters();
    let plan = LogicalPlan::relation("letters").sort(
        Dialect::Ppl,
        vec![SortField::descending(dsl::reference("name", ExprType::String))],
        vec![Argument::new("count", 0)],
    );

    let result = run(&planner, &plan)?;
    assert_eq!(
        column(&result, "name"),
        ["D", "C", "B", "A"].into_iter().map(ExprValue::string).collect::<Vec<_>>()
    );
    Ok(())
}

fn sample(ty: ExprType) -> Result<ExprValue> {
    Ok(match ty {
        ExprType::Integer => ExprValue::Integer(2),
        ExprType::Long => ExprValue::Long(2),
        ExprType::Float => ExprValue::Float(2.0),
        ExprType::Double => ExprValue::Double(2.0),
        ExprType::String => ExprValue::string("2020-08-26"),
        ExprType::Boolean => ExprValue::Boolean(true),
        ExprType::Date => ExprValue::date("2020-08-26")?,
        ExprType::Time => ExprValue::time("12:30:00")?,
        ExprType::Datetime => ExprValue::datetime("2020-08-26 12:30:00")?,
        ExprType::Timestamp => ExprValue::timestamp("2020-08-26 12:30:00")?,
        ExprType::Struct => ExprValue::Tuple(Tuple::new()),
        ExprType::Array => ExprValue::Array(vec![]),
        ExprType::Null | ExprType::Undefined => ExprValue::Null,
    })
}

#[test]
fn test_two_argument_functions_propagate_missing() -> Result<()> {
    let repo = BuiltinFunctionRepository::new();
    let mut checked = 0;

    for resolver in repo.resolvers() {
        for signature in resolver.signatures().filter(|s| s.param_types.len() == 2) {
            let (_, builder) = resolver.resolve(&signature.param_types)?;
            let FunctionBuilder::Scalar { body, .. } = builder else {
                continue;
            };
            let left = sample(signature.param_types[0])?;
            let right = sample(signature.param_types[1])?;

            for args in [
                [ExprValue::Missing, right.clone()],
                [left.clone(), ExprValue::Missing],
                [ExprValue::Missing, ExprValue::Missing],
            ] {
                let result = (**body)(&args[..])?;
                if !result.is_missing() {
                    bail!("{:?} returned {} for {:?}", signature, result, args);
                }
            }
            checked += 1;
        }
    }
    assert!(checked > 50, "only {} signatures checked", checked);
    Ok(())
}

#[test]
fn test_abs_over_numeric_types() -> Result<()> {
    let repo = BuiltinFunctionRepository::new();
    let cases = [
        (ExprType::Integer, ExprValue::Integer(-3), ExprValue::Integer(3)),
        (ExprType::Long, ExprValue::Long(-3), ExprValue::Long(3)),
        (ExprType::Float, ExprValue::Float(-3.5), ExprValue::Float(3.5)),
        (ExprType::Double, ExprValue::Double(-3.5), ExprValue::Double(3.5)),
    ];

    for (ty, input, expected) in cases {
        let expr = dsl::function(&repo, "abs", vec![dsl::reference("x", ty)])?;
        assert_eq!(expr.expr_type(), ty);

        let present = Tuple::from_pairs([("x", input)]);
        assert_eq!(evaluate_expression(&expr, &present)?, expected);

        let null = Tuple::from_pairs([("x", ExprValue::Null)]);
        assert!(evaluate_expression(&expr, &null)?.is_null());

        assert!(evaluate_expression(&expr, &Tuple::new())?.is_missing());
    }
    Ok(())
}

fn employees() -> PhysicalPlanner {
    planner(
        "employees",
        vec![
            ColumnInfo::new("name", ExprType::String),
            ColumnInfo::new("dept", ExprType::String),
            ColumnInfo::new("salary", ExprType::Long),
            ColumnInfo::new("hired", ExprType::Date),
        ],
        vec![
            json!({"name": "ann", "dept": "eng", "salary": 120, "hired": "2019-03-01"}),
            json!({"name": "ben", "dept": "ops", "salary": 80, "hired": "2020-07-15"}),
            json!({"name": "cat", "dept": "eng", "salary": 100, "hired": "2021-01-10"}),
            json!({"name": "dan", "dept": "ops", "hired": "2018-11-30"}),
            json!({"name": "eve", "dept": "eng", "salary": 90, "hired": "2022-05-05"}),
        ],
        Dialect::Ppl,
    )
}

#[test]
fn test_pipeline_end_to_end() -> Result<()> {
    let repo = BuiltinFunctionRepository::new();
    let planner = employees();
    let salary = || dsl::reference("salary", ExprType::Long);

    let plan = LogicalPlan::relation("employees")
        .filter(dsl::binary(&repo, BinaryOperator::Ge, salary(), dsl::literal(90i64))?)
        .eval(vec![dsl::named(
            "year",
            dsl::function(&repo, "year", vec![dsl::reference("hired", ExprType::Date)])?,
        )])
        .aggregate(
            vec![
                dsl::named_aggregate(&repo, "total", "sum", salary())?,
                dsl::named_aggregate(&repo, "first", "min", dsl::reference("year", ExprType::Integer))?,
            ],
            vec![dsl::named("dept", dsl::reference("dept", ExprType::String))],
        );

    let result = run(&planner, &plan)?;
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].resolve("dept"), ExprValue::string("eng"));
    assert_eq!(result[0].resolve("total"), ExprValue::Long(310));
    assert_eq!(result[0].resolve("first"), ExprValue::Integer(2019));
    Ok(())
}

#[test]
fn test_top_and_dedup() -> Result<()> {
    let planner = employees();
    let top = LogicalPlan::relation("employees").rare_top_n(
        RareTopNCommand::Top,
        vec![dsl::named("dept", dsl::reference("dept", ExprType::String))],
        vec![],
        vec![Argument::new("noOfResults", 1)],
    );
    let result = run(&planner, &top)?;
    assert_eq!(column(&result, "dept"), vec![ExprValue::string("eng")]);

    let dedup = LogicalPlan::relation("employees")
        .dedup(vec![ReferenceExpression::new("dept", ExprType::String)], vec![]);
    let result = run(&planner, &dedup)?;
    assert_eq!(
        column(&result, "name"),
        vec![ExprValue::string("ann"), ExprValue::string("ben")]
    );
    Ok(())
}

#[test]
fn test_unknown_field_is_a_semantic_error() -> Result<()> {
    let repo = BuiltinFunctionRepository::new();
    let planner = employees();
    let plan = LogicalPlan::relation("employees").filter(dsl::binary(
        &repo,
        BinaryOperator::Gt,
        dsl::reference("bonus", ExprType::Long),
        dsl::literal(0i64),
    )?);

    let err = match run(&planner, &plan) {
        Ok(_) => bail!("expected the unknown field to be rejected"),
        Err(err) => err,
    };
    assert_eq!(classify(&err), ErrorKind::SemanticCheck);
    Ok(())
}

#[test]
fn test_out_of_domain_call_is_an_evaluation_error() -> Result<()> {
    let repo = BuiltinFunctionRepository::new();
    let planner = employees();
    let plan = LogicalPlan::relation("employees").eval(vec![dsl::named(
        "fmt",
        dsl::function(
            &repo,
            "get_format",
            vec![dsl::reference("hired", ExprType::Date), dsl::literal("NOWHERE")],
        )?,
    )]);

    let err = match run(&planner, &plan) {
        Ok(_) => bail!("expected get_format to fail"),
        Err(err) => err,
    };
    assert_eq!(classify(&err), ErrorKind::ExpressionEvaluation);
    Ok(())
}

struct FlakyStorage;

struct FlakySource {
    served: usize,
}

impl RowSource for FlakySource {
    fn next_row(&mut self) -> Result<Option<RawRow>> {
        self.served += 1;
        match self.served {
            1 => Ok(rows(vec![json!({"n": 1})]).pop()),
            _ => bail!("connection reset while scanning"),
        }
    }
}

impl StorageEngine for FlakyStorage {
    fn schema(&self, _relation: &str) -> Result<Schema> {
        Ok(vec![ColumnInfo::new("n", ExprType::Integer)])
    }

    fn scan(&self, _relation: &str) -> Result<Box<dyn RowSource>> {
        Ok(Box::new(FlakySource { served: 0 }))
    }
}

#[test]
fn test_upstream_failure_aborts_the_query() -> Result<()> {
    let planner = PhysicalPlanner::new(Arc::new(FlakyStorage), EngineConfig::default());
    let plan = LogicalPlan::relation("flaky").limit(10, 0);

    let err = match run(&planner, &plan) {
        Ok(_) => bail!("expected the scan failure to surface"),
        Err(err) => err,
    };
    assert_eq!(classify(&err), ErrorKind::Upstream);
    assert!(format!("{:#}", err).contains("connection reset"));
    Ok(())
}
