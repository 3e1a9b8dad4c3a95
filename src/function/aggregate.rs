//! Aggregation functions: avg, sum, count, min and max.
//!
//! An [`Aggregator`] is the compiled form of one aggregation call. The
//! Aggregation operator keeps one [`AggregationState`] per group and feeds it
//! rows through [`Aggregator::iterate`]. NULL and MISSING inputs are skipped.

use crate::data::{ExprType, ExprValue};
use crate::expression::{Environment, Expression, ExpressionError, ExpressionResult};
use crate::function::{FunctionResolver, FunctionSignature, RepositoryBuilder};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregationKind {
    Avg,
    Sum,
    Count,
    Min,
    Max,
}

/// Running state of one aggregation inside one group
#[derive(Debug, Clone, PartialEq)]
pub enum AggregationState {
    Avg { sum: f64, count: u64 },
    Sum(Option<ExprValue>),
    Count(i64),
    Min(Option<ExprValue>),
    Max(Option<ExprValue>),
}

pub fn register(repo: &mut RepositoryBuilder) {
    repo.register(FunctionResolver::new("avg").aggregate(
        &[ExprType::Double],
        ExprType::Double,
        AggregationKind::Avg,
    ));
    repo.register(ExprType::NUMBERS.into_iter().fold(
        FunctionResolver::new("sum"),
        |resolver, ty| resolver.aggregate(&[ty], ty, AggregationKind::Sum),
    ));
    repo.register(
        ExprType::SCALARS
            .into_iter()
            .chain([ExprType::Struct, ExprType::Array])
            .fold(FunctionResolver::new("count"), |resolver, ty| {
                resolver.aggregate(&[ty], ExprType::Integer, AggregationKind::Count)
            }),
    );
    for (name, kind) in [("min", AggregationKind::Min), ("max", AggregationKind::Max)] {
        repo.register(
            ExprType::SCALARS
                .into_iter()
                .fold(FunctionResolver::new(name), |resolver, ty| resolver.aggregate(&[ty], ty, kind)),
        );
    }
}

/// A resolved aggregation call over one argument expression
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregator {
    signature: FunctionSignature,
    kind: AggregationKind,
    return_type: ExprType,
    arg: Expression,
}

impl Aggregator {
    pub fn new(
        signature: FunctionSignature,
        kind: AggregationKind,
        return_type: ExprType,
        arg: Expression,
    ) -> Self {
        Self {
            signature,
            kind,
            return_type,
            arg,
        }
    }

    pub fn kind(&self) -> AggregationKind {
        self.kind
    }

    pub fn return_type(&self) -> ExprType {
        self.return_type
    }

    pub fn arg(&self) -> &Expression {
        &self.arg
    }

    pub fn create_state(&self) -> AggregationState {
        match self.kind {
            AggregationKind::Avg => AggregationState::Avg { sum: 0.0, count: 0 },
            AggregationKind::Sum => AggregationState::Sum(None),
            AggregationKind::Count => AggregationState::Count(0),
            AggregationKind::Min => AggregationState::Min(None),
            AggregationKind::Max => AggregationState::Max(None),
        }
    }

    /// Fold the argument's value in `env` into `state`
    pub fn iterate(&self, state: &mut AggregationState, env: &Environment<'_>) -> ExpressionResult<()> {
        let value = self.arg.value_of(env)?;
        if value.is_null_or_missing() {
            return Ok(());
        }
        let value = match self.signature.param_types.first() {
            Some(ty) => value.cast_to(*ty)?,
            None => value,
        };
        match state {
            AggregationState::Avg { sum, count } => {
                *sum += value.double_value()?;
                *count += 1;
            }
            AggregationState::Sum(total) => {
                *total = Some(match total.take() {
                    Some(acc) => add(&acc, &value)?,
                    None => value,
                });
            }
            AggregationState::Count(n) => *n += 1,
            AggregationState::Min(current) => keep_if(current, value, Ordering::Less)?,
            AggregationState::Max(current) => keep_if(current, value, Ordering::Greater)?,
        }
        Ok(())
    }

    /// Final value of `state`; an empty group is NULL except for count.
    /// Counts beyond the INTEGER range saturate at `i32::MAX`.
    pub fn result(&self, state: &AggregationState) -> ExprValue {
        match state {
            AggregationState::Avg { count: 0, .. } => ExprValue::Null,
            AggregationState::Avg { sum, count } => ExprValue::Double(sum / *count as f64),
            AggregationState::Count(n) => ExprValue::Integer(i32::try_from(*n).unwrap_or(i32::MAX)),
            AggregationState::Sum(value) | AggregationState::Min(value) | AggregationState::Max(value) => {
                value.clone().unwrap_or(ExprValue::Null)
            }
        }
    }
}

impl fmt::Display for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.signature.name, self.arg)
    }
}

fn keep_if(current: &mut Option<ExprValue>, value: ExprValue, wanted: Ordering) -> ExpressionResult<()> {
    let replace = match current {
        Some(existing) => value.compare(existing)? == wanted,
        None => true,
    };
    if replace {
        *current = Some(value);
    }
    Ok(())
}

fn add(left: &ExprValue, right: &ExprValue) -> ExpressionResult<ExprValue> {
    match (left, right) {
        (ExprValue::Integer(a), ExprValue::Integer(b)) => Ok(ExprValue::Integer(a.wrapping_add(*b))),
        (ExprValue::Long(a), ExprValue::Long(b)) => Ok(ExprValue::Long(a.wrapping_add(*b))),
        (ExprValue::Float(a), ExprValue::Float(b)) => Ok(ExprValue::Float(a + b)),
        (ExprValue::Double(a), ExprValue::Double(b)) => Ok(ExprValue::Double(a + b)),
        _ => Err(ExpressionError::evaluation(format!(
            "can't sum {} and {}",
            left.expr_type(),
            right.expr_type()
        ))),
    }
}

/// An aggregator bound to its output column name
#[derive(Debug, Clone, PartialEq)]
pub struct NamedAggregator {
    pub name: String,
    pub aggregator: Aggregator,
}

impl NamedAggregator {
    pub fn new(name: impl Into<String>, aggregator: Aggregator) -> Self {
        Self {
            name: name.into(),
            aggregator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Tuple;
    use crate::expression::dsl;
    use crate::function::BuiltinFunctionRepository;

    fn run(name: &str, arg: Expression, rows: &[Tuple]) -> ExpressionResult<ExprValue> {
        let repo = BuiltinFunctionRepository::new();
        let aggregator = dsl::aggregate(&repo, name, arg)?;
        let mut state = aggregator.create_state();
        for row in rows {
            aggregator.iterate(&mut state, &Environment::new(row))?;
        }
        Ok(aggregator.result(&state))
    }

    fn rows() -> Vec<Tuple> {
        vec![
            Tuple::from_pairs([("age", ExprValue::Integer(30))]),
            Tuple::from_pairs([("age", ExprValue::Null)]),
            Tuple::from_pairs([("age", ExprValue::Integer(20))]),
            Tuple::new(),
            Tuple::from_pairs([("age", ExprValue::Integer(40))]),
        ]
    }

    fn age() -> Expression {
        dsl::reference("age", ExprType::Integer)
    }

    #[test]
    fn test_aggregations_skip_null_and_missing() -> ExpressionResult<()> {
        assert_eq!(run("avg", age(), &rows())?, ExprValue::Double(30.0));
        assert_eq!(run("sum", age(), &rows())?, ExprValue::Integer(90));
        assert_eq!(run("count", age(), &rows())?, ExprValue::Integer(3));
        assert_eq!(run("min", age(), &rows())?, ExprValue::Integer(20));
        assert_eq!(run("max", age(), &rows())?, ExprValue::Integer(40));
        Ok(())
    }

    #[test]
    fn test_empty_input() -> ExpressionResult<()> {
        assert!(run("avg", age(), &[])?.is_null());
        assert!(run("sum", age(), &[])?.is_null());
        assert!(run("max", age(), &[])?.is_null());
        assert_eq!(run("count", age(), &[])?, ExprValue::Integer(0));
        Ok(())
    }

    #[test]
    fn test_count_saturates() -> ExpressionResult<()> {
        let repo = BuiltinFunctionRepository::new();
        let count = dsl::aggregate(&repo, "count", age())?;
        let big = i64::from(i32::MAX) + 5;
        assert_eq!(count.result(&AggregationState::Count(big)), ExprValue::Integer(i32::MAX));
        assert_eq!(count.result(&AggregationState::Count(7)), ExprValue::Integer(7));
        Ok(())
    }

    #[test]
    fn test_types() -> ExpressionResult<()> {
        let repo = BuiltinFunctionRepository::new();
        assert_eq!(dsl::aggregate(&repo, "sum", dsl::reference("x", ExprType::Long))?.return_type(), ExprType::Long);
        assert_eq!(dsl::aggregate(&repo, "count", dsl::reference("s", ExprType::String))?.return_type(), ExprType::Integer);
        assert_eq!(dsl::aggregate(&repo, "max", dsl::reference("d", ExprType::Date))?.return_type(), ExprType::Date);
        assert!(dsl::aggregate(&repo, "sum", dsl::reference("s", ExprType::String)).is_err());
        Ok(())
    }

    #[test]
    fn test_min_max_strings() -> ExpressionResult<()> {
        let rows = vec![
            Tuple::from_pairs([("name", ExprValue::string("bob"))]),
            Tuple::from_pairs([("name", ExprValue::string("alice"))]),
        ];
        let name = || dsl::reference("name", ExprType::String);
        assert_eq!(run("min", name(), &rows)?, ExprValue::string("alice"));
        assert_eq!(run("max", name(), &rows)?, ExprValue::string("bob"));
        Ok(())
    }

    #[test]
    fn test_display() -> ExpressionResult<()> {
        let repo = BuiltinFunctionRepository::new();
        assert_eq!(dsl::aggregate(&repo, "avg", age())?.to_string(), "avg(age)");
        Ok(())
    }
}
