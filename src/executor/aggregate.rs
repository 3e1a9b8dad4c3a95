//! Aggregation executor implementation.
//!
//! This executor performs grouping and aggregation on input tuples (`stats`).
//! It buffers one accumulator set per group and emits one row per group after
//! the input is exhausted: the group-by values followed by the aggregation
//! results.
//!
//! With no group-by expressions and no input rows a single row is still
//! produced, so `count()` over nothing yields 0.

use crate::data::{ColumnInfo, Tuple};
use crate::executor::group::{GroupExecutor, GroupKey, GroupStrategy};
use crate::executor::Executor;
use crate::expression::{Environment, NamedExpression};
use crate::function::{AggregationState, NamedAggregator};
use anyhow::Result;

/// Grouping strategy computing aggregations per group
pub struct AggregationStrategy {
    group_by: Vec<NamedExpression>,
    aggregators: Vec<NamedAggregator>,
}

impl AggregationStrategy {
    pub fn new(group_by: Vec<NamedExpression>, aggregators: Vec<NamedAggregator>) -> Self {
        Self {
            group_by,
            aggregators,
        }
    }

    fn row(&self, key: &GroupKey, states: &[AggregationState]) -> Tuple {
        let mut tuple = Tuple::new();
        for (field, value) in self.group_by.iter().zip(key.values()) {
            tuple.insert(field.name.clone(), value.clone());
        }
        for (named, state) in self.aggregators.iter().zip(states) {
            tuple.insert(named.name.clone(), named.aggregator.result(state));
        }
        tuple
    }
}

impl GroupStrategy for AggregationStrategy {
    type State = Vec<AggregationState>;

    fn create_state(&self) -> Self::State {
        self.aggregators
            .iter()
            .map(|named| named.aggregator.create_state())
            .collect()
    }

    fn push(&mut self, states: &mut Self::State, _key: &GroupKey, tuple: Tuple) -> Result<Vec<Tuple>> {
        let env = Environment::new(&tuple);
        for (named, state) in self.aggregators.iter().zip(states.iter_mut()) {
            named.aggregator.iterate(state, &env)?;
        }
        Ok(Vec::new())
    }

    fn result(&self, key: &GroupKey, states: Self::State) -> Result<Vec<Tuple>> {
        Ok(vec![self.row(key, &states)])
    }

    fn finish_empty(&self) -> Result<Vec<Tuple>> {
        if !self.group_by.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![self.row(&GroupKey::default(), &self.create_state())])
    }

    fn output_schema(&self, _input: &[ColumnInfo]) -> Vec<ColumnInfo> {
        self.group_by
            .iter()
            .map(|field| ColumnInfo::new(field.name.clone(), field.expr.expr_type()))
            .chain(
                self.aggregators
                    .iter()
                    .map(|named| ColumnInfo::new(named.name.clone(), named.aggregator.return_type())),
            )
            .collect()
    }
}

/// Executor computing `stats` aggregations
pub type AggregationExecutor = GroupExecutor<AggregationStrategy>;

impl GroupExecutor<AggregationStrategy> {
    /// Create a new aggregation executor
    ///
    /// # Arguments
    /// * `child` - The child executor that produces tuples
    /// * `aggregators` - Aggregations computed per group
    /// * `group_by` - Named grouping expressions (empty for a single group)
    pub fn new(
        child: Box<dyn Executor>,
        aggregators: Vec<NamedAggregator>,
        group_by: Vec<NamedExpression>,
    ) -> Self {
        let keys = group_by.iter().map(|field| field.expr.clone()).collect();
        Self::with_strategy(child, keys, AggregationStrategy::new(group_by, aggregators))
    }
}
