//! Generic grouping engine.
//!
//! [`GroupExecutor`] pulls every child tuple, buckets it under a
//! [`GroupKey`] computed from the key expressions, and hands it to a
//! [`GroupStrategy`] that owns the per-group state. A strategy may emit rows
//! as soon as they are pushed (dedup) or only once the input is exhausted
//! (aggregation, rare/top, limit).
//!
//! Groups are finalized in order of first appearance.

use crate::data::{ColumnInfo, ExprValue, Tuple};
use crate::executor::Executor;
use crate::expression::{Environment, Expression};
use anyhow::{bail, Result};
use indexmap::IndexMap;
use log::debug;
use ordered_float::OrderedFloat;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};

/// Ordered grouping field values.
///
/// Unlike value equality, NULL equals NULL and MISSING equals MISSING here,
/// so rows lacking a key still land in one group.
#[derive(Debug, Clone, Default)]
pub struct GroupKey(pub Vec<ExprValue>);

impl GroupKey {
    pub fn values(&self) -> &[ExprValue] {
        &self.0
    }

    /// Whether any key value is NULL or MISSING
    pub fn has_empty(&self) -> bool {
        self.0.iter().any(ExprValue::is_null_or_missing)
    }
}

fn same_value(left: &ExprValue, right: &ExprValue) -> bool {
    match (left, right) {
        (ExprValue::Missing, ExprValue::Missing) => true,
        (ExprValue::Float(a), ExprValue::Float(b)) => OrderedFloat(*a) == OrderedFloat(*b),
        (ExprValue::Double(a), ExprValue::Double(b)) => OrderedFloat(*a) == OrderedFloat(*b),
        (a, b) => a == b,
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().zip(&other.0).all(|(a, b)| same_value(a, b))
    }
}

impl Eq for GroupKey {}

impl Hash for GroupKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

/// Per-command behaviour plugged into [`GroupExecutor`]
pub trait GroupStrategy: Send {
    /// State kept for one group
    type State: Send;

    fn create_state(&self) -> Self::State;

    /// Accumulate one row into its group. Returned rows are emitted
    /// immediately, ahead of any row still buffered by other groups.
    fn push(&mut self, state: &mut Self::State, key: &GroupKey, tuple: Tuple) -> Result<Vec<Tuple>>;

    /// Rows produced by a group once the whole input has been consumed
    fn result(&self, key: &GroupKey, state: Self::State) -> Result<Vec<Tuple>>;

    /// Rows produced when the input was empty
    fn finish_empty(&self) -> Result<Vec<Tuple>> {
        Ok(Vec::new())
    }

    fn output_schema(&self, input: &[ColumnInfo]) -> Vec<ColumnInfo>;
}

/// Executor bucketing its input by key and delegating to a strategy
pub struct GroupExecutor<S: GroupStrategy> {
    /// Child executor that produces tuples
    child: Box<dyn Executor>,
    /// Expressions whose values form the group key
    keys: Vec<Expression>,
    strategy: S,
    /// Live groups, in order of first appearance
    groups: IndexMap<GroupKey, S::State>,
    /// Rows ready to be returned
    pending: VecDeque<Tuple>,
    /// Whether the child is exhausted and every group finalized
    finished: bool,
    output_schema: Vec<ColumnInfo>,
    initialized: bool,
}

impl<S: GroupStrategy> GroupExecutor<S> {
    /// Create a grouping executor
    ///
    /// # Arguments
    /// * `child` - The child executor that produces tuples
    /// * `keys` - Expressions evaluated per row to form its group key
    /// * `strategy` - Per-group state and output rules
    pub fn with_strategy(child: Box<dyn Executor>, keys: Vec<Expression>, strategy: S) -> Self {
        Self {
            child,
            keys,
            strategy,
            groups: IndexMap::new(),
            pending: VecDeque::new(),
            finished: false,
            output_schema: Vec::new(),
            initialized: false,
        }
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    fn group_key(&self, tuple: &Tuple) -> Result<GroupKey> {
        let env = Environment::new(tuple);
        let values = self
            .keys
            .iter()
            .map(|key| key.value_of(&env))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(GroupKey(values))
    }

    fn accumulate(&mut self, tuple: Tuple) -> Result<()> {
        let key = self.group_key(&tuple)?;
        let state = self
            .groups
            .entry(key.clone())
            .or_insert_with(|| self.strategy.create_state());
        let emitted = self.strategy.push(state, &key, tuple)?;
        self.pending.extend(emitted);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let groups = std::mem::take(&mut self.groups);
        debug!("finalizing {} groups", groups.len());
        if groups.is_empty() {
            self.pending.extend(self.strategy.finish_empty()?);
        }
        for (key, state) in groups {
            self.pending.extend(self.strategy.result(&key, state)?);
        }
        self.finished = true;
        Ok(())
    }
}

impl<S: GroupStrategy> Executor for GroupExecutor<S> {
    fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }

        self.child.init()?;
        self.output_schema = self.strategy.output_schema(self.child.output_schema());
        self.groups.clear();
        self.pending.clear();
        self.finished = false;

        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Tuple>> {
        if !self.initialized {
            bail!("Executor not initialized. Call init() first.");
        }

        loop {
            if let Some(tuple) = self.pending.pop_front() {
                return Ok(Some(tuple));
            }
            if self.finished {
                return Ok(None);
            }
            match self.child.next()? {
                Some(tuple) => self.accumulate(tuple)?,
                None => self.finish()?,
            }
        }
    }

    fn output_schema(&self) -> &[ColumnInfo] {
        &self.output_schema
    }
}
