//! Sort executor implementation.
//!
//! This executor sorts tuples from a child executor based on one or more
//! sort criteria. It materializes all tuples from the child executor into
//! memory before sorting, then returns them in the sorted order, applying an
//! optional count/offset window afterwards.
//!
//! Supports:
//! - Multi-field sorting (`sort a, - b`)
//! - NULL handling (NULLs first or last), independent of the sort order
//! - Per-field comparison type: auto, str, num or ip
//! - Stable ordering of rows whose keys compare equal

use crate::data::{ColumnInfo, ExprValue, Tuple};
use crate::executor::limit::{check_window, window, UNLIMITED};
use crate::executor::Executor;
use crate::expression::{check_references, Environment, Expression};
use anyhow::{bail, Result};
use log::debug;
use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::net::IpAddr;

/// Sort order for a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn reverse(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

/// NULL ordering preference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullOrder {
    First,
    Last,
}

/// How sort key values are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortType {
    /// Natural ordering of the value's own type
    #[default]
    Auto,
    /// Lexicographic on the text form
    Str,
    /// Numeric; values that are not numbers sort after all numbers
    Num,
    /// IP address; values that are not addresses sort after all addresses
    Ip,
}

impl SortType {
    /// Parse a `type` sort argument
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "auto" => Ok(SortType::Auto),
            "str" => Ok(SortType::Str),
            "num" => Ok(SortType::Num),
            "ip" => Ok(SortType::Ip),
            other => bail!("unsupported sort type: {}", other),
        }
    }
}

/// Sort criteria for a single field
#[derive(Debug, Clone)]
pub struct SortCriteria {
    /// Expression producing the sort key
    pub expr: Expression,
    /// Sort order (ASC/DESC)
    pub order: SortOrder,
    /// NULL ordering (FIRST/LAST)
    pub null_order: NullOrder,
    pub sort_type: SortType,
}

impl SortCriteria {
    /// Create new sort criteria with default NULL ordering
    /// (NULLs first for ASC, NULLs last for DESC)
    pub fn new(expr: Expression, order: SortOrder) -> Self {
        let null_order = match order {
            SortOrder::Asc => NullOrder::First,
            SortOrder::Desc => NullOrder::Last,
        };
        Self::with_null_order(expr, order, null_order)
    }

    /// Create new sort criteria with explicit NULL ordering
    pub fn with_null_order(expr: Expression, order: SortOrder, null_order: NullOrder) -> Self {
        Self {
            expr,
            order,
            null_order,
            sort_type: SortType::Auto,
        }
    }

    pub fn with_type(mut self, sort_type: SortType) -> Self {
        self.sort_type = sort_type;
        self
    }

    /// Flip the sort order; NULL placement is kept
    pub fn reversed(mut self) -> Self {
        self.order = self.order.reverse();
        self
    }

    fn key(&self, env: &Environment<'_>) -> Result<SortKey> {
        let value = self.expr.value_of(env)?;
        if value.is_null_or_missing() {
            return Ok(SortKey::Empty);
        }
        Ok(match self.sort_type {
            SortType::Auto => SortKey::Value(value),
            SortType::Str => SortKey::Text(value.to_text()),
            SortType::Num => SortKey::Number(as_number(&value).map(OrderedFloat)),
            SortType::Ip => SortKey::Ip(value.to_text().trim().parse().ok()),
        })
    }
}

fn as_number(value: &ExprValue) -> Option<f64> {
    if value.is_number() {
        return value.double_value().ok();
    }
    value.to_text().trim().parse().ok()
}

/// Precomputed sort key of one row for one criterion
#[derive(Debug)]
enum SortKey {
    Empty,
    Value(ExprValue),
    Text(String),
    Number(Option<OrderedFloat<f64>>),
    Ip(Option<IpAddr>),
}

/// Order two optional keys with the unparsable ones last
fn parsed_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_present(a: &SortKey, b: &SortKey) -> Ordering {
    match (a, b) {
        (SortKey::Value(a), SortKey::Value(b)) => a
            .compare(b)
            .unwrap_or_else(|_| a.expr_type().cmp(&b.expr_type())),
        (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
        (SortKey::Number(a), SortKey::Number(b)) => parsed_last(a, b),
        (SortKey::Ip(a), SortKey::Ip(b)) => parsed_last(a, b),
        _ => Ordering::Equal,
    }
}

fn compare_keys(a: &SortKey, b: &SortKey, criteria: &SortCriteria) -> Ordering {
    match (a, b) {
        (SortKey::Empty, SortKey::Empty) => Ordering::Equal,
        (SortKey::Empty, _) => match criteria.null_order {
            NullOrder::First => Ordering::Less,
            NullOrder::Last => Ordering::Greater,
        },
        (_, SortKey::Empty) => match criteria.null_order {
            NullOrder::First => Ordering::Greater,
            NullOrder::Last => Ordering::Less,
        },
        (a, b) => {
            let cmp = compare_present(a, b);
            match criteria.order {
                SortOrder::Asc => cmp,
                SortOrder::Desc => cmp.reverse(),
            }
        }
    }
}

/// Executor that sorts tuples based on multiple criteria
pub struct SortExecutor {
    /// Child executor that produces tuples
    child: Box<dyn Executor>,
    /// Sort criteria (in order of precedence)
    criteria: Vec<SortCriteria>,
    /// Rows kept after sorting, -1 for all
    count: i64,
    /// Rows skipped after sorting
    offset: usize,
    /// Output schema (same as child's schema)
    output_schema: Vec<ColumnInfo>,
    /// Materialized and sorted tuples
    sorted_tuples: Vec<Tuple>,
    /// Current position in sorted_tuples
    current_position: usize,
    /// Whether the executor has been initialized
    initialized: bool,
}

impl SortExecutor {
    /// Create a new sort executor returning every row
    ///
    /// # Arguments
    /// * `child` - The child executor that produces tuples
    /// * `criteria` - Sort criteria in order of precedence
    pub fn new(child: Box<dyn Executor>, criteria: Vec<SortCriteria>) -> Self {
        Self {
            child,
            criteria,
            count: UNLIMITED,
            offset: 0,
            output_schema: Vec::new(),
            sorted_tuples: Vec::new(),
            current_position: 0,
            initialized: false,
        }
    }

    /// Create a sort executor that keeps `count` rows after skipping `offset`.
    ///
    /// A count of 0 means "all rows", like -1.
    pub fn with_window(
        child: Box<dyn Executor>,
        criteria: Vec<SortCriteria>,
        count: i64,
        offset: i64,
    ) -> Result<Self> {
        let count = if count == 0 { UNLIMITED } else { count };
        let offset = check_window(count, offset)?;
        let mut executor = Self::new(child, criteria);
        executor.count = count;
        executor.offset = offset;
        Ok(executor)
    }

    /// Sort the materialized tuples based on the criteria
    fn sort_tuples(&mut self, tuples: Vec<Tuple>) -> Result<()> {
        let mut keyed = Vec::with_capacity(tuples.len());
        for tuple in tuples {
            let env = Environment::new(&tuple);
            let keys = self
                .criteria
                .iter()
                .map(|criteria| criteria.key(&env))
                .collect::<Result<Vec<_>>>()?;
            keyed.push((keys, tuple));
        }

        keyed.sort_by(|(a, _), (b, _)| {
            self.criteria
                .iter()
                .zip(a.iter().zip(b))
                .map(|(criteria, (a, b))| compare_keys(a, b, criteria))
                .find(|cmp| *cmp != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });

        let sorted = keyed.into_iter().map(|(_, tuple)| tuple).collect();
        self.sorted_tuples = window(sorted, self.offset, self.count);
        Ok(())
    }
}

impl Executor for SortExecutor {
    fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }

        // Initialize child executor
        self.child.init()?;

        // Copy the child's output schema
        self.output_schema = self.child.output_schema().to_vec();

        for criteria in &self.criteria {
            check_references(&criteria.expr, &self.output_schema)?;
        }

        // Materialize all tuples from child
        let mut tuples = Vec::new();
        while let Some(tuple) = self.child.next()? {
            tuples.push(tuple);
        }
        debug!("sorting {} tuples on {} keys", tuples.len(), self.criteria.len());

        self.sort_tuples(tuples)?;
        self.current_position = 0;

        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Tuple>> {
        if !self.initialized {
            bail!("Executor not initialized. Call init() first.");
        }

        if self.current_position >= self.sorted_tuples.len() {
            return Ok(None);
        }

        let tuple = self.sorted_tuples[self.current_position].clone();
        self.current_position += 1;
        Ok(Some(tuple))
    }

    fn output_schema(&self) -> &[ColumnInfo] {
        &self.output_schema
    }
}
