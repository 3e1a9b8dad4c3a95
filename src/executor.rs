//! Executor layer for query execution.
//!
//! This module implements the Volcano-style iterator model for executing
//! physical plans. Each executor pulls tuples from its single child one at a
//! time via `next()`, transforms them, and hands them downstream.
//!
//! Operators:
//! - **RelationExecutor**: leaf scan over a [`RowSource`]
//! - **FilterExecutor / ProjectionExecutor / EvalExecutor**: streaming
//! - **SortExecutor**: materializes, sorts, then applies count/offset
//! - **GroupExecutor**: one grouping engine driven by a [`GroupStrategy`];
//!   aggregation, dedup, rare/top and limit are strategies

use crate::data::{ColumnInfo, Tuple};
use crate::expression::{ErrorKind, ExpressionError};
use anyhow::Result;

pub mod aggregate;
pub mod dedup;
pub mod eval;
pub mod filter;
pub mod group;
pub mod limit;
pub mod projection;
pub mod rare_top_n;
pub mod relation;
pub mod sort;

pub use aggregate::{AggregationExecutor, AggregationStrategy};
pub use dedup::{DedupExecutor, DedupOptions, DedupStrategy};
pub use eval::EvalExecutor;
pub use filter::FilterExecutor;
pub use group::{GroupExecutor, GroupKey, GroupStrategy};
pub use limit::{LimitExecutor, LimitStrategy};
pub use projection::ProjectionExecutor;
pub use rare_top_n::{RareTopNCommand, RareTopNExecutor, RareTopNStrategy};
pub use relation::{MemoryStorage, RelationExecutor, RowSource, StorageEngine};
pub use sort::{NullOrder, SortCriteria, SortExecutor, SortOrder, SortType};

/// Trait for all query executors
pub trait Executor: Send {
    /// Initialize the executor. This must be called before `next()`.
    fn init(&mut self) -> Result<()>;

    /// Get the next tuple from the executor.
    /// Returns None when there are no more tuples.
    fn next(&mut self) -> Result<Option<Tuple>>;

    /// Get the output schema of this executor
    fn output_schema(&self) -> &[ColumnInfo];
}

/// Initialize `executor` and drain it
pub fn collect(executor: &mut dyn Executor) -> Result<Vec<Tuple>> {
    executor.init()?;
    let mut tuples = Vec::new();
    while let Some(tuple) = executor.next()? {
        tuples.push(tuple);
    }
    Ok(tuples)
}

/// Classify a query failure. Anything that is not an expression error came
/// from below the core and is reported as upstream.
pub fn classify(err: &anyhow::Error) -> ErrorKind {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ExpressionError>())
        .map_or(ErrorKind::Upstream, ExpressionError::kind)
}
