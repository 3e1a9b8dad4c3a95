//! Query planning.
//!
//! The planner works in two steps:
//! 1. Logical plan: the resolved command chain handed over by the analyzer,
//!    with typed expressions and per-command [`Argument`] lists
//! 2. Physical plan: a chain of [`Executor`](crate::executor::Executor)s
//!    built by [`PhysicalPlanner`] against a storage engine

pub mod logical;
pub mod physical;

pub use logical::{Argument, LogicalPlan, SortField};
pub use physical::PhysicalPlanner;
