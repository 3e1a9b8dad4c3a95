//! Function layer: registration, overload resolution and the built-in
//! libraries.
//!
//! This module provides:
//!
//! - **FunctionSignature / FunctionResolver**: per-name overload sets and
//!   most-specific-match resolution over the widening relation
//! - **BuiltinFunctionRepository**: the immutable name to resolver mapping,
//!   built once and shared by reference
//! - **guard**: the uniform NULL/MISSING short-circuit wrapped around every
//!   scalar body
//! - Libraries: arithmetic, predicate, math, datetime, text and aggregate

pub mod aggregate;
pub mod arithmetic;
pub mod datetime;
pub mod guard;
pub mod math;
pub mod name;
pub mod predicate;
pub mod repository;
pub mod resolver;
pub mod signature;
pub mod text;

pub use aggregate::{AggregationKind, AggregationState, Aggregator, NamedAggregator};
pub use name::FunctionName;
pub use repository::{BuiltinFunctionRepository, RepositoryBuilder};
pub use resolver::{FunctionBuilder, FunctionResolver};
pub use signature::FunctionSignature;
