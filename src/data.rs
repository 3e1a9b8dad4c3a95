//! Data layer: the typed value model shared by every other layer.
//!
//! This module provides:
//!
//! - **ExprType**: the closed set of value types and the widening relation
//!   used by function overload resolution
//! - **ExprValue**: tagged runtime values, including the NULL and MISSING
//!   sentinels
//! - **Tuple**: an insertion-ordered mapping of field name to value
//! - **datetime**: strict temporal literal parsing and the compact numeric
//!   date encodings

pub mod datetime;
pub mod tuple;
pub mod types;
pub mod value;

pub use tuple::{ColumnInfo, Schema, Tuple};
pub use types::ExprType;
pub use value::ExprValue;
