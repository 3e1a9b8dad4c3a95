pub mod config;
pub mod data;
pub mod executor;
pub mod expression;
pub mod function;
pub mod planner;
pub mod utils;
