//! Limit executor implementation.
//!
//! Treats the whole input as one ordered group: every row is buffered in
//! arrival order, then `offset` rows are skipped and `limit` rows taken.
//! A limit of `-1` means "all remaining rows". Skipping past the end of the
//! input yields nothing rather than an error.

use crate::data::{ColumnInfo, Tuple};
use crate::executor::group::{GroupExecutor, GroupKey, GroupStrategy};
use crate::executor::Executor;
use anyhow::{bail, Result};

/// Limit value meaning "no limit"
pub const UNLIMITED: i64 = -1;

/// Skip `offset` rows, then keep at most `limit` (all when `limit` is -1)
pub fn window<T>(rows: Vec<T>, offset: usize, limit: i64) -> Vec<T> {
    let rest = rows.into_iter().skip(offset);
    match usize::try_from(limit) {
        Ok(limit) => rest.take(limit).collect(),
        Err(_) => rest.collect(),
    }
}

/// Validate a limit/offset pair
pub fn check_window(limit: i64, offset: i64) -> Result<usize> {
    if limit < UNLIMITED {
        bail!("limit must be -1 or non-negative, got {}", limit);
    }
    match usize::try_from(offset) {
        Ok(offset) => Ok(offset),
        Err(_) => bail!("offset must be non-negative, got {}", offset),
    }
}

/// Grouping strategy keeping the input as one ordered list
pub struct LimitStrategy {
    limit: i64,
    offset: usize,
}

impl GroupStrategy for LimitStrategy {
    type State = Vec<Tuple>;

    fn create_state(&self) -> Vec<Tuple> {
        Vec::new()
    }

    fn push(&mut self, rows: &mut Vec<Tuple>, _key: &GroupKey, tuple: Tuple) -> Result<Vec<Tuple>> {
        rows.push(tuple);
        Ok(Vec::new())
    }

    fn result(&self, _key: &GroupKey, rows: Vec<Tuple>) -> Result<Vec<Tuple>> {
        Ok(window(rows, self.offset, self.limit))
    }

    fn output_schema(&self, input: &[ColumnInfo]) -> Vec<ColumnInfo> {
        input.to_vec()
    }
}

/// Executor applying `head`/`LIMIT ... OFFSET ...`
pub type LimitExecutor = GroupExecutor<LimitStrategy>;

impl GroupExecutor<LimitStrategy> {
    /// Create a new limit executor
    ///
    /// # Arguments
    /// * `child` - The child executor that produces tuples
    /// * `limit` - Maximum number of rows to return, or -1 for all
    /// * `offset` - Number of rows to skip first; must be non-negative
    pub fn new(child: Box<dyn Executor>, limit: i64, offset: i64) -> Result<Self> {
        let offset = check_window(limit, offset)?;
        Ok(Self::with_strategy(child, Vec::new(), LimitStrategy { limit, offset }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ExprType, ExprValue};
    use crate::executor::collect;
    use crate::executor::testing::MockExecutor;

    fn letters() -> (Vec<Tuple>, Vec<ColumnInfo>) {
        let tuples = ["A", "B", "C", "D"]
            .iter()
            .map(|s| Tuple::from_pairs([("name", ExprValue::string(*s))]))
            .collect();
        (tuples, vec![ColumnInfo::new("name", ExprType::String)])
    }

    fn run(limit: i64, offset: i64) -> Result<Vec<ExprValue>> {
        let (tuples, schema) = letters();
        let child = MockExecutor::new(tuples, schema);
        let mut executor = LimitExecutor::new(Box::new(child), limit, offset)?;
        Ok(collect(&mut executor)?.iter().map(|t| t.resolve("name")).collect())
    }

    #[test]
    fn test_limit_with_offset() -> Result<()> {
        assert_eq!(run(1, 2)?, vec![ExprValue::string("C")]);
        assert_eq!(run(2, 0)?, vec![ExprValue::string("A"), ExprValue::string("B")]);
        Ok(())
    }

    #[test]
    fn test_offset_past_end_is_empty() -> Result<()> {
        assert!(run(5, 10)?.is_empty());
        assert!(run(UNLIMITED, 4)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_unlimited_keeps_everything() -> Result<()> {
        assert_eq!(run(UNLIMITED, 0)?.len(), 4);
        assert_eq!(run(UNLIMITED, 1)?.len(), 3);
        assert!(run(0, 0)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_invalid_window() {
        let (tuples, schema) = letters();
        assert!(LimitExecutor::new(Box::new(MockExecutor::new(tuples.clone(), schema.clone())), 1, -1).is_err());
        assert!(LimitExecutor::new(Box::new(MockExecutor::new(tuples, schema)), -2, 0).is_err());
    }

    #[test]
    fn test_empty_input() -> Result<()> {
        let child = MockExecutor::new(vec![], vec![]);
        let mut executor = LimitExecutor::new(Box::new(child), 3, 0)?;
        assert!(collect(&mut executor)?.is_empty());
        Ok(())
    }
}
