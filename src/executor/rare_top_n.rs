//! Rare/top executor: the least or most common value combinations.
//!
//! Within each group-by bucket the executor counts how often each
//! combination of the target fields occurs, then emits the `n` combinations
//! with the highest (`top`) or lowest (`rare`) counts. Equal counts keep
//! the order in which the combinations first appeared.

use crate::data::{ColumnInfo, Tuple};
use crate::executor::group::{GroupExecutor, GroupKey, GroupStrategy};
use crate::executor::Executor;
use crate::expression::{Environment, NamedExpression};
use anyhow::Result;
use indexmap::IndexMap;

/// Default number of combinations returned per group
pub const DEFAULT_RESULTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RareTopNCommand {
    Top,
    Rare,
}

/// Grouping strategy counting value combinations per group
pub struct RareTopNStrategy {
    command: RareTopNCommand,
    results: usize,
    fields: Vec<NamedExpression>,
    group_by: Vec<NamedExpression>,
}

impl GroupStrategy for RareTopNStrategy {
    /// Occurrence count per field value combination
    type State = IndexMap<GroupKey, usize>;

    fn create_state(&self) -> Self::State {
        IndexMap::new()
    }

    fn push(&mut self, counts: &mut Self::State, _key: &GroupKey, tuple: Tuple) -> Result<Vec<Tuple>> {
        let env = Environment::new(&tuple);
        let values = self
            .fields
            .iter()
            .map(|field| field.expr.value_of(&env))
            .collect::<Result<Vec<_>, _>>()?;
        *counts.entry(GroupKey(values)).or_insert(0) += 1;
        Ok(Vec::new())
    }

    fn result(&self, key: &GroupKey, counts: Self::State) -> Result<Vec<Tuple>> {
        let mut ranked: Vec<(GroupKey, usize)> = counts.into_iter().collect();
        match self.command {
            RareTopNCommand::Top => ranked.sort_by(|a, b| b.1.cmp(&a.1)),
            RareTopNCommand::Rare => ranked.sort_by(|a, b| a.1.cmp(&b.1)),
        }

        Ok(ranked
            .into_iter()
            .take(self.results)
            .map(|(values, _)| {
                let mut tuple = Tuple::new();
                let named = self.group_by.iter().zip(key.values());
                for (field, value) in named.chain(self.fields.iter().zip(values.values())) {
                    if !value.is_missing() {
                        tuple.insert(field.name.clone(), value.clone());
                    }
                }
                tuple
            })
            .collect())
    }

    fn output_schema(&self, _input: &[ColumnInfo]) -> Vec<ColumnInfo> {
        self.group_by
            .iter()
            .chain(&self.fields)
            .map(|field| ColumnInfo::new(field.name.clone(), field.expr.expr_type()))
            .collect()
    }
}

/// Executor applying the `rare` and `top` commands
pub type RareTopNExecutor = GroupExecutor<RareTopNStrategy>;

impl GroupExecutor<RareTopNStrategy> {
    /// Create a new rare/top executor
    ///
    /// # Arguments
    /// * `child` - The child executor that produces tuples
    /// * `command` - Whether the most or least frequent combinations win
    /// * `results` - Combinations returned per group
    /// * `fields` - Fields whose value combinations are counted
    /// * `group_by` - Expressions splitting the input into groups
    pub fn new(
        child: Box<dyn Executor>,
        command: RareTopNCommand,
        results: usize,
        fields: Vec<NamedExpression>,
        group_by: Vec<NamedExpression>,
    ) -> Self {
        let keys = group_by.iter().map(|field| field.expr.clone()).collect();
        let strategy = RareTopNStrategy {
            command,
            results,
            fields,
            group_by,
        };
        Self::with_strategy(child, keys, strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ExprType, ExprValue};
    use crate::executor::collect;
    use crate::executor::testing::MockExecutor;
    use crate::expression::dsl;

    fn schema() -> Vec<ColumnInfo> {
        vec![
            ColumnInfo::new("country", ExprType::String),
            ColumnInfo::new("browser", ExprType::String),
        ]
    }

    fn visits() -> Vec<Tuple> {
        [
            ("us", "chrome"),
            ("us", "firefox"),
            ("fr", "safari"),
            ("us", "chrome"),
            ("fr", "chrome"),
            ("us", "edge"),
            ("fr", "safari"),
            ("us", "chrome"),
            ("us", "firefox"),
        ]
        .iter()
        .map(|(country, browser)| {
            Tuple::from_pairs([
                ("country", ExprValue::string(*country)),
                ("browser", ExprValue::string(*browser)),
            ])
        })
        .collect()
    }

    fn field(name: &str) -> NamedExpression {
        dsl::named(name, dsl::reference(name, ExprType::String))
    }

    fn browsers(tuples: &[Tuple]) -> Vec<ExprValue> {
        tuples.iter().map(|t| t.resolve("browser")).collect()
    }

    #[test]
    fn test_top() -> Result<()> {
        let child = MockExecutor::new(visits(), schema());
        let mut top = RareTopNExecutor::new(
            Box::new(child),
            RareTopNCommand::Top,
            2,
            vec![field("browser")],
            vec![],
        );

        let result = collect(&mut top)?;
        assert_eq!(
            browsers(&result),
            vec![ExprValue::string("chrome"), ExprValue::string("firefox")]
        );
        let columns: Vec<_> = top.output_schema().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(columns, vec!["browser"]);
        Ok(())
    }

    #[test]
    fn test_rare_keeps_first_seen_order_on_ties() -> Result<()> {
        let child = MockExecutor::new(visits(), schema());
        let mut rare = RareTopNExecutor::new(
            Box::new(child),
            RareTopNCommand::Rare,
            DEFAULT_RESULTS,
            vec![field("browser")],
            vec![],
        );

        let result = collect(&mut rare)?;
        assert_eq!(
            browsers(&result),
            vec![
                ExprValue::string("edge"),
                ExprValue::string("firefox"),
                ExprValue::string("safari"),
                ExprValue::string("chrome")
            ]
        );
        Ok(())
    }

    #[test]
    fn test_top_by_group() -> Result<()> {
        let child = MockExecutor::new(visits(), schema());
        let mut top = RareTopNExecutor::new(
            Box::new(child),
            RareTopNCommand::Top,
            1,
            vec![field("browser")],
            vec![field("country")],
        );

        let result = collect(&mut top)?;
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].resolve("country"), ExprValue::string("us"));
        assert_eq!(result[0].resolve("browser"), ExprValue::string("chrome"));
        assert_eq!(result[1].resolve("country"), ExprValue::string("fr"));
        assert_eq!(result[1].resolve("browser"), ExprValue::string("safari"));

        let names: Vec<_> = result[0].names().cloned().collect();
        assert_eq!(names, vec!["country", "browser"]);
        Ok(())
    }
}
