//! Logical query plan representation.
//!
//! A logical plan is the already-resolved output of the analyzer: a chain of
//! commands over one named relation, every expression bound to concrete
//! function signatures. Per-command options travel as named [`Argument`]s;
//! the `*_arguments` functions give each command's default option list.

use crate::config::Dialect;
use crate::data::ExprValue;
use crate::executor::RareTopNCommand;
use crate::expression::{Expression, NamedExpression, ReferenceExpression};
use crate::function::NamedAggregator;

/// Named command option such as `count=10`
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: String,
    pub value: ExprValue,
}

impl Argument {
    pub fn new(name: impl Into<String>, value: impl Into<ExprValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Find an option by name
pub fn argument<'a>(arguments: &'a [Argument], name: &str) -> Option<&'a ExprValue> {
    arguments
        .iter()
        .find(|arg| arg.name == name)
        .map(|arg| &arg.value)
}

/// Replace defaults with any given option of the same name; unknown names
/// are appended.
pub fn merge_arguments(defaults: Vec<Argument>, given: Vec<Argument>) -> Vec<Argument> {
    let mut merged = defaults;
    for arg in given {
        match merged.iter_mut().find(|existing| existing.name == arg.name) {
            Some(existing) => existing.value = arg.value,
            None => merged.push(arg),
        }
    }
    merged
}

/// `fields` defaults
pub fn fields_arguments() -> Vec<Argument> {
    vec![Argument::new("exclude", false)]
}

/// `stats` defaults
pub fn stats_arguments() -> Vec<Argument> {
    vec![
        Argument::new("partitions", 1),
        Argument::new("allnum", false),
        Argument::new("delim", " "),
        Argument::new("dedupsplit", false),
    ]
}

/// `dedup` defaults
pub fn dedup_arguments() -> Vec<Argument> {
    vec![
        Argument::new("number", 1),
        Argument::new("keepevents", false),
        Argument::new("keepempty", false),
        Argument::new("consecutive", false),
    ]
}

/// `sort` defaults; the row count depends on the dialect
pub fn sort_arguments(dialect: Dialect) -> Vec<Argument> {
    vec![
        Argument::new("count", dialect.default_sort_count()),
        Argument::new("desc", false),
    ]
}

/// Defaults of one `sort` field. `exclude=true` sorts that field descending.
pub fn sort_field_arguments() -> Vec<Argument> {
    vec![
        Argument::new("exclude", false),
        Argument::new("type", ExprValue::Null),
    ]
}

/// `rare`/`top` defaults
pub fn rare_top_n_arguments(results: usize) -> Vec<Argument> {
    vec![Argument::new(
        "noOfResults",
        i64::try_from(results).unwrap_or(i64::MAX),
    )]
}

/// One sort key with its options
#[derive(Debug, Clone, PartialEq)]
pub struct SortField {
    pub expr: Expression,
    pub arguments: Vec<Argument>,
}

impl SortField {
    /// Ascending sort field with default options
    pub fn new(expr: Expression) -> Self {
        Self {
            expr,
            arguments: sort_field_arguments(),
        }
    }

    /// Descending sort field (`sort - field`)
    pub fn descending(expr: Expression) -> Self {
        Self::new(expr).with_argument(Argument::new("exclude", true))
    }

    pub fn with_argument(mut self, arg: Argument) -> Self {
        self.arguments = merge_arguments(self.arguments, vec![arg]);
        self
    }
}

/// Logical plan node
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalPlan {
    /// Scan a named relation
    Relation { name: String },

    /// Keep rows whose condition is TRUE
    Filter {
        input: Box<LogicalPlan>,
        condition: Expression,
    },

    /// `fields`: keep (or with `exclude=true`, drop) fields
    Project {
        input: Box<LogicalPlan>,
        fields: Vec<NamedExpression>,
        arguments: Vec<Argument>,
    },

    /// `eval`: compute fields
    Eval {
        input: Box<LogicalPlan>,
        assignments: Vec<NamedExpression>,
    },

    /// `stats`: aggregate per group
    Aggregation {
        input: Box<LogicalPlan>,
        aggregators: Vec<NamedAggregator>,
        group_by: Vec<NamedExpression>,
        arguments: Vec<Argument>,
    },

    /// `sort`: order rows, then keep `count` of them
    Sort {
        input: Box<LogicalPlan>,
        fields: Vec<SortField>,
        arguments: Vec<Argument>,
    },

    /// `head`/`LIMIT`: skip `offset` rows and keep `limit` (-1 for all)
    Limit {
        input: Box<LogicalPlan>,
        limit: i64,
        offset: i64,
    },

    /// `dedup`: drop rows repeating earlier field values
    Dedup {
        input: Box<LogicalPlan>,
        fields: Vec<ReferenceExpression>,
        arguments: Vec<Argument>,
    },

    /// `rare`/`top`: least or most common value combinations
    RareTopN {
        input: Box<LogicalPlan>,
        command: RareTopNCommand,
        fields: Vec<NamedExpression>,
        group_by: Vec<NamedExpression>,
        arguments: Vec<Argument>,
    },
}

impl LogicalPlan {
    pub fn relation(name: impl Into<String>) -> Self {
        LogicalPlan::Relation { name: name.into() }
    }

    pub fn filter(self, condition: Expression) -> Self {
        LogicalPlan::Filter {
            input: Box::new(self),
            condition,
        }
    }

    pub fn project(self, fields: Vec<NamedExpression>) -> Self {
        LogicalPlan::Project {
            input: Box::new(self),
            fields,
            arguments: fields_arguments(),
        }
    }

    /// `fields - a, b`
    pub fn project_exclude(self, fields: Vec<NamedExpression>) -> Self {
        LogicalPlan::Project {
            input: Box::new(self),
            fields,
            arguments: merge_arguments(fields_arguments(), vec![Argument::new("exclude", true)]),
        }
    }

    pub fn eval(self, assignments: Vec<NamedExpression>) -> Self {
        LogicalPlan::Eval {
            input: Box::new(self),
            assignments,
        }
    }

    pub fn aggregate(self, aggregators: Vec<NamedAggregator>, group_by: Vec<NamedExpression>) -> Self {
        LogicalPlan::Aggregation {
            input: Box::new(self),
            aggregators,
            group_by,
            arguments: stats_arguments(),
        }
    }

    pub fn sort(self, dialect: Dialect, fields: Vec<SortField>, arguments: Vec<Argument>) -> Self {
        LogicalPlan::Sort {
            input: Box::new(self),
            fields,
            arguments: merge_arguments(sort_arguments(dialect), arguments),
        }
    }

    pub fn limit(self, limit: i64, offset: i64) -> Self {
        LogicalPlan::Limit {
            input: Box::new(self),
            limit,
            offset,
        }
    }

    pub fn dedup(self, fields: Vec<ReferenceExpression>, arguments: Vec<Argument>) -> Self {
        LogicalPlan::Dedup {
            input: Box::new(self),
            fields,
            arguments: merge_arguments(dedup_arguments(), arguments),
        }
    }

    pub fn rare_top_n(
        self,
        command: RareTopNCommand,
        fields: Vec<NamedExpression>,
        group_by: Vec<NamedExpression>,
        arguments: Vec<Argument>,
    ) -> Self {
        LogicalPlan::RareTopN {
            input: Box::new(self),
            command,
            fields,
            group_by,
            arguments,
        }
    }

    /// Get the child plan, if any
    pub fn input(&self) -> Option<&LogicalPlan> {
        match self {
            LogicalPlan::Relation { .. } => None,
            LogicalPlan::Filter { input, .. }
            | LogicalPlan::Project { input, .. }
            | LogicalPlan::Eval { input, .. }
            | LogicalPlan::Aggregation { input, .. }
            | LogicalPlan::Sort { input, .. }
            | LogicalPlan::Limit { input, .. }
            | LogicalPlan::Dedup { input, .. }
            | LogicalPlan::RareTopN { input, .. } => Some(input),
        }
    }

    /// Get a human-readable explanation of this plan
    pub fn explain(&self) -> String {
        let mut lines = Vec::new();
        let mut node = Some(self);
        let mut depth = 0;
        while let Some(plan) = node {
            lines.push(format!("{}{}", "  ".repeat(depth), plan.describe()));
            node = plan.input();
            depth += 1;
        }
        lines.join("\n")
    }

    fn describe(&self) -> String {
        fn names(fields: &[NamedExpression]) -> String {
            fields
                .iter()
                .map(|field| field.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        }

        match self {
            LogicalPlan::Relation { name } => format!("Relation: {}", name),
            LogicalPlan::Filter { condition, .. } => format!("Filter: {}", condition),
            LogicalPlan::Project { fields, .. } => format!("Project: {}", names(fields)),
            LogicalPlan::Eval { assignments, .. } => {
                let assignments = assignments
                    .iter()
                    .map(|a| format!("{} = {}", a.name, a.expr))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("Eval: {}", assignments)
            }
            LogicalPlan::Aggregation {
                aggregators,
                group_by,
                ..
            } => {
                let aggregators = aggregators
                    .iter()
                    .map(|named| named.aggregator.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("Aggregation: {} by [{}]", aggregators, names(group_by))
            }
            LogicalPlan::Sort { fields, .. } => {
                let fields = fields
                    .iter()
                    .map(|field| field.expr.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("Sort: {}", fields)
            }
            LogicalPlan::Limit { limit, offset, .. } => format!("Limit: {} OFFSET {}", limit, offset),
            LogicalPlan::Dedup { fields, .. } => {
                let fields = fields
                    .iter()
                    .map(|field| field.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("Dedup: {}", fields)
            }
            LogicalPlan::RareTopN {
                command,
                fields,
                group_by,
                ..
            } => format!("{:?}: {} by [{}]", command, names(fields), names(group_by)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ExprType;
    use crate::expression::dsl;

    #[test]
    fn test_default_arguments() {
        let stats = stats_arguments();
        assert_eq!(argument(&stats, "partitions"), Some(&ExprValue::Integer(1)));
        assert_eq!(argument(&stats, "delim"), Some(&ExprValue::string(" ")));

        let dedup = dedup_arguments();
        assert_eq!(argument(&dedup, "number"), Some(&ExprValue::Integer(1)));
        assert_eq!(argument(&dedup, "consecutive"), Some(&ExprValue::Boolean(false)));

        assert_eq!(argument(&sort_arguments(Dialect::Ppl), "count"), Some(&ExprValue::Long(1000)));
        assert_eq!(argument(&sort_arguments(Dialect::Sql), "count"), Some(&ExprValue::Long(-1)));

        let field = sort_field_arguments();
        assert_eq!(argument(&field, "exclude"), Some(&ExprValue::Boolean(false)));
        assert!(argument(&field, "type").is_some_and(ExprValue::is_null));
        assert!(argument(&field, "nulls").is_none());
    }

    #[test]
    fn test_merge_arguments() {
        let merged = merge_arguments(
            dedup_arguments(),
            vec![Argument::new("number", 3), Argument::new("extra", true)],
        );
        assert_eq!(merged.len(), 5);
        assert_eq!(argument(&merged, "number"), Some(&ExprValue::Integer(3)));
        assert_eq!(merged[0].name, "number");
        assert_eq!(merged[4].name, "extra");
    }

    #[test]
    fn test_sort_field_descending() {
        let field = SortField::descending(dsl::reference("a", ExprType::Integer));
        assert_eq!(argument(&field.arguments, "exclude"), Some(&ExprValue::Boolean(true)));
    }

    #[test]
    fn test_explain() {
        let plan = LogicalPlan::relation("people")
            .project(vec![dsl::named("name", dsl::reference("name", ExprType::String))])
            .limit(5, 0);
        assert_eq!(plan.explain(), "Limit: 5 OFFSET 0\n  Project: name\n    Relation: people");
    }
}
