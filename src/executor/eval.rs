//! Eval executor: computes new fields from existing ones.
//!
//! Assignments run left to right against the row as updated so far, so a
//! later assignment can read a field an earlier one produced. Assigning to an
//! existing field overwrites it in place; a new field is appended.

use crate::data::{ColumnInfo, Tuple};
use crate::executor::Executor;
use crate::expression::{check_references, Environment, NamedExpression};
use anyhow::{bail, Result};

/// Executor appending or overwriting computed fields
pub struct EvalExecutor {
    /// Child executor that produces tuples
    child: Box<dyn Executor>,
    /// Assignments applied in order
    assignments: Vec<NamedExpression>,
    output_schema: Vec<ColumnInfo>,
    initialized: bool,
}

impl EvalExecutor {
    /// Create a new eval executor
    ///
    /// # Arguments
    /// * `child` - The child executor that produces tuples
    /// * `assignments` - `name = expression` pairs, applied in order
    pub fn new(child: Box<dyn Executor>, assignments: Vec<NamedExpression>) -> Self {
        Self {
            child,
            assignments,
            output_schema: Vec::new(),
            initialized: false,
        }
    }
}

impl Executor for EvalExecutor {
    fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }

        self.child.init()?;
        let mut schema = self.child.output_schema().to_vec();
        for assignment in &self.assignments {
            check_references(&assignment.expr, &schema)?;
            let column = ColumnInfo::new(assignment.name.clone(), assignment.expr.expr_type());
            match schema.iter_mut().find(|c| c.name == assignment.name) {
                Some(existing) => *existing = column,
                None => schema.push(column),
            }
        }
        self.output_schema = schema;

        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Tuple>> {
        if !self.initialized {
            bail!("Executor not initialized. Call init() first.");
        }

        let Some(mut tuple) = self.child.next()? else {
            return Ok(None);
        };
        for assignment in &self.assignments {
            let value = assignment.expr.value_of(&Environment::new(&tuple))?;
            tuple.insert(assignment.name.clone(), value);
        }
        Ok(Some(tuple))
    }

    fn output_schema(&self) -> &[ColumnInfo] {
        &self.output_schema
    }
}
