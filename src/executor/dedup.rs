//! Dedup executor implementation.
//!
//! Keeps the first `number` rows for every distinct combination of the dedup
//! fields and streams them out in input order.
//!
//! - `keepevents`: later duplicates are still emitted, with the dedup fields
//!   removed
//! - `keepempty`: rows with a NULL or MISSING dedup field are kept as is;
//!   otherwise they are dropped
//! - `consecutive`: only adjacent duplicates are collapsed, so a key that
//!   reappears after a different key starts counting again

use crate::data::{ColumnInfo, Tuple};
use crate::executor::group::{GroupExecutor, GroupKey, GroupStrategy};
use crate::executor::Executor;
use crate::expression::{Expression, ReferenceExpression};
use anyhow::{bail, Result};
use log::trace;

/// Options of the `dedup` command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupOptions {
    /// Rows kept per distinct key
    pub number: usize,
    pub keepevents: bool,
    pub keepempty: bool,
    pub consecutive: bool,
}

impl Default for DedupOptions {
    fn default() -> Self {
        Self {
            number: 1,
            keepevents: false,
            keepempty: false,
            consecutive: false,
        }
    }
}

/// Grouping strategy counting rows per dedup key
pub struct DedupStrategy {
    fields: Vec<String>,
    options: DedupOptions,
    /// Key of the previous grouped row, for `consecutive`
    last: Option<GroupKey>,
}

impl DedupStrategy {
    fn strip_fields(&self, mut tuple: Tuple) -> Tuple {
        for field in &self.fields {
            tuple.remove(field);
        }
        tuple
    }
}

impl GroupStrategy for DedupStrategy {
    type State = usize;

    fn create_state(&self) -> usize {
        0
    }

    fn push(&mut self, seen: &mut usize, key: &GroupKey, tuple: Tuple) -> Result<Vec<Tuple>> {
        if key.has_empty() {
            return Ok(if self.options.keepempty {
                vec![tuple]
            } else {
                Vec::new()
            });
        }

        if self.options.consecutive && self.last.as_ref() != Some(key) {
            *seen = 0;
        }
        self.last = Some(key.clone());

        *seen += 1;
        if *seen <= self.options.number {
            Ok(vec![tuple])
        } else if self.options.keepevents {
            Ok(vec![self.strip_fields(tuple)])
        } else {
            trace!("dropping duplicate {}", tuple);
            Ok(Vec::new())
        }
    }

    fn result(&self, _key: &GroupKey, _seen: usize) -> Result<Vec<Tuple>> {
        Ok(Vec::new())
    }

    fn output_schema(&self, input: &[ColumnInfo]) -> Vec<ColumnInfo> {
        input.to_vec()
    }
}

/// Executor applying the `dedup` command
pub type DedupExecutor = GroupExecutor<DedupStrategy>;

impl GroupExecutor<DedupStrategy> {
    /// Create a new dedup executor
    ///
    /// # Arguments
    /// * `child` - The child executor that produces tuples
    /// * `fields` - Fields whose combined values identify duplicates
    /// * `options` - Command options; `number` must be at least 1
    pub fn new(
        child: Box<dyn Executor>,
        fields: Vec<ReferenceExpression>,
        options: DedupOptions,
    ) -> Result<Self> {
        if options.number == 0 {
            bail!("dedup number must be greater than 0");
        }
        if fields.is_empty() {
            bail!("dedup requires at least one field");
        }
        let keys = fields.iter().cloned().map(Expression::Reference).collect();
        let strategy = DedupStrategy {
            fields: fields.into_iter().map(|field| field.name).collect(),
            options,
            last: None,
        };
        Ok(Self::with_strategy(child, keys, strategy))
    }
}
