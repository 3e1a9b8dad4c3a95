//! Relation scan and the storage boundary.
//!
//! The core never reads data itself. A [`StorageEngine`] hands out a schema
//! and a [`RowSource`] of raw JSON rows per relation; [`RelationExecutor`]
//! converts each raw row into a typed [`Tuple`] using that schema.

use crate::data::{ColumnInfo, Schema, Tuple};
use crate::executor::Executor;
use anyhow::{anyhow, bail, Context, Result};
use log::debug;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A raw row: field name to untyped JSON value
pub type RawRow = Map<String, Value>;

/// Iterator of raw rows supplied by a data store
pub trait RowSource: Send {
    fn next_row(&mut self) -> Result<Option<RawRow>>;
}

/// Lookup of relations by name
pub trait StorageEngine: Send + Sync {
    fn schema(&self, relation: &str) -> Result<Schema>;
    fn scan(&self, relation: &str) -> Result<Box<dyn RowSource>>;
}

/// Leaf executor converting raw rows of one relation into tuples
pub struct RelationExecutor {
    /// Relation name, for error context
    name: String,
    source: Box<dyn RowSource>,
    output_schema: Vec<ColumnInfo>,
    initialized: bool,
}

impl RelationExecutor {
    pub fn new(name: impl Into<String>, source: Box<dyn RowSource>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            source,
            output_schema: schema,
            initialized: false,
        }
    }
}

impl Executor for RelationExecutor {
    fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        debug!("scanning relation {}", self.name);
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Tuple>> {
        if !self.initialized {
            bail!("Executor not initialized. Call init() first.");
        }
        let Some(row) = self
            .source
            .next_row()
            .with_context(|| format!("failed to read from relation {}", self.name))?
        else {
            return Ok(None);
        };
        Ok(Some(Tuple::from_json(&row, &self.output_schema)?))
    }

    fn output_schema(&self) -> &[ColumnInfo] {
        &self.output_schema
    }
}

/// In-memory storage backing tests and the command line
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    relations: HashMap<String, (Schema, Vec<RawRow>)>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_relation(&mut self, name: impl Into<String>, schema: Schema, rows: Vec<RawRow>) {
        self.relations.insert(name.into(), (schema, rows));
    }

    fn relation(&self, name: &str) -> Result<&(Schema, Vec<RawRow>)> {
        self.relations
            .get(name)
            .ok_or_else(|| anyhow!("relation {} does not exist", name))
    }
}

impl StorageEngine for MemoryStorage {
    fn schema(&self, relation: &str) -> Result<Schema> {
        Ok(self.relation(relation)?.0.clone())
    }

    fn scan(&self, relation: &str) -> Result<Box<dyn RowSource>> {
        let rows = self.relation(relation)?.1.clone();
        Ok(Box::new(MemoryRowSource {
            rows: rows.into_iter(),
        }))
    }
}

struct MemoryRowSource {
    rows: std::vec::IntoIter<RawRow>,
}

impl RowSource for MemoryRowSource {
    fn next_row(&mut self) -> Result<Option<RawRow>> {
        Ok(self.rows.next())
    }
}
