//! vibeql - run a command pipeline over JSON-lines data

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser as ClapParser, ValueEnum};
use log::{debug, error, info};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use vibeql::config::{Dialect, EngineConfig};
use vibeql::data::{ColumnInfo, ExprType, ExprValue, Schema};
use vibeql::executor::relation::RawRow;
use vibeql::executor::{classify, MemoryStorage};
use vibeql::expression::{Expression, NamedExpression, ReferenceExpression};
use vibeql::planner::{Argument, LogicalPlan, PhysicalPlanner, SortField};

#[derive(ValueEnum, Clone, Copy, Debug)]
enum DialectArg {
    Ppl,
    Sql,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Ppl => Dialect::Ppl,
            DialectArg::Sql => Dialect::Sql,
        }
    }
}

/// vibeql - A piped query engine over JSON-lines data
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON-lines file, one object per row
    #[arg(short = 'D', long)]
    data: PathBuf,

    /// Field types, e.g. `name:string,age:integer`
    #[arg(short, long)]
    schema: String,

    /// Keep only these fields, e.g. `name,age`
    #[arg(short, long)]
    fields: Option<String>,

    /// Drop rows repeating these fields' values, e.g. `dept`
    #[arg(long)]
    dedup: Option<String>,

    /// Sort keys, e.g. `age:desc,name`
    #[arg(long)]
    sort: Option<String>,

    /// Maximum number of rows to print
    #[arg(long)]
    head: Option<i64>,

    /// Rows skipped before `--head` applies
    #[arg(long, default_value = "0")]
    offset: i64,

    /// Query dialect deciding command defaults
    #[arg(long, value_enum)]
    dialect: Option<DialectArg>,

    /// JSON engine configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(dialect) = args.dialect {
        config.dialect = dialect.into();
    }
    debug!("engine config: {:?}", config);

    if let Err(err) = run(&args, config) {
        error!("query failed ({:?}): {:#}", classify(&err), err);
        return Err(err);
    }
    Ok(())
}

fn run(args: &Args, config: EngineConfig) -> Result<()> {
    let schema = parse_schema(&args.schema)?;
    let rows = read_rows(&args.data)?;
    info!("loaded {} rows from {}", rows.len(), args.data.display());

    let plan = build_plan(args, &schema, config.dialect)?;
    debug!("plan:\n{}", plan.explain());

    let mut storage = MemoryStorage::new();
    storage.insert_relation(RELATION, schema, rows);
    let planner = PhysicalPlanner::new(Arc::new(storage), config);
    let mut executor = planner.plan(&plan)?;
    executor.init()?;

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut count = 0usize;
    while let Some(tuple) = executor.next()? {
        serde_json::to_writer(&mut out, &ExprValue::Tuple(tuple))?;
        writeln!(out)?;
        count += 1;
    }
    out.flush()?;
    info!("{} rows returned", count);
    Ok(())
}

const RELATION: &str = "input";

fn parse_schema(text: &str) -> Result<Schema> {
    text.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, ty) = entry
                .split_once(':')
                .ok_or_else(|| anyhow!("schema entry {} must look like name:type", entry))?;
            Ok(ColumnInfo::new(name.trim(), ExprType::parse(ty)?))
        })
        .collect()
}

fn read_rows(path: &PathBuf) -> Result<Vec<RawRow>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open data file {}", path.display()))?;
    let mut rows = Vec::new();
    for (number, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line)
            .with_context(|| format!("line {} is not valid JSON", number + 1))?
        {
            serde_json::Value::Object(row) => rows.push(row),
            _ => bail!("line {} is not a JSON object", number + 1),
        }
    }
    Ok(rows)
}

fn field_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|name| !name.is_empty())
}

fn reference(schema: &Schema, name: &str) -> Result<ReferenceExpression> {
    schema
        .iter()
        .find(|column| column.name == name)
        .map(|column| ReferenceExpression::new(name, column.expr_type))
        .ok_or_else(|| anyhow!("unknown field {}", name))
}

fn build_plan(args: &Args, schema: &Schema, dialect: Dialect) -> Result<LogicalPlan> {
    let mut plan = LogicalPlan::relation(RELATION);

    if let Some(fields) = &args.dedup {
        let fields = field_list(fields)
            .map(|name| reference(schema, name))
            .collect::<Result<Vec<_>>>()?;
        plan = plan.dedup(fields, vec![]);
    }

    if let Some(keys) = &args.sort {
        let fields = field_list(keys)
            .map(|key| {
                let (name, direction) = key.split_once(':').unwrap_or((key, "asc"));
                let expr = Expression::Reference(reference(schema, name)?);
                match direction.to_ascii_lowercase().as_str() {
                    "asc" => Ok(SortField::new(expr)),
                    "desc" => Ok(SortField::descending(expr)),
                    other => bail!("unknown sort direction {}", other),
                }
            })
            .collect::<Result<Vec<_>>>()?;
        plan = plan.sort(dialect, fields, vec![Argument::new("count", -1i64)]);
    }

    if let Some(fields) = &args.fields {
        let fields = field_list(fields)
            .map(|name| Ok(NamedExpression::new(name, Expression::Reference(reference(schema, name)?))))
            .collect::<Result<Vec<_>>>()?;
        plan = plan.project(fields);
    }

    if args.head.is_some() || args.offset != 0 {
        plan = plan.limit(args.head.unwrap_or(-1), args.offset);
    }
    Ok(plan)
}
