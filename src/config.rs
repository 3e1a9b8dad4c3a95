//! Engine configuration.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Default row count of a PPL `sort` command.
pub const PPL_SORT_COUNT: i64 = 1000;

/// Default number of combinations returned by `rare` and `top`.
pub const DEFAULT_RARE_TOP_N: usize = 10;

/// Query language the plan was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Ppl,
    Sql,
}

impl Dialect {
    /// Sort row count used when a plan does not give one
    pub fn default_sort_count(&self) -> i64 {
        match self {
            Dialect::Ppl => PPL_SORT_COUNT,
            Dialect::Sql => -1,
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Dialect deciding the command defaults.
    pub dialect: Dialect,
    /// Sort row count override; the dialect default applies when unset.
    pub default_sort_count: Option<i64>,
    /// Combinations returned per group by `rare`/`top` without a count.
    pub default_rare_top_n: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            dialect: Dialect::Ppl,
            default_sort_count: None,
            default_rare_top_n: DEFAULT_RARE_TOP_N,
        }
    }
}

impl EngineConfig {
    pub fn for_dialect(dialect: Dialect) -> Self {
        EngineConfig {
            dialect,
            ..EngineConfig::default()
        }
    }

    /// Effective default row count of the sort command
    pub fn sort_count(&self) -> i64 {
        self.default_sort_count
            .unwrap_or_else(|| self.dialect.default_sort_count())
    }

    /// Load a configuration from a JSON file; missing keys take defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_dialect_defaults() {
        assert_eq!(EngineConfig::default().sort_count(), 1000);
        assert_eq!(EngineConfig::for_dialect(Dialect::Sql).sort_count(), -1);
        assert_eq!(EngineConfig::default().default_rare_top_n, 10);
    }

    #[test]
    fn test_load_partial_file() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(file, r#"{{"dialect": "sql", "default_rare_top_n": 3}}"#)?;

        let config = EngineConfig::load(file.path())?;
        assert_eq!(config.dialect, Dialect::Sql);
        assert_eq!(config.sort_count(), -1);
        assert_eq!(config.default_rare_top_n, 3);
        Ok(())
    }

    #[test]
    fn test_sort_count_override() -> Result<()> {
        let config: EngineConfig = serde_json::from_str(r#"{"default_sort_count": 50}"#)?;
        assert_eq!(config.dialect, Dialect::Ppl);
        assert_eq!(config.sort_count(), 50);
        Ok(())
    }

    #[test]
    fn test_load_rejects_bad_json() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(file, "not json")?;
        assert!(EngineConfig::load(file.path()).is_err());
        Ok(())
    }
}
