use std::num::NonZeroU32;
use std::path::PathBuf;

use anyhow::Context;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://preschool_data.db";
pub const DEFAULT_CHART_DIR: &str = "charts";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Where rendered SVG charts are written.
    pub chart_dir: PathBuf,
    pub max_connections: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            chart_dir: PathBuf::from(DEFAULT_CHART_DIR),
            max_connections: 5,
        }
    }
}

impl Config {
    /// Reads `DATABASE_URL`, `CHART_DIR` and `DB_MAX_CONNECTIONS`, keeping the
    /// defaults for anything unset.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database_url = url;
        }
        if let Ok(dir) = std::env::var("CHART_DIR") {
            config.chart_dir = PathBuf::from(dir);
        }
        if let Ok(value) = std::env::var("DB_MAX_CONNECTIONS") {
            config.max_connections = parse_max_connections(&value)?;
        }

        Ok(config)
    }

    pub fn with_overrides(mut self, database_url: Option<String>, chart_dir: Option<PathBuf>) -> Self {
        if let Some(url) = database_url {
            self.database_url = url;
        }
        if let Some(dir) = chart_dir {
            self.chart_dir = dir;
        }
        self
    }
}

/// A pool with zero connections would hang on the first acquire.
fn parse_max_connections(value: &str) -> anyhow::Result<u32> {
    let parsed: NonZeroU32 = value.trim().parse().with_context(|| {
        format!("DB_MAX_CONNECTIONS must be a positive number, got '{value}'")
    })?;
    Ok(parsed.get())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_defaults() {
        let config = Config::default().with_overrides(
            Some("sqlite::memory:".to_string()),
            Some(PathBuf::from("out")),
        );
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.chart_dir, PathBuf::from("out"));
        assert_eq!(config.max_connections, 5);
    }

    #[test]
    fn missing_overrides_keep_values() {
        let config = Config::default().with_overrides(None, None);
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.chart_dir, PathBuf::from(DEFAULT_CHART_DIR));
    }

    #[test]
    fn max_connections_must_be_positive() {
        assert_eq!(parse_max_connections("8").unwrap(), 8);
        assert_eq!(parse_max_connections(" 2 ").unwrap(), 2);

        let err = parse_max_connections("0").unwrap_err();
        assert!(format!("{err:#}").contains("must be a positive number, got '0'"));
        assert!(parse_max_connections("-1").is_err());
        assert!(parse_max_connections("many").is_err());
    }
}
