use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_CONFIG_FILE, DEFAULT_REDUCERS, DEFAULT_SPLIT_LINES};
use crate::error::{JobError, Result};

/// Settings owned by the job runner, not by the aggregation core
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// Number of reduce partitions (and part files)
    pub reducers: usize,
    /// Maximum lines per map task
    pub split_lines: usize,
    /// Run the map-side combine pass
    pub combine: bool,
    /// Directory for rolling JSON log files; console only when unset
    pub log_dir: Option<PathBuf>,
    /// Prometheus exporter listen address; exporter disabled when unset
    pub metrics_addr: Option<SocketAddr>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            reducers: DEFAULT_REDUCERS,
            split_lines: DEFAULT_SPLIT_LINES,
            combine: true,
            log_dir: None,
            metrics_addr: None,
        }
    }
}

impl JobConfig {
    /// Load configuration from a TOML file, then apply environment overrides.
    ///
    /// An explicit `path` must exist. Without one, `weblog_metrics.toml` in the
    /// working directory is used if present, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            JobError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Override fields from `WEBLOG_*` variables looked up through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("WEBLOG_REDUCERS") {
            self.reducers = parse_env("WEBLOG_REDUCERS", &v)?;
        }
        if let Some(v) = lookup("WEBLOG_SPLIT_LINES") {
            self.split_lines = parse_env("WEBLOG_SPLIT_LINES", &v)?;
        }
        if let Some(v) = lookup("WEBLOG_COMBINE") {
            self.combine = matches!(v.trim(), "1" | "true" | "yes" | "on");
        }
        if let Some(v) = lookup("WEBLOG_LOG_DIR") {
            self.log_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("WEBLOG_METRICS_ADDR") {
            self.metrics_addr = Some(parse_env("WEBLOG_METRICS_ADDR", &v)?);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.reducers == 0 {
            return Err(JobError::Config("reducers must be at least 1".to_string()));
        }
        if self.split_lines == 0 {
            return Err(JobError::Config("split_lines must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| JobError::Config(format!("Invalid value for {}: '{}'", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = JobConfig::default();
        assert_eq!(config.reducers, 2);
        assert_eq!(config.split_lines, 10_000);
        assert!(config.combine);
        assert!(config.log_dir.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = JobConfig::from_toml("reducers = 4\ncombine = false\n").unwrap();
        assert_eq!(config.reducers, 4);
        assert!(!config.combine);
        assert_eq!(config.split_lines, 10_000);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            JobConfig::from_toml("reducers = \"many\""),
            Err(JobError::Toml(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("WEBLOG_REDUCERS", "3"),
            ("WEBLOG_COMBINE", "false"),
            ("WEBLOG_METRICS_ADDR", "127.0.0.1:9898"),
        ]
        .into_iter()
        .collect();

        let mut config = JobConfig::default();
        config
            .apply_env(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.reducers, 3);
        assert!(!config.combine);
        assert_eq!(config.metrics_addr, Some("127.0.0.1:9898".parse().unwrap()));
    }

    #[test]
    fn test_bad_env_value() {
        let mut config = JobConfig::default();
        let err = config
            .apply_env(|name| (name == "WEBLOG_SPLIT_LINES").then(|| "lots".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("WEBLOG_SPLIT_LINES"));
    }

    #[test]
    fn test_validate_rejects_zero() {
        let config = JobConfig {
            reducers: 0,
            ..JobConfig::default()
        };
        assert!(config.validate().is_err());

        let config = JobConfig {
            split_lines: 0,
            ..JobConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = JobConfig::load(Some(Path::new("/nonexistent/weblog.toml"))).unwrap_err();
        assert!(matches!(err, JobError::Config(_)));
    }
}
