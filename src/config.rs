use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Report-building defaults; CLI flags override them
    #[serde(default)]
    pub report: ReportConfig,

    /// Run-history database settings
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl Config {
    /// Load configuration from compiled-in defaults, an optional file, and
    /// the environment (prefix `RQF`, `__` separator).
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("RQF_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());

        config::Config::builder()
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            .add_source(config::File::with_name(&config_path).required(false))
            .add_source(
                config::Environment::with_prefix("RQF")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            report: ReportConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// SLA threshold in days
    #[serde(default = "default_sla_days")]
    pub sla_days: i64,

    /// Trailing window for throughput and trend comparisons
    #[serde(default = "default_throughput_window_days")]
    pub throughput_window_days: i64,

    /// Fraction of the SLA at which pending work counts as due soon
    #[serde(default = "default_due_soon_ratio")]
    pub due_soon_ratio: f64,

    /// Reviewers shown in the console snapshot
    #[serde(default = "default_reviewer_top")]
    pub reviewer_top: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            sla_days: default_sla_days(),
            throughput_window_days: default_throughput_window_days(),
            due_soon_ratio: default_due_soon_ratio(),
            reviewer_top: default_reviewer_top(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string; falls back to RQF_DATABASE_URL / DATABASE_URL
    pub url: Option<String>,

    /// Schema holding the run-history table
    #[serde(default = "default_schema")]
    pub schema: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            schema: default_schema(),
        }
    }
}

fn default_sla_days() -> i64 {
    10
}

fn default_throughput_window_days() -> i64 {
    28
}

fn default_due_soon_ratio() -> f64 {
    0.8
}

fn default_reviewer_top() -> usize {
    5
}

fn default_schema() -> String {
    "review_queue_forecaster".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_shipped_toml() {
        let config = Config::default();
        assert_eq!(config.report.sla_days, 10);
        assert_eq!(config.report.throughput_window_days, 28);
        assert_eq!(config.report.due_soon_ratio, 0.8);
        assert_eq!(config.report.reviewer_top, 5);
        assert_eq!(config.database.schema, "review_queue_forecaster");
        assert!(config.database.url.is_none());
    }
}
