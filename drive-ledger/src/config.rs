use std::path::Path;

use drive_api_graphql::QueryDefaults;
use drive_common::{
    alert::validate_factor,
    duration::parse_duration_secs,
    error::Error,
    run::{Location, RunFilter},
};
use serde::{Deserialize, Serialize};

pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const LISTEN_ADDR_ENV: &str = "DRIVE_LISTEN_ADDR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub database_url: String,
    pub listen_addr: String,
    pub log_level: String,
    pub alerts: AlertConfig,
    pub stale: StaleConfig,
    pub pending: PendingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub stuck_multiplier: f64,
    pub volume_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaleConfig {
    pub threshold_factor: f64,
    /// Expected pipeline duration for runs created without one, e.g. "2h".
    pub default_pipeline_expected_duration: Option<String>,
    /// Restricts the stale sweep to one pipeline.
    pub pipeline_name: Option<String>,
    /// Restricts the stale sweep to one source location.
    pub source: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PendingConfig {
    pub x_time_back: String,
    pub granularity: String,
    pub max_records: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://drive-ledger.db?mode=rwc".into(),
            listen_addr: "127.0.0.1:8080".into(),
            log_level: "info".into(),
            alerts: AlertConfig::default(),
            stale: StaleConfig::default(),
            pending: PendingConfig::default(),
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            stuck_multiplier: 3.0,
            volume_factor: 2.0,
        }
    }
}

impl Default for StaleConfig {
    fn default() -> Self {
        Self {
            threshold_factor: 3.0,
            default_pipeline_expected_duration: None,
            pipeline_name: None,
            source: None,
        }
    }
}

impl Default for PendingConfig {
    fn default() -> Self {
        Self {
            x_time_back: "0s".into(),
            granularity: "15m".into(),
            max_records: 100,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid YAML config at line {line}, column {column}: {message}")]
    InvalidYaml {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Invalid YAML config: {message}")]
    InvalidYamlNoLocation { message: String },
}

pub fn parse_yaml(yaml_str: &str) -> Result<LedgerConfig, Error> {
    // an empty file is a valid, all-defaults config
    if yaml_str.trim().is_empty() {
        return Ok(LedgerConfig::default());
    }

    serde_yaml::from_str(yaml_str).map_err(|e| {
        let err = if let Some(location) = e.location() {
            ParseError::InvalidYaml {
                line: location.line(),
                column: location.column(),
                message: e.to_string(),
            }
        } else {
            ParseError::InvalidYamlNoLocation {
                message: e.to_string(),
            }
        };
        Error::Config(err.to_string())
    })
}

impl LedgerConfig {
    /// Loads `.env`, then the YAML file at `path` (defaults when absent),
    /// then environment overrides, and validates the result.
    pub fn load(path: &Path) -> Result<Self, Error> {
        dotenvy::dotenv().ok();

        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("Failed to read config {}: {e}", path.display()))
            })?;
            parse_yaml(&raw)?
        } else {
            LedgerConfig::default()
        };

        config.apply_overrides(
            std::env::var(DATABASE_URL_ENV).ok(),
            std::env::var(LISTEN_ADDR_ENV).ok(),
        );
        config.validate()?;

        Ok(config)
    }

    pub fn apply_overrides(&mut self, database_url: Option<String>, listen_addr: Option<String>) {
        if let Some(url) = database_url.filter(|url| !url.trim().is_empty()) {
            self.database_url = url;
        }
        if let Some(addr) = listen_addr.filter(|addr| !addr.trim().is_empty()) {
            self.listen_addr = addr;
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.database_url.trim().is_empty() {
            return Err(Error::Config("database_url must not be empty".into()));
        }

        let factors = [
            ("alerts.stuck_multiplier", self.alerts.stuck_multiplier),
            ("alerts.volume_factor", self.alerts.volume_factor),
            ("stale.threshold_factor", self.stale.threshold_factor),
        ];
        for (name, value) in factors {
            validate_factor(name, value).map_err(|e| Error::Config(e.to_string()))?;
        }

        self.query_defaults().map(|_| ())
    }

    pub fn query_defaults(&self) -> Result<QueryDefaults, Error> {
        let secs = |name: &str, value: &str| {
            parse_duration_secs(value).map_err(|e| Error::Config(format!("{name}: {e}")))
        };

        let default_pipeline_expected_secs = self
            .stale
            .default_pipeline_expected_duration
            .as_deref()
            .map(|value| secs("stale.default_pipeline_expected_duration", value))
            .transpose()?;

        Ok(QueryDefaults {
            stuck_multiplier: self.alerts.stuck_multiplier,
            volume_factor: self.alerts.volume_factor,
            stale_threshold_factor: self.stale.threshold_factor,
            default_pipeline_expected_secs,
            x_time_back_secs: secs("pending.x_time_back", &self.pending.x_time_back)?,
            granularity_secs: secs("pending.granularity", &self.pending.granularity)?,
            max_records: self.pending.max_records,
        })
    }

    /// Runs the stale sweep may touch.
    pub fn stale_filter(&self) -> RunFilter {
        RunFilter {
            pipeline_name: self.stale.pipeline_name.clone(),
            source: self.stale.source.clone(),
            ..Default::default()
        }
    }
}
