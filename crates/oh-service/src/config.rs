//! Service configuration, loaded from environment variables.

use common::config::{ObservabilityConfig, StoreConfig};
use common::types::UserId;
use std::collections::HashMap;
use std::env;
use thiserror::Error;

use crate::authz::DEFAULT_ELEVATED_GROUPS;

/// Office Hours service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// State store connection.
    pub store: StoreConfig,
    /// Ops HTTP bind address (health/readiness/metrics).
    pub bind_address: String,
    /// User ids holding administrator status.
    pub admin_users: Vec<UserId>,
    /// Group names whose members hold elevated status.
    pub elevated_groups: Vec<String>,
    /// Sessions to bootstrap (force inactive and clear) on startup.
    pub bootstrap_owners: Vec<UserId>,
    /// Logging configuration.
    pub observability: ObservabilityConfig,
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value
    /// fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a map (for testing).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value
    /// fails to parse.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let url = vars
            .get("OH_REDIS_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("OH_REDIS_URL".to_string()))?
            .clone();

        let bind_address = vars
            .get("OH_BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| "0.0.0.0:8086".to_string());

        let admin_users = match vars.get("OH_ADMIN_USERS") {
            Some(raw) => parse_id_list("OH_ADMIN_USERS", raw)?,
            None => Vec::new(),
        };

        let elevated_groups = match vars.get("OH_ELEVATED_GROUPS") {
            Some(raw) => split_list(raw),
            None => DEFAULT_ELEVATED_GROUPS
                .iter()
                .map(ToString::to_string)
                .collect(),
        };

        let bootstrap_owners = match vars.get("OH_BOOTSTRAP_OWNERS") {
            Some(raw) => parse_id_list("OH_BOOTSTRAP_OWNERS", raw)?,
            None => Vec::new(),
        };

        let log_level = vars
            .get("OH_LOG_LEVEL")
            .cloned()
            .unwrap_or_else(|| "info".to_string());
        let json_logs = vars
            .get("OH_LOG_JSON")
            .is_some_and(|raw| raw.eq_ignore_ascii_case("true") || raw == "1");

        Ok(Config {
            store: StoreConfig { url },
            bind_address,
            admin_users,
            elevated_groups,
            bootstrap_owners,
            observability: ObservabilityConfig {
                log_level,
                json_logs,
            },
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn parse_id_list(var: &str, raw: &str) -> Result<Vec<UserId>, ConfigError> {
    split_list(raw)
        .into_iter()
        .map(|item| {
            UserId::new(item).map_err(|e| ConfigError::InvalidValue {
                var: var.to_string(),
                message: e.to_string(),
            })
        })
        .collect()
}
