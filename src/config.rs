// Copyright 2024-2026 crd-warden Contributors
// SPDX-License-Identifier: Apache-2.0

//! Warden configuration.
//!
//! A TOML file (path from `CRD_WARDEN_CONFIG`, defaults otherwise) followed
//! by environment overrides. Every section is optional.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crd::validation::validate_subdomain;
use crate::crd::{validate_definition_name, ValidationError};
use crate::generator::{DefinitionTemplate, Generator};
use crate::reconciler::{Catalog, ReconcilerConfig};
use crate::scheduler::{BackoffPolicy, SchedulePolicy};

pub const CONFIG_ENV: &str = "CRD_WARDEN_CONFIG";
pub const GROUP_ENV: &str = "CRD_WARDEN_GROUP";
pub const STORE_DIR_ENV: &str = "CRD_WARDEN_STORE_DIR";
pub const LOG_JSON_ENV: &str = "CRD_WARDEN_LOG_JSON";
pub const MAX_CONCURRENCY_ENV: &str = "CRD_WARDEN_MAX_CONCURRENCY";

/// Largest catalog a config may declare.
pub const MAX_CATALOG_SIZE: u64 = 100_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid value for {var}: {value:?}")]
    Env { var: String, value: String },

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("template produces an invalid definition: {0}")]
    Template(#[from] ValidationError),
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Which indices to enforce. `indices` wins over the range when set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    pub start: u32,
    /// Inclusive.
    pub end: u32,
    pub indices: Option<Vec<u32>>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            start: 1,
            end: 100,
            indices: None,
        }
    }
}

impl CatalogConfig {
    pub fn catalog(&self) -> Catalog {
        match &self.indices {
            Some(indices) => Catalog::from_indices(indices.iter().copied()),
            None => Catalog::range(self.start, self.end),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScheduleConfig {
    pub steady_secs: u64,
    pub heal_secs: u64,
    pub backoff_initial_secs: u64,
    pub backoff_max_secs: u64,
    pub backoff_multiplier: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        let policy = SchedulePolicy::default();
        Self {
            steady_secs: policy.steady_interval.as_secs(),
            heal_secs: policy.heal_interval.as_secs(),
            backoff_initial_secs: policy.backoff.initial.as_secs(),
            backoff_max_secs: policy.backoff.max.as_secs(),
            backoff_multiplier: policy.backoff.multiplier,
        }
    }
}

impl ScheduleConfig {
    pub fn policy(&self) -> SchedulePolicy {
        SchedulePolicy {
            steady_interval: Duration::from_secs(self.steady_secs),
            heal_interval: Duration::from_secs(self.heal_secs),
            backoff: BackoffPolicy {
                initial: Duration::from_secs(self.backoff_initial_secs),
                max: Duration::from_secs(self.backoff_max_secs),
                multiplier: self.backoff_multiplier,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Directory holding one JSON manifest per definition.
    pub dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./crd-store"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconcileConfig {
    /// 0 means one per CPU.
    pub max_concurrency: usize,
    pub call_timeout_ms: u64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 0,
            call_timeout_ms: 10_000,
        }
    }
}

impl ReconcileConfig {
    pub fn reconciler_config(&self) -> ReconcilerConfig {
        let max_concurrency = if self.max_concurrency == 0 {
            num_cpus::get().max(1)
        } else {
            self.max_concurrency
        };
        ReconcilerConfig {
            max_concurrency,
            call_timeout: Duration::from_millis(self.call_timeout_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence.
    pub filter: String,
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WardenConfig {
    /// API group every definition belongs to.
    pub group: String,
    pub catalog: CatalogConfig,
    pub template: DefinitionTemplate,
    pub schedule: ScheduleConfig,
    pub store: StoreConfig,
    pub reconcile: ReconcileConfig,
    pub log: LogConfig,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            group: "warden.example.io".to_string(),
            catalog: CatalogConfig::default(),
            template: DefinitionTemplate::default(),
            schedule: ScheduleConfig::default(),
            store: StoreConfig::default(),
            reconcile: ReconcileConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl WardenConfig {
    /// Load from the process environment and validate.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|var| std::env::var(var).ok())
    }

    /// Load using `lookup` in place of the environment.
    pub fn load_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Self::load_file(path)?,
            _ => Self::default(),
        };
        config.apply_env_overrides(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a file without applying overrides or validating.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(group) = lookup(GROUP_ENV) {
            self.group = group;
        }
        if let Some(dir) = lookup(STORE_DIR_ENV) {
            self.store.dir = PathBuf::from(dir);
        }
        if let Some(value) = lookup(LOG_JSON_ENV) {
            self.log.json = parse_bool(&value).ok_or_else(|| ConfigError::Env {
                var: LOG_JSON_ENV.to_string(),
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup(MAX_CONCURRENCY_ENV) {
            self.reconcile.max_concurrency =
                value.trim().parse().map_err(|_| ConfigError::Env {
                    var: MAX_CONCURRENCY_ENV.to_string(),
                    value: value.clone(),
                })?;
        }
        Ok(())
    }

    /// Reject settings that would make every pass fail or never converge.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.group.trim().is_empty() {
            return Err(invalid("group", "must not be empty"));
        }
        validate_subdomain(&self.group, "group")?;

        match &self.catalog.indices {
            Some(indices) if indices.is_empty() => {
                return Err(invalid("catalog.indices", "must list at least one index"));
            }
            Some(indices) if indices.len() as u64 > MAX_CATALOG_SIZE => {
                return Err(invalid(
                    "catalog.indices",
                    format!(
                        "{} indices exceed the maximum of {}",
                        indices.len(),
                        MAX_CATALOG_SIZE
                    ),
                ));
            }
            None if self.catalog.start > self.catalog.end => {
                return Err(invalid(
                    "catalog",
                    format!("start {} is after end {}", self.catalog.start, self.catalog.end),
                ));
            }
            None => {
                let size = u64::from(self.catalog.end) - u64::from(self.catalog.start) + 1;
                if size > MAX_CATALOG_SIZE {
                    return Err(invalid(
                        "catalog",
                        format!(
                            "range of {} entries exceeds the maximum of {}",
                            size, MAX_CATALOG_SIZE
                        ),
                    ));
                }
            }
            _ => {}
        }

        let s = &self.schedule;
        for (field, value) in [
            ("schedule.steady_secs", s.steady_secs),
            ("schedule.heal_secs", s.heal_secs),
            ("schedule.backoff_initial_secs", s.backoff_initial_secs),
            ("reconcile.call_timeout_ms", self.reconcile.call_timeout_ms),
        ] {
            if value == 0 {
                return Err(invalid(field, "must be greater than zero"));
            }
        }
        if s.backoff_max_secs < s.backoff_initial_secs {
            return Err(invalid(
                "schedule.backoff_max_secs",
                "must not be below backoff_initial_secs",
            ));
        }
        if s.backoff_multiplier < 1 {
            return Err(invalid("schedule.backoff_multiplier", "must be at least 1"));
        }

        let t = &self.template;
        t.shape
            .check()
            .map_err(|reason| invalid("template.shape.depth", reason))?;
        if let Some(storage) = &t.storage_version {
            if !t.versions.iter().any(|v| v == storage) {
                return Err(invalid(
                    "template.storage_version",
                    format!("{storage:?} is not among template.versions"),
                ));
            }
        }

        // Generation is deterministic per index, so the first and last entries
        // cover the shortest and longest names.
        let generator = Generator::new(t.clone());
        let catalog = self.catalog.catalog();
        let ends = [catalog.as_slice().first(), catalog.as_slice().last()];
        for index in ends.into_iter().flatten().copied() {
            let definition = generator.generate(index, &self.group);
            validate_definition_name(&definition.name)?;
            definition.validate()?;
        }
        Ok(())
    }

    pub fn generator(&self) -> Generator {
        Generator::new(self.template.clone())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
