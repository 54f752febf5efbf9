//! Configuration for the synbio-load writer.
//!
//! Loaded from (in priority order):
//! 1. Environment variables (`SYNBIO__` prefix, `__` separator)
//! 2. Config file (`synbio.toml` by default)
//! 3. Defaults

use std::time::Duration;

use serde::Deserialize;
use synbio_graph::GraphConfig;

use crate::error::Result;

/// Caller-side retry policy, from the `[load]` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Attempts per record tree, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Upper bound on any single retry delay.
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
}

impl LoaderConfig {
    /// Delay after the given failed attempt (1-based): the base delay,
    /// doubled for each further attempt, capped at `backoff_max_ms`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        let millis = self.backoff_base_ms.saturating_mul(1_u64 << shift);
        Duration::from_millis(millis.min(self.backoff_max_ms))
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    500
}

fn default_backoff_max_ms() -> u64 {
    10_000
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
        }
    }
}

fn build(file_prefix: &str) -> std::result::Result<config::Config, config::ConfigError> {
    config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("SYNBIO")
                .separator("__")
                .try_parsing(true),
        )
        .build()
}

/// Load the `[load]` section. A missing section yields the defaults; a
/// malformed one is an error.
pub fn load_loader_config(file_prefix: &str) -> Result<LoaderConfig> {
    let cfg = build(file_prefix)?;

    match cfg.get::<LoaderConfig>("load") {
        Ok(c) => Ok(c),
        Err(config::ConfigError::NotFound(_)) => Ok(LoaderConfig::default()),
        Err(e) => Err(e.into()),
    }
}

/// Load Neo4j connection settings from the `[neo4j]` section, falling back
/// to defaults for anything unset.
pub fn load_graph_config(file_prefix: &str) -> GraphConfig {
    let defaults = GraphConfig::default();

    match build(file_prefix) {
        Ok(c) => GraphConfig {
            uri: c.get_string("neo4j.uri").unwrap_or(defaults.uri),
            user: c.get_string("neo4j.user").unwrap_or(defaults.user),
            password: c.get_string("neo4j.password").unwrap_or(defaults.password),
            max_connections: c
                .get_int("neo4j.max_connections")
                .ok()
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(defaults.max_connections),
            fetch_size: c
                .get_int("neo4j.fetch_size")
                .ok()
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(defaults.fetch_size),
        },
        Err(e) => {
            tracing::warn!(error = %e, "Could not read config, using default Neo4j settings");
            defaults
        }
    }
}
