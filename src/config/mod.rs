pub mod validation;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::engine::{NodeId, NodePolicy};

use self::validation::validate_config;

/// Error type for configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Server configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub base_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_worker_threads: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_max_blocking_threads: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_thread_stack_size_kb: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tcp_reuse_port_listener_count: Option<usize>,
}

fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}

#[derive(Debug, Deserialize)]
struct ServerConfigWire {
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_host")]
    host: String,
    #[serde(default)]
    base_path: String,
    #[serde(default)]
    runtime_worker_threads: Option<RuntimeThreadsSetting>,
    #[serde(default)]
    runtime_max_blocking_threads: Option<RuntimeThreadsSetting>,
    #[serde(default)]
    runtime_thread_stack_size_kb: Option<usize>,
    #[serde(default)]
    tcp_reuse_port_listener_count: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RuntimeThreadsSetting {
    Fixed(usize),
    Auto(()),
}

fn runtime_threads_or_default(
    setting: Option<&RuntimeThreadsSetting>,
    default: Option<usize>,
) -> Option<usize> {
    match setting {
        None => default,
        Some(RuntimeThreadsSetting::Fixed(threads)) => Some(*threads),
        Some(RuntimeThreadsSetting::Auto(())) => None,
    }
}

impl<'de> Deserialize<'de> for ServerConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let wire = ServerConfigWire::deserialize(deserializer)?;
        Ok(Self {
            port: wire.port,
            host: wire.host,
            base_path: wire.base_path,
            runtime_worker_threads: runtime_threads_or_default(
                wire.runtime_worker_threads.as_ref(),
                None,
            ),
            runtime_max_blocking_threads: runtime_threads_or_default(
                wire.runtime_max_blocking_threads.as_ref(),
                Some(8),
            ),
            runtime_thread_stack_size_kb: wire.runtime_thread_stack_size_kb,
            tcp_reuse_port_listener_count: wire.tcp_reuse_port_listener_count,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            base_path: String::new(),
            runtime_worker_threads: None,
            runtime_max_blocking_threads: Some(8),
            runtime_thread_stack_size_kb: None,
            tcp_reuse_port_listener_count: None,
        }
    }
}

/// Where v1 node ids come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NodeIdMode {
    #[default]
    Process,
    Scope,
    Fixed,
}

impl fmt::Display for NodeIdMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeIdMode::Process => write!(f, "process"),
            NodeIdMode::Scope => write!(f, "scope"),
            NodeIdMode::Fixed => write!(f, "fixed"),
        }
    }
}

/// Random source used for v4 values, clock sequences and random node ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RandomSourceKind {
    #[default]
    Os,
    Fast,
}

impl fmt::Display for RandomSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RandomSourceKind::Os => write!(f, "os"),
            RandomSourceKind::Fast => write!(f, "fast"),
        }
    }
}

/// Generation engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub node_id: NodeIdMode,
    #[serde(default)]
    pub fixed_node_id: Option<String>,
    #[serde(default)]
    pub random_source: RandomSourceKind,
    #[serde(default = "default_workspace_bytes")]
    pub workspace_bytes: usize,
    #[serde(default = "default_workspace_pool_size")]
    pub workspace_pool_size: usize,
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

fn default_workspace_bytes() -> usize {
    1024
}
fn default_workspace_pool_size() -> usize {
    64
}
fn default_max_batch_size() -> usize {
    16
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            node_id: NodeIdMode::default(),
            fixed_node_id: None,
            random_source: RandomSourceKind::default(),
            workspace_bytes: default_workspace_bytes(),
            workspace_pool_size: default_workspace_pool_size(),
            max_batch_size: default_max_batch_size(),
        }
    }
}

impl EngineConfig {
    /// Translate the node id settings into the engine's policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when `node_id: fixed` lacks a
    /// parseable `fixed_node_id`.
    pub fn node_policy(&self) -> Result<NodePolicy, ConfigError> {
        match self.node_id {
            NodeIdMode::Process => Ok(NodePolicy::Process),
            NodeIdMode::Scope => Ok(NodePolicy::Scope),
            NodeIdMode::Fixed => {
                let raw = self.fixed_node_id.as_deref().ok_or_else(|| {
                    ConfigError::Validation(
                        "engine.fixed_node_id is required when engine.node_id is 'fixed'"
                            .to_string(),
                    )
                })?;
                raw.parse::<NodeId>()
                    .map(NodePolicy::Fixed)
                    .map_err(|e| ConfigError::Validation(format!("engine.fixed_node_id: {e}")))
            }
        }
    }
}

/// Feature flags and settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturesConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "INFO".to_string()
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub features: FeaturesConfig,
}

/// Load configuration from a YAML file and validate it.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] when reading the file fails, [`ConfigError::Yaml`]
/// when parsing fails, or [`ConfigError::Validation`] when semantic validation fails.
pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parse and validate configuration from YAML text.
///
/// # Errors
///
/// Same as [`load_config`], minus I/O.
pub fn parse_config(contents: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_yaml::from_str(contents)?;
    validate_config(&config)?;
    Ok(config)
}
