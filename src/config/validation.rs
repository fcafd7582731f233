use crate::engine::UUID_RESULT_BYTES;

use super::{AppConfig, ConfigError, NodeIdMode};

/// Validate the full application config, returning an error if any rule is violated.
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] when any configuration invariant is violated.
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    validate_server_config(config)?;
    validate_engine_config(config)?;
    validate_log_level(config)?;
    Ok(())
}

fn validation_err(msg: impl Into<String>) -> ConfigError {
    ConfigError::Validation(msg.into())
}

fn validate_server_config(config: &AppConfig) -> Result<(), ConfigError> {
    let server = &config.server;
    if let Some(worker_threads) = server.runtime_worker_threads {
        if worker_threads == 0 {
            return Err(validation_err(
                "server.runtime_worker_threads must be greater than 0 when set",
            ));
        }
    }
    if let Some(max_blocking_threads) = server.runtime_max_blocking_threads {
        if max_blocking_threads == 0 {
            return Err(validation_err(
                "server.runtime_max_blocking_threads must be greater than 0 when set",
            ));
        }
    }
    if let Some(thread_stack_size_kb) = server.runtime_thread_stack_size_kb {
        if thread_stack_size_kb == 0 {
            return Err(validation_err(
                "server.runtime_thread_stack_size_kb must be greater than 0 when set",
            ));
        }
    }
    if let Some(listener_count) = server.tcp_reuse_port_listener_count {
        if listener_count == 0 {
            return Err(validation_err(
                "server.tcp_reuse_port_listener_count must be greater than 0 when set",
            ));
        }
    }
    Ok(())
}

fn validate_engine_config(config: &AppConfig) -> Result<(), ConfigError> {
    let engine = &config.engine;
    if engine.workspace_bytes < UUID_RESULT_BYTES {
        return Err(validation_err(format!(
            "engine.workspace_bytes must be at least {UUID_RESULT_BYTES}"
        )));
    }
    if engine.max_batch_size == 0 {
        return Err(validation_err(
            "engine.max_batch_size must be greater than 0",
        ));
    }
    let batch_bytes = engine.max_batch_size.saturating_mul(UUID_RESULT_BYTES);
    if batch_bytes > engine.workspace_bytes {
        return Err(validation_err(format!(
            "engine.max_batch_size {} needs {batch_bytes} workspace bytes but engine.workspace_bytes is {}",
            engine.max_batch_size, engine.workspace_bytes
        )));
    }
    if engine.node_id != NodeIdMode::Fixed && engine.fixed_node_id.is_some() {
        return Err(validation_err(
            "engine.fixed_node_id is only allowed when engine.node_id is 'fixed'",
        ));
    }
    engine.node_policy()?;
    Ok(())
}

fn validate_log_level(config: &AppConfig) -> Result<(), ConfigError> {
    let valid_levels = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL", "DISABLED"];
    if !valid_levels.contains(&config.features.log_level.to_uppercase().as_str()) {
        return Err(validation_err(format!(
            "log_level must be one of {valid_levels:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::*;

    fn make_valid_config() -> AppConfig {
        AppConfig::default()
    }

    #[test]
    fn test_valid_config() {
        let config = make_valid_config();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = make_valid_config();
        config.features.log_level = "VERBOSE".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_log_level_is_case_insensitive() {
        let mut config = make_valid_config();
        config.features.log_level = "warning".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_invalid_runtime_worker_threads() {
        let mut config = make_valid_config();
        config.server.runtime_worker_threads = Some(0);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_invalid_runtime_max_blocking_threads() {
        let mut config = make_valid_config();
        config.server.runtime_max_blocking_threads = Some(0);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_invalid_runtime_thread_stack_size_kb() {
        let mut config = make_valid_config();
        config.server.runtime_thread_stack_size_kb = Some(0);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_invalid_tcp_reuse_port_listener_count() {
        let mut config = make_valid_config();
        config.server.tcp_reuse_port_listener_count = Some(0);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_workspace_must_hold_one_uuid() {
        let mut config = make_valid_config();
        config.engine.workspace_bytes = UUID_RESULT_BYTES - 1;
        config.engine.max_batch_size = 1;
        assert!(validate_config(&config).is_err());

        config.engine.workspace_bytes = UUID_RESULT_BYTES;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_batch_must_fit_workspace() {
        let mut config = make_valid_config();
        config.engine.workspace_bytes = 4 * UUID_RESULT_BYTES;
        config.engine.max_batch_size = 5;
        assert!(validate_config(&config).is_err());

        config.engine.max_batch_size = 0;
        assert!(validate_config(&config).is_err());

        config.engine.max_batch_size = 4;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_fixed_node_requires_value() {
        let mut config = make_valid_config();
        config.engine.node_id = NodeIdMode::Fixed;
        assert!(validate_config(&config).is_err());

        config.engine.fixed_node_id = Some("not-a-mac".to_string());
        assert!(validate_config(&config).is_err());

        config.engine.fixed_node_id = Some("020000000001".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_fixed_node_value_without_fixed_mode() {
        let mut config = make_valid_config();
        config.engine.fixed_node_id = Some("020000000001".to_string());
        assert!(validate_config(&config).is_err());
    }
}
