use tracing_subscriber::EnvFilter;

use crate::error::ServiceError;

/// Initialize the tracing subscriber with the configured log level.
///
/// Maps config log levels to tracing levels:
/// - "DISABLED" -> no subscriber installed
/// - "WARNING" -> WARN
/// - "CRITICAL" -> ERROR
/// - Others map directly (DEBUG, INFO, ERROR)
pub fn init_tracing(log_level: &str) {
    let level = log_level.to_uppercase();

    if level == "DISABLED" {
        return;
    }

    let filter = EnvFilter::try_new(tracing_level(&level)).unwrap_or_else(|_| EnvFilter::new("INFO"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

fn tracing_level(level: &str) -> &str {
    match level {
        "WARNING" => "WARN",
        "CRITICAL" => "ERROR",
        other => other,
    }
}

/// Report a failed UUID request on the diagnostic channel with its reason code.
pub fn log_request_failure(route: &str, err: &ServiceError) {
    tracing::warn!(route, code = err.code().as_str(), "uuid request failed: {err}");
}

#[cfg(test)]
mod tests {
    use super::tracing_level;

    #[test]
    fn config_levels_map_to_tracing_levels() {
        assert_eq!(tracing_level("WARNING"), "WARN");
        assert_eq!(tracing_level("CRITICAL"), "ERROR");
        assert_eq!(tracing_level("DEBUG"), "DEBUG");
    }
}
