use std::fmt::Display;
use std::io;
use std::sync::Arc;

use uuidify_rs::config::{load_config, ServerConfig};
use uuidify_rs::observability::init_tracing;
use uuidify_rs::server;
use uuidify_rs::state::AppState;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const CONFIG_PATH_ENV: &str = "UUIDIFY_CONFIG";

fn main() {
    let config_path =
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = load_config(&config_path).unwrap_or_else(|e| {
        eprintln!("Copy 'config.example.yaml' to '{DEFAULT_CONFIG_PATH}' or point {CONFIG_PATH_ENV} at a config file.");
        exit_with(&format!("Failed to load configuration from '{config_path}'"), e)
    });

    init_tracing(&config.features.log_level);
    let runtime = build_runtime(&config.server)
        .unwrap_or_else(|e| exit_with("Failed to initialize Tokio runtime", e));
    let state = AppState::from_config(config)
        .unwrap_or_else(|e| exit_with("Failed to initialize UUID engine", e));

    if let Err(err) = runtime.block_on(server::run(Arc::new(state))) {
        exit_with("Server failed", err);
    }
}

fn exit_with(context: &str, err: impl Display) -> ! {
    tracing::error!("{context}: {err}");
    eprintln!("{context}: {err}");
    std::process::exit(1);
}

/// A single worker thread selects the current-thread runtime; stack size only
/// applies to multi-thread workers.
fn build_runtime(server: &ServerConfig) -> io::Result<tokio::runtime::Runtime> {
    let mut builder = match server.runtime_worker_threads {
        Some(1) => tokio::runtime::Builder::new_current_thread(),
        worker_threads => {
            let mut builder = tokio::runtime::Builder::new_multi_thread();
            if let Some(threads) = worker_threads {
                builder.worker_threads(threads);
            }
            if let Some(stack_kb) = server.runtime_thread_stack_size_kb {
                builder.thread_stack_size(stack_kb * 1024);
            }
            builder
        }
    };
    builder.enable_io().enable_time();
    if let Some(max_blocking_threads) = server.runtime_max_blocking_threads {
        builder.max_blocking_threads(max_blocking_threads);
    }
    builder.build()
}
