use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// Health check handler.
/// Returns JSON with status and engine summary.
pub fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let config = &state.config;
    let generator = &state.generator;
    Json(json!({
        "status": "uuidify is running",
        "engine": {
            "node_id": config.engine.node_id.to_string(),
            "shared_node": generator.shared_node().map(|node| node.to_string()),
            "random_source": generator.random_source_name(),
            "workspace_bytes": config.engine.workspace_bytes,
            "workspace_pool_size": config.engine.workspace_pool_size,
            "idle_workspaces": state.idle_workspaces(),
            "max_batch_size": config.engine.max_batch_size,
        },
        "features": {
            "log_level": config.features.log_level,
        }
    }))
}
