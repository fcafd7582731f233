//! Batch endpoint: every item of one HTTP request runs in the same scope and
//! arena, so v1 items share clock state and v3/v5 items share namespaces.

use axum::response::{IntoResponse, Json, Response};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::engine::{Scope, UuidRequest};
use crate::error::{error_payload, ServiceError};
use crate::observability::log_request_failure;
use crate::state::AppState;

const ROUTE: &str = "uuid_batch";

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub requests: Vec<BatchItem>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "version", rename_all = "lowercase")]
pub enum BatchItem {
    Default,
    V1,
    V3 {
        #[serde(default)]
        namespace: String,
        #[serde(default)]
        name: String,
    },
    V4,
    V5 {
        #[serde(default)]
        namespace: String,
        #[serde(default)]
        name: String,
    },
}

impl BatchItem {
    #[must_use]
    pub fn as_request(&self) -> UuidRequest<'_> {
        match self {
            BatchItem::Default => UuidRequest::default(),
            BatchItem::V1 => UuidRequest::V1,
            BatchItem::V3 { namespace, name } => UuidRequest::V3 { namespace, name },
            BatchItem::V4 => UuidRequest::V4,
            BatchItem::V5 { namespace, name } => UuidRequest::V5 { namespace, name },
        }
    }
}

pub fn handler(state: &AppState, body: &Bytes) -> Response {
    match run_batch(state, body) {
        Ok(results) => Json(json!({ "results": results })).into_response(),
        Err(err) => {
            log_request_failure(ROUTE, &err);
            err.into_response()
        }
    }
}

fn run_batch(state: &AppState, body: &Bytes) -> Result<Vec<Value>, ServiceError> {
    let batch: BatchRequest = serde_json::from_slice(body)
        .map_err(|e| ServiceError::InvalidRequest(format!("Invalid batch body: {e}")))?;
    if batch.requests.is_empty() {
        return Err(ServiceError::InvalidRequest(
            "requests must not be empty".to_string(),
        ));
    }
    let max = state.max_batch_size();
    if batch.requests.len() > max {
        return Err(ServiceError::InvalidRequest(format!(
            "batch of {} exceeds max_batch_size {max}",
            batch.requests.len()
        )));
    }

    let mut workspace = state.acquire_workspace();
    let mut arena = workspace.arena();
    let mut scope = Scope::new();
    let results = batch
        .requests
        .iter()
        .map(|item| {
            match state
                .generator
                .write(&mut scope, &mut arena, &item.as_request())
            {
                Ok(text) => json!({ "uuid": text }),
                Err(err) => {
                    let code = err.code();
                    let message = err.to_string();
                    log_request_failure(ROUTE, &ServiceError::from(err));
                    error_payload(code, &message)
                }
            }
        })
        .collect();
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_items_decode_by_version_tag() {
        let batch: BatchRequest = serde_json::from_str(
            r#"{"requests":[
                {"version":"v1"},
                {"version":"default"},
                {"version":"v3","namespace":"DNS","name":"example.com"},
                {"version":"v5","name":"only-name"},
                {"version":"v4"}
            ]}"#,
        )
        .unwrap();
        let requests: Vec<UuidRequest<'_>> =
            batch.requests.iter().map(BatchItem::as_request).collect();
        assert_eq!(
            requests,
            vec![
                UuidRequest::V1,
                UuidRequest::V1,
                UuidRequest::V3 {
                    namespace: "DNS",
                    name: "example.com"
                },
                UuidRequest::V5 {
                    namespace: "",
                    name: "only-name"
                },
                UuidRequest::V4,
            ]
        );
    }

    #[test]
    fn unknown_version_is_rejected() {
        let result: Result<BatchRequest, _> =
            serde_json::from_str(r#"{"requests":[{"version":"v2"}]}"#);
        assert!(result.is_err());
    }
}
