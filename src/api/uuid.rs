//! Single-UUID endpoints. Each HTTP request gets its own scope and arena.

use axum::body::Body;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use http::{header, HeaderValue};

use crate::engine::{Scope, UuidRequest};
use crate::error::ServiceError;
use crate::observability::log_request_failure;
use crate::state::AppState;

/// Which single-UUID endpoint was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UuidRoute {
    Default,
    V1,
    V3,
    V4,
    V5,
}

impl UuidRoute {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            UuidRoute::Default => "uuid",
            UuidRoute::V1 => "uuid_v1",
            UuidRoute::V3 => "uuid_v3",
            UuidRoute::V4 => "uuid_v4",
            UuidRoute::V5 => "uuid_v5",
        }
    }
}

/// Namespace and name taken from the query string. Absent values stay empty
/// and are rejected by the engine.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct NameArgs {
    pub(crate) namespace: String,
    pub(crate) name: String,
}

impl NameArgs {
    pub(crate) fn from_query(query: Option<&str>) -> Self {
        let mut args = Self::default();
        let Some(query) = query else {
            return args;
        };
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "namespace" | "ns" => args.namespace = value.into_owned(),
                "name" => args.name = value.into_owned(),
                _ => {}
            }
        }
        args
    }
}

pub fn handler(state: &AppState, route: UuidRoute, query: Option<&str>) -> Response {
    let args = match route {
        UuidRoute::V3 | UuidRoute::V5 => NameArgs::from_query(query),
        UuidRoute::Default | UuidRoute::V1 | UuidRoute::V4 => NameArgs::default(),
    };
    let request = match route {
        UuidRoute::Default => UuidRequest::default(),
        UuidRoute::V1 => UuidRequest::V1,
        UuidRoute::V3 => UuidRequest::V3 {
            namespace: &args.namespace,
            name: &args.name,
        },
        UuidRoute::V4 => UuidRequest::V4,
        UuidRoute::V5 => UuidRequest::V5 {
            namespace: &args.namespace,
            name: &args.name,
        },
    };

    let mut workspace = state.acquire_workspace();
    let mut arena = workspace.arena();
    let mut scope = Scope::new();
    match state.generator.write(&mut scope, &mut arena, &request) {
        Ok(text) => text_response(text),
        Err(err) => {
            let err = ServiceError::from(err);
            log_request_failure(route.as_str(), &err);
            err.into_response()
        }
    }
}

fn text_response(text: &str) -> Response {
    let mut response = Response::new(Body::from(Bytes::copy_from_slice(text.as_bytes())));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
