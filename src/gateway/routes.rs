//! Gateway routes
//!
//! Request/response types and handlers for the HTTP surface.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::error::CfgError;
use crate::record::TypeTag;
use crate::store::VersionedStore;

/// Wire error codes
pub mod err_code {
    pub const OK: i32 = 0;
    pub const MALFORMED: i32 = 1;
    pub const INVALID_TYPE: i32 = 2;
    pub const STORE_FAILURE: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
}

/// Body of `POST /update`
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub key: String,
    pub data: String,
    #[serde(rename = "type")]
    pub type_tag: String,
}

/// Response of `POST /update`
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateResponse {
    #[serde(rename = "errCode")]
    pub err_code: i32,
    #[serde(default)]
    pub error: String,
    pub data: Option<String>,
}

/// Response of `GET /:key/:version`
#[derive(Debug, Serialize, Deserialize)]
pub struct FetchResponse {
    #[serde(rename = "errCode")]
    pub err_code: i32,
    #[serde(default)]
    pub error: String,
    pub data: Option<String>,
    #[serde(rename = "type")]
    pub tag: Option<TypeTag>,
}

/// Build the gateway router over a store.
pub fn router(store: Arc<VersionedStore>) -> Router {
    Router::new()
        .route("/update", post(update))
        .route("/:key/:version", get(fetch))
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

/// Handler for `POST /update`: store a new version of a key.
async fn update(
    State(store): State<Arc<VersionedStore>>,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> (StatusCode, Json<UpdateResponse>) {
    let Json(req) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            return (
                StatusCode::OK,
                Json(UpdateResponse {
                    err_code: err_code::MALFORMED,
                    error: rejection.body_text(),
                    data: None,
                }),
            );
        }
    };

    // Parse the tag before touching the store: an invalid type is a no-op.
    let tag = match TypeTag::from_str(&req.type_tag) {
        Ok(tag) => tag,
        Err(e) => {
            return (
                StatusCode::OK,
                Json(UpdateResponse {
                    err_code: err_code::INVALID_TYPE,
                    error: e.to_string(),
                    data: Some(req.data),
                }),
            );
        }
    };

    // The write hits disk; keep it off the async workers.
    let result = {
        let store = Arc::clone(&store);
        let key = req.key.clone();
        let data = req.data.clone();
        tokio::task::spawn_blocking(move || store.write(&key, data, tag)).await
    };

    match result {
        Ok(Ok(_version)) => (
            StatusCode::OK,
            Json(UpdateResponse {
                err_code: err_code::OK,
                error: String::new(),
                data: None,
            }),
        ),
        Ok(Err(e)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(UpdateResponse {
                err_code: err_code::STORE_FAILURE,
                error: e.to_string(),
                data: Some(req.data),
            }),
        ),
        Err(join_err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(UpdateResponse {
                err_code: err_code::STORE_FAILURE,
                error: join_err.to_string(),
                data: Some(req.data),
            }),
        ),
    }
}

/// Handler for `GET /:key/:version`: fetch a version of a key (0 = latest).
async fn fetch(
    State(store): State<Arc<VersionedStore>>,
    Path((key, version)): Path<(String, u64)>,
) -> (StatusCode, Json<FetchResponse>) {
    let result = if version == 0 {
        // Latest reads never leave memory.
        store.get(&key, 0)
    } else {
        let store = Arc::clone(&store);
        let key = key.clone();
        match tokio::task::spawn_blocking(move || store.get(&key, version)).await {
            Ok(result) => result,
            Err(join_err) => Err(CfgError::Network(join_err.to_string())),
        }
    };

    match result {
        Ok((data, tag)) => (
            StatusCode::OK,
            Json(FetchResponse {
                err_code: err_code::OK,
                error: String::new(),
                data: Some(data),
                tag: Some(tag),
            }),
        ),
        Err(e) if e.is_not_found() => (
            StatusCode::NOT_FOUND,
            Json(FetchResponse {
                err_code: err_code::NOT_FOUND,
                error: e.to_string(),
                data: None,
                tag: None,
            }),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(FetchResponse {
                err_code: err_code::STORE_FAILURE,
                error: e.to_string(),
                data: None,
                tag: None,
            }),
        ),
    }
}
