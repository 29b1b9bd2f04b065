//! Feed proxy handlers.

use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::feed::{validate_url, ATOM_CONTENT_TYPE};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Query parameters for `GET /feed`.
#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    /// Address of the origin feed.
    pub url: Option<String>,
}

/// GET /feed?url=... - Fetch, translate and re-render a feed.
pub async fn get_feed(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>,
) -> Result<Response, ApiError> {
    let url = match query.url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => url,
        _ => return Err(ApiError::bad_request("missing required query parameter: url")),
    };

    if state.block_private_networks {
        validate_url(url)?;
    }

    let body = state.pipeline.run(url).await?;

    // Headers are fixed here, before the body is handed to the response.
    let headers = [
        (
            header::CONTENT_TYPE,
            HeaderValue::from_static(ATOM_CONTENT_TYPE),
        ),
        (header::CACHE_CONTROL, state.cache_control.clone()),
    ];
    Ok((StatusCode::OK, headers, body).into_response())
}

/// GET /health - Liveness check.
pub async fn health() -> &'static str {
    "OK"
}
