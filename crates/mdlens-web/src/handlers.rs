use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use mdlens_core::render::{render_markdown, render_markdown_html};
use mdlens_core::{ContentIndex, LensError};

use crate::WebState;
use crate::dto::{DocumentResponse, FileQuery, RefreshResponse, SearchQuery};
use crate::error::lens_error_response;

const REFRESHED_MESSAGE: &str = "Index refreshed successfully.";

pub async fn tree(State(state): State<WebState>) -> Response {
    match state.root.tree() {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(err) => lens_error_response(err, "tree.list", None),
    }
}

pub async fn content(State(state): State<WebState>, Query(query): Query<FileQuery>) -> Response {
    let file = match required_file(query) {
        Ok(file) => file,
        Err(err) => return lens_error_response(err, "content.load", None),
    };
    match state.root.read(&file) {
        Ok(markdown) => Html(render_markdown_html(&markdown)).into_response(),
        Err(err) => lens_error_response(err, "content.load", Some(file)),
    }
}

pub async fn load_document(
    State(state): State<WebState>,
    Query(query): Query<FileQuery>,
) -> Response {
    let file = match required_file(query) {
        Ok(file) => file,
        Err(err) => return lens_error_response(err, "document.load", None),
    };
    let markdown = match state.root.read(&file) {
        Ok(markdown) => markdown,
        Err(err) => return lens_error_response(err, "document.load", Some(file)),
    };
    let response = DocumentResponse {
        etag: blake3::hash(markdown.as_bytes()).to_hex().to_string(),
        markup: render_markdown(&markdown),
        path: file,
    };
    (StatusCode::OK, Json(response)).into_response()
}

pub async fn search(State(state): State<WebState>, Query(query): Query<SearchQuery>) -> Response {
    let hits = state.index.read().await.query(&query.query, &state.config);
    tracing::debug!(query = %query.query, hits = hits.len(), "content search");
    (StatusCode::OK, Json(hits)).into_response()
}

pub async fn refresh_index(State(state): State<WebState>) -> Response {
    let root = state.root.clone();
    let rebuilt = match tokio::task::spawn_blocking(move || ContentIndex::index_directory(&root))
        .await
    {
        Ok(Ok(index)) => index,
        Ok(Err(err)) => return lens_error_response(err, "index.refresh", None),
        Err(join_err) => {
            return lens_error_response(
                LensError::Internal(format!("indexing task failed: {join_err}")),
                "index.refresh",
                None,
            );
        }
    };
    let indexed_files = rebuilt.len();
    *state.index.write().await = rebuilt;

    let response = RefreshResponse {
        message: REFRESHED_MESSAGE.to_string(),
        indexed_files,
        indexed_at: chrono::Utc::now().to_rfc3339(),
    };
    (StatusCode::OK, Json(response)).into_response()
}

fn required_file(query: FileQuery) -> Result<String, LensError> {
    query
        .file
        .filter(|file| !file.trim().is_empty())
        .ok_or_else(|| LensError::Validation("missing file path".to_string()))
}
