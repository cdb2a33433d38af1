use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router, middleware,
    routing::{get, post},
};
use tokio::sync::RwLock;

use mdlens_core::config::IndexConfig;
use mdlens_core::{ContentIndex, DocumentRoot};

mod dto;
mod error;
mod handlers;
mod security;


#[derive(Clone)]
pub(crate) struct WebState {
    pub(crate) root: DocumentRoot,
    pub(crate) index: Arc<RwLock<ContentIndex>>,
    pub(crate) config: IndexConfig,
}

impl WebState {
    fn new(root: DocumentRoot, index: ContentIndex, config: IndexConfig) -> Self {
        Self {
            root,
            index: Arc::new(RwLock::new(index)),
            config,
        }
    }
}

/// Index `root`, serve it and block until ctrl-c.
///
/// # Errors
/// Returns an error when the root cannot be opened or indexed, the runtime
/// cannot be created, the socket cannot be bound, or the server fails.
pub fn serve_web(root: &Path, host: &str, port: u16, config: IndexConfig) -> Result<()> {
    let state = build_state(root, config)?;
    let bind_addr = format!("{host}:{port}");
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build web runtime")?;

    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(&bind_addr)
            .await
            .with_context(|| format!("failed to bind web server at {bind_addr}"))?;
        tracing::info!(
            addr = %listener.local_addr()?,
            root = %state.root.path().display(),
            "markdown viewer listening"
        );

        axum::serve(listener, app_router(state))
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await
            .context("web server failed")
    })
}

pub(crate) fn build_state(root: &Path, config: IndexConfig) -> Result<WebState> {
    let root = DocumentRoot::open(root)
        .with_context(|| format!("cannot serve {}", root.display()))?;
    let index = ContentIndex::index_directory(&root).context("initial indexing failed")?;
    Ok(WebState::new(root, index, config))
}

pub(crate) fn app_router(state: WebState) -> Router {
    Router::new()
        .route("/api/tree", get(handlers::tree))
        .route("/api/document", get(handlers::load_document))
        .route("/content", get(handlers::content))
        .route("/search", get(handlers::search))
        .route("/refresh_index", post(handlers::refresh_index))
        .layer(middleware::from_fn(security::security_headers_middleware))
        .with_state(state)
}
