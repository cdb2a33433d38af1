// Public fallible APIs in this crate share one concrete error contract (`LensError`).
#![allow(
    clippy::missing_errors_doc,
    reason = "crate-wide fallible API uses one explicit error type; per-item boilerplate would duplicate contract"
)]

pub mod app;
pub mod backend;
pub mod blocks;
pub mod config;
pub mod coordinator;
pub mod dom;
pub mod error;
pub mod fs;
pub mod highlight;
pub mod index;
pub mod lifecycle;
pub mod relocate;
pub mod render;
pub mod text;
pub mod tree;
pub mod viewer;

pub use app::ViewerApp;
#[cfg(feature = "http-backend")]
pub use backend::HttpBackend;
pub use backend::{LocalBackend, RenderedDocument, ViewerBackend};
pub use config::LensConfig;
pub use coordinator::{LoadRequest, SearchCoordinator};
pub use error::{ErrorPayload, LensError, Result};
pub use fs::DocumentRoot;
pub use index::{ContentIndex, ContextHit};
pub use relocate::Window;
pub use viewer::Viewer;
