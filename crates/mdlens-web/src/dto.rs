use serde::{Deserialize, Serialize};

use mdlens_core::dom::Markup;

#[derive(Debug, Deserialize)]
pub struct FileQuery {
    pub file: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub path: String,
    pub etag: String,
    pub markup: Vec<Markup>,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub message: String,
    pub indexed_files: usize,
    pub indexed_at: String,
}
