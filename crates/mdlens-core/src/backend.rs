//! Sources the viewer loads trees, documents and content hits from.

use std::cell::RefCell;

use serde::{Deserialize, Serialize};

use crate::config::IndexConfig;
use crate::dom::Markup;
use crate::error::Result;
use crate::fs::DocumentRoot;
use crate::index::{ContentIndex, ContextHit};
use crate::render::render_markdown;
use crate::tree::TreeItem;

/// A document ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedDocument {
    pub path: String,
    pub markup: Vec<Markup>,
}

/// The three queries the viewer issues. Implementations run on the viewer's
/// local task set, so futures need not be `Send`.
#[allow(async_fn_in_trait)]
pub trait ViewerBackend {
    async fn fetch_tree(&self) -> Result<Vec<TreeItem>>;

    async fn fetch_document(&self, path: &str) -> Result<RenderedDocument>;

    async fn search_content(&self, query: &str) -> Result<Vec<ContextHit>>;
}

/// Serves a document root from the current process.
#[derive(Debug)]
pub struct LocalBackend {
    root: DocumentRoot,
    index: RefCell<ContentIndex>,
    config: IndexConfig,
}

impl LocalBackend {
    pub fn open(root: DocumentRoot, config: IndexConfig) -> Result<Self> {
        let index = ContentIndex::index_directory(&root)?;
        Ok(Self {
            root,
            index: RefCell::new(index),
            config,
        })
    }

    #[must_use]
    pub fn root(&self) -> &DocumentRoot {
        &self.root
    }

    /// Rebuilds the content index. Returns the number of indexed files.
    pub fn refresh(&self) -> Result<usize> {
        let index = ContentIndex::index_directory(&self.root)?;
        let count = index.len();
        *self.index.borrow_mut() = index;
        Ok(count)
    }
}

impl ViewerBackend for LocalBackend {
    async fn fetch_tree(&self) -> Result<Vec<TreeItem>> {
        self.root.tree()
    }

    async fn fetch_document(&self, path: &str) -> Result<RenderedDocument> {
        let content = self.root.read(path)?;
        Ok(RenderedDocument {
            path: path.to_string(),
            markup: render_markdown(&content),
        })
    }

    async fn search_content(&self, query: &str) -> Result<Vec<ContextHit>> {
        Ok(self.index.borrow().query(query, &self.config))
    }
}

#[cfg(feature = "http-backend")]
pub use http::HttpBackend;

#[cfg(feature = "http-backend")]
mod http {
    use reqwest::{Client, Url};

    use super::{RenderedDocument, ViewerBackend};
    use crate::error::{LensError, Result};
    use crate::index::ContextHit;
    use crate::tree::{TreeItem, parse_listing};

    /// Talks to a running `mdlens serve` instance.
    #[derive(Debug, Clone)]
    pub struct HttpBackend {
        base: Url,
        http: Client,
    }

    impl HttpBackend {
        pub fn new(base_url: &str) -> Result<Self> {
            let normalized = format!("{}/", base_url.trim_end_matches('/'));
            let base = Url::parse(&normalized)
                .map_err(|e| LensError::Validation(format!("invalid base url {base_url}: {e}")))?;
            Ok(Self {
                base,
                http: Client::builder().build()?,
            })
        }

        fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
            let mut url = self
                .base
                .join(path)
                .map_err(|e| LensError::Validation(format!("invalid endpoint {path}: {e}")))?;
            if !query.is_empty() {
                url.query_pairs_mut().extend_pairs(query);
            }
            Ok(url)
        }
    }

    impl ViewerBackend for HttpBackend {
        async fn fetch_tree(&self) -> Result<Vec<TreeItem>> {
            let url = self.endpoint("api/tree", &[])?;
            let listing = self
                .http
                .get(url)
                .send()
                .await?
                .error_for_status()?
                .json::<serde_json::Value>()
                .await?;
            Ok(parse_listing(&listing))
        }

        async fn fetch_document(&self, path: &str) -> Result<RenderedDocument> {
            let url = self.endpoint("api/document", &[("file", path)])?;
            Ok(self
                .http
                .get(url)
                .send()
                .await?
                .error_for_status()?
                .json::<RenderedDocument>()
                .await?)
        }

        async fn search_content(&self, query: &str) -> Result<Vec<ContextHit>> {
            let url = self.endpoint("search", &[("query", query)])?;
            Ok(self
                .http
                .get(url)
                .send()
                .await?
                .error_for_status()?
                .json::<Vec<ContextHit>>()
                .await?)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn endpoints_keep_the_base_path_and_encode_queries() {
            let backend = HttpBackend::new("http://127.0.0.1:5000/viewer").expect("backend");
            let url = backend
                .endpoint("search", &[("query", "a b&c")])
                .expect("url");
            assert_eq!(url.as_str(), "http://127.0.0.1:5000/viewer/search?query=a+b%26c");
        }

        #[test]
        fn invalid_base_url_is_a_validation_error() {
            assert!(matches!(
                HttpBackend::new("not a url"),
                Err(LensError::Validation(_))
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn local_backend_serves_tree_documents_and_hits() {
        let temp = tempdir().expect("tempdir");
        fs::write(
            temp.path().join("guide.md"),
            "# Guide\n\nline two\nline three\nneedle four\nline five\n",
        )
        .expect("write");
        let root = DocumentRoot::open(temp.path()).expect("root");
        let backend = LocalBackend::open(root, IndexConfig::default()).expect("backend");

        let tree = backend.fetch_tree().await.expect("tree");
        assert_eq!(
            tree,
            vec![TreeItem::File {
                name: "guide.md".to_string(),
                path: "guide.md".to_string()
            }]
        );

        let doc = backend.fetch_document("guide.md").await.expect("document");
        assert_eq!(doc.markup[0], Markup::element("h1", vec![Markup::text("Guide")]));

        let hits = backend.search_content("NEEDLE guide").await.expect("hits");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].lineno, 1);

        fs::write(temp.path().join("late.md"), "late").expect("write");
        assert_eq!(backend.refresh().expect("refresh"), 2);
        assert!(backend.fetch_document("../escape.md").await.is_err());
    }
}
