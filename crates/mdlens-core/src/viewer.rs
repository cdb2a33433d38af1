use std::cell::RefCell;
use std::rc::Rc;

use crate::backend::ViewerBackend;
use crate::blocks::collect_blocks;
use crate::config::LensConfig;
use crate::coordinator::LoadRequest;
use crate::dom::{Document, NodeId};
use crate::error::Result;
use crate::highlight::highlight;
use crate::lifecycle::{SharedDocument, arm};
use crate::relocate::{Window, locate};
use crate::text::query_tokens;
use crate::tree::{TocEntry, TreeView, build_toc};

pub const VIEWER_ROOT_ID: &str = "markdown-body";
pub const TOC_CONTAINER_ID: &str = "toc-container";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollTarget {
    Top,
    /// Center the node in the viewport.
    Node(NodeId),
}

/// What a completed load did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOutcome {
    pub path: String,
    /// `None` when the load carried no query.
    pub window: Option<Window>,
    pub markers: Vec<NodeId>,
}

#[derive(Debug, Default)]
struct ViewerState {
    path: Option<String>,
    title: Option<String>,
    scroll: Option<ScrollTarget>,
    toc: Vec<TocEntry>,
}

/// The document pane with its table of contents.
pub struct Viewer<B> {
    backend: Rc<B>,
    document: SharedDocument,
    toc_view: RefCell<TreeView>,
    state: RefCell<ViewerState>,
    config: LensConfig,
}

impl<B> std::fmt::Debug for Viewer<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Viewer")
            .field("state", &self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl<B: ViewerBackend> Viewer<B> {
    #[must_use]
    pub fn new(backend: Rc<B>, config: LensConfig) -> Self {
        Self {
            backend,
            document: Rc::new(RefCell::new(Document::new("div", Some(VIEWER_ROOT_ID)))),
            toc_view: RefCell::new(TreeView::new(TOC_CONTAINER_ID)),
            state: RefCell::new(ViewerState::default()),
            config,
        }
    }

    #[must_use]
    pub fn document(&self) -> &SharedDocument {
        &self.document
    }

    #[must_use]
    pub fn current_path(&self) -> Option<String> {
        self.state.borrow().path.clone()
    }

    #[must_use]
    pub fn title(&self) -> Option<String> {
        self.state.borrow().title.clone()
    }

    #[must_use]
    pub fn scroll_target(&self) -> Option<ScrollTarget> {
        self.state.borrow().scroll
    }

    #[must_use]
    pub fn toc(&self) -> Vec<TocEntry> {
        self.state.borrow().toc.clone()
    }

    #[must_use]
    pub fn toc_view(&self) -> &RefCell<TreeView> {
        &self.toc_view
    }

    /// Loads a document and, when the request carries a query, relocates the
    /// remembered passage and highlights the query inside it.
    ///
    /// A failed fetch leaves the current document on screen. Must run inside a
    /// `LocalSet` since highlight timers are spawned locally.
    pub async fn open(&self, request: &LoadRequest) -> Result<OpenOutcome> {
        let rendered = self.backend.fetch_document(&request.path).await?;

        let toc = {
            let mut document = self.document.borrow_mut();
            document.load(&rendered.markup);
            build_toc(&mut document)
        };
        self.toc_view.borrow_mut().render_toc(&toc);
        {
            let mut state = self.state.borrow_mut();
            state.path = Some(request.path.clone());
            state.title = Some(request.path.clone());
            state.scroll = None;
            state.toc = toc;
        }

        let tokens = query_tokens(&request.query);
        if tokens.is_empty() {
            tracing::debug!(path = %request.path, "opened document");
            return Ok(OpenOutcome {
                path: request.path.clone(),
                window: None,
                markers: Vec::new(),
            });
        }

        let (window, outcome) = {
            let mut document = self.document.borrow_mut();
            let root = document.root();
            let blocks = collect_blocks(&document, root);
            let window = locate(request.context.as_deref().unwrap_or(""), &tokens, &blocks);
            let roots = match window {
                Window::WholeDocument => vec![root],
                Window::Range { .. } => window
                    .select(&blocks)
                    .iter()
                    .map(|block| block.node)
                    .collect(),
            };
            (window, highlight(&mut document, &roots, &tokens))
        };

        for marker in &outcome.markers {
            arm(&self.document, *marker, self.config.content_highlight);
        }
        if let Some(focus) = outcome.focus {
            self.state.borrow_mut().scroll = Some(ScrollTarget::Node(focus));
        }
        tracing::debug!(
            path = %request.path,
            ?window,
            markers = outcome.markers.len(),
            "opened document with highlights"
        );

        Ok(OpenOutcome {
            path: request.path.clone(),
            window: Some(window),
            markers: outcome.markers,
        })
    }

    /// Opens a file picked in the directory tree and scrolls to the top.
    pub async fn open_from_tree(&self, path: &str) -> Result<OpenOutcome> {
        let outcome = self.open(&LoadRequest::plain(path)).await?;
        self.state.borrow_mut().scroll = Some(ScrollTarget::Top);
        Ok(outcome)
    }

    /// Scrolls to a heading and flashes it. Unknown ids are ignored.
    pub fn scroll_to_heading(&self, id: &str) -> Option<NodeId> {
        let heading = self.document.borrow().element_by_id(id)?;
        self.state.borrow_mut().scroll = Some(ScrollTarget::Node(heading));
        arm(&self.document, heading, self.config.toc_highlight);
        Some(heading)
    }
}
