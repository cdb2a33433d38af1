//! Page-level wiring of the sidebar tree, the search box and the viewer.

use std::cell::RefCell;
use std::rc::Rc;

use crate::backend::ViewerBackend;
use crate::config::LensConfig;
use crate::coordinator::{LoadRequest, SearchCoordinator};
use crate::dom::NodeId;
use crate::tree::{TreeAction, TreeView};
use crate::viewer::Viewer;

pub const DIR_TREE_ROOT_ID: &str = "dir-tree-root";

pub struct ViewerApp<B> {
    viewer: Viewer<B>,
    search: SearchCoordinator<B>,
    tree_view: RefCell<TreeView>,
    backend: Rc<B>,
}

impl<B> std::fmt::Debug for ViewerApp<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewerApp")
            .field("viewer", &self.viewer)
            .field("search", &self.search)
            .finish_non_exhaustive()
    }
}

impl<B: ViewerBackend + 'static> ViewerApp<B> {
    #[must_use]
    pub fn new(backend: B, config: LensConfig) -> Self {
        let backend = Rc::new(backend);
        Self {
            viewer: Viewer::new(Rc::clone(&backend), config),
            search: SearchCoordinator::new(Rc::clone(&backend), config.search.debounce),
            tree_view: RefCell::new(TreeView::new(DIR_TREE_ROOT_ID)),
            backend,
        }
    }

    #[must_use]
    pub fn viewer(&self) -> &Viewer<B> {
        &self.viewer
    }

    #[must_use]
    pub fn search(&self) -> &SearchCoordinator<B> {
        &self.search
    }

    #[must_use]
    pub fn tree_view(&self) -> &RefCell<TreeView> {
        &self.tree_view
    }

    /// Fetches and renders the directory tree. A failure leaves the previous
    /// tree in place.
    pub async fn load_tree(&self) {
        match self.backend.fetch_tree().await {
            Ok(items) => self.tree_view.borrow_mut().render(&items),
            Err(err) => tracing::warn!(error = %err, "failed to load directory tree"),
        }
    }

    /// Opens `path` on page load, if the page was addressed to a file.
    pub async fn start(&self, initial_path: Option<&str>) {
        self.load_tree().await;
        if let Some(path) = initial_path.filter(|path| !path.is_empty()) {
            self.open(LoadRequest::plain(path)).await;
        }
    }

    pub async fn tree_entry_clicked(&self, entry: NodeId) {
        let action = self.tree_view.borrow_mut().activate(entry);
        if let Some(TreeAction::OpenFile { path }) = action
            && let Err(err) = self.viewer.open_from_tree(&path).await
        {
            tracing::warn!(error = %err, %path, "failed to open document from tree");
        }
    }

    pub fn toc_entry_clicked(&self, entry: NodeId) {
        let action = self.viewer.toc_view().borrow_mut().activate(entry);
        if let Some(TreeAction::ScrollToHeading { id }) = action {
            self.viewer.scroll_to_heading(&id);
        }
    }

    pub async fn file_result_selected(&self, index: usize) {
        if let Some(request) = self.search.select_file(index) {
            self.open(request).await;
        }
    }

    pub async fn content_result_selected(&self, index: usize) {
        if let Some(request) = self.search.select_content(index) {
            self.open(request).await;
        }
    }

    async fn open(&self, request: LoadRequest) {
        if let Err(err) = self.viewer.open(&request).await {
            tracing::warn!(error = %err, path = %request.path, "failed to open document");
        }
    }
}
