//! Debounced unified search: file names and document content side by side.
//!
//! Every keystroke bumps a generation counter. A query pair only renders its
//! results while the generation it was issued under is still current, so a
//! slow response for an abandoned query can never replace the results of a
//! newer one.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::backend::ViewerBackend;
use crate::index::ContextHit;
use crate::text::highlight_matches;
use crate::tree::flatten_files;

pub const NO_FILES_MESSAGE: &str = "No files found.";
pub const NO_CONTENT_MESSAGE: &str = "No content found.";

const PANEL_GAP: f64 = 4.0;
const PANEL_MIN_WIDTH: f64 = 600.0;
const PANEL_VIEWPORT_SHARE: f64 = 0.7;
const PANEL_MAX_WIDTH: f64 = 1200.0;

/// What the viewer should load after a result was picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub path: String,
    pub query: String,
    /// Preview text of a content hit, used to relocate the passage.
    pub context: Option<String>,
}

impl LoadRequest {
    #[must_use]
    pub fn plain(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: String::new(),
            context: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResultList<T> {
    /// Nothing rendered yet for the current input.
    Cleared,
    NoResults,
    Entries(Vec<T>),
}

impl<T> ResultList<T> {
    fn from_entries(entries: Vec<T>) -> Self {
        if entries.is_empty() {
            Self::NoResults
        } else {
            Self::Entries(entries)
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[T] {
        match self {
            Self::Entries(entries) => entries,
            Self::Cleared | Self::NoResults => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResult {
    pub path: String,
    /// Escaped path with matches wrapped in `<mark>`.
    pub label_html: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentResult {
    pub hit: ContextHit,
    pub path_html: String,
    pub preview_html: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputRect {
    pub left: f64,
    pub bottom: f64,
    pub width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scroll_x: f64,
    pub scroll_y: f64,
    pub width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelPlacement {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub max_width: f64,
}

impl PanelPlacement {
    /// Anchors the panel just below the search input.
    #[must_use]
    pub fn below(input: InputRect, viewport: Viewport) -> Self {
        Self {
            left: input.left + viewport.scroll_x,
            top: input.bottom + viewport.scroll_y + PANEL_GAP,
            width: PANEL_MIN_WIDTH
                .max(input.width)
                .max(viewport.width * PANEL_VIEWPORT_SHARE),
            max_width: PANEL_MAX_WIDTH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    Input,
    Panel,
    Elsewhere,
}

/// Explicit search state, reset on every keystroke.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    pub input: String,
    pub generation: u64,
    pub panel_visible: bool,
    pub placement: Option<PanelPlacement>,
    pub files: ResultList<FileResult>,
    pub content: ResultList<ContentResult>,
    layout: Option<(InputRect, Viewport)>,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            input: String::new(),
            generation: 0,
            panel_visible: false,
            placement: None,
            files: ResultList::Cleared,
            content: ResultList::Cleared,
            layout: None,
        }
    }
}

impl SearchState {
    fn invalidate(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn reposition(&mut self) {
        self.placement = self
            .layout
            .map(|(input, viewport)| PanelPlacement::below(input, viewport));
    }
}

pub struct SearchCoordinator<B> {
    backend: Rc<B>,
    state: Rc<RefCell<SearchState>>,
    debounce: Duration,
}

impl<B> std::fmt::Debug for SearchCoordinator<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchCoordinator")
            .field("state", &self.state.borrow())
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

impl<B: ViewerBackend + 'static> SearchCoordinator<B> {
    #[must_use]
    pub fn new(backend: Rc<B>, debounce: Duration) -> Self {
        Self {
            backend,
            state: Rc::new(RefCell::new(SearchState::default())),
            debounce,
        }
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    /// Handles an edit of the search input. Must run inside a `LocalSet`.
    pub fn input_changed(&self, value: &str) {
        let generation = {
            let mut state = self.state.borrow_mut();
            state.input = value.to_string();
            state.files = ResultList::Cleared;
            state.content = ResultList::Cleared;
            let generation = state.invalidate();
            if value.trim().is_empty() {
                state.panel_visible = false;
                return;
            }
            generation
        };

        let query = value.trim().to_string();
        let backend = Rc::clone(&self.backend);
        let state = Rc::clone(&self.state);
        let debounce = self.debounce;
        tokio::task::spawn_local(async move {
            tokio::time::sleep(debounce).await;
            {
                let mut current = state.borrow_mut();
                if current.generation != generation {
                    return;
                }
                current.reposition();
                current.panel_visible = true;
            }
            tracing::debug!(%query, generation, "running unified search");
            tokio::join!(
                run_file_query(&*backend, &state, &query, generation),
                run_content_query(&*backend, &state, &query, generation),
            );
        });
    }

    /// Escape clears the input and hides the panel.
    pub fn escape_pressed(&self) {
        let mut state = self.state.borrow_mut();
        state.invalidate();
        state.input.clear();
        state.panel_visible = false;
    }

    pub fn clicked(&self, target: ClickTarget) {
        if target == ClickTarget::Elsewhere {
            self.state.borrow_mut().panel_visible = false;
        }
    }

    /// Records the input's position. A visible panel follows it, a hidden one
    /// is left alone.
    pub fn viewport_changed(&self, input: InputRect, viewport: Viewport) {
        let mut state = self.state.borrow_mut();
        state.layout = Some((input, viewport));
        if state.panel_visible {
            state.reposition();
        }
    }

    pub fn select_file(&self, index: usize) -> Option<LoadRequest> {
        let mut state = self.state.borrow_mut();
        let path = state.files.entries().get(index)?.path.clone();
        let query = state.input.trim().to_string();
        close_after_selection(&mut state);
        Some(LoadRequest {
            path,
            query,
            context: None,
        })
    }

    pub fn select_content(&self, index: usize) -> Option<LoadRequest> {
        let mut state = self.state.borrow_mut();
        let hit = state.content.entries().get(index)?.hit.clone();
        let query = state.input.trim().to_string();
        close_after_selection(&mut state);
        Some(LoadRequest {
            path: hit.path,
            query,
            context: Some(hit.preview),
        })
    }
}

fn close_after_selection(state: &mut SearchState) {
    state.invalidate();
    state.input.clear();
    state.panel_visible = false;
}

async fn run_file_query<B: ViewerBackend>(
    backend: &B,
    state: &RefCell<SearchState>,
    query: &str,
    generation: u64,
) {
    let tree = match backend.fetch_tree().await {
        Ok(tree) => tree,
        Err(err) => {
            tracing::warn!(error = %err, %query, "file name search failed");
            return;
        }
    };
    let needle = query.to_lowercase();
    let results = flatten_files(&tree)
        .into_iter()
        .filter(|path| path.to_lowercase().contains(&needle))
        .map(|path| FileResult {
            label_html: highlight_matches(&path, query),
            path,
        })
        .collect::<Vec<_>>();

    let mut state = state.borrow_mut();
    if state.generation != generation {
        tracing::debug!(%query, generation, "dropping stale file results");
        return;
    }
    state.files = ResultList::from_entries(results);
}

async fn run_content_query<B: ViewerBackend>(
    backend: &B,
    state: &RefCell<SearchState>,
    query: &str,
    generation: u64,
) {
    let hits = match backend.search_content(query).await {
        Ok(hits) => hits,
        Err(err) => {
            tracing::warn!(error = %err, %query, "content search failed");
            return;
        }
    };
    let results = hits
        .into_iter()
        .map(|hit| ContentResult {
            path_html: highlight_matches(&hit.path, query),
            preview_html: highlight_matches(&hit.preview, query),
            hit,
        })
        .collect::<Vec<_>>();

    let mut state = state.borrow_mut();
    if state.generation != generation {
        tracing::debug!(%query, generation, "dropping stale content results");
        return;
    }
    state.content = ResultList::from_entries(results);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RenderedDocument;
    use crate::error::{LensError, Result};
    use crate::tree::TreeItem;
    use tokio::task::LocalSet;
    use tokio::time::sleep;

    const DEBOUNCE: Duration = Duration::from_millis(300);

    /// Answers content queries after a per-query delay.
    #[derive(Default)]
    struct ScriptedBackend {
        tree: Vec<TreeItem>,
        delays: Vec<(&'static str, Duration)>,
        fail_content: bool,
        calls: RefCell<Vec<String>>,
    }

    impl ViewerBackend for ScriptedBackend {
        async fn fetch_tree(&self) -> Result<Vec<TreeItem>> {
            Ok(self.tree.clone())
        }

        async fn fetch_document(&self, path: &str) -> Result<RenderedDocument> {
            Err(LensError::NotFound(path.to_string()))
        }

        async fn search_content(&self, query: &str) -> Result<Vec<ContextHit>> {
            self.calls.borrow_mut().push(query.to_string());
            let delay = self
                .delays
                .iter()
                .find(|(q, _)| *q == query)
                .map(|(_, delay)| *delay)
                .unwrap_or_default();
            sleep(delay).await;
            if self.fail_content {
                return Err(LensError::Internal("index offline".to_string()));
            }
            Ok(vec![ContextHit {
                path: format!("{query}.md"),
                preview: format!("about <{query}> & more"),
                lineno: 1,
            }])
        }
    }

    fn file(path: &str) -> TreeItem {
        TreeItem::File {
            name: path.rsplit('/').next().unwrap_or(path).to_string(),
            path: path.to_string(),
        }
    }

    fn coordinator(backend: ScriptedBackend) -> SearchCoordinator<ScriptedBackend> {
        SearchCoordinator::new(Rc::new(backend), DEBOUNCE)
    }

    #[tokio::test(start_paused = true)]
    async fn keystrokes_within_the_quiet_period_issue_one_query() {
        LocalSet::new()
            .run_until(async {
                let search = coordinator(ScriptedBackend::default());
                search.input_changed("f");
                sleep(Duration::from_millis(100)).await;
                search.input_changed("fo");
                sleep(Duration::from_millis(100)).await;
                search.input_changed("foo");
                assert!(!search.state().panel_visible);

                sleep(DEBOUNCE + Duration::from_millis(10)).await;
                assert_eq!(*search.backend.calls.borrow(), vec!["foo".to_string()]);
                assert!(search.state().panel_visible);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn late_response_for_an_older_query_is_discarded() {
        LocalSet::new()
            .run_until(async {
                let search = coordinator(ScriptedBackend {
                    delays: vec![
                        ("foo", Duration::from_millis(1000)),
                        ("foobar", Duration::from_millis(50)),
                    ],
                    ..ScriptedBackend::default()
                });

                search.input_changed("foo");
                sleep(DEBOUNCE + Duration::from_millis(100)).await;
                search.input_changed("foobar");
                sleep(DEBOUNCE + Duration::from_millis(100)).await;

                let shown = search.state().content;
                assert_eq!(shown.entries().len(), 1);
                assert_eq!(shown.entries()[0].hit.path, "foobar.md");

                // "foo" resolves long after "foobar" was rendered.
                sleep(Duration::from_millis(1000)).await;
                let still_shown = search.state().content;
                assert_eq!(still_shown.entries()[0].hit.path, "foobar.md");
                assert_eq!(search.backend.calls.borrow().len(), 2);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn empty_input_clears_and_hides_immediately() {
        LocalSet::new()
            .run_until(async {
                let search = coordinator(ScriptedBackend::default());
                search.input_changed("foo");
                sleep(DEBOUNCE * 2).await;
                assert!(search.state().panel_visible);

                search.input_changed("   ");
                let state = search.state();
                assert!(!state.panel_visible);
                assert_eq!(state.files, ResultList::Cleared);
                assert_eq!(state.content, ResultList::Cleared);

                sleep(DEBOUNCE * 2).await;
                assert_eq!(search.backend.calls.borrow().len(), 1);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn results_are_escaped_and_highlighted() {
        LocalSet::new()
            .run_until(async {
                let search = coordinator(ScriptedBackend {
                    tree: vec![file("docs/Foo-guide.md"), file("other.md")],
                    ..ScriptedBackend::default()
                });
                search.input_changed("foo");
                sleep(DEBOUNCE * 2).await;

                let state = search.state();
                assert_eq!(
                    state.files.entries(),
                    &[FileResult {
                        path: "docs/Foo-guide.md".to_string(),
                        label_html: "docs/<mark>Foo</mark>-guide.md".to_string(),
                    }]
                );
                assert_eq!(
                    state.content.entries()[0].preview_html,
                    "about &lt;<mark>foo</mark>&gt; &amp; more"
                );
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn entity_names_in_the_query_do_not_mark_escaped_markup() {
        LocalSet::new()
            .run_until(async {
                let search = coordinator(ScriptedBackend::default());
                search.input_changed("amp lt");
                sleep(DEBOUNCE * 2).await;

                assert_eq!(
                    search.state().content.entries()[0].preview_html,
                    "about &lt;<mark>amp</mark> <mark>lt</mark>&gt; &amp; more"
                );
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn empty_and_failed_queries_render_independently() {
        LocalSet::new()
            .run_until(async {
                let search = coordinator(ScriptedBackend {
                    tree: vec![file("other.md")],
                    fail_content: true,
                    ..ScriptedBackend::default()
                });
                search.input_changed("zzz");
                sleep(DEBOUNCE * 2).await;

                let state = search.state();
                assert_eq!(state.files, ResultList::NoResults);
                assert_eq!(state.content, ResultList::Cleared);
                assert!(state.panel_visible);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn selecting_results_builds_load_requests_and_closes() {
        LocalSet::new()
            .run_until(async {
                let search = coordinator(ScriptedBackend {
                    tree: vec![file("foo.md")],
                    ..ScriptedBackend::default()
                });
                search.input_changed(" foo ");
                sleep(DEBOUNCE * 2).await;

                assert_eq!(
                    search.select_file(0),
                    Some(LoadRequest {
                        path: "foo.md".to_string(),
                        query: "foo".to_string(),
                        context: None,
                    })
                );
                let state = search.state();
                assert!(state.input.is_empty());
                assert!(!state.panel_visible);

                search.input_changed("foo");
                sleep(DEBOUNCE * 2).await;
                let request = search.select_content(0).expect("content result");
                assert_eq!(request.context.as_deref(), Some("about <foo> & more"));
                assert_eq!(search.select_content(5), None);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn escape_and_outside_clicks_hide_the_panel() {
        LocalSet::new()
            .run_until(async {
                let search = coordinator(ScriptedBackend::default());
                search.input_changed("foo");
                sleep(DEBOUNCE * 2).await;

                search.clicked(ClickTarget::Panel);
                search.clicked(ClickTarget::Input);
                assert!(search.state().panel_visible);
                search.clicked(ClickTarget::Elsewhere);
                assert!(!search.state().panel_visible);

                search.input_changed("foo");
                search.escape_pressed();
                sleep(DEBOUNCE * 2).await;
                let state = search.state();
                assert!(state.input.is_empty());
                assert!(!state.panel_visible);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn panel_follows_viewport_only_while_visible() {
        LocalSet::new()
            .run_until(async {
                let search = coordinator(ScriptedBackend::default());
                let input = InputRect {
                    left: 10.0,
                    bottom: 40.0,
                    width: 300.0,
                };
                search.viewport_changed(
                    input,
                    Viewport {
                        scroll_x: 0.0,
                        scroll_y: 100.0,
                        width: 1000.0,
                    },
                );
                assert_eq!(search.state().placement, None);

                search.input_changed("foo");
                sleep(DEBOUNCE * 2).await;
                assert_eq!(
                    search.state().placement,
                    Some(PanelPlacement {
                        left: 10.0,
                        top: 144.0,
                        width: 700.0,
                        max_width: 1200.0,
                    })
                );

                search.viewport_changed(
                    input,
                    Viewport {
                        scroll_x: 5.0,
                        scroll_y: 0.0,
                        width: 500.0,
                    },
                );
                let placement = search.state().placement.expect("placement");
                assert_eq!((placement.left, placement.top, placement.width), (15.0, 44.0, 600.0));
            })
            .await;
    }
}
