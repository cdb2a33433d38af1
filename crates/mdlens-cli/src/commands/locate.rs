use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result, anyhow};
use serde_json::{Value, json};
use tokio::task::LocalSet;

use mdlens_core::blocks::collect_blocks;
use mdlens_core::viewer::OpenOutcome;
use mdlens_core::{
    DocumentRoot, LensConfig, LoadRequest, LocalBackend, Viewer, ViewerBackend, Window,
};

use crate::cli::LocateArgs;

/// Opens `args.file` the way the viewer opens a content hit and reports the
/// chosen window, the passages inside it and the marked words.
pub(super) fn locate(args: &LocateArgs, config: LensConfig) -> Result<Value> {
    let (directory, name) = split_document_path(&args.file)?;
    let root = DocumentRoot::open(directory)
        .with_context(|| format!("cannot open {}", args.file.display()))?;
    let backend = LocalBackend::open(root, config.index)?;
    let request = LoadRequest {
        path: name,
        query: args.query.clone(),
        context: args.context.clone(),
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build locate runtime")?;
    LocalSet::new().block_on(&runtime, async move {
        let viewer = Viewer::new(Rc::new(backend), config);
        let outcome = viewer.open(&request).await?;
        Ok::<_, anyhow::Error>(report(&viewer, &outcome))
    })
}

fn split_document_path(file: &Path) -> Result<(&Path, String)> {
    let name = file
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("not a document path: {}", file.display()))?;
    let directory = match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok((directory, name.to_string()))
}

fn report<B: ViewerBackend>(viewer: &Viewer<B>, outcome: &OpenOutcome) -> Value {
    let document = viewer.document().borrow();
    let root = document.root();
    let blocks = collect_blocks(&document, root);
    let (window, passages) = match outcome.window {
        None => (Value::Null, Vec::new()),
        Some(Window::WholeDocument) => (json!("whole_document"), vec![document.inner_html(root)]),
        Some(window @ Window::Range { start, end }) => (
            json!({ "start": start, "end": end }),
            window
                .select(&blocks)
                .iter()
                .map(|block| document.inner_html(block.node))
                .collect(),
        ),
    };
    let marks = outcome
        .markers
        .iter()
        .map(|marker| document.inner_text(*marker))
        .collect::<Vec<_>>();
    json!({
        "path": outcome.path,
        "window": window,
        "passages": passages,
        "marks": marks,
    })
}
