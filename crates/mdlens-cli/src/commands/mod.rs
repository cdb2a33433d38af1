use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::Value;

use mdlens_core::render::render_markdown_html;
use mdlens_core::{ContentIndex, DocumentRoot, LensConfig};

use crate::cli::{Commands, SearchArgs};

mod locate;
mod web;


pub(crate) fn run(command: Commands) -> Result<()> {
    let config = LensConfig::from_env();
    match command {
        Commands::Serve(args) => web::serve(&args.directory, &args.host, args.port, config.index),
        Commands::Search(args) => print_json(&search(&args, config)?),
        Commands::Render(args) => {
            println!("{}", render_file(&args.file)?);
            Ok(())
        }
        Commands::Locate(args) => print_json(&locate::locate(&args, config)?),
    }
}

fn search(args: &SearchArgs, config: LensConfig) -> Result<Value> {
    let root = DocumentRoot::open(&args.directory)
        .with_context(|| format!("cannot search {}", args.directory.display()))?;
    let index = ContentIndex::index_directory(&root).context("indexing failed")?;
    let hits = if args.word {
        let [word] = args.words.as_slice() else {
            bail!("--word takes exactly one word, got {}", args.words.len());
        };
        index.search(word, args.limit.unwrap_or(config.index.word_limit))
    } else {
        let limit = args.limit.unwrap_or(config.index.context_limit);
        index.context_search(&args.words, config.index.context_block_size, limit)
    };
    tracing::debug!(hits = hits.len(), word = args.word, "content search finished");
    Ok(serde_json::to_value(hits)?)
}

fn render_file(path: &Path) -> Result<String> {
    let content =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    Ok(render_markdown_html(&content))
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
