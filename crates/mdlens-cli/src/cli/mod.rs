use clap::{Parser, Subcommand};

mod args;

#[cfg(test)]
mod tests;

pub use args::{LocateArgs, RenderArgs, SearchArgs, ServeArgs};

#[derive(Debug, Parser)]
#[command(name = "mdlens")]
#[command(about = "Markdown viewer with search-hit relocation", version)]
pub struct Cli {
    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve a directory of markdown documents over HTTP.
    Serve(ServeArgs),
    /// Search document contents for blocks containing every word.
    Search(SearchArgs),
    /// Render one markdown file to HTML.
    Render(RenderArgs),
    /// Relocate a passage in a file and show what would be highlighted.
    Locate(LocateArgs),
}
