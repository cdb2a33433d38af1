use std::path::PathBuf;

use clap::Args;

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Directory to serve.
    pub directory: PathBuf,
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
    #[arg(long, default_value_t = 5000)]
    pub port: u16,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    pub directory: PathBuf,
    #[arg(required = true)]
    pub words: Vec<String>,
    /// Match one whole word per line instead of blocks holding every word.
    #[arg(long)]
    pub word: bool,
    /// Maximum number of hits; defaults to `MDLENS_CONTEXT_LIMIT`, or
    /// `MDLENS_WORD_LIMIT` with `--word`.
    #[arg(long, value_parser = parse_limit)]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct RenderArgs {
    pub file: PathBuf,
}

#[derive(Debug, Args)]
pub struct LocateArgs {
    pub file: PathBuf,
    #[arg(long, allow_hyphen_values = true)]
    pub query: String,
    /// Text remembered around the hit, usually a search preview.
    #[arg(long, allow_hyphen_values = true)]
    pub context: Option<String>,
}

fn parse_limit(raw: &str) -> std::result::Result<usize, String> {
    let value = raw
        .parse::<usize>()
        .map_err(|_| format!("invalid limit '{raw}'"))?;
    if value == 0 {
        return Err("limit must be at least 1".to_string());
    }
    Ok(value)
}
