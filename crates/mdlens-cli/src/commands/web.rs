use std::path::Path;

use anyhow::Result;
use mdlens_core::config::IndexConfig;

pub(super) fn serve(directory: &Path, host: &str, port: u16, config: IndexConfig) -> Result<()> {
    mdlens_web::serve_web(directory, host, port, config)
}
