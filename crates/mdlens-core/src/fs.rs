use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{LensError, Result};
use crate::tree::TreeItem;

const IGNORED_DIRS: &[&str] = &[".git", "__pycache__"];
const DOCUMENT_EXTENSION: &str = "md";

/// A directory of markdown documents served by the viewer.
#[derive(Debug, Clone)]
pub struct DocumentRoot {
    root: PathBuf,
}

impl DocumentRoot {
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let canonical = fs::canonicalize(root)
            .map_err(|_| LensError::NotFound(root.display().to_string()))?;
        if !canonical.is_dir() {
            return Err(LensError::Validation(format!(
                "document root is not a directory: {}",
                root.display()
            )));
        }
        Ok(Self { root: canonical })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Resolves a root-relative document path. Anything that escapes the root
    /// or is not a regular file is rejected.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf> {
        if relative.trim().is_empty() {
            return Err(LensError::Validation("missing file path".to_string()));
        }
        let joined = self.root.join(relative);
        let canonical = match fs::canonicalize(&joined) {
            Ok(path) => path,
            Err(_) if escapes_lexically(relative) => {
                return Err(LensError::PathTraversal(relative.to_string()));
            }
            Err(_) => return Err(LensError::NotADocument(relative.to_string())),
        };
        if !canonical.starts_with(&self.root) {
            return Err(LensError::PathTraversal(relative.to_string()));
        }
        if !canonical.is_file() {
            return Err(LensError::NotADocument(relative.to_string()));
        }
        Ok(canonical)
    }

    pub fn read(&self, relative: &str) -> Result<String> {
        let path = self.resolve(relative)?;
        Ok(fs::read_to_string(path)?)
    }

    /// Sorted listing of markdown files. Empty directories and tool
    /// directories are left out.
    pub fn tree(&self) -> Result<Vec<TreeItem>> {
        self.tree_at(&self.root)
    }

    fn tree_at(&self, dir: &Path) -> Result<Vec<TreeItem>> {
        let mut names = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect::<Vec<_>>();
        names.sort();

        let mut items = Vec::new();
        for name in names {
            if IGNORED_DIRS.contains(&name.as_str()) {
                continue;
            }
            let full = dir.join(&name);
            if full.is_dir() {
                let children = self.tree_at(&full)?;
                if !children.is_empty() {
                    items.push(TreeItem::Directory { name, children });
                }
            } else if is_document(&full) {
                items.push(TreeItem::File {
                    path: self.relative(&full),
                    name,
                });
            }
        }
        Ok(items)
    }

    /// Every listed markdown file as `(relative path, absolute path)`, in
    /// walk order.
    pub fn documents(&self) -> Result<Vec<(String, PathBuf)>> {
        let mut out = Vec::new();
        let entries = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                !(entry.file_type().is_dir()
                    && entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| IGNORED_DIRS.contains(&name)))
            });
        for entry in entries {
            let entry = entry.map_err(|e| LensError::Validation(e.to_string()))?;
            if entry.file_type().is_file() && is_document(entry.path()) {
                out.push((self.relative(entry.path()), entry.path().to_path_buf()));
            }
        }
        Ok(out)
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == DOCUMENT_EXTENSION)
}

fn escapes_lexically(relative: &str) -> bool {
    Path::new(relative).is_absolute() || relative.split(['/', '\\']).any(|part| part == "..")
}
