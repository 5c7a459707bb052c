// src/document.rs
//! The single document currently being previewed.
//!
//! The HTTP handlers write it when a client navigates; the dispatcher's validity predicate reads
//! it for every filesystem event. Both sides hold the same [`ActiveDocument`] handle.

use crate::event::normalize_path_separators;
use parking_lot::RwLock;
use std::path::{Component, Path};
use std::sync::Arc;

/// File extensions (lowercase, without the dot) rendered as documents rather than served raw.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["md", "mdown", "markdown", "mkd"];

/// Returns `true` if `path` has a recognized document extension, ignoring case.
pub fn is_document_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            DOCUMENT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Shared handle to the active document path.
///
/// Cloning yields another handle to the same cell. Writers replace the whole path at once, so a
/// reader sees either the old or the new document, never a mix.
#[derive(Debug, Clone)]
pub struct ActiveDocument {
    default_path: Arc<str>,
    current: Arc<RwLock<String>>,
}

impl ActiveDocument {
    /// Creates the cell with `default_path` active.
    pub fn new(default_path: &str) -> Self {
        let default_path = document_key(default_path);
        Self {
            current: Arc::new(RwLock::new(default_path.clone())),
            default_path: default_path.into(),
        }
    }

    /// The document configured at startup.
    pub fn default_path(&self) -> &str {
        &self.default_path
    }

    /// A copy of the currently active path.
    pub fn get(&self) -> String {
        self.current.read().clone()
    }

    /// Whether `path` names the active document.
    pub fn is_active(&self, path: &str) -> bool {
        *self.current.read() == path
    }

    /// Makes `path` the active document and returns the stored form.
    pub fn set(&self, path: &str) -> String {
        let key = document_key(path);
        *self.current.write() = key.clone();
        key
    }

    /// Makes the startup document active again and returns it.
    pub fn reset(&self) -> String {
        let key = self.default_path.to_string();
        *self.current.write() = key.clone();
        key
    }
}

/// Canonical spelling of a document path, as the watcher reports it: `/` separators, no `.`
/// components, and `..` folded into the component before it where there is one.
pub fn document_key(path: &str) -> String {
    let normalized = normalize_path_separators(path);
    let absolute = normalized.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str().unwrap_or_default()),
            Component::ParentDir => match parts.last().copied() {
                Some(last) if last != ".." => {
                    parts.pop();
                }
                // `/..` is `/`.
                _ if absolute => {}
                _ => parts.push(".."),
            },
            Component::Prefix(prefix) => {
                parts.push(prefix.as_os_str().to_str().unwrap_or_default())
            }
            Component::CurDir | Component::RootDir => {}
        }
    }
    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Rewrites an absolute `path` below `root` as a path relative to `root`, so it matches what the
/// watcher reports. Anything else is returned as given.
pub fn relative_to_root(root: &Path, path: &str) -> String {
    let candidate = Path::new(path);
    if !candidate.is_absolute() {
        return path.to_string();
    }
    let resolved = candidate
        .canonicalize()
        .unwrap_or_else(|_| candidate.to_path_buf());
    match resolved.strip_prefix(root) {
        Ok(relative) => relative.to_string_lossy().into_owned(),
        Err(_) => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_document_extensions_case_insensitively() {
        for name in ["a.md", "a.MD", "b.mdown", "c.Markdown", "d.mkd"] {
            assert!(is_document_path(Path::new(name)), "{}", name);
        }
        for name in ["logo.png", "notes.txt", "README", "md"] {
            assert!(!is_document_path(Path::new(name)), "{}", name);
        }
    }

    #[test]
    fn document_key_strips_current_dir_components() {
        assert_eq!(document_key("./notes.md"), "notes.md");
        assert_eq!(document_key(r".\docs\notes.md"), "docs/notes.md");
        assert_eq!(document_key("docs/./a.md"), "docs/a.md");
        assert_eq!(document_key("/abs/notes.md"), "/abs/notes.md");
    }

    #[test]
    fn document_key_folds_parent_dir_components() {
        assert_eq!(document_key("docs/../notes.md"), "notes.md");
        assert_eq!(document_key(r"docs\sub\..\a.md"), "docs/a.md");
        assert_eq!(document_key("a/../../b.md"), "../b.md");
        assert_eq!(document_key("../../b.md"), "../../b.md");
        assert_eq!(document_key("/abs/../notes.md"), "/notes.md");
        assert_eq!(document_key("/../notes.md"), "/notes.md");
    }

    #[test]
    fn default_path_matches_watcher_spelling() {
        let active = ActiveDocument::new("docs/../notes.md");
        assert_eq!(active.default_path(), "notes.md");
        assert!(active.is_active("notes.md"));
    }

    #[test]
    fn absolute_paths_inside_root_become_relative() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().canonicalize().expect("canonical root");
        std::fs::write(root.join("notes.md"), "# Hi").expect("write");

        let absolute = root.join("notes.md");
        assert_eq!(
            relative_to_root(&root, &absolute.to_string_lossy()),
            "notes.md"
        );
        assert_eq!(relative_to_root(&root, "notes.md"), "notes.md");
    }

    #[test]
    fn set_and_reset_switch_the_active_document() {
        let active = ActiveDocument::new("./notes.md");
        assert_eq!(active.default_path(), "notes.md");
        assert!(active.is_active("notes.md"));

        let handle = active.clone();
        assert_eq!(handle.set("other.md"), "other.md");
        assert!(active.is_active("other.md"));
        assert!(!active.is_active("notes.md"));

        assert_eq!(active.reset(), "notes.md");
        assert_eq!(handle.get(), "notes.md");
    }
}
