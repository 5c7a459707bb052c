// src/convert.rs
//! One-shot conversion of markdown files to sibling `.html` files.

use crate::assets::wrap_page;
use crate::error::ConvertError;
use crate::render::render_file;
use std::path::{Path, PathBuf};
use tracing::info;

/// Where the HTML for `source` is written: same directory, extension replaced by `html`.
pub fn output_path(source: &Path) -> PathBuf {
    source.with_extension("html")
}

/// Converts one file and returns the path written.
///
/// The source is read and rendered before the output is touched, so a failed read leaves no
/// output behind.
pub fn convert_file(source: &Path) -> Result<PathBuf, ConvertError> {
    let body = render_file(source).map_err(|e| ConvertError::Read {
        path: source.to_path_buf(),
        source: e,
    })?;
    let page = wrap_page(&source.to_string_lossy(), &body, false);

    let target = output_path(source);
    std::fs::write(&target, page).map_err(|e| ConvertError::Write {
        path: target.clone(),
        source: e,
    })?;
    info!("wrote {}", target.display());
    Ok(target)
}

/// Converts every path in order, stopping at the first failure.
pub fn convert_all<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<PathBuf>, ConvertError> {
    paths.iter().map(|p| convert_file(p.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_replaces_extension() {
        assert_eq!(output_path(Path::new("docs/a.md")), PathBuf::from("docs/a.html"));
        assert_eq!(output_path(Path::new("README")), PathBuf::from("README.html"));
        assert_eq!(
            output_path(Path::new("notes.v2.markdown")),
            PathBuf::from("notes.v2.html")
        );
    }

    #[test]
    fn converts_files_next_to_their_sources() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = dir.path().join("a.md");
        let b = dir.path().join("b.mdown");
        std::fs::write(&a, "# Alpha\n").expect("write a");
        std::fs::write(&b, "*beta*\n").expect("write b");

        let written = convert_all(&[&a, &b]).expect("convert");
        assert_eq!(written, vec![dir.path().join("a.html"), dir.path().join("b.html")]);

        let html = std::fs::read_to_string(dir.path().join("a.html")).expect("read a.html");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h1>Alpha</h1>"));
        assert!(html.ends_with("</body></html>"));
        assert!(!html.contains("EventSource"));
    }

    #[test]
    fn stops_at_first_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("missing.md");
        let later = dir.path().join("later.md");
        std::fs::write(&later, "later\n").expect("write later");

        let err = convert_all(&[&missing, &later]).unwrap_err();
        assert!(matches!(err, ConvertError::Read { .. }));
        assert!(!dir.path().join("missing.html").exists());
        assert!(!dir.path().join("later.html").exists());
    }
}
