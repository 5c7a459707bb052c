// src/render.rs
//! Markdown to HTML. Stateless: the same input always renders to the same output.

use pulldown_cmark::{html, Options, Parser};
use std::io;
use std::path::Path;

fn options() -> Options {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_TABLES);
    opts.insert(Options::ENABLE_FOOTNOTES);
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_TASKLISTS);
    opts.insert(Options::ENABLE_HEADING_ATTRIBUTES);
    opts
}

/// Renders markdown source to an HTML fragment (no page chrome).
pub fn render_markdown(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, options());
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Reads `path` and renders it. Invalid UTF-8 is replaced rather than rejected.
pub fn render_file(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(render_markdown(&String::from_utf8_lossy(&bytes)))
}
