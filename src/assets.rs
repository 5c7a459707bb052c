// src/assets.rs
//! Page chrome wrapped around rendered documents.

const HEAD_HTML: &str = include_str!("../static/head.html");
const STYLE_CSS: &str = include_str!("../static/style.css");
const RENDER_JS: &str = include_str!("../static/render.js");
const PREVIEW_JS: &str = include_str!("../static/preview.js");

/// Closes the body opened by [`page_head`].
pub const PAGE_TAIL: &str = "</body></html>";

/// Everything before the rendered body: head, title, stylesheet and scripts, then `<body>`.
///
/// With `live` set the title is marked as a preview and the event-stream client is included.
pub fn page_head(title: &str, live: bool) -> String {
    let mut head = String::with_capacity(
        HEAD_HTML.len() + STYLE_CSS.len() + RENDER_JS.len() + PREVIEW_JS.len() + 256,
    );
    head.push_str(HEAD_HTML);
    head.push_str("<title>");
    if live {
        head.push_str("[live preview] ");
    }
    head.push_str(&escape_html(title));
    head.push_str("</title>\n<style>\n");
    head.push_str(STYLE_CSS);
    head.push_str("</style>\n<script>\n");
    head.push_str(RENDER_JS);
    if live {
        head.push_str(PREVIEW_JS);
    }
    head.push_str("</script>\n</head><body>\n");
    head
}

/// A complete page around an already rendered `body`.
pub fn wrap_page(title: &str, body: &str, live: bool) -> String {
    let mut page = page_head(title, live);
    page.push_str(body);
    page.push_str(PAGE_TAIL);
    page
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
