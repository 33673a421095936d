//! README rendering module
//!
//! Serves the configured README document as HTML on the index route. The
//! rendered page is cached after the first hit.

use pulldown_cmark::{html, Options, Parser};
use tokio::fs;
use tokio::sync::RwLock;

/// Load the README and render it, consulting the cache first
///
/// Returns `None` when the document is absent or unreadable; the caller
/// answers 404 in that case.
pub async fn load_and_render(path: &str, cache: &RwLock<Option<String>>) -> Option<String> {
    {
        let cached = cache.read().await;
        if let Some(page) = cached.as_ref() {
            return Some(page.clone());
        }
    }

    let markdown = fs::read_to_string(path).await.ok()?;
    let page = wrap_page(&render_markdown(&markdown));

    {
        let mut cached = cache.write().await;
        *cached = Some(page.clone());
    }

    Some(page)
}

/// Render markdown to an HTML fragment
pub fn render_markdown(md_content: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(md_content, options);
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);
    html_output
}

/// Wrap a rendered fragment in a minimal document shell
fn wrap_page(fragment: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>API Documentation</title>
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, Arial, sans-serif;
            line-height: 1.6;
            max-width: 900px;
            margin: 0 auto;
            padding: 20px;
            color: #333;
        }}
        pre {{
            background: #2d2d2d;
            color: #f8f8f2;
            padding: 15px;
            border-radius: 5px;
            overflow-x: auto;
        }}
        code {{
            background: #e8e8e8;
            padding: 2px 6px;
            border-radius: 3px;
            font-size: 0.9em;
        }}
        pre code {{
            background: transparent;
            padding: 0;
        }}
        table {{
            width: 100%;
            border-collapse: collapse;
            margin: 20px 0;
        }}
        th, td {{
            border: 1px solid #ddd;
            padding: 10px;
            text-align: left;
        }}
    </style>
</head>
<body>
{fragment}
</body>
</html>"#
    )
}
