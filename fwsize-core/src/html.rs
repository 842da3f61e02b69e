//! HTML chart page generation
//!
//! Generates one self-contained page per hardware target. The page loads
//! plotly.js from its CDN, embeds the figure as JSON and adds a click handler
//! that opens the clicked commit on the repository's web page.
//!
//! Global invariants enforced:
//! - Identical figures yield byte-for-byte identical pages (no random ids,
//!   no timestamps)
//! - Embedded JSON can never terminate its `<script>` element

use crate::chart::{chart_title, Figure};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Pinned plotly.js build loaded by every page
pub const PLOTLY_CDN_URL: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Everything a page needs besides the figure itself
#[derive(Debug, Clone, Copy)]
pub struct PageOptions<'a> {
    pub target: &'a str,
    pub title_prefix: &'a str,
    /// Web URL of the repository; commits live under `<repo_url>/commit/`
    pub repo_url: &'a str,
}

/// Id of the chart element for a target
pub fn chart_div_id(target: &str) -> String {
    format!("fwsize-{}", target)
}

/// Render a figure as a complete HTML document
pub fn render_chart_page(figure: &Figure, options: &PageOptions<'_>) -> Result<String> {
    let div_id = chart_div_id(options.target);
    let data = script_safe(&figure.data_json()?);
    let layout = script_safe(&figure.layout_json()?);
    let base_url = script_safe(
        &serde_json::to_string(&format!(
            "{}/commit/",
            options.repo_url.trim_end_matches('/')
        ))
        .context("failed to encode repository URL")?,
    );

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <script src="{plotly}" charset="utf-8"></script>
    <style>{css}</style>
</head>
<body>
    <div id="{div_id}" class="chart"></div>
    <script>
    Plotly.newPlot('{div_id}', {data}, {layout}, {{"responsive": true}});
    </script>
    <script>{js}</script>
</body>
</html>
"#,
        title = html_escape(&chart_title(options.title_prefix, options.target)),
        plotly = PLOTLY_CDN_URL,
        css = inline_css(),
        div_id = div_id,
        data = data,
        layout = layout,
        js = click_handler(&div_id, &base_url),
    ))
}

/// Inline CSS styles
fn inline_css() -> &'static str {
    r#"
html, body {
    margin: 0;
    padding: 0;
    font-family: system-ui, -apple-system, 'Segoe UI', sans-serif;
}

.chart {
    width: 100%;
    height: 96vh;
}
"#
}

/// Click handler opening the commit behind the clicked point
///
/// `base_url` must already be a JSON string literal.
fn click_handler(div_id: &str, base_url: &str) -> String {
    format!(
        r#"
(function() {{
    const baseUrl = {base_url};
    const plotElement = document.getElementById('{div_id}');
    plotElement.on('plotly_click', function(data) {{
        const point = data.points[0];
        if (point) {{
            window.open(baseUrl + point.customdata);
        }}
    }});
}})();
"#,
        base_url = base_url,
        div_id = div_id,
    )
}

/// Make JSON safe to embed in a `<script>` element
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/").replace("<!--", "<\\!--")
}

/// Escape text for plotly hover labels
///
/// Hover labels decode only a few named entities, so quotes stay literal.
pub(crate) fn hover_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape HTML special characters
pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Path of the chart page for a target
pub fn chart_path(build_dir: &Path, target: &str) -> PathBuf {
    build_dir.join(format!("{}.html", target))
}

/// Hidden staging file a page is written to before it replaces `<target>.html`
///
/// Target names never start with a dot, so the staging name cannot collide
/// with another target's page.
fn staging_path(build_dir: &Path, target: &str) -> PathBuf {
    build_dir.join(format!(".{}.html.partial", target))
}

/// Write the chart page for `target` into `build_dir` and return its path
///
/// Readers never see a half-written page: the HTML goes to a staging file
/// that is renamed over the previous page once complete.
pub fn write_chart_page(build_dir: &Path, target: &str, page: &str) -> Result<PathBuf> {
    fs::create_dir_all(build_dir)
        .with_context(|| format!("failed to create build directory: {}", build_dir.display()))?;

    let path = chart_path(build_dir, target);
    let staging = staging_path(build_dir, target);

    fs::write(&staging, page)
        .with_context(|| format!("failed to write {} chart to {}", target, staging.display()))?;

    if let Err(err) = fs::rename(&staging, &path) {
        let _ = fs::remove_file(&staging);
        return Err(err)
            .with_context(|| format!("failed to publish {} chart as {}", target, path.display()));
    }

    Ok(path)
}
