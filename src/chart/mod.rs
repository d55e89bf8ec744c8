pub mod format;
pub mod palette;
pub mod render;

use crate::dashboard::DashboardView;

pub use render::{render_svg, CHART_TITLE};

pub const LOADING_TEXT: &str = "Loading data...";
pub const EMPTY_TEXT: &str = "No data available";

/// What the current view turns into: a text placeholder or a chart.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Placeholder(String),
    Chart(String),
}

pub fn render_view(view: &DashboardView) -> anyhow::Result<Rendered> {
    Ok(match view {
        DashboardView::Loading => Rendered::Placeholder(LOADING_TEXT.to_string()),
        DashboardView::Failed(message) => Rendered::Placeholder(format!("Error: {}", message)),
        DashboardView::Ready(rows) if rows.is_empty() => {
            Rendered::Placeholder(EMPTY_TEXT.to_string())
        }
        DashboardView::Ready(rows) => Rendered::Chart(render_svg(rows)?),
    })
}

const CONTAINER_STYLE: &str = "background-color:#1a1a1a;color:#ffffff;width:1200px;\
margin:20px;padding:20px;border-radius:8px;font-family:sans-serif";

/// Full HTML page for the dashboard. While loading, the page refreshes itself.
pub fn render_page(view: &DashboardView) -> anyhow::Result<String> {
    let refresh = if matches!(view, DashboardView::Loading) {
        r#"<meta http-equiv="refresh" content="2">"#
    } else {
        ""
    };

    let body = match render_view(view)? {
        Rendered::Placeholder(text) => {
            format!(r#"<div style="{}">{}</div>"#, CONTAINER_STYLE, escape_xml(&text))
        }
        Rendered::Chart(svg) => format!(
            r#"<div style="{}"><h2 style="margin-bottom:50px;font-size:24px;padding:20px">{}</h2>{}</div>"#,
            CONTAINER_STYLE, CHART_TITLE, svg
        ),
    };

    Ok(format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\">{}<title>{}</title></head>\
<body style=\"background-color:#000000\">{}</body></html>\n",
        refresh, CHART_TITLE, body
    ))
}

pub(crate) fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
