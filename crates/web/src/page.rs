//! Server-rendered page: sidebar with keys and provider choice, the input
//! form, and the result sections.

use extract::visualize::html_escape;
use extract::{ComparisonRow, Provider};

pub const TITLE: &str = "Text Extract Optimizer Demo";
pub const START_HINT: &str = "Paste text above and click Run to start.";

#[derive(Debug, Clone)]
pub enum Banner {
    Info(String),
    Error(String),
}

#[derive(Debug, Clone)]
pub struct ResultsView {
    pub original_html: String,
    pub optimized_text: String,
    pub optimized_html: String,
    pub comparison: Vec<ComparisonRow>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PageView {
    pub provider: Provider,
    pub input_text: String,
    pub banner: Option<Banner>,
    pub results: Option<ResultsView>,
}

impl PageView {
    /// Landing state: nothing submitted yet
    pub fn start(provider: Provider, input_text: &str) -> Self {
        Self {
            provider,
            input_text: input_text.to_string(),
            banner: Some(Banner::Info(START_HINT.to_string())),
            results: None,
        }
    }

    pub fn error(provider: Provider, input_text: &str, message: impl Into<String>) -> Self {
        Self {
            provider,
            input_text: input_text.to_string(),
            banner: Some(Banner::Error(message.into())),
            results: None,
        }
    }
}

const STYLE: &str = r#"<style>
body { margin: 0; font-family: system-ui, -apple-system, Segoe UI, Roboto, sans-serif; color: #111827; }
.layout { display: flex; min-height: 100vh; }
.sidebar { width: 280px; background: #f3f4f6; padding: 20px; box-sizing: border-box; }
.sidebar label { display: block; font-size: 14px; margin: 12px 0 4px; }
.sidebar input[type=password] { width: 100%; box-sizing: border-box; padding: 6px; }
.main { flex: 1; padding: 24px 40px; max-width: 1000px; }
textarea { width: 100%; box-sizing: border-box; font: inherit; padding: 8px; }
button { margin-top: 12px; padding: 8px 20px; font-size: 15px; }
.banner { padding: 12px 16px; border-radius: 6px; margin: 16px 0; }
.banner.info { background: #e0f2fe; color: #075985; }
.banner.error { background: #fee2e2; color: #991b1b; }
.banner.warning { background: #fef3c7; color: #92400e; }
.comparison { border-collapse: collapse; }
.comparison th, .comparison td { padding: 6px 14px; border-bottom: 1px solid #e5e7eb; text-align: right; }
.comparison th:first-child, .comparison td:first-child { text-align: left; }
footer { color: #6b7280; font-size: 13px; border-top: 1px solid #e5e7eb; margin-top: 32px; padding-top: 12px; }
</style>"#;

pub fn render_page(view: &PageView) -> String {
    let mut html = String::with_capacity(8 * 1024);
    html.push_str(&format!(
        "<!doctype html>\n<html>\n<head>\n<meta charset=\"utf-8\" />\n<title>{TITLE}</title>\n{STYLE}\n</head>\n<body>\n"
    ));
    html.push_str(r#"<form method="post" action="/run" class="layout">"#);

    // Key values are never written back into the page
    html.push_str(r#"<aside class="sidebar"><h2>API Keys</h2>"#);
    for provider in Provider::ALL {
        html.push_str(&format!(
            r#"<label for="{field}">{name} API Key</label><input type="password" id="{field}" name="{field}" autocomplete="off" />"#,
            field = key_field(provider),
            name = provider.name(),
        ));
    }
    html.push_str("<h3>Which API to use?</h3>");
    for provider in Provider::ALL {
        let checked = if provider == view.provider { " checked" } else { "" };
        html.push_str(&format!(
            r#"<label><input type="radio" name="provider" value="{name}"{checked} /> {name}</label>"#,
            name = provider.name(),
        ));
    }
    html.push_str("</aside>");

    html.push_str(&format!(r#"<main class="main"><h1>{TITLE}</h1>"#));
    html.push_str(&format!(
        r#"<label for="input_text">Paste your input text here:</label><textarea id="input_text" name="input_text" rows="12">{}</textarea>"#,
        html_escape(&view.input_text)
    ));
    html.push_str(r#"<button type="submit">Run</button>"#);

    match &view.banner {
        Some(Banner::Info(message)) => html.push_str(&banner("info", message)),
        Some(Banner::Error(message)) => html.push_str(&banner("error", message)),
        None => {}
    }

    if let Some(results) = &view.results {
        render_results(&mut html, results);
    }

    html.push_str(
        "<footer>Demo: visualize, optimize, and compare structured extractions from text.</footer>",
    );
    html.push_str("</main></form>\n</body>\n</html>\n");
    html
}

fn render_results(html: &mut String, results: &ResultsView) {
    for warning in &results.warnings {
        html.push_str(&banner("warning", warning));
    }

    html.push_str("<h2>Original Text Extraction Visualization</h2>");
    html.push_str(&results.original_html);

    html.push_str("<h2>Auto-Optimized Text</h2>");
    html.push_str(&format!(
        r#"<textarea readonly rows="8" aria-label="Optimized Text">{}</textarea>"#,
        html_escape(&results.optimized_text)
    ));

    html.push_str("<h2>Optimized Text Extraction Visualization</h2>");
    html.push_str(&results.optimized_html);

    html.push_str("<h2>Comparison of Structured Information</h2>");
    html.push_str(
        r#"<table class="comparison"><thead><tr><th>Metric</th><th>Original</th><th>Optimized</th><th>Change</th></tr></thead><tbody>"#,
    );
    for row in &results.comparison {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:+}</td></tr>",
            html_escape(&row.metric),
            row.original,
            row.optimized,
            row.delta()
        ));
    }
    html.push_str("</tbody></table>");
}

fn banner(kind: &str, message: &str) -> String {
    format!(
        r#"<div class="banner {kind}" role="{role}">{}</div>"#,
        html_escape(message),
        role = if kind == "info" { "status" } else { "alert" },
    )
}

fn key_field(provider: Provider) -> &'static str {
    match provider {
        Provider::OpenAI => "openai_key",
        Provider::Gemini => "gemini_key",
        Provider::Vertex => "vertex_key",
    }
}
