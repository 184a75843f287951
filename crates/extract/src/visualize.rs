//! HTML rendering of annotated documents.
//!
//! Documents go through a JSONL file on disk: `save_annotated_documents`
//! writes it, `visualize` reads it back and renders highlighted text plus an
//! extraction table. `render_document` does both inside a temp file that is
//! removed when rendering finishes.

use crate::schema::{AnnotatedDocument, Extraction};
use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

const PALETTE: &[&str] = &[
    "#fde68a", "#bfdbfe", "#bbf7d0", "#fbcfe8", "#ddd6fe", "#fed7aa", "#a5f3fc", "#e9d5ff",
];

const STYLE: &str = r#"<style>
.lx-document { margin-bottom: 24px; }
.lx-legend span { display: inline-block; padding: 2px 8px; margin: 0 6px 6px 0; border-radius: 4px; font-size: 12px; }
.lx-text { white-space: pre-wrap; border: 1px solid #e5e7eb; padding: 12px; border-radius: 8px; line-height: 1.6; }
.lx-text mark { padding: 0 2px; border-radius: 3px; }
.lx-table { border-collapse: collapse; width: 100%; margin-top: 12px; }
.lx-table th, .lx-table td { padding: 6px 8px; border-bottom: 1px solid #e5e7eb; text-align: left; vertical-align: top; }
.lx-missing { color: #9ca3af; }
.lx-empty { color: #6b7280; font-style: italic; }
</style>"#;

/// Byte range of one located extraction in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub index: usize,
    pub start: usize,
    pub end: usize,
}

/// Write documents as JSON lines, one document per line
pub fn save_annotated_documents(docs: &[AnnotatedDocument], path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for doc in docs {
        serde_json::to_writer(&mut writer, doc).context("Failed to serialize document")?;
        writer.write_all(b"\n")?;
    }
    writer.flush().context("Failed to flush annotated documents")?;
    Ok(())
}

pub fn load_annotated_documents(path: &Path) -> Result<Vec<AnnotatedDocument>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut docs = Vec::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line.context("Failed to read annotated documents")?;
        if line.trim().is_empty() {
            continue;
        }
        let doc = serde_json::from_str(&line)
            .with_context(|| format!("Invalid document on line {}", line_no + 1))?;
        docs.push(doc);
    }
    Ok(docs)
}

/// Render every document in a JSONL file as one HTML fragment
pub fn visualize(path: &Path) -> Result<String> {
    let docs = load_annotated_documents(path)?;

    let mut html = String::from(STYLE);
    for doc in &docs {
        html.push_str(&render_html(doc));
    }
    Ok(html)
}

/// Render a single document through a scoped temp file
pub fn render_document(doc: &AnnotatedDocument) -> Result<String> {
    render_via_temp_file(doc, &std::env::temp_dir(), visualize)
}

/// Save `doc` to a temp file in `dir` and hand its path to `render`.
/// The file is removed when this returns, whatever `render` did.
fn render_via_temp_file<F>(doc: &AnnotatedDocument, dir: &Path, render: F) -> Result<String>
where
    F: FnOnce(&Path) -> Result<String>,
{
    let file = tempfile::Builder::new()
        .prefix("annotated-")
        .suffix(".jsonl")
        .tempfile_in(dir)
        .context("Failed to create temp file for visualization")?;

    debug!(path = %file.path().display(), document_id = %doc.document_id, "Rendering document");
    save_annotated_documents(std::slice::from_ref(doc), file.path())?;
    render(file.path())
}

/// Locate each extraction in the source text.
///
/// Matches are searched left to right and never overlap. Exact matches win
/// over case-insensitive ones; records with no match are left out.
pub fn locate_spans(text: &str, extractions: &[Extraction]) -> Vec<Span> {
    let mut spans: Vec<Span> = Vec::new();
    let mut cursor = 0usize;

    for (index, extraction) in extractions.iter().enumerate() {
        let needle = extraction.extraction_text.trim();
        if needle.is_empty() {
            continue;
        }

        let found = [false, true].into_iter().find_map(|case_insensitive| {
            let re = RegexBuilder::new(&regex::escape(needle))
                .case_insensitive(case_insensitive)
                .build()
                .ok()?;
            pick_match(&re, text, cursor, &spans)
        });

        if let Some((start, end)) = found {
            spans.push(Span { index, start, end });
            cursor = cursor.max(end);
        }
    }

    spans.sort_by_key(|s| (s.start, s.end));
    spans
}

/// First free match at or after the cursor, else the first free match anywhere
fn pick_match(re: &Regex, text: &str, cursor: usize, taken: &[Span]) -> Option<(usize, usize)> {
    let free = |start: usize, end: usize| taken.iter().all(|s| end <= s.start || start >= s.end);

    let mut earlier = None;
    for m in re.find_iter(text) {
        if !free(m.start(), m.end()) {
            continue;
        }
        if m.start() >= cursor {
            return Some((m.start(), m.end()));
        }
        earlier.get_or_insert((m.start(), m.end()));
    }
    earlier
}

/// Stable highlight colour for an extraction class
pub fn class_color(class: &str) -> &'static str {
    // FNV-1a
    let hash = class
        .to_lowercase()
        .bytes()
        .fold(0xcbf29ce484222325u64, |h, b| (h ^ b as u64).wrapping_mul(0x100000001b3));
    PALETTE[(hash % PALETTE.len() as u64) as usize]
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn render_html(doc: &AnnotatedDocument) -> String {
    let spans = locate_spans(&doc.text, &doc.extractions);
    let mut html = format!(
        r#"<div class="lx-document" id="doc-{}">"#,
        html_escape(&doc.document_id)
    );

    let classes: BTreeSet<&str> = doc
        .extractions
        .iter()
        .map(|e| e.extraction_class.as_str())
        .collect();
    if !classes.is_empty() {
        html.push_str(r#"<div class="lx-legend">"#);
        for class in classes {
            html.push_str(&format!(
                r#"<span style="background:{}">{}</span>"#,
                class_color(class),
                html_escape(class)
            ));
        }
        html.push_str("</div>");
    }

    // Highlighted text, built in one pass over sorted spans
    html.push_str(r#"<div class="lx-text">"#);
    let mut cursor = 0usize;
    for span in &spans {
        let extraction = &doc.extractions[span.index];
        html.push_str(&html_escape(&doc.text[cursor..span.start]));
        html.push_str(&format!(
            r#"<mark id="{id}-x{index}" style="background:{color}" title="{class}">{segment}</mark>"#,
            id = html_escape(&doc.document_id),
            index = span.index,
            color = class_color(&extraction.extraction_class),
            class = html_escape(&extraction.extraction_class),
            segment = html_escape(&doc.text[span.start..span.end]),
        ));
        cursor = span.end;
    }
    html.push_str(&html_escape(&doc.text[cursor..]));
    html.push_str("</div>");

    if doc.extractions.is_empty() {
        html.push_str(r#"<p class="lx-empty">No extractions.</p></div>"#);
        return html;
    }

    html.push_str(
        r#"<table class="lx-table"><thead><tr><th>#</th><th>Class</th><th>Text</th><th>Attributes</th><th>Span</th></tr></thead><tbody>"#,
    );
    for (index, extraction) in doc.extractions.iter().enumerate() {
        let span_cell = match spans.iter().find(|s| s.index == index) {
            Some(span) => {
                let start = doc.text[..span.start].chars().count();
                let end = start + doc.text[span.start..span.end].chars().count();
                format!("[{start}..{end})")
            }
            None => r#"<span class="lx-missing">not found</span>"#.to_string(),
        };
        let attributes = extraction
            .attributes
            .as_ref()
            .map(|attrs| html_escape(&serde_json::Value::Object(attrs.clone()).to_string()))
            .unwrap_or_default();

        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            index + 1,
            html_escape(&extraction.extraction_class),
            html_escape(&extraction.extraction_text),
            attributes,
            span_cell
        ));
    }
    html.push_str("</tbody></table></div>");
    html
}
