//! Plain-text rendering for the terminal.
//!
//! ```text
//! "# Intro\n\n- **bold** item"
//!     ↓ pulldown-cmark events
//! "Intro\n=====\n\n• bold item"
//! ```
//!
//! Charts are drawn as horizontal bars from the first dataset of a parsed
//! [`ChartConfig`]; other datasets and all styling are ignored.

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use techo_types::{Cell, CellBody, ChartConfig, Document};

/// Widest bar drawn for the largest value.
const BAR_WIDTH: usize = 40;

/// Flatten markdown to terminal text.
///
/// Headings are underlined (`=` for level 1, `-` for level 2), list items get
/// `• ` or `n. ` prefixes, fenced code is indented four spaces, and inline
/// emphasis is dropped.
pub fn markdown_to_text(source: &str) -> String {
    let mut out = String::new();
    let mut lists: Vec<Option<u64>> = Vec::new(); // None = unordered, Some(n) = next number
    let mut in_code_block = false;
    let mut heading_start = 0;

    for event in Parser::new(source) {
        match event {
            Event::Start(Tag::Heading { .. }) => {
                ensure_blank_line(&mut out);
                heading_start = out.len();
            }
            Event::End(TagEnd::Heading(level)) => {
                let width = out[heading_start..].chars().count();
                out.push('\n');
                let underline = match level {
                    HeadingLevel::H1 => Some('='),
                    HeadingLevel::H2 => Some('-'),
                    _ => None,
                };
                if let Some(c) = underline {
                    out.extend(std::iter::repeat_n(c, width));
                    out.push('\n');
                }
            }

            Event::Start(Tag::Paragraph) => {
                if lists.is_empty() {
                    ensure_blank_line(&mut out);
                }
            }
            Event::End(TagEnd::Paragraph) => ensure_newline(&mut out),

            Event::Start(Tag::CodeBlock(_)) => {
                ensure_blank_line(&mut out);
                in_code_block = true;
            }
            Event::End(TagEnd::CodeBlock) => in_code_block = false,

            Event::Start(Tag::List(first)) => {
                if lists.is_empty() {
                    ensure_blank_line(&mut out);
                }
                lists.push(first);
            }
            Event::End(TagEnd::List(_)) => {
                lists.pop();
            }

            Event::Start(Tag::Item) => {
                ensure_newline(&mut out);
                let indent = "  ".repeat(lists.len().saturating_sub(1));
                match lists.last_mut() {
                    Some(Some(n)) => {
                        out.push_str(&format!("{indent}{n}. "));
                        *n += 1;
                    }
                    _ => out.push_str(&format!("{indent}• ")),
                }
            }
            Event::End(TagEnd::Item) => ensure_newline(&mut out),

            Event::Text(text) => {
                if in_code_block {
                    for line in text.lines() {
                        out.push_str("    ");
                        out.push_str(line);
                        out.push('\n');
                    }
                } else {
                    out.push_str(&text);
                }
            }
            Event::Code(code) => {
                out.push('`');
                out.push_str(&code);
                out.push('`');
            }
            Event::SoftBreak => out.push(' '),
            Event::HardBreak => out.push('\n'),
            Event::Rule => {
                ensure_blank_line(&mut out);
                out.push_str(&"─".repeat(BAR_WIDTH));
                out.push('\n');
            }
            _ => {}
        }
    }

    out.truncate(out.trim_end().len());
    out
}

fn ensure_newline(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

fn ensure_blank_line(out: &mut String) {
    if out.is_empty() {
        return;
    }
    ensure_newline(out);
    if !out.ends_with("\n\n") {
        out.push('\n');
    }
}

/// Draw the first dataset as labelled horizontal bars.
pub fn chart_to_text(config: &ChartConfig) -> String {
    let Some(dataset) = config.data.datasets.first() else {
        return format!("{} chart (no data)", config.chart_type);
    };

    let mut out = match &dataset.label {
        Some(label) => format!("{} chart: {}\n", config.chart_type, label),
        None => format!("{} chart\n", config.chart_type),
    };

    let values = dataset.values();
    let labels: Vec<String> = (0..values.len()).map(|i| config.label(i)).collect();
    let label_width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let max = values
        .iter()
        .flatten()
        .copied()
        .fold(0.0_f64, f64::max);

    for (label, value) in labels.iter().zip(&values) {
        let bar = match value {
            Some(v) if *v > 0.0 && max > 0.0 => {
                let len = ((v / max) * BAR_WIDTH as f64).round() as usize;
                "█".repeat(len.max(1))
            }
            _ => String::new(),
        };
        let shown = value.map(format_number).unwrap_or_else(|| "-".to_string());
        out.push_str(&format!("{label:<label_width$} │{bar} {shown}\n"));
    }

    out.truncate(out.trim_end().len());
    out
}

/// Whole numbers without a trailing `.0`.
fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{prefix}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One cell, headed by its 1-based position.
pub fn render_cell(position: usize, cell: &Cell) -> String {
    let mut out = format!("[{}] {}  {}\n", position, cell.kind(), cell.id());

    match cell.body() {
        CellBody::Text(text) => {
            let rendered = markdown_to_text(&text.content);
            if !rendered.is_empty() {
                out.push_str(&indent(&rendered, "  "));
                out.push('\n');
            }
        }
        CellBody::Code(code) => {
            if !code.content.is_empty() {
                out.push_str(&indent(&code.content, "  │ "));
                out.push('\n');
            }
            if !code.output.is_empty() {
                out.push_str("  output:\n");
                out.push_str(&indent(&code.output, "    "));
                out.push('\n');
            }
        }
        CellBody::Chart(chart) => match chart.config().filter(|_| chart.error.is_none()) {
            Some(config) => {
                out.push_str(&indent(&chart_to_text(config), "  "));
                out.push('\n');
            }
            None => {
                out.push_str(&indent(chart.content(), "  │ "));
                out.push('\n');
            }
        },
    }

    if let Some(error) = cell.error() {
        out.push_str(&format!("  error: {}\n", error));
    }
    out
}

/// Title plus every cell.
pub fn render_document(doc: &Document) -> String {
    let mut out = format!("{}\n", doc.title());
    for (i, cell) in doc.cells().iter().enumerate() {
        out.push('\n');
        out.push_str(&render_cell(i + 1, cell));
    }
    out
}
