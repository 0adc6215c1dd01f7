//! Cell types.
//!
//! A cell is a tagged variant: each kind carries only the fields it uses.
//!
//! - **Text** holds markdown source and is never executed.
//! - **Code** holds script source plus the output and error of its last run.
//! - **Chart** holds configuration text, the parsed [`ChartConfig`] derived
//!   from it, and the error of its last validation.
//!
//! Cells are values. Every "mutation" consumes the cell and returns a new
//! one, so a cell already captured in a history snapshot is never touched.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::chart::{ChartConfig, default_chart_template};
use crate::ids::CellId;

/// What kind of cell this is. Fixed at creation.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum CellKind {
    /// Markdown text.
    #[strum(to_string = "text", serialize = "markdown", serialize = "md")]
    Text,
    /// Executable script.
    Code,
    /// Chart configuration (JSON).
    Chart,
}

impl CellKind {
    /// Parse from string (case-insensitive). Accepts "markdown"/"md" for Text.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    /// Convert to the persisted string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            CellKind::Text => "text",
            CellKind::Code => "code",
            CellKind::Chart => "chart",
        }
    }

    /// Whether running this kind of cell does anything.
    pub fn is_executable(&self) -> bool {
        !matches!(self, CellKind::Text)
    }
}

/// Result of executing one cell.
///
/// Produced by the executor, merged into the cell with [`Cell::with_outcome`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    /// Nothing ran (Text cells).
    Skipped,
    /// Script completed; captured output, possibly empty.
    Output(String),
    /// Configuration parsed.
    Validated,
    /// Script failed or configuration did not parse.
    Failed(String),
}

impl ExecOutcome {
    /// Whether this outcome records a failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, ExecOutcome::Failed(_))
    }
}

/// Markdown cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextCell {
    pub content: String,
}

/// Script cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeCell {
    pub content: String,
    /// Output of the last successful run.
    pub output: String,
    /// Message of the last failed run, cleared by the next success.
    pub error: Option<String>,
}

/// Chart cell. The configuration is parsed whenever the content is set.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartCell {
    content: String,
    parsed: Result<ChartConfig, String>,
    /// Message of the last failed validation.
    pub error: Option<String>,
}

impl ChartCell {
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        let parsed = ChartConfig::parse(&content);
        Self {
            content,
            parsed,
            error: None,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Parsed configuration, if the current content is valid.
    pub fn config(&self) -> Option<&ChartConfig> {
        self.parsed.as_ref().ok()
    }

    /// Parse failure for the current content, if any.
    pub fn parse_error(&self) -> Option<&str> {
        self.parsed.as_ref().err().map(String::as_str)
    }

    /// Replace the content, re-parsing it. The last validation error stays
    /// until the cell is run again.
    pub fn with_content(self, content: impl Into<String>) -> Self {
        Self {
            error: self.error,
            ..Self::new(content)
        }
    }
}

/// Kind-specific cell payload.
#[derive(Debug, Clone, PartialEq)]
pub enum CellBody {
    Text(TextCell),
    Code(CodeCell),
    Chart(ChartCell),
}

impl CellBody {
    /// An empty body of the given kind, with kind-specific default content.
    pub fn empty(kind: CellKind) -> Self {
        match kind {
            CellKind::Text => CellBody::Text(TextCell::default()),
            CellKind::Code => CellBody::Code(CodeCell::default()),
            CellKind::Chart => CellBody::Chart(ChartCell::new(default_chart_template())),
        }
    }

    /// A body of the given kind with explicit content and no run history.
    pub fn with_content(kind: CellKind, content: impl Into<String>) -> Self {
        let content = content.into();
        match kind {
            CellKind::Text => CellBody::Text(TextCell { content }),
            CellKind::Code => CellBody::Code(CodeCell {
                content,
                ..CodeCell::default()
            }),
            CellKind::Chart => CellBody::Chart(ChartCell::new(content)),
        }
    }

    pub fn kind(&self) -> CellKind {
        match self {
            CellBody::Text(_) => CellKind::Text,
            CellBody::Code(_) => CellKind::Code,
            CellBody::Chart(_) => CellKind::Chart,
        }
    }
}

/// One cell of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    id: CellId,
    body: CellBody,
}

impl Cell {
    /// Create a cell of `kind` with a fresh id and default content.
    pub fn new(kind: CellKind) -> Self {
        Self {
            id: CellId::new(),
            body: CellBody::empty(kind),
        }
    }

    /// Create a cell of `kind` with a fresh id and the given content.
    pub fn with_content(kind: CellKind, content: impl Into<String>) -> Self {
        Self {
            id: CellId::new(),
            body: CellBody::with_content(kind, content),
        }
    }

    /// Reassemble a cell from stored parts (used when loading files).
    pub fn from_parts(id: CellId, body: CellBody) -> Self {
        Self { id, body }
    }

    pub fn id(&self) -> &CellId {
        &self.id
    }

    pub fn kind(&self) -> CellKind {
        self.body.kind()
    }

    pub fn body(&self) -> &CellBody {
        &self.body
    }

    pub fn content(&self) -> &str {
        match &self.body {
            CellBody::Text(c) => &c.content,
            CellBody::Code(c) => &c.content,
            CellBody::Chart(c) => c.content(),
        }
    }

    /// Output of the last successful run. Always empty for Text and Chart.
    pub fn output(&self) -> &str {
        match &self.body {
            CellBody::Code(c) => &c.output,
            CellBody::Text(_) | CellBody::Chart(_) => "",
        }
    }

    /// Error of the last run, if it failed.
    pub fn error(&self) -> Option<&str> {
        match &self.body {
            CellBody::Code(c) => c.error.as_deref(),
            CellBody::Chart(c) => c.error.as_deref(),
            CellBody::Text(_) => None,
        }
    }

    /// This cell with its content replaced. Output and error are kept.
    pub fn with_new_content(self, content: impl Into<String>) -> Self {
        let content = content.into();
        let body = match self.body {
            CellBody::Text(_) => CellBody::Text(TextCell { content }),
            CellBody::Code(c) => CellBody::Code(CodeCell { content, ..c }),
            CellBody::Chart(c) => CellBody::Chart(c.with_content(content)),
        };
        Self { id: self.id, body }
    }

    /// This cell with an execution outcome merged in.
    ///
    /// A success replaces the output and clears the error. A failure sets the
    /// error and leaves the previous output alone. Outcomes that do not apply
    /// to the cell's kind are ignored.
    pub fn with_outcome(self, outcome: ExecOutcome) -> Self {
        let body = match (self.body, outcome) {
            (CellBody::Code(c), ExecOutcome::Output(output)) => CellBody::Code(CodeCell {
                output,
                error: None,
                ..c
            }),
            (CellBody::Code(c), ExecOutcome::Failed(msg)) => CellBody::Code(CodeCell {
                error: Some(msg),
                ..c
            }),
            (CellBody::Chart(c), ExecOutcome::Validated) => {
                CellBody::Chart(ChartCell { error: None, ..c })
            }
            (CellBody::Chart(c), ExecOutcome::Failed(msg)) => CellBody::Chart(ChartCell {
                error: Some(msg),
                ..c
            }),
            (body, _) => body,
        };
        Self { id: self.id, body }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse() {
        assert_eq!(CellKind::from_str("code"), Some(CellKind::Code));
        assert_eq!(CellKind::from_str("CHART"), Some(CellKind::Chart));
        assert_eq!(CellKind::from_str("markdown"), Some(CellKind::Text));
        assert_eq!(CellKind::from_str("md"), Some(CellKind::Text));
        assert_eq!(CellKind::from_str("python"), None);
    }

    #[test]
    fn test_kind_serde_lowercase() {
        assert_eq!(serde_json::to_string(&CellKind::Chart).unwrap(), "\"chart\"");
        let kind: CellKind = serde_json::from_str("\"text\"").unwrap();
        assert_eq!(kind, CellKind::Text);
        assert_eq!(CellKind::Code.to_string(), "code");
    }

    #[test]
    fn test_new_cells_have_kind_defaults() {
        let text = Cell::new(CellKind::Text);
        assert_eq!(text.content(), "");
        assert_eq!(text.output(), "");
        assert_eq!(text.error(), None);

        let code = Cell::new(CellKind::Code);
        assert_eq!(code.content(), "");

        let chart = Cell::new(CellKind::Chart);
        assert!(!chart.content().is_empty());
        match chart.body() {
            CellBody::Chart(c) => assert!(c.config().is_some()),
            other => panic!("expected chart body, got {:?}", other),
        }
    }

    #[test]
    fn test_new_ids_are_unique() {
        let a = Cell::new(CellKind::Code);
        let b = Cell::new(CellKind::Code);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_code_success_replaces_output_and_clears_error() {
        let cell = Cell::with_content(CellKind::Code, "x")
            .with_outcome(ExecOutcome::Failed("old".into()))
            .with_outcome(ExecOutcome::Output("fresh\n".into()));
        assert_eq!(cell.output(), "fresh\n");
        assert_eq!(cell.error(), None);
    }

    #[test]
    fn test_code_failure_keeps_prior_output() {
        let cell = Cell::with_content(CellKind::Code, "x")
            .with_outcome(ExecOutcome::Output("kept\n".into()))
            .with_outcome(ExecOutcome::Failed("boom".into()));
        assert_eq!(cell.output(), "kept\n");
        assert_eq!(cell.error(), Some("boom"));
    }

    #[test]
    fn test_code_empty_success_clears_output() {
        let cell = Cell::with_content(CellKind::Code, "x")
            .with_outcome(ExecOutcome::Output("old\n".into()))
            .with_outcome(ExecOutcome::Output(String::new()));
        assert_eq!(cell.output(), "");
    }

    #[test]
    fn test_text_ignores_outcomes() {
        let cell = Cell::with_content(CellKind::Text, "# hi");
        let after = cell.clone().with_outcome(ExecOutcome::Failed("nope".into()));
        assert_eq!(after, cell);
        let after = cell.clone().with_outcome(ExecOutcome::Output("nope".into()));
        assert_eq!(after, cell);
    }

    #[test]
    fn test_chart_validation_clears_error() {
        let cell = Cell::with_content(CellKind::Chart, "{bad")
            .with_outcome(ExecOutcome::Failed("Invalid JSON: x".into()));
        assert_eq!(cell.error(), Some("Invalid JSON: x"));

        let cell = cell
            .with_new_content(r#"{"type":"pie"}"#)
            .with_outcome(ExecOutcome::Validated);
        assert_eq!(cell.error(), None);
        assert_eq!(cell.output(), "");
    }

    #[test]
    fn test_chart_content_change_reparses() {
        let cell = Cell::with_content(CellKind::Chart, r#"{"type":"bar"}"#);
        let CellBody::Chart(chart) = cell.body() else {
            panic!("expected chart");
        };
        assert_eq!(chart.config().map(|c| c.chart_type.as_str()), Some("bar"));

        let cell = cell.with_new_content("not json");
        let CellBody::Chart(chart) = cell.body() else {
            panic!("expected chart");
        };
        assert!(chart.config().is_none());
        assert!(chart.parse_error().unwrap().starts_with("Invalid JSON:"));
    }

    #[test]
    fn test_content_edit_preserves_identity_and_output() {
        let cell = Cell::with_content(CellKind::Code, "a")
            .with_outcome(ExecOutcome::Output("1\n".into()));
        let id = cell.id().clone();
        let edited = cell.with_new_content("b");
        assert_eq!(edited.id(), &id);
        assert_eq!(edited.content(), "b");
        assert_eq!(edited.output(), "1\n");
    }
}
