//! Notebook sessions.
//!
//! A [`Notebook`] is the document controller: it owns the undo history and
//! the executor, applies the pure operations from [`techo_types::Document`],
//! and commits each result. A result equal to the current document is not
//! committed, so edits to unknown cells, moves past a boundary and other
//! no-ops never leave an undo step behind.
//!
//! Running a cell is a commit like any other; undo restores the output and
//! error the cell had before the run.

use std::path::Path;
use std::sync::Arc;

use techo_types::{
    CellId, CellKind, Direction, Document, DocumentError, ExecOutcome, PrefixError,
    resolve_prefix,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::KernelConfig;
use crate::executor::{CellExecutor, NullSink, OutputSink};
use crate::history::History;
use crate::persist::{self, PersistError};
use crate::rhai_engine::RhaiEngine;

/// Errors from notebook operations.
#[derive(Debug, Error)]
pub enum NotebookError {
    #[error(transparent)]
    UnknownCell(#[from] PrefixError),

    #[error("no cell with id {0}")]
    MissingCell(CellId),

    #[error(transparent)]
    Rejected(#[from] DocumentError),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// An open notebook: history plus executor.
#[derive(Debug)]
pub struct Notebook {
    history: History<Document>,
    executor: CellExecutor,
}

impl Notebook {
    /// A notebook showing the welcome document.
    pub fn new(config: &KernelConfig) -> Self {
        Self::from_document(Document::welcome(), config)
    }

    /// A notebook opened on `doc`, with a Rhai executor using the configured limits.
    pub fn from_document(doc: Document, config: &KernelConfig) -> Self {
        let executor = CellExecutor::new(RhaiEngine::with_limits(config.limits.clone()));
        Self::with_executor(doc, config.history_limit, executor)
    }

    pub fn with_executor(doc: Document, history_limit: usize, executor: CellExecutor) -> Self {
        Self {
            history: History::with_limit(doc, history_limit),
            executor,
        }
    }

    pub fn document(&self) -> &Document {
        self.history.present()
    }

    pub fn history(&self) -> &History<Document> {
        &self.history
    }

    pub fn executor(&self) -> &CellExecutor {
        &self.executor
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        let moved = self.history.undo();
        debug!(moved, "undo");
        moved
    }

    pub fn redo(&mut self) -> bool {
        let moved = self.history.redo();
        debug!(moved, "redo");
        moved
    }

    /// Commit `next` unless it matches the present. Returns whether it did.
    fn apply(&mut self, op: &str, next: Document) -> bool {
        if next == *self.history.present() {
            debug!("{}: no change", op);
            return false;
        }
        self.history.commit(next);
        debug!("{}: committed", op);
        true
    }

    // ── Edits ───────────────────────────────────────────────────────────

    pub fn set_title(&mut self, title: impl Into<String>) -> bool {
        let next = self.document().with_title(title);
        self.apply("set_title", next)
    }

    /// Replace a cell's content. Unknown ids change nothing.
    pub fn edit_cell(&mut self, id: &CellId, content: impl Into<String>) -> bool {
        let next = self.document().with_cell_content(id, content);
        self.apply("edit_cell", next)
    }

    /// Insert a new cell of `kind` at `at` (clamped). Returns its id.
    pub fn add_cell(&mut self, kind: CellKind, at: usize) -> CellId {
        let (next, id) = self.document().with_inserted_cell(kind, at);
        self.apply("add_cell", next);
        info!("Added {} cell {}", kind, id.short());
        id
    }

    /// Append a new cell of `kind` at the end.
    pub fn push_cell(&mut self, kind: CellKind) -> CellId {
        let len = self.document().len();
        self.add_cell(kind, len)
    }

    pub fn move_cell(&mut self, id: &CellId, direction: Direction) -> bool {
        let next = self.document().with_moved_cell(id, direction);
        self.apply("move_cell", next)
    }

    /// Delete a cell. Deleting the only cell is rejected and changes nothing.
    pub fn delete_cell(&mut self, id: &CellId) -> Result<bool, NotebookError> {
        match self.document().without_cell(id) {
            Ok(next) => Ok(self.apply("delete_cell", next)),
            Err(e) => {
                warn!("Rejected delete of {}: {}", id.short(), e);
                Err(e.into())
            }
        }
    }

    // ── Execution ───────────────────────────────────────────────────────

    /// Run one cell and record its outcome.
    pub fn run_cell(&mut self, id: &CellId) -> Result<ExecOutcome, NotebookError> {
        self.run_cell_with(id, Arc::new(NullSink))
    }

    /// Run one cell, streaming script output to `sink` as it is produced.
    pub fn run_cell_with(
        &mut self,
        id: &CellId,
        sink: Arc<dyn OutputSink>,
    ) -> Result<ExecOutcome, NotebookError> {
        let cell = self
            .document()
            .get(id)
            .ok_or_else(|| NotebookError::MissingCell(id.clone()))?;
        let outcome = self.executor.execute(cell, sink);
        if outcome != ExecOutcome::Skipped {
            let next = self.document().with_outcome(id, outcome.clone());
            self.apply("run_cell", next);
        }
        Ok(outcome)
    }

    /// Run every executable cell top to bottom. Each run is its own commit.
    pub fn run_all(&mut self) -> Vec<(CellId, ExecOutcome)> {
        self.run_all_with(Arc::new(NullSink))
    }

    pub fn run_all_with(&mut self, sink: Arc<dyn OutputSink>) -> Vec<(CellId, ExecOutcome)> {
        let ids: Vec<CellId> = self
            .document()
            .cells()
            .iter()
            .filter(|c| c.kind().is_executable())
            .map(|c| c.id().clone())
            .collect();

        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            match self.run_cell_with(&id, sink.clone()) {
                Ok(outcome) => results.push((id, outcome)),
                Err(e) => warn!("run_all: {}", e),
            }
        }
        results
    }

    // ── Whole-document operations ───────────────────────────────────────

    /// Start over with the welcome document. Undo history is discarded.
    pub fn reset(&mut self) {
        self.replace_document(Document::welcome());
    }

    /// Show `doc` instead of the current document. Undo history is discarded.
    pub fn replace_document(&mut self, doc: Document) {
        info!("Opened \"{}\" ({} cells)", doc.title(), doc.len());
        self.history.reset(doc);
    }

    pub async fn save_to(&self, path: impl AsRef<Path>) -> Result<(), NotebookError> {
        persist::save_file(path, self.document()).await?;
        Ok(())
    }

    /// Load `path` and replace the current document. On error nothing changes.
    pub async fn load_from(&mut self, path: impl AsRef<Path>) -> Result<(), NotebookError> {
        let doc = persist::load_file(path).await?;
        self.replace_document(doc);
        Ok(())
    }

    // ── Addressing ──────────────────────────────────────────────────────

    /// Find a cell by 1-based position, full id or unique id prefix.
    ///
    /// A plain number within `1..=len` is a position; anything else is
    /// matched against ids.
    pub fn resolve_cell(&self, query: &str) -> Result<CellId, NotebookError> {
        let doc = self.document();
        if let Ok(n) = query.parse::<usize>()
            && (1..=doc.len()).contains(&n)
        {
            return Ok(doc.cells()[n - 1].id().clone());
        }
        Ok(resolve_prefix(doc.ids().cloned(), query)?)
    }
}
