//! Documents and the pure operations that derive one document from another.
//!
//! Every operation takes `&self` and returns a new [`Document`]; nothing here
//! mutates in place. The kernel's `Notebook` feeds the results to the history
//! engine, which is what makes each of them undoable.
//!
//! Operations that cannot apply (unknown id, moving past a boundary) return a
//! document equal to the input. Callers compare before committing so that
//! no-ops never leave a history entry behind.

use std::collections::HashSet;

use strum::{Display, EnumString};
use thiserror::Error;

use crate::cell::{Cell, CellKind, ExecOutcome};
use crate::ids::CellId;

/// Title given to documents that have not been named.
pub const DEFAULT_TITLE: &str = "Untitled";

/// Markdown shown in the first cell of a new notebook.
const WELCOME_TEXT: &str = "# Welcome to techo\n\n\
A notebook is a list of cells. There are three kinds:\n\n\
- **Text**: markdown, rendered in place\n\
- **Code**: Rhai scripts; `console.log(...)` output is captured below the cell\n\
- **Chart**: a JSON chart configuration, checked when you run it\n\n\
Edit this cell or add new ones below. Every change can be undone.";

/// Structural errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// A document needs at least one cell.
    #[error("notebook must have at least one cell")]
    Empty,

    /// Deleting this cell would leave the document empty.
    #[error("cannot delete the last cell: notebook must have at least one cell")]
    LastCell,

    /// Two cells share an id.
    #[error("duplicate cell id: {0}")]
    DuplicateCell(CellId),
}

/// Direction for [`Document::with_moved_cell`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Direction {
    Up,
    Down,
}

/// Title plus an ordered, non-empty list of cells with unique ids.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    title: String,
    cells: Vec<Cell>,
}

impl Document {
    /// Build a document, checking the structural invariants.
    pub fn new(title: impl Into<String>, cells: Vec<Cell>) -> Result<Self, DocumentError> {
        if cells.is_empty() {
            return Err(DocumentError::Empty);
        }
        let mut seen = HashSet::with_capacity(cells.len());
        for cell in &cells {
            if !seen.insert(cell.id()) {
                return Err(DocumentError::DuplicateCell(cell.id().clone()));
            }
        }
        Ok(Self {
            title: title.into(),
            cells,
        })
    }

    /// A document holding a single cell.
    pub fn single(title: impl Into<String>, cell: Cell) -> Self {
        Self {
            title: title.into(),
            cells: vec![cell],
        }
    }

    /// The document a fresh notebook starts with.
    pub fn welcome() -> Self {
        Self::single(DEFAULT_TITLE, Cell::with_content(CellKind::Text, WELCOME_TEXT))
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false for a valid document; here for API completeness.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Index of the cell with `id`.
    pub fn position(&self, id: &CellId) -> Option<usize> {
        self.cells.iter().position(|c| c.id() == id)
    }

    pub fn get(&self, id: &CellId) -> Option<&Cell> {
        self.cells.iter().find(|c| c.id() == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &CellId> + '_ {
        self.cells.iter().map(Cell::id)
    }

    // ── Operations ──────────────────────────────────────────────────────

    /// This document with its title replaced.
    pub fn with_title(&self, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            cells: self.cells.clone(),
        }
    }

    /// This document with cell `id`'s content replaced.
    pub fn with_cell_content(&self, id: &CellId, content: impl Into<String>) -> Self {
        let content = content.into();
        self.map_cell(id, |cell| cell.with_new_content(content))
    }

    /// This document with a new cell of `kind` inserted at `at`.
    ///
    /// `at` is clamped to `0..=len`. Returns the id of the new cell.
    pub fn with_inserted_cell(&self, kind: CellKind, at: usize) -> (Self, CellId) {
        let cell = Cell::new(kind);
        let id = cell.id().clone();
        let at = at.min(self.cells.len());
        let mut cells = self.cells.clone();
        cells.insert(at, cell);
        (
            Self {
                title: self.title.clone(),
                cells,
            },
            id,
        )
    }

    /// This document with cell `id` swapped with its neighbor.
    ///
    /// Moving the first cell up, the last cell down, or an unknown id leaves
    /// the order unchanged.
    pub fn with_moved_cell(&self, id: &CellId, direction: Direction) -> Self {
        let mut cells = self.cells.clone();
        if let Some(index) = self.position(id) {
            match direction {
                Direction::Up if index > 0 => cells.swap(index, index - 1),
                Direction::Down if index + 1 < cells.len() => cells.swap(index, index + 1),
                _ => {}
            }
        }
        Self {
            title: self.title.clone(),
            cells,
        }
    }

    /// This document without cell `id`.
    ///
    /// Rejected with [`DocumentError::LastCell`] if only one cell remains.
    /// An unknown id yields an identical document.
    pub fn without_cell(&self, id: &CellId) -> Result<Self, DocumentError> {
        if self.position(id).is_none() {
            return Ok(self.clone());
        }
        if self.cells.len() <= 1 {
            return Err(DocumentError::LastCell);
        }
        Ok(Self {
            title: self.title.clone(),
            cells: self.cells.iter().filter(|c| c.id() != id).cloned().collect(),
        })
    }

    /// This document with an execution outcome merged into cell `id`.
    pub fn with_outcome(&self, id: &CellId, outcome: ExecOutcome) -> Self {
        self.map_cell(id, |cell| cell.with_outcome(outcome))
    }

    fn map_cell(&self, id: &CellId, f: impl FnOnce(Cell) -> Cell) -> Self {
        let mut cells = self.cells.clone();
        if let Some(slot) = cells.iter_mut().find(|c| c.id() == id) {
            *slot = f(slot.clone());
        }
        Self {
            title: self.title.clone(),
            cells,
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::welcome()
    }
}
