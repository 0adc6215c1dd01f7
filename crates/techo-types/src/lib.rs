//! Cell and document types for techo notebooks.
//!
//! This crate is the value layer: every type here is plain data plus the pure
//! operations that derive one [`Document`] from another. Nothing in here
//! performs I/O, runs scripts, or keeps history. The kernel crate layers the
//! undo/redo engine, the executor and persistence on top.
//!
//! # Shape
//!
//! ```text
//! Document ← the unit of undo/redo
//!     └── title
//!     └── cells: [Cell]  (ordered, never empty, unique ids)
//!
//! Cell (CellId, fixed at creation)
//!     └── CellBody::Text(TextCell)    ← markdown source, never executed
//!     └── CellBody::Code(CodeCell)    ← script source + last output/error
//!     └── CellBody::Chart(ChartCell)  ← chart config text, parsed eagerly
//! ```
//!
//! # Key Types
//!
//! |-------------------|----------------------------------------------|
//! | Type              | Purpose                                      |
//! |-------------------|----------------------------------------------|
//! | [`CellId`]        | Opaque cell identity (UUIDv7 when minted)    |
//! | [`CellKind`]      | Text / Code / Chart discriminant             |
//! | [`Cell`]          | One cell: id + kind-specific body            |
//! | [`ChartConfig`]   | Parsed chart configuration                   |
//! | [`Document`]      | Title + ordered cells                        |
//! | [`ExecOutcome`]   | What a run produced, merged into a cell      |
//! |-------------------|----------------------------------------------|

pub mod cell;
pub mod chart;
pub mod document;
pub mod ids;

pub use cell::{Cell, CellBody, CellKind, ChartCell, CodeCell, ExecOutcome, TextCell};
pub use chart::{ChartConfig, ChartData, Dataset, default_chart_template};
pub use document::{DEFAULT_TITLE, Direction, Document, DocumentError};
pub use ids::{CellId, PrefixError, resolve_prefix};
