//! Notebook kernel for techo.
//!
//! The kernel owns everything that happens *to* a document:
//! - Undo/redo over whole-document snapshots (`history`)
//! - Running code cells and validating chart cells (`executor`, `rhai_engine`)
//! - Reading and writing notebook files (`persist`)
//! - Tying those together behind one session type (`notebook`)
//!
//! The document model itself lives in `techo-types`.

pub mod config;
pub mod constants;
pub mod executor;
pub mod history;
pub mod notebook;
pub mod persist;
pub mod rhai_engine;

pub use config::{ConfigError, KernelConfig, ScriptLimits};
pub use executor::{CaptureBuffer, CellExecutor, NullSink, OutputSink, ScriptEngine};
pub use history::History;
pub use notebook::{Notebook, NotebookError};
pub use persist::PersistError;
pub use rhai_engine::RhaiEngine;
