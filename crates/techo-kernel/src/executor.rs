//! Cell execution.
//!
//! [`CellExecutor`] turns a cell into an [`ExecOutcome`]:
//!
//! | Kind  | Action                                   | Outcome              |
//! |-------|------------------------------------------|----------------------|
//! | Text  | nothing                                  | `Skipped`            |
//! | Code  | run the script on a [`ScriptEngine`]      | `Output` / `Failed`  |
//! | Chart | check the cached configuration parse     | `Validated` / `Failed` |
//!
//! Script output goes to an [`OutputSink`] supplied by the caller. The
//! executor records the same text so the outcome carries exactly what this
//! run printed, no matter where else the caller sends it.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use techo_types::{Cell, CellBody, ExecOutcome};
use tracing::{debug, warn};

/// Destination for text a script prints.
///
/// Writes arrive in program order and already include their line endings.
pub trait OutputSink: Send + Sync {
    fn write(&self, text: &str);
}

/// Sink that keeps everything written to it.
#[derive(Debug, Default)]
pub struct CaptureBuffer {
    buf: Mutex<String>,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far.
    pub fn contents(&self) -> String {
        self.buf.lock().clone()
    }

    /// Take everything written so far, leaving the buffer empty.
    pub fn take(&self) -> String {
        std::mem::take(&mut *self.buf.lock())
    }
}

impl OutputSink for CaptureBuffer {
    fn write(&self, text: &str) {
        self.buf.lock().push_str(text);
    }
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn write(&self, _text: &str) {}
}

/// Records a run's output while forwarding it to the caller's sink.
struct Recorder {
    captured: CaptureBuffer,
    forward: Arc<dyn OutputSink>,
}

impl OutputSink for Recorder {
    fn write(&self, text: &str) {
        self.captured.write(text);
        self.forward.write(text);
    }
}

/// A script interpreter the executor can hand code cells to.
pub trait ScriptEngine: Send + Sync {
    /// Engine name (e.g., "rhai").
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// Run `source` to completion, writing printed text to `sink`.
    ///
    /// Each call starts from a clean slate. The error is the message shown
    /// to the user.
    fn run(&self, source: &str, sink: Arc<dyn OutputSink>) -> Result<(), String>;
}

/// Evaluates cells by kind.
pub struct CellExecutor {
    engine: Box<dyn ScriptEngine>,
}

impl CellExecutor {
    pub fn new(engine: impl ScriptEngine + 'static) -> Self {
        Self {
            engine: Box::new(engine),
        }
    }

    pub fn engine(&self) -> &dyn ScriptEngine {
        self.engine.as_ref()
    }

    /// Execute `cell`, streaming any script output to `sink`.
    #[tracing::instrument(skip(self, cell, sink), fields(cell = %cell.id().short(), kind = %cell.kind()))]
    pub fn execute(&self, cell: &Cell, sink: Arc<dyn OutputSink>) -> ExecOutcome {
        match cell.body() {
            CellBody::Text(_) => ExecOutcome::Skipped,

            CellBody::Code(code) => {
                let recorder = Arc::new(Recorder {
                    captured: CaptureBuffer::new(),
                    forward: sink,
                });
                match self.engine.run(&code.content, recorder.clone()) {
                    Ok(()) => {
                        let output = recorder.captured.take();
                        debug!("{} run ok, {} bytes of output", self.engine.name(), output.len());
                        ExecOutcome::Output(output)
                    }
                    Err(message) => {
                        warn!("{} run failed: {}", self.engine.name(), message);
                        ExecOutcome::Failed(message)
                    }
                }
            }

            CellBody::Chart(chart) => match chart.parse_error() {
                None => ExecOutcome::Validated,
                Some(message) => {
                    debug!("chart rejected: {}", message);
                    ExecOutcome::Failed(message.to_string())
                }
            },
        }
    }

    /// Execute `cell`, discarding streamed output. The outcome still carries it.
    pub fn execute_quiet(&self, cell: &Cell) -> ExecOutcome {
        self.execute(cell, Arc::new(NullSink))
    }
}

impl fmt::Debug for CellExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellExecutor")
            .field("engine", &self.engine.name())
            .finish()
    }
}
