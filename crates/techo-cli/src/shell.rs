//! Line-oriented command shell.
//!
//! One command per line, verb first:
//!
//! ```text
//! add code            edit 2 console.log("hi")\n console.log(1)
//! run 2               move 2 up
//! undo / redo         save notes.json
//! ```
//!
//! Cells are addressed by 1-based position, full id or unique id prefix.

use std::io::Write;
use std::path::PathBuf;

use strum::IntoEnumIterator;
use techo_kernel::{Notebook, persist};
use techo_types::{CellId, CellKind, Direction, ExecOutcome};
use thiserror::Error;

use crate::render::{render_cell, render_document};

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Show,
    Title(String),
    /// Insert before 1-based position `at`, or append.
    Add {
        kind: CellKind,
        at: Option<usize>,
    },
    Edit {
        cell: String,
        content: String,
    },
    Move {
        cell: String,
        direction: Direction,
    },
    Delete(String),
    Run(String),
    RunAll,
    Undo,
    Redo,
    New,
    Save(Option<PathBuf>),
    Load(PathBuf),
    Help,
    Quit,
}

/// Why a line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("unknown cell kind '{0}'")]
    Kind(String),

    #[error("expected 'up' or 'down', got '{0}'")]
    Direction(String),

    #[error("invalid position '{0}'")]
    Position(String),
}

/// Parse one input line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>, ParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb {
        "show" | "ls" => Command::Show,
        "title" => {
            if rest.is_empty() {
                return Err(ParseError::Usage("title <text>"));
            }
            Command::Title(rest.to_string())
        }
        "add" => {
            let mut parts = rest.split_whitespace();
            let kind = parts.next().ok_or(ParseError::Usage("add <text|code|chart> [pos]"))?;
            let kind = CellKind::from_str(kind).ok_or_else(|| ParseError::Kind(kind.to_string()))?;
            let at = match parts.next() {
                Some(pos) => Some(
                    pos.parse::<usize>()
                        .map_err(|_| ParseError::Position(pos.to_string()))?,
                ),
                None => None,
            };
            Command::Add { kind, at }
        }
        "edit" => {
            let (cell, content) = rest
                .split_once(char::is_whitespace)
                .map(|(cell, content)| (cell, content.trim_start()))
                .unwrap_or((rest, ""));
            if cell.is_empty() {
                return Err(ParseError::Usage("edit <cell> <text>"));
            }
            Command::Edit {
                cell: cell.to_string(),
                content: unescape(content),
            }
        }
        "move" | "mv" => {
            let mut parts = rest.split_whitespace();
            let (Some(cell), Some(dir)) = (parts.next(), parts.next()) else {
                return Err(ParseError::Usage("move <cell> <up|down>"));
            };
            let direction = dir
                .parse::<Direction>()
                .map_err(|_| ParseError::Direction(dir.to_string()))?;
            Command::Move {
                cell: cell.to_string(),
                direction,
            }
        }
        "delete" | "rm" => Command::Delete(required(rest, "delete <cell>")?),
        "run" => Command::Run(required(rest, "run <cell>")?),
        "run-all" => Command::RunAll,
        "undo" => Command::Undo,
        "redo" => Command::Redo,
        "new" => Command::New,
        "save" => Command::Save((!rest.is_empty()).then(|| PathBuf::from(rest))),
        "load" | "open" => Command::Load(PathBuf::from(required(rest, "load <path>")?)),
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(ParseError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn required(rest: &str, usage: &'static str) -> Result<String, ParseError> {
    if rest.is_empty() {
        Err(ParseError::Usage(usage))
    } else {
        Ok(rest.to_string())
    }
}

/// Expand `\n`, `\t` and `\\` so multi-line content fits on one line.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn help_text() -> String {
    let kinds = CellKind::iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join("|");
    format!(
        "commands:\n\
         \x20 show                     print the notebook\n\
         \x20 title <text>             rename the notebook\n\
         \x20 add <{kinds}> [pos]  insert a cell (default: at the end)\n\
         \x20 edit <cell> <text>       replace a cell's content (\\n for newlines)\n\
         \x20 move <cell> <up|down>    swap a cell with its neighbor\n\
         \x20 delete <cell>            remove a cell\n\
         \x20 run <cell>               run a code cell or check a chart\n\
         \x20 run-all                  run every cell in order\n\
         \x20 undo / redo              step through history\n\
         \x20 new                      start a fresh notebook\n\
         \x20 save [path]              write the notebook as JSON\n\
         \x20 load <path>              open a notebook file\n\
         \x20 quit                     leave\n\
         cells are addressed by position (1, 2, ...) or id prefix"
    )
}

/// What the read loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Interactive session over a notebook, writing to `out`.
pub struct Shell<W: Write> {
    notebook: Notebook,
    path: Option<PathBuf>,
    out: W,
}

impl<W: Write> Shell<W> {
    pub fn new(notebook: Notebook, path: Option<PathBuf>, out: W) -> Self {
        Self {
            notebook,
            path,
            out,
        }
    }

    pub fn notebook(&self) -> &Notebook {
        &self.notebook
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    #[cfg(test)]
    pub fn output(&self) -> &W {
        &self.out
    }

    /// Parse and run one line. Errors are reported to the caller, which
    /// shows them and keeps reading.
    pub async fn handle_line(&mut self, line: &str) -> anyhow::Result<Flow> {
        match parse_line(line)? {
            Some(command) => self.execute(command).await,
            None => Ok(Flow::Continue),
        }
    }

    pub async fn execute(&mut self, command: Command) -> anyhow::Result<Flow> {
        match command {
            Command::Show => {
                write!(self.out, "{}", render_document(self.notebook.document()))?;
            }
            Command::Title(title) => {
                self.notebook.set_title(title);
            }
            Command::Add { kind, at } => {
                let len = self.notebook.document().len();
                let index = at.map(|pos| pos.saturating_sub(1)).unwrap_or(len);
                let id = self.notebook.add_cell(kind, index);
                let position = self.position_of(&id);
                writeln!(self.out, "added {} cell at {}", kind, position)?;
            }
            Command::Edit { cell, content } => {
                let id = self.notebook.resolve_cell(&cell)?;
                if !self.notebook.edit_cell(&id, content) {
                    writeln!(self.out, "no change")?;
                }
            }
            Command::Move { cell, direction } => {
                let id = self.notebook.resolve_cell(&cell)?;
                if !self.notebook.move_cell(&id, direction) {
                    writeln!(self.out, "cannot move {} from here", direction)?;
                }
            }
            Command::Delete(cell) => {
                let id = self.notebook.resolve_cell(&cell)?;
                self.notebook.delete_cell(&id)?;
            }
            Command::Run(cell) => {
                let id = self.notebook.resolve_cell(&cell)?;
                self.notebook.run_cell(&id)?;
                let position = self.position_of(&id);
                if let Some(cell) = self.notebook.document().get(&id) {
                    write!(self.out, "{}", render_cell(position, cell))?;
                }
            }
            Command::RunAll => {
                let results = self.notebook.run_all();
                let failed = results.iter().filter(|(_, o)| o.is_failure()).count();
                for (id, outcome) in &results {
                    if let ExecOutcome::Failed(message) = outcome {
                        writeln!(self.out, "[{}] error: {}", self.position_of(id), message)?;
                    }
                }
                writeln!(self.out, "ran {} cells, {} failed", results.len(), failed)?;
            }
            Command::Undo => {
                if !self.notebook.undo() {
                    writeln!(self.out, "nothing to undo")?;
                }
            }
            Command::Redo => {
                if !self.notebook.redo() {
                    writeln!(self.out, "nothing to redo")?;
                }
            }
            Command::New => {
                self.notebook.reset();
                self.path = None;
            }
            Command::Save(path) => {
                let path = path
                    .or_else(|| self.path.clone())
                    .unwrap_or_else(|| PathBuf::from(persist::suggested_file_name(self.notebook.document())));
                self.notebook.save_to(&path).await?;
                writeln!(self.out, "saved {}", path.display())?;
                self.path = Some(path);
            }
            Command::Load(path) => {
                self.notebook.load_from(&path).await?;
                writeln!(
                    self.out,
                    "loaded {} ({} cells)",
                    path.display(),
                    self.notebook.document().len()
                )?;
                self.path = Some(path);
            }
            Command::Help => {
                writeln!(self.out, "{}", help_text())?;
            }
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn position_of(&self, id: &CellId) -> usize {
        self.notebook
            .document()
            .position(id)
            .map(|i| i + 1)
            .unwrap_or(0)
    }
}
