//! Notebook files.
//!
//! A notebook is stored as JSON:
//!
//! ```json
//! {
//!   "title": "Untitled",
//!   "cells": [
//!     { "id": "0192…", "type": "code", "content": "console.log(1);", "output": "1\n", "error": null }
//!   ]
//! }
//! ```
//!
//! Ids are opaque strings and are kept exactly as written. Decoding is
//! all-or-nothing: unknown fields, an empty id, a duplicate id or an empty
//! cell list reject the whole file. Text and chart cells are written
//! with an empty `output` and whatever `output` they carry on load is ignored.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use techo_types::{
    Cell, CellBody, CellId, CellKind, ChartCell, CodeCell, Document, DocumentError, TextCell,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::constants::{NOTEBOOK_EXTENSION, UNTITLED_FILE_STEM};

/// Errors reading or writing notebook files.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("malformed notebook: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cell {index} has an empty id")]
    EmptyId { index: usize },

    #[error("invalid notebook: {0}")]
    Structure(#[from] DocumentError),

    #[error("{path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct DocumentRecord {
    title: String,
    cells: Vec<CellRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct CellRecord {
    id: String,
    #[serde(rename = "type")]
    kind: CellKind,
    content: String,
    output: String,
    #[serde(default)]
    error: Option<String>,
}

impl From<&Cell> for CellRecord {
    fn from(cell: &Cell) -> Self {
        Self {
            id: cell.id().to_string(),
            kind: cell.kind(),
            content: cell.content().to_string(),
            output: cell.output().to_string(),
            error: cell.error().map(str::to_string),
        }
    }
}

impl From<CellRecord> for Cell {
    fn from(record: CellRecord) -> Self {
        let id = CellId::from(record.id);

        let body = match record.kind {
            CellKind::Text => {
                if !record.output.is_empty() || record.error.is_some() {
                    debug!("dropping output/error stored on text cell {}", id.short());
                }
                CellBody::Text(TextCell {
                    content: record.content,
                })
            }
            CellKind::Code => CellBody::Code(CodeCell {
                content: record.content,
                output: record.output,
                error: record.error,
            }),
            CellKind::Chart => {
                let mut chart = ChartCell::new(record.content);
                chart.error = record.error;
                CellBody::Chart(chart)
            }
        };

        Cell::from_parts(id, body)
    }
}

fn to_record(doc: &Document) -> DocumentRecord {
    DocumentRecord {
        title: doc.title().to_string(),
        cells: doc.cells().iter().map(CellRecord::from).collect(),
    }
}

/// Encode a document as pretty-printed JSON.
pub fn to_json_bytes(doc: &Document) -> Result<Vec<u8>, PersistError> {
    Ok(serde_json::to_vec_pretty(&to_record(doc))?)
}

/// Encode a document as a pretty-printed JSON string.
pub fn to_json_string(doc: &Document) -> Result<String, PersistError> {
    Ok(serde_json::to_string_pretty(&to_record(doc))?)
}

/// Decode a document. Nothing is returned unless the whole file is valid.
pub fn from_json_bytes(bytes: &[u8]) -> Result<Document, PersistError> {
    let record: DocumentRecord = serde_json::from_slice(bytes)?;
    if let Some(index) = record.cells.iter().position(|c| c.id.is_empty()) {
        return Err(PersistError::EmptyId { index });
    }
    let cells = record.cells.into_iter().map(Cell::from).collect();
    Ok(Document::new(record.title, cells)?)
}

/// Read and decode a notebook file.
pub async fn load_file(path: impl AsRef<Path>) -> Result<Document, PersistError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let doc = from_json_bytes(&bytes)?;
    info!("Loaded {:?} ({} cells)", path, doc.len());
    Ok(doc)
}

/// Encode and write a notebook file, replacing any existing file.
pub async fn save_file(path: impl AsRef<Path>, doc: &Document) -> Result<(), PersistError> {
    let path = path.as_ref();
    let bytes = to_json_bytes(doc)?;
    tokio::fs::write(path, &bytes)
        .await
        .map_err(|source| PersistError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    info!("Saved {:?} ({} bytes)", path, bytes.len());
    Ok(())
}

/// File name to offer when saving: the title, or a placeholder when blank.
///
/// Path separators in the title are replaced so the result is a single
/// file name.
pub fn suggested_file_name(doc: &Document) -> String {
    let title = doc.title().trim();
    let stem = if title.is_empty() {
        UNTITLED_FILE_STEM.to_string()
    } else {
        title.replace(['/', '\\'], "-")
    };
    format!("{}.{}", stem, NOTEBOOK_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use techo_types::ExecOutcome;

    fn sample() -> Document {
        let text = Cell::with_content(CellKind::Text, "# Notes");
        let code = Cell::with_content(CellKind::Code, "console.log(1);")
            .with_outcome(ExecOutcome::Output("1\n".into()))
            .with_outcome(ExecOutcome::Failed("later".into()));
        let chart = Cell::with_content(CellKind::Chart, "{bad")
            .with_outcome(ExecOutcome::Failed("Invalid JSON: x".into()));
        Document::new("Report", vec![text, code, chart]).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let doc = sample();
        let bytes = to_json_bytes(&doc).unwrap();
        assert_eq!(from_json_bytes(&bytes).unwrap(), doc);
    }

    #[test]
    fn test_wire_shape() {
        let doc = sample();
        let value: serde_json::Value = serde_json::from_slice(&to_json_bytes(&doc).unwrap()).unwrap();
        assert_eq!(value["title"], "Report");
        let code = &value["cells"][1];
        assert_eq!(code["type"], "code");
        assert_eq!(code["output"], "1\n");
        assert_eq!(code["error"], "later");
        assert_eq!(code["id"], doc.cells()[1].id().to_string());
        assert_eq!(value["cells"][0]["error"], serde_json::Value::Null);
        assert_eq!(value["cells"][2]["output"], "");
    }

    #[test]
    fn test_loads_hand_written_file() {
        let json = r#"{
            "title": "Untitled",
            "cells": [
                {"id": "3f2504e0-4f89-41d3-9a0c-0305e82c3301", "type": "code",
                 "content": "console.log(2)", "output": "2\n", "error": null}
            ]
        }"#;
        let doc = from_json_bytes(json.as_bytes()).unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.cells()[0].id().short(), "3f2504e0");
        assert_eq!(doc.cells()[0].output(), "2\n");
    }

    #[test]
    fn test_text_cell_output_ignored() {
        let json = r#"{"title": "t", "cells": [
            {"id": "3f2504e0-4f89-41d3-9a0c-0305e82c3301", "type": "text",
             "content": "hi", "output": "stale", "error": "stale"}
        ]}"#;
        let doc = from_json_bytes(json.as_bytes()).unwrap();
        assert_eq!(doc.cells()[0].output(), "");
        assert_eq!(doc.cells()[0].error(), None);
    }

    #[test]
    fn test_rejects_missing_title() {
        let err = from_json_bytes(br#"{"cells": []}"#).unwrap_err();
        assert!(matches!(err, PersistError::Json(_)));
    }

    #[test]
    fn test_rejects_empty_cells() {
        let err = from_json_bytes(br#"{"title": "t", "cells": []}"#).unwrap_err();
        assert!(matches!(err, PersistError::Structure(DocumentError::Empty)));
    }

    #[test]
    fn test_rejects_unknown_kind() {
        let json = br#"{"title": "t", "cells": [
            {"id": "3f2504e0-4f89-41d3-9a0c-0305e82c3301", "type": "sql",
             "content": "", "output": "", "error": null}
        ]}"#;
        assert!(matches!(from_json_bytes(json), Err(PersistError::Json(_))));
    }

    #[test]
    fn test_rejects_unknown_field() {
        let json = br#"{"title": "t", "version": 2, "cells": [
            {"id": "3f2504e0-4f89-41d3-9a0c-0305e82c3301", "type": "code",
             "content": "", "output": "", "error": null}
        ]}"#;
        assert!(matches!(from_json_bytes(json), Err(PersistError::Json(_))));
    }

    #[test]
    fn test_opaque_ids_round_trip() {
        let json = br#"{"title": "t", "cells": [
            {"id": "cell-1", "type": "code", "content": "", "output": "", "error": null},
            {"id": "intro", "type": "text", "content": "hi", "output": "", "error": null}
        ]}"#;
        let doc = from_json_bytes(json).unwrap();
        assert_eq!(doc.cells()[0].id().as_str(), "cell-1");
        assert_eq!(doc.cells()[1].id().as_str(), "intro");

        let value: serde_json::Value = serde_json::from_slice(&to_json_bytes(&doc).unwrap()).unwrap();
        assert_eq!(value["cells"][0]["id"], "cell-1");
        assert_eq!(value["cells"][1]["id"], "intro");
        assert_eq!(from_json_bytes(&to_json_bytes(&doc).unwrap()).unwrap(), doc);
    }

    #[test]
    fn test_rejects_empty_id() {
        let json = br#"{"title": "t", "cells": [
            {"id": "a", "type": "code", "content": "", "output": "", "error": null},
            {"id": "", "type": "code", "content": "", "output": "", "error": null}
        ]}"#;
        let err = from_json_bytes(json).unwrap_err();
        assert!(matches!(err, PersistError::EmptyId { index: 1 }));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let json = br#"{"title": "t", "cells": [
            {"id": "3f2504e0-4f89-41d3-9a0c-0305e82c3301", "type": "code", "content": "", "output": "", "error": null},
            {"id": "3f2504e0-4f89-41d3-9a0c-0305e82c3301", "type": "text", "content": "", "output": "", "error": null}
        ]}"#;
        let err = from_json_bytes(json).unwrap_err();
        assert!(matches!(err, PersistError::Structure(DocumentError::DuplicateCell(_))));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(from_json_bytes(b"not json"), Err(PersistError::Json(_))));
    }

    #[test]
    fn test_suggested_file_name() {
        let doc = Document::welcome();
        assert_eq!(suggested_file_name(&doc), "Untitled.json");
        assert_eq!(suggested_file_name(&doc.with_title("  ")), "untitled-notebook.json");
        assert_eq!(suggested_file_name(&doc.with_title("a/b")), "a-b.json");
    }

    #[tokio::test]
    async fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nb.json");
        let doc = sample();

        save_file(&path, &doc).await.unwrap();
        let loaded = load_file(&path).await.unwrap();
        assert_eq!(loaded, doc);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_file(dir.path().join("missing.json")).await.unwrap_err();
        assert!(matches!(err, PersistError::Io { .. }));
    }
}
