//! End-to-end notebook flows through the public kernel API.
//!
//! # Tiers
//!
//! - **Tier 1:** editing sessions with undo/redo, including the history cap
//! - **Tier 2:** execution merged into the document (code output, chart checks)
//! - **Tier 3:** save → load through real files, and failed loads

use std::sync::Arc;

use techo_kernel::constants::MAX_HISTORY;
use techo_kernel::{CaptureBuffer, KernelConfig, Notebook, NotebookError, PersistError, persist};
use techo_types::{CellId, CellKind, Direction, DocumentError, ExecOutcome};

fn notebook() -> Notebook {
    Notebook::new(&KernelConfig::default())
}

// ============================================================================
// Tier 1: editing and history
// ============================================================================

#[test]
fn test_build_reorder_and_undo_everything() {
    let mut nb = notebook();
    let intro = nb.document().cells()[0].id().clone();
    let code = nb.push_cell(CellKind::Code);
    let chart = nb.push_cell(CellKind::Chart);

    assert!(nb.move_cell(&chart, Direction::Up));
    let order: Vec<_> = nb.document().ids().collect();
    assert_eq!(order, vec![&intro, &chart, &code]);

    assert!(nb.delete_cell(&intro).unwrap());
    assert_eq!(nb.document().len(), 2);

    while nb.undo() {}
    assert_eq!(nb.document().ids().collect::<Vec<_>>(), vec![&intro]);

    while nb.redo() {}
    assert_eq!(nb.document().ids().collect::<Vec<_>>(), vec![&chart, &code]);
}

#[test]
fn test_new_edit_after_undo_drops_redo() {
    let mut nb = notebook();
    nb.set_title("one");
    nb.set_title("two");
    nb.undo();
    assert!(nb.can_redo());

    nb.set_title("three");
    assert!(!nb.can_redo());
    assert!(!nb.redo());
    assert_eq!(nb.document().title(), "three");
}

#[test]
fn test_history_cap() {
    let mut nb = notebook();
    let extra = 3;
    for i in 1..=MAX_HISTORY + extra {
        nb.set_title(format!("title {}", i));
    }
    assert_eq!(nb.history().past().len(), MAX_HISTORY);

    for _ in 0..MAX_HISTORY {
        assert!(nb.undo());
    }
    assert!(!nb.can_undo());
    // The initial state and the first few commits were evicted
    assert_eq!(nb.document().title(), format!("title {}", extra));
}

#[test]
fn test_configured_history_limit() {
    let config = KernelConfig {
        history_limit: 2,
        ..KernelConfig::default()
    };
    let mut nb = Notebook::new(&config);
    for title in ["a", "b", "c", "d"] {
        nb.set_title(title);
    }
    assert!(nb.undo());
    assert!(nb.undo());
    assert!(!nb.undo());
    assert_eq!(nb.document().title(), "b");
}

#[test]
fn test_delete_guard_keeps_last_cell() {
    let mut nb = notebook();
    let code = nb.push_cell(CellKind::Code);
    let intro = nb.document().cells()[0].id().clone();
    nb.delete_cell(&intro).unwrap();

    let err = nb.delete_cell(&code).unwrap_err();
    assert!(matches!(err, NotebookError::Rejected(DocumentError::LastCell)));
    assert_eq!(nb.document().len(), 1);
}

// ============================================================================
// Tier 2: execution
// ============================================================================

#[test]
fn test_code_output_streams_and_lands_in_cell() {
    let mut nb = notebook();
    let id = nb.push_cell(CellKind::Code);
    nb.edit_cell(
        &id,
        r#"
        let total = 0;
        for n in [1, 2, 3] { total += n; }
        console.log("total", total);
        console.log(#{ n: total });
        "#,
    );

    let sink = Arc::new(CaptureBuffer::new());
    let outcome = nb.run_cell_with(&id, sink.clone()).unwrap();

    let expected = "total 6\n{\n  \"n\": 6\n}\n";
    assert_eq!(outcome, ExecOutcome::Output(expected.into()));
    assert_eq!(sink.contents(), expected);
    assert_eq!(nb.document().get(&id).unwrap().output(), expected);
}

#[test]
fn test_failure_then_fix() {
    let mut nb = notebook();
    let id = nb.push_cell(CellKind::Code);

    nb.edit_cell(&id, r#"console.log("first");"#);
    nb.run_cell(&id).unwrap();

    nb.edit_cell(&id, r#"throw "boom";"#);
    nb.run_cell(&id).unwrap();
    let cell = nb.document().get(&id).unwrap();
    assert_eq!(cell.output(), "first\n");
    assert_eq!(cell.error(), Some("boom"));

    nb.edit_cell(&id, r#"console.log("fixed");"#);
    nb.run_cell(&id).unwrap();
    let cell = nb.document().get(&id).unwrap();
    assert_eq!(cell.output(), "fixed\n");
    assert_eq!(cell.error(), None);
}

#[test]
fn test_runs_do_not_share_state() {
    let mut nb = notebook();
    let first = nb.push_cell(CellKind::Code);
    let second = nb.push_cell(CellKind::Code);
    nb.edit_cell(&first, "let shared = 1;");
    nb.edit_cell(&second, "console.log(shared);");

    let results = nb.run_all();
    assert_eq!(results[0], (first, ExecOutcome::Output(String::new())));
    assert!(results[1].1.is_failure());
}

#[test]
fn test_chart_validation_cycle() {
    let mut nb = notebook();
    let id = nb.push_cell(CellKind::Chart);

    nb.edit_cell(&id, "{bad json");
    let outcome = nb.run_cell(&id).unwrap();
    assert!(outcome.is_failure());
    let error = nb.document().get(&id).unwrap().error().unwrap().to_string();
    assert!(error.starts_with("Invalid JSON:"), "got: {}", error);

    nb.edit_cell(&id, r#"{"type":"bar","data":{}}"#);
    assert_eq!(nb.run_cell(&id).unwrap(), ExecOutcome::Validated);
    let cell = nb.document().get(&id).unwrap();
    assert_eq!(cell.error(), None);
    assert_eq!(cell.output(), "");
}

// ============================================================================
// Tier 3: files
// ============================================================================

#[tokio::test]
async fn test_save_then_load_restores_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(persist::suggested_file_name(notebook().document()));

    let mut nb = notebook();
    nb.set_title("Quarterly");
    let code = nb.push_cell(CellKind::Code);
    nb.edit_cell(&code, "print(7);");
    nb.run_cell(&code).unwrap();
    nb.push_cell(CellKind::Chart);
    nb.save_to(&path).await.unwrap();

    let mut other = notebook();
    other.set_title("scratch");
    other.load_from(&path).await.unwrap();

    assert_eq!(other.document(), nb.document());
    assert!(!other.can_undo());
    assert_eq!(other.document().get(&code).unwrap().output(), "7\n");
}

#[tokio::test]
async fn test_failed_load_leaves_notebook_alone() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    tokio::fs::write(&path, br#"{"title": "x", "cells": []}"#).await.unwrap();

    let mut nb = notebook();
    nb.set_title("keep me");
    let err = nb.load_from(&path).await.unwrap_err();

    assert!(matches!(
        err,
        NotebookError::Persist(PersistError::Structure(DocumentError::Empty))
    ));
    assert_eq!(nb.document().title(), "keep me");
    assert!(nb.can_undo());
}

#[tokio::test]
async fn test_hand_named_ids_survive_edit_and_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("named.json");
    tokio::fs::write(
        &path,
        br##"{"title": "named", "cells": [
            {"id": "intro", "type": "text", "content": "# hi", "output": "", "error": null},
            {"id": "cell-1", "type": "code", "content": "print(1);", "output": "", "error": null}
        ]}"##,
    )
    .await
    .unwrap();

    let mut nb = notebook();
    nb.load_from(&path).await.unwrap();
    let id = nb.resolve_cell("cell-1").unwrap();
    assert_eq!(id, CellId::from("cell-1"));
    assert_eq!(nb.run_cell(&id).unwrap(), ExecOutcome::Output("1\n".into()));
    nb.save_to(&path).await.unwrap();

    let saved: serde_json::Value =
        serde_json::from_slice(&tokio::fs::read(&path).await.unwrap()).unwrap();
    assert_eq!(saved["cells"][0]["id"], "intro");
    assert_eq!(saved["cells"][1]["id"], "cell-1");
    assert_eq!(saved["cells"][1]["output"], "1\n");
}
