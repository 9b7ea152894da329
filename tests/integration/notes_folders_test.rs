//! Integration tests for notes, folders and the folder cascade.

mod helpers;

use casefile_core::ErrorKind;
use casefile_entity::note::{DeltaDocument, DeltaOp};

#[tokio::test]
async fn test_delta_note_round_trip_keeps_text() {
    let app = helpers::TestApp::new().await;
    let customer = app.create_customer("Acme").await;
    let path = app.notes.create_note(&customer, Some("Call"), None).await.unwrap();

    let document = DeltaDocument {
        ops: vec![
            DeltaOp::text("Called "),
            DeltaOp::text("Mr. Meyer"),
            DeltaOp::text(" about the invoice"),
        ],
    };
    app.notes.save(customer.id, &path, &document).await.unwrap();

    let loaded = app.notes.load(customer.id, &path).await.unwrap();
    assert_eq!(loaded.plain_text(), "Called Mr. Meyer about the invoice\n");
    assert!(loaded.ends_with_newline());

    let dir = app.registry.resolve_by_id(customer.id).await.unwrap();
    let raw = std::fs::read_to_string(dir.join(&path)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let last = value["ops"].as_array().unwrap().last().unwrap().clone();
    assert!(last["insert"].as_str().unwrap().ends_with('\n'));
}

#[tokio::test]
async fn test_markdown_note_saves_plain_text() {
    let app = helpers::TestApp::new().await;
    let customer = app.create_customer("Acme").await;
    let dir = app.registry.resolve_by_id(customer.id).await.unwrap();
    std::fs::write(dir.join("legacy.md"), "old text").unwrap();

    let loaded = app.notes.load(customer.id, "legacy.md").await.unwrap();
    assert_eq!(loaded.plain_text(), "old text\n");

    app.notes
        .save(customer.id, "legacy.md", &DeltaDocument::from_plain_text("new text"))
        .await
        .unwrap();
    assert_eq!(std::fs::read_to_string(dir.join("legacy.md")).unwrap(), "new text\n");
}

#[tokio::test]
async fn test_create_folder_is_idempotent() {
    let app = helpers::TestApp::new().await;
    let customer = app.create_customer("Acme").await;

    let first = app.notes.create_folder(&customer, "Akten", None).await.unwrap();
    let second = app.notes.create_folder(&customer, "Akten", None).await.unwrap();
    assert_eq!(first, second);

    let dir = app.registry.resolve_by_id(customer.id).await.unwrap();
    let count = std::fs::read_dir(&dir)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name() == "Akten")
        .count();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_parent_segments_are_rejected_without_side_effects() {
    let app = helpers::TestApp::new().await;
    let customer = app.create_customer("Acme").await;
    let outside = app.paths.clients_root().join("victim.md");
    std::fs::write(&outside, "keep").unwrap();

    let attempts = [
        app.notes.delete_note(customer.id, "../victim.md").await.map(|_| ()),
        app.notes
            .rename_note(customer.id, "../victim.md", "x")
            .await
            .map(|_| ()),
        app.notes
            .write_markdown(customer.id, "a/../../victim.md", "pwned")
            .await,
        app.folders.delete(customer.id, "..").await.map(|_| ()),
    ];
    for attempt in attempts {
        assert_eq!(attempt.unwrap_err().kind, ErrorKind::OutOfBounds);
    }
    assert_eq!(std::fs::read_to_string(&outside).unwrap(), "keep");
    assert!(app.registry.resolve_by_id(customer.id).await.unwrap().is_dir());
}

#[tokio::test]
async fn test_deleting_root_is_noop() {
    let app = helpers::TestApp::new().await;
    let customer = app.create_customer("Acme").await;
    let note = app.notes.create_note(&customer, Some("Keep"), None).await.unwrap();

    for root in ["", "root", "  "] {
        let deletion = app.folders.delete(customer.id, root).await.unwrap();
        assert!(!deletion.removed_directory);
        assert_eq!(deletion.removed_documents, 0);
        assert!(!app.notes.delete_folder_recursive(customer.id, root).await.unwrap());
    }
    assert!(app.notes.load(customer.id, &note).await.is_ok());
}

#[tokio::test]
async fn test_move_note_to_own_folder_is_noop() {
    let app = helpers::TestApp::new().await;
    let customer = app.create_customer("Acme").await;
    app.notes.create_folder(&customer, "Akten", None).await.unwrap();
    let note = app
        .notes
        .create_note(&customer, Some("Memo"), Some("Akten"))
        .await
        .unwrap();

    let dir = app.registry.resolve_by_id(customer.id).await.unwrap();
    let before = std::fs::metadata(dir.join(&note)).unwrap().modified().unwrap();
    let content = std::fs::read(dir.join(&note)).unwrap();

    let moved = app.notes.move_note(customer.id, &note, "Akten").await.unwrap();
    assert_eq!(moved, note);
    let after = std::fs::metadata(dir.join(&note)).unwrap().modified().unwrap();
    assert_eq!(before, after);
    assert_eq!(std::fs::read(dir.join(&note)).unwrap(), content);
    assert_eq!(std::fs::read_dir(dir.join("Akten")).unwrap().count(), 1);

    let moved = app.notes.move_note(customer.id, &note, "root").await.unwrap();
    assert!(!moved.contains('/'));
    assert!(dir.join(&moved).is_file());
    assert!(!dir.join(&note).exists());
}

#[tokio::test]
async fn test_folder_rename_keeps_documents_reachable() {
    let mut app = helpers::TestApp::new().await;
    let customer = app.create_customer("Acme").await;
    app.notes.create_folder(&customer, "Akten", None).await.unwrap();
    let doc = app.upload_pdfs(&customer, Some("Akten"), &["scan.pdf"]).await.remove(0);
    app.drain().await;

    let renamed = app.folders.rename(customer.id, "Akten", "Archiv").await.unwrap();
    assert_eq!(renamed.to.as_str(), "Archiv");
    assert_eq!(renamed.updated_documents, 1);

    let doc = app.documents.get(doc.id).await.unwrap();
    assert_eq!(doc.folder_id, "Archiv");
    assert!(app.absolute(&doc.stored_path).is_file());
    assert!(app.documents.open(doc.id).await.is_ok());
}

#[tokio::test]
async fn test_folder_delete_cascades_to_records() {
    let app = helpers::TestApp::new().await;
    let customer = app.create_customer("Acme").await;
    app.notes.create_folder(&customer, "Sub", Some("Akten")).await.unwrap();
    app.upload_pdfs(&customer, Some("Akten/Sub"), &["a.pdf"]).await;
    let kept = app.upload_pdfs(&customer, Some("Aktenzeichen"), &["b.pdf"]).await.remove(0);

    let deletion = app.folders.delete(customer.id, "Akten").await.unwrap();
    assert!(deletion.removed_directory);
    assert_eq!(deletion.removed_documents, 1);

    let remaining = app.documents.list(customer.id).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, kept.id);
}

#[tokio::test]
async fn test_default_folder_cannot_be_renamed() {
    let app = helpers::TestApp::new().await;
    let customer = app.create_customer("Acme").await;
    let err = app
        .folders
        .rename(customer.id, "Dokumente", "Other")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidOperation);
}
