//! Integration tests for the upload → pipeline → document lifecycle.

mod helpers;

use casefile_core::ErrorKind;
use casefile_core::config::upload::UploadLayout;
use casefile_entity::document::DocumentStatus;
use casefile_storage::{BytesUpload, UploadSource};
use casefile_worker::ProcessOutcome;

#[tokio::test]
async fn test_upload_lands_in_folder_created_with_punctuation() {
    let app = helpers::TestApp::new().await;
    let customer = app.create_customer("Acme").await;
    let folder = app
        .notes
        .create_folder(&customer, "Akte (2024) & Co", None)
        .await
        .unwrap();
    assert_eq!(folder.as_str(), "Akte (2024) & Co");

    let doc = app
        .upload_pdfs(&customer, Some(folder.as_str()), &["beleg.pdf"])
        .await
        .remove(0);
    assert_eq!(doc.folder_id, folder.as_str());

    let dir = app.registry.resolve_by_id(customer.id).await.unwrap();
    assert!(dir.join("Akte (2024) & Co").join("beleg.pdf").is_file());
    let mut folders: Vec<String> = std::fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    folders.sort();
    assert_eq!(folders, vec!["Akte (2024) & Co", "Dokumente"]);
}

#[tokio::test]
async fn test_same_name_uploads_get_numbered() {
    let mut app = helpers::TestApp::new().await;
    let customer = app.create_customer("Acme").await;

    let docs = app
        .upload_pdfs(&customer, Some("Akten"), &["scan.pdf", "scan.pdf", "scan.pdf"])
        .await;

    let names: Vec<String> = docs
        .iter()
        .map(|d| d.stored_path.rsplit('/').next().unwrap_or_default().to_string())
        .collect();
    assert_eq!(names, vec!["scan.pdf", "scan_2.pdf", "scan_3.pdf"]);
    for doc in &docs {
        assert_eq!(doc.folder_id, "Akten");
        assert_eq!(doc.original_file_name, "scan.pdf");
        assert!(app.absolute(&doc.stored_path).is_file());
    }

    assert_eq!(app.drain().await, 3);
}

#[tokio::test]
async fn test_pipeline_stores_once() {
    let mut app = helpers::TestApp::new().await;
    let customer = app.create_customer("Acme").await;
    let doc = app.upload_pdfs(&customer, None, &["bill.pdf"]).await.remove(0);
    assert_eq!(doc.status, DocumentStatus::Pending);
    assert_eq!(doc.folder_id, "Dokumente");

    app.drain().await;
    let stored = app.documents.get(doc.id).await.unwrap();
    assert_eq!(stored.status, DocumentStatus::Stored);
    assert!(stored.error_message.is_none());

    let again = app.worker.process(doc.id).await.unwrap();
    assert_eq!(again, ProcessOutcome::Skipped(DocumentStatus::Stored));
    assert_eq!(app.documents.get(doc.id).await.unwrap(), stored);
}

#[tokio::test]
async fn test_missing_bytes_fail_the_document() {
    let mut app = helpers::TestApp::new().await;
    let customer = app.create_customer("Acme").await;
    let doc = app.upload_pdfs(&customer, None, &["gone.pdf"]).await.remove(0);
    std::fs::remove_file(app.absolute(&doc.stored_path)).unwrap();

    app.drain().await;
    let failed = app.documents.get(doc.id).await.unwrap();
    assert_eq!(failed.status, DocumentStatus::Failed);
    assert!(failed.error_message.unwrap().contains("missing"));
}

#[tokio::test]
async fn test_rejected_file_does_not_abort_batch() {
    let app = helpers::TestApp::new().await;
    let customer = app.create_customer("Acme").await;

    let good = BytesUpload::new("ok.png", "image/png", "png");
    let bad = BytesUpload::new("run.exe", "application/octet-stream", "MZ");
    let empty = BytesUpload::new("empty.pdf", "application/pdf", "");
    let files: [&dyn UploadSource; 3] = [&good, &bad, &empty];

    let results = app.documents.upload(&customer, None, &files).await.unwrap();
    assert!(results[0].result.is_ok());
    assert_eq!(
        results[1].result.as_ref().unwrap_err().kind,
        ErrorKind::UnvalidatedUpload
    );
    assert!(results[2].result.is_err());
    assert_eq!(app.documents.list(customer.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_dated_layout_move_and_delete() {
    let app = helpers::TestApp::with_layout(UploadLayout::Dated).await;
    let customer = app.create_customer("Acme").await;
    let doc = app.upload_pdfs(&customer, Some("Akten"), &["Vertrag.PDF"]).await.remove(0);

    let expected_suffix = format!("/{}/original.pdf", doc.id);
    assert!(doc.stored_path.contains("/Akten/Documents/"));
    assert!(doc.stored_path.ends_with(&expected_suffix));

    let moved = app
        .documents
        .move_document(customer.id, doc.id, "Archiv/2024")
        .await
        .unwrap();
    assert_eq!(moved.folder_id, "Archiv/2024");
    assert!(moved.stored_path.ends_with("/Archiv/2024/Vertrag.PDF"));
    assert!(!app.absolute(&doc.stored_path).exists());
    assert!(app.absolute(&moved.stored_path).is_file());

    app.documents.delete(doc.id).await.unwrap();
    assert!(!app.absolute(&moved.stored_path).exists());
    let err = app.documents.get(doc.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_open_reports_download_metadata() {
    let app = helpers::TestApp::new().await;
    let customer = app.create_customer("Acme").await;
    let doc = app.upload_pdfs(&customer, None, &["scan.pdf"]).await.remove(0);
    app.documents.rename(doc.id, "Rechnung").await.unwrap();

    let opened = app.documents.open(doc.id).await.unwrap();
    assert_eq!(opened.download_name, "Rechnung.pdf");
    assert_eq!(opened.content_type, "application/pdf");
    assert_eq!(opened.file.len, "%PDF scan.pdf".len() as u64);
}
