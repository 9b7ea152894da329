//! Integration tests for customer directories and the merged tree.

mod helpers;

use casefile_core::ErrorKind;
use casefile_entity::document::DocumentStatus;
use casefile_entity::folder::FolderPath;
use casefile_entity::tree::TreeNode;
use casefile_storage::DirectoryOutcome;

#[tokio::test]
async fn test_resolved_directory_carries_id_prefix() {
    let app = helpers::TestApp::new().await;
    let created = app.registry.get_or_create(42, "Müller/Schmidt").await.unwrap();
    assert_eq!(created.outcome, DirectoryOutcome::Created);

    let resolved = app.registry.resolve_by_id(42).await.unwrap();
    let name = resolved.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("42_"));
    assert!(!name.contains('/'));
    assert_eq!(resolved, created.path);
}

#[tokio::test]
async fn test_customer_rename_keeps_content() {
    let mut app = helpers::TestApp::new().await;
    let customer = app.create_customer("Acme").await;
    let note = app.notes.create_note(&customer, Some("Memo"), None).await.unwrap();
    let doc = app.upload_pdfs(&customer, None, &["scan.pdf"]).await.remove(0);
    assert!(app.documents.open(doc.id).await.is_ok());

    let (renamed, outcome) = app.customers.rename(customer.id, "Acme GmbH").await.unwrap();
    assert!(matches!(outcome, DirectoryOutcome::Renamed { .. }));

    let dir = app.registry.resolve_by_id(renamed.id).await.unwrap();
    assert!(dir.ends_with(format!("{}_Acme GmbH", customer.id)));
    assert!(app.notes.load(customer.id, &note).await.is_ok());

    let opened = app.documents.open(doc.id).await.unwrap();
    assert_eq!(
        opened.document.stored_path,
        format!("Data/Clients/{}_Acme GmbH/Dokumente/scan.pdf", customer.id)
    );
    assert_eq!(app.drain().await, 1);
    let stored = app.documents.get(doc.id).await.unwrap();
    assert_eq!(stored.status, DocumentStatus::Stored);
    assert!(stored.error_message.is_none());
}

#[tokio::test]
async fn test_conflicting_rename_reads_back_from_kept_directory() {
    let app = helpers::TestApp::new().await;
    let customer = app.create_customer("Zeta").await;
    let original = app.registry.resolve_by_id(customer.id).await.unwrap();
    let doc = app.upload_pdfs(&customer, None, &["scan.pdf"]).await.remove(0);

    let squatter = original.with_file_name(format!("{}_Alpha", customer.id));
    std::fs::create_dir(&squatter).unwrap();
    std::fs::write(squatter.join("foreign.md"), "x").unwrap();

    let (renamed, outcome) = app.customers.rename(customer.id, "Alpha").await.unwrap();
    assert_eq!(outcome, DirectoryOutcome::Conflict { conflicting: squatter.clone() });
    assert_eq!(app.registry.resolve_by_id(customer.id).await.unwrap(), original);

    let note = app.notes.create_note(&renamed, Some("After"), None).await.unwrap();
    assert!(original.join(&note).is_file());
    assert!(app.notes.load(customer.id, &note).await.is_ok());
    assert!(app.documents.open(doc.id).await.is_ok());

    let titles: Vec<String> = app
        .notes
        .list_notes(customer.id)
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.title)
        .collect();
    assert_eq!(titles, vec!["After".to_string()]);
}

#[tokio::test]
async fn test_customer_delete_requires_empty_customer() {
    let app = helpers::TestApp::new().await;
    let customer = app.create_customer("Acme").await;
    let doc = app.upload_pdfs(&customer, None, &["scan.pdf"]).await.remove(0);

    let err = app.customers.delete(customer.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidOperation);

    app.documents.delete(doc.id).await.unwrap();
    app.customers.delete(customer.id).await.unwrap();
    assert!(app.registry.find_by_id(customer.id).await.unwrap().is_none());
    assert_eq!(
        app.customers.get(customer.id).await.unwrap_err().kind,
        ErrorKind::NotFound
    );
}

#[tokio::test]
async fn test_tree_merges_disk_and_records() {
    let app = helpers::TestApp::new().await;
    let customer = app.create_customer("Acme").await;
    app.notes.create_folder(&customer, "Akten", None).await.unwrap();
    app.notes.create_note(&customer, Some("Memo"), Some("Akten")).await.unwrap();
    app.upload_pdfs(&customer, Some("Akten"), &["b.pdf", "a.pdf"]).await;
    app.upload_pdfs(&customer, None, &["inbox.pdf"]).await;

    let tree = app.tree.build_for(customer.id).await.unwrap();
    let akten = tree.find_folder(&FolderPath::parse("Akten").unwrap()).unwrap();
    let labels: Vec<&str> = akten.children.iter().map(TreeNode::name).collect();
    assert_eq!(labels, vec!["Memo", "a.pdf", "b.pdf"]);

    let default = tree.find_folder(&FolderPath::parse("Dokumente").unwrap()).unwrap();
    assert_eq!(default.children.len(), 1);
    assert_eq!(tree.document_count(), 3);
}

#[tokio::test]
async fn test_tree_places_orphans_in_default_folder() {
    let app = helpers::TestApp::new().await;
    let customer = app.create_customer("Acme").await;
    let doc = app.upload_pdfs(&customer, Some("Temp"), &["x.pdf"]).await.remove(0);

    let dir = app.registry.resolve_by_id(customer.id).await.unwrap();
    std::fs::remove_dir_all(dir.join("Temp")).unwrap();

    let tree = app.tree.build(&customer).await.unwrap();
    assert!(tree.find_folder(&FolderPath::parse("Temp").unwrap()).is_none());
    let default = tree.find_folder(&FolderPath::parse("Dokumente").unwrap()).unwrap();
    match &default.children[..] {
        [TreeNode::Document(leaf)] => assert_eq!(leaf.id, doc.id),
        other => panic!("unexpected children: {other:?}"),
    }
}

#[tokio::test]
async fn test_sidebar_lists_customers_in_name_order() {
    let app = helpers::TestApp::new().await;
    app.create_customer("Zeta").await;
    app.create_customer("alpha").await;

    let trees = app.tree.sidebar().await.unwrap();
    let names: Vec<&str> = trees.iter().map(|t| t.customer_name.as_str()).collect();
    assert_eq!(names, vec!["Zeta", "alpha"]);
}
