//! Folder and note files inside customer sandboxes.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use futures::future::BoxFuture;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use casefile_core::{AppError, AppResult, ErrorKind};
use casefile_entity::customer::Customer;
use casefile_entity::folder::{FolderPath, is_root_sentinel, normalize_rel_path};
use casefile_entity::note::{DeltaDocument, NoteKind, NoteSummary, friendly_title};
use casefile_storage::naming::{file_name_of, path_exists, sanitize_segment, unique_path, unique_path_except};
use casefile_storage::{CustomerDirectoryRegistry, PathSandbox};

use super::delta::{clean_delta, clean_delta_json, to_json};

/// Creates, edits, moves and deletes folders and notes.
///
/// Folders and notes live only on disk; their identity is the
/// sandbox-relative path.
#[derive(Debug, Clone)]
pub struct NoteStore {
    registry: CustomerDirectoryRegistry,
}

impl NoteStore {
    /// Creates a new note store.
    pub fn new(registry: CustomerDirectoryRegistry) -> Self {
        Self { registry }
    }

    /// Name of the reserved default folder.
    pub fn default_folder(&self) -> &str {
        self.registry.paths().default_folder()
    }

    /// Whether `path` is the reserved default folder.
    pub fn is_default_folder(&self, path: &FolderPath) -> bool {
        path.as_str().eq_ignore_ascii_case(self.default_folder())
    }

    /// Create a folder under `parent` (the customer root when absent or
    /// when it would escape). Idempotent.
    pub async fn create_folder(
        &self,
        customer: &Customer,
        name: &str,
        parent: Option<&str>,
    ) -> AppResult<FolderPath> {
        let sandbox = self.customer_sandbox(customer).await?;
        let parent = safe_parent(&sandbox, parent).await?;
        let folder = parent.join(&sanitize_segment(name));

        let abs = sandbox.resolve(folder.as_str()).await?;
        fs::create_dir_all(&abs).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create folder '{folder}'"),
                e,
            )
        })?;

        info!(customer_id = customer.id, folder = %folder, "Folder created");
        Ok(folder)
    }

    /// Create an empty Delta note named after the local time and `title`.
    ///
    /// Returns the note's relative path. A note with the same name created
    /// within the same second is left untouched.
    pub async fn create_note(
        &self,
        customer: &Customer,
        title: Option<&str>,
        parent: Option<&str>,
    ) -> AppResult<String> {
        let sandbox = self.customer_sandbox(customer).await?;
        let parent = safe_parent(&sandbox, parent).await?;

        let title = match title.map(str::trim) {
            Some(title) if !title.is_empty() => sanitize_segment(title),
            _ => NoteKind::Delta.fallback_title().to_string(),
        };
        let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let file_name = format!("{stamp}_{title}{}", NoteKind::Delta.suffix());
        let rel_path = parent.file(&file_name);
        let abs = sandbox.resolve(&rel_path).await?;

        let created = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&abs)
            .await;
        match created {
            Ok(mut file) => {
                let body = to_json(&DeltaDocument::empty());
                file.write_all(body.as_bytes()).await?;
                file.flush().await?;
                info!(customer_id = customer.id, note = %rel_path, "Note created");
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                debug!(customer_id = customer.id, note = %rel_path, "Note already exists");
            }
            Err(e) => return Err(e.into()),
        }
        Ok(rel_path)
    }

    /// Rename a note within its folder, keeping its suffix.
    pub async fn rename_note(
        &self,
        customer_id: i32,
        rel_path: &str,
        new_name: &str,
    ) -> AppResult<String> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(AppError::invalid_operation("New name must not be empty"));
        }
        let (rel_path, kind) = note_path(rel_path)?;
        let sandbox = self.registry.sandbox_for(customer_id).await?;
        let abs = existing_file(&sandbox, &rel_path).await?;

        let base = strip_suffix(new_name, kind.suffix());
        let target_name = format!("{}{}", sanitize_segment(base), kind.suffix());
        let dir = parent_dir(&abs)?;
        let dest = unique_path_except(dir, &target_name, &abs).await?;
        if dest == abs {
            return Ok(rel_path);
        }

        rename(&abs, &dest).await?;
        let new_rel = sandbox.relativize(&dest).await?;
        info!(customer_id, from = %rel_path, to = %new_rel, "Note renamed");
        Ok(new_rel)
    }

    /// Rename a folder within its parent.
    ///
    /// The customer root and the default folder cannot be renamed.
    pub async fn rename_folder(
        &self,
        customer_id: i32,
        rel_path: &str,
        new_name: &str,
    ) -> AppResult<FolderPath> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(AppError::invalid_operation("New name must not be empty"));
        }
        let folder = FolderPath::from_folder_id(rel_path)?;
        if folder.is_root() || self.is_default_folder(&folder) {
            return Err(AppError::invalid_operation(format!(
                "Folder '{folder}' cannot be renamed"
            )));
        }

        let sandbox = self.registry.sandbox_for(customer_id).await?;
        let abs = sandbox.resolve(folder.as_str()).await?;
        if !fs::metadata(&abs).await.map(|m| m.is_dir()).unwrap_or(false) {
            return Err(AppError::not_found(format!("Folder '{folder}' not found")));
        }

        let dir = parent_dir(&abs)?;
        let dest = unique_path_except(dir, &sanitize_segment(new_name), &abs).await?;
        let parent = folder.parent().unwrap_or_default();
        let renamed = parent.join(&file_name_of(&dest)?);
        if dest == abs {
            return Ok(renamed);
        }

        rename(&abs, &dest).await?;
        info!(customer_id, from = %folder, to = %renamed, "Folder renamed");
        Ok(renamed)
    }

    /// Move a note into another folder, creating the folder if needed.
    ///
    /// Moving into the folder the note already lives in returns its path
    /// unchanged without touching the filesystem.
    pub async fn move_note(
        &self,
        customer_id: i32,
        source: &str,
        target_folder: &str,
    ) -> AppResult<String> {
        let (source, _) = note_path(source)?;
        let target = FolderPath::from_folder_id(target_folder)?;
        let current = FolderPath::parse(&source)?.parent().unwrap_or_default();
        if current == target {
            return Ok(source);
        }

        let sandbox = self.registry.sandbox_for(customer_id).await?;
        let abs = existing_file(&sandbox, &source).await?;
        let target_abs = sandbox.resolve_or_root(target.as_str()).await?;
        fs::create_dir_all(&target_abs).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create folder '{target}'"),
                e,
            )
        })?;

        let dest = unique_path(&target_abs, &file_name_of(&abs)?).await?;
        // Re-check the chosen name against the sandbox before moving.
        let dest_rel = target.file(&file_name_of(&dest)?);
        let dest = sandbox.resolve(&dest_rel).await?;

        rename(&abs, &dest).await?;
        info!(customer_id, from = %source, to = %dest_rel, "Note moved");
        Ok(dest_rel)
    }

    /// Delete a note file.
    pub async fn delete_note(&self, customer_id: i32, rel_path: &str) -> AppResult<()> {
        let (rel_path, _) = note_path(rel_path)?;
        let sandbox = self.registry.sandbox_for(customer_id).await?;
        let abs = existing_file(&sandbox, &rel_path).await?;
        fs::remove_file(&abs).await?;
        info!(customer_id, note = %rel_path, "Note deleted");
        Ok(())
    }

    /// Delete a folder and everything beneath it.
    ///
    /// The customer root (`""` or `"root"`) and the default folder are
    /// never deleted; for them this returns `Ok(false)`. A folder that does
    /// not exist also yields `Ok(false)`.
    pub async fn delete_folder_recursive(&self, customer_id: i32, rel_path: &str) -> AppResult<bool> {
        if is_root_sentinel(rel_path) {
            return Ok(false);
        }
        let folder = FolderPath::parse(rel_path)?;
        if folder.is_root() || self.is_default_folder(&folder) {
            return Ok(false);
        }

        let sandbox = self.registry.sandbox_for(customer_id).await?;
        let abs = sandbox.resolve(folder.as_str()).await?;
        match fs::symlink_metadata(&abs).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(AppError::invalid_operation(format!(
                    "'{folder}' is not a folder"
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        }

        fs::remove_dir_all(&abs).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to delete folder '{folder}'"),
                e,
            )
        })?;
        info!(customer_id, folder = %folder, "Folder deleted");
        Ok(true)
    }

    /// Read and clean a `.note.json` note.
    pub async fn read_delta(&self, customer_id: i32, rel_path: &str) -> AppResult<DeltaDocument> {
        let abs = self.note_file(customer_id, rel_path, NoteKind::Delta).await?;
        let raw = read_text(&abs, rel_path).await?;
        Ok(clean_delta_json(&raw))
    }

    /// Clean and write a `.note.json` note. Returns what was written.
    pub async fn write_delta(
        &self,
        customer_id: i32,
        rel_path: &str,
        document: &DeltaDocument,
    ) -> AppResult<DeltaDocument> {
        let abs = self.note_target(customer_id, rel_path, NoteKind::Delta).await?;
        let cleaned = clean_delta(document);
        write_text(&abs, &to_json(&cleaned)).await?;
        debug!(customer_id, note = rel_path, ops = cleaned.ops.len(), "Delta note saved");
        Ok(cleaned)
    }

    /// Read a legacy `.md` note.
    pub async fn read_markdown(&self, customer_id: i32, rel_path: &str) -> AppResult<String> {
        let abs = self.note_file(customer_id, rel_path, NoteKind::Markdown).await?;
        read_text(&abs, rel_path).await
    }

    /// Write a legacy `.md` note.
    pub async fn write_markdown(&self, customer_id: i32, rel_path: &str, text: &str) -> AppResult<()> {
        let abs = self.note_target(customer_id, rel_path, NoteKind::Markdown).await?;
        write_text(&abs, text).await?;
        debug!(customer_id, note = rel_path, "Markdown note saved");
        Ok(())
    }

    /// Load any note as a Delta document.
    pub async fn load(&self, customer_id: i32, rel_path: &str) -> AppResult<DeltaDocument> {
        let (_, kind) = note_path(rel_path)?;
        match kind {
            NoteKind::Delta => self.read_delta(customer_id, rel_path).await,
            NoteKind::Markdown => {
                let text = self.read_markdown(customer_id, rel_path).await?;
                Ok(DeltaDocument::from_plain_text(&text))
            }
        }
    }

    /// Save a Delta document into any note. Markdown notes receive the
    /// plain text.
    pub async fn save(
        &self,
        customer_id: i32,
        rel_path: &str,
        document: &DeltaDocument,
    ) -> AppResult<DeltaDocument> {
        let (_, kind) = note_path(rel_path)?;
        match kind {
            NoteKind::Delta => self.write_delta(customer_id, rel_path, document).await,
            NoteKind::Markdown => {
                let cleaned = clean_delta(document);
                self.write_markdown(customer_id, rel_path, &cleaned.plain_text())
                    .await?;
                Ok(cleaned)
            }
        }
    }

    /// Every note of the customer, most recently modified first.
    ///
    /// A customer without a directory has no notes.
    pub async fn list_notes(&self, customer_id: i32) -> AppResult<Vec<NoteSummary>> {
        let Some(dir) = self.registry.find_by_id(customer_id).await? else {
            return Ok(Vec::new());
        };
        let sandbox = PathSandbox::new(&dir).await?;

        let mut notes = Vec::new();
        collect_notes(&sandbox, sandbox.root().to_path_buf(), &mut notes).await?;
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(notes)
    }

    async fn customer_sandbox(&self, customer: &Customer) -> AppResult<PathSandbox> {
        let dir = self.registry.get_or_create(customer.id, &customer.name).await?;
        dir.sandbox().await
    }

    async fn note_file(&self, customer_id: i32, rel_path: &str, kind: NoteKind) -> AppResult<PathBuf> {
        let abs = self.note_target(customer_id, rel_path, kind).await?;
        if !fs::metadata(&abs).await.map(|m| m.is_file()).unwrap_or(false) {
            return Err(AppError::not_found(format!("Note '{rel_path}' not found")));
        }
        Ok(abs)
    }

    async fn note_target(&self, customer_id: i32, rel_path: &str, kind: NoteKind) -> AppResult<PathBuf> {
        let (rel_path, actual) = note_path(rel_path)?;
        if actual != kind {
            return Err(AppError::invalid_operation(format!(
                "Only {} notes are supported here",
                kind.suffix()
            )));
        }
        let sandbox = self.registry.sandbox_for(customer_id).await?;
        sandbox.resolve(&rel_path).await
    }
}

/// Normalize a note path and detect its kind.
fn note_path(raw: &str) -> AppResult<(String, NoteKind)> {
    let rel_path = normalize_rel_path(raw);
    let file_name = rel_path.rsplit('/').next().unwrap_or_default();
    let kind = NoteKind::from_file_name(file_name)
        .ok_or_else(|| AppError::invalid_operation(format!("'{raw}' is not a note")))?;
    Ok((rel_path, kind))
}

fn strip_suffix<'a>(name: &'a str, suffix: &str) -> &'a str {
    let cut = name.len().saturating_sub(suffix.len());
    match name.get(cut..) {
        Some(tail) if cut > 0 && tail.eq_ignore_ascii_case(suffix) => &name[..cut],
        _ => name,
    }
}

/// Resolve the parent folder for a create operation. Missing or escaping
/// parents fall back to the customer root; an existing parent is created.
async fn safe_parent(sandbox: &PathSandbox, parent: Option<&str>) -> AppResult<FolderPath> {
    let Some(raw) = parent else {
        return Ok(FolderPath::root());
    };
    let Ok(folder) = FolderPath::from_folder_id(raw) else {
        debug!(parent = raw, "Parent escapes the sandbox; using the customer root");
        return Ok(FolderPath::root());
    };
    if folder.is_root() {
        return Ok(folder);
    }

    let abs = match sandbox.resolve(folder.as_str()).await {
        Ok(abs) => abs,
        Err(e) if e.kind == ErrorKind::OutOfBounds => {
            debug!(parent = raw, "Parent escapes the sandbox; using the customer root");
            return Ok(FolderPath::root());
        }
        Err(e) => return Err(e),
    };
    fs::create_dir_all(&abs).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to create folder '{folder}'"),
            e,
        )
    })?;
    Ok(folder)
}

async fn existing_file(sandbox: &PathSandbox, rel_path: &str) -> AppResult<PathBuf> {
    let abs = sandbox.resolve(rel_path).await?;
    if !fs::metadata(&abs).await.map(|m| m.is_file()).unwrap_or(false) {
        return Err(AppError::not_found(format!("Note '{rel_path}' not found")));
    }
    Ok(abs)
}

fn parent_dir(abs: &Path) -> AppResult<&Path> {
    abs.parent()
        .ok_or_else(|| AppError::internal(format!("{} has no parent", abs.display())))
}

async fn rename(from: &Path, to: &Path) -> AppResult<()> {
    if path_exists(to).await? {
        return Err(AppError::io_conflict(format!("{} already exists", to.display())));
    }
    fs::rename(from, to).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to move {} -> {}", from.display(), to.display()),
            e,
        )
    })
}

async fn read_text(abs: &Path, rel_path: &str) -> AppResult<String> {
    fs::read_to_string(abs).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::not_found(format!("Note '{rel_path}' not found"))
        } else {
            AppError::with_source(ErrorKind::Storage, format!("Failed to read '{rel_path}'"), e)
        }
    })
}

async fn write_text(abs: &Path, text: &str) -> AppResult<()> {
    if let Some(parent) = abs.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(abs, text).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to write {}", abs.display()),
            e,
        )
    })
}

fn collect_notes<'a>(
    sandbox: &'a PathSandbox,
    dir: PathBuf,
    notes: &'a mut Vec<NoteSummary>,
) -> BoxFuture<'a, AppResult<()>> {
    Box::pin(async move {
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            let path = entry.path();
            if file_type.is_dir() {
                collect_notes(sandbox, path, notes).await?;
                continue;
            }
            if !file_type.is_file() {
                continue;
            }

            let file_name = entry.file_name().to_string_lossy().into_owned();
            let Some(kind) = NoteKind::from_file_name(&file_name) else {
                continue;
            };
            let rel_path = match sandbox.relativize(&path).await {
                Ok(rel) => rel,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Skipping note outside sandbox");
                    continue;
                }
            };
            let updated_at = entry
                .metadata()
                .await
                .and_then(|m| m.modified())
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            notes.push(NoteSummary {
                title: friendly_title(&file_name),
                rel_path,
                kind,
                updated_at,
            });
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use casefile_core::config::storage::StorageConfig;
    use casefile_entity::note::DeltaOp;
    use casefile_storage::AppPaths;

    async fn store() -> (tempfile::TempDir, NoteStore, Customer) {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            project_root: dir.path().to_string_lossy().into_owned(),
            ..StorageConfig::default()
        };
        let paths = AppPaths::prepare(&config).await.unwrap();
        let store = NoteStore::new(CustomerDirectoryRegistry::new(paths));
        let customer = Customer {
            id: 7,
            name: "Acme GmbH".into(),
            created_at: Utc::now(),
        };
        (dir, store, customer)
    }

    async fn root_of(store: &NoteStore, customer: &Customer) -> PathBuf {
        store.registry.resolve_by_id(customer.id).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_folder_is_idempotent() {
        let (_dir, store, customer) = store().await;
        let first = store.create_folder(&customer, "Verträge", None).await.unwrap();
        let second = store.create_folder(&customer, "Verträge", None).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.as_str(), "Verträge");

        let root = root_of(&store, &customer).await;
        let mut entries = std::fs::read_dir(&root)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        entries.sort();
        assert_eq!(entries, vec!["Dokumente", "Verträge"]);
    }

    #[tokio::test]
    async fn test_create_folder_escaping_parent_falls_back_to_root() {
        let (_dir, store, customer) = store().await;
        let folder = store
            .create_folder(&customer, "Inbox", Some("../../etc"))
            .await
            .unwrap();
        assert_eq!(folder.as_str(), "Inbox");

        let nested = store
            .create_folder(&customer, "2024", Some("Archiv"))
            .await
            .unwrap();
        assert_eq!(nested.as_str(), "Archiv/2024");
    }

    #[tokio::test]
    async fn test_create_note_writes_empty_delta() {
        let (_dir, store, customer) = store().await;
        let rel = store
            .create_note(&customer, Some("Call / notes"), None)
            .await
            .unwrap();
        assert!(rel.ends_with("_Call _ notes.note.json"));

        let doc = store.read_delta(customer.id, &rel).await.unwrap();
        assert_eq!(doc, DeltaDocument::empty());

        let untitled = store.create_note(&customer, None, Some("Dokumente")).await.unwrap();
        assert!(untitled.starts_with("Dokumente/"));
        assert!(untitled.ends_with("_notes.note.json"));
    }

    #[tokio::test]
    async fn test_delta_write_then_read_keeps_text() {
        let (_dir, store, customer) = store().await;
        let rel = store.create_note(&customer, Some("a"), None).await.unwrap();

        let doc = DeltaDocument {
            ops: vec![DeltaOp::text("Hello "), DeltaOp::text("world")],
        };
        let written = store.write_delta(customer.id, &rel, &doc).await.unwrap();
        assert!(written.ends_with_newline());

        let read = store.read_delta(customer.id, &rel).await.unwrap();
        assert_eq!(read.plain_text(), "Hello world\n");
    }

    #[tokio::test]
    async fn test_markdown_load_and_save() {
        let (_dir, store, customer) = store().await;
        root_of_created(&store, &customer).await;
        store
            .write_markdown(customer.id, "legacy.md", "line one")
            .await
            .unwrap();

        let loaded = store.load(customer.id, "legacy.md").await.unwrap();
        assert_eq!(loaded.plain_text(), "line one\n");

        let doc = DeltaDocument::from_plain_text("replaced");
        store.save(customer.id, "legacy.md", &doc).await.unwrap();
        assert_eq!(
            store.read_markdown(customer.id, "legacy.md").await.unwrap(),
            "replaced\n"
        );
    }

    async fn root_of_created(store: &NoteStore, customer: &Customer) {
        store.registry.get_or_create(customer.id, &customer.name).await.unwrap();
    }

    #[tokio::test]
    async fn test_kind_mismatch_is_invalid_operation() {
        let (_dir, store, customer) = store().await;
        root_of_created(&store, &customer).await;
        let err = store.read_delta(customer.id, "legacy.md").await.unwrap_err();
        assert!(err.is_invalid_operation());
        let err = store.load(customer.id, "scan.pdf").await.unwrap_err();
        assert!(err.is_invalid_operation());
    }

    #[tokio::test]
    async fn test_parent_segments_are_rejected() {
        let (_dir, store, customer) = store().await;
        root_of_created(&store, &customer).await;
        let err = store
            .write_markdown(customer.id, "../escape.md", "x")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::OutOfBounds);
        let err = store.delete_folder_recursive(customer.id, "a/../..").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::OutOfBounds);
    }

    #[tokio::test]
    async fn test_move_note_to_same_folder_is_noop() {
        let (_dir, store, customer) = store().await;
        let rel = store.create_note(&customer, Some("x"), Some("A")).await.unwrap();
        let moved = store.move_note(customer.id, &rel, "A").await.unwrap();
        assert_eq!(moved, rel);
    }

    #[tokio::test]
    async fn test_move_note_suffixes_collisions() {
        let (_dir, store, customer) = store().await;
        root_of_created(&store, &customer).await;
        store.write_markdown(customer.id, "a.md", "1").await.unwrap();
        store.write_markdown(customer.id, "B/a.md", "2").await.unwrap();

        let moved = store.move_note(customer.id, "a.md", "B").await.unwrap();
        assert_eq!(moved, "B/a_2.md");
        assert_eq!(store.read_markdown(customer.id, "B/a_2.md").await.unwrap(), "1");

        let created = store.move_note(customer.id, "B/a.md", "C/D").await.unwrap();
        assert_eq!(created, "C/D/a.md");

        let back = store.move_note(customer.id, "C/D/a.md", "root").await.unwrap();
        assert_eq!(back, "a.md");
    }

    #[tokio::test]
    async fn test_move_and_delete_reject_non_notes() {
        let (_dir, store, customer) = store().await;
        root_of_created(&store, &customer).await;
        let err = store.move_note(customer.id, "scan.pdf", "B").await.unwrap_err();
        assert!(err.is_invalid_operation());
        let err = store.delete_note(customer.id, "scan.pdf").await.unwrap_err();
        assert!(err.is_invalid_operation());
        let err = store.delete_note(customer.id, "gone.md").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_rename_note_keeps_suffix_and_avoids_collisions() {
        let (_dir, store, customer) = store().await;
        root_of_created(&store, &customer).await;
        let doc = DeltaDocument::from_plain_text("x");
        store.write_delta(customer.id, "one.note.json", &doc).await.unwrap();
        store.write_delta(customer.id, "two.note.json", &doc).await.unwrap();

        let renamed = store
            .rename_note(customer.id, "one.note.json", "two")
            .await
            .unwrap();
        assert_eq!(renamed, "two_2.note.json");

        let same = store
            .rename_note(customer.id, "two_2.note.json", "two_2.note.json")
            .await
            .unwrap();
        assert_eq!(same, "two_2.note.json");

        let err = store
            .rename_note(customer.id, "two.note.json", "  ")
            .await
            .unwrap_err();
        assert!(err.is_invalid_operation());
    }

    #[tokio::test]
    async fn test_rename_folder_guards_reserved_folders() {
        let (_dir, store, customer) = store().await;
        store.create_folder(&customer, "Alt", None).await.unwrap();
        store.create_folder(&customer, "Neu", None).await.unwrap();

        let renamed = store.rename_folder(customer.id, "Alt", "Neu").await.unwrap();
        assert_eq!(renamed.as_str(), "Neu_2");

        for reserved in ["", "root", "Dokumente"] {
            let err = store
                .rename_folder(customer.id, reserved, "X")
                .await
                .unwrap_err();
            assert!(err.is_invalid_operation());
        }
        let err = store.rename_folder(customer.id, "Missing", "X").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_delete_folder_guard_and_recursion() {
        let (_dir, store, customer) = store().await;
        store.create_folder(&customer, "B", Some("A")).await.unwrap();
        store.write_markdown(customer.id, "A/B/n.md", "x").await.unwrap();

        for guarded in ["", "root", "ROOT", "Dokumente", "/"] {
            assert!(!store.delete_folder_recursive(customer.id, guarded).await.unwrap());
        }
        let root = root_of(&store, &customer).await;
        assert!(root.join("Dokumente").is_dir());

        assert!(store.delete_folder_recursive(customer.id, "A").await.unwrap());
        assert!(!root.join("A").exists());
        assert!(!store.delete_folder_recursive(customer.id, "A").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_notes_newest_first_with_titles() {
        let (_dir, store, customer) = store().await;
        root_of_created(&store, &customer).await;
        store
            .write_markdown(customer.id, "2024-01-02_10-00-00_old_call.md", "x")
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let doc = DeltaDocument::from_plain_text("y");
        store
            .write_delta(customer.id, "Sub/2024-01-03_10-00-00_.note.json", &doc)
            .await
            .unwrap();
        let root = root_of(&store, &customer).await;
        std::fs::write(root.join("Sub").join("scan.pdf"), b"%PDF").unwrap();

        let notes = store.list_notes(customer.id).await.unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].rel_path, "Sub/2024-01-03_10-00-00_.note.json");
        assert_eq!(notes[0].kind, NoteKind::Delta);
        assert_eq!(notes[1].title, "old call");

        assert!(store.list_notes(999).await.unwrap().is_empty());
    }
}
