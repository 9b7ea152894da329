//! Safe path segments and collision-free file names.

use std::path::{Path, PathBuf};

use tokio::fs;

use casefile_core::{AppError, AppResult, ErrorKind};
use casefile_entity::note::DELTA_SUFFIX;

/// Longest sanitized segment, in characters.
pub const MAX_SEGMENT_LEN: usize = 80;

/// Placeholder for names that sanitize to nothing.
pub const UNTITLED: &str = "untitled";

fn is_invalid_char(c: char) -> bool {
    matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*') || c.is_control()
}

/// Turn arbitrary user input into a single safe path segment.
///
/// Invalid characters become `_`, whitespace runs collapse to one space and
/// the result is truncated to [`MAX_SEGMENT_LEN`] characters. Letters and
/// digits of any script are kept.
pub fn sanitize_segment(input: &str) -> String {
    let replaced: String = input
        .trim()
        .chars()
        .map(|c| if is_invalid_char(c) { '_' } else { c })
        .collect();

    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    let truncated: String = collapsed.chars().take(MAX_SEGMENT_LEN).collect();
    let safe = truncated.trim_end();

    if safe.is_empty() || safe.chars().all(|c| c == '.') {
        UNTITLED.to_string()
    } else {
        safe.to_string()
    }
}

/// Split a file name into stem and extension (with leading dot).
///
/// `.note.json` counts as a single extension. A leading dot alone does not
/// start an extension.
pub fn split_file_name(file_name: &str) -> (&str, &str) {
    let cut = file_name.len().saturating_sub(DELTA_SUFFIX.len());
    if let Some(suffix) = file_name.get(cut..) {
        if suffix.eq_ignore_ascii_case(DELTA_SUFFIX) {
            return (&file_name[..cut], suffix);
        }
    }
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => (&file_name[..idx], &file_name[idx..]),
        _ => (file_name, ""),
    }
}

/// Candidate name for collision attempt `n` (1 is the plain name).
pub fn numbered_name(file_name: &str, n: u32) -> String {
    if n <= 1 {
        return file_name.to_string();
    }
    let (stem, ext) = split_file_name(file_name);
    format!("{stem}_{n}{ext}")
}

/// Whether anything (file, directory or link) exists at `path`.
pub async fn path_exists(path: &Path) -> AppResult<bool> {
    match fs::symlink_metadata(path).await {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to inspect {}", path.display()),
            e,
        )),
    }
}

/// First free path in `dir` for `file_name`, probing `name.ext`,
/// `name_2.ext`, `name_3.ext` and so on.
///
/// Not atomic: a concurrent writer may take the name between the probe and
/// the caller's write.
pub async fn unique_path(dir: &Path, file_name: &str) -> AppResult<PathBuf> {
    let mut n = 1;
    loop {
        let candidate = dir.join(numbered_name(file_name, n));
        if !path_exists(&candidate).await? {
            return Ok(candidate);
        }
        n += 1;
    }
}

/// Like [`unique_path`], but `skip` counts as free. Used for renames where
/// the source itself may match a candidate.
pub async fn unique_path_except(dir: &Path, file_name: &str, skip: &Path) -> AppResult<PathBuf> {
    let mut n = 1;
    loop {
        let candidate = dir.join(numbered_name(file_name, n));
        if candidate == skip || !path_exists(&candidate).await? {
            return Ok(candidate);
        }
        n += 1;
    }
}

/// Final component of a path as UTF-8.
pub fn file_name_of(path: &Path) -> AppResult<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| AppError::invalid_operation(format!("Path {} has no name", path.display())))
}
