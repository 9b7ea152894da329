//! Path-identified folder value type.

use std::fmt;

use casefile_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Sentinel folder identifier meaning the customer root.
pub const ROOT_SENTINEL: &str = "root";

/// Normalize a caller-supplied relative path.
///
/// Converts `\` to `/`, trims surrounding whitespace, strips leading and
/// trailing slashes, collapses duplicate slashes and drops `.` segments.
/// `..` segments are kept so callers can reject them.
pub fn normalize_rel_path(raw: &str) -> String {
    raw.replace('\\', "/")
        .trim()
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether a folder identifier denotes the customer root.
pub fn is_root_sentinel(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case(ROOT_SENTINEL)
}

/// A folder inside a customer sandbox, identified by its normalized
/// relative path. The empty path is the customer root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FolderPath(String);

impl FolderPath {
    /// The customer root.
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Parse and normalize a relative path. Fails with `OutOfBounds` when any
    /// segment is `..`.
    pub fn parse(raw: &str) -> AppResult<Self> {
        let normalized = normalize_rel_path(raw);
        if normalized.split('/').any(|segment| segment == "..") {
            return Err(AppError::out_of_bounds(format!(
                "Relative path '{raw}' contains a parent segment"
            )));
        }
        Ok(Self(normalized))
    }

    /// Like [`FolderPath::parse`] but maps the `"root"` sentinel to the root.
    pub fn from_folder_id(raw: &str) -> AppResult<Self> {
        if is_root_sentinel(raw) {
            return Ok(Self::root());
        }
        Self::parse(raw)
    }

    /// The normalized relative path.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the customer root.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Last segment, or `None` for the root.
    pub fn name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        self.0.rsplit('/').next()
    }

    /// Parent folder, or `None` for the root.
    pub fn parent(&self) -> Option<FolderPath> {
        if self.is_root() {
            return None;
        }
        match self.0.rsplit_once('/') {
            Some((parent, _)) => Some(Self(parent.to_string())),
            None => Some(Self::root()),
        }
    }

    /// Append a single, already sanitized segment.
    pub fn join(&self, segment: &str) -> FolderPath {
        if self.is_root() {
            Self(segment.to_string())
        } else {
            Self(format!("{}/{}", self.0, segment))
        }
    }

    /// Relative path of a file named `file_name` inside this folder.
    pub fn file(&self, file_name: &str) -> String {
        self.join(file_name).0
    }

    /// Iterate over the segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Whether `self` equals `ancestor` or lies beneath it.
    pub fn is_within(&self, ancestor: &FolderPath) -> bool {
        ancestor.is_root()
            || self.0 == ancestor.0
            || self
                .0
                .strip_prefix(ancestor.0.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Replace the `from` prefix of this path with `to`.
    ///
    /// Returns `None` when `self` is not within `from`.
    pub fn rebase(&self, from: &FolderPath, to: &FolderPath) -> Option<FolderPath> {
        if !self.is_within(from) {
            return None;
        }
        let rest = self.0[from.0.len()..].trim_start_matches('/');
        if rest.is_empty() {
            Some(to.clone())
        } else if to.is_root() {
            Some(Self(rest.to_string()))
        } else {
            Some(Self(format!("{}/{}", to.0, rest)))
        }
    }
}

impl fmt::Display for FolderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for FolderPath {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FolderPath> for String {
    fn from(value: FolderPath) -> Self {
        value.0
    }
}
