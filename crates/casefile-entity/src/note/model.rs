//! Note kinds, listings and display names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Suffix of Delta notes, treated as one extension.
pub const DELTA_SUFFIX: &str = ".note.json";
/// Suffix of legacy plain-text notes.
pub const MARKDOWN_SUFFIX: &str = ".md";

/// Length of the `yyyy-MM-dd_HH-mm-ss_` filename prefix.
const TIMESTAMP_PREFIX_LEN: usize = 20;

/// Storage format of a note file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    /// `.note.json` Delta document.
    Delta,
    /// Legacy `.md` plain text.
    Markdown,
}

impl NoteKind {
    /// Detect the kind from a file name, case-insensitively.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let lower = file_name.to_lowercase();
        if lower.ends_with(DELTA_SUFFIX) {
            Some(Self::Delta)
        } else if lower.ends_with(MARKDOWN_SUFFIX) {
            Some(Self::Markdown)
        } else {
            None
        }
    }

    /// File suffix including the leading dot.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Delta => DELTA_SUFFIX,
            Self::Markdown => MARKDOWN_SUFFIX,
        }
    }

    /// Title used when a file name carries none.
    pub fn fallback_title(&self) -> &'static str {
        match self {
            Self::Delta => "notes",
            Self::Markdown => "note",
        }
    }

    /// File name without this kind's suffix.
    pub fn stem<'a>(&self, file_name: &'a str) -> &'a str {
        let cut = file_name.len().saturating_sub(self.suffix().len());
        file_name.get(..cut).unwrap_or(file_name)
    }
}

/// One entry of a customer's note listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSummary {
    /// Friendly title derived from the file name.
    pub title: String,
    /// Sandbox-relative path of the note file.
    pub rel_path: String,
    /// Storage format.
    pub kind: NoteKind,
    /// Filesystem modification time.
    pub updated_at: DateTime<Utc>,
}

fn strip_timestamp(stem: &str) -> &str {
    let bytes = stem.as_bytes();
    if bytes.len() <= TIMESTAMP_PREFIX_LEN {
        return stem;
    }
    let matches = bytes[..TIMESTAMP_PREFIX_LEN]
        .iter()
        .enumerate()
        .all(|(i, b)| match i {
            4 | 7 | 13 | 16 => *b == b'-',
            10 | 19 => *b == b'_',
            _ => b.is_ascii_digit(),
        });
    if matches {
        &stem[TIMESTAMP_PREFIX_LEN..]
    } else {
        stem
    }
}

/// Tree label for a note file: suffix and timestamp prefix removed.
pub fn display_name(file_name: &str) -> String {
    let Some(kind) = NoteKind::from_file_name(file_name) else {
        return file_name.to_string();
    };
    let name = strip_timestamp(kind.stem(file_name));
    if name.is_empty() {
        kind.fallback_title().to_string()
    } else {
        name.to_string()
    }
}

/// Listing title for a note file: like [`display_name`] with underscores
/// shown as spaces.
pub fn friendly_title(file_name: &str) -> String {
    let Some(kind) = NoteKind::from_file_name(file_name) else {
        return file_name.to_string();
    };
    let name = strip_timestamp(kind.stem(file_name));
    if name.trim().is_empty() {
        kind.fallback_title().to_string()
    } else {
        name.replace('_', " ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_detection() {
        assert_eq!(NoteKind::from_file_name("a.note.json"), Some(NoteKind::Delta));
        assert_eq!(NoteKind::from_file_name("A.NOTE.JSON"), Some(NoteKind::Delta));
        assert_eq!(NoteKind::from_file_name("readme.md"), Some(NoteKind::Markdown));
        assert_eq!(NoteKind::from_file_name("data.json"), None);
        assert_eq!(NoteKind::from_file_name("scan.pdf"), None);
    }

    #[test]
    fn test_stem_keeps_compound_suffix_whole() {
        assert_eq!(NoteKind::Delta.stem("plan.note.json"), "plan");
        assert_eq!(NoteKind::Markdown.stem("plan.md"), "plan");
    }

    #[test]
    fn test_display_name_strips_timestamp() {
        assert_eq!(
            display_name("2026-02-03_12-30-10_Meeting_Notes.note.json"),
            "Meeting_Notes"
        );
        assert_eq!(display_name("2026-02-03_12-30-10_.note.json"), "2026-02-03_12-30-10_");
        assert_eq!(display_name("plain.md"), "plain");
        assert_eq!(display_name(".note.json"), "notes");
    }

    #[test]
    fn test_friendly_title() {
        assert_eq!(
            friendly_title("2026-02-03_12-30-10_Meeting_Notes.note.json"),
            "Meeting Notes"
        );
        assert_eq!(friendly_title("legacy_file.md"), "legacy file");
        assert_eq!(friendly_title(".md"), "note");
        assert_eq!(friendly_title("other.txt"), "other.txt");
    }
}
