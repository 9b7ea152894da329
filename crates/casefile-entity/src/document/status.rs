//! Document pipeline status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Processing status of an uploaded document.
///
/// `Pending -> Stored -> OcrQueued -> OcrDone -> ExportReady`, with `Failed`
/// reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "document_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Bytes persisted, waiting for the pipeline.
    Pending,
    /// Accepted by the pipeline.
    Stored,
    /// Waiting for text recognition.
    OcrQueued,
    /// Text recognition finished.
    OcrDone,
    /// Ready for export.
    ExportReady,
    /// Processing failed.
    Failed,
}

impl DocumentStatus {
    /// Every status, in pipeline order.
    pub const ALL: [DocumentStatus; 6] = [
        Self::Pending,
        Self::Stored,
        Self::OcrQueued,
        Self::OcrDone,
        Self::ExportReady,
        Self::Failed,
    ];

    /// Check if the status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ExportReady | Self::Failed)
    }

    /// Check whether moving to `next` follows the pipeline.
    pub fn can_transition_to(&self, next: DocumentStatus) -> bool {
        match (self, next) {
            (current, Self::Failed) => !current.is_terminal(),
            (Self::Pending, Self::Stored)
            | (Self::Stored, Self::OcrQueued)
            | (Self::OcrQueued, Self::OcrDone)
            | (Self::OcrDone, Self::ExportReady) => true,
            _ => false,
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Stored => "Stored",
            Self::OcrQueued => "OCR queued",
            Self::OcrDone => "OCR done",
            Self::ExportReady => "Export ready",
            Self::Failed => "Failed",
        }
    }

    /// Return the status as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Stored => "stored",
            Self::OcrQueued => "ocr_queued",
            Self::OcrDone => "ocr_done",
            Self::ExportReady => "export_ready",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_transitions() {
        assert!(DocumentStatus::Pending.can_transition_to(DocumentStatus::Stored));
        assert!(DocumentStatus::OcrDone.can_transition_to(DocumentStatus::ExportReady));
        assert!(!DocumentStatus::Pending.can_transition_to(DocumentStatus::OcrDone));
        assert!(!DocumentStatus::Stored.can_transition_to(DocumentStatus::Pending));
    }

    #[test]
    fn test_failed_reachable_from_non_terminal_only() {
        for status in DocumentStatus::ALL {
            assert_eq!(
                status.can_transition_to(DocumentStatus::Failed),
                !status.is_terminal(),
                "{status}"
            );
        }
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&DocumentStatus::OcrQueued).unwrap();
        assert_eq!(json, "\"ocr_queued\"");
        assert_eq!(DocumentStatus::ExportReady.label(), "Export ready");
    }
}
