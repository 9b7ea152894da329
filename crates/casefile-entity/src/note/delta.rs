//! Delta rich-text document model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single insert operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaOp {
    /// Inserted text.
    pub insert: String,
    /// Formatting attributes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Map<String, Value>>,
}

impl DeltaOp {
    /// Plain insert without attributes.
    pub fn text(insert: impl Into<String>) -> Self {
        Self {
            insert: insert.into(),
            attributes: None,
        }
    }
}

/// A note body: an ordered list of insert operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaDocument {
    /// Operations in document order.
    pub ops: Vec<DeltaOp>,
}

impl DeltaDocument {
    /// The empty document, a single newline insert.
    pub fn empty() -> Self {
        Self {
            ops: vec![DeltaOp::text("\n")],
        }
    }

    /// Single-insert document for plain text. A trailing newline is added
    /// when missing.
    pub fn from_plain_text(text: &str) -> Self {
        let mut insert = text.to_string();
        if !insert.ends_with('\n') {
            insert.push('\n');
        }
        Self {
            ops: vec![DeltaOp::text(insert)],
        }
    }

    /// Concatenated insert text.
    pub fn plain_text(&self) -> String {
        self.ops.iter().map(|op| op.insert.as_str()).collect()
    }

    /// Whether the last insert ends with a newline.
    pub fn ends_with_newline(&self) -> bool {
        self.ops.last().is_some_and(|op| op.insert.ends_with('\n'))
    }
}

impl Default for DeltaDocument {
    fn default() -> Self {
        Self::empty()
    }
}
