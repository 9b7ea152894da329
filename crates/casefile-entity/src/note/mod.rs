//! Note domain entities.

pub mod delta;
pub mod model;

pub use delta::{DeltaDocument, DeltaOp};
pub use model::{
    DELTA_SUFFIX, MARKDOWN_SUFFIX, NoteKind, NoteSummary, display_name, friendly_title,
};
