//! Convenience result type alias for Casefile.

use crate::error::AppError;

/// A specialized `Result` type for Casefile operations.
pub type AppResult<T> = Result<T, AppError>;
