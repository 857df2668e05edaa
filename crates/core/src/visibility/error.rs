//! Visibility error types.

use thiserror::Error;

/// Failure reading from an upstream collaborator.
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    /// The backing store could not be queried.
    #[error("Directory read failed: {0}")]
    Read(String),
}

/// Errors surfaced by the visibility engine.
///
/// Identity and configuration problems never appear here: they resolve to
/// the `MyTeam` policy or an empty enforced set instead.
#[derive(Debug, Error)]
pub enum VisibilityError {
    /// The loaded record is outside the caller's visibility.
    ///
    /// Carries nothing about the record, so a forbidden record always
    /// produces the same error.
    #[error("You do not have access to this record")]
    Forbidden,

    /// The organizational directory could not be read.
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl VisibilityError {
    /// Returns the HTTP status code for this error.
    ///
    /// Forbidden records map to 403, never 404.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Forbidden => 403,
            Self::Directory(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Forbidden => "forbidden",
            Self::Directory(_) => "directory_unavailable",
        }
    }
}
