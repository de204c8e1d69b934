//! Novelist - a project and content store for novel manuscripts.
//!
//! This library provides the persistence core behind the `novelist` CLI:
//! chapters with their scenes, characters, planning notes and editor
//! settings, stored either as a few whole-document JSON files or as a
//! directory of markdown files per project.

pub mod cli;
pub mod commands;
pub mod config;
pub mod models;
pub mod storage;


/// Library-level error type for Novelist operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid locator: {0}")]
    InvalidLocator(String),

    #[error("Unsupported by this backend: {0}")]
    Unsupported(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Stable machine-readable code for the error category.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::NotFound(_) => "not_found",
            Error::AlreadyExists(_) => "already_exists",
            Error::InvalidArgument(_) => "invalid_argument",
            Error::InvalidLocator(_) => "invalid_locator",
            Error::Unsupported(_) => "unsupported",
            Error::Config(_) => "config",
            Error::Other(_) => "other",
        }
    }
}

/// Result type alias for Novelist operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_codes() {
        assert_eq!(Error::NotFound("x".into()).kind(), "not_found");
        assert_eq!(Error::AlreadyExists("x".into()).kind(), "already_exists");
        assert_eq!(Error::InvalidArgument("x".into()).kind(), "invalid_argument");
        assert_eq!(Error::InvalidLocator("x".into()).kind(), "invalid_locator");
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert_eq!(Error::from(io).kind(), "io");
    }

    #[test]
    fn test_error_display() {
        let err = Error::NotFound("Chapter not found: One".to_string());
        assert_eq!(err.to_string(), "Not found: Chapter not found: One");
    }
}
