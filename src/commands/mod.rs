//! Command implementations for the Novelist CLI.
//!
//! This module contains the logic behind each CLI command.
//! Commands are organized by entity type:
//! - `project` - Project lifecycle and metadata
//! - `chapter` - Chapters, scenes, content and export
//! - `character` - Cast management
//! - `note` - Planning notes and categories
//! - `setting` - Editor settings and resolved configuration

pub mod chapter;
pub mod character;
pub mod note;
pub mod project;
pub mod setting;

pub use chapter::*;
pub use character::*;
pub use note::*;
pub use project::*;
pub use setting::*;

use crate::models::Project;
use crate::storage::{BackendType, IMPLICIT_PROJECT, ProjectStore};
use crate::{Error, Result};
use serde::Serialize;

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

/// Serialize a command result, reporting serializer failures as a JSON error.
pub(crate) fn json_string<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string())
}

/// Open the project a command operates on.
///
/// The aggregate backend falls back to its single implicit project; the
/// directory backend requires an explicit name.
pub fn select_project(store: &dyn ProjectStore, name: Option<&str>) -> Result<Project> {
    match (name, store.backend_type()) {
        (Some(name), _) => store.open_project(name),
        (None, BackendType::Aggregate) => store.open_project(IMPLICIT_PROJECT),
        (None, BackendType::Directory) => Err(Error::InvalidArgument(
            "No project selected. Pass -p <name> or set NOVELIST_PROJECT".to_string(),
        )),
    }
}

/// Result of a delete command.
#[derive(Serialize)]
pub struct Removed {
    pub removed: bool,
    pub kind: &'static str,
    pub name: String,
}

impl Removed {
    pub fn new(kind: &'static str, name: impl Into<String>) -> Self {
        Self {
            removed: true,
            kind,
            name: name.into(),
        }
    }
}

impl Output for Removed {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        format!("Removed {} '{}'", self.kind, self.name)
    }
}

/// Result of a rename command.
#[derive(Serialize)]
pub struct Renamed {
    pub kind: &'static str,
    pub old: String,
    pub new: String,
}

impl Output for Renamed {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        format!("Renamed {} '{}' to '{}'", self.kind, self.old, self.new)
    }
}
