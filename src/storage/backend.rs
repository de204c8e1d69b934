//! Storage backend trait and backend selection.
//!
//! This module provides the contract shared by every backend:
//! - `DirectoryBackend` - One markdown file per content unit (default)
//! - `AggregateBackend` - Whole-document JSON files with one implicit project

use crate::Result;
use crate::models::{
    ChapterRef, Character, CharacterUpdate, ContentLocator, NoteRef, Project, ProjectInfo,
    SceneRef,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Trait for project/content stores.
///
/// Project-scoped operations take the `Project` returned by
/// `create_project` / `open_project`. Lookups are exact, case-sensitive
/// matches on titles and names; creating a duplicate fails with
/// `Error::AlreadyExists`, and a missing target fails with `Error::NotFound`.
/// Each mutating call either persists completely or leaves the store unchanged.
pub trait ProjectStore: Send + Sync {
    /// Get the backend type.
    fn backend_type(&self) -> BackendType;

    /// Get the storage location description (for display purposes).
    fn location(&self) -> String;

    // === Projects ===

    /// Create a new project. Fails with `AlreadyExists` if the name is taken.
    fn create_project(&mut self, name: &str) -> Result<Project>;

    /// Open an existing project by name.
    fn open_project(&self, name: &str) -> Result<Project>;

    /// List project names, sorted.
    fn list_projects(&self) -> Result<Vec<String>>;

    /// Delete a project and everything it contains.
    fn delete_project(&mut self, name: &str) -> Result<()>;

    /// Update author/description metadata.
    fn update_project(&mut self, project: &Project, info: &ProjectInfo) -> Result<Project>;

    // === Chapters and scenes ===

    /// List chapters in ascending order-key order.
    fn list_chapters(&self, project: &Project) -> Result<Vec<ChapterRef>>;

    fn add_chapter(&mut self, project: &Project, title: &str) -> Result<ChapterRef>;

    fn rename_chapter(&mut self, project: &Project, old: &str, new: &str) -> Result<()>;

    /// Delete a chapter together with its scenes.
    fn delete_chapter(&mut self, project: &Project, title: &str) -> Result<()>;

    /// Append a scene to a chapter. `NotFound` if the chapter is absent.
    fn add_scene(&mut self, project: &Project, chapter: &str, title: &str) -> Result<SceneRef>;

    fn delete_scene(&mut self, project: &Project, chapter: &str, title: &str) -> Result<()>;

    // === Characters ===

    fn list_characters(&self, project: &Project) -> Result<Vec<Character>>;

    /// Add a character with the default role (`Supporting`).
    fn add_character(&mut self, project: &Project, name: &str) -> Result<Character>;

    fn get_character(&self, project: &Project, name: &str) -> Result<Character>;

    fn rename_character(&mut self, project: &Project, old: &str, new: &str) -> Result<()>;

    fn update_character(
        &mut self,
        project: &Project,
        name: &str,
        update: &CharacterUpdate,
    ) -> Result<Character>;

    fn delete_character(&mut self, project: &Project, name: &str) -> Result<()>;

    // === Planning notes ===

    /// List note categories, sorted.
    fn list_categories(&self, project: &Project) -> Result<Vec<String>>;

    /// List notes, either in one category or across all of them.
    fn list_notes(&self, project: &Project, category: Option<&str>) -> Result<Vec<NoteRef>>;

    fn add_note(
        &mut self,
        project: &Project,
        category: &str,
        title: &str,
        content: &str,
    ) -> Result<NoteRef>;

    fn delete_note(&mut self, project: &Project, category: &str, title: &str) -> Result<()>;

    // === Content ===

    /// Read the text of one content unit.
    fn get_content(&self, project: &Project, locator: &ContentLocator) -> Result<String>;

    /// Replace the text of one content unit. Writing the same text twice is a no-op.
    fn set_content(&mut self, project: &Project, locator: &ContentLocator, text: &str) -> Result<()>;

    // === Settings ===

    /// Get a setting, or `default` when it is not set.
    fn get_setting(&self, key: &str, default: Value) -> Value;

    /// Set a setting and flush it to disk immediately.
    fn set_setting(&mut self, key: &str, value: Value) -> Result<()>;

    /// All stored settings.
    fn settings(&self) -> BTreeMap<String, Value>;

    // === Export ===

    /// Write the whole book as one markdown file.
    fn export_book(&self, project: &Project, output_path: &Path) -> Result<()> {
        super::export::export_book(self, project, output_path)
    }
}

/// Available storage backend types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendType {
    /// One folder per project with markdown files (default)
    #[default]
    Directory,
    /// Whole-document JSON files with a single implicit project
    Aggregate,
}

impl BackendType {
    /// Parse a backend type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "directory" | "dir" | "folder" | "default" => Some(Self::Directory),
            "aggregate" | "single-file" | "json" => Some(Self::Aggregate),
            _ => None,
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::Aggregate => "aggregate",
        }
    }
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
