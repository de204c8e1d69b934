//! Data models for Novelist entities.
//!
//! This module defines the core data structures:
//! - `Project` - Top-level container, also the handle passed to project-scoped operations
//! - `ChapterRef` / `SceneRef` - Chapter and scene listings
//! - `Character` - Cast members with role, age, description and notes
//! - `NoteRef` - Planning notes filed under a category
//! - `ContentLocator` - Backend-independent address of one content unit

pub mod locator;
pub mod settings;

pub use locator::{ContentLocator, StorageKey};
pub use settings::EditorSettings;

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A book project.
///
/// Values of this type are returned by `create_project` / `open_project` and
/// passed back to every chapter, character and note operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Project name (unique, used as folder name)
    pub name: String,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author shown on the export title page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Project {
    /// Create a new project record with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created: Utc::now(),
            author: None,
            description: None,
        }
    }
}

/// Metadata edits for a project. `None` keeps the current value, an empty
/// string clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectInfo {
    pub author: Option<String>,
    pub description: Option<String>,
}

impl ProjectInfo {
    /// Apply these edits to a project record.
    pub fn apply(&self, project: &mut Project) {
        if let Some(ref author) = self.author {
            project.author = non_empty(author);
        }
        if let Some(ref description) = self.description {
            project.description = non_empty(description);
        }
    }
}

/// A chapter as listed in a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterRef {
    /// Chapter title (lookup key)
    pub title: String,

    /// Ordering key; chapters are listed and exported in ascending order
    pub order: u32,

    /// Scene titles in narrative order
    #[serde(default)]
    pub scenes: Vec<String>,
}

/// A scene within a chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneRef {
    pub chapter: String,
    pub title: String,
}

/// A planning note within a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRef {
    pub category: String,
    pub title: String,
}

/// Narrative role of a character.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CharacterRole {
    Protagonist,
    Antagonist,
    #[default]
    Supporting,
    Minor,
    /// Any other free-text role
    Other(String),
}

impl CharacterRole {
    /// Parse a role; known names match case-insensitively, anything else is kept as free text.
    /// A blank role is the default.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "" => Self::default(),
            "protagonist" => Self::Protagonist,
            "antagonist" => Self::Antagonist,
            "supporting" => Self::Supporting,
            "minor" => Self::Minor,
            _ => Self::Other(s.trim().to_string()),
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Protagonist => "Protagonist",
            Self::Antagonist => "Antagonist",
            Self::Supporting => "Supporting",
            Self::Minor => "Minor",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for CharacterRole {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<CharacterRole> for String {
    fn from(role: CharacterRole) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for CharacterRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A member of the cast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    /// Character name (lookup key)
    pub name: String,

    #[serde(default)]
    pub role: CharacterRole,

    /// Free-text age ("34", "late teens", ...)
    #[serde(default)]
    pub age: String,

    /// Long-form description; this is the character's editable body
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub notes: String,
}

impl Character {
    /// Create a new character with the default role.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: CharacterRole::default(),
            age: String::new(),
            description: String::new(),
            notes: String::new(),
        }
    }

    /// Apply a partial update. Role and age are stored trimmed.
    pub fn apply(&mut self, update: &CharacterUpdate) {
        if let Some(ref role) = update.role {
            self.role = CharacterRole::parse(role.as_str());
        }
        if let Some(ref age) = update.age {
            self.age = age.trim().to_string();
        }
        if let Some(ref description) = update.description {
            self.description = description.clone();
        }
        if let Some(ref notes) = update.notes {
            self.notes = notes.clone();
        }
    }
}

/// Field updates for `update_character`. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterUpdate {
    pub role: Option<CharacterRole>,
    pub age: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

impl CharacterUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, role: CharacterRole) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_age(mut self, age: impl Into<String>) -> Self {
        self.age = Some(age.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Role and age are one-line fields.
    pub fn validate(&self) -> Result<()> {
        if let Some(ref role) = self.role {
            check_single_line("Character role", role.as_str())?;
        }
        if let Some(ref age) = self.age {
            check_single_line("Character age", age)?;
        }
        Ok(())
    }

    /// True when no field would change.
    pub fn is_empty(&self) -> bool {
        self.role.is_none() && self.age.is_none() && self.description.is_none() && self.notes.is_none()
    }
}

/// Validate a title or name used as a lookup key.
///
/// Titles must be non-blank, fit on a single line and carry no surrounding
/// whitespace (markdown headings are read back trimmed).
pub fn validate_title(kind: &str, title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::InvalidArgument(format!("{} must not be empty", kind)));
    }
    if title.trim() != title {
        return Err(Error::InvalidArgument(format!(
            "{} must not start or end with whitespace: {:?}",
            kind, title
        )));
    }
    check_single_line(kind, title)
}

fn check_single_line(kind: &str, value: &str) -> Result<()> {
    if value.contains('\n') || value.contains('\r') {
        return Err(Error::InvalidArgument(format!(
            "{} must be a single line: {:?}",
            kind, value
        )));
    }
    Ok(())
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
