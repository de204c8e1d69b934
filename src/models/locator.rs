//! Backend-independent addressing of content units.
//!
//! A `ContentLocator` names one editable piece of text: a chapter body, a
//! scene, a character's description or a planning note. Backends map it to
//! their own layout; callers only ever see the locator and its textual
//! `StorageKey` form:
//!
//! - `chapter/<title>`
//! - `scene/<chapter>/<scene>`
//! - `character/<name>`
//! - `note/<category>/<title>`
//!
//! `%` and `/` inside a component are percent-escaped.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies one content unit. Comparison is exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentLocator {
    Chapter { title: String },
    Scene { chapter: String, scene: String },
    Character { name: String },
    PlanningNote { category: String, title: String },
}

/// Stable textual key produced by [`ContentLocator::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl ContentLocator {
    pub fn chapter(title: impl Into<String>) -> Self {
        Self::Chapter {
            title: title.into(),
        }
    }

    pub fn scene(chapter: impl Into<String>, scene: impl Into<String>) -> Self {
        Self::Scene {
            chapter: chapter.into(),
            scene: scene.into(),
        }
    }

    pub fn character(name: impl Into<String>) -> Self {
        Self::Character { name: name.into() }
    }

    pub fn note(category: impl Into<String>, title: impl Into<String>) -> Self {
        Self::PlanningNote {
            category: category.into(),
            title: title.into(),
        }
    }

    /// Short name of the content kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Chapter { .. } => "chapter",
            Self::Scene { .. } => "scene",
            Self::Character { .. } => "character",
            Self::PlanningNote { .. } => "note",
        }
    }

    fn components(&self) -> Vec<&str> {
        match self {
            Self::Chapter { title } => vec![title],
            Self::Scene { chapter, scene } => vec![chapter, scene],
            Self::Character { name } => vec![name],
            Self::PlanningNote { category, title } => vec![category, title],
        }
    }

    /// Check that every component is non-blank.
    pub fn validate(&self) -> Result<()> {
        if self.components().iter().any(|c| c.trim().is_empty()) {
            return Err(Error::InvalidLocator(format!(
                "{} locator has an empty component: {:?}",
                self.kind(),
                self
            )));
        }
        Ok(())
    }

    /// Map this locator to its storage key.
    pub fn resolve(&self) -> Result<StorageKey> {
        self.validate()?;
        let mut key = String::from(self.kind());
        for component in self.components() {
            key.push('/');
            key.push_str(&escape(component));
        }
        Ok(StorageKey(key))
    }
}

impl fmt::Display for ContentLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chapter { title } => write!(f, "chapter '{}'", title),
            Self::Scene { chapter, scene } => write!(f, "scene '{}' in chapter '{}'", scene, chapter),
            Self::Character { name } => write!(f, "character '{}'", name),
            Self::PlanningNote { category, title } => write!(f, "note '{}' in '{}'", title, category),
        }
    }
}

impl FromStr for ContentLocator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('/').collect();
        let decoded = parts[1..]
            .iter()
            .map(|p| unescape(p))
            .collect::<Result<Vec<String>>>()?;

        let locator = match (parts[0], decoded.as_slice()) {
            ("chapter", [title]) => Self::chapter(title.clone()),
            ("scene", [chapter, scene]) => Self::scene(chapter.clone(), scene.clone()),
            ("character", [name]) => Self::character(name.clone()),
            ("note", [category, title]) => Self::note(category.clone(), title.clone()),
            _ => {
                return Err(Error::InvalidLocator(format!(
                    "expected chapter/<title>, scene/<chapter>/<scene>, character/<name> or note/<category>/<title>, got: {}",
                    s
                )));
            }
        };
        locator.validate()?;
        Ok(locator)
    }
}

fn escape(component: &str) -> String {
    component.replace('%', "%25").replace('/', "%2F")
}

fn unescape(component: &str) -> Result<String> {
    let mut out = String::with_capacity(component.len());
    let mut rest = component;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let code = rest.get(pos + 1..pos + 3).unwrap_or("");
        match code {
            "25" => out.push('%'),
            "2F" | "2f" => out.push('/'),
            _ => {
                return Err(Error::InvalidLocator(format!(
                    "invalid escape sequence in: {}",
                    component
                )));
            }
        }
        rest = &rest[pos + 3..];
    }
    out.push_str(rest);
    Ok(out)
}
