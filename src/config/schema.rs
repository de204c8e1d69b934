//! KDL schema for config.kdl.
//!
//! This module provides:
//! - The Rust struct representing the config file
//! - Serialization/deserialization to/from KDL format
//! - Loading from disk

use crate::storage::BackendType;
use crate::{Error, Result};
use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

pub const BACKEND_KEY: &str = "backend";
pub const DATA_DIR_KEY: &str = "data-dir";
pub const PROJECTS_DIR_KEY: &str = "projects-dir";
pub const WELCOME_CHAPTER_KEY: &str = "welcome-chapter";

/// User preferences stored in config.kdl.
///
/// # KDL Schema
///
/// ```kdl
/// backend "directory"   // or "aggregate"
/// data-dir "~/.novelist"
/// projects-dir "~/Documents/Novelist"
/// welcome-chapter #true
/// ```
///
/// Paths are kept as written; `~` is expanded during resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NovelistConfig {
    pub backend: Option<BackendType>,
    pub data_dir: Option<String>,
    pub projects_dir: Option<String>,
    /// Write the welcome chapter into new projects
    pub welcome_chapter: Option<bool>,
}

fn first_string(doc: &KdlDocument, key: &str) -> Option<String> {
    doc.get(key)
        .and_then(|node| node.entries().first())
        .and_then(|entry| entry.value().as_string())
        .map(str::to_string)
}

impl NovelistConfig {
    /// Create an empty config with no values set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse config from a KDL document.
    ///
    /// Unknown nodes are ignored; an unknown backend name is an error.
    pub fn from_kdl(doc: &KdlDocument) -> Result<Self> {
        let mut config = Self::new();

        if let Some(name) = first_string(doc, BACKEND_KEY) {
            config.backend = Some(BackendType::parse(&name).ok_or_else(|| {
                Error::Config(format!(
                    "{} must be \"directory\" or \"aggregate\", got {:?}",
                    BACKEND_KEY, name
                ))
            })?);
        }

        config.data_dir = first_string(doc, DATA_DIR_KEY);
        config.projects_dir = first_string(doc, PROJECTS_DIR_KEY);

        if let Some(node) = doc.get(WELCOME_CHAPTER_KEY) {
            if let Some(entry) = node.entries().first() {
                config.welcome_chapter = entry.value().as_bool();
            }
        }

        Ok(config)
    }

    /// Convert config to a KDL document.
    pub fn to_kdl(&self) -> KdlDocument {
        let mut doc = KdlDocument::new();

        if let Some(backend) = self.backend {
            let mut node = KdlNode::new(BACKEND_KEY);
            node.push(KdlEntry::new(KdlValue::String(backend.as_str().to_string())));
            doc.nodes_mut().push(node);
        }

        for (key, value) in [
            (DATA_DIR_KEY, &self.data_dir),
            (PROJECTS_DIR_KEY, &self.projects_dir),
        ] {
            if let Some(path) = value {
                let mut node = KdlNode::new(key);
                node.push(KdlEntry::new(KdlValue::String(path.clone())));
                doc.nodes_mut().push(node);
            }
        }

        if let Some(enabled) = self.welcome_chapter {
            let mut node = KdlNode::new(WELCOME_CHAPTER_KEY);
            node.push(KdlEntry::new(KdlValue::Bool(enabled)));
            doc.nodes_mut().push(node);
        }

        doc
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` if they are Some.
    pub fn merge(&mut self, other: &NovelistConfig) {
        if other.backend.is_some() {
            self.backend = other.backend;
        }
        if other.data_dir.is_some() {
            self.data_dir = other.data_dir.clone();
        }
        if other.projects_dir.is_some() {
            self.projects_dir = other.projects_dir.clone();
        }
        if other.welcome_chapter.is_some() {
            self.welcome_chapter = other.welcome_chapter;
        }
    }

    /// Load config.kdl from `path`. A missing file is an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(e.into()),
        };

        let doc: KdlDocument = content
            .parse()
            .map_err(|e| Error::Config(format!("Invalid KDL in {}: {}", path.display(), e)))?;
        Self::from_kdl(&doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_kdl() {
        let doc: KdlDocument = r#"
            backend "aggregate"
            data-dir "~/novel-data"
            welcome-chapter #true
        "#
        .parse()
        .unwrap();

        let config = NovelistConfig::from_kdl(&doc).unwrap();
        assert_eq!(config.backend, Some(BackendType::Aggregate));
        assert_eq!(config.data_dir.as_deref(), Some("~/novel-data"));
        assert_eq!(config.projects_dir, None);
        assert_eq!(config.welcome_chapter, Some(true));
    }

    #[test]
    fn test_unknown_backend_is_error() {
        let doc: KdlDocument = r#"backend "sqlite""#.parse().unwrap();
        assert!(matches!(
            NovelistConfig::from_kdl(&doc),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_kdl_roundtrip() {
        let config = NovelistConfig {
            backend: Some(BackendType::Directory),
            data_dir: Some("/tmp/data".to_string()),
            projects_dir: Some("/tmp/projects".to_string()),
            welcome_chapter: Some(false),
        };
        let parsed = NovelistConfig::from_kdl(&config.to_kdl()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_merge() {
        let mut base = NovelistConfig {
            backend: Some(BackendType::Directory),
            data_dir: Some("/a".to_string()),
            ..Default::default()
        };
        base.merge(&NovelistConfig {
            data_dir: Some("/b".to_string()),
            welcome_chapter: Some(true),
            ..Default::default()
        });
        assert_eq!(base.backend, Some(BackendType::Directory));
        assert_eq!(base.data_dir.as_deref(), Some("/b"));
        assert_eq!(base.welcome_chapter, Some(true));
    }

    #[test]
    fn test_load_missing_and_invalid() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            NovelistConfig::load(&dir.path().join("config.kdl")).unwrap(),
            NovelistConfig::new()
        );

        let bad = dir.path().join("bad.kdl");
        fs::write(&bad, "backend \"directory").unwrap();
        assert!(matches!(NovelistConfig::load(&bad), Err(Error::Config(_))));
    }
}
