//! Storage layer for Novelist data.
//!
//! This module handles persistence of projects, chapters, scenes,
//! characters, planning notes and editor settings.
//!
//! ## Storage Backends
//!
//! Novelist supports two storage backends behind the [`ProjectStore`] trait:
//!
//! - **Directory backend** (default): one folder per project under
//!   `~/Documents/Novelist/<project>/` with a `project.json` index and one
//!   markdown file per chapter, character and planning note.
//! - **Aggregate backend**: three whole-document JSON files
//!   (`settings.json`, `notes.json`, `project.json`) in `~/.novelist/`
//!   holding a single implicit project.
//!
//! Both backends keep editor settings in `<data-dir>/settings.json`.
//!
//! ## Write model
//!
//! All calls are synchronous and complete their writes before returning.
//! Every file is replaced atomically (temp file + rename), so a crash never
//! leaves a half-written document. No file locks are taken: two processes
//! writing the same project race, and the last writer wins.

pub mod aggregate;
pub mod backend;
pub mod directory;
pub mod export;
pub mod markdown;
pub mod settings;

pub use aggregate::{AggregateBackend, IMPLICIT_PROJECT};
pub use backend::{BackendType, ProjectStore};
pub use directory::DirectoryBackend;
pub use export::{export_book, render_book};
pub use settings::SettingsFile;

use crate::config::ResolvedConfig;
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Maximum length of a chapter slug in a file name.
pub const CHAPTER_SLUG_MAX_LEN: usize = 30;

/// Open the backend selected by a resolved configuration.
pub fn open_store(config: &ResolvedConfig) -> Result<Box<dyn ProjectStore>> {
    match config.backend() {
        BackendType::Aggregate => Ok(Box::new(AggregateBackend::open(config.data_dir())?)),
        BackendType::Directory => Ok(Box::new(
            DirectoryBackend::open(config.projects_dir(), config.data_dir())?
                .with_welcome_chapter(config.welcome_chapter()),
        )),
    }
}

/// Replace `path` with `contents` atomically.
///
/// The data is written to a temporary file in the same directory and then
/// renamed over the target.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::Other(format!("No parent directory for {}", path.display())))?;
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote file");
    Ok(())
}

/// Serialize a value as two-space indented JSON and write it atomically.
pub fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    write_atomic(path, &json)
}

/// Load a JSON document, substituting the default when it is missing or unreadable.
///
/// A missing file is silent; a corrupt one is logged and replaced by the
/// default on the next write.
pub fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return T::default(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "unreadable document, using empty default");
            return T::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "corrupt document, using empty default");
            T::default()
        }
    }
}

/// Derive a filesystem-safe slug from a title.
///
/// Lowercases, turns whitespace runs into `_` and drops everything except
/// ASCII alphanumerics, `-` and `_`. An empty result becomes `untitled`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_sep = false;
    for c in title.trim().chars() {
        if c.is_whitespace() {
            pending_sep = true;
            continue;
        }
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(c.to_ascii_lowercase());
        }
    }

    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug
    }
}

/// Slug truncated to `max_len` characters.
pub fn slugify_truncated(title: &str, max_len: usize) -> String {
    let slug = slugify(title);
    let truncated: String = slug.chars().take(max_len).collect();
    truncated.trim_end_matches('_').to_string()
}

/// Pick `<dir>/<slug>.md`, or `<slug>_2.md`, `<slug>_3.md`, ... if taken.
pub fn unique_markdown_path(dir: &Path, slug: &str) -> PathBuf {
    let first = dir.join(format!("{}.md", slug));
    if !first.exists() {
        return first;
    }
    let mut n = 2;
    loop {
        let candidate = dir.join(format!("{}_{}.md", slug, n));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Title-case a file stem: underscores become spaces and each word is capitalized.
pub fn title_from_stem(stem: &str) -> String {
    let spaced = stem.replace('_', " ");
    let mut out = String::with_capacity(spaced.len());
    let mut prev_alpha = false;
    for c in spaced.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Sorted list of `*.md` files directly inside `dir`. A missing directory is empty.
pub fn list_markdown_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "md") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Sorted names of the subdirectories of `dir`. A missing directory is empty.
pub fn list_subdirectories(dir: &Path) -> Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                if !name.starts_with('.') {
                    names.push(name.to_string());
                }
            }
        }
    }
    names.sort();
    Ok(names)
}

/// Validate a name that becomes a single path component (project or category).
pub fn validate_path_component(kind: &str, name: &str) -> Result<()> {
    crate::models::validate_title(kind, name)?;
    if name.contains('/') || name.contains('\\') || name == "." || name == ".." || name.starts_with('.') {
        return Err(Error::InvalidArgument(format!(
            "{} must not contain path separators or start with '.': {}",
            kind, name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("The Long Night"), "the_long_night");
        assert_eq!(slugify("  Hello,   World!  "), "hello_world");
        assert_eq!(slugify("Café über"), "caf_ber");
        assert_eq!(slugify("???"), "untitled");
        assert_eq!(slugify("already_snake-case"), "already_snake-case");
    }

    #[test]
    fn test_slugify_truncated() {
        let slug = slugify_truncated("An Extraordinarily Long Chapter Title Indeed", 30);
        assert!(slug.chars().count() <= 30);
        assert_eq!(slug, "an_extraordinarily_long_chapte");
        assert_eq!(slugify_truncated("Short", 30), "short");
    }

    #[test]
    fn test_title_from_stem() {
        assert_eq!(title_from_stem("the_long_night"), "The Long Night");
        assert_eq!(title_from_stem("01_intro"), "01 Intro");
        assert_eq!(title_from_stem("mIXED_case"), "Mixed Case");
    }

    #[test]
    fn test_unique_markdown_path() {
        let dir = TempDir::new().unwrap();
        let first = unique_markdown_path(dir.path(), "mira");
        assert_eq!(first, dir.path().join("mira.md"));
        fs::write(&first, "x").unwrap();
        assert_eq!(unique_markdown_path(dir.path(), "mira"), dir.path().join("mira_2.md"));
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("doc.json");
        write_atomic(&path, "first").unwrap();
        write_atomic(&path, "second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        // No temp files left behind
        let leftovers = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_read_json_or_default() {
        let dir = TempDir::new().unwrap();
        let missing: Vec<String> = read_json_or_default(&dir.path().join("missing.json"));
        assert!(missing.is_empty());

        let corrupt = dir.path().join("corrupt.json");
        fs::write(&corrupt, "{not json").unwrap();
        let value: Vec<String> = read_json_or_default(&corrupt);
        assert!(value.is_empty());
    }

    #[test]
    fn test_list_markdown_files_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("02_b.md"), "").unwrap();
        fs::write(dir.path().join("01_a.md"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        let files = list_markdown_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["01_a.md", "02_b.md"]);
        assert!(list_markdown_files(&dir.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn test_validate_path_component() {
        assert!(validate_path_component("Project name", "Demo").is_ok());
        assert!(validate_path_component("Project name", "a/b").is_err());
        assert!(validate_path_component("Project name", "..").is_err());
        assert!(validate_path_component("Project name", ".hidden").is_err());
        assert!(validate_path_component("Project name", "").is_err());
    }
}
