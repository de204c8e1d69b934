//! Whole-book markdown export.

use super::{ProjectStore, write_atomic};
use crate::Result;
use crate::models::{ContentLocator, Project};
use std::path::Path;

const RULE_AFTER_TITLE: &str = "\n---\n\n";
const RULE_AFTER_CHAPTER: &str = "\n\n---\n\n";

/// Render a project as one markdown document.
///
/// A title page (`# Name`, optional `**by Author**`) is followed by every
/// chapter in `list_chapters` order, each with its scenes as `##` sections
/// and a horizontal rule after it.
pub fn render_book<S: ProjectStore + ?Sized>(store: &S, project: &Project) -> Result<String> {
    // Re-read metadata so edits made through another handle are picked up
    let project = store.open_project(&project.name)?;

    let mut parts = vec![format!("# {}\n", project.name)];
    if let Some(author) = &project.author {
        parts.push(format!("**by {}**\n", author));
    }
    parts.push(RULE_AFTER_TITLE.to_string());

    for chapter in store.list_chapters(&project)? {
        let body = store.get_content(&project, &ContentLocator::chapter(&chapter.title))?;
        let mut block = format!("# {}\n\n{}", chapter.title, body);
        for scene in &chapter.scenes {
            let text = store.get_content(&project, &ContentLocator::scene(&chapter.title, scene))?;
            block.push_str(&format!("\n\n## {}\n\n{}", scene, text));
        }
        parts.push(block);
        parts.push(RULE_AFTER_CHAPTER.to_string());
    }

    Ok(parts.join("\n"))
}

/// Render the book and write it to `output_path`.
pub fn export_book<S: ProjectStore + ?Sized>(
    store: &S,
    project: &Project,
    output_path: &Path,
) -> Result<()> {
    let book = render_book(store, project)?;
    write_atomic(output_path, &book)?;
    tracing::info!(project = %project.name, path = %output_path.display(), bytes = book.len(), "exported book");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProjectInfo;
    use crate::storage::IMPLICIT_PROJECT;
    use crate::test_utils::TestEnv;
    use std::fs;

    #[test]
    fn test_title_page_only_without_chapters() {
        let env = TestEnv::new();
        let mut store = env.directory();
        let project = store.create_project("Demo").unwrap();
        assert_eq!(render_book(&store, &project).unwrap(), "# Demo\n\n\n---\n\n");
    }

    #[test]
    fn test_author_line() {
        let env = TestEnv::new();
        let mut store = env.directory();
        let project = store.create_project("Demo").unwrap();
        store
            .update_project(
                &project,
                &ProjectInfo {
                    author: Some("A. Writer".to_string()),
                    description: None,
                },
            )
            .unwrap();

        // The stale handle still exports the current author
        let book = render_book(&store, &project).unwrap();
        assert!(book.starts_with("# Demo\n\n**by A. Writer**\n\n"));
    }

    #[test]
    fn test_chapters_and_scenes_in_order() {
        let env = TestEnv::new();
        let mut store = env.aggregate();
        let project = store.open_project(IMPLICIT_PROJECT).unwrap();
        store.add_chapter(&project, "One").unwrap();
        store.add_chapter(&project, "Two").unwrap();
        store.add_scene(&project, "One", "Open").unwrap();
        store
            .set_content(&project, &ContentLocator::chapter("One"), "Prose.")
            .unwrap();
        store
            .set_content(&project, &ContentLocator::scene("One", "Open"), "It was dark.")
            .unwrap();

        let book = render_book(&store, &project).unwrap();
        assert_eq!(
            book,
            "# Untitled\n\n\n---\n\n\n# One\n\nProse.\n\n## Open\n\nIt was dark.\n\n\n---\n\n\n# Two\n\n\n\n\n---\n\n"
        );
    }

    #[test]
    fn test_export_writes_file() {
        let env = TestEnv::new();
        let mut store = env.directory();
        let project = store.create_project("Demo").unwrap();
        store.add_chapter(&project, "One").unwrap();

        let out = env.data_path().join("out").join("book.md");
        store.export_book(&project, &out).unwrap();
        let book = fs::read_to_string(&out).unwrap();
        assert_eq!(book.matches("# One").count(), 1);
        assert!(book.contains("---"));
    }
}
