//! Chapter, scene, content and export commands.

use super::{Output, Removed, Renamed, json_string};
use crate::Result;
use crate::models::{ChapterRef, ContentLocator, Project, SceneRef};
use crate::storage::ProjectStore;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
pub struct ChapterAdded {
    #[serde(flatten)]
    pub chapter: ChapterRef,
}

impl Output for ChapterAdded {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        format!(
            "Added chapter {}: {}",
            self.chapter.order, self.chapter.title
        )
    }
}

#[derive(Serialize)]
pub struct ChapterList {
    pub chapters: Vec<ChapterRef>,
    pub count: usize,
}

impl Output for ChapterList {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        if self.chapters.is_empty() {
            return "No chapters.".to_string();
        }
        let mut lines = vec![format!("{} chapter(s):", self.count)];
        for chapter in &self.chapters {
            lines.push(format!("  {:>3}. {}", chapter.order, chapter.title));
            for scene in &chapter.scenes {
                lines.push(format!("        - {}", scene));
            }
        }
        lines.join("\n")
    }
}

#[derive(Serialize)]
pub struct SceneAdded {
    #[serde(flatten)]
    pub scene: SceneRef,
}

impl Output for SceneAdded {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        format!(
            "Added scene '{}' to chapter '{}'",
            self.scene.title, self.scene.chapter
        )
    }
}

/// Text of one content unit.
#[derive(Serialize)]
pub struct ContentShow {
    pub key: String,
    pub text: String,
}

impl Output for ContentShow {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        self.text.clone()
    }
}

#[derive(Serialize)]
pub struct ContentSet {
    pub key: String,
    pub bytes: usize,
}

impl Output for ContentSet {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        format!("Saved {} ({} bytes)", self.key, self.bytes)
    }
}

#[derive(Serialize)]
pub struct Exported {
    pub project: String,
    pub path: PathBuf,
    pub chapters: usize,
}

impl Output for Exported {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        format!(
            "Exported '{}' ({} chapter(s)) to {}",
            self.project,
            self.chapters,
            self.path.display()
        )
    }
}

pub fn chapter_add(
    store: &mut dyn ProjectStore,
    project: &Project,
    title: &str,
) -> Result<ChapterAdded> {
    let chapter = store.add_chapter(project, title)?;
    Ok(ChapterAdded { chapter })
}

pub fn chapter_list(store: &dyn ProjectStore, project: &Project) -> Result<ChapterList> {
    let chapters = store.list_chapters(project)?;
    Ok(ChapterList {
        count: chapters.len(),
        chapters,
    })
}

pub fn chapter_rename(
    store: &mut dyn ProjectStore,
    project: &Project,
    old: &str,
    new: &str,
) -> Result<Renamed> {
    store.rename_chapter(project, old, new)?;
    Ok(Renamed {
        kind: "chapter",
        old: old.to_string(),
        new: new.to_string(),
    })
}

pub fn chapter_rm(store: &mut dyn ProjectStore, project: &Project, title: &str) -> Result<Removed> {
    store.delete_chapter(project, title)?;
    Ok(Removed::new("chapter", title))
}

pub fn scene_add(
    store: &mut dyn ProjectStore,
    project: &Project,
    chapter: &str,
    title: &str,
) -> Result<SceneAdded> {
    let scene = store.add_scene(project, chapter, title)?;
    Ok(SceneAdded { scene })
}

pub fn scene_rm(
    store: &mut dyn ProjectStore,
    project: &Project,
    chapter: &str,
    title: &str,
) -> Result<Removed> {
    store.delete_scene(project, chapter, title)?;
    Ok(Removed::new("scene", format!("{}/{}", chapter, title)))
}

/// Read content addressed by a textual locator (`chapter/<title>`, ...).
pub fn content_get(store: &dyn ProjectStore, project: &Project, locator: &str) -> Result<ContentShow> {
    let locator: ContentLocator = locator.parse()?;
    let text = store.get_content(project, &locator)?;
    Ok(ContentShow {
        key: locator.resolve()?.to_string(),
        text,
    })
}

pub fn content_set(
    store: &mut dyn ProjectStore,
    project: &Project,
    locator: &str,
    text: &str,
) -> Result<ContentSet> {
    let locator: ContentLocator = locator.parse()?;
    store.set_content(project, &locator, text)?;
    Ok(ContentSet {
        key: locator.resolve()?.to_string(),
        bytes: text.len(),
    })
}

pub fn export(store: &dyn ProjectStore, project: &Project, output: &Path) -> Result<Exported> {
    store.export_book(project, output)?;
    Ok(Exported {
        project: project.name.clone(),
        path: output.to_path_buf(),
        chapters: store.list_chapters(project)?.len(),
    })
}
