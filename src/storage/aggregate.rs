//! Aggregate backend: whole-document JSON files in the data directory.
//!
//! Layout:
//! - `settings.json` - flat key/value editor settings
//! - `notes.json` - `{"collections": {category: [{"title", "content"}]}}`
//! - `project.json` - `{"chapters": [{"title", "content", "scenes"}], "characters": [...]}`
//!
//! There is exactly one project, named [`IMPLICIT_PROJECT`]. Every mutation
//! is applied to a copy of the documents, all three are written, and only
//! then does the copy replace the in-memory state.

use super::settings::validate_key;
use super::{BackendType, ProjectStore, SettingsFile, read_json_or_default, write_json};
use crate::models::{
    ChapterRef, Character, CharacterUpdate, ContentLocator, NoteRef, Project, ProjectInfo,
    SceneRef, validate_title,
};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the single project held by the aggregate backend.
pub const IMPLICIT_PROJECT: &str = "Untitled";

pub const NOTES_FILE: &str = "notes.json";
pub const PROJECT_FILE: &str = "project.json";

/// Note categories present in a fresh notes document.
pub const DEFAULT_CATEGORIES: [&str; 4] = ["Outlines", "Characters", "Plot", "Notes"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct NoteEntry {
    title: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct NotesDocument {
    #[serde(default = "default_collections")]
    collections: BTreeMap<String, Vec<NoteEntry>>,
}

fn default_collections() -> BTreeMap<String, Vec<NoteEntry>> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|c| (c.to_string(), Vec::new()))
        .collect()
}

impl Default for NotesDocument {
    fn default() -> Self {
        Self {
            collections: default_collections(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SceneEntry {
    title: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ChapterEntry {
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    scenes: Vec<SceneEntry>,
}

impl ChapterEntry {
    fn scene(&self, title: &str) -> Result<&SceneEntry> {
        self.scenes
            .iter()
            .find(|s| s.title == title)
            .ok_or_else(|| scene_not_found(&self.title, title))
    }

    fn scene_mut(&mut self, title: &str) -> Result<&mut SceneEntry> {
        let chapter = self.title.clone();
        self.scenes
            .iter_mut()
            .find(|s| s.title == title)
            .ok_or_else(|| scene_not_found(&chapter, title))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ProjectDocument {
    #[serde(default)]
    chapters: Vec<ChapterEntry>,
    #[serde(default)]
    characters: Vec<Character>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created: Option<DateTime<Utc>>,
}

impl ProjectDocument {
    fn chapter(&self, title: &str) -> Result<&ChapterEntry> {
        self.chapters
            .iter()
            .find(|c| c.title == title)
            .ok_or_else(|| chapter_not_found(title))
    }

    fn chapter_mut(&mut self, title: &str) -> Result<&mut ChapterEntry> {
        self.chapters
            .iter_mut()
            .find(|c| c.title == title)
            .ok_or_else(|| chapter_not_found(title))
    }

    fn character(&self, name: &str) -> Result<&Character> {
        self.characters
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| character_not_found(name))
    }

    fn character_mut(&mut self, name: &str) -> Result<&mut Character> {
        self.characters
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| character_not_found(name))
    }
}

/// The three documents, mutated and written together.
#[derive(Debug, Clone)]
struct Documents {
    settings: SettingsFile,
    notes: NotesDocument,
    project: ProjectDocument,
}

fn chapter_not_found(title: &str) -> Error {
    Error::NotFound(format!("Chapter not found: {}", title))
}

fn scene_not_found(chapter: &str, title: &str) -> Error {
    Error::NotFound(format!("Scene not found: {} (in chapter {})", title, chapter))
}

fn character_not_found(name: &str) -> Error {
    Error::NotFound(format!("Character not found: {}", name))
}

fn category_not_found(category: &str) -> Error {
    Error::NotFound(format!("Note category not found: {}", category))
}

fn note_not_found(category: &str, title: &str) -> Error {
    Error::NotFound(format!("Note not found: {} (in category {})", title, category))
}

/// Whole-document JSON store with a single implicit project.
#[derive(Debug)]
pub struct AggregateBackend {
    data_dir: PathBuf,
    docs: Documents,
}

impl AggregateBackend {
    /// Open (or initialize) the documents in `data_dir`.
    ///
    /// Missing or corrupt documents start out as their empty defaults.
    pub fn open(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)?;

        let settings = SettingsFile::load(data_dir);
        let notes: NotesDocument = read_json_or_default(&data_dir.join(NOTES_FILE));
        let mut project: ProjectDocument = read_json_or_default(&data_dir.join(PROJECT_FILE));
        if project.created.is_none() {
            project.created = Some(Utc::now());
        }

        tracing::debug!(
            data_dir = %data_dir.display(),
            chapters = project.chapters.len(),
            characters = project.characters.len(),
            "opened aggregate store"
        );

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            docs: Documents {
                settings,
                notes,
                project,
            },
        })
    }

    fn implicit_project(&self) -> Project {
        let doc = &self.docs.project;
        Project {
            name: IMPLICIT_PROJECT.to_string(),
            created: doc.created.unwrap_or_else(Utc::now),
            author: doc.author.clone(),
            description: doc.description.clone(),
        }
    }

    fn check_project(&self, project: &Project) -> Result<()> {
        if project.name != IMPLICIT_PROJECT {
            return Err(Error::NotFound(format!("Project not found: {}", project.name)));
        }
        Ok(())
    }

    /// Apply `f` to a copy of the documents, write all of them, then swap the copy in.
    fn mutate<T>(&mut self, f: impl FnOnce(&mut Documents) -> Result<T>) -> Result<T> {
        let mut next = self.docs.clone();
        let out = f(&mut next)?;

        next.settings.write()?;
        write_json(&self.data_dir.join(NOTES_FILE), &next.notes)?;
        write_json(&self.data_dir.join(PROJECT_FILE), &next.project)?;

        self.docs = next;
        Ok(out)
    }
}

impl ProjectStore for AggregateBackend {
    fn backend_type(&self) -> BackendType {
        BackendType::Aggregate
    }

    fn location(&self) -> String {
        self.data_dir.display().to_string()
    }

    fn create_project(&mut self, name: &str) -> Result<Project> {
        Err(Error::Unsupported(format!(
            "cannot create project '{}': the aggregate backend holds a single project named '{}'",
            name, IMPLICIT_PROJECT
        )))
    }

    fn open_project(&self, name: &str) -> Result<Project> {
        if name != IMPLICIT_PROJECT {
            return Err(Error::NotFound(format!("Project not found: {}", name)));
        }
        Ok(self.implicit_project())
    }

    fn list_projects(&self) -> Result<Vec<String>> {
        Ok(vec![IMPLICIT_PROJECT.to_string()])
    }

    fn delete_project(&mut self, name: &str) -> Result<()> {
        Err(Error::Unsupported(format!(
            "cannot delete project '{}' from the aggregate backend",
            name
        )))
    }

    fn update_project(&mut self, project: &Project, info: &ProjectInfo) -> Result<Project> {
        self.check_project(project)?;
        let mut updated = self.implicit_project();
        info.apply(&mut updated);

        self.mutate(|docs| {
            docs.project.author = updated.author.clone();
            docs.project.description = updated.description.clone();
            Ok(())
        })?;
        Ok(updated)
    }

    fn list_chapters(&self, project: &Project) -> Result<Vec<ChapterRef>> {
        self.check_project(project)?;
        Ok(self
            .docs
            .project
            .chapters
            .iter()
            .enumerate()
            .map(|(i, c)| ChapterRef {
                title: c.title.clone(),
                order: (i + 1) as u32,
                scenes: c.scenes.iter().map(|s| s.title.clone()).collect(),
            })
            .collect())
    }

    fn add_chapter(&mut self, project: &Project, title: &str) -> Result<ChapterRef> {
        validate_title("Chapter title", title)?;
        self.check_project(project)?;

        let order = self.mutate(|docs| {
            let chapters = &mut docs.project.chapters;
            if chapters.iter().any(|c| c.title == title) {
                return Err(Error::AlreadyExists(format!("Chapter already exists: {}", title)));
            }
            chapters.push(ChapterEntry {
                title: title.to_string(),
                content: String::new(),
                scenes: Vec::new(),
            });
            Ok(chapters.len() as u32)
        })?;

        tracing::debug!(chapter = title, order, "added chapter");
        Ok(ChapterRef {
            title: title.to_string(),
            order,
            scenes: Vec::new(),
        })
    }

    fn rename_chapter(&mut self, project: &Project, old: &str, new: &str) -> Result<()> {
        validate_title("Chapter title", new)?;
        self.check_project(project)?;

        self.mutate(|docs| {
            docs.project.chapter(old)?;
            if old != new && docs.project.chapters.iter().any(|c| c.title == new) {
                return Err(Error::AlreadyExists(format!("Chapter already exists: {}", new)));
            }
            docs.project.chapter_mut(old)?.title = new.to_string();
            Ok(())
        })
    }

    fn delete_chapter(&mut self, project: &Project, title: &str) -> Result<()> {
        self.check_project(project)?;
        self.mutate(|docs| {
            let chapters = &mut docs.project.chapters;
            let idx = chapters
                .iter()
                .position(|c| c.title == title)
                .ok_or_else(|| chapter_not_found(title))?;
            chapters.remove(idx);
            Ok(())
        })
    }

    fn add_scene(&mut self, project: &Project, chapter: &str, title: &str) -> Result<SceneRef> {
        validate_title("Scene title", title)?;
        self.check_project(project)?;

        self.mutate(|docs| {
            let entry = docs.project.chapter_mut(chapter)?;
            if entry.scenes.iter().any(|s| s.title == title) {
                return Err(Error::AlreadyExists(format!(
                    "Scene already exists: {} (in chapter {})",
                    title, chapter
                )));
            }
            entry.scenes.push(SceneEntry {
                title: title.to_string(),
                content: String::new(),
            });
            Ok(())
        })?;

        Ok(SceneRef {
            chapter: chapter.to_string(),
            title: title.to_string(),
        })
    }

    fn delete_scene(&mut self, project: &Project, chapter: &str, title: &str) -> Result<()> {
        self.check_project(project)?;
        self.mutate(|docs| {
            let entry = docs.project.chapter_mut(chapter)?;
            let idx = entry
                .scenes
                .iter()
                .position(|s| s.title == title)
                .ok_or_else(|| scene_not_found(chapter, title))?;
            entry.scenes.remove(idx);
            Ok(())
        })
    }

    fn list_characters(&self, project: &Project) -> Result<Vec<Character>> {
        self.check_project(project)?;
        Ok(self.docs.project.characters.clone())
    }

    fn add_character(&mut self, project: &Project, name: &str) -> Result<Character> {
        validate_title("Character name", name)?;
        self.check_project(project)?;

        let character = Character::new(name);
        self.mutate(|docs| {
            if docs.project.characters.iter().any(|c| c.name == name) {
                return Err(Error::AlreadyExists(format!("Character already exists: {}", name)));
            }
            docs.project.characters.push(character.clone());
            Ok(())
        })?;
        Ok(character)
    }

    fn get_character(&self, project: &Project, name: &str) -> Result<Character> {
        self.check_project(project)?;
        self.docs.project.character(name).cloned()
    }

    fn rename_character(&mut self, project: &Project, old: &str, new: &str) -> Result<()> {
        validate_title("Character name", new)?;
        self.check_project(project)?;

        self.mutate(|docs| {
            docs.project.character(old)?;
            if old != new && docs.project.characters.iter().any(|c| c.name == new) {
                return Err(Error::AlreadyExists(format!("Character already exists: {}", new)));
            }
            docs.project.character_mut(old)?.name = new.to_string();
            Ok(())
        })
    }

    fn update_character(
        &mut self,
        project: &Project,
        name: &str,
        update: &CharacterUpdate,
    ) -> Result<Character> {
        self.check_project(project)?;
        update.validate()?;
        self.mutate(|docs| {
            let character = docs.project.character_mut(name)?;
            character.apply(update);
            Ok(character.clone())
        })
    }

    fn delete_character(&mut self, project: &Project, name: &str) -> Result<()> {
        self.check_project(project)?;
        self.mutate(|docs| {
            let characters = &mut docs.project.characters;
            let idx = characters
                .iter()
                .position(|c| c.name == name)
                .ok_or_else(|| character_not_found(name))?;
            characters.remove(idx);
            Ok(())
        })
    }

    fn list_categories(&self, project: &Project) -> Result<Vec<String>> {
        self.check_project(project)?;
        Ok(self.docs.notes.collections.keys().cloned().collect())
    }

    fn list_notes(&self, project: &Project, category: Option<&str>) -> Result<Vec<NoteRef>> {
        self.check_project(project)?;
        let collections = &self.docs.notes.collections;

        let to_refs = |category: &str, notes: &[NoteEntry]| -> Vec<NoteRef> {
            notes
                .iter()
                .map(|n| NoteRef {
                    category: category.to_string(),
                    title: n.title.clone(),
                })
                .collect()
        };

        match category {
            Some(category) => Ok(collections
                .get(category)
                .map(|notes| to_refs(category, notes.as_slice()))
                .unwrap_or_default()),
            None => Ok(collections
                .iter()
                .flat_map(|(category, notes)| to_refs(category.as_str(), notes.as_slice()))
                .collect()),
        }
    }

    fn add_note(
        &mut self,
        project: &Project,
        category: &str,
        title: &str,
        content: &str,
    ) -> Result<NoteRef> {
        validate_title("Note category", category)?;
        validate_title("Note title", title)?;
        self.check_project(project)?;

        self.mutate(|docs| {
            let notes = docs
                .notes
                .collections
                .entry(category.to_string())
                .or_default();
            if notes.iter().any(|n| n.title == title) {
                return Err(Error::AlreadyExists(format!(
                    "Note already exists: {} (in category {})",
                    title, category
                )));
            }
            notes.push(NoteEntry {
                title: title.to_string(),
                content: content.to_string(),
            });
            Ok(())
        })?;

        Ok(NoteRef {
            category: category.to_string(),
            title: title.to_string(),
        })
    }

    fn delete_note(&mut self, project: &Project, category: &str, title: &str) -> Result<()> {
        self.check_project(project)?;
        self.mutate(|docs| {
            let notes = docs
                .notes
                .collections
                .get_mut(category)
                .ok_or_else(|| category_not_found(category))?;
            let idx = notes
                .iter()
                .position(|n| n.title == title)
                .ok_or_else(|| note_not_found(category, title))?;
            notes.remove(idx);
            Ok(())
        })
    }

    fn get_content(&self, project: &Project, locator: &ContentLocator) -> Result<String> {
        locator.validate()?;
        self.check_project(project)?;
        let doc = &self.docs.project;

        match locator {
            ContentLocator::Chapter { title } => Ok(doc.chapter(title)?.content.clone()),
            ContentLocator::Scene { chapter, scene } => {
                Ok(doc.chapter(chapter)?.scene(scene)?.content.clone())
            }
            ContentLocator::Character { name } => Ok(doc.character(name)?.description.clone()),
            ContentLocator::PlanningNote { category, title } => {
                let notes = self
                    .docs
                    .notes
                    .collections
                    .get(category)
                    .ok_or_else(|| category_not_found(category))?;
                notes
                    .iter()
                    .find(|n| n.title == *title)
                    .map(|n| n.content.clone())
                    .ok_or_else(|| note_not_found(category, title))
            }
        }
    }

    fn set_content(&mut self, project: &Project, locator: &ContentLocator, text: &str) -> Result<()> {
        locator.validate()?;
        self.check_project(project)?;

        self.mutate(|docs| {
            let target = match locator {
                ContentLocator::Chapter { title } => &mut docs.project.chapter_mut(title)?.content,
                ContentLocator::Scene { chapter, scene } => {
                    &mut docs.project.chapter_mut(chapter)?.scene_mut(scene)?.content
                }
                ContentLocator::Character { name } => {
                    &mut docs.project.character_mut(name)?.description
                }
                ContentLocator::PlanningNote { category, title } => {
                    let notes = docs
                        .notes
                        .collections
                        .get_mut(category)
                        .ok_or_else(|| category_not_found(category))?;
                    &mut notes
                        .iter_mut()
                        .find(|n| n.title == *title)
                        .ok_or_else(|| note_not_found(category, title))?
                        .content
                }
            };
            *target = text.to_string();
            Ok(())
        })?;

        tracing::debug!(locator = %locator, bytes = text.len(), "stored content");
        Ok(())
    }

    fn get_setting(&self, key: &str, default: Value) -> Value {
        self.docs.settings.get(key, default)
    }

    fn set_setting(&mut self, key: &str, value: Value) -> Result<()> {
        validate_key(key)?;
        self.mutate(|docs| {
            docs.settings.insert(key, value);
            Ok(())
        })
    }

    fn settings(&self) -> BTreeMap<String, Value> {
        self.docs.settings.values().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CharacterRole;
    use crate::test_utils::TestEnv;
    use serde_json::json;

    fn untitled(store: &AggregateBackend) -> Project {
        store.open_project(IMPLICIT_PROJECT).unwrap()
    }

    #[test]
    fn test_single_implicit_project() {
        let env = TestEnv::new();
        let mut store = env.aggregate();

        assert_eq!(store.list_projects().unwrap(), vec!["Untitled"]);
        assert!(store.open_project("Untitled").is_ok());
        assert!(matches!(store.open_project("Demo"), Err(Error::NotFound(_))));
        assert!(matches!(store.create_project("Demo"), Err(Error::Unsupported(_))));
        assert!(matches!(store.delete_project("Untitled"), Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_foreign_handle_rejected() {
        let env = TestEnv::new();
        let mut store = env.aggregate();
        let other = Project::new("Elsewhere");
        assert!(matches!(store.add_chapter(&other, "One"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_chapters_keep_insertion_order() {
        let env = TestEnv::new();
        let mut store = env.aggregate();
        let project = untitled(&store);

        store.add_chapter(&project, "Zeta").unwrap();
        store.add_chapter(&project, "Alpha").unwrap();

        let chapters = store.list_chapters(&project).unwrap();
        let titles: Vec<_> = chapters.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Zeta", "Alpha"]);
        assert_eq!(chapters[1].order, 2);
    }

    #[test]
    fn test_duplicate_chapter_rejected() {
        let env = TestEnv::new();
        let mut store = env.aggregate();
        let project = untitled(&store);

        store.add_chapter(&project, "One").unwrap();
        assert!(matches!(
            store.add_chapter(&project, "One"),
            Err(Error::AlreadyExists(_))
        ));
        assert_eq!(store.list_chapters(&project).unwrap().len(), 1);
    }

    #[test]
    fn test_mutation_writes_all_documents() {
        let env = TestEnv::new();
        let mut store = env.aggregate();
        let project = untitled(&store);
        store.add_chapter(&project, "One").unwrap();

        for file in ["settings.json", NOTES_FILE, PROJECT_FILE] {
            assert!(env.data_path().join(file).exists(), "{} missing", file);
        }

        let raw: Value =
            serde_json::from_str(&fs::read_to_string(env.data_path().join(PROJECT_FILE)).unwrap())
                .unwrap();
        assert_eq!(raw["chapters"][0]["title"], "One");
        assert_eq!(raw["chapters"][0]["content"], "");
        assert!(raw["chapters"][0]["scenes"].as_array().unwrap().is_empty());

        let notes: Value =
            serde_json::from_str(&fs::read_to_string(env.data_path().join(NOTES_FILE)).unwrap())
                .unwrap();
        assert!(notes["collections"]["Outlines"].is_array());
    }

    #[test]
    fn test_scene_content_persists_across_reopen() {
        let env = TestEnv::new();
        {
            let mut store = env.aggregate();
            let project = untitled(&store);
            store.add_chapter(&project, "One").unwrap();
            store.add_scene(&project, "One", "Open").unwrap();
            store
                .set_content(&project, &ContentLocator::scene("One", "Open"), "It was dark.")
                .unwrap();
        }

        let store = env.aggregate();
        let project = untitled(&store);
        assert_eq!(
            store
                .get_content(&project, &ContentLocator::scene("One", "Open"))
                .unwrap(),
            "It was dark."
        );
        assert_eq!(store.list_chapters(&project).unwrap()[0].scenes, vec!["Open"]);
    }

    #[test]
    fn test_delete_chapter_cascades_to_scenes() {
        let env = TestEnv::new();
        let mut store = env.aggregate();
        let project = untitled(&store);
        store.add_chapter(&project, "One").unwrap();
        store.add_scene(&project, "One", "Open").unwrap();

        store.delete_chapter(&project, "One").unwrap();
        assert!(matches!(
            store.get_content(&project, &ContentLocator::scene("One", "Open")),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            store.delete_chapter(&project, "One"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_character_lifecycle() {
        let env = TestEnv::new();
        let mut store = env.aggregate();
        let project = untitled(&store);

        let mira = store.add_character(&project, "Mira").unwrap();
        assert_eq!(mira.role, CharacterRole::Supporting);

        store.rename_character(&project, "Mira", "Mira Voss").unwrap();
        assert!(matches!(
            store.get_character(&project, "Mira"),
            Err(Error::NotFound(_))
        ));

        let updated = store
            .update_character(
                &project,
                "Mira Voss",
                &CharacterUpdate::new()
                    .with_role(CharacterRole::Protagonist)
                    .with_age("34"),
            )
            .unwrap();
        assert_eq!(updated.role, CharacterRole::Protagonist);
        assert_eq!(store.get_character(&project, "Mira Voss").unwrap().age, "34");

        store
            .set_content(&project, &ContentLocator::character("Mira Voss"), "Sailor.")
            .unwrap();
        assert_eq!(
            store.get_character(&project, "Mira Voss").unwrap().description,
            "Sailor."
        );

        store.delete_character(&project, "Mira Voss").unwrap();
        assert!(store.list_characters(&project).unwrap().is_empty());
    }

    #[test]
    fn test_rename_onto_existing_name_rejected() {
        let env = TestEnv::new();
        let mut store = env.aggregate();
        let project = untitled(&store);
        store.add_character(&project, "Ash").unwrap();
        store.add_character(&project, "Mira").unwrap();

        assert!(matches!(
            store.rename_character(&project, "Ash", "Mira"),
            Err(Error::AlreadyExists(_))
        ));
        assert!(store.get_character(&project, "Ash").is_ok());
    }

    #[test]
    fn test_notes_and_default_categories() {
        let env = TestEnv::new();
        let mut store = env.aggregate();
        let project = untitled(&store);

        assert_eq!(
            store.list_categories(&project).unwrap(),
            vec!["Characters", "Notes", "Outlines", "Plot"]
        );

        store.add_note(&project, "Plot", "Twist", "The butler.").unwrap();
        store.add_note(&project, "Research", "Ships", "").unwrap();

        let locator = ContentLocator::note("Plot", "Twist");
        assert_eq!(store.get_content(&project, &locator).unwrap(), "The butler.");
        assert_eq!(store.list_notes(&project, Some("Research")).unwrap().len(), 1);
        assert_eq!(store.list_notes(&project, None).unwrap().len(), 2);

        store.delete_note(&project, "Plot", "Twist").unwrap();
        assert!(matches!(
            store.get_content(&project, &locator),
            Err(Error::NotFound(_))
        ));
        assert!(store.list_notes(&project, Some("Nope")).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_documents_fall_back_to_defaults() {
        let env = TestEnv::new();
        fs::write(env.data_path().join(PROJECT_FILE), "{ nope").unwrap();
        fs::write(env.data_path().join(NOTES_FILE), "[1, 2, 3]").unwrap();
        fs::write(env.data_path().join("settings.json"), "garbage").unwrap();

        let store = env.aggregate();
        let project = untitled(&store);
        assert!(store.list_chapters(&project).unwrap().is_empty());
        assert_eq!(store.list_categories(&project).unwrap().len(), 4);
        assert_eq!(store.get_setting("theme", json!("dark")), json!("dark"));
    }

    #[test]
    fn test_settings_and_project_info_persist() {
        let env = TestEnv::new();
        {
            let mut store = env.aggregate();
            let project = untitled(&store);
            store.set_setting("theme", json!("light")).unwrap();
            let updated = store
                .update_project(
                    &project,
                    &ProjectInfo {
                        author: Some("A. Writer".to_string()),
                        description: None,
                    },
                )
                .unwrap();
            assert_eq!(updated.author.as_deref(), Some("A. Writer"));
        }

        let store = env.aggregate();
        assert_eq!(store.get_setting("theme", json!("dark")), json!("light"));
        assert_eq!(untitled(&store).author.as_deref(), Some("A. Writer"));
    }
}
