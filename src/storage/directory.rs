//! Directory backend: one folder per project, one markdown file per content unit.
//!
//! Layout of `<projects-dir>/<project>/`:
//! - `project.json` - metadata index (name, created, author, description, chapters)
//! - `chapters/NN_slug.md` - chapter body followed by its fenced scenes
//! - `characters/slug.md` - character profile with fixed sections
//! - `planning/<category>/slug.md` - planning notes
//!
//! Titles are always re-derived from the files, so external edits show up on
//! the next listing. The index is kept in step on every mutation but never
//! overrides what the files say.

use super::markdown::{self, ChapterDocument, CharacterDocument, SceneSection};
use super::{
    BackendType, CHAPTER_SLUG_MAX_LEN, ProjectStore, SettingsFile, list_markdown_files,
    list_subdirectories, read_json_or_default, slugify, slugify_truncated, title_from_stem,
    unique_markdown_path, validate_path_component, write_atomic, write_json,
};
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

pub const INDEX_FILE: &str = "project.json";
pub const CHAPTERS_DIR: &str = "chapters";
pub const CHARACTERS_DIR: &str = "characters";
pub const PLANNING_DIR: &str = "planning";

/// Planning categories created with every new project.
pub const DEFAULT_CATEGORIES: [&str; 5] = ["plot", "arcs", "world", "ideas", "research"];

pub const WELCOME_FILE: &str = "01_welcome.md";
pub const WELCOME_TITLE: &str = "Welcome to Your Novel!";

const WELCOME_BODY: &str = "This is your first chapter. You can:

- **Edit this text** directly
- **Create new chapters** with `novelist chapter add`
- **Add scenes** to break up your chapters
- **Manage characters** with `novelist character`
- **Plan your story** with `novelist note`

## Tips

- Each chapter is a separate markdown file
- Use **#** for headings, **bold** for emphasis
- Export your finished book with `novelist export`

Happy writing!
";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ChapterIndexEntry {
    file: String,
    title: String,
    #[serde(default)]
    scenes: Vec<String>,
}

/// Contents of `project.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProjectIndex {
    name: String,
    #[serde(default)]
    created: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    chapters: Vec<ChapterIndexEntry>,
    /// Highest chapter ordinal ever handed out
    #[serde(default)]
    last_ordinal: u32,
}

impl ProjectIndex {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            created: Utc::now().to_rfc3339(),
            author: String::new(),
            description: String::new(),
            chapters: Vec::new(),
            last_ordinal: 0,
        }
    }

    fn entry_mut(&mut self, file: &str) -> Option<&mut ChapterIndexEntry> {
        self.chapters.iter_mut().find(|c| c.file == file)
    }
}

/// A chapter file with its parsed content.
struct ChapterFile {
    path: PathBuf,
    file: String,
    order: u32,
    text: String,
    doc: ChapterDocument,
}

impl ChapterFile {
    fn to_ref(&self) -> ChapterRef {
        ChapterRef {
            title: self.doc.title.clone(),
            order: self.order,
            scenes: self.doc.scene_titles(),
        }
    }
}

struct CharacterFile {
    path: PathBuf,
    doc: CharacterDocument,
}

struct NoteFile {
    path: PathBuf,
    title: String,
    content: String,
}

/// Chapter ordinal from a `NN_slug` file stem; stems without one sort first.
fn ordinal_of(stem: &str) -> u32 {
    stem.split_once('_')
        .and_then(|(prefix, _)| prefix.parse().ok())
        .unwrap_or(0)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn optional(s: &str) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Remove a directory left empty by a failed write; failure is only logged.
fn remove_empty_dir(path: &Path) {
    if let Err(e) = fs::remove_dir(path) {
        tracing::warn!(path = %path.display(), error = %e, "failed to remove empty directory");
    }
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

fn note_not_found(category: &str, title: &str) -> Error {
    Error::NotFound(format!("Note not found: {} (in category {})", title, category))
}

/// Markdown-directory store. One subdirectory of `base_dir` per project.
#[derive(Debug)]
pub struct DirectoryBackend {
    base_dir: PathBuf,
    settings: SettingsFile,
    welcome_chapter: bool,
}

impl DirectoryBackend {
    /// Open the store rooted at `projects_dir`, with settings kept in `data_dir`.
    pub fn open(projects_dir: &Path, data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(projects_dir)?;
        Ok(Self {
            base_dir: projects_dir.to_path_buf(),
            settings: SettingsFile::load(data_dir),
            welcome_chapter: false,
        })
    }

    /// Write the welcome chapter into every newly created project.
    pub fn with_welcome_chapter(mut self, enabled: bool) -> Self {
        self.welcome_chapter = enabled;
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn project_dir(&self, name: &str) -> Result<PathBuf> {
        validate_path_component("Project name", name)?;
        let dir = self.base_dir.join(name);
        if !dir.is_dir() {
            return Err(Error::NotFound(format!("Project not found: {}", name)));
        }
        Ok(dir)
    }

    // === Index ===

    fn load_index(&self, dir: &Path, name: &str) -> ProjectIndex {
        let index: Option<ProjectIndex> = read_json_or_default(&dir.join(INDEX_FILE));
        index.unwrap_or_else(|| {
            let mut index = ProjectIndex::new(name);
            if let Ok(modified) = fs::metadata(dir).and_then(|m| m.modified()) {
                index.created = DateTime::<Utc>::from(modified).to_rfc3339();
            }
            index
        })
    }

    fn write_index(&self, dir: &Path, index: &ProjectIndex) -> Result<()> {
        write_json(&dir.join(INDEX_FILE), index)
    }

    /// Write the index; if that fails, put `path` back the way it was.
    ///
    /// `previous` is the file's old text, or `None` if the file is new.
    fn commit_index(
        &self,
        dir: &Path,
        index: &ProjectIndex,
        path: &Path,
        previous: Option<&str>,
    ) -> Result<()> {
        let Err(e) = self.write_index(dir, index) else {
            return Ok(());
        };

        let restored = match previous {
            Some(text) => write_atomic(path, text),
            None => fs::remove_file(path).map_err(Error::from),
        };
        if let Err(rollback) = restored {
            tracing::warn!(path = %path.display(), error = %rollback, "failed to roll back file");
        }
        Err(e)
    }

    fn project_from_index(&self, dir: &Path, name: &str) -> Project {
        let index = self.load_index(dir, name);
        let created = DateTime::parse_from_rfc3339(&index.created)
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());
        Project {
            name: name.to_string(),
            created,
            author: optional(&index.author),
            description: optional(&index.description),
        }
    }

    // === Chapters ===

    /// All chapter files, ordered by filename ordinal then file name.
    fn chapter_files(&self, dir: &Path) -> Result<Vec<ChapterFile>> {
        let mut chapters = Vec::new();
        for path in list_markdown_files(&dir.join(CHAPTERS_DIR))? {
            let text = fs::read_to_string(&path)?;
            let stem = file_stem(&path);
            let doc = ChapterDocument::parse(&text, &title_from_stem(&stem));
            chapters.push(ChapterFile {
                file: file_name(&path),
                order: ordinal_of(&stem),
                path,
                text,
                doc,
            });
        }
        chapters.sort_by(|a, b| (a.order, &a.file).cmp(&(b.order, &b.file)));
        Ok(chapters)
    }

    fn find_chapter(&self, dir: &Path, title: &str) -> Result<ChapterFile> {
        self.chapter_files(dir)?
            .into_iter()
            .find(|c| c.doc.title == title)
            .ok_or_else(|| chapter_not_found(title))
    }

    /// Rewrite a chapter file and mirror its title and scenes into the index.
    fn save_chapter(&self, project: &Project, dir: &Path, chapter: &ChapterFile) -> Result<()> {
        let rendered = chapter.doc.render();
        if rendered == chapter.text {
            return Ok(());
        }
        write_atomic(&chapter.path, &rendered)?;

        let mut index = self.load_index(dir, &project.name);
        if let Some(entry) = index.entry_mut(&chapter.file) {
            entry.title = chapter.doc.title.clone();
            entry.scenes = chapter.doc.scene_titles();
        }
        self.commit_index(dir, &index, &chapter.path, Some(&chapter.text))
    }

    fn write_welcome_chapter(&self, dir: &Path, index: &mut ProjectIndex) -> Result<()> {
        let doc = ChapterDocument {
            title: WELCOME_TITLE.to_string(),
            body: WELCOME_BODY.to_string(),
            scenes: Vec::new(),
        };
        write_atomic(&dir.join(CHAPTERS_DIR).join(WELCOME_FILE), &doc.render())?;
        index.chapters.push(ChapterIndexEntry {
            file: WELCOME_FILE.to_string(),
            title: WELCOME_TITLE.to_string(),
            scenes: Vec::new(),
        });
        index.last_ordinal = index.last_ordinal.max(1);
        Ok(())
    }

    // === Characters ===

    fn character_files(&self, dir: &Path) -> Result<Vec<CharacterFile>> {
        let mut characters = Vec::new();
        for path in list_markdown_files(&dir.join(CHARACTERS_DIR))? {
            let text = fs::read_to_string(&path)?;
            let doc = CharacterDocument::parse(&text, &title_from_stem(&file_stem(&path)));
            characters.push(CharacterFile { path, doc });
        }
        Ok(characters)
    }

    fn find_character(&self, dir: &Path, name: &str) -> Result<CharacterFile> {
        self.character_files(dir)?
            .into_iter()
            .find(|c| c.doc.name == name)
            .ok_or_else(|| character_not_found(name))
    }

    // === Notes ===

    fn category_dir(&self, dir: &Path, category: &str) -> Result<PathBuf> {
        validate_path_component("Note category", category)?;
        Ok(dir.join(PLANNING_DIR).join(category.to_lowercase()))
    }

    fn note_files(&self, category_dir: &Path) -> Result<Vec<NoteFile>> {
        let mut notes = Vec::new();
        for path in list_markdown_files(category_dir)? {
            let text = fs::read_to_string(&path)?;
            let (title, content) = markdown::parse_note(&text, &file_stem(&path));
            notes.push(NoteFile {
                path,
                title,
                content,
            });
        }
        Ok(notes)
    }

    fn find_note(&self, dir: &Path, category: &str, title: &str) -> Result<NoteFile> {
        let category_dir = self.category_dir(dir, category)?;
        self.note_files(&category_dir)?
            .into_iter()
            .find(|n| n.title == title)
            .ok_or_else(|| note_not_found(category, title))
    }

    fn note_refs(&self, dir: &Path, category: &str) -> Result<Vec<NoteRef>> {
        let category_dir = self.category_dir(dir, category)?;
        Ok(self
            .note_files(&category_dir)?
            .into_iter()
            .map(|n| NoteRef {
                category: category.to_lowercase(),
                title: n.title,
            })
            .collect())
    }
}

impl ProjectStore for DirectoryBackend {
    fn backend_type(&self) -> BackendType {
        BackendType::Directory
    }

    fn location(&self) -> String {
        self.base_dir.display().to_string()
    }

    fn create_project(&mut self, name: &str) -> Result<Project> {
        validate_path_component("Project name", name)?;
        let dir = self.base_dir.join(name);
        if dir.exists() {
            return Err(Error::AlreadyExists(format!("Project already exists: {}", name)));
        }
        fs::create_dir_all(&self.base_dir)?;
        fs::create_dir(&dir)?;

        let populate = || -> Result<()> {
            fs::create_dir(dir.join(CHAPTERS_DIR))?;
            fs::create_dir(dir.join(CHARACTERS_DIR))?;
            for category in DEFAULT_CATEGORIES {
                fs::create_dir_all(dir.join(PLANNING_DIR).join(category))?;
            }

            let mut index = ProjectIndex::new(name);
            if self.welcome_chapter {
                self.write_welcome_chapter(&dir, &mut index)?;
            }
            self.write_index(&dir, &index)
        };

        if let Err(e) = populate() {
            if let Err(cleanup) = fs::remove_dir_all(&dir) {
                tracing::warn!(path = %dir.display(), error = %cleanup, "failed to clean up project directory");
            }
            return Err(e);
        }

        tracing::info!(project = name, path = %dir.display(), "created project");
        Ok(self.project_from_index(&dir, name))
    }

    fn open_project(&self, name: &str) -> Result<Project> {
        let dir = self.project_dir(name)?;
        Ok(self.project_from_index(&dir, name))
    }

    fn list_projects(&self) -> Result<Vec<String>> {
        list_subdirectories(&self.base_dir)
    }

    fn delete_project(&mut self, name: &str) -> Result<()> {
        let dir = self.project_dir(name)?;
        fs::remove_dir_all(&dir)?;
        tracing::info!(project = name, path = %dir.display(), "deleted project");
        Ok(())
    }

    fn update_project(&mut self, project: &Project, info: &ProjectInfo) -> Result<Project> {
        let dir = self.project_dir(&project.name)?;
        let mut updated = self.project_from_index(&dir, &project.name);
        info.apply(&mut updated);

        let mut index = self.load_index(&dir, &project.name);
        index.author = updated.author.clone().unwrap_or_default();
        index.description = updated.description.clone().unwrap_or_default();
        self.write_index(&dir, &index)?;
        Ok(updated)
    }

    fn list_chapters(&self, project: &Project) -> Result<Vec<ChapterRef>> {
        let dir = self.project_dir(&project.name)?;
        Ok(self.chapter_files(&dir)?.iter().map(ChapterFile::to_ref).collect())
    }

    fn add_chapter(&mut self, project: &Project, title: &str) -> Result<ChapterRef> {
        validate_title("Chapter title", title)?;
        let dir = self.project_dir(&project.name)?;
        let existing = self.chapter_files(&dir)?;
        if existing.iter().any(|c| c.doc.title == title) {
            return Err(Error::AlreadyExists(format!("Chapter already exists: {}", title)));
        }

        let mut index = self.load_index(&dir, &project.name);
        let highest_on_disk = existing.iter().map(|c| c.order).max().unwrap_or(0);
        let order = index.last_ordinal.max(highest_on_disk) + 1;

        let slug = slugify_truncated(title, CHAPTER_SLUG_MAX_LEN);
        let path = unique_markdown_path(&dir.join(CHAPTERS_DIR), &format!("{:02}_{}", order, slug));
        write_atomic(&path, &ChapterDocument::new(title).render())?;

        index.chapters.push(ChapterIndexEntry {
            file: file_name(&path),
            title: title.to_string(),
            scenes: Vec::new(),
        });
        index.last_ordinal = order;
        self.commit_index(&dir, &index, &path, None)?;

        tracing::debug!(project = %project.name, chapter = title, path = %path.display(), "added chapter");
        Ok(ChapterRef {
            title: title.to_string(),
            order,
            scenes: Vec::new(),
        })
    }

    fn rename_chapter(&mut self, project: &Project, old: &str, new: &str) -> Result<()> {
        validate_title("Chapter title", new)?;
        let dir = self.project_dir(&project.name)?;
        let chapters = self.chapter_files(&dir)?;
        if !chapters.iter().any(|c| c.doc.title == old) {
            return Err(chapter_not_found(old));
        }
        if old != new && chapters.iter().any(|c| c.doc.title == new) {
            return Err(Error::AlreadyExists(format!("Chapter already exists: {}", new)));
        }

        let mut chapter = chapters
            .into_iter()
            .find(|c| c.doc.title == old)
            .ok_or_else(|| chapter_not_found(old))?;
        chapter.doc.title = new.to_string();
        self.save_chapter(project, &dir, &chapter)
    }

    fn delete_chapter(&mut self, project: &Project, title: &str) -> Result<()> {
        let dir = self.project_dir(&project.name)?;
        let chapter = self.find_chapter(&dir, title)?;
        fs::remove_file(&chapter.path)?;

        let mut index = self.load_index(&dir, &project.name);
        index.chapters.retain(|c| c.file != chapter.file);
        self.commit_index(&dir, &index, &chapter.path, Some(&chapter.text))?;

        tracing::debug!(project = %project.name, chapter = title, "deleted chapter");
        Ok(())
    }

    fn add_scene(&mut self, project: &Project, chapter: &str, title: &str) -> Result<SceneRef> {
        validate_title("Scene title", title)?;
        let dir = self.project_dir(&project.name)?;
        let mut file = self.find_chapter(&dir, chapter)?;
        if file.doc.scene(title).is_some() {
            return Err(Error::AlreadyExists(format!(
                "Scene already exists: {} (in chapter {})",
                title, chapter
            )));
        }

        file.doc.scenes.push(SceneSection {
            title: title.to_string(),
            content: String::new(),
        });
        self.save_chapter(project, &dir, &file)?;

        Ok(SceneRef {
            chapter: chapter.to_string(),
            title: title.to_string(),
        })
    }

    fn delete_scene(&mut self, project: &Project, chapter: &str, title: &str) -> Result<()> {
        let dir = self.project_dir(&project.name)?;
        let mut file = self.find_chapter(&dir, chapter)?;
        let idx = file
            .doc
            .scenes
            .iter()
            .position(|s| s.title == title)
            .ok_or_else(|| scene_not_found(chapter, title))?;
        file.doc.scenes.remove(idx);
        self.save_chapter(project, &dir, &file)
    }

    fn list_characters(&self, project: &Project) -> Result<Vec<Character>> {
        let dir = self.project_dir(&project.name)?;
        Ok(self
            .character_files(&dir)?
            .iter()
            .map(|c| c.doc.to_character())
            .collect())
    }

    fn add_character(&mut self, project: &Project, name: &str) -> Result<Character> {
        validate_title("Character name", name)?;
        let dir = self.project_dir(&project.name)?;
        if self.character_files(&dir)?.iter().any(|c| c.doc.name == name) {
            return Err(Error::AlreadyExists(format!("Character already exists: {}", name)));
        }

        let doc = CharacterDocument::new(name);
        let path = unique_markdown_path(&dir.join(CHARACTERS_DIR), &slugify(name));
        write_atomic(&path, &doc.render())?;

        tracing::debug!(project = %project.name, character = name, path = %path.display(), "added character");
        Ok(doc.to_character())
    }

    fn get_character(&self, project: &Project, name: &str) -> Result<Character> {
        let dir = self.project_dir(&project.name)?;
        Ok(self.find_character(&dir, name)?.doc.to_character())
    }

    fn rename_character(&mut self, project: &Project, old: &str, new: &str) -> Result<()> {
        validate_title("Character name", new)?;
        let dir = self.project_dir(&project.name)?;
        let characters = self.character_files(&dir)?;
        if !characters.iter().any(|c| c.doc.name == old) {
            return Err(character_not_found(old));
        }
        if old != new && characters.iter().any(|c| c.doc.name == new) {
            return Err(Error::AlreadyExists(format!("Character already exists: {}", new)));
        }

        let mut file = characters
            .into_iter()
            .find(|c| c.doc.name == old)
            .ok_or_else(|| character_not_found(old))?;
        file.doc.name = new.to_string();
        write_atomic(&file.path, &file.doc.render())
    }

    fn update_character(
        &mut self,
        project: &Project,
        name: &str,
        update: &CharacterUpdate,
    ) -> Result<Character> {
        update.validate()?;
        let dir = self.project_dir(&project.name)?;
        let mut file = self.find_character(&dir, name)?;
        let mut character = file.doc.to_character();
        character.apply(update);
        file.doc.update_from(&character);
        write_atomic(&file.path, &file.doc.render())?;
        Ok(character)
    }

    fn delete_character(&mut self, project: &Project, name: &str) -> Result<()> {
        let dir = self.project_dir(&project.name)?;
        let file = self.find_character(&dir, name)?;
        fs::remove_file(&file.path)?;
        tracing::debug!(project = %project.name, character = name, "deleted character");
        Ok(())
    }

    fn list_categories(&self, project: &Project) -> Result<Vec<String>> {
        let dir = self.project_dir(&project.name)?;
        list_subdirectories(&dir.join(PLANNING_DIR))
    }

    fn list_notes(&self, project: &Project, category: Option<&str>) -> Result<Vec<NoteRef>> {
        let dir = self.project_dir(&project.name)?;
        match category {
            Some(category) => self.note_refs(&dir, category),
            None => {
                let mut notes = Vec::new();
                for category in list_subdirectories(&dir.join(PLANNING_DIR))? {
                    notes.extend(self.note_refs(&dir, &category)?);
                }
                Ok(notes)
            }
        }
    }

    fn add_note(
        &mut self,
        project: &Project,
        category: &str,
        title: &str,
        content: &str,
    ) -> Result<NoteRef> {
        validate_title("Note title", title)?;
        let dir = self.project_dir(&project.name)?;
        let category_dir = self.category_dir(&dir, category)?;
        if self.note_files(&category_dir)?.iter().any(|n| n.title == title) {
            return Err(Error::AlreadyExists(format!(
                "Note already exists: {} (in category {})",
                title, category
            )));
        }

        let new_category = !category_dir.exists();
        fs::create_dir_all(&category_dir)?;
        let path = unique_markdown_path(&category_dir, &slugify(title));
        if let Err(e) = write_atomic(&path, &markdown::render_note(title, content)) {
            if new_category {
                remove_empty_dir(&category_dir);
            }
            return Err(e);
        }

        Ok(NoteRef {
            category: category.to_lowercase(),
            title: title.to_string(),
        })
    }

    fn delete_note(&mut self, project: &Project, category: &str, title: &str) -> Result<()> {
        let dir = self.project_dir(&project.name)?;
        let note = self.find_note(&dir, category, title)?;
        fs::remove_file(&note.path)?;
        Ok(())
    }

    fn get_content(&self, project: &Project, locator: &ContentLocator) -> Result<String> {
        locator.validate()?;
        let dir = self.project_dir(&project.name)?;

        match locator {
            ContentLocator::Chapter { title } => Ok(self.find_chapter(&dir, title)?.doc.body),
            ContentLocator::Scene { chapter, scene } => {
                let file = self.find_chapter(&dir, chapter)?;
                file.doc
                    .scene(scene)
                    .map(|s| s.content.clone())
                    .ok_or_else(|| scene_not_found(chapter, scene))
            }
            ContentLocator::Character { name } => {
                Ok(self.find_character(&dir, name)?.doc.background)
            }
            ContentLocator::PlanningNote { category, title } => {
                Ok(self.find_note(&dir, category, title)?.content)
            }
        }
    }

    fn set_content(&mut self, project: &Project, locator: &ContentLocator, text: &str) -> Result<()> {
        locator.validate()?;
        let dir = self.project_dir(&project.name)?;

        match locator {
            ContentLocator::Chapter { title } => {
                let mut file = self.find_chapter(&dir, title)?;
                file.doc.body = text.to_string();
                self.save_chapter(project, &dir, &file)?;
            }
            ContentLocator::Scene { chapter, scene } => {
                let mut file = self.find_chapter(&dir, chapter)?;
                file.doc
                    .scene_mut(scene)
                    .ok_or_else(|| scene_not_found(chapter, scene))?
                    .content = text.to_string();
                self.save_chapter(project, &dir, &file)?;
            }
            ContentLocator::Character { name } => {
                let mut file = self.find_character(&dir, name)?;
                file.doc.background = text.to_string();
                write_atomic(&file.path, &file.doc.render())?;
            }
            ContentLocator::PlanningNote { category, title } => {
                let note = self.find_note(&dir, category, title)?;
                write_atomic(&note.path, &markdown::render_note(&note.title, text))?;
            }
        }

        tracing::debug!(project = %project.name, locator = %locator, bytes = text.len(), "stored content");
        Ok(())
    }

    fn get_setting(&self, key: &str, default: Value) -> Value {
        self.settings.get(key, default)
    }

    fn set_setting(&mut self, key: &str, value: Value) -> Result<()> {
        self.settings.set(key, value)
    }

    fn settings(&self) -> BTreeMap<String, Value> {
        self.settings.values().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CharacterRole;
    use crate::test_utils::TestEnv;
    use serde_json::json;

    fn demo(env: &TestEnv) -> (DirectoryBackend, Project) {
        let mut store = env.directory();
        let project = store.create_project("Demo").unwrap();
        (store, project)
    }

    fn chapter_file_names(env: &TestEnv) -> Vec<String> {
        list_markdown_files(&env.projects_path().join("Demo").join(CHAPTERS_DIR))
            .unwrap()
            .iter()
            .map(|p| file_name(p))
            .collect()
    }

    #[test]
    fn test_create_project_layout() {
        let env = TestEnv::new();
        let (_store, project) = demo(&env);
        let dir = env.projects_path().join("Demo");

        assert_eq!(project.name, "Demo");
        assert!(dir.join(CHAPTERS_DIR).is_dir());
        assert!(dir.join(CHARACTERS_DIR).is_dir());
        for category in DEFAULT_CATEGORIES {
            assert!(dir.join(PLANNING_DIR).join(category).is_dir());
        }

        let index: Value =
            serde_json::from_str(&fs::read_to_string(dir.join(INDEX_FILE)).unwrap()).unwrap();
        assert_eq!(index["name"], "Demo");
        assert_eq!(index["author"], "");
        assert!(index["chapters"].as_array().unwrap().is_empty());
        assert!(chapter_file_names(&env).is_empty());
    }

    #[test]
    fn test_duplicate_and_missing_projects() {
        let env = TestEnv::new();
        let (mut store, _) = demo(&env);

        assert!(matches!(
            store.create_project("Demo"),
            Err(Error::AlreadyExists(_))
        ));
        assert!(matches!(store.open_project("Nope"), Err(Error::NotFound(_))));
        assert!(matches!(
            store.create_project("../escape"),
            Err(Error::InvalidArgument(_))
        ));

        store.create_project("Another").unwrap();
        assert_eq!(store.list_projects().unwrap(), vec!["Another", "Demo"]);
    }

    #[test]
    fn test_welcome_chapter_when_enabled() {
        let env = TestEnv::new();
        let mut store = env.directory().with_welcome_chapter(true);
        let project = store.create_project("Demo").unwrap();

        assert_eq!(chapter_file_names(&env), vec![WELCOME_FILE]);
        let chapters = store.list_chapters(&project).unwrap();
        assert_eq!(chapters[0].title, WELCOME_TITLE);
        assert_eq!(chapters[0].order, 1);

        let next = store.add_chapter(&project, "Intro").unwrap();
        assert_eq!(next.order, 2);
    }

    #[test]
    fn test_chapter_file_naming() {
        let env = TestEnv::new();
        let (mut store, project) = demo(&env);
        store.add_chapter(&project, "The Long Night").unwrap();
        store
            .add_chapter(&project, "An Extraordinarily Long Chapter Title Indeed")
            .unwrap();

        assert_eq!(
            chapter_file_names(&env),
            vec!["01_the_long_night.md", "02_an_extraordinarily_long_chapte.md"]
        );
        let text = fs::read_to_string(
            env.projects_path()
                .join("Demo")
                .join(CHAPTERS_DIR)
                .join("01_the_long_night.md"),
        )
        .unwrap();
        assert_eq!(text, "# The Long Night\n\n");
    }

    #[test]
    fn test_ordinals_are_not_reused_after_delete() {
        let env = TestEnv::new();
        let (mut store, project) = demo(&env);

        assert_eq!(store.add_chapter(&project, "Intro").unwrap().order, 1);
        assert_eq!(store.add_chapter(&project, "Middle").unwrap().order, 2);
        store.delete_chapter(&project, "Intro").unwrap();
        assert_eq!(store.add_chapter(&project, "End").unwrap().order, 3);

        assert_eq!(chapter_file_names(&env), vec!["02_middle.md", "03_end.md"]);
        let titles: Vec<_> = store
            .list_chapters(&project)
            .unwrap()
            .into_iter()
            .map(|c| c.title)
            .collect();
        assert_eq!(titles, vec!["Middle", "End"]);
    }

    #[test]
    fn test_titles_follow_external_edits() {
        let env = TestEnv::new();
        let (mut store, project) = demo(&env);
        store.add_chapter(&project, "Intro").unwrap();

        let path = env
            .projects_path()
            .join("Demo")
            .join(CHAPTERS_DIR)
            .join("01_intro.md");
        fs::write(&path, "No heading any more.").unwrap();
        assert_eq!(store.list_chapters(&project).unwrap()[0].title, "01 Intro");

        fs::write(&path, "# Prologue\n\nRewritten.").unwrap();
        assert_eq!(store.list_chapters(&project).unwrap()[0].title, "Prologue");
        assert_eq!(
            store
                .get_content(&project, &ContentLocator::chapter("Prologue"))
                .unwrap(),
            "Rewritten."
        );
    }

    #[test]
    fn test_scene_content_replaces_only_its_region() {
        let env = TestEnv::new();
        let (mut store, project) = demo(&env);
        store.add_chapter(&project, "One").unwrap();
        store.add_scene(&project, "One", "Open").unwrap();
        store.add_scene(&project, "One", "Close").unwrap();

        let chapter = ContentLocator::chapter("One");
        let open = ContentLocator::scene("One", "Open");
        let close = ContentLocator::scene("One", "Close");
        store.set_content(&project, &chapter, "Chapter prose.").unwrap();
        store.set_content(&project, &close, "The end.").unwrap();

        for _ in 0..2 {
            store.set_content(&project, &open, "It was dark.").unwrap();
        }

        assert_eq!(store.get_content(&project, &open).unwrap(), "It was dark.");
        assert_eq!(store.get_content(&project, &close).unwrap(), "The end.");
        assert_eq!(store.get_content(&project, &chapter).unwrap(), "Chapter prose.");

        let text = fs::read_to_string(
            env.projects_path()
                .join("Demo")
                .join(CHAPTERS_DIR)
                .join("01_one.md"),
        )
        .unwrap();
        assert_eq!(text.matches("<!-- scene: Open -->").count(), 1);
        assert_eq!(text.matches("It was dark.").count(), 1);
    }

    #[test]
    fn test_heading_markers_round_trip() {
        let env = TestEnv::new();
        let (mut store, project) = demo(&env);
        store.add_chapter(&project, "One").unwrap();
        store.add_scene(&project, "One", "Open").unwrap();

        let tricky = "# Not a title\n\n## Also not a scene\n";
        for locator in [ContentLocator::chapter("One"), ContentLocator::scene("One", "Open")] {
            store.set_content(&project, &locator, tricky).unwrap();
            assert_eq!(store.get_content(&project, &locator).unwrap(), tricky);
            store.set_content(&project, &locator, "").unwrap();
            assert_eq!(store.get_content(&project, &locator).unwrap(), "");
        }
        assert_eq!(store.list_chapters(&project).unwrap()[0].title, "One");
    }

    #[test]
    fn test_reserved_lines_in_content_round_trip() {
        let env = TestEnv::new();
        let (mut store, project) = demo(&env);
        store.add_chapter(&project, "One").unwrap();
        store.add_scene(&project, "One", "Open").unwrap();
        store.add_character(&project, "Mira").unwrap();

        let fenced = "text\n<!-- scene: Fake -->\n<!-- /scene -->\n";
        let chapter = ContentLocator::chapter("One");
        let scene = ContentLocator::scene("One", "Open");
        store.set_content(&project, &chapter, fenced).unwrap();
        store.set_content(&project, &scene, fenced).unwrap();
        assert_eq!(store.get_content(&project, &chapter).unwrap(), fenced);
        assert_eq!(store.get_content(&project, &scene).unwrap(), fenced);
        assert_eq!(store.list_chapters(&project).unwrap()[0].scenes, vec!["Open"]);

        let diary = "Intro\n## Notes\nfrom her diary";
        let character = ContentLocator::character("Mira");
        store.set_content(&project, &character, diary).unwrap();
        assert_eq!(store.get_content(&project, &character).unwrap(), diary);
        assert!(store.get_character(&project, "Mira").unwrap().notes.is_empty());
    }

    #[test]
    fn test_remove_empty_dir_keeps_non_empty_dir() {
        let env = TestEnv::new();
        let dir = env.projects_path().join("scratch");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("keep.md"), "# Keep\n").unwrap();

        remove_empty_dir(&dir);
        assert!(dir.join("keep.md").is_file());

        fs::remove_file(dir.join("keep.md")).unwrap();
        remove_empty_dir(&dir);
        assert!(!dir.exists());
    }

    #[test]
    fn test_rename_chapter_keeps_file_and_updates_index() {
        let env = TestEnv::new();
        let (mut store, project) = demo(&env);
        store.add_chapter(&project, "One").unwrap();
        store.add_scene(&project, "One", "Open").unwrap();

        store.rename_chapter(&project, "One", "First").unwrap();
        assert_eq!(chapter_file_names(&env), vec!["01_one.md"]);
        assert!(matches!(
            store.get_content(&project, &ContentLocator::chapter("One")),
            Err(Error::NotFound(_))
        ));
        assert!(
            store
                .get_content(&project, &ContentLocator::scene("First", "Open"))
                .is_ok()
        );

        let index = store.load_index(&env.projects_path().join("Demo"), "Demo");
        assert_eq!(index.chapters[0].title, "First");
        assert_eq!(index.chapters[0].scenes, vec!["Open"]);
    }

    #[test]
    fn test_character_file_and_rename() {
        let env = TestEnv::new();
        let (mut store, project) = demo(&env);

        let mira = store.add_character(&project, "Mira").unwrap();
        assert_eq!(mira.role, CharacterRole::Supporting);

        let path = env
            .projects_path()
            .join("Demo")
            .join(CHARACTERS_DIR)
            .join("mira.md");
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# Mira\n\n## Basic Info\n"));
        for section in markdown::CHARACTER_SECTIONS {
            assert!(text.contains(&format!("## {}\n", section)));
        }

        store.rename_character(&project, "Mira", "Mira Voss").unwrap();
        assert!(matches!(
            store.get_character(&project, "Mira"),
            Err(Error::NotFound(_))
        ));
        assert_eq!(store.get_character(&project, "Mira Voss").unwrap().name, "Mira Voss");
        assert!(path.exists());
    }

    #[test]
    fn test_update_character_preserves_other_sections() {
        let env = TestEnv::new();
        let (mut store, project) = demo(&env);
        store.add_character(&project, "Ash").unwrap();

        let path = env
            .projects_path()
            .join("Demo")
            .join(CHARACTERS_DIR)
            .join("ash.md");
        let text = fs::read_to_string(&path)
            .unwrap()
            .replace("## Personality\n\n", "## Personality\n\nStubborn.");
        fs::write(&path, text).unwrap();

        let updated = store
            .update_character(
                &project,
                "Ash",
                &CharacterUpdate::new()
                    .with_role(CharacterRole::Antagonist)
                    .with_age("late forties")
                    .with_notes("Hates boats."),
            )
            .unwrap();
        assert_eq!(updated.role, CharacterRole::Antagonist);

        store
            .set_content(&project, &ContentLocator::character("Ash"), "Grew up inland.")
            .unwrap();

        let reread = store.get_character(&project, "Ash").unwrap();
        assert_eq!(reread.age, "late forties");
        assert_eq!(reread.notes, "Hates boats.");
        assert_eq!(reread.description, "Grew up inland.");

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("Stubborn."));
        assert!(text.contains("- **Role**: Antagonist\n"));
    }

    #[test]
    fn test_notes_use_lowercase_categories() {
        let env = TestEnv::new();
        let (mut store, project) = demo(&env);

        assert_eq!(
            store.list_categories(&project).unwrap(),
            vec!["arcs", "ideas", "plot", "research", "world"]
        );

        let note = store.add_note(&project, "Plot", "Big Twist", "The butler.").unwrap();
        assert_eq!(note.category, "plot");
        assert!(
            env.projects_path()
                .join("Demo")
                .join(PLANNING_DIR)
                .join("plot")
                .join("big_twist.md")
                .exists()
        );

        let locator = ContentLocator::note("plot", "Big Twist");
        assert_eq!(store.get_content(&project, &locator).unwrap(), "The butler.");
        store.set_content(&project, &locator, "The gardener.").unwrap();
        assert_eq!(
            store
                .get_content(&project, &ContentLocator::note("PLOT", "Big Twist"))
                .unwrap(),
            "The gardener."
        );

        assert!(matches!(
            store.add_note(&project, "plot", "Big Twist", ""),
            Err(Error::AlreadyExists(_))
        ));
        assert_eq!(store.list_notes(&project, None).unwrap().len(), 1);
        assert!(store.list_notes(&project, Some("missing")).unwrap().is_empty());

        store.delete_note(&project, "Plot", "Big Twist").unwrap();
        assert!(store.list_notes(&project, Some("plot")).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_index_falls_back_to_directory_name() {
        let env = TestEnv::new();
        let (mut store, project) = demo(&env);
        fs::write(env.projects_path().join("Demo").join(INDEX_FILE), "{{{").unwrap();

        let reopened = store.open_project("Demo").unwrap();
        assert_eq!(reopened.name, "Demo");
        assert_eq!(reopened.author, None);

        // Ordinals come from the files when the counter is lost
        store.add_chapter(&project, "One").unwrap();
        store.add_chapter(&project, "Two").unwrap();
        assert_eq!(chapter_file_names(&env), vec!["01_one.md", "02_two.md"]);
    }

    #[test]
    fn test_update_and_delete_project() {
        let env = TestEnv::new();
        let (mut store, project) = demo(&env);

        let updated = store
            .update_project(
                &project,
                &ProjectInfo {
                    author: Some("A. Writer".to_string()),
                    description: Some("A story.".to_string()),
                },
            )
            .unwrap();
        assert_eq!(updated.author.as_deref(), Some("A. Writer"));
        assert_eq!(
            store.open_project("Demo").unwrap().description.as_deref(),
            Some("A story.")
        );

        store.delete_project("Demo").unwrap();
        assert!(!env.projects_path().join("Demo").exists());
        assert!(matches!(
            store.add_chapter(&project, "One"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_settings_shared_with_data_dir() {
        let env = TestEnv::new();
        let mut store = env.directory();
        store.set_setting("theme", json!("light")).unwrap();
        assert!(env.data_path().join("settings.json").exists());
        assert_eq!(env.directory().get_setting("theme", json!("dark")), json!("light"));
    }
}
