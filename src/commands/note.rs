//! Planning note commands.

use super::{Output, Removed, json_string};
use crate::Result;
use crate::models::{NoteRef, Project};
use crate::storage::ProjectStore;
use serde::Serialize;

#[derive(Serialize)]
pub struct NoteAdded {
    #[serde(flatten)]
    pub note: NoteRef,
}

impl Output for NoteAdded {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        format!("Added note '{}' to {}", self.note.title, self.note.category)
    }
}

#[derive(Serialize)]
pub struct NoteList {
    pub notes: Vec<NoteRef>,
    pub count: usize,
}

impl Output for NoteList {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        if self.notes.is_empty() {
            return "No notes.".to_string();
        }
        let mut lines = vec![format!("{} note(s):", self.count)];
        lines.extend(
            self.notes
                .iter()
                .map(|n| format!("  [{}] {}", n.category, n.title)),
        );
        lines.join("\n")
    }
}

#[derive(Serialize)]
pub struct CategoryList {
    pub categories: Vec<String>,
}

impl Output for CategoryList {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        if self.categories.is_empty() {
            return "No categories.".to_string();
        }
        self.categories.join("\n")
    }
}

pub fn note_add(
    store: &mut dyn ProjectStore,
    project: &Project,
    category: &str,
    title: &str,
    content: &str,
) -> Result<NoteAdded> {
    let note = store.add_note(project, category, title, content)?;
    Ok(NoteAdded { note })
}

pub fn note_list(
    store: &dyn ProjectStore,
    project: &Project,
    category: Option<&str>,
) -> Result<NoteList> {
    let notes = store.list_notes(project, category)?;
    Ok(NoteList {
        count: notes.len(),
        notes,
    })
}

pub fn note_categories(store: &dyn ProjectStore, project: &Project) -> Result<CategoryList> {
    Ok(CategoryList {
        categories: store.list_categories(project)?,
    })
}

pub fn note_rm(
    store: &mut dyn ProjectStore,
    project: &Project,
    category: &str,
    title: &str,
) -> Result<Removed> {
    store.delete_note(project, category, title)?;
    Ok(Removed::new("note", format!("{}/{}", category, title)))
}
