//! Project commands.

use super::{Output, Removed, json_string};
use crate::Result;
use crate::models::{Project, ProjectInfo};
use crate::storage::ProjectStore;
use serde::Serialize;

/// A project with a summary of its contents.
#[derive(Serialize)]
pub struct ProjectShow {
    #[serde(flatten)]
    pub project: Project,
    pub chapters: usize,
    pub characters: usize,
    pub location: String,
}

impl ProjectShow {
    fn load(store: &dyn ProjectStore, project: Project) -> Result<Self> {
        Ok(Self {
            chapters: store.list_chapters(&project)?.len(),
            characters: store.list_characters(&project)?.len(),
            location: store.location(),
            project,
        })
    }
}

impl Output for ProjectShow {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![format!("Project: {}", self.project.name)];
        if let Some(author) = &self.project.author {
            lines.push(format!("  Author: {}", author));
        }
        if let Some(description) = &self.project.description {
            lines.push(format!("  Description: {}", description));
        }
        lines.push(format!(
            "  Created: {}",
            self.project.created.format("%Y-%m-%d %H:%M")
        ));
        lines.push(format!(
            "  {} chapter(s), {} character(s)",
            self.chapters, self.characters
        ));
        lines.push(format!("  Location: {}", self.location));
        lines.join("\n")
    }
}

#[derive(Serialize)]
pub struct ProjectList {
    pub projects: Vec<String>,
    pub count: usize,
}

impl Output for ProjectList {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        if self.projects.is_empty() {
            return "No projects.".to_string();
        }
        let mut lines = vec![format!("{} project(s):", self.count)];
        lines.extend(self.projects.iter().map(|name| format!("  {}", name)));
        lines.join("\n")
    }
}

pub fn project_create(store: &mut dyn ProjectStore, name: &str) -> Result<ProjectShow> {
    let project = store.create_project(name)?;
    ProjectShow::load(store, project)
}

pub fn project_list(store: &dyn ProjectStore) -> Result<ProjectList> {
    let projects = store.list_projects()?;
    Ok(ProjectList {
        count: projects.len(),
        projects,
    })
}

pub fn project_open(store: &dyn ProjectStore, name: &str) -> Result<ProjectShow> {
    let project = store.open_project(name)?;
    ProjectShow::load(store, project)
}

/// Update author/description. `None` keeps a field, an empty string clears it.
pub fn project_info(
    store: &mut dyn ProjectStore,
    project: &Project,
    author: Option<String>,
    description: Option<String>,
) -> Result<ProjectShow> {
    let updated = store.update_project(
        project,
        &ProjectInfo {
            author,
            description,
        },
    )?;
    ProjectShow::load(store, updated)
}

pub fn project_delete(store: &mut dyn ProjectStore, name: &str) -> Result<Removed> {
    store.delete_project(name)?;
    Ok(Removed::new("project", name))
}
