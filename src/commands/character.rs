//! Character commands.

use super::{Output, Removed, Renamed, json_string};
use crate::Result;
use crate::models::{Character, CharacterRole, CharacterUpdate, Project};
use crate::storage::ProjectStore;
use serde::Serialize;

fn describe(character: &Character) -> String {
    let mut lines = vec![format!("{} ({})", character.name, character.role)];
    if !character.age.is_empty() {
        lines.push(format!("  Age: {}", character.age));
    }
    if !character.description.is_empty() {
        lines.push(format!("  Description: {}", character.description));
    }
    if !character.notes.is_empty() {
        lines.push(format!("  Notes: {}", character.notes));
    }
    lines.join("\n")
}

#[derive(Serialize)]
pub struct CharacterShow {
    #[serde(flatten)]
    pub character: Character,
}

impl Output for CharacterShow {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        describe(&self.character)
    }
}

#[derive(Serialize)]
pub struct CharacterList {
    pub characters: Vec<Character>,
    pub count: usize,
}

impl Output for CharacterList {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        if self.characters.is_empty() {
            return "No characters.".to_string();
        }
        let mut lines = vec![format!("{} character(s):", self.count)];
        lines.extend(
            self.characters
                .iter()
                .map(|c| format!("  {} ({})", c.name, c.role)),
        );
        lines.join("\n")
    }
}

pub fn character_add(
    store: &mut dyn ProjectStore,
    project: &Project,
    name: &str,
) -> Result<CharacterShow> {
    let character = store.add_character(project, name)?;
    Ok(CharacterShow { character })
}

pub fn character_list(store: &dyn ProjectStore, project: &Project) -> Result<CharacterList> {
    let characters = store.list_characters(project)?;
    Ok(CharacterList {
        count: characters.len(),
        characters,
    })
}

pub fn character_show(store: &dyn ProjectStore, project: &Project, name: &str) -> Result<CharacterShow> {
    let character = store.get_character(project, name)?;
    Ok(CharacterShow { character })
}

pub fn character_rename(
    store: &mut dyn ProjectStore,
    project: &Project,
    old: &str,
    new: &str,
) -> Result<Renamed> {
    store.rename_character(project, old, new)?;
    Ok(Renamed {
        kind: "character",
        old: old.to_string(),
        new: new.to_string(),
    })
}

pub fn character_update(
    store: &mut dyn ProjectStore,
    project: &Project,
    name: &str,
    role: Option<String>,
    age: Option<String>,
    description: Option<String>,
    notes: Option<String>,
) -> Result<CharacterShow> {
    let update = CharacterUpdate {
        role: role.as_deref().map(CharacterRole::parse),
        age,
        description,
        notes,
    };
    let character = if update.is_empty() {
        store.get_character(project, name)?
    } else {
        store.update_character(project, name, &update)?
    };
    Ok(CharacterShow { character })
}

pub fn character_rm(store: &mut dyn ProjectStore, project: &Project, name: &str) -> Result<Removed> {
    store.delete_character(project, name)?;
    Ok(Removed::new("character", name))
}
