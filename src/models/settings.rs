//! Typed view over the editor settings the application understands.

use crate::storage::ProjectStore;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const THEME: &str = "theme";
pub const DEFAULT_FONT: &str = "default_font";
pub const DEFAULT_FONT_SIZE: &str = "default_font_size";
pub const SPELL_CHECK: &str = "spell_check";
pub const AUTOSAVE: &str = "autosave";

/// Editor preferences with their built-in defaults applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorSettings {
    pub theme: String,
    pub default_font: String,
    pub default_font_size: u32,
    pub spell_check: bool,
    pub autosave: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            default_font: "Helvetica".to_string(),
            default_font_size: 14,
            spell_check: true,
            autosave: true,
        }
    }
}

impl EditorSettings {
    /// Read the known settings from a store, falling back to defaults for
    /// missing or mistyped values.
    pub fn load(store: &dyn ProjectStore) -> Self {
        let defaults = Self::default();
        Self {
            theme: store
                .get_setting(THEME, json!(defaults.theme))
                .as_str()
                .map(str::to_string)
                .unwrap_or(defaults.theme),
            default_font: store
                .get_setting(DEFAULT_FONT, json!(defaults.default_font))
                .as_str()
                .map(str::to_string)
                .unwrap_or(defaults.default_font),
            default_font_size: store
                .get_setting(DEFAULT_FONT_SIZE, json!(defaults.default_font_size))
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(defaults.default_font_size),
            spell_check: store
                .get_setting(SPELL_CHECK, Value::Bool(defaults.spell_check))
                .as_bool()
                .unwrap_or(defaults.spell_check),
            autosave: store
                .get_setting(AUTOSAVE, Value::Bool(defaults.autosave))
                .as_bool()
                .unwrap_or(defaults.autosave),
        }
    }

    /// Persist every field back to the store.
    pub fn save(&self, store: &mut dyn ProjectStore) -> crate::Result<()> {
        store.set_setting(THEME, json!(self.theme))?;
        store.set_setting(DEFAULT_FONT, json!(self.default_font))?;
        store.set_setting(DEFAULT_FONT_SIZE, json!(self.default_font_size))?;
        store.set_setting(SPELL_CHECK, json!(self.spell_check))?;
        store.set_setting(AUTOSAVE, json!(self.autosave))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestEnv;

    #[test]
    fn test_load_defaults_from_empty_store() {
        let env = TestEnv::new();
        let store = env.aggregate();
        assert_eq!(EditorSettings::load(&store), EditorSettings::default());
    }

    #[test]
    fn test_save_and_reload() {
        let env = TestEnv::new();
        let mut store = env.directory();
        let settings = EditorSettings {
            theme: "light".to_string(),
            default_font_size: 18,
            spell_check: false,
            ..Default::default()
        };
        settings.save(&mut store).unwrap();

        let reopened = env.directory();
        assert_eq!(EditorSettings::load(&reopened), settings);
    }

    #[test]
    fn test_mistyped_value_falls_back() {
        let env = TestEnv::new();
        let mut store = env.aggregate();
        store.set_setting(DEFAULT_FONT_SIZE, json!("huge")).unwrap();
        assert_eq!(EditorSettings::load(&store).default_font_size, 14);
    }
}
