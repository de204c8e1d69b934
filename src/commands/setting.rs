//! Editor setting and configuration commands.

use super::{Output, json_string};
use crate::Result;
use crate::config::ResolvedConfig;
use crate::models::EditorSettings;
use crate::storage::ProjectStore;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Interpret a command-line value as JSON, falling back to a plain string.
pub fn parse_setting_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[derive(Serialize)]
pub struct SettingShow {
    pub key: String,
    pub value: Value,
}

impl Output for SettingShow {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        match &self.value {
            Value::String(s) => format!("{} = {}", self.key, s),
            other => format!("{} = {}", self.key, other),
        }
    }
}

#[derive(Serialize)]
pub struct SettingList {
    pub settings: BTreeMap<String, Value>,
    pub editor: EditorSettings,
}

impl Output for SettingList {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![
            "Editor:".to_string(),
            format!("  theme: {}", self.editor.theme),
            format!(
                "  font: {} {}pt",
                self.editor.default_font, self.editor.default_font_size
            ),
            format!("  spell_check: {}", self.editor.spell_check),
            format!("  autosave: {}", self.editor.autosave),
        ];
        if !self.settings.is_empty() {
            lines.push("Stored:".to_string());
            lines.extend(
                self.settings
                    .iter()
                    .map(|(key, value)| format!("  {} = {}", key, value)),
            );
        }
        lines.join("\n")
    }
}

/// One resolved value and where it came from.
#[derive(Serialize)]
pub struct ConfigEntry {
    pub value: String,
    pub source: String,
}

#[derive(Serialize)]
pub struct ConfigShow {
    pub backend: ConfigEntry,
    pub data_dir: ConfigEntry,
    pub projects_dir: ConfigEntry,
    pub welcome_chapter: ConfigEntry,
    pub config_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kdl: Option<String>,
}

impl Output for ConfigShow {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        if let Some(kdl) = &self.kdl {
            return kdl.trim_end().to_string();
        }
        let mut lines = Vec::new();
        for (name, entry) in [
            ("backend", &self.backend),
            ("data-dir", &self.data_dir),
            ("projects-dir", &self.projects_dir),
            ("welcome-chapter", &self.welcome_chapter),
        ] {
            lines.push(format!("{}: {} ({})", name, entry.value, entry.source));
        }
        lines.push(format!(
            "config file: {}",
            self.config_path.as_deref().unwrap_or("(none)")
        ));
        lines.join("\n")
    }
}

pub fn setting_get(store: &dyn ProjectStore, key: &str, default: Option<&str>) -> SettingShow {
    let default = default.map(parse_setting_value).unwrap_or(Value::Null);
    SettingShow {
        key: key.to_string(),
        value: store.get_setting(key, default),
    }
}

pub fn setting_set(store: &mut dyn ProjectStore, key: &str, raw: &str) -> Result<SettingShow> {
    let value = parse_setting_value(raw);
    store.set_setting(key, value.clone())?;
    Ok(SettingShow {
        key: key.to_string(),
        value,
    })
}

pub fn setting_list(store: &dyn ProjectStore) -> SettingList {
    SettingList {
        settings: store.settings(),
        editor: EditorSettings::load(store),
    }
}

pub fn config_show(config: &ResolvedConfig, kdl: bool) -> ConfigShow {
    ConfigShow {
        backend: ConfigEntry {
            value: config.backend().to_string(),
            source: config.backend.source.to_string(),
        },
        data_dir: ConfigEntry {
            value: config.data_dir().display().to_string(),
            source: config.data_dir.source.to_string(),
        },
        projects_dir: ConfigEntry {
            value: config.projects_dir().display().to_string(),
            source: config.projects_dir.source.to_string(),
        },
        welcome_chapter: ConfigEntry {
            value: config.welcome_chapter().to_string(),
            source: config.welcome_chapter.source.to_string(),
        },
        config_path: config
            .config_path
            .as_ref()
            .map(|p| p.display().to_string()),
        kdl: kdl.then(|| {
            let mut doc = config.to_config().to_kdl();
            doc.autoformat();
            doc.to_string()
        }),
    }
}
