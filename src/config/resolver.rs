//! Precedence resolution for configuration.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags (passed at runtime)
//! 2. Environment variables (`NOVELIST_BACKEND`, `NOVELIST_DATA_DIR`, `NOVELIST_PROJECTS_DIR`)
//! 3. config.kdl (`NOVELIST_CONFIG`, else `~/.config/novelist/config.kdl`)
//! 4. Built-in defaults

use super::NovelistConfig;
use crate::storage::BackendType;
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Environment variable naming an alternative config.kdl.
pub const CONFIG_ENV: &str = "NOVELIST_CONFIG";
pub const BACKEND_ENV: &str = "NOVELIST_BACKEND";
pub const DATA_DIR_ENV: &str = "NOVELIST_DATA_DIR";
pub const PROJECTS_DIR_ENV: &str = "NOVELIST_PROJECTS_DIR";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from CLI flag
    CliFlag,
    /// Value from environment variable
    EnvVar(String),
    /// Value from config.kdl
    ConfigFile,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::ConfigFile => write!(f, "config"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone)]
pub struct Resolved<T> {
    /// The resolved value
    pub value: T,
    /// Where the value came from
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    /// Create a new resolved value.
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Fully resolved configuration with source tracking.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub backend: Resolved<BackendType>,
    /// Settings and aggregate documents
    pub data_dir: Resolved<PathBuf>,
    /// One folder per project (directory backend)
    pub projects_dir: Resolved<PathBuf>,
    pub welcome_chapter: Resolved<bool>,
    /// The config.kdl that was consulted, if any location could be determined
    pub config_path: Option<PathBuf>,
}

impl ResolvedConfig {
    pub fn backend(&self) -> BackendType {
        self.backend.value
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir.value
    }

    pub fn projects_dir(&self) -> &Path {
        &self.projects_dir.value
    }

    pub fn welcome_chapter(&self) -> bool {
        self.welcome_chapter.value
    }

    /// The effective settings as a config document.
    pub fn to_config(&self) -> NovelistConfig {
        NovelistConfig {
            backend: Some(self.backend()),
            data_dir: Some(self.data_dir().display().to_string()),
            projects_dir: Some(self.projects_dir().display().to_string()),
            welcome_chapter: Some(self.welcome_chapter()),
        }
    }
}

/// CLI overrides for configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub backend: Option<BackendType>,
    pub data_dir: Option<PathBuf>,
    pub projects_dir: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Create empty overrides.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(mut self, backend: BackendType) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn with_projects_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.projects_dir = Some(dir.into());
        self
    }
}

fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| Error::Config("Cannot determine home directory".to_string()))
}

/// Expand a leading `~` to the home directory.
pub fn expand_tilde(path: &str) -> Result<PathBuf> {
    if path == "~" {
        return home_dir();
    }
    match path.strip_prefix("~/") {
        Some(rest) => Ok(home_dir()?.join(rest)),
        None => Ok(PathBuf::from(path)),
    }
}

/// Location of config.kdl: `NOVELIST_CONFIG`, else the platform config directory.
pub fn config_file_path() -> Option<PathBuf> {
    match std::env::var(CONFIG_ENV) {
        Ok(path) if !path.trim().is_empty() => Some(PathBuf::from(path)),
        _ => dirs::config_dir().map(|dir| dir.join("novelist").join("config.kdl")),
    }
}

/// Read the environment layer through `lookup` (normally `std::env::var`).
///
/// Empty variables count as unset.
pub fn env_layer(lookup: impl Fn(&str) -> Option<String>) -> Result<NovelistConfig> {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    let backend = match get(BACKEND_ENV) {
        Some(name) => Some(BackendType::parse(&name).ok_or_else(|| {
            Error::Config(format!(
                "{} must be \"directory\" or \"aggregate\", got {:?}",
                BACKEND_ENV, name
            ))
        })?),
        None => None,
    };

    Ok(NovelistConfig {
        backend,
        data_dir: get(DATA_DIR_ENV),
        projects_dir: get(PROJECTS_DIR_ENV),
        welcome_chapter: None,
    })
}

fn resolve_dir(
    cli: &Option<PathBuf>,
    env: &Option<String>,
    env_name: &str,
    file: &Option<String>,
    default: impl FnOnce() -> Result<PathBuf>,
) -> Result<Resolved<PathBuf>> {
    if let Some(path) = cli {
        Ok(Resolved::new(path.clone(), ValueSource::CliFlag))
    } else if let Some(path) = env {
        Ok(Resolved::new(
            expand_tilde(path)?,
            ValueSource::EnvVar(env_name.to_string()),
        ))
    } else if let Some(path) = file {
        Ok(Resolved::new(expand_tilde(path)?, ValueSource::ConfigFile))
    } else {
        Ok(Resolved::new(default()?, ValueSource::Default))
    }
}

/// Combine the three layers with built-in defaults.
pub fn resolve_layers(
    overrides: &ConfigOverrides,
    env: &NovelistConfig,
    file: &NovelistConfig,
    config_path: Option<PathBuf>,
) -> Result<ResolvedConfig> {
    let backend = if let Some(backend) = overrides.backend {
        Resolved::new(backend, ValueSource::CliFlag)
    } else if let Some(backend) = env.backend {
        Resolved::new(backend, ValueSource::EnvVar(BACKEND_ENV.to_string()))
    } else if let Some(backend) = file.backend {
        Resolved::new(backend, ValueSource::ConfigFile)
    } else {
        Resolved::new(BackendType::default(), ValueSource::Default)
    };

    let data_dir = resolve_dir(
        &overrides.data_dir,
        &env.data_dir,
        DATA_DIR_ENV,
        &file.data_dir,
        || Ok(home_dir()?.join(".novelist")),
    )?;

    let projects_dir = resolve_dir(
        &overrides.projects_dir,
        &env.projects_dir,
        PROJECTS_DIR_ENV,
        &file.projects_dir,
        || Ok(home_dir()?.join("Documents").join("Novelist")),
    )?;

    let welcome_chapter = match file.welcome_chapter {
        Some(enabled) => Resolved::new(enabled, ValueSource::ConfigFile),
        None => Resolved::new(false, ValueSource::Default),
    };

    Ok(ResolvedConfig {
        backend,
        data_dir,
        projects_dir,
        welcome_chapter,
        config_path,
    })
}

/// Resolve configuration from CLI overrides, the environment and config.kdl.
pub fn resolve_config(overrides: &ConfigOverrides) -> Result<ResolvedConfig> {
    let config_path = config_file_path();
    let file = match &config_path {
        Some(path) => NovelistConfig::load(path)?,
        None => NovelistConfig::new(),
    };
    let env = env_layer(|key| std::env::var(key).ok())?;

    let resolved = resolve_layers(overrides, &env, &file, config_path)?;
    tracing::debug!(
        backend = %resolved.backend(),
        backend_source = %resolved.backend.source,
        data_dir = %resolved.data_dir().display(),
        projects_dir = %resolved.projects_dir().display(),
        "resolved configuration"
    );
    Ok(resolved)
}
