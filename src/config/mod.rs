//! Configuration for Novelist.
//!
//! ## config.kdl - User preferences
//!
//! Located at `$NOVELIST_CONFIG`, else `~/.config/novelist/config.kdl`.
//!
//! Contains:
//! - `backend` - "directory" (default) or "aggregate"
//! - `data-dir` - Settings and aggregate documents (default `~/.novelist`)
//! - `projects-dir` - One folder per project (default `~/Documents/Novelist`)
//! - `welcome-chapter` - Seed new projects with a welcome chapter
//!
//! ## Precedence
//!
//! CLI flag > environment variable > config.kdl > defaults
//!
//! Use the [`resolver`] module for unified precedence resolution.

pub mod resolver;
pub mod schema;

pub use resolver::{
    BACKEND_ENV, CONFIG_ENV, ConfigOverrides, DATA_DIR_ENV, PROJECTS_DIR_ENV, Resolved,
    ResolvedConfig, ValueSource, config_file_path, env_layer, resolve_config, resolve_layers,
};
pub use schema::NovelistConfig;
