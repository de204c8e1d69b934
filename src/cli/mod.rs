//! CLI argument definitions for Novelist.

use crate::storage::BackendType;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Version plus the commit and timestamp recorded by build.rs.
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("NOVELIST_GIT_COMMIT"),
    " ",
    env!("NOVELIST_BUILD_TIMESTAMP"),
    ")"
);

fn parse_backend(s: &str) -> Result<BackendType, String> {
    BackendType::parse(s).ok_or_else(|| format!("unknown backend '{}' (directory, aggregate)", s))
}

/// Novelist - a project and content store for novel manuscripts.
///
/// Content is addressed with locators: `chapter/<title>`,
/// `scene/<chapter>/<scene>`, `character/<name>`, `note/<category>/<title>`.
#[derive(Parser, Debug)]
#[command(name = "novelist")]
#[command(author, version, about = "A project and content store for novel manuscripts", long_about = None)]
#[command(long_version = LONG_VERSION)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Storage backend (directory, aggregate)
    #[arg(long, global = true, value_parser = parse_backend)]
    pub backend: Option<BackendType>,

    /// Directory for settings and aggregate documents
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Directory holding one folder per project
    #[arg(long, global = true)]
    pub projects_dir: Option<PathBuf>,

    /// Project to operate on. The aggregate backend defaults to its single project.
    #[arg(short = 'p', long, global = true, env = "NOVELIST_PROJECT")]
    pub project: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Project management commands
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// Chapter management commands
    Chapter {
        #[command(subcommand)]
        command: ChapterCommands,
    },

    /// Scene management commands
    Scene {
        #[command(subcommand)]
        command: SceneCommands,
    },

    /// Character management commands
    Character {
        #[command(subcommand)]
        command: CharacterCommands,
    },

    /// Planning note commands
    Note {
        #[command(subcommand)]
        command: NoteCommands,
    },

    /// Read or replace the text of one content unit
    Content {
        #[command(subcommand)]
        command: ContentCommands,
    },

    /// Editor settings
    Setting {
        #[command(subcommand)]
        command: SettingCommands,
    },

    /// Export the whole book as one markdown file
    Export {
        /// Output file path
        output: PathBuf,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Project subcommands
#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// Create a new project
    Create {
        /// Project name (also the folder name)
        name: String,
    },

    /// List projects
    List,

    /// Show project metadata
    Open {
        /// Project name
        name: String,
    },

    /// Update author/description of the selected project (empty string clears)
    Info {
        /// Author shown on the export title page
        #[arg(long)]
        author: Option<String>,

        /// Free-form description
        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a project and everything in it
    Delete {
        /// Project name
        name: String,
    },
}

/// Chapter subcommands
#[derive(Subcommand, Debug)]
pub enum ChapterCommands {
    /// Add a chapter at the end of the book
    Add {
        /// Chapter title
        title: String,
    },

    /// List chapters in book order
    List,

    /// Rename a chapter
    Rename {
        /// Current title
        old: String,
        /// New title
        new: String,
    },

    /// Delete a chapter with its scenes
    Rm {
        /// Chapter title
        title: String,
    },
}

/// Scene subcommands
#[derive(Subcommand, Debug)]
pub enum SceneCommands {
    /// Append a scene to a chapter
    Add {
        /// Chapter title
        chapter: String,
        /// Scene title
        title: String,
    },

    /// Delete a scene
    Rm {
        /// Chapter title
        chapter: String,
        /// Scene title
        title: String,
    },
}

/// Character subcommands
#[derive(Subcommand, Debug)]
pub enum CharacterCommands {
    /// Add a character
    Add {
        /// Character name
        name: String,
    },

    /// List characters
    List,

    /// Show one character
    Show {
        /// Character name
        name: String,
    },

    /// Rename a character
    Rename {
        /// Current name
        old: String,
        /// New name
        new: String,
    },

    /// Update character fields
    Update {
        /// Character name
        name: String,

        /// Role (protagonist, antagonist, supporting, minor, or free text)
        #[arg(long)]
        role: Option<String>,

        /// Age
        #[arg(long)]
        age: Option<String>,

        /// Description
        #[arg(long)]
        description: Option<String>,

        /// Notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Delete a character
    Rm {
        /// Character name
        name: String,
    },
}

/// Planning note subcommands
#[derive(Subcommand, Debug)]
pub enum NoteCommands {
    /// Add a note to a category
    Add {
        /// Category
        category: String,
        /// Note title
        title: String,

        /// Initial note text
        #[arg(long, default_value = "")]
        content: String,
    },

    /// List notes
    List {
        /// Only notes in this category
        #[arg(long)]
        category: Option<String>,
    },

    /// List note categories
    Categories,

    /// Delete a note
    Rm {
        /// Category
        category: String,
        /// Note title
        title: String,
    },
}

/// Content subcommands
#[derive(Subcommand, Debug)]
pub enum ContentCommands {
    /// Print the text of a content unit
    Get {
        /// Content locator (e.g., chapter/Prologue, scene/One/Opening)
        locator: String,
    },

    /// Replace the text of a content unit
    Set {
        /// Content locator
        locator: String,

        /// New text (read from stdin when omitted)
        #[arg(long)]
        text: Option<String>,
    },
}

/// Setting subcommands
#[derive(Subcommand, Debug)]
pub enum SettingCommands {
    /// Get a setting value
    Get {
        /// Setting key
        key: String,

        /// JSON value returned when the key is unset
        #[arg(long)]
        default: Option<String>,
    },

    /// Set a setting value (parsed as JSON, else stored as a string)
    Set {
        /// Setting key
        key: String,
        /// Setting value
        value: String,
    },

    /// List stored settings and the effective editor settings
    List,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the resolved configuration and where each value came from
    Show {
        /// Print the effective configuration as config.kdl
        #[arg(long)]
        kdl: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "novelist",
            "chapter",
            "add",
            "One",
            "--backend",
            "aggregate",
            "-H",
        ])
        .unwrap();
        assert!(cli.human_readable);
        assert_eq!(cli.backend, Some(BackendType::Aggregate));
        assert!(matches!(
            cli.command,
            Commands::Chapter {
                command: ChapterCommands::Add { ref title }
            } if title == "One"
        ));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        assert!(Cli::try_parse_from(["novelist", "--backend", "sqlite", "project", "list"]).is_err());
    }
}
