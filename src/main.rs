//! Novelist CLI - a project and content store for novel manuscripts.

use clap::Parser;
use novelist::cli::{
    ChapterCommands, CharacterCommands, Cli, Commands, ConfigCommands, ContentCommands,
    NoteCommands, ProjectCommands, SceneCommands, SettingCommands,
};
use novelist::commands::{self, Output, select_project};
use novelist::config::{ConfigOverrides, resolve_config};
use novelist::storage::{ProjectStore, open_store};
use std::io::Read;
use std::process;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Log filter directives (e.g. `debug`, `novelist::storage=trace`).
const LOG_ENV: &str = "NOVELIST_LOG";
/// Set to `json` for JSON log lines.
const LOG_FORMAT_ENV: &str = "NOVELIST_LOG_FORMAT";

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let human = cli.human_readable;

    if let Err(e) = run_command(cli) {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!(
                "{}",
                serde_json::json!({ "error": e.to_string(), "kind": e.kind() })
            );
        }
        process::exit(1);
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn run_command(cli: Cli) -> Result<(), novelist::Error> {
    let human = cli.human_readable;

    let mut overrides = ConfigOverrides::new();
    if let Some(backend) = cli.backend {
        overrides = overrides.with_backend(backend);
    }
    if let Some(dir) = cli.data_dir {
        overrides = overrides.with_data_dir(dir);
    }
    if let Some(dir) = cli.projects_dir {
        overrides = overrides.with_projects_dir(dir);
    }
    let config = resolve_config(&overrides)?;
    let project = cli.project.as_deref();

    match cli.command {
        Commands::Config { command } => match command {
            ConfigCommands::Show { kdl } => output(&commands::config_show(&config, kdl), human),
        },
        Commands::Project { command } => {
            let mut store = open_store(&config)?;
            run_project(command, store.as_mut(), project, human)?;
        }
        Commands::Chapter { command } => {
            let mut store = open_store(&config)?;
            run_chapter(command, store.as_mut(), project, human)?;
        }
        Commands::Scene { command } => {
            let mut store = open_store(&config)?;
            run_scene(command, store.as_mut(), project, human)?;
        }
        Commands::Character { command } => {
            let mut store = open_store(&config)?;
            run_character(command, store.as_mut(), project, human)?;
        }
        Commands::Note { command } => {
            let mut store = open_store(&config)?;
            run_note(command, store.as_mut(), project, human)?;
        }
        Commands::Content { command } => {
            let mut store = open_store(&config)?;
            run_content(command, store.as_mut(), project, human)?;
        }
        Commands::Setting { command } => {
            let mut store = open_store(&config)?;
            run_setting(command, store.as_mut(), human)?;
        }
        Commands::Export { output: path } => {
            let store = open_store(&config)?;
            let project = select_project(store.as_ref(), project)?;
            output(&commands::export(store.as_ref(), &project, &path)?, human);
        }
    }

    Ok(())
}

fn run_project(
    command: ProjectCommands,
    store: &mut dyn ProjectStore,
    project: Option<&str>,
    human: bool,
) -> Result<(), novelist::Error> {
    match command {
        ProjectCommands::Create { name } => {
            output(&commands::project_create(store, &name)?, human);
        }
        ProjectCommands::List => {
            output(&commands::project_list(store)?, human);
        }
        ProjectCommands::Open { name } => {
            output(&commands::project_open(store, &name)?, human);
        }
        ProjectCommands::Info {
            author,
            description,
        } => {
            let project = select_project(store, project)?;
            output(
                &commands::project_info(store, &project, author, description)?,
                human,
            );
        }
        ProjectCommands::Delete { name } => {
            output(&commands::project_delete(store, &name)?, human);
        }
    }
    Ok(())
}

fn run_chapter(
    command: ChapterCommands,
    store: &mut dyn ProjectStore,
    project: Option<&str>,
    human: bool,
) -> Result<(), novelist::Error> {
    let project = select_project(store, project)?;
    match command {
        ChapterCommands::Add { title } => {
            output(&commands::chapter_add(store, &project, &title)?, human);
        }
        ChapterCommands::List => {
            output(&commands::chapter_list(store, &project)?, human);
        }
        ChapterCommands::Rename { old, new } => {
            output(&commands::chapter_rename(store, &project, &old, &new)?, human);
        }
        ChapterCommands::Rm { title } => {
            output(&commands::chapter_rm(store, &project, &title)?, human);
        }
    }
    Ok(())
}

fn run_scene(
    command: SceneCommands,
    store: &mut dyn ProjectStore,
    project: Option<&str>,
    human: bool,
) -> Result<(), novelist::Error> {
    let project = select_project(store, project)?;
    match command {
        SceneCommands::Add { chapter, title } => {
            output(&commands::scene_add(store, &project, &chapter, &title)?, human);
        }
        SceneCommands::Rm { chapter, title } => {
            output(&commands::scene_rm(store, &project, &chapter, &title)?, human);
        }
    }
    Ok(())
}

fn run_character(
    command: CharacterCommands,
    store: &mut dyn ProjectStore,
    project: Option<&str>,
    human: bool,
) -> Result<(), novelist::Error> {
    let project = select_project(store, project)?;
    match command {
        CharacterCommands::Add { name } => {
            output(&commands::character_add(store, &project, &name)?, human);
        }
        CharacterCommands::List => {
            output(&commands::character_list(store, &project)?, human);
        }
        CharacterCommands::Show { name } => {
            output(&commands::character_show(store, &project, &name)?, human);
        }
        CharacterCommands::Rename { old, new } => {
            output(
                &commands::character_rename(store, &project, &old, &new)?,
                human,
            );
        }
        CharacterCommands::Update {
            name,
            role,
            age,
            description,
            notes,
        } => {
            output(
                &commands::character_update(
                    store,
                    &project,
                    &name,
                    role,
                    age,
                    description,
                    notes,
                )?,
                human,
            );
        }
        CharacterCommands::Rm { name } => {
            output(&commands::character_rm(store, &project, &name)?, human);
        }
    }
    Ok(())
}

fn run_note(
    command: NoteCommands,
    store: &mut dyn ProjectStore,
    project: Option<&str>,
    human: bool,
) -> Result<(), novelist::Error> {
    let project = select_project(store, project)?;
    match command {
        NoteCommands::Add {
            category,
            title,
            content,
        } => {
            output(
                &commands::note_add(store, &project, &category, &title, &content)?,
                human,
            );
        }
        NoteCommands::List { category } => {
            output(
                &commands::note_list(store, &project, category.as_deref())?,
                human,
            );
        }
        NoteCommands::Categories => {
            output(&commands::note_categories(store, &project)?, human);
        }
        NoteCommands::Rm { category, title } => {
            output(&commands::note_rm(store, &project, &category, &title)?, human);
        }
    }
    Ok(())
}

fn run_content(
    command: ContentCommands,
    store: &mut dyn ProjectStore,
    project: Option<&str>,
    human: bool,
) -> Result<(), novelist::Error> {
    let project = select_project(store, project)?;
    match command {
        ContentCommands::Get { locator } => {
            output(&commands::content_get(store, &project, &locator)?, human);
        }
        ContentCommands::Set { locator, text } => {
            let text = match text {
                Some(text) => text,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            output(
                &commands::content_set(store, &project, &locator, &text)?,
                human,
            );
        }
    }
    Ok(())
}

fn run_setting(
    command: SettingCommands,
    store: &mut dyn ProjectStore,
    human: bool,
) -> Result<(), novelist::Error> {
    match command {
        SettingCommands::Get { key, default } => {
            output(&commands::setting_get(store, &key, default.as_deref()), human);
        }
        SettingCommands::Set { key, value } => {
            output(&commands::setting_set(store, &key, &value)?, human);
        }
        SettingCommands::List => {
            output(&commands::setting_list(store), human);
        }
    }
    Ok(())
}

/// Print output in JSON or human-readable format.
fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
