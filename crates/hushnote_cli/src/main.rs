//! CLI entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `hushnote_core` linkage.
//! - Run small note commands against a data directory for local checks.
//!
//! Configuration comes from `HUSHNOTE_*` environment variables; flags
//! override them.

use clap::{Parser, Subcommand};
use hushnote_core::{
    core_version, init_logging, ping, AnyStorage, CategorySelection, CoreConfig,
    NoDeviceAuthenticator, Note, NoteDraft, NoteQuery, NoteService, NotesTab, StorageBackend,
};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(author, version, about = "hushnote: private notes core probe", long_about = None)]
struct Cli {
    /// Data directory (overrides HUSHNOTE_DATA_DIR).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Storage backend `file|sqlite` (overrides HUSHNOTE_STORAGE).
    #[arg(long, global = true)]
    storage: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print core linkage info (default).
    Probe,
    /// List notes newest first.
    List {
        /// Show the private tab; requires device authentication.
        #[arg(long)]
        private: bool,
        /// Case-insensitive text filter.
        #[arg(long, default_value = "")]
        search: String,
        /// Only notes of this category id.
        #[arg(long)]
        category: Option<Uuid>,
    },
    /// Create a note.
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        content: String,
        /// Store the note in the private space.
        #[arg(long)]
        locked: bool,
        #[arg(long)]
        category: Option<Uuid>,
    },
    /// Delete a note by id.
    Delete { id: Uuid },
    /// List categories.
    Categories,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let command = cli.command.unwrap_or(Commands::Probe);
    if let Commands::Probe = command {
        println!("hushnote_core ping={}", ping());
        println!("hushnote_core version={}", core_version());
        return Ok(());
    }

    let config = resolve_config(cli.data_dir, cli.storage.as_deref())?;
    init_logging(&config.log_level, config.log_dir())?;
    let storage = config.open_storage().map_err(|err| err.to_string())?;
    let mut service =
        NoteService::open_with_blobs(storage, &config.notes_blob, &config.categories_blob);
    info!(
        "event=cli_run module=cli status=start backend={}",
        service.repository().storage().backend_name()
    );

    match command {
        Commands::Probe => Ok(()),
        Commands::List {
            private,
            search,
            category,
        } => list(&mut service, private, search, category),
        Commands::Add {
            title,
            content,
            locked,
            category,
        } => {
            let note = service.create_note(NoteDraft {
                title,
                content,
                is_locked: locked,
                category,
            });
            println!("{}", note.id);
            Ok(())
        }
        Commands::Delete { id } => {
            if service.delete_note(id) {
                println!("deleted {id}");
                Ok(())
            } else {
                Err(format!("note {id} not found or private"))
            }
        }
        Commands::Categories => {
            for category in service.categories() {
                println!("{}  {}  {}", category.id, category.color, category.name);
            }
            Ok(())
        }
    }
}

fn list(
    service: &mut NoteService<AnyStorage>,
    private: bool,
    search: String,
    category: Option<Uuid>,
) -> Result<(), String> {
    let tab = if private {
        // The terminal has no device prompt; unlocking reports why.
        service
            .unlock(&NoDeviceAuthenticator)
            .map_err(|err| err.message())?;
        NotesTab::Private
    } else {
        NotesTab::Notes
    };
    let selection = category.map_or(CategorySelection::All, CategorySelection::Only);
    let query = NoteQuery::new(tab)
        .with_search(search)
        .with_category(selection);

    let notes = service.visible_notes(&query);
    if notes.is_empty() {
        println!("No notes.");
    }
    for note in notes {
        println!("{}", render(note));
    }
    Ok(())
}

fn render(note: &Note) -> String {
    let category = note
        .category
        .as_ref()
        .map_or("-", |category| category.name.as_str());
    format!("{}  {}  [{}]  {}", note.id, note.date, category, note.title)
}

fn resolve_config(data_dir: Option<PathBuf>, storage: Option<&str>) -> Result<CoreConfig, String> {
    let mut config = CoreConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(dir) = data_dir {
        let dir = if dir.is_absolute() {
            dir
        } else {
            std::env::current_dir()
                .map_err(|err| err.to_string())?
                .join(dir)
        };
        let log_level = config.log_level.clone();
        config = CoreConfig::new(dir).map_err(|err| err.to_string())?;
        config.log_level = log_level;
    }
    if let Some(storage) = storage {
        config.storage_backend = StorageBackend::parse(storage).map_err(|err| err.to_string())?;
    }
    Ok(config)
}
