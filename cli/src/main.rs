mod commands;
mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    EditRequest, StdinPrompter, cmd_add, cmd_category_add, cmd_category_delete, cmd_category_list,
    cmd_category_move, cmd_category_rename, cmd_check, cmd_delete, cmd_edit, cmd_export,
    cmd_favorite, cmd_import_backup, cmd_import_cook, cmd_list, cmd_photo_add, cmd_photo_export,
    cmd_photo_remove, cmd_reset, cmd_settings_set, cmd_settings_show, cmd_show,
};
use crate::config::Config;
use cookbook_core::error::CookbookError;
use cookbook_core::models::Direction;
use cookbook_core::service::CookbookService;

#[derive(Parser)]
#[command(
    name = "cookbook",
    version,
    about = "A local-first recipe manager",
    long_about = "A local-first recipe manager.\n\n\
        Recipes can be addressed by id, id prefix, or exact title (case-insensitive).\n\
        Set COOKBOOK_LOG=info (or debug) to see what the store is doing."
)]
struct Cli {
    /// Path to the cookbook database (default: platform data directory)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,
    /// Answer yes to every confirmation
    #[arg(short = 'y', long, global = true)]
    yes: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List recipes: favorites first, then by category
    List {
        /// Only show recipes whose title or ingredients contain this text
        #[arg(short, long)]
        search: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a recipe with its ingredients and steps
    Show {
        /// Recipe id, id prefix, or title
        recipe: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a recipe
    Add {
        /// Recipe title
        #[arg(default_value = "")]
        title: String,
        /// Category name or id (default: the first category)
        #[arg(short, long)]
        category: Option<String>,
        /// Ingredient line (repeatable)
        #[arg(short, long = "ingredient")]
        ingredients: Vec<String>,
        /// Instruction step (repeatable)
        #[arg(short, long = "step")]
        steps: Vec<String>,
        /// Photo file to attach (repeatable)
        #[arg(short, long = "photo")]
        photos: Vec<PathBuf>,
        /// Store the photos as the whole recipe
        #[arg(long)]
        photo_only: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit a recipe. Ingredients and steps, when given, replace the current lists
    Edit {
        /// Recipe id, id prefix, or title
        recipe: String,
        /// New title
        #[arg(short, long)]
        title: Option<String>,
        /// Move to this category (name or id)
        #[arg(short, long)]
        category: Option<String>,
        /// Ingredient line (repeatable)
        #[arg(short, long = "ingredient")]
        ingredients: Vec<String>,
        /// Instruction step (repeatable)
        #[arg(short, long = "step")]
        steps: Vec<String>,
        /// Remove every ingredient (combine with -i to start a new list)
        #[arg(long)]
        clear_ingredients: bool,
        /// Remove every step (combine with -s to start a new list)
        #[arg(long)]
        clear_steps: bool,
        /// Photo file to append (repeatable)
        #[arg(short, long = "photo")]
        photos: Vec<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Toggle a recipe's favorite flag
    Favorite {
        /// Recipe id, id prefix, or title
        recipe: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Tick off an ingredient (grocery mode)
    Check {
        /// Recipe id, id prefix, or title
        recipe: String,
        /// Ingredient number as shown by `show`
        number: usize,
        /// Clear the check instead
        #[arg(long)]
        uncheck: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Clear every ingredient check on a recipe
    Reset {
        /// Recipe id, id prefix, or title
        recipe: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a recipe
    Delete {
        /// Recipe id, id prefix, or title
        recipe: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage recipe photos
    Photo {
        #[command(subcommand)]
        command: PhotoCommands,
    },
    /// Manage categories
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },
    /// View or change settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
    /// Export the whole cookbook as JSON
    Export {
        /// Write to this file instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Import data from a backup or a Cooklang file
    Import {
        #[command(subcommand)]
        command: ImportCommands,
    },
}

#[derive(Subcommand)]
enum PhotoCommands {
    /// Append photos to a recipe
    Add {
        /// Recipe id, id prefix, or title
        recipe: String,
        /// Image files
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove one photo
    Remove {
        /// Recipe id, id prefix, or title
        recipe: String,
        /// Photo number (1-based)
        number: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write one photo to a file
    Export {
        /// Recipe id, id prefix, or title
        recipe: String,
        /// Photo number (1-based)
        number: usize,
        /// Destination file
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum MoveDirection {
    Up,
    Down,
}

impl From<MoveDirection> for Direction {
    fn from(d: MoveDirection) -> Self {
        match d {
            MoveDirection::Up => Direction::Up,
            MoveDirection::Down => Direction::Down,
        }
    }
}

#[derive(Subcommand)]
enum CategoryCommands {
    /// List categories in display order
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a category at the end
    Add {
        /// Category name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Move a category one place up or down
    Move {
        /// Category name or id
        category: String,
        #[arg(value_enum)]
        direction: MoveDirection,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rename a category
    Rename {
        /// Category name or id
        category: String,
        /// New name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a category, moving its recipes to the first remaining one
    Delete {
        /// Category name or id
        category: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Show all settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change a setting (groceryMode, favoritesCollapsed, cookbookName, theme)
    Set {
        key: String,
        value: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ImportCommands {
    /// Restore a backup written by `cookbook export`
    Backup {
        /// Path to the backup JSON file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Import a recipe from a Cooklang (.cook) file
    Cook {
        /// Path to the .cook file
        file: PathBuf,
        /// Title override (defaults to metadata title or filename)
        #[arg(long)]
        title: Option<String>,
        /// Category name or id (default: the first category)
        #[arg(short, long)]
        category: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("COOKBOOK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        let not_found = e
            .downcast_ref::<CookbookError>()
            .is_some_and(CookbookError::is_not_found);
        process::exit(if not_found { 2 } else { 1 });
    }
}

#[allow(clippy::too_many_lines)]
fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.db)?;
    debug!(db = %config.db_path.display(), "using cookbook store");
    let mut svc = CookbookService::open(&config.db_path)
        .with_context(|| format!("Failed to open cookbook at {}", config.db_path.display()))?;
    let prompter = StdinPrompter::new(cli.yes);
    svc.ensure_cookbook_named(&prompter)?;
    let svc = &mut svc;

    match cli.command {
        Commands::List { search, json } => cmd_list(svc, search.as_deref(), json),
        Commands::Show { recipe, json } => cmd_show(svc, &recipe, json),
        Commands::Add {
            title,
            category,
            ingredients,
            steps,
            photos,
            photo_only,
            json,
        } => cmd_add(
            svc,
            &title,
            category.as_deref(),
            &ingredients,
            &steps,
            &photos,
            photo_only,
            json,
        ),
        Commands::Edit {
            recipe,
            title,
            category,
            ingredients,
            steps,
            clear_ingredients,
            clear_steps,
            photos,
            json,
        } => {
            let request = EditRequest {
                title,
                category,
                ingredients,
                steps,
                clear_ingredients,
                clear_steps,
                photos,
            };
            cmd_edit(svc, &recipe, request, json)
        }
        Commands::Favorite { recipe, json } => cmd_favorite(svc, &recipe, json),
        Commands::Check {
            recipe,
            number,
            uncheck,
            json,
        } => cmd_check(svc, &recipe, number, uncheck, json),
        Commands::Reset { recipe, json } => cmd_reset(svc, &recipe, json),
        Commands::Delete { recipe, json } => cmd_delete(svc, &recipe, &prompter, json),
        Commands::Photo { command } => match command {
            PhotoCommands::Add {
                recipe,
                files,
                json,
            } => cmd_photo_add(svc, &recipe, &files, json),
            PhotoCommands::Remove {
                recipe,
                number,
                json,
            } => cmd_photo_remove(svc, &recipe, number, json),
            PhotoCommands::Export {
                recipe,
                number,
                output,
            } => cmd_photo_export(svc, &recipe, number, &output),
        },
        Commands::Category { command } => match command {
            CategoryCommands::List { json } => cmd_category_list(svc, json),
            CategoryCommands::Add { name, json } => cmd_category_add(svc, &name, json),
            CategoryCommands::Move {
                category,
                direction,
                json,
            } => cmd_category_move(svc, &category, direction.into(), json),
            CategoryCommands::Rename {
                category,
                name,
                json,
            } => cmd_category_rename(svc, &category, &name, json),
            CategoryCommands::Delete { category, json } => {
                cmd_category_delete(svc, &category, &prompter, json)
            }
        },
        Commands::Settings { command } => match command {
            SettingsCommands::Show { json } => cmd_settings_show(svc, json),
            SettingsCommands::Set { key, value, json } => {
                cmd_settings_set(svc, &key, &value, json)
            }
        },
        Commands::Export { output } => cmd_export(svc, output.as_deref()),
        Commands::Import { command } => match command {
            ImportCommands::Backup { file, json } => cmd_import_backup(svc, &file, json),
            ImportCommands::Cook {
                file,
                title,
                category,
                json,
            } => cmd_import_cook(svc, &file, title, category.as_deref(), json),
        },
    }
}
