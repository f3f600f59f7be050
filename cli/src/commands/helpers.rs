use anyhow::{Context, Result, bail};
use chrono::{Local, TimeZone};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::Path;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use cookbook_core::derive::{display_title, visible_ingredients};
use cookbook_core::error::CookbookError;
use cookbook_core::models::{Category, Photo, Recipe};
use cookbook_core::service::Prompter;
use cookbook_core::state::AppState;

/// Confirmations and prompts over stdin, written to stderr so stdout stays clean for `--json`.
pub(crate) struct StdinPrompter {
    assume_yes: bool,
    interactive: bool,
}

impl StdinPrompter {
    pub(crate) fn new(assume_yes: bool) -> Self {
        StdinPrompter {
            assume_yes,
            interactive: io::stdin().is_terminal(),
        }
    }

    fn read_line(question: &str) -> Option<String> {
        eprint!("{question}");
        io::stderr().flush().ok()?;
        let stdin = io::stdin();
        let line = stdin.lock().lines().next()?.ok()?;
        Some(line)
    }
}

impl Prompter for StdinPrompter {
    fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        if !self.interactive {
            eprintln!("{message} (not confirmed; pass --yes to proceed)");
            return false;
        }
        Self::read_line(&format!("{message} [y/N]: ")).is_some_and(|l| is_yes(&l))
    }

    fn prompt(&self, message: &str, default: &str) -> Option<String> {
        if !self.interactive {
            return None;
        }
        let line = Self::read_line(&format!("{message} [{default}]: "))?;
        let line = line.trim();
        (!line.is_empty()).then(|| line.to_string())
    }
}

pub(crate) fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Find a recipe by exact id, case-insensitive title, or unique id prefix.
pub(crate) fn resolve_recipe<'a>(state: &'a AppState, query: &str) -> Result<&'a Recipe> {
    let query = query.trim();
    if let Some(recipe) = state.recipe(query) {
        return Ok(recipe);
    }

    let lowered = query.to_lowercase();
    let by_title: Vec<&Recipe> = state
        .recipes
        .iter()
        .filter(|r| r.title.trim().to_lowercase() == lowered)
        .collect();
    match by_title.as_slice() {
        [one] => return Ok(*one),
        [] => {}
        many => bail!(
            "'{query}' matches {} recipes; use an id instead: {}",
            many.len(),
            many.iter().map(|r| short_id(&r.id)).collect::<Vec<_>>().join(", ")
        ),
    }

    let by_prefix: Vec<&Recipe> = state
        .recipes
        .iter()
        .filter(|r| !query.is_empty() && r.id.starts_with(query))
        .collect();
    match by_prefix.as_slice() {
        [one] => Ok(*one),
        [] => Err(CookbookError::not_found("recipe", query).into()),
        _ => bail!("Id prefix '{query}' is ambiguous"),
    }
}

/// Find a category by exact id, case-insensitive name, or unique id prefix.
pub(crate) fn resolve_category<'a>(state: &'a AppState, query: &str) -> Result<&'a Category> {
    let query = query.trim();
    if let Some(category) = state.category(query) {
        return Ok(category);
    }
    let lowered = query.to_lowercase();
    if let Some(category) = state
        .categories
        .iter()
        .find(|c| c.name.to_lowercase() == lowered)
    {
        return Ok(category);
    }
    let by_prefix: Vec<&Category> = state
        .categories
        .iter()
        .filter(|c| !query.is_empty() && c.id.starts_with(query))
        .collect();
    match by_prefix.as_slice() {
        [one] => Ok(*one),
        [] => Err(CookbookError::not_found("category", query).into()),
        _ => bail!("Id prefix '{query}' is ambiguous"),
    }
}

pub(crate) fn read_photos(paths: &[std::path::PathBuf]) -> Result<Vec<Photo>> {
    paths
        .iter()
        .map(|p| {
            std::fs::read(p)
                .map(Photo::from)
                .with_context(|| format!("Failed to read photo: {}", p.display()))
        })
        .collect()
}

pub(crate) fn write_photo(photo: &Photo, out: &Path) -> Result<()> {
    std::fs::write(out, photo.as_bytes())
        .with_context(|| format!("Failed to write photo: {}", out.display()))
}

pub(crate) fn print_recipe_table(state: &AppState, recipes: &[&Recipe]) {
    #[derive(Tabled)]
    struct RecipeRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Title")]
        title: String,
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Ingredients")]
        ingredients: String,
        #[tabled(rename = "Photos")]
        photos: usize,
        #[tabled(rename = "★")]
        favorite: String,
    }

    let rows: Vec<RecipeRow> = recipes
        .iter()
        .map(|r| RecipeRow {
            id: short_id(&r.id).to_string(),
            title: truncate(display_title(r), 35),
            category: state
                .category_name(&r.category_id)
                .map(|n| truncate(n, 20))
                .unwrap_or_default(),
            ingredients: if r.is_photo_only {
                "photo".to_string()
            } else {
                visible_ingredients(r).len().to_string()
            },
            photos: r.photos.len(),
            favorite: if r.is_favorite { "★".into() } else { String::new() },
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..5)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn format_created(millis: i64) -> String {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map_or_else(|| "-".to_string(), |dt| dt.format("%Y-%m-%d %H:%M").to_string())
}

pub(crate) fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
