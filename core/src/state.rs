use serde::Serialize;
use tracing::debug;

use crate::db::Database;
use crate::error::Result;
use crate::models::{Category, Recipe};
use crate::settings::{Setting, SettingKey, Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    #[default]
    Recipes,
    Add,
    Edit,
    Recipe,
    Settings,
}

/// In-memory mirror of the store plus UI-only selection state.
///
/// Store-backed fields are only ever replaced wholesale by [`AppState::reload`];
/// the transient fields (`screen`, `search`, `editing_id`, `viewing_id`) survive it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AppState {
    pub screen: Screen,
    pub search: String,
    /// Sorted by `order` ascending.
    pub categories: Vec<Category>,
    /// Natural store order.
    pub recipes: Vec<Recipe>,
    pub settings: Settings,
    pub editing_id: Option<String>,
    pub viewing_id: Option<String>,
}

impl AppState {
    pub fn load(db: &Database) -> Result<Self> {
        let mut state = AppState::default();
        state.reload(db)?;
        Ok(state)
    }

    pub fn reload(&mut self, db: &Database) -> Result<()> {
        let mut categories = db.all_categories()?;
        categories.sort_by_key(|c| c.order);
        let recipes = db.all_recipes()?;
        let settings = load_settings(db)?;

        self.categories = categories;
        self.recipes = recipes;
        self.settings = settings;
        debug!(
            categories = self.categories.len(),
            recipes = self.recipes.len(),
            "state reloaded"
        );
        Ok(())
    }

    /// Swap a single cached recipe for the copy that was just written.
    pub(crate) fn replace_recipe(&mut self, recipe: Recipe) {
        if let Some(slot) = self.recipes.iter_mut().find(|r| r.id == recipe.id) {
            *slot = recipe;
        }
    }

    pub fn recipe(&self, id: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.id == id)
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn category_name(&self, id: &str) -> Option<&str> {
        self.category(id).map(|c| c.name.as_str())
    }

    pub fn viewing(&self) -> Option<&Recipe> {
        self.viewing_id.as_deref().and_then(|id| self.recipe(id))
    }

    pub fn editing(&self) -> Option<&Recipe> {
        self.editing_id.as_deref().and_then(|id| self.recipe(id))
    }

    // --- Navigation ---

    pub fn set_search(&mut self, search: &str) {
        self.search = search.to_string();
    }

    pub fn open_recipe(&mut self, id: &str) {
        self.viewing_id = Some(id.to_string());
        self.screen = Screen::Recipe;
    }

    pub fn start_editing(&mut self, id: &str) {
        self.editing_id = Some(id.to_string());
        self.viewing_id = Some(id.to_string());
        self.screen = Screen::Edit;
    }

    pub fn show(&mut self, screen: Screen) {
        self.screen = screen;
    }

    pub fn back(&mut self) {
        match self.screen {
            Screen::Edit => {
                self.editing_id = None;
                self.screen = Screen::Recipe;
            }
            Screen::Recipe => {
                self.viewing_id = None;
                self.screen = Screen::Recipes;
            }
            Screen::Add | Screen::Settings | Screen::Recipes => self.screen = Screen::Recipes,
        }
    }

    /// Drop selections that point at recipes no longer in the cache.
    pub(crate) fn clear_stale_selection(&mut self) {
        if self.viewing_id.as_deref().is_some_and(|id| self.recipe(id).is_none()) {
            self.viewing_id = None;
            if self.screen == Screen::Recipe {
                self.screen = Screen::Recipes;
            }
        }
        if self.editing_id.as_deref().is_some_and(|id| self.recipe(id).is_none()) {
            self.editing_id = None;
            if self.screen == Screen::Edit {
                self.screen = Screen::Recipes;
            }
        }
    }
}

/// Read every setting key, falling back to its default when absent or malformed.
pub fn load_settings(db: &Database) -> Result<Settings> {
    let mut settings = Settings::default();
    for key in SettingKey::ALL {
        if let Some(value) = db.get_setting(key.as_str())? {
            if let Some(setting) = Setting::from_value(key, &value) {
                settings.apply(setting);
            }
        }
    }
    Ok(settings)
}
