use std::path::Path;

use tracing::{debug, info, warn};

use crate::backup::{self, Backup};
use crate::db::Database;
use crate::error::{CookbookError, Result};
use crate::models::{
    Category, DEFAULT_COOKBOOK_NAME, Direction, ImportSummary, Ingredient, NewRecipe, Photo,
    Recipe, RecipeEdit, clean_lines, new_id, now_millis, reconcile_ingredients,
};
use crate::seed::ensure_seed;
use crate::settings::Setting;
use crate::state::AppState;

/// Confirmation and free-text prompts, supplied by whatever is presenting the cookbook.
///
/// Called synchronously; the core waits for the answer before writing anything.
pub trait Prompter {
    fn confirm(&self, message: &str) -> bool;
    fn prompt(&self, message: &str, default: &str) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryDeletion {
    /// No recipe referenced the category.
    Deleted,
    /// Recipes were moved to `target` before the category was removed.
    Reassigned { recipes: usize, target: Category },
    /// The user declined; nothing changed.
    Cancelled,
}

/// Every mutation validates, writes to the store, then rebuilds the state cache.
pub struct CookbookService {
    db: Database,
    state: AppState,
}

impl CookbookService {
    pub fn open(path: &Path) -> Result<Self> {
        Self::boot(Database::open(path)?)
    }

    pub fn new_in_memory() -> Result<Self> {
        Self::boot(Database::open_in_memory()?)
    }

    fn boot(db: Database) -> Result<Self> {
        ensure_seed(&db)?;
        let state = AppState::load(&db)?;
        Ok(Self { db, state })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// For UI-only fields (screen, search, selection).
    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn reload(&mut self) -> Result<()> {
        self.state.reload(&self.db)?;
        self.state.clear_stale_selection();
        Ok(())
    }

    /// Ask for a cookbook name the first time only. Returns whether the prompt ran.
    pub fn ensure_cookbook_named(&mut self, prompter: &dyn Prompter) -> Result<bool> {
        if self.state.settings.has_prompted_cookbook_name {
            return Ok(false);
        }
        let answer = prompter
            .prompt("Name your cookbook:", DEFAULT_COOKBOOK_NAME)
            .unwrap_or_default();
        self.write_setting(&Setting::cookbook_name(&answer))?;
        self.write_setting(&Setting::HasPromptedCookbookName(true))?;
        self.reload()?;
        Ok(true)
    }

    fn require_recipe(&self, id: &str) -> Result<Recipe> {
        self.db
            .get_recipe(id)?
            .ok_or_else(|| CookbookError::not_found("recipe", id))
    }

    fn require_category(&self, id: &str) -> Result<Category> {
        self.db
            .get_category(id)?
            .ok_or_else(|| CookbookError::not_found("category", id))
    }

    fn sorted_categories(&self) -> Result<Vec<Category>> {
        let mut categories = self.db.all_categories()?;
        categories.sort_by_key(|c| c.order);
        Ok(categories)
    }

    // --- Recipes ---

    pub fn create_recipe(&mut self, new: NewRecipe) -> Result<Recipe> {
        if self.db.all_categories()?.is_empty() {
            return Err(CookbookError::invariant(
                "Create a category before adding recipes",
            ));
        }
        self.require_category(&new.category_id)?;

        let title = new.title.trim().to_string();
        let (ingredients, instructions) = if new.photo_only {
            if new.photos.is_empty() {
                return Err(CookbookError::validation(
                    "Photo-only recipes need at least one photo",
                ));
            }
            (Vec::new(), Vec::new())
        } else {
            let ingredients: Vec<Ingredient> = clean_lines(&new.ingredients)
                .into_iter()
                .map(Ingredient::new)
                .collect();
            let instructions = clean_lines(&new.instructions);
            if title.is_empty()
                && ingredients.is_empty()
                && instructions.is_empty()
                && new.photos.is_empty()
            {
                return Err(CookbookError::validation(
                    "Recipe is empty: add a title, an ingredient, a step or a photo",
                ));
            }
            (ingredients, instructions)
        };

        let recipe = Recipe {
            id: new_id(),
            title,
            category_id: new.category_id,
            is_favorite: false,
            is_photo_only: new.photo_only,
            ingredients,
            instructions,
            photos: new.photos,
            created_at: now_millis(),
        };
        self.db.put_recipe(&recipe)?;
        info!(recipe = %recipe.id, photo_only = recipe.is_photo_only, "created recipe");
        self.reload()?;
        Ok(recipe)
    }

    pub fn update_recipe(&mut self, id: &str, edit: RecipeEdit) -> Result<Recipe> {
        let mut recipe = self.require_recipe(id)?;
        self.require_category(&edit.category_id)?;

        recipe.title = edit.title.trim().to_string();
        recipe.category_id = edit.category_id;
        recipe.ingredients = reconcile_ingredients(&recipe.ingredients, &edit.ingredients);
        recipe.instructions = clean_lines(&edit.instructions);
        recipe.photos.extend(edit.new_photos);

        self.db.put_recipe(&recipe)?;
        info!(recipe = %recipe.id, "updated recipe");
        self.reload()?;
        Ok(recipe)
    }

    /// Returns the new favorite flag.
    pub fn toggle_favorite(&mut self, id: &str) -> Result<bool> {
        let mut recipe = self.require_recipe(id)?;
        recipe.is_favorite = !recipe.is_favorite;
        self.db.put_recipe(&recipe)?;
        info!(recipe = %recipe.id, favorite = recipe.is_favorite, "toggled favorite");
        self.reload()?;
        Ok(recipe.is_favorite)
    }

    /// Direct write: only the cached copy of this recipe is refreshed.
    pub fn set_ingredient_checked(
        &mut self,
        recipe_id: &str,
        ingredient_id: &str,
        checked: bool,
    ) -> Result<()> {
        let mut recipe = self.require_recipe(recipe_id)?;
        let ingredient = recipe
            .ingredients
            .iter_mut()
            .find(|i| i.id == ingredient_id)
            .ok_or_else(|| CookbookError::not_found("ingredient", ingredient_id))?;
        ingredient.checked = checked;
        self.db.put_recipe(&recipe)?;
        self.state.replace_recipe(recipe);
        Ok(())
    }

    pub fn reset_ingredient_checks(&mut self, id: &str) -> Result<()> {
        let mut recipe = self.require_recipe(id)?;
        for ingredient in &mut recipe.ingredients {
            ingredient.checked = false;
        }
        self.db.put_recipe(&recipe)?;
        info!(recipe = %recipe.id, "reset ingredient checks");
        self.reload()
    }

    pub fn delete_recipe(&mut self, id: &str) -> Result<()> {
        if !self.db.delete_recipe(id)? {
            return Err(CookbookError::not_found("recipe", id));
        }
        info!(recipe = %id, "deleted recipe");
        self.reload()
    }

    /// Append photos in the given order. Returns the new photo count.
    pub fn add_photos(&mut self, id: &str, photos: Vec<Photo>) -> Result<usize> {
        let mut recipe = self.require_recipe(id)?;
        if photos.is_empty() {
            return Ok(recipe.photos.len());
        }
        recipe.photos.extend(photos);
        self.db.put_recipe(&recipe)?;
        info!(recipe = %recipe.id, photos = recipe.photos.len(), "added photos");
        self.reload()?;
        Ok(recipe.photos.len())
    }

    pub fn remove_photo(&mut self, id: &str, index: usize) -> Result<()> {
        let mut recipe = self.require_recipe(id)?;
        if index >= recipe.photos.len() {
            return Err(CookbookError::not_found("photo", index.to_string()));
        }
        recipe.photos.remove(index);
        self.db.put_recipe(&recipe)?;
        info!(recipe = %recipe.id, index, "removed photo");
        self.reload()
    }

    // --- Categories ---

    pub fn create_category(&mut self, name: &str) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CookbookError::validation("Category name cannot be empty"));
        }
        let order = self
            .db
            .all_categories()?
            .iter()
            .map(|c| c.order)
            .max()
            .map_or(0, |max| max + 1);
        let category = Category {
            id: new_id(),
            name: name.to_string(),
            order,
        };
        self.db.put_category(&category)?;
        info!(category = %category.id, order, "created category");
        self.reload()?;
        Ok(category)
    }

    /// Swap positions with the neighbour in `direction`. Returns false at either end.
    pub fn move_category(&mut self, id: &str, direction: Direction) -> Result<bool> {
        let mut sorted = self.sorted_categories()?;
        let idx = sorted
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| CookbookError::not_found("category", id))?;
        let Some(swap_idx) = idx.checked_add_signed(direction.offset()) else {
            return Ok(false);
        };
        if swap_idx >= sorted.len() {
            return Ok(false);
        }

        // Swapping two equal orders would change nothing; spread the list out first.
        if sorted[idx].order == sorted[swap_idx].order {
            for (order, category) in (0..).zip(sorted.iter_mut()) {
                category.order = order;
                self.db.put_category(category)?;
            }
            debug!(count = sorted.len(), "renumbered tied category orders");
        }

        let mut a = sorted[idx].clone();
        let mut b = sorted[swap_idx].clone();
        std::mem::swap(&mut a.order, &mut b.order);
        self.db.put_category(&a)?;
        self.db.put_category(&b)?;
        info!(category = %a.id, ?direction, "moved category");
        self.reload()?;
        Ok(true)
    }

    pub fn rename_category(&mut self, id: &str, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CookbookError::validation("Category name cannot be empty"));
        }
        let mut category = self.require_category(id)?;
        category.name = name.to_string();
        self.db.put_category(&category)?;
        info!(category = %category.id, "renamed category");
        self.reload()
    }

    /// Delete a category, moving its recipes to the first remaining category
    /// (by order) once the user confirms. The last category can never be deleted.
    ///
    /// The reassignment is a sequence of single-recipe writes, not one transaction.
    pub fn delete_category(
        &mut self,
        id: &str,
        prompter: &dyn Prompter,
    ) -> Result<CategoryDeletion> {
        let categories = self.sorted_categories()?;
        let category = categories
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| CookbookError::not_found("category", id))?;

        let Some(target) = categories.iter().find(|c| c.id != id).cloned() else {
            warn!(category = %id, "refusing to delete the only category");
            return Err(CookbookError::invariant(
                "Create another category before deleting the last one.",
            ));
        };

        let affected: Vec<Recipe> = self
            .db
            .all_recipes()?
            .into_iter()
            .filter(|r| r.category_id == id)
            .collect();

        if affected.is_empty() {
            self.db.delete_category(id)?;
            info!(category = %id, "deleted category");
            self.reload()?;
            return Ok(CategoryDeletion::Deleted);
        }

        let message = format!(
            "\"{}\" has {} recipe(s). Move them to \"{}\" and delete?",
            category.name,
            affected.len(),
            target.name
        );
        if !prompter.confirm(&message) {
            return Ok(CategoryDeletion::Cancelled);
        }

        let count = affected.len();
        for mut recipe in affected {
            recipe.category_id = target.id.clone();
            self.db.put_recipe(&recipe)?;
        }
        self.db.delete_category(id)?;
        info!(
            category = %id,
            target = %target.id,
            recipes = count,
            "deleted category with reassignment"
        );
        self.reload()?;
        Ok(CategoryDeletion::Reassigned {
            recipes: count,
            target,
        })
    }

    // --- Settings ---

    fn write_setting(&self, setting: &Setting) -> Result<()> {
        self.db.set_setting(setting.key().as_str(), &setting.to_value())
    }

    pub fn update_setting(&mut self, setting: Setting) -> Result<()> {
        let setting = match setting {
            Setting::CookbookName(name) => Setting::cookbook_name(&name),
            Setting::HasPromptedCookbookName(false) => {
                warn!("refused to reset the cookbook name prompt flag");
                return Err(CookbookError::validation(
                    "hasPromptedCookbookName can only be set to true",
                ));
            }
            other => other,
        };
        self.write_setting(&setting)?;
        info!(key = setting.key().as_str(), "updated setting");
        self.reload()
    }

    // --- Backup ---

    pub fn export_all(&self) -> Result<Backup> {
        backup::export_all(&self.db)
    }

    pub fn import_all(&mut self, data: &Backup) -> Result<ImportSummary> {
        let summary = backup::import_all(&self.db, data)?;
        self.reload()?;
        Ok(summary)
    }
}
