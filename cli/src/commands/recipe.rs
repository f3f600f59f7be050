use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;
use std::process;

use cookbook_core::derive::{
    SectionKind, display_title, sections, visible_ingredients, visible_instructions,
};
use cookbook_core::error::CookbookError;
use cookbook_core::models::{NewRecipe, Recipe, RecipeEdit, split_lines};
use cookbook_core::service::{CookbookService, Prompter};

use super::helpers::{
    format_created, print_recipe_table, read_photos, resolve_category, resolve_recipe, short_id,
};

#[derive(Serialize)]
struct RecipeSummary<'a> {
    id: &'a str,
    title: &'a str,
    category_id: &'a str,
    is_favorite: bool,
    is_photo_only: bool,
    ingredients: usize,
    photos: usize,
}

impl<'a> From<&'a Recipe> for RecipeSummary<'a> {
    fn from(r: &'a Recipe) -> Self {
        RecipeSummary {
            id: &r.id,
            title: &r.title,
            category_id: &r.category_id,
            is_favorite: r.is_favorite,
            is_photo_only: r.is_photo_only,
            ingredients: visible_ingredients(r).len(),
            photos: r.photos.len(),
        }
    }
}

pub(crate) fn cmd_list(svc: &mut CookbookService, search: Option<&str>, json: bool) -> Result<()> {
    #[derive(Serialize)]
    struct SectionOut<'a> {
        title: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        category_id: Option<&'a str>,
        collapsed: bool,
        recipes: Vec<RecipeSummary<'a>>,
    }

    if let Some(search) = search {
        svc.state_mut().set_search(search);
    }
    let state = svc.state();
    let secs = sections(state);

    if secs.is_empty() {
        if json {
            println!("[]");
        } else if let Some(search) = search {
            eprintln!("No recipes match '{search}'");
        } else {
            eprintln!("No recipes found");
        }
        process::exit(2);
    }

    if json {
        let out: Vec<SectionOut> = secs
            .iter()
            .map(|s| SectionOut {
                title: &s.title,
                category_id: match &s.kind {
                    SectionKind::Favorites => None,
                    SectionKind::Category { id } => Some(id.as_str()),
                },
                collapsed: s.collapsed,
                recipes: s.recipes.iter().map(|r| RecipeSummary::from(*r)).collect(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{}\n", state.settings.cookbook_name);
    for section in &secs {
        let count = section.recipes.len();
        if section.collapsed {
            println!("★ {} ({count}, collapsed)\n", section.title);
            continue;
        }
        match section.kind {
            SectionKind::Favorites => println!("★ {} ({count})", section.title),
            SectionKind::Category { .. } => println!("{} ({count})", section.title),
        }
        print_recipe_table(state, &section.recipes);
        println!();
    }
    Ok(())
}

pub(crate) fn cmd_show(svc: &mut CookbookService, query: &str, json: bool) -> Result<()> {
    let id = resolve_recipe(svc.state(), query)?.id.clone();
    svc.state_mut().open_recipe(&id);
    let state = svc.state();
    let Some(recipe) = state.viewing() else {
        return Err(CookbookError::not_found("recipe", id).into());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(recipe)?);
        return Ok(());
    }

    let title = display_title(recipe);
    let category = state.category_name(&recipe.category_id).unwrap_or("?");
    let star = if recipe.is_favorite { " ★" } else { "" };
    println!("=== {title}{star} ===");
    println!(
        "  Category: {category}  |  Photos: {}  |  Added: {}  |  ID: {}",
        recipe.photos.len(),
        format_created(recipe.created_at),
        recipe.id
    );

    if recipe.is_photo_only {
        println!("\n  Photo-only recipe. Use `cookbook photo export` to view the photos.");
        return Ok(());
    }

    let ingredients = visible_ingredients(recipe);
    if !ingredients.is_empty() {
        println!("\n  INGREDIENTS:");
        for (i, ing) in ingredients.iter().enumerate() {
            if state.settings.grocery_mode {
                let mark = if ing.checked { "x" } else { " " };
                println!("    [{mark}] {}. {}", i + 1, ing.text);
            } else {
                println!("    - {}", ing.text);
            }
        }
    }

    let steps = visible_instructions(recipe);
    if !steps.is_empty() {
        println!("\n  INSTRUCTIONS:");
        for (i, step) in steps.iter().enumerate() {
            println!("    {}. {step}", i + 1);
        }
    }
    Ok(())
}

/// Each `-i`/`-s` value may itself hold several lines, e.g. `-s "$(cat steps.txt)"`.
fn input_lines(values: &[String]) -> Vec<String> {
    values.iter().flat_map(|v| split_lines(v)).collect()
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_add(
    svc: &mut CookbookService,
    title: &str,
    category: Option<&str>,
    ingredients: &[String],
    steps: &[String],
    photos: &[PathBuf],
    photo_only: bool,
    json: bool,
) -> Result<()> {
    let category_id = match category {
        Some(query) => resolve_category(svc.state(), query)?.id.clone(),
        // Defaults to the first category, like a fresh add form.
        None => svc
            .state()
            .categories
            .first()
            .map(|c| c.id.clone())
            .unwrap_or_default(),
    };
    let new = NewRecipe {
        title: title.to_string(),
        category_id,
        ingredients: input_lines(ingredients),
        instructions: input_lines(steps),
        photos: read_photos(photos)?,
        photo_only,
    };
    let recipe = svc.create_recipe(new)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&RecipeSummary::from(&recipe))?);
    } else {
        println!(
            "Added recipe: {} (id: {})",
            display_title(&recipe),
            short_id(&recipe.id)
        );
    }
    Ok(())
}

/// What `cookbook edit` changes. Unset fields keep their current value.
#[derive(Debug, Default)]
pub(crate) struct EditRequest {
    pub title: Option<String>,
    pub category: Option<String>,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    /// Drop the current ingredients before applying `ingredients`.
    pub clear_ingredients: bool,
    pub clear_steps: bool,
    /// Appended after the existing photos.
    pub photos: Vec<PathBuf>,
}

/// Given lines replace the current list; none given keeps it unless `clear` is set.
fn edited_lines(current: Vec<String>, given: &[String], clear: bool) -> Vec<String> {
    if given.is_empty() && !clear {
        current
    } else {
        input_lines(given)
    }
}

pub(crate) fn cmd_edit(
    svc: &mut CookbookService,
    query: &str,
    request: EditRequest,
    json: bool,
) -> Result<()> {
    let id = resolve_recipe(svc.state(), query)?.id.clone();
    svc.state_mut().start_editing(&id);
    let existing = svc
        .state()
        .editing()
        .cloned()
        .ok_or_else(|| CookbookError::not_found("recipe", &id))?;

    let category_id = match request.category.as_deref() {
        Some(query) => resolve_category(svc.state(), query)?.id.clone(),
        None => existing.category_id.clone(),
    };
    let current_ingredients = existing.ingredients.iter().map(|i| i.text.clone()).collect();
    let edit = RecipeEdit {
        title: request.title.unwrap_or_else(|| existing.title.clone()),
        category_id,
        ingredients: edited_lines(
            current_ingredients,
            &request.ingredients,
            request.clear_ingredients,
        ),
        instructions: edited_lines(
            existing.instructions.clone(),
            &request.steps,
            request.clear_steps,
        ),
        new_photos: read_photos(&request.photos)?,
    };
    let recipe = svc.update_recipe(&existing.id, edit)?;
    svc.state_mut().back();

    if json {
        println!("{}", serde_json::to_string_pretty(&RecipeSummary::from(&recipe))?);
    } else {
        println!("Updated recipe: {}", display_title(&recipe));
    }
    Ok(())
}

pub(crate) fn cmd_favorite(svc: &mut CookbookService, query: &str, json: bool) -> Result<()> {
    let recipe = resolve_recipe(svc.state(), query)?.clone();
    let favorite = svc.toggle_favorite(&recipe.id)?;
    if json {
        println!("{}", serde_json::json!({ "id": recipe.id, "is_favorite": favorite }));
    } else if favorite {
        println!("★ Added {} to favorites", display_title(&recipe));
    } else {
        println!("Removed {} from favorites", display_title(&recipe));
    }
    Ok(())
}

/// `number` is the 1-based position shown by `cookbook show`.
pub(crate) fn cmd_check(
    svc: &mut CookbookService,
    query: &str,
    number: usize,
    uncheck: bool,
    json: bool,
) -> Result<()> {
    let recipe = resolve_recipe(svc.state(), query)?;
    let ingredient = number
        .checked_sub(1)
        .and_then(|idx| visible_ingredients(recipe).get(idx))
        .ok_or_else(|| CookbookError::not_found("ingredient", number.to_string()))?;
    let (recipe_id, ingredient_id) = (recipe.id.clone(), ingredient.id.clone());

    svc.set_ingredient_checked(&recipe_id, &ingredient_id, !uncheck)?;
    let ingredient = svc
        .state()
        .recipe(&recipe_id)
        .and_then(|r| r.ingredient(&ingredient_id))
        .ok_or_else(|| CookbookError::not_found("ingredient", &ingredient_id))?;
    if json {
        println!(
            "{}",
            serde_json::json!({ "ingredient_id": ingredient.id, "checked": ingredient.checked })
        );
    } else {
        let mark = if ingredient.checked { "x" } else { " " };
        println!("[{mark}] {}", ingredient.text);
    }
    Ok(())
}

pub(crate) fn cmd_reset(svc: &mut CookbookService, query: &str, json: bool) -> Result<()> {
    let recipe = resolve_recipe(svc.state(), query)?.clone();
    svc.reset_ingredient_checks(&recipe.id)?;
    if json {
        println!("{}", serde_json::json!({ "reset": recipe.id }));
    } else {
        println!("Cleared all checks on {}", display_title(&recipe));
    }
    Ok(())
}

pub(crate) fn cmd_delete(
    svc: &mut CookbookService,
    query: &str,
    prompter: &dyn Prompter,
    json: bool,
) -> Result<()> {
    let recipe = resolve_recipe(svc.state(), query)?.clone();
    let title = display_title(&recipe);
    if !prompter.confirm(&format!("Delete \"{title}\"?")) {
        if json {
            println!("{}", serde_json::json!({ "deleted": false }));
        } else {
            println!("Cancelled");
        }
        return Ok(());
    }

    svc.delete_recipe(&recipe.id)?;
    if json {
        println!("{}", serde_json::json!({ "deleted": true, "id": recipe.id }));
    } else {
        println!("Deleted recipe: {title}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Always(bool);

    impl Prompter for Always {
        fn confirm(&self, _message: &str) -> bool {
            self.0
        }
        fn prompt(&self, _message: &str, _default: &str) -> Option<String> {
            None
        }
    }

    fn alfredo(svc: &CookbookService) -> Recipe {
        resolve_recipe(svc.state(), "chicken alfredo").unwrap().clone()
    }

    #[test]
    fn test_add_defaults_to_first_category() {
        let mut svc = CookbookService::new_in_memory().unwrap();
        cmd_add(
            &mut svc,
            "Brownies",
            None,
            &["cocoa".to_string()],
            &["Bake".to_string()],
            &[],
            false,
            true,
        )
        .unwrap();
        let recipe = resolve_recipe(svc.state(), "brownies").unwrap();
        assert_eq!(svc.state().category_name(&recipe.category_id), Some("Main"));
    }

    #[test]
    fn test_add_to_named_category() {
        let mut svc = CookbookService::new_in_memory().unwrap();
        cmd_add(&mut svc, "Pie", Some("dessert"), &[], &[], &[], false, true).unwrap();
        let recipe = resolve_recipe(svc.state(), "pie").unwrap();
        assert_eq!(svc.state().category_name(&recipe.category_id), Some("Dessert"));
    }

    #[test]
    fn test_edit_keeps_unset_fields() {
        let mut svc = CookbookService::new_in_memory().unwrap();
        let before = alfredo(&svc);
        let request = EditRequest {
            category: Some("Dessert".into()),
            ..EditRequest::default()
        };
        cmd_edit(&mut svc, &before.id, request, true).unwrap();
        let after = svc.state().recipe(&before.id).unwrap();
        assert_eq!(after.title, before.title);
        assert_eq!(after.ingredients, before.ingredients);
        assert_eq!(after.instructions, before.instructions);
        assert_eq!(svc.state().category_name(&after.category_id), Some("Dessert"));
    }

    #[test]
    fn test_edit_clears_lists() {
        let mut svc = CookbookService::new_in_memory().unwrap();
        let before = alfredo(&svc);
        let request = EditRequest {
            clear_ingredients: true,
            steps: vec!["Reheat".into()],
            ..EditRequest::default()
        };
        cmd_edit(&mut svc, &before.id, request, true).unwrap();
        let after = svc.state().recipe(&before.id).unwrap();
        assert!(after.ingredients.is_empty());
        assert_eq!(after.instructions, vec!["Reheat"]);

        let request = EditRequest {
            clear_steps: true,
            ingredients: vec!["1 lb chicken".into()],
            ..EditRequest::default()
        };
        cmd_edit(&mut svc, &before.id, request, true).unwrap();
        let after = svc.state().recipe(&before.id).unwrap();
        assert_eq!(after.ingredients.len(), 1);
        assert!(after.instructions.is_empty());
        assert_eq!(svc.state().screen, cookbook_core::state::Screen::Recipe);
    }

    #[test]
    fn test_multiline_values_split_into_lines() {
        let mut svc = CookbookService::new_in_memory().unwrap();
        cmd_add(
            &mut svc,
            "Soup",
            None,
            &["water\n\n  salt ".to_string()],
            &["Boil\r\nSeason".to_string(), "Serve".to_string()],
            &[],
            false,
            true,
        )
        .unwrap();
        let soup = resolve_recipe(svc.state(), "soup").unwrap();
        let texts: Vec<&str> = soup.ingredients.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["water", "salt"]);
        assert_eq!(soup.instructions, vec!["Boil", "Season", "Serve"]);
    }

    #[test]
    fn test_check_by_position() {
        let mut svc = CookbookService::new_in_memory().unwrap();
        let recipe = alfredo(&svc);
        cmd_check(&mut svc, &recipe.id, 2, false, true).unwrap();
        let cached = svc.state().recipe(&recipe.id).unwrap();
        assert!(!cached.ingredients[0].checked);
        assert!(cached.ingredients[1].checked);

        let err = cmd_check(&mut svc, &recipe.id, 0, false, true).unwrap_err();
        assert!(err.downcast_ref::<CookbookError>().unwrap().is_not_found());
        assert!(cmd_check(&mut svc, &recipe.id, 3, false, true).is_err());
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let mut svc = CookbookService::new_in_memory().unwrap();
        let recipe = alfredo(&svc);
        cmd_delete(&mut svc, &recipe.id, &Always(false), true).unwrap();
        assert_eq!(svc.state().recipes.len(), 1);
        cmd_delete(&mut svc, &recipe.id, &Always(true), true).unwrap();
        assert!(svc.state().recipes.is_empty());
    }

    #[test]
    fn test_favorite_toggles() {
        let mut svc = CookbookService::new_in_memory().unwrap();
        let recipe = alfredo(&svc);
        assert!(recipe.is_favorite);
        cmd_favorite(&mut svc, &recipe.id, true).unwrap();
        assert!(!svc.state().recipe(&recipe.id).unwrap().is_favorite);
    }
}
