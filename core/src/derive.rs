//! Pure projections over the state cache.
//!
//! Nothing here is cached: every render recomputes from the current
//! [`AppState`], so a mutation can never leave a stale view behind.

use std::cmp::Ordering;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::models::{Category, Ingredient, Recipe};
use crate::state::AppState;

pub const UNTITLED: &str = "Untitled";

fn matches(recipe: &Recipe, needle: &str) -> bool {
    if recipe.title.to_lowercase().contains(needle) {
        return true;
    }
    visible_ingredients(recipe)
        .iter()
        .any(|i| i.text.to_lowercase().contains(needle))
}

/// Case-insensitive substring search over titles and ingredient text.
/// A blank search returns every recipe in input order.
pub fn filtered_recipes<'a>(search: &str, recipes: &'a [Recipe]) -> Vec<&'a Recipe> {
    let needle = search.trim().to_lowercase();
    if needle.is_empty() {
        return recipes.iter().collect();
    }
    recipes.iter().filter(|r| matches(r, &needle)).collect()
}

pub fn favorites<'a>(search: &str, recipes: &'a [Recipe]) -> Vec<&'a Recipe> {
    filtered_recipes(search, recipes)
        .into_iter()
        .filter(|r| r.is_favorite)
        .collect()
}

/// Base-letter key: decomposed, combining marks dropped, lowercased.
fn collation_key(title: &str) -> String {
    title
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Title order used inside category sections: accent- and case-insensitive,
/// blank titles last. Titles that differ only by accents fall back to their
/// lowercased form, so "pie" and "Pie" still compare equal.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    let a = a.trim();
    let b = b.trim();
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => collation_key(a)
            .cmp(&collation_key(b))
            .then_with(|| a.to_lowercase().cmp(&b.to_lowercase())),
    }
}

/// Recipes of one category, searched, then stably sorted by title.
pub fn by_category<'a>(
    category: &Category,
    search: &str,
    recipes: &'a [Recipe],
) -> Vec<&'a Recipe> {
    let mut items: Vec<&Recipe> = filtered_recipes(search, recipes)
        .into_iter()
        .filter(|r| r.category_id == category.id)
        .collect();
    items.sort_by(|a, b| compare_titles(&a.title, &b.title));
    items
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionKind {
    Favorites,
    Category { id: String },
}

#[derive(Debug, Clone)]
pub struct Section<'a> {
    pub kind: SectionKind,
    pub title: String,
    /// Only ever true for the favorites section.
    pub collapsed: bool,
    pub recipes: Vec<&'a Recipe>,
}

/// The recipes screen: favorites first, then one section per category in order.
/// Sections with no matching recipes are left out.
pub fn sections(state: &AppState) -> Vec<Section<'_>> {
    let mut out = Vec::with_capacity(state.categories.len() + 1);

    let favs = favorites(&state.search, &state.recipes);
    if !favs.is_empty() {
        out.push(Section {
            kind: SectionKind::Favorites,
            title: "Favorites".to_string(),
            collapsed: state.settings.favorites_collapsed,
            recipes: favs,
        });
    }

    for category in &state.categories {
        let items = by_category(category, &state.search, &state.recipes);
        if items.is_empty() {
            continue;
        }
        out.push(Section {
            kind: SectionKind::Category {
                id: category.id.clone(),
            },
            title: category.name.clone(),
            collapsed: false,
            recipes: items,
        });
    }

    out
}

/// Number of recipes filed under each category, in the given category order.
pub fn recipe_counts<'a>(
    categories: &'a [Category],
    recipes: &[Recipe],
) -> Vec<(&'a Category, usize)> {
    categories
        .iter()
        .map(|c| (c, recipes.iter().filter(|r| r.category_id == c.id).count()))
        .collect()
}

pub fn visible_ingredients(recipe: &Recipe) -> &[Ingredient] {
    if recipe.is_photo_only {
        &[]
    } else {
        &recipe.ingredients
    }
}

pub fn visible_instructions(recipe: &Recipe) -> &[String] {
    if recipe.is_photo_only {
        &[]
    } else {
        &recipe.instructions
    }
}

pub fn display_title(recipe: &Recipe) -> &str {
    if recipe.has_title() {
        recipe.title.trim()
    } else {
        UNTITLED
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Ingredient;

    fn recipe(id: &str, title: &str, category_id: &str, ingredients: &[&str]) -> Recipe {
        Recipe {
            id: id.to_string(),
            title: title.to_string(),
            category_id: category_id.to_string(),
            is_favorite: false,
            is_photo_only: false,
            ingredients: ingredients.iter().map(|t| Ingredient::new(*t)).collect(),
            instructions: vec!["Step".to_string()],
            photos: Vec::new(),
            created_at: 0,
        }
    }

    fn category(id: &str, name: &str, order: i64) -> Category {
        Category {
            id: id.to_string(),
            name: name.to_string(),
            order,
        }
    }

    fn ids(recipes: &[&Recipe]) -> Vec<String> {
        recipes.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn test_empty_search_returns_all_in_order() {
        let recipes = vec![
            recipe("b", "Banana Bread", "c1", &[]),
            recipe("a", "Apple Pie", "c1", &[]),
        ];
        assert_eq!(ids(&filtered_recipes("", &recipes)), vec!["b", "a"]);
        assert_eq!(ids(&filtered_recipes("   ", &recipes)), vec!["b", "a"]);
    }

    #[test]
    fn test_search_title_or_ingredient_case_insensitive() {
        let recipes = vec![
            recipe("r1", "Chicken Alfredo", "c1", &["1 jar Alfredo sauce"]),
            recipe("r2", "Pancakes", "c1", &["2 cups FLOUR", "milk"]),
            recipe("r3", "Salad", "c1", &["lettuce"]),
        ];
        assert_eq!(ids(&filtered_recipes("chicken", &recipes)), vec!["r1"]);
        assert_eq!(ids(&filtered_recipes("flour", &recipes)), vec!["r2"]);
        assert_eq!(ids(&filtered_recipes(" SAUCE ", &recipes)), vec!["r1"]);
        assert!(filtered_recipes("tofu", &recipes).is_empty());

        for r in filtered_recipes("a", &recipes) {
            let in_title = r.title.to_lowercase().contains('a');
            let in_ing = r.ingredients.iter().any(|i| i.text.to_lowercase().contains('a'));
            assert!(in_title || in_ing);
        }
    }

    #[test]
    fn test_photo_only_ingredients_not_searched() {
        let mut photo = recipe("p1", "Grandma's card", "c1", &["secret spice"]);
        photo.is_photo_only = true;
        let recipes = vec![photo];
        assert!(filtered_recipes("spice", &recipes).is_empty());
        assert_eq!(ids(&filtered_recipes("grandma", &recipes)), vec!["p1"]);
        assert!(visible_ingredients(&recipes[0]).is_empty());
        assert!(visible_instructions(&recipes[0]).is_empty());
    }

    #[test]
    fn test_by_category_sorted_case_insensitive_and_stable() {
        let recipes = vec![
            recipe("r1", "pie", "c1", &[]),
            recipe("r2", "Apple", "c1", &[]),
            recipe("r3", "Pie", "c1", &[]),
            recipe("r4", "zucchini", "c2", &[]),
            recipe("r5", "banana", "c1", &[]),
        ];
        let cat = category("c1", "Dessert", 0);
        assert_eq!(
            ids(&by_category(&cat, "", &recipes)),
            vec!["r2", "r5", "r1", "r3"]
        );
    }

    #[test]
    fn test_accented_titles_sort_by_base_letter() {
        let recipes = vec![
            recipe("z", "Zucchini bread", "c1", &[]),
            recipe("e", "Éclairs", "c1", &[]),
            recipe("a", "Apple pie", "c1", &[]),
            recipe("c", "Chicken Alfredo", "c1", &[]),
            recipe("d", "Dumplings", "c1", &[]),
        ];
        let cat = category("c1", "Main", 0);
        assert_eq!(
            ids(&by_category(&cat, "", &recipes)),
            vec!["a", "c", "d", "e", "z"]
        );
        assert_eq!(compare_titles("crème brûlée", "Creme brulee"), Ordering::Greater);
        assert_eq!(compare_titles("Crème", "crème"), Ordering::Equal);
    }

    #[test]
    fn test_blank_titles_sort_last() {
        let recipes = vec![
            recipe("blank", "", "c1", &[]),
            recipe("z", "Zebra cake", "c1", &[]),
            recipe("spaces", "   ", "c1", &[]),
            recipe("a", "almond", "c1", &[]),
        ];
        let cat = category("c1", "Dessert", 0);
        assert_eq!(
            ids(&by_category(&cat, "", &recipes)),
            vec!["a", "z", "blank", "spaces"]
        );
    }

    #[test]
    fn test_by_category_applies_search() {
        let recipes = vec![
            recipe("r1", "Apple Pie", "c1", &[]),
            recipe("r2", "Cherry Pie", "c1", &[]),
        ];
        let cat = category("c1", "Dessert", 0);
        assert_eq!(ids(&by_category(&cat, "cherry", &recipes)), vec!["r2"]);
    }

    #[test]
    fn test_favorite_appears_in_both_groupings() {
        let mut fav = recipe("r1", "Alfredo", "c1", &[]);
        fav.is_favorite = true;
        let mut state = AppState::default();
        state.categories = vec![category("c1", "Main", 0), category("c2", "Dessert", 1)];
        state.recipes = vec![fav, recipe("r2", "Brownies", "c2", &[])];

        let secs = sections(&state);
        assert_eq!(secs.len(), 3);
        assert_eq!(secs[0].kind, SectionKind::Favorites);
        assert_eq!(ids(&secs[0].recipes), vec!["r1"]);
        assert_eq!(secs[1].title, "Main");
        assert_eq!(ids(&secs[1].recipes), vec!["r1"]);
        assert_eq!(secs[2].title, "Dessert");
    }

    #[test]
    fn test_sections_skip_empty_and_carry_collapsed_flag() {
        let mut fav = recipe("r1", "Alfredo", "c1", &[]);
        fav.is_favorite = true;
        let mut state = AppState::default();
        state.categories = vec![category("c1", "Main", 0), category("c2", "Empty", 1)];
        state.recipes = vec![fav];
        state.settings.favorites_collapsed = true;

        let secs = sections(&state);
        assert_eq!(secs.len(), 2);
        assert!(secs[0].collapsed);
        assert!(!secs[1].collapsed);

        state.set_search("nothing matches");
        assert!(sections(&state).is_empty());
    }

    #[test]
    fn test_recipe_counts() {
        let categories = vec![category("c1", "Main", 0), category("c2", "Dessert", 1)];
        let recipes = vec![
            recipe("r1", "A", "c1", &[]),
            recipe("r2", "B", "c1", &[]),
            recipe("r3", "C", "c2", &[]),
        ];
        let counts: Vec<usize> = recipe_counts(&categories, &recipes)
            .into_iter()
            .map(|(_, n)| n)
            .collect();
        assert_eq!(counts, vec![2, 1]);
    }

    #[test]
    fn test_display_title() {
        assert_eq!(display_title(&recipe("r1", "  ", "c1", &[])), "Untitled");
        assert_eq!(display_title(&recipe("r1", " Soup ", "c1", &[])), "Soup");
    }
}
