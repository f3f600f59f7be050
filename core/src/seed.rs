use tracing::info;

use crate::db::Database;
use crate::error::Result;
use crate::models::{Category, Ingredient, Recipe, new_id, now_millis};
use crate::settings::{Setting, Settings};

/// Seed a brand-new store. Only runs when no category exists, so calling it on
/// every boot never duplicates data. Returns whether anything was written.
pub fn ensure_seed(db: &Database) -> Result<bool> {
    if !db.all_categories()?.is_empty() {
        return Ok(false);
    }

    let main = Category {
        id: new_id(),
        name: "Main".to_string(),
        order: 0,
    };
    let dessert = Category {
        id: new_id(),
        name: "Dessert".to_string(),
        order: 1,
    };
    db.put_category(&main)?;
    db.put_category(&dessert)?;

    let sample = Recipe {
        id: new_id(),
        title: "Chicken Alfredo".to_string(),
        category_id: main.id.clone(),
        is_favorite: true,
        is_photo_only: false,
        ingredients: vec![
            Ingredient::new("1 lb chicken"),
            Ingredient::new("1 jar Alfredo sauce"),
        ],
        instructions: vec![
            "Boil pasta".to_string(),
            "Cook chicken".to_string(),
            "Combine".to_string(),
        ],
        photos: Vec::new(),
        created_at: now_millis(),
    };
    db.put_recipe(&sample)?;

    let defaults = Settings::default();
    for setting in [
        Setting::FavoritesCollapsed(defaults.favorites_collapsed),
        Setting::GroceryMode(defaults.grocery_mode),
        Setting::CookbookName(defaults.cookbook_name.clone()),
        Setting::Theme(defaults.theme),
    ] {
        db.set_setting(setting.key().as_str(), &setting.to_value())?;
    }

    info!("seeded empty cookbook with default categories and a sample recipe");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_seed_empty_store() {
        let db = Database::open_in_memory().unwrap();
        assert!(ensure_seed(&db).unwrap());

        let mut categories = db.all_categories().unwrap();
        categories.sort_by_key(|c| c.order);
        let names: Vec<(&str, i64)> = categories
            .iter()
            .map(|c| (c.name.as_str(), c.order))
            .collect();
        assert_eq!(names, vec![("Main", 0), ("Dessert", 1)]);

        let recipes = db.all_recipes().unwrap();
        assert_eq!(recipes.len(), 1);
        let r = &recipes[0];
        assert_eq!(r.title, "Chicken Alfredo");
        assert_eq!(r.category_id, categories[0].id);
        assert!(r.is_favorite);
        assert!(!r.is_photo_only);
        assert_eq!(r.ingredients.len(), 2);
        assert!(r.ingredients.iter().all(|i| !i.checked));
        assert_ne!(r.ingredients[0].id, r.ingredients[1].id);
        assert_eq!(r.instructions.len(), 3);
        assert!(r.photos.is_empty());

        assert_eq!(db.get_setting("groceryMode").unwrap(), Some(Value::Bool(true)));
        assert_eq!(
            db.get_setting("theme").unwrap(),
            Some(Value::String("charcoal".into()))
        );
        assert!(db.get_setting("hasPromptedCookbookName").unwrap().is_none());
    }

    #[test]
    fn test_seed_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        assert!(ensure_seed(&db).unwrap());
        assert!(!ensure_seed(&db).unwrap());
        assert_eq!(db.all_categories().unwrap().len(), 2);
        assert_eq!(db.all_recipes().unwrap().len(), 1);
    }

    #[test]
    fn test_seed_skipped_when_categories_exist() {
        let db = Database::open_in_memory().unwrap();
        db.put_category(&Category {
            id: "c1".to_string(),
            name: "Soups".to_string(),
            order: 0,
        })
        .unwrap();
        assert!(!ensure_seed(&db).unwrap());
        assert!(db.all_recipes().unwrap().is_empty());
    }
}
