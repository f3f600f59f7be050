use std::collections::HashSet;

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::db::Database;
use crate::error::{CookbookError, Result};
use crate::models::{Category, ImportSummary, Recipe, new_id};
use crate::settings::{Setting, SettingKey};

pub const BACKUP_VERSION: i64 = 1;

/// Whole-cookbook snapshot. Photos travel base64-encoded inside each recipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Backup {
    pub version: i64,
    pub exported_at: String,
    pub categories: Vec<Category>,
    pub recipes: Vec<Recipe>,
    #[serde(default)]
    pub settings: Map<String, Value>,
}

pub fn export_all(db: &Database) -> Result<Backup> {
    let mut categories = db.all_categories()?;
    categories.sort_by_key(|c| c.order);
    let recipes = db.all_recipes()?;
    let settings: Map<String, Value> = db.all_settings()?.into_iter().collect();

    Ok(Backup {
        version: BACKUP_VERSION,
        exported_at: Local::now().to_rfc3339(),
        categories,
        recipes,
        settings,
    })
}

fn placed_categories(db: &Database, incoming: &[Category]) -> Result<Vec<Category>> {
    let incoming_ids: HashSet<&str> = incoming.iter().map(|c| c.id.as_str()).collect();
    let kept: Vec<Category> = db
        .all_categories()?
        .into_iter()
        .filter(|c| !incoming_ids.contains(c.id.as_str()))
        .collect();

    let mut placed = incoming.to_vec();
    placed.sort_by_key(|c| c.order);

    let mut taken: HashSet<i64> = kept.iter().map(|c| c.order).collect();
    let collides = placed.iter().any(|c| !taken.insert(c.order));
    if collides {
        let base = kept.iter().map(|c| c.order).max().map_or(0, |m| m + 1);
        for (order, category) in (base..).zip(placed.iter_mut()) {
            category.order = order;
        }
        info!(from = base, count = placed.len(), "renumbered imported categories");
    }
    Ok(placed)
}

/// Upsert everything in the backup by id.
///
/// Incoming categories keep their `order` unless one collides with a stored
/// category (or another incoming one); then all of them are renumbered after the
/// current maximum, keeping their relative order from the backup.
///
/// Recipes whose category exists neither locally nor in the backup are moved to
/// the first category by order; when the store has no category at all, an
/// "Imported" category is created to receive them.
pub fn import_all(db: &Database, backup: &Backup) -> Result<ImportSummary> {
    if backup.version != BACKUP_VERSION {
        return Err(CookbookError::validation(format!(
            "Unsupported backup version {} (expected {BACKUP_VERSION})",
            backup.version
        )));
    }

    let mut summary = ImportSummary {
        categories_imported: 0,
        recipes_imported: 0,
        settings_imported: 0,
        recipes_reassigned: 0,
    };

    for category in &placed_categories(db, &backup.categories)? {
        db.put_category(category)?;
        summary.categories_imported += 1;
    }

    let mut categories = db.all_categories()?;
    if categories.is_empty() && !backup.recipes.is_empty() {
        let imported = Category {
            id: new_id(),
            name: "Imported".to_string(),
            order: 0,
        };
        db.put_category(&imported)?;
        categories.push(imported);
    }
    categories.sort_by_key(|c| c.order);

    for recipe in &backup.recipes {
        let mut recipe = recipe.clone();
        if !categories.iter().any(|c| c.id == recipe.category_id) {
            // Non-empty here: an "Imported" category was created above if needed.
            if let Some(fallback) = categories.first() {
                warn!(
                    recipe = %recipe.id,
                    missing = %recipe.category_id,
                    target = %fallback.name,
                    "imported recipe references unknown category, reassigning"
                );
                recipe.category_id = fallback.id.clone();
                summary.recipes_reassigned += 1;
            }
        }
        db.put_recipe(&recipe)?;
        summary.recipes_imported += 1;
    }

    for (key, value) in &backup.settings {
        let Some(setting_key) = SettingKey::from_key(key) else {
            warn!(key = %key, "skipping unknown setting in backup");
            continue;
        };
        match Setting::from_value(setting_key, value) {
            // The name prompt flag only ever goes from false to true.
            Some(Setting::HasPromptedCookbookName(false)) => {
                debug!("backup has the name prompt pending, keeping the local flag");
            }
            Some(setting) => {
                db.set_setting(setting_key.as_str(), &setting.to_value())?;
                summary.settings_imported += 1;
            }
            None => {}
        }
    }

    info!(
        categories = summary.categories_imported,
        recipes = summary.recipes_imported,
        settings = summary.settings_imported,
        reassigned = summary.recipes_reassigned,
        "imported backup"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Photo;
    use crate::seed::ensure_seed;

    #[test]
    fn test_import_into_seeded_store_keeps_orders_distinct() {
        let source = Database::open_in_memory().unwrap();
        ensure_seed(&source).unwrap();
        let backup = export_all(&source).unwrap();

        let target = Database::open_in_memory().unwrap();
        ensure_seed(&target).unwrap();
        import_all(&target, &backup).unwrap();

        let mut categories = target.all_categories().unwrap();
        categories.sort_by_key(|c| c.order);
        let orders: Vec<i64> = categories.iter().map(|c| c.order).collect();
        assert_eq!(orders, vec![0, 1, 2, 3]);
        let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Main", "Dessert", "Main", "Dessert"]);
        assert_eq!(categories[2].id, backup.categories[0].id);
    }

    #[test]
    fn test_import_reimport_same_backup_keeps_orders() {
        let db = Database::open_in_memory().unwrap();
        ensure_seed(&db).unwrap();
        let backup = export_all(&db).unwrap();
        import_all(&db, &backup).unwrap();

        let mut orders: Vec<i64> = db
            .all_categories()
            .unwrap()
            .iter()
            .map(|c| c.order)
            .collect();
        orders.sort_unstable();
        assert_eq!(orders, vec![0, 1]);
    }

    #[test]
    fn test_import_renumbers_ties_inside_backup() {
        let db = Database::open_in_memory().unwrap();
        let mut backup = export_all(&db).unwrap();
        backup.categories = vec![
            Category {
                id: "c-soup".into(),
                name: "Soup".into(),
                order: 4,
            },
            Category {
                id: "c-bread".into(),
                name: "Bread".into(),
                order: 4,
            },
        ];
        import_all(&db, &backup).unwrap();
        let soup = db.get_category("c-soup").unwrap().unwrap();
        let bread = db.get_category("c-bread").unwrap().unwrap();
        assert_eq!((soup.order, bread.order), (0, 1));
    }

    #[test]
    fn test_export_import_roundtrip() {
        let source = Database::open_in_memory().unwrap();
        ensure_seed(&source).unwrap();
        let mut recipe = source.all_recipes().unwrap().remove(0);
        recipe.photos.push(Photo::from(vec![7, 7, 7]));
        source.put_recipe(&recipe).unwrap();
        source
            .set_setting("theme", &Value::String("pearl".into()))
            .unwrap();

        let backup = export_all(&source).unwrap();
        let json = serde_json::to_string(&backup).unwrap();
        let parsed: Backup = serde_json::from_str(&json).unwrap();

        let target = Database::open_in_memory().unwrap();
        let summary = import_all(&target, &parsed).unwrap();
        assert_eq!(summary.categories_imported, 2);
        assert_eq!(summary.recipes_imported, 1);
        assert_eq!(summary.recipes_reassigned, 0);
        assert_eq!(summary.settings_imported, 4);

        let imported = target.get_recipe(&recipe.id).unwrap().unwrap();
        assert_eq!(imported, recipe);
        assert_eq!(
            target.get_setting("theme").unwrap(),
            Some(Value::String("pearl".into()))
        );
    }

    #[test]
    fn test_import_reassigns_orphans_to_first_category() {
        let db = Database::open_in_memory().unwrap();
        ensure_seed(&db).unwrap();
        let main_id = db
            .all_categories()
            .unwrap()
            .into_iter()
            .find(|c| c.order == 0)
            .unwrap()
            .id;

        let mut orphan = db.all_recipes().unwrap().remove(0);
        orphan.id = "orphan".to_string();
        orphan.category_id = "gone".to_string();
        let backup = Backup {
            version: BACKUP_VERSION,
            exported_at: String::new(),
            categories: Vec::new(),
            recipes: vec![orphan],
            settings: Map::new(),
        };

        let summary = import_all(&db, &backup).unwrap();
        assert_eq!(summary.recipes_reassigned, 1);
        assert_eq!(db.get_recipe("orphan").unwrap().unwrap().category_id, main_id);
    }

    #[test]
    fn test_import_into_empty_store_creates_category_for_orphans() {
        let source = Database::open_in_memory().unwrap();
        ensure_seed(&source).unwrap();
        let mut backup = export_all(&source).unwrap();
        backup.categories.clear();

        let db = Database::open_in_memory().unwrap();
        let summary = import_all(&db, &backup).unwrap();
        assert_eq!(summary.recipes_reassigned, 1);

        let categories = db.all_categories().unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, "Imported");
        assert_eq!(db.all_recipes().unwrap()[0].category_id, categories[0].id);
    }

    #[test]
    fn test_import_rejects_unknown_version() {
        let db = Database::open_in_memory().unwrap();
        let backup = Backup {
            version: 99,
            exported_at: String::new(),
            categories: Vec::new(),
            recipes: Vec::new(),
            settings: Map::new(),
        };
        assert!(import_all(&db, &backup).unwrap_err().is_validation());
    }

    #[test]
    fn test_import_skips_unknown_and_malformed_settings() {
        let db = Database::open_in_memory().unwrap();
        let mut settings = Map::new();
        settings.insert("volume".to_string(), Value::from(11));
        settings.insert("groceryMode".to_string(), Value::String("nope".into()));
        settings.insert("favoritesCollapsed".to_string(), Value::Bool(true));
        let backup = Backup {
            version: BACKUP_VERSION,
            exported_at: String::new(),
            categories: Vec::new(),
            recipes: Vec::new(),
            settings,
        };

        let summary = import_all(&db, &backup).unwrap();
        assert_eq!(summary.settings_imported, 1);
        assert!(db.get_setting("volume").unwrap().is_none());
        assert!(db.get_setting("groceryMode").unwrap().is_none());
    }

    #[test]
    fn test_import_never_resets_name_prompt_flag() {
        let db = Database::open_in_memory().unwrap();
        db.set_setting("hasPromptedCookbookName", &Value::Bool(true))
            .unwrap();
        let mut settings = Map::new();
        settings.insert("hasPromptedCookbookName".to_string(), Value::Bool(false));
        settings.insert("cookbookName".to_string(), Value::String("Nana's".into()));
        let backup = Backup {
            version: BACKUP_VERSION,
            exported_at: String::new(),
            categories: Vec::new(),
            recipes: Vec::new(),
            settings,
        };

        let summary = import_all(&db, &backup).unwrap();
        assert_eq!(summary.settings_imported, 1);
        assert_eq!(
            db.get_setting("hasPromptedCookbookName").unwrap(),
            Some(Value::Bool(true))
        );
    }
}
