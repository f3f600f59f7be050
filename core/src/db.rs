use std::collections::HashMap;
use std::path::Path;

use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, params};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{Category, Photo, Recipe};

pub const SCHEMA_VERSION: i64 = 1;

/// Local object store with three independent collections: recipes (with their
/// photos), categories and settings. Every public call is its own transaction.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.migrate()?;
        debug!(path = %path.display(), "opened cookbook store");
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            debug!(from = version, to = 1, "migrating cookbook schema");
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS categories (
                    id TEXT PRIMARY KEY NOT NULL,
                    name TEXT NOT NULL,
                    sort_order INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS recipes (
                    id TEXT PRIMARY KEY NOT NULL,
                    title TEXT NOT NULL DEFAULT '',
                    category_id TEXT NOT NULL,
                    is_favorite INTEGER NOT NULL DEFAULT 0,
                    is_photo_only INTEGER NOT NULL DEFAULT 0,
                    ingredients TEXT NOT NULL DEFAULT '[]',
                    instructions TEXT NOT NULL DEFAULT '[]',
                    created_at INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS recipe_photos (
                    recipe_id TEXT NOT NULL,
                    position INTEGER NOT NULL,
                    data BLOB NOT NULL,
                    PRIMARY KEY (recipe_id, position)
                );

                CREATE TABLE IF NOT EXISTS settings (
                    key TEXT PRIMARY KEY NOT NULL,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_recipes_title ON recipes(title);
                CREATE INDEX IF NOT EXISTS idx_recipes_category ON recipes(category_id);
                CREATE INDEX IF NOT EXISTS idx_recipes_favorite ON recipes(is_favorite);
                CREATE INDEX IF NOT EXISTS idx_categories_order ON categories(sort_order);

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    pub fn schema_version(&self) -> Result<i64> {
        Ok(self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?)
    }

    // --- Row mapping helpers ---

    fn json_column<T: DeserializeOwned>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T> {
        let raw: String = row.get(idx)?;
        serde_json::from_str(&raw)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    }

    // Expects columns:
    // 0: id, 1: title, 2: category_id, 3: is_favorite, 4: is_photo_only,
    // 5: ingredients (JSON), 6: instructions (JSON), 7: created_at
    fn recipe_from_row(row: &rusqlite::Row) -> rusqlite::Result<Recipe> {
        Ok(Recipe {
            id: row.get(0)?,
            title: row.get(1)?,
            category_id: row.get(2)?,
            is_favorite: row.get(3)?,
            is_photo_only: row.get(4)?,
            ingredients: Self::json_column(row, 5)?,
            instructions: Self::json_column(row, 6)?,
            photos: Vec::new(),
            created_at: row.get(7)?,
        })
    }

    fn category_from_row(row: &rusqlite::Row) -> rusqlite::Result<Category> {
        Ok(Category {
            id: row.get(0)?,
            name: row.get(1)?,
            order: row.get(2)?,
        })
    }

    // --- Recipes ---

    /// All recipes in natural store order (insertion order).
    pub fn all_recipes(&self) -> Result<Vec<Recipe>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, category_id, is_favorite, is_photo_only, ingredients, instructions, created_at
             FROM recipes ORDER BY rowid",
        )?;
        let mut recipes = stmt
            .query_map([], Self::recipe_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut photos = self.all_photos()?;
        for recipe in &mut recipes {
            if let Some(p) = photos.remove(&recipe.id) {
                recipe.photos = p;
            }
        }
        Ok(recipes)
    }

    fn all_photos(&self) -> Result<HashMap<String, Vec<Photo>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT recipe_id, data FROM recipe_photos ORDER BY recipe_id, position")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
        })?;
        let mut photos: HashMap<String, Vec<Photo>> = HashMap::new();
        for row in rows {
            let (recipe_id, data) = row?;
            photos.entry(recipe_id).or_default().push(Photo::from(data));
        }
        Ok(photos)
    }

    fn photos_for(&self, recipe_id: &str) -> Result<Vec<Photo>> {
        let mut stmt = self
            .conn
            .prepare("SELECT data FROM recipe_photos WHERE recipe_id = ?1 ORDER BY position")?;
        let photos = stmt
            .query_map(params![recipe_id], |row| row.get::<_, Vec<u8>>(0))?
            .map(|r| r.map(Photo::from))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(photos)
    }

    pub fn get_recipe(&self, id: &str) -> Result<Option<Recipe>> {
        let recipe = self
            .conn
            .query_row(
                "SELECT id, title, category_id, is_favorite, is_photo_only, ingredients, instructions, created_at
                 FROM recipes WHERE id = ?1",
                params![id],
                Self::recipe_from_row,
            )
            .optional()?;
        match recipe {
            Some(mut recipe) => {
                recipe.photos = self.photos_for(id)?;
                Ok(Some(recipe))
            }
            None => Ok(None),
        }
    }

    /// Upsert by id. The row keeps its place in natural order on update; photos
    /// are replaced in the same transaction.
    #[allow(clippy::cast_possible_wrap)]
    pub fn put_recipe(&self, recipe: &Recipe) -> Result<()> {
        let ingredients = serde_json::to_string(&recipe.ingredients)?;
        let instructions = serde_json::to_string(&recipe.instructions)?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO recipes (id, title, category_id, is_favorite, is_photo_only, ingredients, instructions, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                category_id = excluded.category_id,
                is_favorite = excluded.is_favorite,
                is_photo_only = excluded.is_photo_only,
                ingredients = excluded.ingredients,
                instructions = excluded.instructions,
                created_at = excluded.created_at",
            params![
                recipe.id,
                recipe.title,
                recipe.category_id,
                recipe.is_favorite,
                recipe.is_photo_only,
                ingredients,
                instructions,
                recipe.created_at,
            ],
        )?;
        tx.execute(
            "DELETE FROM recipe_photos WHERE recipe_id = ?1",
            params![recipe.id],
        )?;
        for (position, photo) in recipe.photos.iter().enumerate() {
            tx.execute(
                "INSERT INTO recipe_photos (recipe_id, position, data) VALUES (?1, ?2, ?3)",
                params![recipe.id, position as i64, photo.as_bytes()],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn delete_recipe(&self, id: &str) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM recipe_photos WHERE recipe_id = ?1", params![id])?;
        let rows = tx.execute("DELETE FROM recipes WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(rows > 0)
    }

    // --- Categories ---

    /// All categories in natural store order. Callers sort by `order`.
    pub fn all_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, sort_order FROM categories ORDER BY rowid")?;
        let categories = stmt
            .query_map([], Self::category_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    pub fn get_category(&self, id: &str) -> Result<Option<Category>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, sort_order FROM categories WHERE id = ?1",
                params![id],
                Self::category_from_row,
            )
            .optional()?)
    }

    pub fn put_category(&self, category: &Category) -> Result<()> {
        self.conn.execute(
            "INSERT INTO categories (id, name, sort_order) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name, sort_order = excluded.sort_order",
            params![category.id, category.name, category.order],
        )?;
        Ok(())
    }

    pub fn delete_category(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM categories WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // --- Settings ---

    pub fn set_setting(&self, key: &str, value: &Value) -> Result<()> {
        let encoded = serde_json::to_string(value)?;
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, encoded],
        )?;
        Ok(())
    }

    /// A stored value that is not valid JSON reads as absent.
    pub fn get_setting(&self, key: &str) -> Result<Option<Value>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(raw.and_then(|raw| match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "ignoring undecodable setting value");
                None
            }
        }))
    }

    pub fn all_settings(&self) -> Result<Vec<(String, Value)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value FROM settings ORDER BY key")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows
            .into_iter()
            .filter_map(|(key, raw)| serde_json::from_str(&raw).ok().map(|v| (key, v)))
            .collect())
    }
}
