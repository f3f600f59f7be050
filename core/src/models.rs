use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

pub const DEFAULT_COOKBOOK_NAME: &str = "My Cookbook";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub checked: bool,
}

impl Ingredient {
    pub fn new(text: impl Into<String>) -> Self {
        Ingredient {
            id: new_id(),
            text: text.into(),
            checked: false,
        }
    }
}

/// An already-encoded image. Serialized as base64 so recipes stay valid JSON.
#[derive(Clone, PartialEq, Eq)]
pub struct Photo(Vec<u8>);

impl Photo {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Photo {
    fn from(bytes: Vec<u8>) -> Self {
        Photo(bytes)
    }
}

impl std::fmt::Debug for Photo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Photo({} bytes)", self.0.len())
    }
}

impl Serialize for Photo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Photo {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64
            .decode(encoded.as_bytes())
            .map(Photo)
            .map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub category_id: String,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub is_photo_only: bool,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub photos: Vec<Photo>,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
}

impl Recipe {
    pub fn ingredient(&self, ingredient_id: &str) -> Option<&Ingredient> {
        self.ingredients.iter().find(|i| i.id == ingredient_id)
    }

    pub fn cover_photo(&self) -> Option<&Photo> {
        self.photos.first()
    }

    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub order: i64,
}

/// Input for a new recipe. Ingredient and instruction lines are cleaned on save.
#[derive(Debug, Clone, Default)]
pub struct NewRecipe {
    pub title: String,
    pub category_id: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub photos: Vec<Photo>,
    pub photo_only: bool,
}

/// Replacement field values for an existing recipe. Photos are appended.
#[derive(Debug, Clone, Default)]
pub struct RecipeEdit {
    pub title: String,
    pub category_id: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub new_photos: Vec<Photo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn offset(self) -> isize {
        match self {
            Direction::Up => -1,
            Direction::Down => 1,
        }
    }
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Trim every line and drop the blank ones.
pub fn clean_lines<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    lines
        .iter()
        .map(|l| l.as_ref().trim())
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

/// Split multi-line text input into cleaned lines.
pub fn split_lines(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text.lines().collect();
    clean_lines(&lines)
}

/// Rebuild an ingredient list from edited lines.
///
/// A line whose trimmed text equals an existing ingredient's trimmed text keeps
/// that ingredient's id and checked state. Each existing ingredient is claimed at
/// most once, so repeated lines never share an id.
pub fn reconcile_ingredients<S: AsRef<str>>(
    existing: &[Ingredient],
    lines: &[S],
) -> Vec<Ingredient> {
    let mut claimed = vec![false; existing.len()];
    clean_lines(lines)
        .into_iter()
        .map(|text| {
            let found = existing
                .iter()
                .enumerate()
                .find(|(idx, ing)| !claimed[*idx] && ing.text.trim() == text);
            match found {
                Some((idx, ing)) => {
                    claimed[idx] = true;
                    Ingredient {
                        id: ing.id.clone(),
                        text,
                        checked: ing.checked,
                    }
                }
                None => Ingredient::new(text),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub categories_imported: usize,
    pub recipes_imported: usize,
    pub settings_imported: usize,
    pub recipes_reassigned: usize,
}
