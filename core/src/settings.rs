use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CookbookError, Result};
use crate::models::DEFAULT_COOKBOOK_NAME;

pub const THEMES: &[&str] = &["charcoal", "sage", "blue", "pearl", "butter", "sky"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Charcoal,
    Sage,
    Blue,
    Pearl,
    Butter,
    Sky,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Charcoal => "charcoal",
            Theme::Sage => "sage",
            Theme::Blue => "blue",
            Theme::Pearl => "pearl",
            Theme::Butter => "butter",
            Theme::Sky => "sky",
        }
    }

    pub fn is_light(self) -> bool {
        matches!(self, Theme::Pearl | Theme::Butter | Theme::Sky)
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = CookbookError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "charcoal" => Ok(Theme::Charcoal),
            "sage" => Ok(Theme::Sage),
            "blue" => Ok(Theme::Blue),
            "pearl" => Ok(Theme::Pearl),
            "butter" => Ok(Theme::Butter),
            "sky" => Ok(Theme::Sky),
            _ => {
                let valid = THEMES.join(", ");
                Err(CookbookError::validation(format!(
                    "Unknown theme '{s}'. Valid themes: {valid}"
                )))
            }
        }
    }
}

/// Persisted setting keys. The string form is the key stored in the settings collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    GroceryMode,
    FavoritesCollapsed,
    CookbookName,
    Theme,
    HasPromptedCookbookName,
}

impl SettingKey {
    pub const ALL: [SettingKey; 5] = [
        SettingKey::GroceryMode,
        SettingKey::FavoritesCollapsed,
        SettingKey::CookbookName,
        SettingKey::Theme,
        SettingKey::HasPromptedCookbookName,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::GroceryMode => "groceryMode",
            SettingKey::FavoritesCollapsed => "favoritesCollapsed",
            SettingKey::CookbookName => "cookbookName",
            SettingKey::Theme => "theme",
            SettingKey::HasPromptedCookbookName => "hasPromptedCookbookName",
        }
    }

    pub fn from_key(key: &str) -> Option<SettingKey> {
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }
}

/// A single setting write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Setting {
    GroceryMode(bool),
    FavoritesCollapsed(bool),
    CookbookName(String),
    Theme(Theme),
    HasPromptedCookbookName(bool),
}

impl Setting {
    pub fn key(&self) -> SettingKey {
        match self {
            Setting::GroceryMode(_) => SettingKey::GroceryMode,
            Setting::FavoritesCollapsed(_) => SettingKey::FavoritesCollapsed,
            Setting::CookbookName(_) => SettingKey::CookbookName,
            Setting::Theme(_) => SettingKey::Theme,
            Setting::HasPromptedCookbookName(_) => SettingKey::HasPromptedCookbookName,
        }
    }

    /// Blank cookbook names fall back to the default name.
    pub fn cookbook_name(name: &str) -> Setting {
        let name = name.trim();
        if name.is_empty() {
            Setting::CookbookName(DEFAULT_COOKBOOK_NAME.to_string())
        } else {
            Setting::CookbookName(name.to_string())
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Setting::GroceryMode(b)
            | Setting::FavoritesCollapsed(b)
            | Setting::HasPromptedCookbookName(b) => Value::Bool(*b),
            Setting::CookbookName(name) => Value::String(name.clone()),
            Setting::Theme(theme) => Value::String(theme.as_str().to_string()),
        }
    }

    /// Decode a stored value. `None` when the value has the wrong shape.
    pub fn from_value(key: SettingKey, value: &Value) -> Option<Setting> {
        match key {
            SettingKey::GroceryMode => value.as_bool().map(Setting::GroceryMode),
            SettingKey::FavoritesCollapsed => value.as_bool().map(Setting::FavoritesCollapsed),
            SettingKey::HasPromptedCookbookName => {
                value.as_bool().map(Setting::HasPromptedCookbookName)
            }
            SettingKey::CookbookName => value
                .as_str()
                .map(|s| Setting::CookbookName(s.to_string())),
            SettingKey::Theme => value
                .as_str()
                .and_then(|s| s.parse::<Theme>().ok())
                .map(Setting::Theme),
        }
    }

    /// Parse user text for a key, e.g. from the command line.
    pub fn parse(key: &str, raw: &str) -> Result<Setting> {
        let key = SettingKey::from_key(key).ok_or_else(|| {
            let valid: Vec<&str> = SettingKey::ALL.iter().map(|k| k.as_str()).collect();
            CookbookError::validation(format!(
                "Unknown setting '{key}'. Valid settings: {}",
                valid.join(", ")
            ))
        })?;
        match key {
            SettingKey::GroceryMode => parse_bool(raw).map(Setting::GroceryMode),
            SettingKey::FavoritesCollapsed => parse_bool(raw).map(Setting::FavoritesCollapsed),
            SettingKey::HasPromptedCookbookName => {
                parse_bool(raw).map(Setting::HasPromptedCookbookName)
            }
            SettingKey::CookbookName => Ok(Setting::cookbook_name(raw)),
            SettingKey::Theme => raw.parse::<Theme>().map(Setting::Theme),
        }
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(CookbookError::validation(format!(
            "Invalid boolean '{raw}'. Use true/false, on/off, yes/no"
        ))),
    }
}

/// Flattened settings as held by the state cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub grocery_mode: bool,
    pub favorites_collapsed: bool,
    pub cookbook_name: String,
    pub theme: Theme,
    pub has_prompted_cookbook_name: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            grocery_mode: true,
            favorites_collapsed: false,
            cookbook_name: DEFAULT_COOKBOOK_NAME.to_string(),
            theme: Theme::Charcoal,
            has_prompted_cookbook_name: false,
        }
    }
}

impl Settings {
    pub fn apply(&mut self, setting: Setting) {
        match setting {
            Setting::GroceryMode(b) => self.grocery_mode = b,
            Setting::FavoritesCollapsed(b) => self.favorites_collapsed = b,
            Setting::CookbookName(name) => self.cookbook_name = name,
            Setting::Theme(theme) => self.theme = theme,
            Setting::HasPromptedCookbookName(b) => self.has_prompted_cookbook_name = b,
        }
    }

    pub fn get(&self, key: SettingKey) -> Setting {
        match key {
            SettingKey::GroceryMode => Setting::GroceryMode(self.grocery_mode),
            SettingKey::FavoritesCollapsed => Setting::FavoritesCollapsed(self.favorites_collapsed),
            SettingKey::CookbookName => Setting::CookbookName(self.cookbook_name.clone()),
            SettingKey::Theme => Setting::Theme(self.theme),
            SettingKey::HasPromptedCookbookName => {
                Setting::HasPromptedCookbookName(self.has_prompted_cookbook_name)
            }
        }
    }
}
