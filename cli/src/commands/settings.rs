use anyhow::Result;
use tabled::{Table, Tabled, settings::Style};

use cookbook_core::service::CookbookService;
use cookbook_core::settings::{Setting, SettingKey, THEMES, Theme};

fn theme_label(theme: Theme) -> String {
    let shade = if theme.is_light() { "light" } else { "dark" };
    format!("{theme} ({shade})")
}

pub(crate) fn cmd_settings_show(svc: &CookbookService, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct SettingRow {
        #[tabled(rename = "Setting")]
        key: &'static str,
        #[tabled(rename = "Value")]
        value: String,
    }

    let settings = &svc.state().settings;
    if json {
        println!("{}", serde_json::to_string_pretty(settings)?);
        return Ok(());
    }

    let rows: Vec<SettingRow> = SettingKey::ALL
        .into_iter()
        .map(|key| SettingRow {
            key: key.as_str(),
            value: match (key, settings.get(key).to_value()) {
                (SettingKey::Theme, _) => theme_label(settings.theme),
                (_, serde_json::Value::String(s)) => s,
                (_, other) => other.to_string(),
            },
        })
        .collect();
    println!("{}", Table::new(&rows).with(Style::rounded()));
    println!("Themes: {}", THEMES.join(", "));
    Ok(())
}

pub(crate) fn cmd_settings_set(
    svc: &mut CookbookService,
    key: &str,
    value: &str,
    json: bool,
) -> Result<()> {
    let setting = Setting::parse(key, value)?;
    let key = setting.key();
    svc.update_setting(setting)?;
    let stored = svc.state().settings.get(key).to_value();
    if json {
        let mut out = serde_json::Map::new();
        out.insert(key.as_str().to_string(), stored);
        println!("{}", serde_json::Value::Object(out));
    } else {
        println!("{} = {stored}", key.as_str());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_theme_and_grocery_mode() {
        let mut svc = CookbookService::new_in_memory().unwrap();
        cmd_settings_set(&mut svc, "theme", "Butter", true).unwrap();
        cmd_settings_set(&mut svc, "groceryMode", "off", true).unwrap();
        let settings = &svc.state().settings;
        assert_eq!(settings.theme, Theme::Butter);
        assert!(!settings.grocery_mode);
    }

    #[test]
    fn test_set_rejects_bad_input() {
        let mut svc = CookbookService::new_in_memory().unwrap();
        assert!(cmd_settings_set(&mut svc, "theme", "neon", true).is_err());
        assert!(cmd_settings_set(&mut svc, "volume", "11", true).is_err());
        assert_eq!(svc.state().settings.theme, Theme::Charcoal);
    }

    #[test]
    fn test_set_cannot_reset_name_prompt() {
        let mut svc = CookbookService::new_in_memory().unwrap();
        cmd_settings_set(&mut svc, "hasPromptedCookbookName", "true", true).unwrap();
        assert!(cmd_settings_set(&mut svc, "hasPromptedCookbookName", "false", true).is_err());
        assert!(svc.state().settings.has_prompted_cookbook_name);
    }

    #[test]
    fn test_theme_label() {
        assert_eq!(theme_label(Theme::Charcoal), "charcoal (dark)");
        assert_eq!(theme_label(Theme::Pearl), "pearl (light)");
    }
}
