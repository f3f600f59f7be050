use anyhow::{Context, Result, anyhow};
use std::path::Path;

use cookbook_core::backup::Backup;
use cookbook_core::derive::display_title;
use cookbook_core::models::NewRecipe;
use cookbook_core::service::CookbookService;

use super::helpers::{resolve_category, short_id};

pub(crate) fn cmd_export(svc: &CookbookService, output: Option<&Path>) -> Result<()> {
    let backup = svc.export_all()?;
    let body = serde_json::to_string_pretty(&backup)?;
    match output {
        Some(path) => {
            std::fs::write(path, body)
                .with_context(|| format!("Failed to write backup: {}", path.display()))?;
            eprintln!(
                "Exported {} recipe(s) and {} categor{} to {}",
                backup.recipes.len(),
                backup.categories.len(),
                if backup.categories.len() == 1 { "y" } else { "ies" },
                path.display()
            );
        }
        None => println!("{body}"),
    }
    Ok(())
}

pub(crate) fn cmd_import_backup(svc: &mut CookbookService, file: &Path, json: bool) -> Result<()> {
    let input = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read file: {}", file.display()))?;
    let backup: Backup = serde_json::from_str(&input)
        .with_context(|| format!("Not a cookbook backup: {}", file.display()))?;
    let summary = svc.import_all(&backup)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Imported {} categories, {} recipes, {} settings",
            summary.categories_imported, summary.recipes_imported, summary.settings_imported
        );
        if summary.recipes_reassigned > 0 {
            eprintln!(
                "{} recipe(s) referenced a missing category and were moved",
                summary.recipes_reassigned
            );
        }
    }
    Ok(())
}

/// Title, ingredient lines and steps pulled out of a Cooklang document.
#[derive(Debug)]
struct CookRecipe {
    title: Option<String>,
    ingredients: Vec<String>,
    steps: Vec<String>,
}

fn format_quantity(qty: &cooklang::Quantity) -> String {
    let value = match qty.value() {
        cooklang::Value::Number(n) => n.value().to_string(),
        cooklang::Value::Range { start, end } => format!("{}-{}", start.value(), end.value()),
        cooklang::Value::Text(t) => t.clone(),
    };
    match qty.unit() {
        Some(unit) => format!("{value} {unit}"),
        None => value,
    }
}

fn parse_cook(input: &str) -> Result<CookRecipe> {
    let (recipe, _report) = cooklang::parse(input)
        .into_result()
        .map_err(|e| anyhow!("Failed to parse Cooklang file: {e}"))?;

    let converter = cooklang::Converter::default();
    let ingredients = recipe
        .group_ingredients(&converter)
        .iter()
        .map(|gi| {
            let name = gi.ingredient.display_name();
            match gi.quantity.iter().next() {
                Some(qty) => format!("{} {name}", format_quantity(qty)),
                None => name.to_string(),
            }
        })
        .collect();

    let mut steps = Vec::new();
    for section in &recipe.sections {
        for content in &section.content {
            let cooklang::Content::Step(step) = content else {
                continue;
            };
            let mut text = String::new();
            for item in &step.items {
                match item {
                    cooklang::Item::Text { value } => text.push_str(value),
                    cooklang::Item::Ingredient { index } => {
                        if let Some(ing) = recipe.ingredients.get(*index) {
                            text.push_str(&ing.display_name());
                        }
                    }
                    cooklang::Item::Cookware { index } => {
                        if let Some(cw) = recipe.cookware.get(*index) {
                            text.push_str(&cw.name);
                        }
                    }
                    cooklang::Item::Timer { index } => {
                        let timer = recipe.timers.get(*index);
                        if let Some(qty) = timer.and_then(|t| t.quantity.as_ref()) {
                            text.push_str(&format_quantity(qty));
                        }
                    }
                    cooklang::Item::InlineQuantity { index } => {
                        if let Some(qty) = recipe.inline_quantities.get(*index) {
                            text.push_str(&format_quantity(qty));
                        }
                    }
                }
            }
            steps.push(text.trim().to_string());
        }
    }

    Ok(CookRecipe {
        title: recipe.metadata.title().map(String::from),
        ingredients,
        steps,
    })
}

pub(crate) fn cmd_import_cook(
    svc: &mut CookbookService,
    file: &Path,
    title_override: Option<String>,
    category: Option<&str>,
    json: bool,
) -> Result<()> {
    let input = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read file: {}", file.display()))?;
    let parsed = parse_cook(&input)?;

    let title = title_override
        .or(parsed.title)
        .or_else(|| file.file_stem().and_then(|s| s.to_str()).map(String::from))
        .context("Could not determine recipe title. Use --title to specify one")?;

    let category_id = match category {
        Some(query) => resolve_category(svc.state(), query)?.id.clone(),
        None => svc
            .state()
            .categories
            .first()
            .map(|c| c.id.clone())
            .unwrap_or_default(),
    };

    let recipe = svc.create_recipe(NewRecipe {
        title,
        category_id,
        ingredients: parsed.ingredients,
        instructions: parsed.steps,
        ..NewRecipe::default()
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recipe)?);
    } else {
        println!(
            "Imported recipe: {} ({} ingredients, {} steps, id: {})",
            display_title(&recipe),
            recipe.ingredients.len(),
            recipe.instructions.len(),
            short_id(&recipe.id)
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PANCAKES: &str = "\
---
title: Pancakes
---

Whisk @eggs{2} with @milk{300%ml} in a #bowl{}.

Fold in @flour{200%g} and rest for ~{10%minutes}.
";

    #[test]
    fn test_parse_cook() {
        let parsed = parse_cook(PANCAKES).unwrap();
        assert_eq!(parsed.title.as_deref(), Some("Pancakes"));
        assert_eq!(parsed.ingredients.len(), 3);
        assert!(parsed.ingredients.iter().any(|l| l == "2 eggs"));
        assert!(parsed.ingredients.iter().any(|l| l == "300 ml milk"));
        assert_eq!(parsed.steps.len(), 2);
        assert!(parsed.steps[0].contains("eggs"));
        assert!(parsed.steps[0].contains("bowl"));
        assert!(parsed.steps[1].contains("10 minutes"));
    }

    #[test]
    fn test_import_cook_uses_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Toast.cook");
        std::fs::write(&path, "Toast the @bread{2%slices}.\n").unwrap();

        let mut svc = CookbookService::new_in_memory().unwrap();
        cmd_import_cook(&mut svc, &path, None, Some("Main"), true).unwrap();
        let toast = svc
            .state()
            .recipes
            .iter()
            .find(|r| r.title == "Toast")
            .unwrap();
        assert_eq!(toast.ingredients[0].text, "2 slices bread");
        assert_eq!(toast.instructions, vec!["Toast the bread."]);
    }

    #[test]
    fn test_export_then_import_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");

        let source = CookbookService::new_in_memory().unwrap();
        cmd_export(&source, Some(&path)).unwrap();

        let mut target = CookbookService::new_in_memory().unwrap();
        cmd_import_backup(&mut target, &path, true).unwrap();
        let alfredos = target
            .state()
            .recipes
            .iter()
            .filter(|r| r.title == "Chicken Alfredo")
            .count();
        assert_eq!(alfredos, 2);
    }

    #[test]
    fn test_import_rejects_non_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.json");
        std::fs::write(&path, "{\"hello\": 1}").unwrap();
        let mut svc = CookbookService::new_in_memory().unwrap();
        assert!(cmd_import_backup(&mut svc, &path, true).is_err());
    }
}
