use anyhow::Result;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use cookbook_core::derive::recipe_counts;
use cookbook_core::models::Direction;
use cookbook_core::service::{CategoryDeletion, CookbookService, Prompter};

use super::helpers::{resolve_category, short_id, truncate};

pub(crate) fn cmd_category_list(svc: &CookbookService, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct CategoryRow {
        #[tabled(rename = "#")]
        position: usize,
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Recipes")]
        recipes: usize,
    }

    let state = svc.state();
    if state.categories.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No categories. Add one with: cookbook category add <name>");
        }
        process::exit(2);
    }

    let counts = recipe_counts(&state.categories, &state.recipes);
    if json {
        let out: Vec<serde_json::Value> = counts
            .iter()
            .map(|(c, n)| {
                serde_json::json!({ "id": c.id, "name": c.name, "order": c.order, "recipes": n })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let rows: Vec<CategoryRow> = counts
        .iter()
        .enumerate()
        .map(|(i, (c, n))| CategoryRow {
            position: i + 1,
            id: short_id(&c.id).to_string(),
            name: truncate(&c.name, 30),
            recipes: *n,
        })
        .collect();
    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}

pub(crate) fn cmd_category_add(svc: &mut CookbookService, name: &str, json: bool) -> Result<()> {
    let category = svc.create_category(name)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&category)?);
    } else {
        println!("Added category: {} (id: {})", category.name, short_id(&category.id));
    }
    Ok(())
}

pub(crate) fn cmd_category_move(
    svc: &mut CookbookService,
    query: &str,
    direction: Direction,
    json: bool,
) -> Result<()> {
    let category = resolve_category(svc.state(), query)?.clone();
    let moved = svc.move_category(&category.id, direction)?;
    if json {
        println!("{}", serde_json::json!({ "id": category.id, "moved": moved }));
    } else if moved {
        let names: Vec<&str> = svc
            .state()
            .categories
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        println!("Order: {}", names.join(" › "));
    } else {
        let edge = match direction {
            Direction::Up => "first",
            Direction::Down => "last",
        };
        println!("{} is already {edge}", category.name);
    }
    Ok(())
}

pub(crate) fn cmd_category_rename(
    svc: &mut CookbookService,
    query: &str,
    name: &str,
    json: bool,
) -> Result<()> {
    let category = resolve_category(svc.state(), query)?.clone();
    svc.rename_category(&category.id, name)?;
    let renamed = svc.state().category_name(&category.id).unwrap_or(name);
    if json {
        println!("{}", serde_json::json!({ "id": category.id, "name": renamed }));
    } else {
        println!("Renamed {} to {renamed}", category.name);
    }
    Ok(())
}

pub(crate) fn cmd_category_delete(
    svc: &mut CookbookService,
    query: &str,
    prompter: &dyn Prompter,
    json: bool,
) -> Result<()> {
    let category = resolve_category(svc.state(), query)?.clone();
    let outcome = svc.delete_category(&category.id, prompter)?;

    if json {
        let value = match &outcome {
            CategoryDeletion::Deleted => serde_json::json!({ "deleted": true }),
            CategoryDeletion::Reassigned { recipes, target } => serde_json::json!({
                "deleted": true,
                "reassigned": recipes,
                "target": target.id,
            }),
            CategoryDeletion::Cancelled => serde_json::json!({ "deleted": false }),
        };
        println!("{value}");
        return Ok(());
    }

    match outcome {
        CategoryDeletion::Deleted => println!("Deleted category: {}", category.name),
        CategoryDeletion::Reassigned { recipes, target } => println!(
            "Moved {recipes} recipe(s) to {} and deleted {}",
            target.name, category.name
        ),
        CategoryDeletion::Cancelled => println!("Cancelled"),
    }
    Ok(())
}
