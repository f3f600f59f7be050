use anyhow::Result;
use std::path::{Path, PathBuf};

use cookbook_core::derive::display_title;
use cookbook_core::error::CookbookError;
use cookbook_core::service::CookbookService;

use super::helpers::{read_photos, resolve_recipe, write_photo};

pub(crate) fn cmd_photo_add(
    svc: &mut CookbookService,
    query: &str,
    files: &[PathBuf],
    json: bool,
) -> Result<()> {
    let recipe = resolve_recipe(svc.state(), query)?.clone();
    let photos = read_photos(files)?;
    let added = photos.len();
    let total = svc.add_photos(&recipe.id, photos)?;
    if json {
        println!("{}", serde_json::json!({ "added": added, "photos": total }));
    } else {
        println!(
            "Added {added} photo(s) to {} ({total} total)",
            display_title(&recipe)
        );
    }
    Ok(())
}

/// Photo numbers are 1-based, in display order.
pub(crate) fn cmd_photo_remove(
    svc: &mut CookbookService,
    query: &str,
    number: usize,
    json: bool,
) -> Result<()> {
    let recipe = resolve_recipe(svc.state(), query)?.clone();
    let index = number
        .checked_sub(1)
        .ok_or_else(|| CookbookError::not_found("photo", number.to_string()))?;
    svc.remove_photo(&recipe.id, index)?;
    if json {
        println!("{}", serde_json::json!({ "removed": number }));
    } else {
        println!("Removed photo {number} from {}", display_title(&recipe));
    }
    Ok(())
}

pub(crate) fn cmd_photo_export(
    svc: &CookbookService,
    query: &str,
    number: usize,
    out: &Path,
) -> Result<()> {
    let recipe = resolve_recipe(svc.state(), query)?;
    let photo = number
        .checked_sub(1)
        .and_then(|idx| recipe.photos.get(idx))
        .ok_or_else(|| CookbookError::not_found("photo", number.to_string()))?;
    write_photo(photo, out)?;
    eprintln!("Wrote {} bytes to {}", photo.len(), out.display());
    Ok(())
}
