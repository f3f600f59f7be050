mod category;
mod helpers;
mod photo;
mod recipe;
mod settings;
mod transfer;

pub(crate) use category::{
    cmd_category_add, cmd_category_delete, cmd_category_list, cmd_category_move,
    cmd_category_rename,
};
pub(crate) use helpers::StdinPrompter;
pub(crate) use photo::{cmd_photo_add, cmd_photo_export, cmd_photo_remove};
pub(crate) use recipe::{
    EditRequest, cmd_add, cmd_check, cmd_delete, cmd_edit, cmd_favorite, cmd_list, cmd_reset,
    cmd_show,
};
pub(crate) use settings::{cmd_settings_set, cmd_settings_show};
pub(crate) use transfer::{cmd_export, cmd_import_backup, cmd_import_cook};
