mod catalog;
mod cooking;
mod helpers;
mod history;
mod shopping;

pub(crate) use catalog::{cmd_categories, cmd_recipes, cmd_show};
pub(crate) use cooking::{
    cmd_list_add, cmd_list_clear, cmd_list_remove, cmd_list_servings, cmd_list_show,
};
pub(crate) use history::{cmd_history, cmd_history_clear, cmd_history_remove};
pub(crate) use shopping::{cmd_shop, cmd_shop_check};
