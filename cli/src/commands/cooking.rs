use anyhow::{Result, bail};
use chrono::{Local, TimeZone};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use crate::api::ApiClient;
use choosy_core::cooking_list::SelectionEntry;
use choosy_core::service::ChoosyService;

use super::catalog::fetch_detail;
use super::helpers::{exit_not_found, format_servings, json_error, truncate};

pub(crate) fn cmd_list_add(
    svc: &ChoosyService,
    api: &ApiClient,
    recipe_id: &str,
    servings: Option<f64>,
    json: bool,
) -> Result<()> {
    if servings.is_some_and(|s| !s.is_finite() || s <= 0.0) {
        bail!("Servings must be greater than 0");
    }
    if svc.cooking_list().contains(recipe_id) {
        let message = format!("Recipe '{recipe_id}' is already on the cooking list");
        if json {
            println!("{}", json_error(&message));
        } else {
            eprintln!("{message}");
        }
        return Ok(());
    }

    let detail = fetch_detail(api, recipe_id, json)?;
    svc.add_to_cooking_list(&detail, servings)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&svc.cooking_list().entries())?);
    } else {
        let name = detail.display_name();
        let servings = format_servings(servings.unwrap_or(detail.servings));
        let count = svc.cooking_list().len();
        println!("Added {name} ({servings} servings). {count} recipe(s) on the list.");
    }
    Ok(())
}

pub(crate) fn cmd_list_remove(svc: &ChoosyService, recipe_id: &str, json: bool) -> Result<()> {
    if !svc.remove_from_cooking_list(recipe_id)? {
        exit_not_found(&format!("Recipe '{recipe_id}' is not on the cooking list"), json);
    }

    if json {
        println!("{}", serde_json::json!({ "removed": recipe_id }));
    } else {
        println!("Removed {recipe_id} from the cooking list");
    }
    Ok(())
}

pub(crate) fn cmd_list_servings(
    svc: &ChoosyService,
    recipe_id: &str,
    servings: f64,
    json: bool,
) -> Result<()> {
    if !svc.set_cooking_servings(recipe_id, servings)? {
        exit_not_found(&format!("Recipe '{recipe_id}' is not on the cooking list"), json);
    }

    if json {
        println!(
            "{}",
            serde_json::json!({ "id": recipe_id, "servings": servings })
        );
    } else {
        let servings = format_servings(servings);
        println!("Set {recipe_id} to {servings} servings");
    }
    Ok(())
}

pub(crate) fn cmd_list_show(svc: &ChoosyService, json: bool) -> Result<()> {
    let list = svc.cooking_list();

    if json {
        println!("{}", serde_json::to_string_pretty(list.entries())?);
        return Ok(());
    }

    if list.is_empty() {
        eprintln!("Your cooking list is empty. Add recipes with: choosy list add <id>");
        std::process::exit(2);
    }

    print_selection_table(list.entries());
    Ok(())
}

pub(crate) fn cmd_list_clear(svc: &ChoosyService, json: bool) -> Result<()> {
    let count = svc.cooking_list().len();
    svc.clear_cooking_list()?;

    if json {
        println!("{}", serde_json::json!({ "cleared": count }));
    } else {
        println!("Cleared {count} recipe(s) from the cooking list");
    }
    Ok(())
}

fn print_selection_table(entries: &[SelectionEntry]) {
    #[derive(Tabled)]
    struct SelectionRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Servings")]
        servings: String,
        #[tabled(rename = "Added")]
        added: String,
    }

    let rows: Vec<SelectionRow> = entries
        .iter()
        .enumerate()
        .map(|(i, e)| SelectionRow {
            idx: i + 1,
            id: e.recipe_id.clone(),
            name: truncate(&e.name, 24),
            category: e.category.clone(),
            servings: e
                .servings
                .map_or_else(|| "default".to_string(), format_servings),
            added: Local
                .timestamp_millis_opt(e.added_at_epoch_millis)
                .single()
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::single(4)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}
