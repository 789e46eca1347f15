use anyhow::Result;
use serde::Serialize;

use crate::api::ApiClient;
use choosy_core::catalog::{CatalogPage, CatalogQuery, PAGE_SIZE};
use choosy_core::error::FetchError;
use choosy_core::models::{RecipeDetail, difficulty_label};
use choosy_core::service::{ChoosyService, RecipeSource};

use super::helpers::{exit_not_found, format_minutes, format_servings, print_recipe_table};

/// `page` is 1-based here and zero-based everywhere below.
pub(crate) fn cmd_recipes(
    api: &ApiClient,
    category: Option<String>,
    search: Option<String>,
    page: u32,
    json: bool,
) -> Result<()> {
    let index = page.saturating_sub(1);
    let query = CatalogQuery::page(index, PAGE_SIZE)?
        .with_category(category)
        .with_search(search);
    let items = api.recipes(&query)?;

    if items.is_empty() {
        let message = if index == 0 {
            "No recipes found".to_string()
        } else {
            format!("No recipes on page {page}")
        };
        exit_not_found(&message, json);
    }

    let result = CatalogPage::new(items, index, PAGE_SIZE);
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let first = query.offset.unwrap_or(0) as usize + 1;
        print_recipe_table(&result.items, first);
        if result.has_more {
            let next = page + 1;
            println!("More recipes: --page {next}");
        }
    }

    Ok(())
}

pub(crate) fn cmd_categories(api: &ApiClient, json: bool) -> Result<()> {
    let categories = api.categories()?;

    if categories.is_empty() {
        exit_not_found("No categories found", json);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&categories)?);
    } else {
        for c in &categories {
            println!("{c}");
        }
    }

    Ok(())
}

/// Fetch one recipe, turning a 404 into the usual exit-2 outcome.
pub(super) fn fetch_detail(api: &ApiClient, recipe_id: &str, json: bool) -> Result<RecipeDetail> {
    match api.recipe_detail(recipe_id) {
        Ok(detail) => Ok(detail),
        Err(FetchError::NotFound(_)) => {
            exit_not_found(&format!("Recipe '{recipe_id}' not found"), json)
        }
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn cmd_show(
    svc: &ChoosyService,
    api: &ApiClient,
    recipe_id: &str,
    json: bool,
) -> Result<()> {
    let detail = fetch_detail(api, recipe_id, json)?;
    svc.record_view(&detail)?;
    let in_list = svc.cooking_list().contains(&detail.id);

    if json {
        #[derive(Serialize)]
        struct ShowOutput<'a> {
            #[serde(flatten)]
            detail: &'a RecipeDetail,
            in_cooking_list: bool,
        }
        let out = ShowOutput {
            detail: &detail,
            in_cooking_list: in_list,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let name = detail.display_name();
    println!("=== {name} ===");
    if !detail.description.is_empty() {
        println!("{}", detail.description);
    }
    println!();

    let category = &detail.category;
    let difficulty = difficulty_label(detail.difficulty);
    let servings = format_servings(detail.servings);
    println!("  Category:   {category}");
    println!("  Difficulty: {difficulty}");
    println!("  Servings:   {servings}");
    if detail.prep_time_minutes.is_some() || detail.cook_time_minutes.is_some() {
        let prep = format_minutes(detail.prep_time_minutes);
        let cook = format_minutes(detail.cook_time_minutes);
        println!("  Prep/Cook:  {prep} / {cook}");
    }
    if detail.total_time_minutes.is_some() {
        let total = format_minutes(detail.total_time_minutes);
        println!("  Total:      {total}");
    }
    if !detail.tags.is_empty() {
        let tags = detail.tags.join(", ");
        println!("  Tags:       {tags}");
    }

    if !detail.ingredients.is_empty() {
        println!("\n  INGREDIENTS");
        for ing in &detail.ingredients {
            let ing_name = &ing.name;
            let qty = &ing.text_quantity;
            match ing.notes.as_deref().filter(|n| !n.is_empty()) {
                Some(notes) => println!("    {ing_name}  {qty}  ({notes})"),
                None => println!("    {ing_name}  {qty}"),
            }
        }
    }

    if !detail.steps.is_empty() {
        println!("\n  STEPS");
        for step in &detail.steps {
            let n = step.step;
            let text = &step.description;
            println!("    {n}. {text}");
        }
    }

    if !detail.additional_notes.is_empty() {
        println!("\n  NOTES");
        for note in &detail.additional_notes {
            println!("    - {note}");
        }
    }

    println!();
    if in_list {
        println!("On your cooking list.");
    } else {
        let id = &detail.id;
        println!("Add to your cooking list with: choosy list add {id}");
    }

    Ok(())
}
