use anyhow::Result;
use serde::Serialize;

use crate::api::ApiClient;
use choosy_core::category::group_by_category;
use choosy_core::service::{ChoosyService, ShoppingView};
use choosy_core::shopping::{MergedIngredient, RecipeManifestEntry};

use super::helpers::{exit_not_found, format_servings};

#[derive(Serialize)]
struct ShopOutput<'a> {
    recipes: &'a [RecipeManifestEntry],
    to_buy: Vec<&'a MergedIngredient>,
    purchased: Vec<&'a MergedIngredient>,
}

pub(crate) fn cmd_shop(svc: &ChoosyService, api: &ApiClient, json: bool) -> Result<()> {
    let view = svc.shopping_list(api)?;

    if view.recipes.is_empty() {
        exit_not_found(
            "Your cooking list is empty. Add recipes with: choosy list add <id>",
            json,
        );
    }

    print_view(&view, json)
}

pub(crate) fn cmd_shop_check(
    svc: &ChoosyService,
    api: &ApiClient,
    name: &str,
    json: bool,
) -> Result<()> {
    let view = svc.toggle_shopping_item(api, name)?;

    let Some(item) = view.checklist.items().iter().find(|i| i.name == name) else {
        exit_not_found(&format!("'{name}' is not on the shopping list"), json);
    };

    if json {
        return print_view(&view, json);
    }

    let state = if item.is_checked { "purchased" } else { "to buy" };
    println!("Marked {name} as {state}");
    let (to_buy, purchased) = view.checklist.counts();
    println!("{to_buy} to buy, {purchased} purchased");
    Ok(())
}

fn print_view(view: &ShoppingView, json: bool) -> Result<()> {
    let partition = view.checklist.partition();

    if json {
        let out = ShopOutput {
            recipes: &view.recipes,
            to_buy: partition.to_buy,
            purchased: partition.purchased,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let total = view.checklist.items().len();
    let recipe_count = view.recipes.len();
    println!("=== Shopping list: {total} ingredient(s) for {recipe_count} recipe(s) ===");
    let manifest: Vec<String> = view
        .recipes
        .iter()
        .map(|r| format!("{} ×{}", r.name, format_servings(r.servings)))
        .collect();
    println!("  {}\n", manifest.join(" · "));

    let to_buy_count = partition.to_buy.len();
    println!("  TO BUY ({to_buy_count})");
    if partition.to_buy.is_empty() {
        println!("    All done!");
    }
    for (category, items) in group_by_category(partition.to_buy.iter().copied()) {
        let icon = category.icon;
        let label = category.label;
        println!("  {icon} {label}");
        for item in items {
            print_item(item);
        }
    }

    if !partition.purchased.is_empty() {
        let purchased_count = partition.purchased.len();
        println!("\n  PURCHASED ({purchased_count})");
        for item in partition.purchased {
            print_item(item);
        }
    }

    Ok(())
}

fn print_item(item: &MergedIngredient) {
    let mark = if item.is_checked { "x" } else { " " };
    let name = &item.name;
    let text = &item.merged_display_text;
    println!("    [{mark}] {name}  {text}");
    if item.occurrences.len() > 1 {
        let breakdown: Vec<String> = item
            .occurrences
            .iter()
            .map(|o| {
                let servings = format_servings(o.requested_servings);
                format!("{} ({servings}): {}", o.recipe_name, o.quantity_text)
            })
            .collect();
        println!("          {}", breakdown.join(" | "));
    }
}
