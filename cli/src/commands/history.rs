use anyhow::{Result, bail};
use chrono::Local;
use serde::Serialize;

use choosy_core::history::{
    DateGroup, FREQUENT_LIMIT, FrequentRecipe, HistoryPage, frequent_recipes, group_by_date,
};
use choosy_core::service::ChoosyService;

use super::helpers::{exit_not_found, truncate};

#[derive(Serialize)]
struct HistoryOutput<'a> {
    #[serde(flatten)]
    page: &'a HistoryPage,
    groups: Vec<DateGroup<'a>>,
    frequent: Vec<FrequentRecipe>,
}

pub(crate) fn cmd_history(svc: &ChoosyService, limit: i64, offset: i64, json: bool) -> Result<()> {
    if limit <= 0 {
        bail!("Limit must be greater than 0");
    }
    if offset < 0 {
        bail!("Offset must not be negative");
    }

    let page = svc.history_page(limit, offset)?;
    if page.items.is_empty() {
        exit_not_found("No browsing history", json);
    }

    let today = Local::now().date_naive();
    let groups = group_by_date(&page.items, today);
    let frequent = frequent_recipes(&page.items, FREQUENT_LIMIT);

    if json {
        let out = HistoryOutput {
            page: &page,
            groups,
            frequent,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let shown = page.items.len();
    let total = page.total;
    println!("=== History ({shown} of {total}) ===\n");

    for group in &groups {
        let label = if group.is_today {
            format!("Today ({})", group.date)
        } else if group.is_yesterday {
            format!("Yesterday ({})", group.date)
        } else {
            group.full_date.clone()
        };
        println!("  {label}");
        for entry in &group.items {
            let time = entry.viewed_at.format("%H:%M");
            let name = truncate(&entry.recipe_name, 24);
            let id = &entry.recipe_id;
            let category = &entry.category;
            println!("    {time}  {name} [{id}] {category}");
        }
        println!();
    }

    if frequent.iter().any(|f| f.count > 1) {
        println!("  MOST VIEWED");
        for f in frequent.iter().filter(|f| f.count > 1) {
            let name = &f.recipe_name;
            let count = f.count;
            println!("    {name} ×{count}");
        }
        println!();
    }

    if page.has_more {
        let next = offset + limit;
        println!("More: --offset {next}");
    }

    Ok(())
}

pub(crate) fn cmd_history_remove(
    svc: &ChoosyService,
    recipe_ids: &[String],
    json: bool,
) -> Result<()> {
    let removed = svc.remove_history(recipe_ids)?;
    if removed == 0 {
        exit_not_found("No history entries matched", json);
    }

    if json {
        println!("{}", serde_json::json!({ "removed": removed }));
    } else {
        println!("Removed {removed} history entr{}", if removed == 1 { "y" } else { "ies" });
    }
    Ok(())
}

pub(crate) fn cmd_history_clear(svc: &ChoosyService, json: bool) -> Result<()> {
    let removed = svc.clear_history()?;

    if json {
        println!("{}", serde_json::json!({ "removed": removed }));
    } else {
        println!("Cleared browsing history ({removed} entries)");
    }
    Ok(())
}
