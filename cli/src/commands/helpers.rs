use serde::Serialize;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use choosy_core::models::{RecipeListItem, difficulty_label, display_recipe_name};
use choosy_core::quantity::format_amount;

/// Report a "nothing there" outcome and exit with status 2.
pub(crate) fn exit_not_found(message: &str, json: bool) -> ! {
    if json {
        println!("{}", json_error(message));
    } else {
        eprintln!("{message}");
    }
    process::exit(2);
}

pub(crate) fn print_recipe_table(items: &[RecipeListItem], numbered_from: usize) {
    #[derive(Tabled)]
    struct RecipeRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Difficulty")]
        difficulty: &'static str,
        #[tabled(rename = "Time")]
        time: String,
        #[tabled(rename = "Tags")]
        tags: String,
    }

    let rows: Vec<RecipeRow> = items
        .iter()
        .enumerate()
        .map(|(i, r)| RecipeRow {
            idx: numbered_from + i,
            id: r.id.clone(),
            name: truncate(display_recipe_name(&r.name), 24),
            category: r.category.clone(),
            difficulty: difficulty_label(r.difficulty),
            time: format_minutes(r.total_time_minutes),
            tags: truncate(&r.tags.join(", "), 20),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::single(5)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn format_minutes(minutes: Option<i64>) -> String {
    match minutes {
        Some(m) if m > 0 => format!("{m} min"),
        _ => "-".to_string(),
    }
}

pub(crate) fn format_servings(servings: f64) -> String {
    format_amount(servings)
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
