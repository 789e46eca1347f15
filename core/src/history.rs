use std::collections::HashMap;

use chrono::{DateTime, Datelike, Local, NaiveDate};
use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const FREQUENT_LIMIT: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub recipe_id: String,
    pub recipe_name: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    pub viewed_at: DateTime<Local>,
}

#[derive(Debug, Clone)]
pub struct NewHistoryView {
    pub recipe_id: String,
    pub recipe_name: String,
    pub category: String,
    pub image_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryPage {
    pub items: Vec<HistoryEntry>,
    pub total: i64,
    pub has_more: bool,
}

/// Views that happened on one calendar day.
#[derive(Debug, Clone, Serialize)]
pub struct DateGroup<'a> {
    /// `MM/DD`
    pub date: String,
    /// `YYYY-MM-DD`
    pub full_date: String,
    pub is_today: bool,
    pub is_yesterday: bool,
    pub items: Vec<&'a HistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequentRecipe {
    pub recipe_id: String,
    pub recipe_name: String,
    pub count: usize,
}

/// Group views by local day, newest day first. Items keep input order.
#[must_use]
pub fn group_by_date(items: &[HistoryEntry], today: NaiveDate) -> Vec<DateGroup<'_>> {
    let yesterday = today.pred_opt();
    let mut groups: Vec<DateGroup<'_>> = Vec::new();
    let mut index: HashMap<NaiveDate, usize> = HashMap::new();

    for item in items {
        let day = item.viewed_at.date_naive();
        let slot = *index.entry(day).or_insert_with(|| {
            groups.push(DateGroup {
                date: format!("{:02}/{:02}", day.month(), day.day()),
                full_date: day.format("%Y-%m-%d").to_string(),
                is_today: day == today,
                is_yesterday: Some(day) == yesterday,
                items: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].items.push(item);
    }

    groups.sort_by(|a, b| b.full_date.cmp(&a.full_date));
    groups
}

/// Most-viewed recipes, by view count descending. Ties keep first-seen order.
#[must_use]
pub fn frequent_recipes(items: &[HistoryEntry], limit: usize) -> Vec<FrequentRecipe> {
    let mut counts: Vec<FrequentRecipe> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for item in items {
        match index.get(item.recipe_id.as_str()) {
            Some(&slot) => counts[slot].count += 1,
            None => {
                index.insert(&item.recipe_id, counts.len());
                counts.push(FrequentRecipe {
                    recipe_id: item.recipe_id.clone(),
                    recipe_name: item.recipe_name.clone(),
                    count: 1,
                });
            }
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(limit);
    counts
}
