use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::checklist::ShoppingChecklist;
use crate::cooking_list::{CookingList, SelectionEntry};
use crate::db::Database;
use crate::error::FetchError;
use crate::history::{HistoryEntry, HistoryPage, NewHistoryView};
use crate::models::RecipeDetail;
use crate::shopping::{RecipeManifestEntry, SelectedRecipe, ShoppingList};
use crate::store::BlobStore;

pub const CHECKLIST_KEY: &str = "shopping_checklist";

/// Source of recipe details, typically the REST API.
///
/// `recipe_details` must be all-or-nothing: either every id resolves, in
/// input order, or the first failure is returned. Implementations may fetch
/// concurrently; the default fetches one after another.
pub trait RecipeSource {
    fn recipe_detail(&self, recipe_id: &str) -> Result<RecipeDetail, FetchError>;

    fn recipe_details(&self, recipe_ids: &[String]) -> Result<Vec<RecipeDetail>, FetchError> {
        recipe_ids.iter().map(|id| self.recipe_detail(id)).collect()
    }
}

/// Checked ingredient names, valid only for the selection they were made on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ChecklistSnapshot {
    selection: String,
    checked: Vec<String>,
}

/// A shopping list with its checklist state.
#[derive(Debug, Clone, Serialize)]
pub struct ShoppingView {
    pub checklist: ShoppingChecklist,
    pub recipes: Vec<RecipeManifestEntry>,
}

pub struct ChoosyService {
    db: Database,
}

impl ChoosyService {
    pub fn new(db_path: &Path) -> Result<Self> {
        let db = Database::open(db_path)?;
        Ok(Self { db })
    }

    pub fn new_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self { db })
    }

    // --- Cooking list ---

    #[must_use]
    pub fn cooking_list(&self) -> CookingList {
        CookingList::load(&self.db)
    }

    /// Add a fetched recipe to the cooking list. Returns false if it was
    /// already there.
    pub fn add_to_cooking_list(
        &self,
        detail: &RecipeDetail,
        servings: Option<f64>,
    ) -> Result<bool> {
        let mut list = self.cooking_list();
        let added = list.add(SelectionEntry {
            recipe_id: detail.id.clone(),
            name: detail.display_name().to_string(),
            image_path: detail.image_path.clone(),
            category: detail.category.clone(),
            added_at_epoch_millis: Utc::now().timestamp_millis(),
            servings,
        })?;
        if added {
            self.save_cooking_list(&list)?;
        }
        Ok(added)
    }

    pub fn remove_from_cooking_list(&self, recipe_id: &str) -> Result<bool> {
        let mut list = self.cooking_list();
        let removed = list.remove(recipe_id);
        if removed {
            self.save_cooking_list(&list)?;
        }
        Ok(removed)
    }

    pub fn set_cooking_servings(&self, recipe_id: &str, servings: f64) -> Result<bool> {
        let mut list = self.cooking_list();
        let updated = list.set_servings(recipe_id, servings)?;
        if updated {
            self.save_cooking_list(&list)?;
        }
        Ok(updated)
    }

    pub fn clear_cooking_list(&self) -> Result<()> {
        let mut list = self.cooking_list();
        list.clear();
        self.save_cooking_list(&list)
    }

    /// Any change to the selection discards checklist progress.
    fn save_cooking_list(&self, list: &CookingList) -> Result<()> {
        list.save(&self.db)?;
        self.db
            .delete_blob(CHECKLIST_KEY)
            .context("Failed to reset shopping checklist")?;
        Ok(())
    }

    // --- Shopping list ---

    /// Fetch every recipe on the cooking list and merge their ingredients.
    ///
    /// Checked items carry over only while the selection is unchanged. Any
    /// fetch failure fails the whole build.
    pub fn shopping_list(&self, source: &dyn RecipeSource) -> Result<ShoppingView> {
        let list = self.cooking_list();
        let selection = list.fingerprint();

        let ids: Vec<String> = list
            .entries()
            .iter()
            .map(|e| e.recipe_id.clone())
            .collect();
        let details = if ids.is_empty() {
            Vec::new()
        } else {
            source
                .recipe_details(&ids)
                .context("Failed to load recipe details for the shopping list")?
        };

        let selected: Vec<SelectedRecipe> = list
            .entries()
            .iter()
            .zip(details)
            .map(|(entry, detail)| SelectedRecipe {
                servings: entry.servings.unwrap_or(detail.servings),
                detail,
            })
            .collect();

        let shopping = ShoppingList::build(&selected);
        let mut checklist = ShoppingChecklist::new(shopping.ingredients);

        let snapshot = self.load_checklist_snapshot();
        if snapshot.selection == selection {
            checklist.restore(snapshot.checked.iter().map(String::as_str));
        } else {
            debug!("selection changed, checklist reset");
        }

        Ok(ShoppingView {
            checklist,
            recipes: shopping.recipes,
        })
    }

    /// Flip one ingredient and persist the result. Unknown names leave the
    /// checklist untouched.
    pub fn toggle_shopping_item(
        &self,
        source: &dyn RecipeSource,
        name: &str,
    ) -> Result<ShoppingView> {
        let mut view = self.shopping_list(source)?;
        if view.checklist.toggle(name) {
            let snapshot = ChecklistSnapshot {
                selection: self.cooking_list().fingerprint(),
                checked: view.checklist.checked_names(),
            };
            self.db
                .write_blob(CHECKLIST_KEY, &serde_json::to_string(&snapshot)?)
                .context("Failed to save shopping checklist")?;
        } else {
            debug!(name, "toggle ignored, ingredient not on the list");
        }
        Ok(view)
    }

    fn load_checklist_snapshot(&self) -> ChecklistSnapshot {
        match self.db.read_blob(CHECKLIST_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "corrupt shopping checklist, nothing checked");
                ChecklistSnapshot::default()
            }),
            Ok(None) => ChecklistSnapshot::default(),
            Err(e) => {
                warn!(error = %e, "failed to read shopping checklist, nothing checked");
                ChecklistSnapshot::default()
            }
        }
    }

    // --- Browsing history ---

    pub fn record_view(&self, detail: &RecipeDetail) -> Result<HistoryEntry> {
        self.db.record_view(
            &NewHistoryView {
                recipe_id: detail.id.clone(),
                recipe_name: detail.display_name().to_string(),
                category: detail.category.clone(),
                image_path: detail.image_path.clone(),
            },
            Local::now(),
        )
    }

    #[allow(clippy::cast_possible_wrap)]
    pub fn history_page(&self, limit: i64, offset: i64) -> Result<HistoryPage> {
        let items = self.db.list_history(limit, offset)?;
        let total = self.db.count_history()?;
        let has_more = offset + (items.len() as i64) < total;
        Ok(HistoryPage {
            items,
            total,
            has_more,
        })
    }

    pub fn remove_history(&self, recipe_ids: &[String]) -> Result<usize> {
        self.db.remove_history(recipe_ids)
    }

    pub fn clear_history(&self) -> Result<usize> {
        self.db.clear_history()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shopping::tests::{ingredient, recipe};
    use std::cell::Cell;
    use std::collections::HashMap;

    struct MockSource {
        recipes: HashMap<String, RecipeDetail>,
        calls: Cell<usize>,
    }

    impl MockSource {
        fn new(recipes: Vec<RecipeDetail>) -> Self {
            Self {
                recipes: recipes.into_iter().map(|r| (r.id.clone(), r)).collect(),
                calls: Cell::new(0),
            }
        }
    }

    impl RecipeSource for MockSource {
        fn recipe_detail(&self, recipe_id: &str) -> Result<RecipeDetail, FetchError> {
            self.calls.set(self.calls.get() + 1);
            self.recipes
                .get(recipe_id)
                .cloned()
                .ok_or_else(|| FetchError::NotFound(recipe_id.to_string()))
        }
    }

    fn tomato_eggs() -> RecipeDetail {
        recipe(
            "r1",
            "番茄炒蛋的做法",
            2.0,
            vec![
                ingredient("鸡蛋", Some(3.0), Some("个"), "3个"),
                ingredient("番茄", Some(200.0), Some("g"), "200g"),
                ingredient("盐", None, None, "适量"),
            ],
        )
    }

    fn steamed_egg() -> RecipeDetail {
        recipe(
            "r2",
            "鸡蛋羹",
            1.0,
            vec![
                ingredient("鸡蛋", Some(2.0), Some("个"), "2个"),
                ingredient("盐", Some(1.0), Some("g"), "1g"),
            ],
        )
    }

    fn braised_tofu() -> RecipeDetail {
        recipe(
            "r3",
            "红烧豆腐",
            2.0,
            vec![ingredient("豆腐", Some(1.0), Some("块"), "1块")],
        )
    }

    fn source() -> MockSource {
        MockSource::new(vec![tomato_eggs(), steamed_egg(), braised_tofu()])
    }

    #[test]
    fn test_add_to_cooking_list() {
        let svc = ChoosyService::new_in_memory().unwrap();
        assert!(svc.add_to_cooking_list(&tomato_eggs(), None).unwrap());
        assert!(!svc.add_to_cooking_list(&tomato_eggs(), Some(4.0)).unwrap());

        let list = svc.cooking_list();
        assert_eq!(list.len(), 1);
        let entry = &list.entries()[0];
        assert_eq!(entry.name, "番茄炒蛋");
        assert_eq!(entry.category, "家常菜");
        assert!(entry.servings.is_none());
        assert!(entry.added_at_epoch_millis > 0);
    }

    #[test]
    fn test_remove_and_clear_cooking_list() {
        let svc = ChoosyService::new_in_memory().unwrap();
        svc.add_to_cooking_list(&tomato_eggs(), None).unwrap();
        svc.add_to_cooking_list(&steamed_egg(), None).unwrap();

        assert!(svc.remove_from_cooking_list("r1").unwrap());
        assert!(!svc.remove_from_cooking_list("r1").unwrap());
        assert_eq!(svc.cooking_list().len(), 1);

        svc.clear_cooking_list().unwrap();
        assert!(svc.cooking_list().is_empty());
    }

    #[test]
    fn test_empty_cooking_list_skips_fetching() {
        let svc = ChoosyService::new_in_memory().unwrap();
        let src = source();
        let view = svc.shopping_list(&src).unwrap();
        assert!(view.checklist.items().is_empty());
        assert!(view.recipes.is_empty());
        assert_eq!(src.calls.get(), 0);
    }

    #[test]
    fn test_shopping_list_scales_requested_servings() {
        let svc = ChoosyService::new_in_memory().unwrap();
        svc.add_to_cooking_list(&tomato_eggs(), Some(4.0)).unwrap();
        svc.add_to_cooking_list(&steamed_egg(), None).unwrap();

        let view = svc.shopping_list(&source()).unwrap();
        let items = view.checklist.items();
        let eggs = items.iter().find(|i| i.name == "鸡蛋").unwrap();
        // 3 eggs for 2 servings, doubled, plus 2 from the base recipe
        assert_eq!(eggs.merged_display_text, "8个");
        let salt = items.iter().find(|i| i.name == "盐").unwrap();
        assert_eq!(salt.merged_display_text, "适量 + 1g");

        assert_eq!(view.recipes.len(), 2);
        assert!((view.recipes[0].servings - 4.0).abs() < f64::EPSILON);
        assert!((view.recipes[1].servings - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shopping_list_fails_whole_on_missing_recipe() {
        let svc = ChoosyService::new_in_memory().unwrap();
        svc.add_to_cooking_list(&tomato_eggs(), None).unwrap();
        let mut gone = braised_tofu();
        gone.id = "deleted".to_string();
        svc.add_to_cooking_list(&gone, None).unwrap();

        let err = svc.shopping_list(&source()).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("shopping list"));
        assert!(msg.contains("'deleted' not found"));
    }

    #[test]
    fn test_toggle_persists_while_selection_unchanged() {
        let svc = ChoosyService::new_in_memory().unwrap();
        let src = source();
        svc.add_to_cooking_list(&tomato_eggs(), None).unwrap();

        let view = svc.toggle_shopping_item(&src, "番茄").unwrap();
        assert_eq!(view.checklist.checked_names(), vec!["番茄"]);

        let again = svc.shopping_list(&src).unwrap();
        assert_eq!(again.checklist.checked_names(), vec!["番茄"]);
        assert_eq!(again.checklist.counts(), (2, 1));
    }

    #[test]
    fn test_toggle_unknown_ingredient_is_noop() {
        let svc = ChoosyService::new_in_memory().unwrap();
        let src = source();
        svc.add_to_cooking_list(&tomato_eggs(), None).unwrap();
        svc.toggle_shopping_item(&src, "盐").unwrap();

        let view = svc.toggle_shopping_item(&src, "牛肉").unwrap();
        assert_eq!(view.checklist.checked_names(), vec!["盐"]);
    }

    #[test]
    fn test_selection_change_resets_checklist() {
        let svc = ChoosyService::new_in_memory().unwrap();
        let src = source();
        svc.add_to_cooking_list(&tomato_eggs(), None).unwrap();
        svc.toggle_shopping_item(&src, "鸡蛋").unwrap();

        svc.add_to_cooking_list(&braised_tofu(), None).unwrap();
        let view = svc.shopping_list(&src).unwrap();
        assert!(view.checklist.items().iter().all(|i| !i.is_checked));
        let (to_buy, purchased) = view.checklist.counts();
        assert_eq!(to_buy, view.checklist.items().len());
        assert_eq!(purchased, 0);
    }

    #[test]
    fn test_selection_round_trip_does_not_restore_checklist() {
        let svc = ChoosyService::new_in_memory().unwrap();
        let src = source();
        svc.add_to_cooking_list(&tomato_eggs(), None).unwrap();
        svc.toggle_shopping_item(&src, "鸡蛋").unwrap();

        svc.add_to_cooking_list(&steamed_egg(), None).unwrap();
        assert!(svc.shopping_list(&src).unwrap().checklist.checked_names().is_empty());

        // Back to the original selection: progress stays gone
        svc.remove_from_cooking_list("r2").unwrap();
        let view = svc.shopping_list(&src).unwrap();
        assert!(view.checklist.checked_names().is_empty());
        assert!(svc.db.read_blob(CHECKLIST_KEY).unwrap().is_none());
    }

    #[test]
    fn test_noop_list_change_keeps_checklist() {
        let svc = ChoosyService::new_in_memory().unwrap();
        let src = source();
        svc.add_to_cooking_list(&tomato_eggs(), None).unwrap();
        svc.toggle_shopping_item(&src, "番茄").unwrap();

        assert!(!svc.add_to_cooking_list(&tomato_eggs(), None).unwrap());
        assert!(!svc.remove_from_cooking_list("nope").unwrap());
        let view = svc.shopping_list(&src).unwrap();
        assert_eq!(view.checklist.checked_names(), vec!["番茄"]);
    }

    #[test]
    fn test_servings_change_resets_checklist() {
        let svc = ChoosyService::new_in_memory().unwrap();
        let src = source();
        svc.add_to_cooking_list(&tomato_eggs(), None).unwrap();
        svc.toggle_shopping_item(&src, "鸡蛋").unwrap();

        svc.set_cooking_servings("r1", 6.0).unwrap();
        let view = svc.shopping_list(&src).unwrap();
        assert!(view.checklist.checked_names().is_empty());
    }

    #[test]
    fn test_corrupt_checklist_degrades_to_unchecked() {
        let svc = ChoosyService::new_in_memory().unwrap();
        svc.add_to_cooking_list(&tomato_eggs(), None).unwrap();
        svc.db.write_blob(CHECKLIST_KEY, "garbage").unwrap();

        let view = svc.shopping_list(&source()).unwrap();
        assert!(view.checklist.checked_names().is_empty());
    }

    #[test]
    fn test_history_paging() {
        let svc = ChoosyService::new_in_memory().unwrap();
        svc.record_view(&tomato_eggs()).unwrap();
        svc.record_view(&steamed_egg()).unwrap();
        let entry = svc.record_view(&tomato_eggs()).unwrap();
        assert_eq!(entry.recipe_name, "番茄炒蛋");

        let page = svc.history_page(2, 0).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 3);
        assert!(page.has_more);

        let last = svc.history_page(2, 2).unwrap();
        assert_eq!(last.items.len(), 1);
        assert!(!last.has_more);
    }

    #[test]
    fn test_history_remove_and_clear() {
        let svc = ChoosyService::new_in_memory().unwrap();
        svc.record_view(&tomato_eggs()).unwrap();
        svc.record_view(&tomato_eggs()).unwrap();
        svc.record_view(&steamed_egg()).unwrap();

        assert_eq!(svc.remove_history(&["r1".to_string()]).unwrap(), 2);
        assert_eq!(svc.history_page(20, 0).unwrap().total, 1);
        assert_eq!(svc.clear_history().unwrap(), 1);
        assert_eq!(svc.history_page(20, 0).unwrap().total, 0);
    }
}
