use std::collections::HashMap;

use icu_collator::{Collator, CollatorOptions};
use icu_locid::locale;
use serde::Serialize;
use tracing::{debug, warn};

use crate::models::{RecipeDetail, RecipeIngredient};
use crate::quantity::{format_amount, merge_quantities};

/// One ingredient line contributed by one recipe, already scaled to the
/// requested servings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaledIngredientOccurrence {
    pub ingredient_name: String,
    pub recipe_name: String,
    pub requested_servings: f64,
    pub quantity_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedIngredient {
    pub name: String,
    /// First backend-supplied category among the occurrences. Display only.
    pub category: Option<String>,
    pub occurrences: Vec<ScaledIngredientOccurrence>,
    pub merged_display_text: String,
    pub is_checked: bool,
}

/// A fetched recipe plus the servings the user wants to cook.
#[derive(Debug, Clone)]
pub struct SelectedRecipe {
    pub detail: RecipeDetail,
    pub servings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeManifestEntry {
    pub id: String,
    pub name: String,
    pub image_path: Option<String>,
    pub servings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShoppingList {
    pub ingredients: Vec<MergedIngredient>,
    pub recipes: Vec<RecipeManifestEntry>,
}

impl ShoppingList {
    #[must_use]
    pub fn build(selected: &[SelectedRecipe]) -> Self {
        let recipes = selected
            .iter()
            .map(|s| RecipeManifestEntry {
                id: s.detail.id.clone(),
                name: s.detail.display_name().to_string(),
                image_path: s.detail.image_path.clone(),
                servings: s.servings,
            })
            .collect();
        Self {
            ingredients: aggregate(selected),
            recipes,
        }
    }
}

/// Ratio between requested and base servings. A recipe without a usable base
/// is taken as-is.
#[must_use]
pub fn serving_ratio(requested: f64, base: f64) -> f64 {
    if base > 0.0 { requested / base } else { 1.0 }
}

/// Render one ingredient's quantity for the given ratio.
///
/// Only a non-zero numeric base quantity is rescaled, and only when the ratio
/// differs from 1; otherwise the backend's text is kept untouched.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn scaled_quantity_text(ingredient: &RecipeIngredient, ratio: f64) -> String {
    match ingredient.quantity {
        Some(quantity) if quantity != 0.0 && ratio != 1.0 => format!(
            "{}{}",
            format_amount(quantity * ratio),
            ingredient.unit.as_deref().unwrap_or("")
        ),
        _ => ingredient.text_quantity.clone(),
    }
}

/// Merge every selected recipe's ingredients by exact name, sorted by name
/// with Chinese collation. Occurrences keep selection order.
#[must_use]
pub fn aggregate(selected: &[SelectedRecipe]) -> Vec<MergedIngredient> {
    let mut groups: Vec<(String, Option<String>, Vec<ScaledIngredientOccurrence>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for recipe in selected {
        let ratio = serving_ratio(recipe.servings, recipe.detail.servings);
        let recipe_name = recipe.detail.display_name();

        for ingredient in &recipe.detail.ingredients {
            let occurrence = ScaledIngredientOccurrence {
                ingredient_name: ingredient.name.clone(),
                recipe_name: recipe_name.to_string(),
                requested_servings: recipe.servings,
                quantity_text: scaled_quantity_text(ingredient, ratio),
            };

            let slot = *index.entry(ingredient.name.clone()).or_insert_with(|| {
                groups.push((ingredient.name.clone(), None, Vec::new()));
                groups.len() - 1
            });
            let (_, category, occurrences) = &mut groups[slot];
            if category.is_none() {
                category.clone_from(&ingredient.category);
            }
            occurrences.push(occurrence);
        }
    }

    let mut merged: Vec<MergedIngredient> = groups
        .into_iter()
        .map(|(name, category, occurrences)| {
            let merged_display_text = merge_quantities(&occurrences).total;
            MergedIngredient {
                name,
                category,
                occurrences,
                merged_display_text,
                is_checked: false,
            }
        })
        .collect();

    sort_by_name(&mut merged);
    debug!(
        recipes = selected.len(),
        ingredients = merged.len(),
        "aggregated shopping list"
    );
    merged
}

fn sort_by_name(items: &mut [MergedIngredient]) {
    match Collator::try_new(&locale!("zh").into(), CollatorOptions::new()) {
        Ok(collator) => items.sort_by(|a, b| collator.compare(&a.name, &b.name)),
        Err(e) => {
            warn!(error = %e, "collator unavailable, sorting by code point");
            items.sort_by(|a, b| a.name.cmp(&b.name));
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn ingredient(
        name: &str,
        quantity: Option<f64>,
        unit: Option<&str>,
        text: &str,
    ) -> RecipeIngredient {
        RecipeIngredient {
            name: name.to_string(),
            quantity,
            unit: unit.map(str::to_string),
            text_quantity: text.to_string(),
            notes: None,
            category: None,
        }
    }

    pub(crate) fn recipe(
        id: &str,
        name: &str,
        servings: f64,
        ingredients: Vec<RecipeIngredient>,
    ) -> RecipeDetail {
        RecipeDetail {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            category: "家常菜".to_string(),
            difficulty: 1,
            tags: Vec::new(),
            servings,
            image_path: None,
            prep_time_minutes: None,
            cook_time_minutes: None,
            total_time_minutes: None,
            ingredients,
            steps: Vec::new(),
            additional_notes: Vec::new(),
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

    fn pork() -> RecipeDetail {
        recipe(
            "r2",
            "红烧肉",
            4.0,
            vec![
                ingredient("五花肉", Some(500.0), Some("g"), "500g"),
                ingredient("盐", Some(5.0), Some("g"), "5g"),
                ingredient("白糖", Some(30.0), Some("g"), "30g（炒糖色）"),
            ],
        )
    }

    #[test]
    fn test_scaled_quantity_doubles() {
        let ing = ingredient("面粉", Some(100.0), Some("g"), "100克");
        let ratio = serving_ratio(4.0, 2.0);
        assert_eq!(scaled_quantity_text(&ing, ratio), "200g");
    }

    #[test]
    fn test_scaled_quantity_fractional() {
        let ing = ingredient("鸡蛋", Some(3.0), Some("个"), "3个");
        assert_eq!(scaled_quantity_text(&ing, 0.5), "1.5个");
        assert_eq!(scaled_quantity_text(&ing, 1.5), "4.5个");
    }

    #[test]
    fn test_ratio_one_keeps_text_verbatim() {
        let ing = ingredient("白糖", Some(30.0), Some("g"), "30g（炒糖色）");
        assert_eq!(scaled_quantity_text(&ing, 1.0), "30g（炒糖色）");
    }

    #[test]
    fn test_non_numeric_or_zero_quantity_keeps_text() {
        let ing = ingredient("盐", None, None, "适量");
        assert_eq!(scaled_quantity_text(&ing, 2.0), "适量");

        let ing = ingredient("葱", Some(0.0), Some("根"), "少许");
        assert_eq!(scaled_quantity_text(&ing, 2.0), "少许");
    }

    #[test]
    fn test_missing_unit_scales_bare_number() {
        let ing = ingredient("鸡蛋", Some(2.0), None, "2");
        assert_eq!(scaled_quantity_text(&ing, 2.0), "4");
    }

    #[test]
    fn test_serving_ratio_guards_zero_base() {
        assert!((serving_ratio(4.0, 0.0) - 1.0).abs() < f64::EPSILON);
        assert!((serving_ratio(3.0, 2.0) - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_aggregate_merges_by_exact_name() {
        let selected = vec![
            SelectedRecipe {
                detail: tomato_eggs(),
                servings: 2.0,
            },
            SelectedRecipe {
                detail: pork(),
                servings: 4.0,
            },
        ];
        let merged = aggregate(&selected);
        assert_eq!(merged.len(), 5);

        let salt = merged.iter().find(|m| m.name == "盐").unwrap();
        assert_eq!(salt.occurrences.len(), 2);
        assert_eq!(salt.occurrences[0].recipe_name, "番茄炒蛋");
        assert_eq!(salt.occurrences[1].recipe_name, "红烧肉");
        assert_eq!(salt.merged_display_text, "适量 + 5g");
        assert!(merged.iter().all(|m| !m.is_checked));
    }

    #[test]
    fn test_aggregate_sums_scaled_quantities() {
        let selected = vec![
            SelectedRecipe {
                detail: tomato_eggs(),
                servings: 4.0,
            },
            SelectedRecipe {
                detail: recipe(
                    "r3",
                    "蛋炒饭",
                    1.0,
                    vec![ingredient("鸡蛋", Some(2.0), Some("个"), "2个")],
                ),
                servings: 1.0,
            },
        ];
        let merged = aggregate(&selected);
        let eggs = merged.iter().find(|m| m.name == "鸡蛋").unwrap();
        assert_eq!(eggs.occurrences[0].quantity_text, "6个");
        assert!((eggs.occurrences[0].requested_servings - 4.0).abs() < f64::EPSILON);
        assert_eq!(eggs.occurrences[1].quantity_text, "2个");
        assert_eq!(eggs.merged_display_text, "8个");
    }

    #[test]
    fn test_aggregate_names_are_unique() {
        let selected = vec![
            SelectedRecipe {
                detail: tomato_eggs(),
                servings: 2.0,
            },
            SelectedRecipe {
                detail: tomato_eggs(),
                servings: 2.0,
            },
        ];
        let merged = aggregate(&selected);
        let mut names: Vec<&str> = merged.iter().map(|m| m.name.as_str()).collect();
        let before = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), before);
        assert_eq!(before, 3);
    }

    #[test]
    fn test_aggregate_does_not_normalize_names() {
        let selected = vec![SelectedRecipe {
            detail: recipe(
                "r4",
                "蒸蛋",
                1.0,
                vec![
                    ingredient("鸡蛋", Some(1.0), Some("个"), "1个"),
                    ingredient("鸡蛋(大)", Some(1.0), Some("个"), "1个"),
                ],
            ),
            servings: 1.0,
        }];
        assert_eq!(aggregate(&selected).len(), 2);
    }

    #[test]
    fn test_aggregate_sorted_by_pinyin() {
        // Code point order would be 土豆, 白菜, 鸡蛋
        let selected = vec![SelectedRecipe {
            detail: recipe(
                "r5",
                "乱炖",
                1.0,
                vec![
                    ingredient("鸡蛋", None, None, "2个"),
                    ingredient("土豆", None, None, "1个"),
                    ingredient("白菜", None, None, "半颗"),
                ],
            ),
            servings: 1.0,
        }];
        let names: Vec<String> = aggregate(&selected).into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["白菜", "鸡蛋", "土豆"]);
    }

    #[test]
    fn test_aggregate_takes_first_supplied_category() {
        let mut plain = ingredient("姜", None, None, "1块");
        plain.category = None;
        let mut tagged = ingredient("姜", None, None, "2片");
        tagged.category = Some("seasoning".to_string());

        let selected = vec![
            SelectedRecipe {
                detail: recipe("a", "A", 1.0, vec![plain]),
                servings: 1.0,
            },
            SelectedRecipe {
                detail: recipe("b", "B", 1.0, vec![tagged]),
                servings: 1.0,
            },
        ];
        let merged = aggregate(&selected);
        assert_eq!(merged[0].category.as_deref(), Some("seasoning"));
    }

    #[test]
    fn test_shopping_list_manifest() {
        let mut detail = tomato_eggs();
        detail.image_path = Some("/img/r1.jpg".to_string());
        let list = ShoppingList::build(&[
            SelectedRecipe {
                detail,
                servings: 3.0,
            },
            SelectedRecipe {
                detail: pork(),
                servings: 4.0,
            },
        ]);
        assert_eq!(list.recipes.len(), 2);
        assert_eq!(list.recipes[0].name, "番茄炒蛋");
        assert_eq!(list.recipes[0].image_path.as_deref(), Some("/img/r1.jpg"));
        assert!((list.recipes[0].servings - 3.0).abs() < f64::EPSILON);
        assert_eq!(list.recipes[1].id, "r2");
    }

    #[test]
    fn test_empty_selection() {
        let list = ShoppingList::build(&[]);
        assert!(list.ingredients.is_empty());
        assert!(list.recipes.is_empty());
    }
}
