use serde::Serialize;

use crate::shopping::MergedIngredient;

/// Display metadata for one ingredient category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngredientCategory {
    pub key: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
}

pub const OTHER_KEY: &str = "other";

/// Fixed category table, in display order. `other` must stay last and unique.
pub const INGREDIENT_CATEGORIES: &[IngredientCategory] = &[
    IngredientCategory {
        key: "meat",
        label: "肉类",
        icon: "🥩",
        color: "#e8503a",
    },
    IngredientCategory {
        key: "seafood",
        label: "海鲜水产",
        icon: "🦐",
        color: "#2980b9",
    },
    IngredientCategory {
        key: "vegetable",
        label: "蔬菜",
        icon: "🥬",
        color: "#27ae60",
    },
    IngredientCategory {
        key: "tofu",
        label: "豆制品",
        icon: "🧈",
        color: "#f4a261",
    },
    IngredientCategory {
        key: "egg",
        label: "蛋奶",
        icon: "🥚",
        color: "#f39c12",
    },
    IngredientCategory {
        key: "seasoning",
        label: "调味料",
        icon: "🧂",
        color: "#8d6e63",
    },
    IngredientCategory {
        key: "staple",
        label: "主食",
        icon: "🍚",
        color: "#d35400",
    },
    IngredientCategory {
        key: OTHER_KEY,
        label: "其他",
        icon: "📦",
        color: "#78909c",
    },
];

/// The fallback entry used for absent or unknown keys.
#[must_use]
pub fn other() -> &'static IngredientCategory {
    &INGREDIENT_CATEGORIES[INGREDIENT_CATEGORIES.len() - 1]
}

/// Look up a backend-supplied category key. Never fails: anything not in the
/// table (including `None` and `""`) resolves to the `other` entry.
#[must_use]
pub fn lookup(key: Option<&str>) -> &'static IngredientCategory {
    key.and_then(|k| INGREDIENT_CATEGORIES.iter().find(|c| c.key == k))
        .unwrap_or_else(other)
}

/// Group merged ingredients for display, in table order. Empty groups are
/// skipped; order inside a group follows the input slice.
#[must_use]
pub fn group_by_category<'a, I>(
    ingredients: I,
) -> Vec<(&'static IngredientCategory, Vec<&'a MergedIngredient>)>
where
    I: IntoIterator<Item = &'a MergedIngredient>,
{
    let ingredients: Vec<&MergedIngredient> = ingredients.into_iter().collect();
    INGREDIENT_CATEGORIES
        .iter()
        .filter_map(|cat| {
            let members: Vec<&MergedIngredient> = ingredients
                .iter()
                .copied()
                .filter(|ing| lookup(ing.category.as_deref()).key == cat.key)
                .collect();
            (!members.is_empty()).then_some((cat, members))
        })
        .collect()
}
