use serde::{Deserialize, Serialize};

/// One recipe as returned by the catalog listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeListItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub difficulty: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time_minutes: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default)]
    pub text_quantity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Category key supplied by the backend, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeStep {
    pub step: i64,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeDetail {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub difficulty: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Base servings the ingredient quantities are written for.
    pub servings: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prep_time_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cook_time_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time_minutes: Option<i64>,
    #[serde(default)]
    pub ingredients: Vec<RecipeIngredient>,
    #[serde(default)]
    pub steps: Vec<RecipeStep>,
    #[serde(default)]
    pub additional_notes: Vec<String>,
}

const HOW_TO_SUFFIX: &str = "的做法";

impl RecipeDetail {
    /// Recipe name without the trailing "的做法" the backend appends.
    #[must_use]
    pub fn display_name(&self) -> &str {
        display_recipe_name(&self.name)
    }
}

#[must_use]
pub fn display_recipe_name(name: &str) -> &str {
    name.strip_suffix(HOW_TO_SUFFIX).unwrap_or(name)
}

#[must_use]
pub fn difficulty_label(difficulty: i64) -> &'static str {
    match difficulty {
        1 => "简单",
        2 => "中等",
        3 => "困难",
        _ => "未知",
    }
}
