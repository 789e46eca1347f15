use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::store::BlobStore;

pub const COOKING_LIST_KEY: &str = "cooking_list";

/// One recipe the user intends to cook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionEntry {
    #[serde(rename = "id")]
    pub recipe_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(rename = "addedAt")]
    pub added_at_epoch_millis: i64,
    /// Requested servings; `None` means the recipe's own base servings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings: Option<f64>,
}

/// The persisted cooking list. Always stored and loaded as one blob.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CookingList {
    entries: Vec<SelectionEntry>,
}

impl CookingList {
    #[must_use]
    pub fn new(entries: Vec<SelectionEntry>) -> Self {
        Self { entries }
    }

    /// Read the list from the store. Missing, unreadable or corrupt data
    /// yields an empty list.
    pub fn load(store: &dyn BlobStore) -> Self {
        let raw = match store.read_blob(COOKING_LIST_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Self::default(),
            Err(e) => {
                warn!(error = %e, "failed to read cooking list, starting empty");
                return Self::default();
            }
        };
        match serde_json::from_str::<Vec<SelectionEntry>>(&raw) {
            Ok(entries) => Self { entries },
            Err(e) => {
                warn!(error = %e, "corrupt cooking list, starting empty");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &dyn BlobStore) -> Result<()> {
        let raw = serde_json::to_string(&self.entries)?;
        store
            .write_blob(COOKING_LIST_KEY, &raw)
            .context("Failed to save cooking list")
    }

    #[must_use]
    pub fn entries(&self) -> &[SelectionEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, recipe_id: &str) -> bool {
        self.entries.iter().any(|e| e.recipe_id == recipe_id)
    }

    /// Append an entry. Returns false (and changes nothing) if the recipe is
    /// already on the list.
    pub fn add(&mut self, entry: SelectionEntry) -> Result<bool> {
        if let Some(servings) = entry.servings {
            validate_servings(servings)?;
        }
        if self.contains(&entry.recipe_id) {
            return Ok(false);
        }
        self.entries.push(entry);
        Ok(true)
    }

    pub fn remove(&mut self, recipe_id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.recipe_id != recipe_id);
        self.entries.len() != before
    }

    /// Add when absent, remove when present. Returns whether the recipe is on
    /// the list afterwards.
    pub fn toggle(&mut self, entry: SelectionEntry) -> Result<bool> {
        if self.remove(&entry.recipe_id) {
            return Ok(false);
        }
        self.add(entry)
    }

    pub fn set_servings(&mut self, recipe_id: &str, servings: f64) -> Result<bool> {
        validate_servings(servings)?;
        match self.entries.iter_mut().find(|e| e.recipe_id == recipe_id) {
            Some(entry) => {
                entry.servings = Some(servings);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Identity of the selection: recipe ids and requested servings, in order.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let pairs: Vec<(&str, Option<f64>)> = self
            .entries
            .iter()
            .map(|e| (e.recipe_id.as_str(), e.servings))
            .collect();
        serde_json::to_string(&pairs).unwrap_or_default()
    }
}

fn validate_servings(servings: f64) -> Result<()> {
    if !servings.is_finite() || servings <= 0.0 {
        bail!("Servings must be greater than 0");
    }
    Ok(())
}
