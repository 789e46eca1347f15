use std::collections::HashSet;

use serde::Serialize;

use crate::shopping::MergedIngredient;

/// To-buy / purchased view over a shopping list's merged ingredients.
///
/// A checklist is built fresh, all unchecked, for every selection; progress
/// only carries over through [`ShoppingChecklist::restore`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShoppingChecklist {
    items: Vec<MergedIngredient>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Partition<'a> {
    pub to_buy: Vec<&'a MergedIngredient>,
    pub purchased: Vec<&'a MergedIngredient>,
}

impl ShoppingChecklist {
    #[must_use]
    pub fn new(mut items: Vec<MergedIngredient>) -> Self {
        for item in &mut items {
            item.is_checked = false;
        }
        Self { items }
    }

    #[must_use]
    pub fn items(&self) -> &[MergedIngredient] {
        &self.items
    }

    #[must_use]
    pub fn into_items(self) -> Vec<MergedIngredient> {
        self.items
    }

    /// Flip the named ingredient. Unknown names are ignored; returns whether
    /// anything changed.
    pub fn toggle(&mut self, name: &str) -> bool {
        match self.items.iter_mut().find(|i| i.name == name) {
            Some(item) => {
                item.is_checked = !item.is_checked;
                true
            }
            None => false,
        }
    }

    /// Mark exactly the given names as checked. Names not on the list are
    /// dropped silently.
    pub fn restore<'a, I>(&mut self, checked: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let checked: HashSet<&str> = checked.into_iter().collect();
        for item in &mut self.items {
            item.is_checked = checked.contains(item.name.as_str());
        }
    }

    #[must_use]
    pub fn checked_names(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|i| i.is_checked)
            .map(|i| i.name.clone())
            .collect()
    }

    /// Split into unchecked and checked items, both in list order.
    #[must_use]
    pub fn partition(&self) -> Partition<'_> {
        let (purchased, to_buy): (Vec<_>, Vec<_>) = self.items.iter().partition(|i| i.is_checked);
        Partition { to_buy, purchased }
    }

    /// `(to_buy, purchased)` counts.
    #[must_use]
    pub fn counts(&self) -> (usize, usize) {
        let purchased = self.items.iter().filter(|i| i.is_checked).count();
        (self.items.len() - purchased, purchased)
    }
}
