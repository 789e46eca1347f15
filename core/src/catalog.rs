use anyhow::{Result, bail};
use serde::Serialize;

use crate::models::RecipeListItem;

pub const PAGE_SIZE: u32 = 20;

/// Filters for the recipe listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl CatalogQuery {
    /// Query for the zero-based `page` of `page_size` items.
    pub fn page(page: u32, page_size: u32) -> Result<Self> {
        let Some(offset) = page.checked_mul(page_size) else {
            bail!("Page number too large");
        };
        Ok(Self {
            limit: Some(page_size),
            offset: Some(offset),
            ..Self::default()
        })
    }

    #[must_use]
    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    #[must_use]
    pub fn with_search(mut self, search: Option<String>) -> Self {
        self.search = search;
        self
    }

    /// Query-string pairs; empty strings and zero values are left out.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(c) = self.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            pairs.push(("category", c.to_string()));
        }
        if let Some(s) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            pairs.push(("search", s.to_string()));
        }
        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset.filter(|o| *o > 0) {
            pairs.push(("offset", offset.to_string()));
        }
        pairs
    }
}

/// One page of catalog results.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogPage {
    pub items: Vec<RecipeListItem>,
    pub page: u32,
    /// A full page suggests there may be another one.
    pub has_more: bool,
}

impl CatalogPage {
    #[must_use]
    pub fn new(items: Vec<RecipeListItem>, page: u32, page_size: u32) -> Self {
        let has_more = items.len() == page_size as usize;
        Self {
            items,
            page,
            has_more,
        }
    }
}
