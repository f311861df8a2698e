//! Distinct categories of the collection, for populating the filter control.

use std::collections::HashSet;
use std::fmt;

use crate::quote::Quote;
use crate::select::{ALL_CATEGORIES, CategoryFilter};

/// One entry of the category selector.
///
/// The synthetic "all" entry is its own variant, so a quote whose category is
/// literally `"all"` never collapses into it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CategoryOption {
    All,
    Named(String),
}

impl CategoryOption {
    pub fn filter(&self) -> CategoryFilter {
        match self {
            CategoryOption::All => CategoryFilter::All,
            CategoryOption::Named(name) => CategoryFilter::Only(name.clone()),
        }
    }
}

impl fmt::Display for CategoryOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryOption::All => f.write_str(ALL_CATEGORIES),
            CategoryOption::Named(name) => f.write_str(name),
        }
    }
}

/// Distinct categories in first-seen order. Rebuilt from scratch whenever the
/// collection changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryIndex {
    categories: Vec<String>,
}

impl CategoryIndex {
    pub fn build(quotes: &[Quote]) -> Self {
        let mut seen = HashSet::new();
        let categories = quotes
            .iter()
            .filter(|q| seen.insert(q.category.as_str()))
            .map(|q| q.category.clone())
            .collect();

        Self { categories }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn contains(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    /// Selector options: "all" first, then every distinct category.
    pub fn options(&self) -> Vec<CategoryOption> {
        std::iter::once(CategoryOption::All)
            .chain(self.categories.iter().cloned().map(CategoryOption::Named))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
