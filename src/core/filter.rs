//! Category and title filtering over the catalog

use super::catalog::{Catalog, DocumentRecord};

/// Active category selection
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// The permanent "all" entry, matches every record
    #[default]
    All,
    /// Exact match on a literal category value
    Only(String),
}

impl CategoryFilter {
    pub fn matches(&self, record: &DocumentRecord) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => record.category == *category,
        }
    }
}

/// Current filter state driving the visible set
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    pub category: CategoryFilter,
    search_query: String,
    /// Case-folded copy of `search_query` used for comparison
    folded_query: String,
}

impl FilterState {
    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    /// Store a query, trimming surrounding whitespace
    pub fn set_search_query(&mut self, text: &str) {
        self.search_query = text.trim().to_string();
        self.folded_query = self.search_query.to_lowercase();
    }

    /// Both predicates must hold: category, then title substring
    pub fn matches(&self, record: &DocumentRecord) -> bool {
        self.category.matches(record)
            && (self.folded_query.is_empty()
                || record.title.to_lowercase().contains(&self.folded_query))
    }

    /// Derive the visible set, keeping catalog order. Indices point back
    /// into the catalog so a card can open its record.
    pub fn visible<'a>(&self, catalog: &'a Catalog) -> Vec<(usize, &'a DocumentRecord)> {
        catalog
            .records()
            .iter()
            .enumerate()
            .filter(|(_, record)| self.matches(record))
            .collect()
    }
}

/// Distinct categories in order of first appearance
pub fn distinct_categories(catalog: &Catalog) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();
    for record in catalog.records() {
        if !categories.iter().any(|c| c == &record.category) {
            categories.push(record.category.clone());
        }
    }
    categories
}
