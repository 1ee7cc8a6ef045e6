//! Catalog search view.

use crate::catalog::Catalog;
use crate::item::Item;

/// Search and tag predicates over the catalog, applied conjunctively.
///
/// Both predicates are case-insensitive substring matches; an empty predicate
/// matches everything. Recomputed on every call, never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    search: String,
    tag: String,
}

impl CatalogFilter {
    pub fn new(search: &str, tag: &str) -> Self {
        Self {
            search: search.to_lowercase(),
            tag: tag.to_lowercase(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_empty() && self.tag.is_empty()
    }

    pub fn matches(&self, item: &Item) -> bool {
        let matches_search = item.name.to_lowercase().contains(&self.search);
        let matches_tag = self.tag.is_empty()
            || item
                .tags
                .iter()
                .any(|t| t.to_lowercase().contains(&self.tag));
        matches_search && matches_tag
    }

    /// Items that pass both predicates, in catalog order.
    pub fn apply<'a>(&self, catalog: &'a Catalog) -> Vec<&'a Item> {
        catalog.items().iter().filter(|item| self.matches(item)).collect()
    }
}
