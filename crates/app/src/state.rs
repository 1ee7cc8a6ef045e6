use boqkit_boq::LineList;
use boqkit_catalog::{Catalog, CatalogFilter, Item};
use boqkit_infra::LoadedState;

/// Everything the application holds in memory.
///
/// Owned by the [`crate::Session`]; readers get shared references and request
/// changes through commands.
#[derive(Debug, Clone)]
pub struct AppState {
    pub catalog: Catalog,
    pub lines: LineList,
}

impl AppState {
    pub fn new(catalog: Catalog, lines: LineList) -> Self {
        Self { catalog, lines }
    }

    /// Catalog view for the given search and tag filter.
    pub fn visible_items(&self, filter: &CatalogFilter) -> Vec<&Item> {
        filter.apply(&self.catalog)
    }

    pub fn total(&self) -> f64 {
        self.lines.total()
    }
}

impl From<LoadedState> for AppState {
    fn from(loaded: LoadedState) -> Self {
        Self::new(loaded.catalog, loaded.lines)
    }
}

impl Default for AppState {
    fn default() -> Self {
        LoadedState::default().into()
    }
}
