//! Load/save of the two collections as JSON arrays.

use serde::Serialize;
use serde::de::DeserializeOwned;

use boqkit_boq::{Line, LineList};
use boqkit_catalog::{Catalog, Item, sample_catalog};
use boqkit_core::CollectionId;

use crate::store::{KeyValueStore, StoreError};

/// Collections restored at startup.
#[derive(Debug, Clone)]
pub struct LoadedState {
    pub catalog: Catalog,
    pub lines: LineList,
}

impl Default for LoadedState {
    /// Bundled sample catalog and an empty BOQ.
    fn default() -> Self {
        Self {
            catalog: sample_catalog(),
            lines: LineList::empty(),
        }
    }
}

/// Reads and writes the `catalog` and `boq` entries of a [`KeyValueStore`].
#[derive(Debug, Clone)]
pub struct Persistence<S> {
    store: S,
}

impl<S: KeyValueStore> Persistence<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Restore both collections.
    ///
    /// A missing, unreadable, or invalid entry falls back to its default; only
    /// the latter two are logged.
    pub async fn load(&self) -> LoadedState {
        let catalog = match self.read::<Vec<Item>>(CollectionId::Catalog).await {
            Some(items) => Catalog::new(items).unwrap_or_else(|err| {
                tracing::warn!(%err, "stored catalog is invalid; using sample catalog");
                sample_catalog()
            }),
            None => sample_catalog(),
        };

        let lines = match self.read::<Vec<Line>>(CollectionId::Boq).await {
            Some(lines) => LineList::new(lines).unwrap_or_else(|err| {
                tracing::warn!(%err, "stored BOQ is invalid; starting empty");
                LineList::empty()
            }),
            None => LineList::empty(),
        };

        tracing::debug!(items = catalog.len(), lines = lines.len(), "state loaded");
        LoadedState { catalog, lines }
    }

    pub async fn save_catalog(&self, catalog: &Catalog) -> Result<(), StoreError> {
        self.write(CollectionId::Catalog, catalog.items()).await
    }

    pub async fn save_lines(&self, lines: &LineList) -> Result<(), StoreError> {
        self.write(CollectionId::Boq, lines.lines()).await
    }

    async fn read<T: DeserializeOwned>(&self, collection: CollectionId) -> Option<T> {
        let key = collection.storage_key();
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(key, %err, "failed to read stored collection; using default");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(key, %err, "stored collection is not valid JSON; using default");
                None
            }
        }
    }

    async fn write<T: Serialize + ?Sized>(
        &self,
        collection: CollectionId,
        value: &T,
    ) -> Result<(), StoreError> {
        let key = collection.storage_key();
        let json = serde_json::to_string(value).map_err(|e| StoreError::Encode {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.store.set(key, &json).await
    }
}
