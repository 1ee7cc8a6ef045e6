use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use boqkit_core::{
    Aggregate, AggregateRoot, CollectionId, DomainError, DomainResult, ItemId, position_of,
};
use boqkit_events::Event;

use crate::item::Item;

/// Aggregate root: the item catalog.
///
/// An ordered sequence of items with unique ids. Only `apply` mutates it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Catalog {
    items: Vec<Item>,
    version: u64,
}

impl Catalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a catalog from existing items (persisted state, sample data).
    pub fn new(items: Vec<Item>) -> DomainResult<Self> {
        validate_items(&items)?;
        Ok(Self { items, version: 0 })
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn get(&self, id: &ItemId) -> Option<&Item> {
        position_of(&self.items, id).map(|idx| &self.items[idx])
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<Item> {
        self.items
    }
}

/// Validate every item and require ids to be unique.
pub fn validate_items(items: &[Item]) -> DomainResult<()> {
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        item.validate()?;
        if !seen.insert(&item.id) {
            return Err(DomainError::conflict(format!("duplicate item id '{}'", item.id)));
        }
    }
    Ok(())
}

impl AggregateRoot for Catalog {
    type Id = CollectionId;

    fn id(&self) -> &Self::Id {
        &CollectionId::Catalog
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: AddItem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddItem {
    pub item: Item,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateItem (matched on `item.id`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateItem {
    pub item: Item,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeleteItem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteItem {
    pub item_id: ItemId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReplaceCatalog (import).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplaceCatalog {
    pub items: Vec<Item>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CatalogCommand {
    AddItem(AddItem),
    UpdateItem(UpdateItem),
    DeleteItem(DeleteItem),
    ReplaceCatalog(ReplaceCatalog),
}

impl CatalogCommand {
    pub fn add(item: Item) -> Self {
        Self::AddItem(AddItem {
            item,
            occurred_at: Utc::now(),
        })
    }

    pub fn update(item: Item) -> Self {
        Self::UpdateItem(UpdateItem {
            item,
            occurred_at: Utc::now(),
        })
    }

    pub fn delete(item_id: ItemId) -> Self {
        Self::DeleteItem(DeleteItem {
            item_id,
            occurred_at: Utc::now(),
        })
    }

    pub fn replace(items: Vec<Item>) -> Self {
        Self::ReplaceCatalog(ReplaceCatalog {
            items,
            occurred_at: Utc::now(),
        })
    }
}

/// Event: ItemAdded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemAdded {
    pub item: Item,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemUpdated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemUpdated {
    pub item: Item,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemDeleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDeleted {
    pub item_id: ItemId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CatalogReplaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogReplaced {
    pub items: Vec<Item>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CatalogEvent {
    ItemAdded(ItemAdded),
    ItemUpdated(ItemUpdated),
    ItemDeleted(ItemDeleted),
    CatalogReplaced(CatalogReplaced),
}

impl Event for CatalogEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CatalogEvent::ItemAdded(_) => "catalog.item.added",
            CatalogEvent::ItemUpdated(_) => "catalog.item.updated",
            CatalogEvent::ItemDeleted(_) => "catalog.item.deleted",
            CatalogEvent::CatalogReplaced(_) => "catalog.replaced",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CatalogEvent::ItemAdded(e) => e.occurred_at,
            CatalogEvent::ItemUpdated(e) => e.occurred_at,
            CatalogEvent::ItemDeleted(e) => e.occurred_at,
            CatalogEvent::CatalogReplaced(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Catalog {
    type Command = CatalogCommand;
    type Event = CatalogEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            CatalogEvent::ItemAdded(e) => {
                self.items.push(e.item.clone());
            }
            CatalogEvent::ItemUpdated(e) => {
                if let Some(idx) = position_of(&self.items, &e.item.id) {
                    self.items[idx] = e.item.clone();
                }
            }
            CatalogEvent::ItemDeleted(e) => {
                self.items.retain(|item| item.id != e.item_id);
            }
            CatalogEvent::CatalogReplaced(e) => {
                self.items = e.items.clone();
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            CatalogCommand::AddItem(cmd) => self.handle_add(cmd),
            CatalogCommand::UpdateItem(cmd) => self.handle_update(cmd),
            CatalogCommand::DeleteItem(cmd) => self.handle_delete(cmd),
            CatalogCommand::ReplaceCatalog(cmd) => self.handle_replace(cmd),
        }
    }
}

impl Catalog {
    fn handle_add(&self, cmd: &AddItem) -> Result<Vec<CatalogEvent>, DomainError> {
        cmd.item.validate()?;

        if self.contains(&cmd.item.id) {
            return Err(DomainError::conflict(format!(
                "item '{}' already exists",
                cmd.item.id
            )));
        }

        Ok(vec![CatalogEvent::ItemAdded(ItemAdded {
            item: cmd.item.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update(&self, cmd: &UpdateItem) -> Result<Vec<CatalogEvent>, DomainError> {
        cmd.item.validate()?;

        if !self.contains(&cmd.item.id) {
            return Ok(vec![]);
        }

        Ok(vec![CatalogEvent::ItemUpdated(ItemUpdated {
            item: cmd.item.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_delete(&self, cmd: &DeleteItem) -> Result<Vec<CatalogEvent>, DomainError> {
        if !self.contains(&cmd.item_id) {
            return Ok(vec![]);
        }

        Ok(vec![CatalogEvent::ItemDeleted(ItemDeleted {
            item_id: cmd.item_id.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_replace(&self, cmd: &ReplaceCatalog) -> Result<Vec<CatalogEvent>, DomainError> {
        validate_items(&cmd.items)?;

        Ok(vec![CatalogEvent::CatalogReplaced(CatalogReplaced {
            items: cmd.items.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}
