use boqkit_catalog::{Item, ItemDraft};
use boqkit_core::{CollectionId, ItemId};

/// A user action, as the front end submits it.
///
/// Raw user input (price and quantity text) is carried as entered and
/// validated when the command runs.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Create an item with a freshly generated id.
    AddItem(ItemDraft),
    /// Replace the item with `id`; no-op if it does not exist.
    UpdateItem { id: ItemId, draft: ItemDraft },
    DeleteItem(ItemId),
    ReplaceCatalog(Vec<Item>),
    /// Add the catalog item to the BOQ, or bump its quantity.
    AddLine(ItemId),
    SetQuantity { item_id: ItemId, quantity: String },
    RemoveLine(ItemId),
    ClearLines,
}

impl AppCommand {
    /// The collection this command may change.
    pub fn collection(&self) -> CollectionId {
        match self {
            AppCommand::AddItem(_)
            | AppCommand::UpdateItem { .. }
            | AppCommand::DeleteItem(_)
            | AppCommand::ReplaceCatalog(_) => CollectionId::Catalog,
            AppCommand::AddLine(_)
            | AppCommand::SetQuantity { .. }
            | AppCommand::RemoveLine(_)
            | AppCommand::ClearLines => CollectionId::Boq,
        }
    }
}

/// Result of a successful command.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Applied {
    pub collection: CollectionId,
    /// Number of events applied; zero means the command was a no-op.
    pub events: usize,
    /// Collection version after the command.
    pub version: u64,
}

impl Applied {
    pub fn is_noop(&self) -> bool {
        self.events == 0
    }
}
