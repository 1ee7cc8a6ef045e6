//! Command execution session.
//!
//! ```text
//! AppCommand
//!   ↓
//! 1. Resolve input (parse quantity, build item from draft, look up item)
//!   ↓
//! 2. Reducer step: handle + apply (pure; nothing changes on error)
//!   ↓
//! 3. Persist the changed collection (failures are logged, not returned)
//!   ↓
//! 4. Publish one `Change` per applied event
//! ```

use std::path::Path;
use std::sync::Arc;

use boqkit_boq::{LineListCommand, LineListEvent, parse_quantity};
use boqkit_catalog::{CatalogCommand, CatalogEvent, Item};
use boqkit_core::{AggregateRoot, CollectionId, DomainError, ItemId, execute};
use boqkit_document::{BoqTable, NumberFormat, render_table_pdf};
use boqkit_events::{Event, EventBus, EventEnvelope, InMemoryEventBus, Subscription};
use boqkit_infra::{KeyValueStore, Persistence};
use boqkit_interchange::{ExportFormat, ImportFormat, InterchangeError};

use crate::command::{AppCommand, Applied};
use crate::error::AppError;
use crate::state::AppState;

/// Change notification published after every applied event.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Catalog(EventEnvelope<CatalogEvent>),
    Lines(EventEnvelope<LineListEvent>),
}

impl Change {
    pub fn collection(&self) -> CollectionId {
        match self {
            Change::Catalog(env) => env.collection(),
            Change::Lines(env) => env.collection(),
        }
    }

    pub fn event_type(&self) -> &str {
        match self {
            Change::Catalog(env) => env.event_type(),
            Change::Lines(env) => env.event_type(),
        }
    }

    /// Collection version after this change.
    pub fn sequence_number(&self) -> u64 {
        match self {
            Change::Catalog(env) => env.sequence_number(),
            Change::Lines(env) => env.sequence_number(),
        }
    }
}

impl std::fmt::Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} #{}: {}",
            self.collection(),
            self.sequence_number(),
            self.event_type()
        )
    }
}

/// Summary of a completed import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub format: ImportFormat,
    pub imported: usize,
    pub dropped_rows: usize,
}

/// Owns the application state, its persistence, and the change bus.
///
/// Every mutation goes through [`Session::execute`]; `&mut self` keeps
/// commands strictly sequential.
pub struct Session<S> {
    state: AppState,
    persistence: Persistence<S>,
    bus: Arc<InMemoryEventBus<Change>>,
    number_format: NumberFormat,
}

impl<S: KeyValueStore> Session<S> {
    /// Load persisted state (or defaults) from `store`.
    pub async fn open(store: S) -> Self {
        let persistence = Persistence::new(store);
        let state: AppState = persistence.load().await.into();
        Self::with_state(state, persistence)
    }

    pub fn with_state(state: AppState, persistence: Persistence<S>) -> Self {
        Self {
            state,
            persistence,
            bus: Arc::new(InMemoryEventBus::new()),
            number_format: NumberFormat::default(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn store(&self) -> &S {
        self.persistence.store()
    }

    /// Receive a [`Change`] for every event applied from now on.
    pub fn subscribe(&self) -> Subscription<Change> {
        self.bus.subscribe()
    }

    pub async fn execute(&mut self, command: AppCommand) -> Result<Applied, AppError> {
        tracing::debug!(?command, "executing command");
        match command.collection() {
            CollectionId::Catalog => {
                let cmd = self.catalog_command(command)?;
                self.run_catalog(&cmd).await
            }
            CollectionId::Boq => {
                let cmd = self.line_command(command)?;
                self.run_lines(&cmd).await
            }
        }
    }

    fn catalog_command(&self, command: AppCommand) -> Result<CatalogCommand, AppError> {
        let cmd = match command {
            AppCommand::AddItem(draft) => CatalogCommand::add(draft.into_item(ItemId::generate())?),
            AppCommand::UpdateItem { id, draft } => CatalogCommand::update(draft.into_item(id)?),
            AppCommand::DeleteItem(id) => CatalogCommand::delete(id),
            AppCommand::ReplaceCatalog(items) => CatalogCommand::replace(items),
            other => {
                return Err(DomainError::invariant(format!(
                    "{other:?} is not a catalog command"
                ))
                .into());
            }
        };
        Ok(cmd)
    }

    fn line_command(&self, command: AppCommand) -> Result<LineListCommand, AppError> {
        let cmd = match command {
            AppCommand::AddLine(item_id) => {
                let item = self
                    .state
                    .catalog
                    .get(&item_id)
                    .ok_or_else(|| DomainError::not_found(format!("item '{item_id}'")))?;
                LineListCommand::add(item)
            }
            AppCommand::SetQuantity { item_id, quantity } => {
                LineListCommand::set_quantity(item_id, parse_quantity(&quantity)?)
            }
            AppCommand::RemoveLine(item_id) => LineListCommand::remove(item_id),
            AppCommand::ClearLines => LineListCommand::clear(),
            other => {
                return Err(DomainError::invariant(format!(
                    "{other:?} is not a BOQ command"
                ))
                .into());
            }
        };
        Ok(cmd)
    }

    async fn run_catalog(&mut self, cmd: &CatalogCommand) -> Result<Applied, AppError> {
        let before = self.state.catalog.version();
        let events = execute(&mut self.state.catalog, cmd)?;

        if !events.is_empty() {
            if let Err(err) = self.persistence.save_catalog(&self.state.catalog).await {
                tracing::error!(%err, "failed to persist catalog");
            }
            self.publish(CollectionId::Catalog, before, events.iter().cloned(), Change::Catalog);
        }

        Ok(Applied {
            collection: CollectionId::Catalog,
            events: events.len(),
            version: self.state.catalog.version(),
        })
    }

    async fn run_lines(&mut self, cmd: &LineListCommand) -> Result<Applied, AppError> {
        let before = self.state.lines.version();
        let events = execute(&mut self.state.lines, cmd)?;

        if !events.is_empty() {
            if let Err(err) = self.persistence.save_lines(&self.state.lines).await {
                tracing::error!(%err, "failed to persist BOQ");
            }
            self.publish(CollectionId::Boq, before, events.iter().cloned(), Change::Lines);
        }

        Ok(Applied {
            collection: CollectionId::Boq,
            events: events.len(),
            version: self.state.lines.version(),
        })
    }

    fn publish<E: Event>(
        &self,
        collection: CollectionId,
        version_before: u64,
        events: impl Iterator<Item = E>,
        wrap: fn(EventEnvelope<E>) -> Change,
    ) {
        for (seq, event) in (version_before + 1..).zip(events) {
            tracing::debug!(%collection, event_type = event.event_type(), seq, "change applied");
            if let Err(err) = self.bus.publish(wrap(EventEnvelope::wrap(collection, seq, event))) {
                tracing::warn!(?err, "failed to publish change");
            }
        }
    }

    /// Replace the catalog from a `.json` or `.csv` file.
    ///
    /// The extension is checked before the file is read; nothing changes on
    /// any error.
    pub async fn import_file(&mut self, path: &Path) -> Result<ImportReport, AppError> {
        let format = ImportFormat::from_path(path)?;
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AppError::io(path, e))?;
        self.import_text(format, &text).await
    }

    pub async fn import_text(
        &mut self,
        format: ImportFormat,
        text: &str,
    ) -> Result<ImportReport, AppError> {
        let imported = format.parse(text)?;
        let count = imported.items.len();
        // A rejected replacement is reported as a bad import file.
        self.execute(AppCommand::ReplaceCatalog(imported.items))
            .await
            .map_err(|err| match err {
                AppError::Domain(domain) => AppError::Interchange(InterchangeError::Domain(domain)),
                other => other,
            })?;

        if imported.dropped_rows > 0 {
            tracing::info!(dropped = imported.dropped_rows, "skipped invalid CSV rows");
        }
        tracing::info!(?format, items = count, "catalog imported");

        Ok(ImportReport {
            format,
            imported: count,
            dropped_rows: imported.dropped_rows,
        })
    }

    /// Catalog as JSON or CSV text.
    pub fn export_catalog(&self, format: ExportFormat) -> Result<String, AppError> {
        Ok(format.render(&self.state.catalog)?)
    }

    pub fn boq_table(&self) -> BoqTable {
        BoqTable::build(self.state.lines.lines(), self.state.total(), &self.number_format)
    }

    pub fn export_pdf(&self) -> Result<Vec<u8>, AppError> {
        Ok(render_table_pdf(&self.boq_table())?)
    }

    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        self.state.catalog.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boqkit_catalog::{Catalog, ItemDraft};
    use boqkit_boq::LineList;
    use boqkit_infra::InMemoryStore;

    fn cement_state() -> AppState {
        AppState::new(
            Catalog::new(vec![Item::new("1", "Cement", 500.0).with_tags(["material"])]).unwrap(),
            LineList::empty(),
        )
    }

    fn session() -> Session<InMemoryStore> {
        Session::with_state(cement_state(), Persistence::new(InMemoryStore::new()))
    }

    fn draft(name: &str, price: &str) -> ItemDraft {
        ItemDraft {
            name: name.to_string(),
            price: price.to_string(),
            ..ItemDraft::default()
        }
    }

    #[tokio::test]
    async fn adding_the_same_item_twice_bumps_quantity() {
        let mut session = session();
        session.execute(AppCommand::AddLine("1".into())).await.unwrap();
        session.execute(AppCommand::AddLine("1".into())).await.unwrap();

        let lines = session.state().lines.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[0].unit_price, 500.0);
        assert_eq!(session.state().total(), 1000.0);
    }

    #[tokio::test]
    async fn adding_an_unknown_item_is_not_found() {
        let mut session = session();
        let err = session.execute(AppCommand::AddLine("9".into())).await.unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::NotFound(_))));
        assert!(session.state().lines.is_empty());
    }

    #[tokio::test]
    async fn invalid_draft_leaves_state_untouched() {
        let mut session = session();
        let err = session.execute(AppCommand::AddItem(draft("  ", "10"))).await.unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::Validation(_))));

        let err = session.execute(AppCommand::AddItem(draft("Nail", "ten"))).await.unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::Validation(_))));

        assert_eq!(session.state().catalog.len(), 1);
        assert!(session.store().is_empty().await);
    }

    #[tokio::test]
    async fn only_the_changed_collection_is_persisted() {
        let mut session = session();
        session.execute(AppCommand::AddItem(draft("Nail", "0.5"))).await.unwrap();

        assert!(session.store().get("catalog").await.unwrap().is_some());
        assert!(session.store().get("boq").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn non_numeric_quantity_is_rejected() {
        let mut session = session();
        session.execute(AppCommand::AddLine("1".into())).await.unwrap();

        let err = session
            .execute(AppCommand::SetQuantity {
                item_id: "1".into(),
                quantity: "lots".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::Validation(_))));

        session
            .execute(AppCommand::SetQuantity {
                item_id: "1".into(),
                quantity: "-4".into(),
            })
            .await
            .unwrap();
        assert_eq!(session.state().lines.lines()[0].quantity, 0);
    }

    #[tokio::test]
    async fn noop_commands_publish_nothing() {
        let mut session = session();
        let changes = session.subscribe();

        let applied = session.execute(AppCommand::RemoveLine("1".into())).await.unwrap();
        assert!(applied.is_noop());
        let applied = session.execute(AppCommand::DeleteItem("9".into())).await.unwrap();
        assert!(applied.is_noop());

        assert!(changes.drain().is_empty());
    }

    #[tokio::test]
    async fn changes_carry_collection_and_sequence() {
        let mut session = session();
        let changes = session.subscribe();

        session.execute(AppCommand::AddLine("1".into())).await.unwrap();
        session.execute(AppCommand::AddLine("1".into())).await.unwrap();
        session.execute(AppCommand::DeleteItem("1".into())).await.unwrap();

        let received = changes.drain();
        assert_eq!(received.len(), 3);
        assert_eq!(received[0].collection(), CollectionId::Boq);
        assert_eq!(received[1].event_type(), "boq.line.incremented");
        assert_eq!(received[1].sequence_number(), 2);
        assert_eq!(received[2].collection(), CollectionId::Catalog);
        assert_eq!(received[1].to_string(), "boq #2: boq.line.incremented");
    }

    #[tokio::test]
    async fn unsupported_import_fails_before_reading() {
        let mut session = session();
        let err = session
            .import_file(Path::new("/does/not/exist/items.xlsx"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Interchange(boqkit_interchange::InterchangeError::UnsupportedFormat(_))
        ));
        assert_eq!(session.state().catalog.len(), 1);
    }

    #[tokio::test]
    async fn boq_table_and_pdf_reflect_lines() {
        let mut session = session();
        session.execute(AppCommand::AddLine("1".into())).await.unwrap();
        session.execute(AppCommand::AddLine("1".into())).await.unwrap();

        let table = session.boq_table();
        assert_eq!(table.rows[0], ["Cement", "2", "500", "1,000"].map(String::from));
        assert_eq!(table.total, "1,000");

        let pdf = session.export_pdf().unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }
}
