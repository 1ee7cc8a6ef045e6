use std::path::PathBuf;
use std::sync::Arc;

use boqkit_app::{AppCommand, AppError, Session};
use boqkit_catalog::{Item, ItemDraft, sample_catalog};
use boqkit_core::{DomainError, ItemId};
use boqkit_infra::{InMemoryStore, KeyValueStore, SqliteStore};
use boqkit_interchange::{ExportFormat, ImportFormat, InterchangeError};

struct TempDir(PathBuf);

impl TempDir {
    fn new() -> Self {
        let path = std::env::temp_dir().join(format!("boqkit-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&path).unwrap();
        Self(path)
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.0.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

fn nail() -> ItemDraft {
    ItemDraft {
        name: "Nail".to_string(),
        price: "0.5".to_string(),
        brand: " ".to_string(),
        tags: "hardware, fixings,".to_string(),
        props: vec![("size".to_string(), "2in".to_string())],
    }
}

#[tokio::test]
async fn fresh_store_starts_from_sample_catalog() {
    let session = Session::open(InMemoryStore::new()).await;
    assert_eq!(session.state().catalog.items(), sample_catalog().items());
    assert!(session.state().lines.is_empty());
}

#[tokio::test]
async fn state_survives_a_restart() {
    let dir = TempDir::new();
    let db = dir.0.join("boqkit.db");

    let added_id = {
        let store = SqliteStore::open(&db).await.unwrap();
        let mut session = Session::open(store.clone()).await;
        session.execute(AppCommand::AddItem(nail())).await.unwrap();
        let id = session.state().catalog.items().last().unwrap().id.clone();
        session.execute(AppCommand::AddLine(id.clone())).await.unwrap();
        session.execute(AppCommand::AddLine("1".into())).await.unwrap();
        session
            .execute(AppCommand::SetQuantity {
                item_id: id.clone(),
                quantity: "12.9".into(),
            })
            .await
            .unwrap();
        store.close().await;
        id
    };

    let store = SqliteStore::open(&db).await.unwrap();
    let session = Session::open(store.clone()).await;

    let item = session.item(&added_id).unwrap();
    assert_eq!(item.name, "Nail");
    assert_eq!(item.brand, None);
    assert_eq!(item.tags, vec!["hardware", "fixings"]);
    assert_eq!(item.props.get("size"), Some("2in"));

    let lines = session.state().lines.lines();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].item_id, added_id);
    assert_eq!(lines[0].quantity, 12);
    assert_eq!(session.state().total(), 12.0 * 0.5 + 500.0);
    store.close().await;
}

#[tokio::test]
async fn deleting_an_item_keeps_its_line() {
    let mut session = Session::open(InMemoryStore::new()).await;
    session.execute(AppCommand::AddLine("1".into())).await.unwrap();
    session.execute(AppCommand::DeleteItem("1".into())).await.unwrap();

    assert!(session.item(&ItemId::new("1")).is_none());
    let line = &session.state().lines.lines()[0];
    assert_eq!(line.item_id, ItemId::new("1"));
    assert_eq!(line.name, "Cement");
    assert_eq!(line.unit_price, 500.0);
}

#[tokio::test]
async fn editing_an_item_does_not_touch_line_snapshots() {
    let mut session = Session::open(InMemoryStore::new()).await;
    session.execute(AppCommand::AddLine("1".into())).await.unwrap();

    let mut draft = ItemDraft::from_item(session.item(&ItemId::new("1")).unwrap());
    draft.price = "650".to_string();
    session
        .execute(AppCommand::UpdateItem {
            id: "1".into(),
            draft,
        })
        .await
        .unwrap();

    assert_eq!(session.item(&ItemId::new("1")).unwrap().price, 650.0);
    assert_eq!(session.state().lines.lines()[0].unit_price, 500.0);
}

#[tokio::test]
async fn csv_import_replaces_catalog() {
    let dir = TempDir::new();
    let path = dir.write(
        "items.CSV",
        "id,name,price,brand,tags,props\n,Bolt,2.5,ACME,hardware|steel,{}\n,,3,,,\n",
    );

    let mut session = Session::open(InMemoryStore::new()).await;
    let changes = session.subscribe();
    let report = session.import_file(&path).await.unwrap();

    assert_eq!(report.format, ImportFormat::Csv);
    assert_eq!(report.imported, 1);
    assert_eq!(report.dropped_rows, 1);

    let items = session.state().catalog.items();
    assert_eq!(items.len(), 1);
    assert!(!items[0].id.is_blank());
    assert_eq!(items[0].name, "Bolt");
    assert_eq!(items[0].price, 2.5);
    assert_eq!(items[0].tags, vec!["hardware", "steel"]);

    let received = changes.drain();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].event_type(), "catalog.replaced");
}

#[tokio::test]
async fn failed_imports_change_nothing() {
    let dir = TempDir::new();
    let mut session = Session::open(InMemoryStore::new()).await;
    let before = session.state().catalog.clone();

    let xlsx = dir.write("items.xlsx", "whatever");
    let err = session.import_file(&xlsx).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Interchange(InterchangeError::UnsupportedFormat(_))
    ));

    let bad_json = dir.write("items.json", r#"{"id":"1"}"#);
    let err = session.import_file(&bad_json).await.unwrap_err();
    assert!(matches!(err, AppError::Interchange(InterchangeError::Format { .. })));

    let invalid = dir.write("dupes.json", r#"[{"id":"1","name":"A","price":1},{"id":"1","name":"B","price":2}]"#);
    let err = session.import_file(&invalid).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Interchange(InterchangeError::Domain(DomainError::Conflict(_)))
    ));
    assert_eq!(err.notice(), "Conflict: duplicate item id '1'");

    let missing = dir.0.join("missing.csv");
    let err = session.import_file(&missing).await.unwrap_err();
    assert!(matches!(err, AppError::Io { .. }));

    assert_eq!(session.state().catalog, before);
    assert!(session.store().get("catalog").await.unwrap().is_none());
}

#[tokio::test]
async fn json_export_round_trips_byte_for_byte() {
    let mut session = Session::open(InMemoryStore::new()).await;
    session.execute(AppCommand::AddItem(nail())).await.unwrap();
    let exported = session.export_catalog(ExportFormat::Json).unwrap();

    let mut other = Session::open(InMemoryStore::new()).await;
    other
        .execute(AppCommand::ReplaceCatalog(Vec::<Item>::new()))
        .await
        .unwrap();
    other.import_text(ImportFormat::Json, &exported).await.unwrap();

    assert_eq!(other.state().catalog.items(), session.state().catalog.items());
    assert_eq!(other.export_catalog(ExportFormat::Json).unwrap(), exported);
}

#[tokio::test]
async fn sessions_can_share_a_store() {
    let store = Arc::new(InMemoryStore::new());

    let mut first = Session::open(Arc::clone(&store)).await;
    first.execute(AppCommand::ClearLines).await.unwrap();
    first.execute(AppCommand::AddLine("1".into())).await.unwrap();

    let second = Session::open(store).await;
    assert_eq!(second.state().lines.len(), 1);
}
