use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use boqkit_app::{AppCommand, AppError, Change, Session};
use boqkit_catalog::{CatalogFilter, Item, ItemDraft};
use boqkit_core::{DomainError, ItemId};
use boqkit_document::{BOQ_PDF_FILE_NAME, NumberFormat};
use boqkit_events::Subscription;
use boqkit_infra::{AppConfig, KeyValueStore, SqliteStore};
use boqkit_interchange::ExportFormat;

/// Catalog and Bill-of-Quantities editor.
#[derive(Parser, Debug)]
#[command(name = "boqkit", version)]
struct Cli {
    /// Directory holding the database (default: OS data dir + boqkit/).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Browse and edit the catalog.
    #[command(subcommand)]
    Items(ItemsCommand),
    /// Edit the bill of quantities.
    #[command(subcommand)]
    Boq(BoqCommand),
    /// Replace the catalog from a .json or .csv file.
    Import { file: PathBuf },
    /// Write items.json, items.csv or boq.pdf.
    Export {
        format: ExportKind,
        /// Output file or directory (default: current directory).
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum ItemsCommand {
    List {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value = "")]
        tag: String,
    },
    /// Print one item with its brand, tags and properties.
    Show {
        id: String,
    },
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: String,
        #[arg(long)]
        brand: Option<String>,
        /// Comma-separated.
        #[arg(long)]
        tags: Option<String>,
        #[arg(long = "prop", value_parser = parse_prop)]
        props: Vec<(String, String)>,
    },
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        price: Option<String>,
        #[arg(long)]
        brand: Option<String>,
        #[arg(long)]
        tags: Option<String>,
        /// Set or overwrite a property.
        #[arg(long = "prop", value_parser = parse_prop)]
        props: Vec<(String, String)>,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum BoqCommand {
    Add { item_id: String },
    Qty { item_id: String, quantity: String },
    Remove { item_id: String },
    Clear,
    Show,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ExportKind {
    Json,
    Csv,
    Pdf,
}

fn parse_prop(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err("property key cannot be empty".to_string());
    }
    Ok((key.to_string(), value.trim().to_string()))
}

#[tokio::main]
async fn main() -> ExitCode {
    boqkit_observability::init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let notice = match err.downcast_ref::<AppError>() {
                Some(app) => app.notice(),
                None => format!("{err:#}"),
            };
            tracing::debug!(error = ?err, "command failed");
            eprintln!("{notice}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::resolve(cli.data_dir).context("failed to resolve configuration")?;
    let store = SqliteStore::open(&config.db_path)
        .await
        .with_context(|| format!("failed to open database at {}", config.db_path.display()))?;
    let mut session = Session::open(store.clone()).await;
    let changes = session.subscribe();

    let result = dispatch(&mut session, cli.command).await;
    log_changes(&changes);
    store.close().await;
    result
}

/// Log every change the command applied; returns how many there were.
fn log_changes(changes: &Subscription<Change>) -> usize {
    let applied = changes.drain();
    for change in &applied {
        tracing::info!(
            collection = %change.collection(),
            seq = change.sequence_number(),
            event_type = change.event_type(),
            "state changed"
        );
    }
    applied.len()
}

fn describe_item(item: &Item, format: &NumberFormat) -> String {
    let mut out = format!(
        "id:     {}\nname:   {}\nprice:  {}\nbrand:  {}\ntags:   {}\n",
        item.id,
        item.name,
        format.format(item.price),
        item.brand.as_deref().unwrap_or("-"),
        if item.tags.is_empty() {
            "-".to_string()
        } else {
            item.tags.join(", ")
        },
    );
    if item.props.is_empty() {
        out.push_str("props:  -");
    } else {
        out.push_str("props:");
        for (key, value) in item.props.iter() {
            out.push_str(&format!("\n  {key}: {value}"));
        }
    }
    out
}

async fn dispatch<S: KeyValueStore>(session: &mut Session<S>, command: Command) -> Result<()> {
    match command {
        Command::Items(cmd) => items(session, cmd).await,
        Command::Boq(cmd) => boq(session, cmd).await,
        Command::Import { file } => {
            let report = session.import_file(&file).await?;
            println!("imported {} items from {}", report.imported, file.display());
            if report.dropped_rows > 0 {
                println!("skipped {} invalid rows", report.dropped_rows);
            }
            Ok(())
        }
        Command::Export { format, out } => export(session, format, out.as_deref()).await,
    }
}

async fn items<S: KeyValueStore>(session: &mut Session<S>, command: ItemsCommand) -> Result<()> {
    match command {
        ItemsCommand::List { search, tag } => {
            let filter = CatalogFilter::new(&search, &tag);
            let format = NumberFormat::default();
            let visible = session.state().visible_items(&filter);
            if visible.is_empty() {
                println!("No items match.");
            }
            for item in visible {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    item.id,
                    item.name,
                    format.format(item.price),
                    item.brand.as_deref().unwrap_or("-"),
                    item.tags.join(", "),
                );
            }
        }
        ItemsCommand::Show { id } => {
            let id = ItemId::new(id);
            let item = session
                .item(&id)
                .ok_or_else(|| AppError::from(DomainError::not_found(format!("item '{id}'"))))?;
            println!("{}", describe_item(item, &NumberFormat::default()));
        }
        ItemsCommand::Add {
            name,
            price,
            brand,
            tags,
            props,
        } => {
            let draft = ItemDraft {
                name,
                price,
                brand: brand.unwrap_or_default(),
                tags: tags.unwrap_or_default(),
                props,
            };
            session.execute(AppCommand::AddItem(draft)).await?;
            if let Some(item) = session.state().catalog.items().last() {
                println!("added item {}", item.id);
            }
        }
        ItemsCommand::Edit {
            id,
            name,
            price,
            brand,
            tags,
            props,
        } => {
            let id = ItemId::new(id);
            let existing = session
                .item(&id)
                .ok_or_else(|| AppError::from(DomainError::not_found(format!("item '{id}'"))))?;

            let mut draft = ItemDraft::from_item(existing);
            if let Some(name) = name {
                draft.name = name;
            }
            if let Some(price) = price {
                draft.price = price;
            }
            if let Some(brand) = brand {
                draft.brand = brand;
            }
            if let Some(tags) = tags {
                draft.tags = tags;
            }
            for (key, value) in props {
                match draft.props.iter_mut().find(|(k, _)| *k == key) {
                    Some(slot) => slot.1 = value,
                    None => draft.props.push((key, value)),
                }
            }

            session
                .execute(AppCommand::UpdateItem {
                    id: id.clone(),
                    draft,
                })
                .await?;
            println!("updated item {id}");
        }
        ItemsCommand::Delete { id } => {
            let applied = session.execute(AppCommand::DeleteItem(ItemId::new(&id))).await?;
            if applied.is_noop() {
                println!("no item {id}");
            } else {
                println!("deleted item {id}");
            }
        }
    }
    Ok(())
}

async fn boq<S: KeyValueStore>(session: &mut Session<S>, command: BoqCommand) -> Result<()> {
    match command {
        BoqCommand::Add { item_id } => {
            session.execute(AppCommand::AddLine(ItemId::new(item_id))).await?;
        }
        BoqCommand::Qty { item_id, quantity } => {
            session
                .execute(AppCommand::SetQuantity {
                    item_id: ItemId::new(item_id),
                    quantity,
                })
                .await?;
        }
        BoqCommand::Remove { item_id } => {
            session.execute(AppCommand::RemoveLine(ItemId::new(item_id))).await?;
        }
        BoqCommand::Clear => {
            session.execute(AppCommand::ClearLines).await?;
        }
        BoqCommand::Show => {}
    }

    println!("{}", session.boq_table().to_text());
    Ok(())
}

async fn export<S: KeyValueStore>(
    session: &Session<S>,
    kind: ExportKind,
    out: Option<&Path>,
) -> Result<()> {
    let (file_name, bytes) = match kind {
        ExportKind::Json => (
            ExportFormat::Json.file_name(),
            session.export_catalog(ExportFormat::Json)?.into_bytes(),
        ),
        ExportKind::Csv => (
            ExportFormat::Csv.file_name(),
            session.export_catalog(ExportFormat::Csv)?.into_bytes(),
        ),
        ExportKind::Pdf => (BOQ_PDF_FILE_NAME, session.export_pdf()?),
    };

    let path = match out {
        Some(path) if path.is_dir() => path.join(file_name),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(file_name),
    };

    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| AppError::io(&path, e))?;
    println!("wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prop_arguments() {
        assert_eq!(
            parse_prop("unit = 50kg bag").unwrap(),
            ("unit".to_string(), "50kg bag".to_string())
        );
        assert_eq!(parse_prop("k=a=b").unwrap().1, "a=b");
        assert!(parse_prop("novalue").is_err());
        assert!(parse_prop("=x").is_err());
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "boqkit", "--data-dir", "/tmp/b", "items", "add", "--name", "Nail", "--price", "0.5",
            "--prop", "size=2in", "--prop", "head=flat",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/b")));
        match cli.command {
            Command::Items(ItemsCommand::Add { name, props, .. }) => {
                assert_eq!(name, "Nail");
                assert_eq!(props.len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }

        let cli = Cli::try_parse_from(["boqkit", "export", "pdf", "--out", "out"]).unwrap();
        assert!(matches!(cli.command, Command::Export { format: ExportKind::Pdf, .. }));

        assert!(Cli::try_parse_from(["boqkit", "export", "xlsx"]).is_err());

        let cli = Cli::try_parse_from(["boqkit", "items", "show", "1"]).unwrap();
        assert!(matches!(cli.command, Command::Items(ItemsCommand::Show { ref id }) if id == "1"));
        assert!(Cli::try_parse_from(["boqkit", "items", "show"]).is_err());
    }

    #[test]
    fn item_description_lists_props_in_order() {
        let item = Item::new("1", "Cement", 4500.0)
            .with_brand("Dangote")
            .with_tags(["material", "binder"])
            .with_prop("unit", "50kg bag")
            .with_prop("grade", "42.5R");

        let text = describe_item(&item, &NumberFormat::en_us());
        assert_eq!(
            text,
            "id:     1\nname:   Cement\nprice:  4,500\nbrand:  Dangote\n\
             tags:   material, binder\nprops:\n  unit: 50kg bag\n  grade: 42.5R"
        );

        let bare = describe_item(&Item::new("2", "Nail", 0.5), &NumberFormat::en_us());
        assert!(bare.contains("brand:  -\ntags:   -\nprops:  -"));
    }

    #[tokio::test]
    async fn applied_changes_are_drained_after_dispatch() {
        let mut session = Session::open(boqkit_infra::InMemoryStore::new()).await;
        let changes = session.subscribe();

        dispatch(&mut session, Command::Boq(BoqCommand::Add { item_id: "1".into() }))
            .await
            .unwrap();
        dispatch(&mut session, Command::Boq(BoqCommand::Add { item_id: "1".into() }))
            .await
            .unwrap();
        assert_eq!(log_changes(&changes), 2);

        dispatch(
            &mut session,
            Command::Items(ItemsCommand::Delete { id: "missing".into() }),
        )
        .await
        .unwrap();
        assert_eq!(log_changes(&changes), 0);
    }

    #[tokio::test]
    async fn showing_an_unknown_item_is_not_found() {
        let mut session = Session::open(boqkit_infra::InMemoryStore::new()).await;
        let err = dispatch(
            &mut session,
            Command::Items(ItemsCommand::Show { id: "missing".into() }),
        )
        .await
        .unwrap_err();
        let app = err.downcast_ref::<AppError>().unwrap();
        assert_eq!(app.notice(), "Not found: item 'missing'");
    }
}
