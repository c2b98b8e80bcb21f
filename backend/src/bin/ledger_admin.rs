#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]
//! Administrative CLI for the Record Store.
//!
//! Operates on whichever backend the `INSPECTION_*` configuration selects:
//! `list` shows row counts, `show` prints an entity's schema and `clear`
//! empties an entity once `--force` confirms the intent.

use std::ffi::OsString;
use std::io::{self, Write};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result, eyre};
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;

use inspection_backend::domain::EntityKind;
use inspection_backend::domain::ports::RecordStore;
use inspection_backend::server::{InspectionSettings, build_record_store};

#[derive(Debug, Parser)]
#[command(name = "ledger-admin", about = "Inspect and reset Record Store entities", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every entity with its row count.
    List,
    /// Print the declared schema of an entity.
    Show {
        /// `user_entry`, `measured_shafts` or `measured_housings`.
        entity: EntityKind,
    },
    /// Delete every row of an entity.
    Clear {
        entity: EntityKind,
        /// Confirm the deletion.
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let mut stdout = io::stdout().lock();

    if let Command::Show { entity } = cli.command {
        return show_schema(entity, &mut stdout);
    }

    // Settings come from the environment and config files only; the
    // command line belongs to clap.
    let settings = InspectionSettings::load_from_iter([OsString::from("ledger-admin")])
        .map_err(|err| eyre!("failed to load configuration: {err}"))?;
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("failed to build admin runtime")?;

    runtime.block_on(async {
        let store = build_record_store(&settings)
            .await
            .wrap_err("failed to open record store")?;
        execute(cli.command, store.as_ref(), &mut stdout).await
    })
}

async fn execute(command: Command, store: &dyn RecordStore, out: &mut impl Write) -> Result<()> {
    match command {
        Command::List => list_entities(store, out).await,
        Command::Show { entity } => show_schema(entity, out),
        Command::Clear { entity, force } => clear_entity(store, entity, force, out).await,
    }
}

async fn list_entities(store: &dyn RecordStore, out: &mut impl Write) -> Result<()> {
    for entity in EntityKind::ALL {
        let rows = store
            .get_all(entity)
            .await
            .with_context(|| format!("failed to read {entity}"))?;
        writeln!(out, "{entity}\t{}", rows.len())?;
    }
    Ok(())
}

fn show_schema(entity: EntityKind, out: &mut impl Write) -> Result<()> {
    let schema = entity.schema();
    writeln!(out, "entity: {entity}")?;
    writeln!(out, "key: {}", schema.key)?;
    for field in schema.fields {
        let required = if field.required { "required" } else { "optional" };
        writeln!(out, "  {}\t{}\t{required}", field.name, field.kind)?;
    }
    Ok(())
}

async fn clear_entity(
    store: &dyn RecordStore,
    entity: EntityKind,
    force: bool,
    out: &mut impl Write,
) -> Result<()> {
    if !force {
        return Err(eyre!(
            "refusing to clear {entity} without --force; this deletes every row"
        ));
    }
    store
        .delete_all(entity)
        .await
        .with_context(|| format!("failed to clear {entity}"))?;
    writeln!(out, "cleared {entity}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use inspection_backend::domain::Record;
    use inspection_backend::test_support::InMemoryRecordStore;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn shaft_row(product_id: &str) -> Record {
        let row = json!({
            "product_id": product_id,
            "roll_number": "R1",
            "shaft_height": 10.0,
            "shaft_radius": 2.5,
            "measurement_timestamp": "2024-05-01T10:00:00Z",
        });
        Record::from(row.as_object().cloned().expect("object literal"))
    }

    fn render(out: Vec<u8>) -> String {
        String::from_utf8(out).expect("utf-8 output")
    }

    #[rstest]
    #[case(&["ledger-admin", "list"])]
    #[case(&["ledger-admin", "show", "measured_shafts"])]
    #[case(&["ledger-admin", "clear", "user_entry", "--force"])]
    fn parses_subcommands(#[case] args: &[&str]) {
        Cli::try_parse_from(args).expect("arguments should parse");
    }

    #[rstest]
    fn rejects_unknown_entities() {
        assert!(Cli::try_parse_from(["ledger-admin", "show", "widgets"]).is_err());
    }

    #[tokio::test]
    async fn list_reports_row_counts() {
        let store = InMemoryRecordStore::new();
        store
            .append(EntityKind::MeasuredShafts, shaft_row("P1"))
            .await
            .expect("append");
        store
            .append(EntityKind::MeasuredShafts, shaft_row("P2"))
            .await
            .expect("append");

        let mut out = Vec::new();
        execute(Command::List, &store, &mut out).await.expect("list");

        assert_eq!(
            render(out),
            "user_entry\t0\nmeasured_shafts\t2\nmeasured_housings\t0\n"
        );
    }

    #[rstest]
    fn show_prints_key_and_fields() {
        let mut out = Vec::new();
        show_schema(EntityKind::MeasuredShafts, &mut out).expect("show");
        let text = render(out);

        assert!(text.starts_with("entity: measured_shafts\nkey: product_id\n"));
        assert!(text.contains("  shaft_height\tnumber\trequired\n"));
    }

    #[tokio::test]
    async fn clear_requires_force() {
        let store = InMemoryRecordStore::new();
        store
            .append(EntityKind::MeasuredShafts, shaft_row("P1"))
            .await
            .expect("append");

        let mut out = Vec::new();
        let refused = clear_entity(&store, EntityKind::MeasuredShafts, false, &mut out).await;
        assert!(refused.is_err());
        assert_eq!(store.count(EntityKind::MeasuredShafts), 1);

        clear_entity(&store, EntityKind::MeasuredShafts, true, &mut out)
            .await
            .expect("forced clear");
        assert_eq!(store.count(EntityKind::MeasuredShafts), 0);
        assert_eq!(render(out), "cleared measured_shafts\n");
    }
}
