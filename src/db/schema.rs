//! Schema versioning. Each migration runs once and is recorded in
//! `schema_migrations`; everything pending is applied in a single transaction.

use std::collections::HashSet;

use anyhow::{Context, Result};
use rusqlite::{Connection, Transaction};

/// `(version, name, sql)`, in application order.
const MIGRATIONS: &[(&str, &str, &str)] = &[
    ("001", "initial", include_str!("migrations/001_initial.sql")),
    (
        "002",
        "notes_updated_index",
        include_str!("migrations/002_notes_updated_index.sql"),
    ),
];

/// Bring the schema up to date. Safe to call on every start.
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let tx = conn
        .transaction()
        .context("Failed to start migration transaction")?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )
    .context("Failed to create schema_migrations table")?;

    let applied = applied_versions(&tx)?;
    let pending: Vec<_> = MIGRATIONS
        .iter()
        .filter(|(version, _, _)| !applied.contains(*version))
        .collect();
    if pending.is_empty() {
        return Ok(());
    }

    let applied_at = chrono::Utc::now().to_rfc3339();
    for (version, name, sql) in pending {
        tracing::info!("Applying migration {}: {}", version, name);
        tx.execute_batch(sql)
            .with_context(|| format!("Failed to apply migration {}: {}", version, name))?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            (version, name, &applied_at),
        )?;
    }

    tx.commit().context("Failed to commit migrations")
}

fn applied_versions(tx: &Transaction<'_>) -> Result<HashSet<String>> {
    let mut stmt = tx.prepare("SELECT version FROM schema_migrations")?;
    let versions = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<HashSet<String>>>()?;
    Ok(versions)
}
