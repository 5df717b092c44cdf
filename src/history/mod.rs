mod queries;
mod types;

pub use queries::{add_entry, get_entries, update_paths};
pub use types::{HistoryEntry, NewEntry, format_timestamp, parse_timestamp};

use std::path::Path;

use anyhow::Context as _;
use rusqlite::Connection;

/// Connection-level tuning applied on every open: WAL journaling, relaxed
/// sync, in-memory temp structures and a ~2 MB page cache (negative
/// `cache_size` is a KiB budget, not a page count).
const CONNECTION_PRAGMAS: &str = "
    PRAGMA journal_mode = WAL;
    PRAGMA synchronous = NORMAL;
    PRAGMA temp_store = MEMORY;
    PRAGMA cache_size = -2000;
";

/// Open or create the history database at `path` and ensure the schema exists.
///
/// # Errors
/// Returns an error if the directory cannot be created, the DB cannot be
/// opened, the pragmas cannot be applied, or the schema cannot be created.
pub fn open_db(path: &Path) -> anyhow::Result<Connection> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create db dir {}", parent.display()))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("open database at {}", path.display()))?;
    conn.execute_batch(CONNECTION_PRAGMAS)
        .context("apply connection pragmas")?;
    init_schema(&conn)?;
    tracing::debug!(path = %path.display(), "history database ready");
    Ok(conn)
}

/// Create the `history` table and its indexes if they do not exist yet.
///
/// Runs in a single transaction: if any statement fails, the guard is dropped
/// uncommitted and nothing is left behind.
///
/// # Errors
/// Returns an error if the transaction cannot be started, any DDL statement
/// fails, or the commit fails.
pub fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    let tx = conn
        .unchecked_transaction()
        .context("begin schema transaction")?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS history (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            command     TEXT    NOT NULL,
            directory   TEXT    NOT NULL,
            timestamp   DATETIME DEFAULT (strftime('%Y-%m-%dT%H:%M:%f000Z','now')),
            exit_code   INTEGER NOT NULL,
            hostname    TEXT    NOT NULL,
            process_id  INTEGER NOT NULL
        );",
    )
    .context("create history table")?;
    tx.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_history_directory
             ON history(directory);
         CREATE INDEX IF NOT EXISTS idx_history_timestamp_directory
             ON history(timestamp, directory);",
    )
    .context("create history indexes")?;
    tx.commit().context("commit schema")?;
    Ok(())
}

#[cfg(test)]
mod tests_paths;
