use anyhow::Context as _;
use rusqlite::Connection;
use rusqlite::types::Type;

use super::types::{HistoryEntry, NewEntry, format_timestamp, parse_timestamp};

// Subtree match on `directory` for the bound parameter ?1: the directory
// itself, or anything below it. `'0'` is the byte right after `'/'`, so the
// half-open range [dir || '/', dir || '0') is exactly the set of strings that
// start with `dir/`, matched byte-for-byte and able to use the directory index.
const SUBTREE_MATCH: &str = "(directory = ?1
         OR (directory >= ?1 || '/' AND directory < ?1 || '0'))";

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<HistoryEntry> {
    let raw_ts: String = row.get(3)?;
    let timestamp = parse_timestamp(&raw_ts).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            Type::Text,
            format!("unrecognised timestamp {raw_ts:?}").into(),
        )
    })?;
    Ok(HistoryEntry {
        id: row.get(0)?,
        command: row.get(1)?,
        directory: row.get(2)?,
        timestamp,
        exit_code: row.get(4)?,
        hostname: row.get(5)?,
        process_id: row.get(6)?,
    })
}

/// Append one entry and return its row id.
///
/// Field contents are stored as given. A missing timestamp is filled with the
/// current UTC time by `SQLite`, in the same fixed-width format.
///
/// # Errors
/// Returns an error if the INSERT fails.
pub fn add_entry(conn: &Connection, entry: &NewEntry) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO history
            (command, directory, timestamp, exit_code, hostname, process_id)
         VALUES
            (?1, ?2, COALESCE(?3, strftime('%Y-%m-%dT%H:%M:%f000Z','now')), ?4, ?5, ?6)",
        rusqlite::params![
            entry.command,
            entry.directory,
            entry.timestamp.as_ref().map(format_timestamp),
            entry.exit_code,
            entry.hostname,
            entry.process_id,
        ],
    )
    .context("insert history entry")?;
    let id = conn.last_insert_rowid();
    tracing::debug!(id, directory = %entry.directory, "recorded history entry");
    Ok(id)
}

/// Return the last `limit` entries run in `current_dir` or below it, oldest
/// first.
///
/// An empty `current_dir` matches every entry. `limit <= 0` yields no entries.
///
/// # Errors
/// Returns an error if the read transaction or the query fails, or a row
/// cannot be decoded.
pub fn get_entries(
    conn: &Connection,
    limit: i64,
    current_dir: &str,
) -> anyhow::Result<Vec<HistoryEntry>> {
    if limit <= 0 {
        return Ok(Vec::new());
    }

    let tx = conn
        .unchecked_transaction()
        .context("begin read transaction")?;
    tx.execute_batch("PRAGMA page_size = 4096")
        .context("set page size")?;

    let result = {
        let sql = format!(
            "SELECT id, command, directory, timestamp, exit_code, hostname, process_id
             FROM (
                 SELECT id, command, directory, timestamp, exit_code, hostname, process_id
                 FROM history
                 WHERE ?1 = '' OR {SUBTREE_MATCH}
                 ORDER BY timestamp DESC, id DESC
                 LIMIT ?2
             )
             ORDER BY timestamp ASC, id ASC"
        );
        let mut stmt = tx.prepare(&sql).context("prepare history query")?;
        let rows = stmt
            .query_map(rusqlite::params![current_dir, limit], map_row)
            .context("query history entries")?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row.context("read history row")?);
        }
        result
    };

    tx.commit().context("finish read transaction")?;
    tracing::debug!(
        dir = current_dir,
        limit,
        returned = result.len(),
        "fetched history entries"
    );
    Ok(result)
}

/// Rewrite the directory of every entry at `old_path` or below it so that the
/// `old_path` prefix becomes `new_path`; `old_path/sub/dir` becomes
/// `new_path/sub/dir`. Returns the number of rewritten entries.
///
/// Both paths are used verbatim; callers resolve them to absolute, cleaned
/// form. The rewrite is a single transaction.
///
/// # Errors
/// Returns an error if the UPDATE or the commit fails; no rows are changed in
/// that case.
pub fn update_paths(conn: &Connection, old_path: &str, new_path: &str) -> anyhow::Result<usize> {
    let tx = conn
        .unchecked_transaction()
        .context("begin path rewrite transaction")?;
    let sql = format!(
        "UPDATE history
         SET directory = ?2 || substr(directory, length(?1) + 1)
         WHERE {SUBTREE_MATCH}"
    );
    let count = tx
        .execute(&sql, rusqlite::params![old_path, new_path])
        .context("rewrite history directories")?;
    tx.commit().context("commit path rewrite")?;
    tracing::debug!(old_path, new_path, count, "rewrote history directories");
    Ok(count)
}
