//! The embedded relational store (spec.md §2.5/§6): two SQLite tables,
//! `match` (posting lists, keyed by word hash) and `doc` (document rows).
//!
//! This module owns schema management and the read paths shared by the
//! dispatcher and the query engine. The append-or-grow blob write protocol
//! lives in [`crate::writer`], which needs finer control over transaction
//! and blob handle lifetimes than a generic store API would give it.

use std::collections::HashMap;

use rusqlite::{params, Connection, OptionalExtension};

use crate::document::DocumentKind;
use crate::error::{Error, Result};

/// A `doc` row as read back for query results or dispatcher reconciliation.
#[derive(Debug, Clone)]
pub struct DocRow {
    pub id: i64,
    pub kind: DocumentKind,
    pub locator: String,
    pub mtime: i64,
    pub title: Option<String>,
}

pub fn open(path: &str) -> Result<Connection> {
    let conn = Connection::open(path)?;
    create_tables(&conn)?;
    Ok(conn)
}

pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS match(
             id           INTEGER PRIMARY KEY,
             size         INTEGER NOT NULL,
             matches_blob BLOB    NOT NULL
         );
         CREATE TABLE IF NOT EXISTS doc(
             id              INTEGER PRIMARY KEY AUTOINCREMENT,
             type_           INTEGER NOT NULL,
             locator         TEXT    UNIQUE NOT NULL,
             mtime           INTEGER NOT NULL,
             title           TEXT,
             extension       TEXT,
             size            INTEGER,
             word_cnt        INTEGER NOT NULL,
             unique_word_cnt INTEGER NOT NULL,
             from_           TEXT,
             to_             TEXT
         );",
    )?;
    Ok(())
}

/// Load `(locator -> (id, mtime))` for every existing document, the shape
/// the dispatcher reconciles newly-listed documents against (spec.md §4.6).
pub fn load_doc_index(conn: &Connection) -> Result<HashMap<String, (i64, i64)>> {
    let mut stmt = conn.prepare("SELECT id, locator, mtime FROM doc")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(1)?,
            (row.get::<_, i64>(0)?, row.get::<_, i64>(2)?),
        ))
    })?;
    let mut index = HashMap::new();
    for row in rows {
        let (locator, id_mtime) = row?;
        index.insert(locator, id_mtime);
    }
    Ok(index)
}

/// Fetch `(locator, title, type, id)` for a single document id, used by the
/// query engine to materialize a result row (spec.md §4.7 step 7).
pub fn fetch_doc_row(conn: &Connection, id: i64) -> Result<Option<DocRow>> {
    conn.query_row(
        "SELECT id, type_, locator, mtime, title FROM doc WHERE id = ?1",
        params![id],
        |row| {
            let kind_raw: i64 = row.get(1)?;
            Ok(DocRow {
                id: row.get(0)?,
                kind: DocumentKind::from_i64(kind_raw),
                locator: row.get(2)?,
                mtime: row.get(3)?,
                title: row.get(4)?,
            })
        },
    )
    .optional()
    .map_err(Error::from)
}

/// Logical `size` of a posting list, if the word hash has ever been seen.
pub fn posting_size(conn: &Connection, word_hash: i64) -> Result<Option<i64>> {
    conn.query_row(
        "SELECT size FROM match WHERE id = ?1",
        params![word_hash],
        |row| row.get::<_, i64>(0),
    )
    .optional()
    .map_err(Error::from)
}

/// Read the full logical payload of a posting list (the first `size` bytes
/// of the blob; bytes past `size` are reserved capacity, spec.md §6).
pub fn read_posting_blob(conn: &Connection, word_hash: i64) -> Result<Vec<u8>> {
    let size = posting_size(conn, word_hash)?.unwrap_or(0);
    if size == 0 {
        return Ok(Vec::new());
    }
    let blob = conn.blob_open(rusqlite::DatabaseName::Main, "match", "matches_blob", word_hash, true)?;
    let mut buf = vec![0u8; size as usize];
    read_blob_prefix(blob, &mut buf, word_hash)?;
    Ok(buf)
}

fn read_blob_prefix(mut blob: rusqlite::blob::Blob<'_>, buf: &mut [u8], word_hash: i64) -> Result<()> {
    use std::io::Read;
    blob.read_exact(buf).map_err(|e| {
        Error::corrupt(
            word_hash,
            format!("failed to read {} bytes from posting blob: {e}", buf.len()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_database_has_no_documents() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        assert!(load_doc_index(&conn).unwrap().is_empty());
    }

    #[test]
    fn unknown_posting_list_has_no_size() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        assert_eq!(posting_size(&conn, 1234).unwrap(), None);
    }

    #[test]
    fn unknown_document_id_is_none() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        assert!(fetch_doc_row(&conn, 1).unwrap().is_none());
    }
}
