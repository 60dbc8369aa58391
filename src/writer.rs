//! Writer (spec.md §4.5): the single mutator of the store. Pulls fragments
//! off the writer channel in batches, merges their posting contributions,
//! and performs the append-or-grow protocol against `match` blobs under one
//! transaction per batch.

use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom, Write};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use rusqlite::{params, Connection, DatabaseName};

use crate::fragment::Fragment;
use crate::logging::LogSink;
use crate::status::WriterStatus;
use crate::error::Result;

/// Default idle timeout before a partial batch is flushed (spec.md §4.5).
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(500);

/// Drain the writer channel into bounded batches and apply each one until a
/// sentinel (`None`) is received. Mirrors `dbwriter_proc`'s drain loop:
/// accumulate up to `batch_cap` fragments or until `idle_timeout` elapses
/// with nothing new, then commit whatever was collected.
pub fn run(
    conn: &mut Connection,
    rx: &Receiver<Option<Fragment>>,
    batch_cap: usize,
    idle_timeout: Duration,
    status: &WriterStatus,
    log: &dyn LogSink,
) -> Result<()> {
    let mut finished = false;
    while !finished {
        status.set_db_status("emptying queue");
        let mut batch = Vec::new();
        while batch.len() < batch_cap {
            match rx.recv_timeout(idle_timeout) {
                Ok(Some(fragment)) => batch.push(fragment),
                Ok(None) => {
                    finished = true;
                    break;
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    finished = true;
                    break;
                }
            }
        }

        if !batch.is_empty() {
            match apply_batch(conn, &batch, status) {
                Ok(()) => status.add_done(batch.len() as i64),
                Err(e) => {
                    // A batch failure rolls back (apply_batch only commits
                    // on full success) and the writer moves on to the next
                    // batch, per spec.md §7's StoreError semantics.
                    log.error(&format!("writer: batch of {} documents failed: {e}", batch.len()));
                }
            }
        }
    }
    status.set_db_status("");
    Ok(())
}

fn apply_batch(conn: &mut Connection, batch: &[Fragment], status: &WriterStatus) -> Result<()> {
    let mut merged: HashMap<i64, Vec<u8>> = HashMap::new();
    for fragment in batch {
        for (&word_hash, bytes) in &fragment.postings {
            merged.entry(word_hash).or_default().extend_from_slice(bytes);
        }
    }

    let tx = conn.transaction()?;

    status.set_db_status(format!("select ({})", merged.len()));
    let mut existing: HashMap<i64, i64> = HashMap::new();
    {
        let mut stmt = tx.prepare("SELECT size FROM match WHERE id = ?1")?;
        for &word_hash in merged.keys() {
            if let Some(size) = stmt
                .query_row(params![word_hash], |row| row.get::<_, i64>(0))
                .ok()
            {
                existing.insert(word_hash, size);
            }
        }
    }

    status.set_db_status(format!("blob I/O ({})", existing.len()));
    let mut blob: Option<rusqlite::blob::Blob<'_>> = None;
    for (&word_hash, &old_size) in existing.iter() {
        let add = &merged[&word_hash];
        let add_len = add.len() as i64;
        let new_size = old_size + add_len;

        let phys = match blob.as_mut() {
            Some(b) => {
                b.reopen(word_hash)?;
                b.size() as i64
            }
            None => {
                let b = tx.blob_open(DatabaseName::Main, "match", "matches_blob", word_hash, false)?;
                let size = b.size() as i64;
                blob = Some(b);
                size
            }
        };

        if new_size <= phys {
            let b = blob.as_mut().unwrap();
            b.seek(SeekFrom::Start(old_size as u64))?;
            b.write_all(add)?;
            tx.execute("UPDATE match SET size = ?1 WHERE id = ?2", params![new_size, word_hash])?;
        } else {
            let mut buf = vec![0u8; (2 * new_size) as usize];
            {
                let b = blob.as_mut().unwrap();
                b.seek(SeekFrom::Start(0))?;
                b.read_exact(&mut buf[0..old_size as usize])?;
            }
            buf[old_size as usize..new_size as usize].copy_from_slice(add);
            // The blob's physical capacity can't grow through the blob
            // handle itself; replace the row's bytes wholesale and drop the
            // now-stale handle before the next word hash reopens it.
            blob = None;
            tx.execute(
                "UPDATE match SET size = ?1, matches_blob = ?2 WHERE id = ?3",
                params![new_size, buf, word_hash],
            )?;
        }
    }
    drop(blob);

    let new_words: Vec<(&i64, &Vec<u8>)> = merged
        .iter()
        .filter(|(word_hash, _)| !existing.contains_key(word_hash))
        .collect();
    status.set_db_status(format!("insert matches ({})", new_words.len()));
    for (&word_hash, bytes) in new_words {
        tx.execute(
            "INSERT INTO match (id, size, matches_blob) VALUES (?1, ?2, ?3)",
            params![word_hash, bytes.len() as i64, bytes],
        )?;
    }

    let to_delete: Vec<i64> = batch.iter().filter_map(|f| f.supersedes).collect();
    status.set_db_status(format!("delete docs ({})", to_delete.len()));
    for old_id in to_delete {
        tx.execute("DELETE FROM doc WHERE id = ?1", params![old_id])?;
    }

    status.set_db_status(format!("insert docs ({})", batch.len()));
    for fragment in batch {
        let meta = &fragment.meta;
        tx.execute(
            "INSERT INTO doc (id, type_, locator, mtime, title, extension, size, word_cnt, unique_word_cnt, from_, to_)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                meta.id,
                meta.kind.as_i64(),
                meta.locator,
                meta.mtime,
                meta.title,
                meta.extension,
                meta.size,
                meta.word_count,
                meta.unique_word_count,
                meta.from,
                meta.to,
            ],
        )?;
    }

    status.set_db_status(format!("committing {} documents", batch.len()));
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentKind;
    use crate::fragment::DocMeta;
    use crate::store;
    use crossbeam_channel::unbounded;

    fn doc_meta(id: i64, locator: &str) -> DocMeta {
        DocMeta {
            id,
            kind: DocumentKind::File,
            locator: locator.to_string(),
            mtime: 0,
            title: None,
            extension: None,
            size: 0,
            word_count: 1,
            unique_word_count: 1,
            from: None,
            to: None,
        }
    }

    #[test]
    fn new_word_creates_a_match_row() {
        let mut conn = Connection::open_in_memory().unwrap();
        store::create_tables(&conn).unwrap();
        let status = WriterStatus::new();

        let mut postings = HashMap::new();
        postings.insert(42i64, crate::varint::encode(&[1, 1, 0]));
        let fragment = Fragment {
            meta: doc_meta(1, "a.txt"),
            supersedes: None,
            postings,
        };

        apply_batch(&mut conn, &[fragment], &status).unwrap();
        assert_eq!(store::posting_size(&conn, 42).unwrap(), Some(3));
        let blob = store::read_posting_blob(&conn, 42).unwrap();
        assert_eq!(crate::varint::decode(&blob).unwrap(), vec![1, 1, 0]);
    }

    #[test]
    fn second_batch_appends_without_growing_when_capacity_allows() {
        let mut conn = Connection::open_in_memory().unwrap();
        store::create_tables(&conn).unwrap();
        let status = WriterStatus::new();

        let mut postings1 = HashMap::new();
        postings1.insert(42i64, crate::varint::encode(&[1, 1, 0]));
        apply_batch(
            &mut conn,
            &[Fragment {
                meta: doc_meta(1, "a.txt"),
                supersedes: None,
                postings: postings1,
            }],
            &status,
        )
        .unwrap();

        let mut postings2 = HashMap::new();
        postings2.insert(42i64, crate::varint::encode(&[2, 1, 0]));
        apply_batch(
            &mut conn,
            &[Fragment {
                meta: doc_meta(2, "b.txt"),
                supersedes: None,
                postings: postings2,
            }],
            &status,
        )
        .unwrap();

        let blob = store::read_posting_blob(&conn, 42).unwrap();
        assert_eq!(crate::varint::decode(&blob).unwrap(), vec![1, 1, 0, 2, 1, 0]);
    }

    #[test]
    fn growth_doubles_physical_capacity() {
        let mut conn = Connection::open_in_memory().unwrap();
        store::create_tables(&conn).unwrap();
        let status = WriterStatus::new();

        let mut postings = HashMap::new();
        postings.insert(99i64, crate::varint::encode(&[1, 1, 0]));
        apply_batch(
            &mut conn,
            &[Fragment {
                meta: doc_meta(1, "a.txt"),
                supersedes: None,
                postings,
            }],
            &status,
        )
        .unwrap();

        // First insert: physical capacity equals logical size exactly (no
        // reserved headroom yet).
        let size_before = store::posting_size(&conn, 99).unwrap().unwrap();
        let phys_before: i64 = conn
            .query_row("SELECT length(matches_blob) FROM match WHERE id = 99", [], |r| r.get(0))
            .unwrap();
        assert_eq!(phys_before, size_before);

        // Appending anything now exceeds capacity, forcing a grow-and-copy.
        let mut postings2 = HashMap::new();
        postings2.insert(99i64, crate::varint::encode(&[2, 1, 0]));
        apply_batch(
            &mut conn,
            &[Fragment {
                meta: doc_meta(2, "b.txt"),
                supersedes: None,
                postings: postings2,
            }],
            &status,
        )
        .unwrap();

        let size_after = store::posting_size(&conn, 99).unwrap().unwrap();
        let phys_after: i64 = conn
            .query_row("SELECT length(matches_blob) FROM match WHERE id = 99", [], |r| r.get(0))
            .unwrap();
        assert_eq!(phys_after, 2 * size_after);
        assert!(phys_after >= size_after);
    }

    #[test]
    fn supersession_deletes_old_doc_row_in_the_same_batch() {
        let mut conn = Connection::open_in_memory().unwrap();
        store::create_tables(&conn).unwrap();
        let status = WriterStatus::new();

        apply_batch(
            &mut conn,
            &[Fragment {
                meta: doc_meta(1, "a.txt"),
                supersedes: None,
                postings: HashMap::new(),
            }],
            &status,
        )
        .unwrap();
        assert!(store::fetch_doc_row(&conn, 1).unwrap().is_some());

        apply_batch(
            &mut conn,
            &[Fragment {
                meta: doc_meta(2, "a.txt"),
                supersedes: Some(1),
                postings: HashMap::new(),
            }],
            &status,
        )
        .unwrap();
        assert!(store::fetch_doc_row(&conn, 1).unwrap().is_none());
        assert!(store::fetch_doc_row(&conn, 2).unwrap().is_some());
    }

    #[test]
    fn run_stops_on_sentinel() {
        let mut conn = Connection::open_in_memory().unwrap();
        store::create_tables(&conn).unwrap();
        let status = WriterStatus::new();
        let (tx, rx) = unbounded();
        tx.send(None).unwrap();
        run(&mut conn, &rx, 10_000, Duration::from_millis(50), &status, &crate::logging::NullSink).unwrap();
    }
}
