//! Dispatcher (spec.md §4.6): enumerates candidate documents, reconciles
//! them against existing `doc` rows by locator/mtime, and assigns fresh,
//! monotonic document ids. Id allocation is single-threaded here, which is
//! what keeps ids collision-free even though workers run concurrently.

use std::path::PathBuf;

use crossbeam_channel::Sender;
use rusqlite::Connection;

use crate::config::Config;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::sources;
use crate::status::DispatcherStatus;
use crate::store;
use crate::worker::IndexTask;

/// A single source root to enumerate: a directory of files, a directory of
/// `.eml` mail files, or a web page to crawl.
#[derive(Debug, Clone)]
pub enum SourceRoot {
    Directory(PathBuf),
    MailDirectory(PathBuf),
    Webpage(String),
}

/// Enumerate every configured source, reconcile against `conn`'s existing
/// `doc` rows, and push one [`IndexTask`] per new/outdated document onto
/// `index_tx`. Sends `config.worker_count` sentinels once done, mirroring
/// `dispatcher_proc`'s shutdown sequence (spec.md §4.6/§5).
pub fn run(
    conn: &Connection,
    roots: &[SourceRoot],
    config: &Config,
    index_tx: &Sender<Option<IndexTask>>,
    status: &DispatcherStatus,
    log: &dyn crate::logging::LogSink,
) -> Result<()> {
    status.set_status("Load initial document list");
    let known = store::load_doc_index(conn)?;
    let mut next_doc_id = known.values().map(|(id, _)| *id).max().unwrap_or(0) + 1;

    status.set_status("Listing documents");
    for root in roots {
        dispatch_root(root, config, &known, &mut next_doc_id, index_tx, status, log)?;
    }

    status.set_status("Waiting on indexer processes");
    for _ in 0..config.worker_count {
        index_tx
            .send(None)
            .map_err(|_| Error::Store {
                message: "indexer channel closed before dispatcher finished".to_string(),
            })?;
    }
    status.set_status("Idle");
    Ok(())
}

fn dispatch_root(
    root: &SourceRoot,
    config: &Config,
    known: &std::collections::HashMap<String, (i64, i64)>,
    next_doc_id: &mut i64,
    index_tx: &Sender<Option<IndexTask>>,
    status: &DispatcherStatus,
    log: &dyn crate::logging::LogSink,
) -> Result<()> {
    match root {
        SourceRoot::Directory(dir) => {
            for item in sources::iter_files(dir, &config.extensions) {
                dispatch_one(item, known, next_doc_id, index_tx, status, log)?;
            }
        }
        SourceRoot::MailDirectory(dir) => {
            for item in sources::iter_emails(dir) {
                dispatch_one(item, known, next_doc_id, index_tx, status, log)?;
            }
        }
        SourceRoot::Webpage(url) => {
            for item in sources::iter_webpages(url, config.recurse_links) {
                dispatch_one(item, known, next_doc_id, index_tx, status, log)?;
            }
        }
    }
    Ok(())
}

fn dispatch_one(
    item: Result<Document, Error>,
    known: &std::collections::HashMap<String, (i64, i64)>,
    next_doc_id: &mut i64,
    index_tx: &Sender<Option<IndexTask>>,
    status: &DispatcherStatus,
    log: &dyn crate::logging::LogSink,
) -> Result<()> {
    let doc = match item {
        Err(e) => {
            status.inc_error();
            log.warning(&format!("source error: {e}"));
            return Ok(());
        }
        Ok(doc) => doc,
    };

    status.inc_listed();
    status.set_current_doc(doc.title.as_deref().unwrap_or(&doc.locator));

    let task = match known.get(&doc.locator) {
        None => {
            status.inc_new();
            let id = *next_doc_id;
            *next_doc_id += 1;
            Some(IndexTask {
                doc,
                new_id: id,
                supersedes: None,
            })
        }
        Some(&(old_id, old_mtime)) if doc.mtime > old_mtime => {
            status.inc_outdated();
            let id = *next_doc_id;
            *next_doc_id += 1;
            Some(IndexTask {
                doc,
                new_id: id,
                supersedes: Some(old_id),
            })
        }
        Some(_) => {
            status.inc_uptodate();
            None
        }
    };

    if let Some(task) = task {
        index_tx.send(Some(task)).map_err(|_| Error::Store {
            message: "indexer channel closed while dispatching".to_string(),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NullSink;
    use crossbeam_channel::unbounded;
    use std::fs;

    #[test]
    fn unknown_locator_is_classified_new() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "hello world").unwrap();

        let conn = Connection::open_in_memory().unwrap();
        store::create_tables(&conn).unwrap();

        let mut config = Config::default();
        config.extensions = ["txt".to_string()].into_iter().collect();
        config.worker_count = 1;

        let (tx, rx) = unbounded();
        let status = DispatcherStatus::new();
        run(
            &conn,
            &[SourceRoot::Directory(dir.path().to_path_buf())],
            &config,
            &tx,
            &status,
            &NullSink,
        )
        .unwrap();

        let mut tasks = Vec::new();
        while let Ok(item) = rx.try_recv() {
            if let Some(task) = item {
                tasks.push(task);
            }
        }
        assert_eq!(tasks.len(), 1);
        assert_eq!(status.snapshot().new_count, 1);
    }

    #[test]
    fn uptodate_locator_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "hello world").unwrap();
        let mtime = fs::metadata(&path)
            .unwrap()
            .modified()
            .unwrap()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64;

        let conn = Connection::open_in_memory().unwrap();
        store::create_tables(&conn).unwrap();
        conn.execute(
            "INSERT INTO doc (id, type_, locator, mtime, word_cnt, unique_word_cnt) VALUES (1, 1, ?1, ?2, 0, 0)",
            rusqlite::params![path.to_string_lossy(), mtime],
        )
        .unwrap();

        let mut config = Config::default();
        config.extensions = ["txt".to_string()].into_iter().collect();
        config.worker_count = 1;

        let (tx, rx) = unbounded();
        let status = DispatcherStatus::new();
        run(
            &conn,
            &[SourceRoot::Directory(dir.path().to_path_buf())],
            &config,
            &tx,
            &status,
            &NullSink,
        )
        .unwrap();

        let mut tasks = Vec::new();
        while let Ok(item) = rx.try_recv() {
            if let Some(task) = item {
                tasks.push(task);
            }
        }
        assert!(tasks.is_empty());
        assert_eq!(status.snapshot().uptodate_count, 1);
    }
}
