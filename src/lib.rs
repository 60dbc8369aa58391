//! Local full-text indexer and query engine (spec.md).
//!
//! This crate is the indexing pipeline and inverted-index storage layer: a
//! dispatcher that enumerates candidate documents, a pool of indexer
//! workers, a single writer performing append-or-grow updates on posting
//! blobs, and the symmetric query path. The terminal UI, HTTP surface, CLI
//! argument parsing and log sink *setup* are external collaborators; this
//! crate only pins down the interfaces they consume (spec.md §1/§6).

pub mod charmap;
pub mod config;
pub mod dispatcher;
pub mod document;
pub mod error;
pub mod fragment;
pub mod hash;
pub mod logging;
pub mod query;
pub mod sources;
pub mod status;
pub mod store;
pub mod tokenizer;
pub mod varint;
pub mod worker;
pub mod writer;

use std::sync::Arc;
use std::thread;

use crossbeam_channel::unbounded;
use rusqlite::Connection;

pub use config::Config;
pub use dispatcher::SourceRoot;
pub use document::{Document, DocumentKind};
pub use error::{Error, Result};
pub use fragment::Fragment;
pub use logging::LogSink;
pub use query::{OrderBy, OrderDir, QueryEngine, SearchHit};
pub use status::{DispatcherStatus, WorkerStatus, WriterStatus};
pub use worker::IndexTask;

/// Shared-memory status for a full indexing run (spec.md §5/§6): one
/// record per worker, plus the dispatcher and writer.
pub struct IndexingStatus {
    pub dispatcher: Arc<DispatcherStatus>,
    pub workers: Vec<Arc<WorkerStatus>>,
    pub writer: Arc<WriterStatus>,
}

impl IndexingStatus {
    fn new(worker_count: usize) -> Self {
        IndexingStatus {
            dispatcher: Arc::new(DispatcherStatus::new()),
            workers: (0..worker_count).map(|_| Arc::new(WorkerStatus::new())).collect(),
            writer: Arc::new(WriterStatus::new()),
        }
    }
}

/// Run one full indexing pass: spawn the worker pool and writer, then drive
/// the dispatcher over `roots` on the calling thread. Blocks until every
/// document has been enumerated, indexed and committed (spec.md §2/§5).
///
/// Threads replace the original's processes (spec.md §5's "multi-process
/// parallelism" becomes multi-threaded, since there is no GIL to work
/// around); the channel/sentinel protocol and the writer's single-mutator
/// discipline are unchanged.
pub fn run_indexing(
    db_path: &str,
    roots: Vec<SourceRoot>,
    config: &Config,
    log: Arc<dyn LogSink>,
) -> Result<IndexingStatus> {
    let status = IndexingStatus::new(config.worker_count);

    // The dispatcher issues ids against the document list as it stood at
    // startup; it needs its own connection into the store.
    let dispatch_conn = store::open(db_path)?;

    let (index_tx, index_rx) = unbounded::<Option<IndexTask>>();
    let (write_tx, write_rx) = unbounded::<Option<Fragment>>();

    let mut worker_handles = Vec::with_capacity(config.worker_count);
    for worker_status in &status.workers {
        let index_rx = index_rx.clone();
        let write_tx = write_tx.clone();
        let worker_status = Arc::clone(worker_status);
        let log = Arc::clone(&log);
        let hash_cache_capacity = config.hash_cache_capacity;
        worker_handles.push(thread::spawn(move || {
            let mut cache = hash::WordHashCache::new(hash_cache_capacity);
            while let Ok(msg) = index_rx.recv() {
                let task = match msg {
                    Some(task) => task,
                    None => break,
                };
                worker_status.set_current_doc(task.doc.title.as_deref().unwrap_or(&task.doc.locator));
                let fragment = worker::index_document(task, &mut cache, log.as_ref());
                worker_status.inc_done();
                if write_tx.send(Some(fragment)).is_err() {
                    break;
                }
            }
        }));
    }
    // Drop this thread's own sender so the writer channel actually
    // disconnects once every worker thread's clone has dropped in turn.
    drop(write_tx);

    let writer_db_path = db_path.to_string();
    let writer_status = Arc::clone(&status.writer);
    let writer_log = Arc::clone(&log);
    let batch_cap = config.batch_cap;
    let writer_handle = thread::spawn(move || -> Result<()> {
        let mut conn = store::open(&writer_db_path)?;
        writer::run(
            &mut conn,
            &write_rx,
            batch_cap,
            writer::DEFAULT_IDLE_TIMEOUT,
            &writer_status,
            writer_log.as_ref(),
        )
    });

    dispatcher::run(
        &dispatch_conn,
        &roots,
        config,
        &index_tx,
        &status.dispatcher,
        log.as_ref(),
    )?;
    // Backstop: dispatcher::run already sent one sentinel per worker, but
    // drop our own sender too so the channel disconnects even if a worker
    // somehow missed its sentinel.
    drop(index_tx);

    for handle in worker_handles {
        let _ = handle.join();
    }

    writer_handle
        .join()
        .map_err(|_| Error::Store {
            message: "writer thread panicked".to_string(),
        })??;

    Ok(status)
}

pub fn open_query_engine(cache_capacity: usize) -> QueryEngine {
    QueryEngine::new(cache_capacity)
}

pub fn open_store(db_path: &str) -> Result<Connection> {
    store::open(db_path)
}
