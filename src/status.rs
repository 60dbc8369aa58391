//! Status surface (spec.md §5/§6/§9 design note 1): fixed-field records
//! updated by the dispatcher/workers/writer and read by the UI collaborator.
//!
//! The original represents these as `ctypes.Structure` blocks in shared
//! memory, written without synchronization because readers tolerate stale
//! values (spec.md §5). This crate replaces the shared-memory block with a
//! plain `Mutex`-guarded struct: updates are infrequent relative to the
//! indexing work they describe, so a single mutex per record costs nothing
//! observable, and `snapshot()` gives the UI collaborator a consistent,
//! owned copy instead of reading racy bytes directly.

use std::sync::Mutex;

#[derive(Debug, Clone, Default)]
pub struct DispatcherSnapshot {
    pub status: String,
    pub listed_count: i64,
    pub uptodate_count: i64,
    pub outdated_count: i64,
    pub new_count: i64,
    pub error_count: i64,
    pub current_doc: String,
}

#[derive(Debug, Default)]
pub struct DispatcherStatus(Mutex<DispatcherSnapshot>);

impl DispatcherStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&self, status: &str) {
        self.0.lock().unwrap().status = status.to_string();
    }

    pub fn set_current_doc(&self, doc: &str) {
        self.0.lock().unwrap().current_doc = doc.to_string();
    }

    pub fn inc_listed(&self) {
        self.0.lock().unwrap().listed_count += 1;
    }

    pub fn inc_uptodate(&self) {
        self.0.lock().unwrap().uptodate_count += 1;
    }

    pub fn inc_outdated(&self) {
        self.0.lock().unwrap().outdated_count += 1;
    }

    pub fn inc_new(&self) {
        self.0.lock().unwrap().new_count += 1;
    }

    pub fn inc_error(&self) {
        self.0.lock().unwrap().error_count += 1;
    }

    pub fn snapshot(&self) -> DispatcherSnapshot {
        self.0.lock().unwrap().clone()
    }
}

#[derive(Debug, Clone, Default)]
pub struct WorkerSnapshot {
    pub status: String,
    pub current_doc: String,
    pub doc_done_count: i64,
}

#[derive(Debug, Default)]
pub struct WorkerStatus(Mutex<WorkerSnapshot>);

impl WorkerStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_current_doc(&self, doc: &str) {
        self.0.lock().unwrap().current_doc = doc.to_string();
    }

    pub fn inc_done(&self) {
        self.0.lock().unwrap().doc_done_count += 1;
    }

    pub fn snapshot(&self) -> WorkerSnapshot {
        self.0.lock().unwrap().clone()
    }
}

#[derive(Debug, Clone, Default)]
pub struct WriterSnapshot {
    pub db_status: String,
    pub doc_done_count: i64,
    pub current_doc: String,
}

#[derive(Debug, Default)]
pub struct WriterStatus(Mutex<WriterSnapshot>);

impl WriterStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_db_status(&self, status: impl Into<String>) {
        self.0.lock().unwrap().db_status = status.into();
    }

    pub fn add_done(&self, n: i64) {
        self.0.lock().unwrap().doc_done_count += n;
    }

    pub fn snapshot(&self) -> WriterSnapshot {
        self.0.lock().unwrap().clone()
    }
}
