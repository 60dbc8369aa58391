//! Logging collaborator (spec.md §6/§9 design note 2).
//!
//! The original ties every process into a `multiprocessing.Queue` drained
//! by a dedicated listener thread because the `logging` module's handlers
//! aren't process-safe on their own. Since this crate runs the dispatcher,
//! workers and writer as threads within one process rather than separate
//! processes, that plumbing collapses to an ordinary trait object: the core
//! depends only on [`LogSink`], and the embedding binary decides what a log
//! message ultimately does.

use std::fmt;

pub trait LogSink: fmt::Debug + Send + Sync {
    fn debug(&self, msg: &str);
    fn info(&self, msg: &str);
    fn warning(&self, msg: &str);
    fn error(&self, msg: &str);
}

/// Discards everything. Used by unit tests that don't care about log
/// output.
#[derive(Debug, Default)]
pub struct NullSink;

impl LogSink for NullSink {
    fn debug(&self, _msg: &str) {}
    fn info(&self, _msg: &str) {}
    fn warning(&self, _msg: &str) {}
    fn error(&self, _msg: &str) {}
}

/// Forwards to the `tracing` macros; this is the sink the binary installs
/// once `tracing_subscriber` has been initialized.
#[derive(Debug, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }
    fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }
    fn warning(&self, msg: &str) {
        tracing::warn!("{msg}");
    }
    fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_sink_does_not_panic() {
        let sink = NullSink;
        sink.debug("x");
        sink.info("x");
        sink.warning("x");
        sink.error("x");
    }
}
