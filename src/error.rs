//! Error kinds for the indexing and query core (spec.md §7).
//!
//! `ConfigurationError` is deliberately absent: it belongs to the CLI
//! collaborator, which validates configuration before the core ever sees it.

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// A source iterator (file walk, mail folder, web crawl) failed on one item.
    #[snafu(display("source error while listing {locator}: {message}"))]
    Source { locator: String, message: String },

    /// `Document::get_text()` failed; the document is still recorded with
    /// empty counts so a future re-index can retry it.
    #[snafu(display("failed to read document {locator}: {message}"))]
    DocumentRead { locator: String, message: String },

    /// Varint decoding failed, or the decoded integer count was not a
    /// multiple of three.
    #[snafu(display("corrupt posting list for word hash {word_hash}: {reason}"))]
    CorruptPostingList { word_hash: i64, reason: String },

    /// The underlying store rejected a statement, blob operation, or commit.
    #[snafu(display("store error: {message}"))]
    Store { message: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Store {
            message: err.to_string(),
        }
    }
}

/// Blob I/O (`rusqlite::blob::Blob`'s `Read`/`Write`/`Seek` impls surface
/// `std::io::Error`) rolls up into `StoreError` too -- a failed blob
/// seek/write/read is a store failure from the writer's point of view
/// (spec.md §7).
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Store {
            message: err.to_string(),
        }
    }
}

impl Error {
    pub fn corrupt(word_hash: i64, reason: impl Into<String>) -> Self {
        Error::CorruptPostingList {
            word_hash,
            reason: reason.into(),
        }
    }

    pub fn source_error(locator: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Source {
            locator: locator.into(),
            message: message.into(),
        }
    }

    pub fn document_read(locator: impl Into<String>, message: impl Into<String>) -> Self {
        Error::DocumentRead {
            locator: locator.into(),
            message: message.into(),
        }
    }
}
