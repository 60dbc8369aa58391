//! Indexer worker (spec.md §4.4): turns a `Document` into a [`Fragment`] of
//! encoded posting contributions. Workers share no mutable state and
//! acquire no locks -- each owns a private [`WordHashCache`].

use std::collections::HashMap;

use crate::document::Document;
use crate::fragment::{DocMeta, Fragment};
use crate::hash::WordHashCache;
use crate::logging::LogSink;
use crate::tokenizer;
use crate::varint;

/// A unit of work handed from the dispatcher to a worker: a document plus
/// the id it has been assigned and, if it supersedes a prior version, the
/// id being replaced.
#[derive(Debug, Clone)]
pub struct IndexTask {
    pub doc: Document,
    pub new_id: i64,
    pub supersedes: Option<i64>,
}

/// Tokenize and hash `doc`'s text, producing a fragment ready for the
/// writer. A document that fails to read or tokenize still produces a
/// fragment (with empty postings and zero counts) so that a future
/// re-index sees an updated `doc` row and can retry it (spec.md §4.4).
pub fn index_document(task: IndexTask, cache: &mut WordHashCache, log: &dyn LogSink) -> Fragment {
    let IndexTask {
        doc,
        new_id,
        supersedes,
    } = task;

    let mut postings: HashMap<i64, Vec<u8>> = HashMap::new();
    let mut word_count = 0i64;

    match doc.get_text() {
        Ok(text) => {
            // hash -> (frequency, sum_of_positions); collisions between
            // distinct words are merged here, matching spec.md §4.4's
            // "mapping word_hash -> ..." (unique_word_count counts distinct
            // hashes, not distinct surface words).
            let mut accum: HashMap<i64, (i64, i64)> = HashMap::new();
            for (word, position) in tokenizer::tokenize(&text) {
                let hash = cache.hash(&word);
                let entry = accum.entry(hash).or_insert((0, 0));
                entry.0 += 1;
                entry.1 += position as i64;
                word_count += 1;
            }
            for (hash, (frequency, sum_positions)) in accum {
                let average_position = sum_positions / frequency;
                let bytes = varint::encode(&[
                    new_id as u64,
                    frequency as u64,
                    average_position as u64,
                ]);
                postings.insert(hash, bytes);
            }
        }
        Err(e) => {
            log.warning(&format!(
                "failed to index document {}: {e}",
                doc.locator
            ));
        }
    }

    let unique_word_count = postings.len() as i64;

    Fragment {
        meta: DocMeta {
            id: new_id,
            kind: doc.kind,
            locator: doc.locator,
            mtime: doc.mtime,
            title: doc.title,
            extension: doc.extension,
            size: doc.size,
            word_count,
            unique_word_count,
            from: doc.from,
            to: doc.to,
        },
        supersedes,
        postings,
    }
}
