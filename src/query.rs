//! Query engine (spec.md §4.7): the read-path mirror of the writer. Fetches
//! posting blobs for each query term, decodes them, intersects the posting
//! sets, and ranks the surviving documents.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;
use rusqlite::Connection;

use crate::document::DocumentKind;
use crate::error::{Error, Result};
use crate::hash::WordHashCache;
use crate::store;
use crate::tokenizer;
use crate::varint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    Relevance,
    Frequency,
    AveragePosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDir {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: i64,
    pub locator: String,
    pub title: Option<String>,
    pub kind: DocumentKind,
    pub frequency: i64,
    pub average_position: i64,
    pub relevance: f64,
}

/// `docs(h)` and `scores(h)` for one word hash: the set of document ids
/// that contain the word, and each id's `(frequency, average_position)`
/// pair (spec.md §4.7 step 2 -- real/imaginary parts of the "complex
/// score").
type TermPostings = (Vec<i64>, HashMap<i64, (i64, i64)>);

/// The read path's process-local cache, keyed on word hash, memoizing
/// decoded posting sets across repeated queries sharing terms.
pub struct QueryEngine {
    cache: Mutex<LruCache<i64, TermPostings>>,
}

impl QueryEngine {
    pub fn new(cache_capacity: usize) -> Self {
        let cap = NonZeroUsize::new(cache_capacity.max(1)).unwrap();
        QueryEngine {
            cache: Mutex::new(LruCache::new(cap)),
        }
    }

    fn term_postings(&self, conn: &Connection, word_hash: i64) -> Result<TermPostings> {
        if let Some(hit) = self.cache.lock().unwrap().get(&word_hash) {
            return Ok(hit.clone());
        }

        let blob = store::read_posting_blob(conn, word_hash)?;
        let ints = varint::decode(&blob)
            .map_err(|_| Error::corrupt(word_hash, "truncated trailing varint"))?;
        if ints.len() % 3 != 0 {
            return Err(Error::corrupt(
                word_hash,
                format!("{} integers is not a multiple of three", ints.len()),
            ));
        }

        let mut docs = Vec::with_capacity(ints.len() / 3);
        let mut scores = HashMap::with_capacity(ints.len() / 3);
        for chunk in ints.chunks_exact(3) {
            let (doc_id, frequency, average_position) = (chunk[0] as i64, chunk[1] as i64, chunk[2] as i64);
            docs.push(doc_id);
            scores.insert(doc_id, (frequency, average_position));
        }

        let result = (docs, scores);
        self.cache.lock().unwrap().put(word_hash, result.clone());
        Ok(result)
    }

    /// Run a conjunctive multi-word query (spec.md §4.7). Returns the total
    /// number of matching documents and the ranked, paginated slice.
    pub fn search(
        &self,
        conn: &Connection,
        query: &str,
        limit: usize,
        offset: usize,
        order_by: OrderBy,
        order_dir: OrderDir,
    ) -> Result<(usize, Vec<SearchHit>)> {
        let mut hash_cache = WordHashCache::new(4096);
        let term_hashes: HashSet<i64> = tokenizer::tokenize(query)
            .into_iter()
            .map(|(word, _)| hash_cache.hash(&word))
            .collect();

        if term_hashes.is_empty() {
            return Ok((0, Vec::new()));
        }

        let mut per_term = Vec::with_capacity(term_hashes.len());
        for hash in &term_hashes {
            per_term.push(self.term_postings(conn, *hash)?);
        }

        let mut matching: HashSet<i64> = per_term[0].0.iter().copied().collect();
        for (docs, _) in &per_term[1..] {
            let set: HashSet<i64> = docs.iter().copied().collect();
            matching = matching.intersection(&set).copied().collect();
        }

        let mut combined: HashMap<i64, (i64, i64)> = HashMap::new();
        for (_, scores) in &per_term {
            for &id in &matching {
                if let Some(&(f, a)) = scores.get(&id) {
                    let entry = combined.entry(id).or_insert((0, 0));
                    entry.0 += f;
                    entry.1 += a;
                }
            }
        }

        let mut results: Vec<(i64, i64, i64, f64)> = combined
            .into_iter()
            .map(|(id, (f, a))| (id, f, a, relevance(f, a)))
            .collect();

        sort_results(&mut results, order_by, order_dir);

        let total = results.len();
        let page: Vec<_> = results.into_iter().skip(offset).take(limit).collect();

        let mut hits = Vec::with_capacity(page.len());
        for (id, frequency, average_position, relevance) in page {
            if let Some(row) = store::fetch_doc_row(conn, id)? {
                hits.push(SearchHit {
                    id,
                    locator: row.locator,
                    title: row.title,
                    kind: row.kind,
                    frequency,
                    average_position,
                    relevance,
                });
            }
        }

        Ok((total, hits))
    }
}

/// `relevance = F * 10 / (A + 1)` (spec.md §4.7 step 5): lower average
/// position and higher frequency both raise it.
fn relevance(frequency: i64, average_position: i64) -> f64 {
    (frequency as f64) * 10.0 / ((average_position as f64) + 1.0)
}

fn sort_results(results: &mut [(i64, i64, i64, f64)], order_by: OrderBy, order_dir: OrderDir) {
    results.sort_by(|a, b| {
        let (ka, kb) = match order_by {
            OrderBy::Relevance => (a.3, b.3),
            OrderBy::Frequency => (a.1 as f64, b.1 as f64),
            OrderBy::AveragePosition => (a.2 as f64, b.2 as f64),
        };
        let ordering = ka.partial_cmp(&kb).unwrap_or(std::cmp::Ordering::Equal);
        match order_dir {
            OrderDir::Ascending => ordering,
            OrderDir::Descending => ordering.reverse(),
        }
    });
}
