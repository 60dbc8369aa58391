//! In-flight document fragment (spec.md §3/§9 design note 5): a worker's
//! per-document contribution, ready to be merged and appended by the
//! writer. Replaces the original's `doc.old_id` attribute bolted onto the
//! in-flight document with an explicit `supersedes` field.

use std::collections::HashMap;

use crate::document::DocumentKind;

/// The metadata half of a fragment: exactly what ends up in a `doc` row.
#[derive(Debug, Clone)]
pub struct DocMeta {
    pub id: i64,
    pub kind: DocumentKind,
    pub locator: String,
    pub mtime: i64,
    pub title: Option<String>,
    pub extension: Option<String>,
    pub size: i64,
    pub word_count: i64,
    pub unique_word_count: i64,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// A worker's output for a single document: the doc row it produces, the id
/// (if any) it supersedes, and the encoded posting contributions keyed by
/// word hash (spec.md §4.4).
#[derive(Debug, Clone)]
pub struct Fragment {
    pub meta: DocMeta,
    pub supersedes: Option<i64>,
    pub postings: HashMap<i64, Vec<u8>>,
}
