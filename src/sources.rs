//! Document sources (spec.md §4.6/§9 design note 3): lazy, restartable
//! producers of `Result<Document, SourceError>`, one per document kind.
//!
//! A source is a plain `Iterator` so the dispatcher can chain them with
//! `itertools`/`std::iter` combinators exactly as `core.py` chains
//! `iterfiles`/`iteremails`/`iterwebpages` with `itertools.chain`.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use itertools::Itertools;
use mailparse::MailHeaderMap;
use regex::Regex;
use walkdir::WalkDir;

use crate::document::Document;
use crate::error::Error;

/// Recursively walk `root`, yielding one [`Document`] per file whose
/// extension is in `extensions` (case-insensitive, without the leading
/// dot). Errors on an individual directory entry are yielded rather than
/// aborting the whole walk, matching `iterfiles`'s `(doc, error)` pairs.
pub fn iter_files(
    root: &Path,
    extensions: &HashSet<String>,
) -> impl Iterator<Item = Result<Document, Error>> + '_ {
    WalkDir::new(root)
        .into_iter()
        .filter_map(move |entry| match entry {
            Err(e) => Some(Err(Error::source_error(root.to_string_lossy(), e.to_string()))),
            Ok(entry) => {
                if !entry.file_type().is_file() {
                    return None;
                }
                let path = entry.path();
                let ext = path
                    .extension()
                    .map(|e| e.to_string_lossy().to_lowercase());
                match ext {
                    Some(ext) if extensions.contains(&ext) => Some(build_file_document(path)),
                    _ => None,
                }
            }
        })
}

fn build_file_document(path: &Path) -> Result<Document, Error> {
    let meta = fs::metadata(path)
        .map_err(|e| Error::source_error(path.to_string_lossy(), e.to_string()))?;
    let mtime = meta
        .modified()
        .map_err(|e| Error::source_error(path.to_string_lossy(), e.to_string()))?
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    Ok(Document::file(path.to_path_buf(), mtime, meta.len() as i64))
}

/// Walk a directory of `.eml` files, parsing each one fully (headers + body)
/// at listing time. This is the portable substitute for the original's
/// Outlook COM adapter (spec.md §4 supplement, DESIGN.md records the
/// tradeoff): there is no live mail server to page through, so the
/// directory itself is the "folder".
pub fn iter_emails(dir: &Path) -> impl Iterator<Item = Result<Document, Error>> + '_ {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(move |entry| match entry {
            Err(e) => Some(Err(Error::source_error(dir.to_string_lossy(), e.to_string()))),
            Ok(entry) => {
                if !entry.file_type().is_file() {
                    return None;
                }
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("eml") {
                    return None;
                }
                Some(build_email_document(path))
            }
        })
}

fn build_email_document(path: &Path) -> Result<Document, Error> {
    let locator = path.to_string_lossy().into_owned();
    let raw = fs::read(path).map_err(|e| Error::source_error(locator.clone(), e.to_string()))?;
    let meta = fs::metadata(path).map_err(|e| Error::source_error(locator.clone(), e.to_string()))?;
    let mtime = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);

    let parsed =
        mailparse::parse_mail(&raw).map_err(|e| Error::source_error(locator.clone(), e.to_string()))?;
    let from = parsed.headers.get_first_value("From");
    let to = parsed.headers.get_first_value("To");
    let subject = parsed.headers.get_first_value("Subject");
    let body = parsed
        .get_body()
        .map_err(|e| Error::source_error(locator.clone(), e.to_string()))?;

    Ok(Document::email(
        locator,
        mtime,
        subject,
        raw.len() as i64,
        from,
        to,
        body,
    ))
}

/// Fetch `root_url` and, if `recurse_links > 0`, follow up to
/// `recurse_links` of the `href` targets found on that page (one level of
/// recursion, never recursing further -- spec.md §4.6/§9 supplement). Unlike
/// the file/email sources this is eager (everything is fetched up front)
/// because there is no cheap way to "list" a web page without retrieving
/// it.
pub fn iter_webpages(root_url: &str, recurse_links: u8) -> Vec<Result<Document, Error>> {
    let mut out = Vec::new();
    let root_body = match fetch_page(root_url) {
        Ok(body) => body,
        Err(e) => {
            out.push(Err(e));
            return out;
        }
    };

    if recurse_links > 0 {
        for link in extract_links(&root_body).into_iter().take(recurse_links as usize) {
            out.push(fetch_page(&link).map(|body| Document::webpage(link.clone(), body)));
        }
    }

    out.insert(0, Ok(Document::webpage(root_url.to_string(), root_body)));
    out
}

fn fetch_page(url: &str) -> Result<String, Error> {
    reqwest::blocking::get(url)
        .and_then(|resp| resp.error_for_status())
        .and_then(|resp| resp.text())
        .map_err(|e| Error::source_error(url.to_string(), e.to_string()))
}

fn extract_links(html: &str) -> Vec<String> {
    static HREF: once_cell::sync::Lazy<Regex> =
        once_cell::sync::Lazy::new(|| Regex::new(r#"href\s*=\s*"([^"]+)""#).unwrap());
    HREF.captures_iter(html)
        .map(|cap| cap[1].to_string())
        .filter(|href| href.starts_with("http://") || href.starts_with("https://"))
        .unique()
        .collect()
}
