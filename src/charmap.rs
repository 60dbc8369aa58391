//! Unicode -> ASCII fold table (spec.md §4.1).
//!
//! Every code point in U+0000..U+FFFF is transliterated to ASCII with
//! `deunicode`, then filtered down to lowercase letters, digits and `_`
//! (uppercase letters are folded to lowercase, everything else is dropped).
//! This mirrors the original `charmap_gen.py`, which ran `unidecode` once per
//! code point at build time to generate a C array; here the table is built
//! once per process with `once_cell::sync::Lazy` instead.

use once_cell::sync::Lazy;
use std::borrow::Cow;
use std::char;

const TABLE_SIZE: usize = 0x10000;

static CHARMAP: Lazy<Vec<Box<str>>> = Lazy::new(build_charmap);

fn fold_to_ascii(c: char) -> String {
    let translit = deunicode::deunicode_char(c).unwrap_or("");
    let mut out = String::with_capacity(translit.len());
    for tc in translit.chars() {
        if tc.is_ascii_lowercase() || tc.is_ascii_digit() || tc == '_' {
            out.push(tc);
        } else if tc.is_ascii_uppercase() {
            out.push(tc.to_ascii_lowercase());
        }
        // anything else (punctuation, whitespace, symbols) is a boundary
        // and does not survive into the fold.
    }
    out
}

fn build_charmap() -> Vec<Box<str>> {
    (0..TABLE_SIZE as u32)
        .map(|cp| match char::from_u32(cp) {
            Some(c) => fold_to_ascii(c).into_boxed_str(),
            // surrogate range, not a valid scalar value on its own
            None => String::new().into_boxed_str(),
        })
        .collect()
}

/// Fold a single code point to its ASCII replacement. Code points in the
/// Basic Multilingual Plane are served from the precomputed table; anything
/// beyond U+FFFF (outside the table's coverage, see spec's Open Questions)
/// is folded on demand.
pub fn fold(c: char) -> Cow<'static, str> {
    let cp = c as u32;
    if (cp as usize) < TABLE_SIZE {
        Cow::Borrowed(&CHARMAP[cp as usize])
    } else {
        Cow::Owned(fold_to_ascii(c))
    }
}
