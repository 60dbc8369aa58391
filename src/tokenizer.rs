//! Tokenizer (spec.md §4.1/§4.4): composes the [`crate::charmap`] fold with
//! word-boundary splitting to turn raw text into an ordered stream of
//! normalized words and their positions.

use crate::charmap;

/// Minimum surviving word length, inclusive.
const MIN_WORD_LEN: usize = 2;
/// Maximum surviving word length, exclusive.
const MAX_WORD_LEN: usize = 40;

/// Fold `text` through the charmap, split on empty-fold boundaries, and
/// return the surviving words in order. A word's position is its zero-based
/// ordinal among the words that survive -- not its ordinal among all
/// candidate segments.
pub fn tokenize(text: &str) -> Vec<(String, usize)> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut position = 0usize;

    for c in text.chars() {
        let folded = charmap::fold(c);
        if folded.is_empty() {
            flush_word(&mut current, &mut words, &mut position);
        } else {
            current.push_str(folded.as_ref());
        }
    }
    flush_word(&mut current, &mut words, &mut position);

    words
}

fn flush_word(current: &mut String, words: &mut Vec<(String, usize)>, position: &mut usize) {
    if current.is_empty() {
        return;
    }
    if current.len() >= MIN_WORD_LEN && current.len() < MAX_WORD_LEN {
        words.push((std::mem::take(current), *position));
        *position += 1;
    } else {
        current.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words_only(text: &str) -> Vec<String> {
        tokenize(text).into_iter().map(|(w, _)| w).collect()
    }

    #[test]
    fn accented_french_folds_and_splits() {
        assert_eq!(words_only("\u{c9}t\u{e9} \u{c7}a"), vec!["ete", "ca"]);
    }

    #[test]
    fn single_char_word_is_dropped() {
        assert_eq!(words_only("a"), Vec::<String>::new());
    }

    #[test]
    fn forty_char_word_is_dropped() {
        let word = "a".repeat(40);
        assert_eq!(words_only(&word), Vec::<String>::new());
    }

    #[test]
    fn thirty_nine_char_word_survives() {
        let word = "a".repeat(39);
        assert_eq!(words_only(&word), vec![word]);
    }

    #[test]
    fn underscore_identifier_survives_unchanged() {
        assert_eq!(words_only("_foo_1"), vec!["_foo_1"]);
    }

    #[test]
    fn positions_count_only_surviving_words() {
        // "a" is dropped (too short), so "brown" is position 2, not 3.
        let toks = tokenize("the quick a brown fox");
        let positions: Vec<usize> = toks.iter().map(|(_, p)| *p).collect();
        assert_eq!(positions, vec![0, 1, 2, 3]);
    }

    #[test]
    fn four_word_sentence_positions() {
        let toks = tokenize("the quick brown fox");
        assert_eq!(
            toks,
            vec![
                ("the".to_string(), 0),
                ("quick".to_string(), 1),
                ("brown".to_string(), 2),
                ("fox".to_string(), 3),
            ]
        );
    }
}
