//! Substring search over byte streams and trees, using Knuth-Morris-Pratt on the utf-8 bytes of
//! the query. Utf-8 is self-synchronizing, so a byte level match of a valid query inside valid
//! text always starts and ends on char boundaries.

use std::io::{self, BufReader, Read};

use crate::{
    chunk::{count_chars, is_continuation_byte},
    Tree,
};

/// Returns the char offset, counted from the start of `reader`, of the first occurrence of
/// `query`. An empty query is never found.
pub fn search(query: &str, reader: impl Read) -> io::Result<Option<usize>> {
    if query.is_empty() {
        return Ok(None);
    }

    let mut matcher = Matcher::new(query.as_bytes().to_vec());
    let mut chars_seen = 0;
    for b in BufReader::new(reader).bytes() {
        let b = b?;
        if !is_continuation_byte(b) {
            chars_seen += 1;
        }
        if matcher.push(b) {
            return Ok(Some(chars_seen - count_chars(query.as_bytes())));
        }
    }
    Ok(None)
}

/// Position of the first occurrence of `query` that starts at or after `pos`.
pub fn search_forward(tree: &Tree, pos: usize, query: &str) -> Option<usize> {
    if query.is_empty() {
        return None;
    }

    let mut matcher = Matcher::new(query.as_bytes().to_vec());
    let mut cursor = tree.cursor_at_position(pos);
    let mut chars_seen = 0;
    while let Some(b) = cursor.next_byte() {
        if !is_continuation_byte(b) {
            chars_seen += 1;
        }
        if matcher.push(b) {
            return Some(pos + chars_seen - count_chars(query.as_bytes()));
        }
    }
    None
}

/// Position of the last occurrence of `query` that ends at or before `pos`.
pub fn search_backward(tree: &Tree, pos: usize, query: &str) -> Option<usize> {
    if query.is_empty() {
        return None;
    }

    let pos = pos.min(tree.len_chars());
    let mut matcher = Matcher::new(query.bytes().rev().collect());
    let mut cursor = tree.reverse_cursor_at_position(pos);
    let mut chars_seen = 0;
    while let Some(b) = cursor.next_byte() {
        if !is_continuation_byte(b) {
            chars_seen += 1;
        }
        // the last byte of a reversed match is the lead byte of the query's first char
        if matcher.push(b) {
            return Some(pos - chars_seen);
        }
    }
    None
}

/// Builds the Knuth-Morris-Pratt prefix table of `pattern`: entry `i` is the length of the longest
/// proper prefix of `pattern[..=i]` that is also a suffix of it, counted in bytes.
pub fn build_prefix_table(pattern: &str) -> Vec<usize> {
    prefix_table(pattern.as_bytes())
}

fn prefix_table(pattern: &[u8]) -> Vec<usize> {
    let mut table = vec![0; pattern.len()];
    let mut prefix_len = 0;
    for i in 1..pattern.len() {
        while prefix_len > 0 && pattern[i] != pattern[prefix_len] {
            prefix_len = table[prefix_len - 1];
        }
        if pattern[i] == pattern[prefix_len] {
            prefix_len += 1;
        }
        table[i] = prefix_len;
    }
    table
}

/// Incremental matcher that is fed one byte at a time.
struct Matcher {
    pattern: Vec<u8>,
    prefix_table: Vec<usize>,
    matched: usize,
}

impl Matcher {
    fn new(pattern: Vec<u8>) -> Self {
        debug_assert!(!pattern.is_empty(), "cannot match an empty pattern");
        let prefix_table = prefix_table(&pattern);
        Self {
            pattern,
            prefix_table,
            matched: 0,
        }
    }

    /// Returns true if `b` completes an occurrence of the pattern.
    fn push(&mut self, b: u8) -> bool {
        while self.matched > 0 && self.pattern[self.matched] != b {
            self.matched = self.prefix_table[self.matched - 1];
        }
        if self.pattern[self.matched] == b {
            self.matched += 1;
        }
        if self.matched == self.pattern.len() {
            self.matched = self.prefix_table[self.matched - 1];
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_test_cases() -> Vec<(&'static str, &'static str, String, Option<usize>)> {
        vec![
            ("empty string, empty query", "", String::new(), None),
            ("empty string, non-empty query", "abc", String::new(), None),
            ("non-empty string, empty query", "", "abc".to_string(), None),
            ("single char, not found", "x", "abcd".to_string(), None),
            ("single char at beginning", "x", "xabcd".to_string(), Some(0)),
            ("single char in middle", "a", "xyzabc".to_string(), Some(3)),
            ("single char at end", "x", "abcdx".to_string(), Some(4)),
            ("exact match", "abcd1234", "abcd1234".to_string(), Some(0)),
            (
                "repeating prefix",
                "ababababa",
                "xxxxxxxxabcababcababababayyyyyyy".to_string(),
                Some(16),
            ),
            (
                "long string",
                "abcabba",
                format!("{}abcabba{}", "x".repeat(512), "y".repeat(1024)),
                Some(512),
            ),
            (
                "multi-byte unicode",
                "丅丆",
                "丂丄丅丆丏 ¢ह€한".to_string(),
                Some(2),
            ),
        ]
    }

    /// Hands out a single byte per call and reports an interruption before every byte.
    struct TrickleReader<'a> {
        bytes: &'a [u8],
        interrupt: bool,
    }

    impl Read for TrickleReader<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(io::ErrorKind::Interrupted.into());
            }
            match (self.bytes.split_first(), buf.first_mut()) {
                (Some((&b, rest)), Some(slot)) => {
                    *slot = b;
                    self.bytes = rest;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    #[test]
    fn test_build_prefix_table() {
        let test_cases: [(&str, &[usize]); 5] = [
            ("", &[]),
            ("a", &[0]),
            ("abcdef", &[0, 0, 0, 0, 0, 0]),
            ("ababababca", &[0, 0, 1, 2, 3, 4, 5, 6, 0, 1]),
            (
                "ababbabbabbababbabb",
                &[0, 0, 1, 2, 0, 1, 2, 0, 1, 2, 0, 1, 2, 3, 4, 5, 6, 7, 8],
            ),
        ];
        for (pattern, expected) in test_cases {
            assert_eq!(build_prefix_table(pattern), expected, "{pattern:?}");
        }
    }

    #[test]
    fn test_search() {
        for (name, query, text, expected) in search_test_cases() {
            let found = search(query, text.as_bytes()).expect("slices never fail to read");
            assert_eq!(found, expected, "{name}");
        }
    }

    #[test]
    fn test_search_with_trickling_reader() {
        for (name, query, text, expected) in search_test_cases() {
            let reader = TrickleReader {
                bytes: text.as_bytes(),
                interrupt: false,
            };
            let found = search(query, reader).expect("interruptions are retried");
            assert_eq!(found, expected, "{name}");
        }
    }

    #[test]
    fn test_search_propagates_read_errors() {
        struct BrokenReader;
        impl Read for BrokenReader {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::ErrorKind::BrokenPipe.into())
            }
        }
        let err = search("abc", BrokenReader).expect_err("reader always fails");
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_search_tree() {
        for (name, query, text, expected) in search_test_cases() {
            let tree = Tree::from(text.as_str());
            assert_eq!(search_forward(&tree, 0, query), expected, "{name}");
        }
    }

    #[test]
    fn test_search_forward_from_position() {
        let tree = Tree::from("abc £bc abc £bc");
        assert_eq!(search_forward(&tree, 0, "abc"), Some(0));
        assert_eq!(search_forward(&tree, 1, "abc"), Some(8));
        assert_eq!(search_forward(&tree, 9, "abc"), None);
        assert_eq!(search_forward(&tree, 0, "£bc"), Some(4));
        assert_eq!(search_forward(&tree, 5, "£bc"), Some(12));
        assert_eq!(search_forward(&tree, 100, "abc"), None);
    }

    #[test]
    fn test_search_backward_from_position() {
        let tree = Tree::from("abc £bc abc £bc");
        assert_eq!(search_backward(&tree, 15, "abc"), Some(8));
        assert_eq!(search_backward(&tree, 10, "abc"), Some(0));
        assert_eq!(search_backward(&tree, 3, "abc"), Some(0));
        assert_eq!(search_backward(&tree, 2, "abc"), None);
        assert_eq!(search_backward(&tree, 100, "£bc"), Some(12));
        assert_eq!(search_backward(&tree, 12, "£bc"), Some(4));
        assert_eq!(search_backward(&tree, 15, ""), None);
    }

    #[test]
    fn test_search_across_leaves() {
        let text = format!("{}丅丆{}丅丆{}", "丂".repeat(300), "x".repeat(300), "y".repeat(50));
        let tree = Tree::from(text.as_str());
        assert_eq!(search_forward(&tree, 0, "丅丆"), Some(300));
        assert_eq!(search_forward(&tree, 301, "丅丆"), Some(602));
        assert_eq!(search_backward(&tree, tree.len_chars(), "丅丆"), Some(602));
        assert_eq!(search_backward(&tree, 603, "丅丆"), Some(300));
    }
}
