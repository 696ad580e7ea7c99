use arrayvec::ArrayString;

use crate::{
    constants::{MAX_BYTES_PER_LEAF, MIN_BYTES_PER_LEAF},
    tree::TextSummary,
};

/// Chunk is the fixed capacity, stack allocated text stored in a single leaf of the tree. The
/// buffer is a `str`, so a chunk never ends in the middle of a multi-byte char and every leaf
/// boundary in the tree is also a char boundary.
#[derive(Debug, Default, Clone)]
pub(crate) struct Chunk {
    buf: ArrayString<MAX_BYTES_PER_LEAF>,
}

impl Chunk {
    pub fn new(s: &str) -> Self {
        let buf = ArrayString::from(s).expect("text is split to fit in a chunk before this call");
        Self { buf }
    }

    pub fn as_str(&self) -> &str {
        self.buf.as_str()
    }

    pub fn len_bytes(&self) -> usize {
        self.buf.len()
    }

    pub fn summary(&self) -> TextSummary {
        TextSummary::from(self.as_str())
    }

    /// An underfull chunk must share bytes with a sibling unless it is the only leaf in the tree.
    pub fn is_underfull(&self) -> bool {
        self.len_bytes() < MIN_BYTES_PER_LEAF
    }

    /// Byte offset of the char at `char_idx`, or the chunk length if there is no such char.
    pub fn char_to_byte(&self, char_idx: usize) -> usize {
        self.buf
            .char_indices()
            .nth(char_idx)
            .map_or(self.len_bytes(), |(byte_idx, _)| byte_idx)
    }

    pub fn byte_to_char(&self, byte_idx: usize) -> usize {
        count_chars(&self.buf.as_bytes()[..byte_idx])
    }

    pub fn newlines_before(&self, byte_idx: usize) -> usize {
        count_newlines(&self.buf.as_bytes()[..byte_idx])
    }

    /// Byte offset just past the `n`-th (zero based) newline in this chunk.
    pub fn newline_end(&self, n: usize) -> Option<usize> {
        self.buf
            .bytes()
            .enumerate()
            .filter(|&(_, b)| b == b'\n')
            .nth(n)
            .map(|(byte_idx, _)| byte_idx + 1)
    }

    /// Removes the char starting at `byte_idx`.
    pub fn remove_char(&mut self, byte_idx: usize) -> char {
        self.buf.remove(byte_idx)
    }

    /// Inserts `ch` at `byte_idx`. If the chunk has no room left, the text is split near its
    /// midpoint and the right half is returned so the caller can link it in as a new leaf.
    pub fn insert_char(&mut self, byte_idx: usize, ch: char) -> Option<Chunk> {
        let (prefix, suffix) = self.buf.split_at(byte_idx);

        if ch.len_utf8() <= self.buf.remaining_capacity() {
            let mut edited = ArrayString::new();
            edited.push_str(prefix);
            edited.push(ch);
            edited.push_str(suffix);
            self.buf = edited;
            return None;
        }

        let mut combined = String::with_capacity(self.len_bytes() + ch.len_utf8());
        combined.push_str(prefix);
        combined.push(ch);
        combined.push_str(suffix);

        let (left, right) = split_str_at_utf8_boundary(&combined, combined.len() / 2);
        *self = Chunk::new(left);
        Some(Chunk::new(right))
    }

    /// Moves all of `right` into `self` if it fits and returns true, in which case `right` is left
    /// empty. Otherwise the bytes of both chunks are split evenly between them and false is
    /// returned.
    pub fn merge_or_redistribute(&mut self, right: &mut Chunk) -> bool {
        if self.buf.try_push_str(right.as_str()).is_ok() {
            right.buf.clear();
            return true;
        }

        let mut combined = String::with_capacity(self.len_bytes() + right.len_bytes());
        combined.push_str(self.as_str());
        combined.push_str(right.as_str());

        let (left_text, right_text) = split_str_at_utf8_boundary(&combined, combined.len() / 2);
        *self = Chunk::new(left_text);
        *right = Chunk::new(right_text);
        false
    }
}

impl std::fmt::Display for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.as_str().fmt(f)
    }
}

pub(crate) fn is_continuation_byte(b: u8) -> bool {
    (b & 0b1100_0000) == 0b1000_0000
}

pub(crate) fn count_chars(bytes: &[u8]) -> usize {
    bytes.iter().filter(|&&b| !is_continuation_byte(b)).count()
}

pub(crate) fn count_newlines(bytes: &[u8]) -> usize {
    bytes.iter().filter(|&&b| b == b'\n').count()
}

/// Number of bytes in the utf-8 encoding of the char starting with `lead`.
pub(crate) fn utf8_width(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        _ => 4,
    }
}

pub(crate) fn split_str_at_utf8_boundary(s: &str, byte_idx: usize) -> (&str, &str) {
    if byte_idx >= s.len() {
        (s, "")
    } else {
        // utf-8 code points are max 4 bytes, so we only need to check last 4 bytes or fewer if the
        // string is smaller than 4 bytes
        let start = byte_idx.saturating_sub(3);
        for candidate in (start..=byte_idx).rev() {
            if s.is_char_boundary(candidate) {
                return s.split_at(candidate);
            }
        }
        unreachable!("s was not a valid utf-8 string")
    }
}
