use std::{io, iter::FusedIterator};

use crate::{
    chunk::{is_continuation_byte, utf8_width},
    tree::{NodeId, Tree},
};

/// Reads the bytes of a tree from a starting position to the end of the text, one leaf at a
/// time. Implements [`io::Read`] and [`io::BufRead`].
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    tree: &'a Tree,
    leaf: Option<NodeId>,
    offset: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(tree: &'a Tree, leaf: Option<NodeId>, offset: usize) -> Self {
        Self { tree, leaf, offset }
    }

    pub fn next_byte(&mut self) -> Option<u8> {
        let b = *self.remaining().first()?;
        self.offset += 1;
        Some(b)
    }

    /// Unread bytes of the current leaf. Moves on to the next non-empty leaf when the current one
    /// is used up, and returns an empty slice at the end of the text.
    fn remaining(&mut self) -> &'a [u8] {
        while let Some(leaf) = self.leaf {
            let text = self.tree.leaf_text(leaf).as_bytes();
            if self.offset < text.len() {
                return &text[self.offset..];
            }
            self.leaf = self.tree.next_leaf(leaf);
            self.offset = 0;
        }
        &[]
    }
}

impl io::Read for Cursor<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut written = 0;
        while written < buf.len() {
            let src = self.remaining();
            if src.is_empty() {
                break;
            }
            let n = src.len().min(buf.len() - written);
            buf[written..written + n].copy_from_slice(&src[..n]);
            self.offset += n;
            written += n;
        }
        Ok(written)
    }
}

impl io::BufRead for Cursor<'_> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        Ok(self.remaining())
    }

    fn consume(&mut self, amt: usize) {
        self.offset += amt;
    }
}

/// Reads the bytes before a starting position in reverse order, ending with the first byte of
/// the text.
#[derive(Debug, Clone)]
pub struct ReverseCursor<'a> {
    tree: &'a Tree,
    leaf: Option<NodeId>,
    // number of unread bytes at the start of the current leaf
    offset: usize,
}

impl<'a> ReverseCursor<'a> {
    pub(crate) fn new(tree: &'a Tree, leaf: Option<NodeId>, offset: usize) -> Self {
        Self { tree, leaf, offset }
    }

    pub fn next_byte(&mut self) -> Option<u8> {
        let b = *self.remaining().last()?;
        self.offset -= 1;
        Some(b)
    }

    fn remaining(&mut self) -> &'a [u8] {
        while let Some(leaf) = self.leaf {
            if self.offset > 0 {
                return &self.tree.leaf_text(leaf).as_bytes()[..self.offset];
            }
            self.leaf = self.tree.prev_leaf(leaf);
            self.offset = self.leaf.map_or(0, |prev| self.tree.leaf_text(prev).len());
        }
        &[]
    }
}

impl io::Read for ReverseCursor<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut written = 0;
        while written < buf.len() {
            let src = self.remaining();
            if src.is_empty() {
                break;
            }
            let n = src.len().min(buf.len() - written);
            let dst = &mut buf[written..written + n];
            for (dst, &b) in dst.iter_mut().zip(src[src.len() - n..].iter().rev()) {
                *dst = b;
            }
            self.offset -= n;
            written += n;
        }
        Ok(written)
    }
}

/// Iterates over the chars of a tree from a starting position to the end of the text.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    cursor: Cursor<'a>,
    position: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(cursor: Cursor<'a>, position: usize) -> Self {
        Self { cursor, position }
    }

    /// Position of the next char this reader returns.
    pub fn position(&self) -> usize {
        self.position
    }
}

impl Iterator for Reader<'_> {
    type Item = char;

    fn next(&mut self) -> Option<Self::Item> {
        // chars never straddle two leaves
        let bytes = self.cursor.remaining();
        let &lead = bytes.first()?;
        let width = utf8_width(lead);
        let ch = decode_char(&bytes[..width]);
        self.cursor.offset += width;
        self.position += 1;
        Some(ch)
    }
}

impl FusedIterator for Reader<'_> {}

/// Iterates over the chars before a starting position, nearest first.
#[derive(Debug, Clone)]
pub struct ReverseReader<'a> {
    cursor: ReverseCursor<'a>,
    position: usize,
}

impl<'a> ReverseReader<'a> {
    pub(crate) fn new(cursor: ReverseCursor<'a>, position: usize) -> Self {
        Self { cursor, position }
    }

    /// Position of the char returned last, or of the starting position before the first call to
    /// `next`. Every char this reader still returns is before this position.
    pub fn position(&self) -> usize {
        self.position
    }
}

impl Iterator for ReverseReader<'_> {
    type Item = char;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.cursor.remaining();
        let start = bytes.iter().rposition(|&b| !is_continuation_byte(b))?;
        let ch = decode_char(&bytes[start..]);
        self.cursor.offset = start;
        self.position -= 1;
        Some(ch)
    }
}

impl FusedIterator for ReverseReader<'_> {}

fn decode_char(bytes: &[u8]) -> char {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.chars().next())
        .expect("leaves only hold whole utf-8 chars")
}

/// Iterates over the text of each leaf, in document order.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    tree: &'a Tree,
    leaf: Option<NodeId>,
}

impl<'a> Chunks<'a> {
    pub(crate) fn new(tree: &'a Tree, leaf: Option<NodeId>) -> Self {
        Self { tree, leaf }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let leaf = self.leaf?;
        self.leaf = self.tree.next_leaf(leaf);
        Some(self.tree.leaf_text(leaf))
    }
}

impl FusedIterator for Chunks<'_> {}
