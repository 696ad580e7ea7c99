use std::fmt;

use arrayvec::ArrayVec;

use crate::{
    chunk::{count_chars, count_newlines, split_str_at_utf8_boundary, Chunk},
    constants::{MAX_BYTES_PER_LEAF, MAX_CHILDREN, MIN_CHILDREN},
    cursor::{Chunks, Cursor, Reader, ReverseCursor, ReverseReader},
};

/// A B+-like tree of utf-8 text chunks. Internal nodes cache the byte, char and newline counts of
/// their subtrees, which gives O(log n) lookups by char position and by line number as well as
/// O(log n) single char edits.
///
/// Nodes live in an arena owned by the tree and refer to each other by index. Each node knows its
/// parent, so cursors can walk from one leaf to the next in either direction and edits can
/// refresh the cached counts of every ancestor without a second descent from the root.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    free_list: Vec<NodeId>,
    root: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in self.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}

impl From<&str> for Tree {
    fn from(text: &str) -> Self {
        Self::bulk_load(text)
    }
}

impl Tree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new_leaf(Chunk::default())],
            free_list: Vec::new(),
            root: NodeId(0),
        }
    }

    /// Builds a tree from `bytes` in linear time. Fails without building anything if `bytes` is
    /// not valid utf-8.
    pub fn from_utf8(bytes: &[u8]) -> Result<Self, EncodingError> {
        let text = std::str::from_utf8(bytes).map_err(EncodingError)?;
        Ok(Self::bulk_load(text))
    }

    pub fn len_bytes(&self) -> usize {
        self.root_summary().bytes
    }

    pub fn len_chars(&self) -> usize {
        self.root_summary().chars
    }

    /// Number of lines, which is always one more than the number of newlines. An empty document
    /// has a single empty line.
    pub fn len_lines(&self) -> usize {
        self.root_summary().newlines + 1
    }

    pub fn is_empty(&self) -> bool {
        self.len_bytes() == 0
    }

    /// Returns a cursor whose first byte is the first byte of the char at `pos`. The cursor is
    /// empty if `pos` is at or past the end of the text.
    pub fn cursor_at_position(&self, pos: usize) -> Cursor<'_> {
        match self.locate_char(pos) {
            Some((leaf, byte_offset)) => Cursor::new(self, Some(leaf), byte_offset),
            None => Cursor::new(self, None, 0),
        }
    }

    /// Returns a cursor at the start of line `line` (zero based). The cursor is empty if the line
    /// does not exist.
    pub fn cursor_at_line(&self, line: usize) -> Cursor<'_> {
        match self.locate_line(line) {
            Some((leaf, byte_offset, _)) => Cursor::new(self, Some(leaf), byte_offset),
            None => Cursor::new(self, None, 0),
        }
    }

    /// Returns a cursor that yields the bytes before the char at `pos` in reverse order, ending
    /// at the start of the text. Positions past the end start from the end of the text.
    pub fn reverse_cursor_at_position(&self, pos: usize) -> ReverseCursor<'_> {
        let (leaf, byte_offset) = self
            .locate_char(pos)
            .unwrap_or_else(|| self.end_of_text());
        ReverseCursor::new(self, Some(leaf), byte_offset)
    }

    pub fn reader_at_position(&self, pos: usize) -> Reader<'_> {
        Reader::new(self.cursor_at_position(pos), pos.min(self.len_chars()))
    }

    pub fn reverse_reader_at_position(&self, pos: usize) -> ReverseReader<'_> {
        ReverseReader::new(
            self.reverse_cursor_at_position(pos),
            pos.min(self.len_chars()),
        )
    }

    /// Iterates over the text of every leaf in document order.
    pub fn chunks(&self) -> Chunks<'_> {
        Chunks::new(self, Some(self.leftmost_leaf(self.root)))
    }

    /// Position of the first char of `line`, or `len_chars()` if there is no such line.
    pub fn line_start_position(&self, line: usize) -> usize {
        self.locate_line(line)
            .map_or(self.len_chars(), |(_, _, char_pos)| char_pos)
    }

    /// Line that holds the char at `pos`. Positions past the end belong to the last line.
    pub fn line_num_for_position(&self, pos: usize) -> usize {
        if pos >= self.len_chars() {
            return self.root_summary().newlines;
        }
        let Seek {
            leaf,
            remainder: DimensionCharIdx(char_offset),
            preceding,
        } = self.seek(DimensionCharIdx(pos));
        let chunk = self.node(leaf).chunk();
        preceding.newlines + chunk.newlines_before(chunk.char_to_byte(char_offset))
    }

    /// Removes the char at `pos` and returns it. Does nothing if `pos` is past the end of the text.
    pub fn delete_at_position(&mut self, pos: usize) -> Option<char> {
        let (leaf, byte_offset) = self.locate_char(pos)?;
        let removed = self.node_mut(leaf).chunk_mut().remove_char(byte_offset);
        self.recompute_summaries_to_root(leaf);
        self.rebalance_leaf(leaf);
        Some(removed)
    }

    /// Inserts `ch` before the char at `pos`, or appends it if `pos` is the length of the text.
    /// Returns false and leaves the text unchanged if `pos` is past the end.
    pub fn insert_at_position(&mut self, pos: usize, ch: char) -> bool {
        if pos > self.len_chars() {
            log::trace!(
                "ignoring insert at {pos}, text only has {} chars",
                self.len_chars()
            );
            return false;
        }

        let (leaf, byte_offset) = self
            .locate_char(pos)
            .unwrap_or_else(|| self.end_of_text());
        let overflow = self.node_mut(leaf).chunk_mut().insert_char(byte_offset, ch);
        self.recompute_summary(leaf);

        if let Some(chunk) = overflow {
            let new_leaf = self.alloc(Node::new_leaf(chunk));
            log::trace!("split leaf {leaf:?} into new leaf {new_leaf:?}");
            self.insert_after(leaf, new_leaf);
        }
        self.recompute_summaries_to_root(leaf);
        true
    }

    pub(crate) fn leaf_text(&self, leaf: NodeId) -> &str {
        self.node(leaf).chunk().as_str()
    }

    pub(crate) fn next_leaf(&self, leaf: NodeId) -> Option<NodeId> {
        let mut node = leaf;
        while let Some(parent) = self.node(node).parent {
            let siblings = self.node(parent).children();
            let child_idx = self.child_index(parent, node);
            if let Some(&next) = siblings.get(child_idx + 1) {
                return Some(self.leftmost_leaf(next));
            }
            node = parent;
        }
        None
    }

    pub(crate) fn prev_leaf(&self, leaf: NodeId) -> Option<NodeId> {
        let mut node = leaf;
        while let Some(parent) = self.node(node).parent {
            let siblings = self.node(parent).children();
            let child_idx = self.child_index(parent, node);
            if child_idx > 0 {
                return Some(self.rightmost_leaf(siblings[child_idx - 1]));
            }
            node = parent;
        }
        None
    }

    fn bulk_load(text: &str) -> Self {
        let mut chunks = Vec::with_capacity(text.len() / MAX_BYTES_PER_LEAF + 1);
        let mut rest = text;
        while !rest.is_empty() {
            let (prefix, suffix) = split_str_at_utf8_boundary(rest, MAX_BYTES_PER_LEAF);
            chunks.push(Chunk::new(prefix));
            rest = suffix;
        }

        // all chunks but the last are (nearly) full
        if let [.., left, right] = chunks.as_mut_slice() {
            if right.is_underfull() && left.merge_or_redistribute(right) {
                chunks.pop();
            }
        }

        if chunks.is_empty() {
            return Self::new();
        }

        let num_leaves = chunks.len();
        let mut tree = Self {
            nodes: Vec::with_capacity(num_leaves + num_leaves / (MIN_CHILDREN - 1) + 1),
            free_list: Vec::new(),
            root: NodeId(0),
        };

        let mut level: Vec<NodeId> = chunks
            .into_iter()
            .map(|chunk| tree.alloc(Node::new_leaf(chunk)))
            .collect();
        let mut height = 0;
        while level.len() > 1 {
            height += 1;
            let mut nodes = level.into_iter();
            level = group_sizes(nodes.len())
                .map(|size| {
                    let children = nodes.by_ref().take(size).collect();
                    tree.new_internal(height, children)
                })
                .collect();
        }
        tree.root = level[0];

        log::debug!(
            "bulk loaded {} bytes into {num_leaves} leaves, tree height: {height}",
            text.len()
        );
        tree
    }

    fn root_summary(&self) -> &TextSummary {
        &self.node(self.root).summary
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(id) = self.free_list.pop() {
            self.nodes[id.index()] = node;
            return id;
        }
        let id = NodeId(u32::try_from(self.nodes.len()).expect("node arena outgrew u32 ids"));
        self.nodes.push(node);
        id
    }

    fn release(&mut self, id: NodeId) {
        self.nodes[id.index()] = Node::new_leaf(Chunk::default());
        self.free_list.push(id);
    }

    fn new_internal(&mut self, height: u8, children: ArrayVec<NodeId, MAX_CHILDREN>) -> NodeId {
        let id = self.alloc(Node {
            parent: None,
            summary: TextSummary::default(),
            kind: NodeKind::Internal { height, children },
        });
        self.adopt_children(id);
        self.recompute_summary(id);
        id
    }

    fn adopt_children(&mut self, id: NodeId) {
        for child_idx in 0..self.node(id).children().len() {
            let child = self.node(id).children()[child_idx];
            self.node_mut(child).parent = Some(id);
        }
    }

    fn recompute_summary(&mut self, id: NodeId) {
        let summary = match &self.node(id).kind {
            NodeKind::Leaf(chunk) => chunk.summary(),
            NodeKind::Internal { children, .. } => children
                .iter()
                .fold(TextSummary::default(), |agg, &child| {
                    agg + &self.node(child).summary
                }),
        };
        self.node_mut(id).summary = summary;
    }

    fn recompute_summaries_to_root(&mut self, id: NodeId) {
        let mut node = Some(id);
        while let Some(id) = node {
            self.recompute_summary(id);
            node = self.node(id).parent;
        }
    }

    fn child_index(&self, parent: NodeId, child: NodeId) -> usize {
        self.node(parent)
            .children()
            .iter()
            .position(|&c| c == child)
            .expect("child is listed by its parent")
    }

    /// Returns `child` and an adjacent sibling, in document order.
    fn sibling_pair(&self, parent: NodeId, child: NodeId) -> (NodeId, NodeId) {
        let siblings = self.node(parent).children();
        debug_assert!(siblings.len() >= 2, "non-root nodes always have a sibling");
        let child_idx = self.child_index(parent, child);
        if child_idx > 0 {
            (siblings[child_idx - 1], child)
        } else {
            (child, siblings[1])
        }
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        let child_idx = self.child_index(parent, child);
        self.node_mut(parent).children_mut().remove(child_idx);
    }

    fn leftmost_leaf(&self, mut node: NodeId) -> NodeId {
        while let Some(&first) = self.node(node).children().first() {
            node = first;
        }
        node
    }

    fn rightmost_leaf(&self, mut node: NodeId) -> NodeId {
        while let Some(&last) = self.node(node).children().last() {
            node = last;
        }
        node
    }

    fn end_of_text(&self) -> (NodeId, usize) {
        let leaf = self.rightmost_leaf(self.root);
        (leaf, self.node(leaf).chunk().len_bytes())
    }

    /// Leaf and byte offset of the char at `pos`, if there is one.
    fn locate_char(&self, pos: usize) -> Option<(NodeId, usize)> {
        if pos >= self.len_chars() {
            return None;
        }
        let Seek {
            leaf,
            remainder: DimensionCharIdx(char_offset),
            ..
        } = self.seek(DimensionCharIdx(pos));
        Some((leaf, self.node(leaf).chunk().char_to_byte(char_offset)))
    }

    /// Leaf, byte offset and char position where `line` starts, if the line exists.
    fn locate_line(&self, line: usize) -> Option<(NodeId, usize, usize)> {
        if line == 0 {
            return Some((self.leftmost_leaf(self.root), 0, 0));
        }
        if line > self.root_summary().newlines {
            return None;
        }

        // line N starts right after newline N - 1
        let Seek {
            leaf,
            remainder: DimensionNewlineIdx(newline_idx),
            preceding,
        } = self.seek(DimensionNewlineIdx(line - 1));
        let chunk = self.node(leaf).chunk();
        let byte_offset = chunk
            .newline_end(newline_idx)
            .expect("seek lands on the leaf holding the newline");
        Some((
            leaf,
            byte_offset,
            preceding.chars + chunk.byte_to_char(byte_offset),
        ))
    }

    /// Descends from the root to the leaf where the running sum of `D` first exceeds `target`.
    fn seek<D: Dimension>(&self, target: D) -> Seek<D> {
        debug_assert!(
            target < D::from(self.root_summary()),
            "seek target is outside bounds: {target:?} / {:?}",
            D::from(self.root_summary())
        );

        let mut node = self.root;
        let mut remainder = target;
        let mut preceding = TextSummary::default();
        while let NodeKind::Internal { children, .. } = &self.node(node).kind {
            let (child_idx, rem) = self.child_position(children, remainder);
            for &skipped in &children[..child_idx] {
                preceding += self.node(skipped).summary;
            }
            node = children[child_idx];
            remainder = rem;
        }

        Seek {
            leaf: node,
            remainder,
            preceding,
        }
    }

    /// scans `children` from left to right while the running sum of dimension is less than the
    /// passed in `seek_target`. Returns the index of the child that will cause the running sum to
    /// exceed the target and the remaining seek_target.
    fn child_position<D: Dimension>(&self, children: &[NodeId], seek_target: D) -> (usize, D) {
        let mut running_sum = D::default();
        for (child_idx, &child) in children.iter().enumerate() {
            let next_sum = running_sum + D::from(&self.node(child).summary);
            if next_sum > seek_target {
                return (child_idx, seek_target - running_sum);
            }
            running_sum = next_sum;
        }

        unreachable!("validated that seek_target is within range earlier")
    }

    fn rebalance_leaf(&mut self, leaf: NodeId) {
        let Some(parent) = self.node(leaf).parent else {
            // a root leaf may hold any number of bytes, including none
            return;
        };
        if !self.node(leaf).chunk().is_underfull() {
            return;
        }

        let (left, right) = self.sibling_pair(parent, leaf);
        let mut right_chunk = std::mem::take(self.node_mut(right).chunk_mut());
        let merged = self
            .node_mut(left)
            .chunk_mut()
            .merge_or_redistribute(&mut right_chunk);
        self.recompute_summary(left);

        if merged {
            log::trace!("merged leaf {right:?} into {left:?}");
            self.remove_child(parent, right);
            self.release(right);
            self.rebalance_internal(parent);
        } else {
            *self.node_mut(right).chunk_mut() = right_chunk;
            self.recompute_summary(right);
        }
    }

    fn rebalance_internal(&mut self, node: NodeId) {
        let Some(parent) = self.node(node).parent else {
            self.collapse_root();
            return;
        };
        if self.node(node).children().len() >= MIN_CHILDREN {
            return;
        }

        let (left, right) = self.sibling_pair(parent, node);
        let mut children: Vec<NodeId> = self.node_mut(left).children_mut().drain(..).collect();
        children.extend(self.node_mut(right).children_mut().drain(..));

        if children.len() <= MAX_CHILDREN {
            log::trace!("merged internal node {right:?} into {left:?}");
            self.node_mut(left).children_mut().extend(children);
            self.adopt_children(left);
            self.recompute_summary(left);
            self.remove_child(parent, right);
            self.release(right);
            self.rebalance_internal(parent);
        } else {
            let right_children = children.split_off(children.len() / 2);
            self.node_mut(left).children_mut().extend(children);
            self.node_mut(right).children_mut().extend(right_children);
            for id in [left, right] {
                self.adopt_children(id);
                self.recompute_summary(id);
            }
        }
    }

    fn collapse_root(&mut self) {
        loop {
            let children = self.node(self.root).children();
            if children.len() != 1 {
                return;
            }
            let only_child = children[0];
            let old_root = std::mem::replace(&mut self.root, only_child);
            self.node_mut(only_child).parent = None;
            self.release(old_root);
        }
    }

    /// Links `sibling` into the tree right after `node`, splitting full ancestors on the way up.
    /// The caller refreshes the summaries above `node` afterwards.
    fn insert_after(&mut self, node: NodeId, sibling: NodeId) {
        let Some(parent) = self.node(node).parent else {
            let height = self.node(node).height() + 1;
            self.root = self.new_internal(height, ArrayVec::from_iter([node, sibling]));
            return;
        };

        let child_idx = self.child_index(parent, node) + 1;
        let inserted = self
            .node_mut(parent)
            .children_mut()
            .try_insert(child_idx, sibling);
        let Err(err) = inserted else {
            self.node_mut(sibling).parent = Some(parent);
            self.recompute_summary(parent);
            return;
        };

        // parent is full, split it in two
        let mut children: Vec<NodeId> = self.node_mut(parent).children_mut().drain(..).collect();
        children.insert(child_idx, err.element());
        let right_children = children.split_off(children.len().div_ceil(2));
        self.node_mut(parent).children_mut().extend(children);
        self.adopt_children(parent);
        self.recompute_summary(parent);

        let height = self.node(parent).height();
        let split_node = self.new_internal(height, right_children.into_iter().collect());
        log::trace!("split internal node {parent:?} into new node {split_node:?}");
        self.insert_after(parent, split_node);
    }
}

/// Sizes of the groups `n` nodes are packed into when building a level of the tree bottom-up.
/// Uses as few groups as possible and spreads the nodes evenly, so that no group has fewer than
/// MIN_CHILDREN members.
fn group_sizes(n: usize) -> impl Iterator<Item = usize> {
    let groups = n.div_ceil(MAX_CHILDREN);
    let (base, extra) = (n / groups, n % groups);
    (0..groups).map(move |group_idx| if group_idx < extra { base + 1 } else { base })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    summary: TextSummary,
    kind: NodeKind,
}

#[derive(Debug, Clone)]
enum NodeKind {
    Leaf(Chunk),
    Internal {
        height: u8,
        children: ArrayVec<NodeId, MAX_CHILDREN>,
    },
}

impl Node {
    fn new_leaf(chunk: Chunk) -> Self {
        Self {
            parent: None,
            summary: chunk.summary(),
            kind: NodeKind::Leaf(chunk),
        }
    }

    fn height(&self) -> u8 {
        match self.kind {
            NodeKind::Leaf(_) => 0,
            NodeKind::Internal { height, .. } => height,
        }
    }

    fn children(&self) -> &[NodeId] {
        match self.kind {
            NodeKind::Leaf(_) => &[],
            NodeKind::Internal { ref children, .. } => children.as_slice(),
        }
    }

    fn children_mut(&mut self) -> &mut ArrayVec<NodeId, MAX_CHILDREN> {
        match self.kind {
            NodeKind::Leaf(_) => panic!("cannot call children_mut on leaf nodes"),
            NodeKind::Internal {
                ref mut children, ..
            } => children,
        }
    }

    fn chunk(&self) -> &Chunk {
        match self.kind {
            NodeKind::Leaf(ref chunk) => chunk,
            NodeKind::Internal { .. } => panic!("cannot call chunk on internal nodes"),
        }
    }

    fn chunk_mut(&mut self) -> &mut Chunk {
        match self.kind {
            NodeKind::Leaf(ref mut chunk) => chunk,
            NodeKind::Internal { .. } => panic!("cannot call chunk_mut on internal nodes"),
        }
    }
}

struct Seek<D> {
    leaf: NodeId,
    remainder: D,
    preceding: TextSummary,
}

/// Any type that can be used to seek to a specific leaf node via searching `TextSummary`-s.
trait Dimension:
    for<'a> From<&'a TextSummary>
    + Default
    + Clone
    + Copy
    + std::ops::Add<Output = Self>
    + std::ops::Sub<Output = Self>
    + std::cmp::Ord
    + std::fmt::Debug
{
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
struct DimensionCharIdx(usize);
impl Dimension for DimensionCharIdx {}

impl<'a> From<&'a TextSummary> for DimensionCharIdx {
    fn from(value: &'a TextSummary) -> Self {
        Self(value.chars)
    }
}
impl std::ops::Add for DimensionCharIdx {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}
impl std::ops::Sub for DimensionCharIdx {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
struct DimensionNewlineIdx(usize);
impl Dimension for DimensionNewlineIdx {}

impl<'a> From<&'a TextSummary> for DimensionNewlineIdx {
    fn from(value: &'a TextSummary) -> Self {
        Self(value.newlines)
    }
}
impl std::ops::Add for DimensionNewlineIdx {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}
impl std::ops::Sub for DimensionNewlineIdx {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TextSummary {
    pub bytes: usize,
    pub chars: usize,
    pub newlines: usize,
}

impl std::ops::Add<&TextSummary> for TextSummary {
    type Output = TextSummary;

    fn add(self, rhs: &TextSummary) -> Self::Output {
        TextSummary {
            bytes: self.bytes + rhs.bytes,
            chars: self.chars + rhs.chars,
            newlines: self.newlines + rhs.newlines,
        }
    }
}

impl std::ops::AddAssign for TextSummary {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + &rhs;
    }
}

impl<'a> From<&'a str> for TextSummary {
    fn from(value: &'a str) -> Self {
        Self {
            bytes: value.len(),
            chars: count_chars(value.as_bytes()),
            newlines: count_newlines(value.as_bytes()),
        }
    }
}

/// Returned by [`Tree::from_utf8`] when the input is not valid utf-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingError(std::str::Utf8Error);

impl EncodingError {
    /// Length of the longest valid utf-8 prefix of the rejected input.
    pub fn valid_up_to(&self) -> usize {
        self.0.valid_up_to()
    }
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "text is not valid utf-8: {}", self.0)
    }
}

impl std::error::Error for EncodingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

#[cfg(test)]
impl Tree {
    /// Checks every structural invariant of the tree and returns its height.
    pub(crate) fn assert_invariants(&self) -> u8 {
        assert_eq!(self.node(self.root).parent, None, "root has no parent");
        self.assert_node(self.root, true)
    }

    fn assert_node(&self, id: NodeId, is_root: bool) -> u8 {
        let node = self.node(id);
        match node.kind {
            NodeKind::Leaf(ref chunk) => {
                assert_eq!(node.summary, chunk.summary(), "stale leaf summary");
                assert!(chunk.len_bytes() <= MAX_BYTES_PER_LEAF);
                assert!(
                    is_root || !chunk.is_underfull(),
                    "underfull leaf with {} bytes",
                    chunk.len_bytes()
                );
                0
            }
            NodeKind::Internal {
                height,
                ref children,
            } => {
                if is_root {
                    assert!(children.len() >= 2, "internal root with a single child");
                } else {
                    assert!(
                        children.len() >= MIN_CHILDREN,
                        "internal node with {} children",
                        children.len()
                    );
                }

                let mut sum = TextSummary::default();
                for &child in children {
                    assert_eq!(self.node(child).parent, Some(id), "broken parent link");
                    assert_eq!(
                        self.assert_node(child, false) + 1,
                        height,
                        "leaves at different depths"
                    );
                    sum += self.node(child).summary;
                }
                assert_eq!(node.summary, sum, "stale internal summary");
                height
            }
        }
    }
}
