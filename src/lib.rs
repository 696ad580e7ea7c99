//! A balanced text tree for editors: a rope of small utf-8 chunks with O(log n) addressing by
//! char position and by line, in-place single char edits and forward/backward streaming reads.

mod chunk;
mod cursor;
mod tree;

pub mod config;
pub mod locate;
pub mod search;

pub use cursor::{Chunks, Cursor, Reader, ReverseCursor, ReverseReader};
pub use tree::{EncodingError, Tree};

// different constants for tests to avoid having to create huge test inputs
mod constants {
    #[cfg(test)]
    pub use debug_constants::*;

    #[cfg(not(test))]
    pub use release_constants::*;

    pub const MIN_CHILDREN: usize = TREE_BASE;
    pub const MAX_CHILDREN: usize = TREE_BASE * 2;
    pub const MIN_BYTES_PER_LEAF: usize = MAX_BYTES_PER_LEAF / 4;

    #[allow(dead_code)]
    mod debug_constants {
        pub const TREE_BASE: usize = 3;
        pub const MAX_BYTES_PER_LEAF: usize = 16;
    }

    #[allow(dead_code)]
    mod release_constants {
        pub const TREE_BASE: usize = 8;
        pub const MAX_BYTES_PER_LEAF: usize = 64;
    }
}
