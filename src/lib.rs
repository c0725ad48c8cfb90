//! Sorted on-disk secondary index over line-oriented data files.
//!
//! For data files too large or too inconvenient to load into a database:
//! build a `key \t start \t end` index once, sort it, then answer exact and
//! prefix lookups by seeking instead of scanning.

pub mod blocks;
pub mod build;
pub mod error;
pub mod keys;
pub mod scan;
pub mod search;
pub mod sort;
pub mod types;

pub use crate::blocks::{BlockIter, RecordReader};
pub use crate::build::IndexBuilder;
pub use crate::error::IndexError;
pub use crate::keys::{FieldKey, KeyFn};
pub use crate::scan::{LineScanner, ScannedLine};
pub use crate::search::{ExactMatch, KeyMatch, PrefixMatch, Searcher, STREAM_THRESHOLD};
pub use crate::sort::{CommandSorter, IndexSorter, InMemorySorter};
pub use crate::types::{IndexBlock, IndexEntry};

use std::path::Path;

/// Build an unsorted index for `input` at `index`, one entry per key the key
/// function emits, in scan order.
pub fn build_index(
    input: impl AsRef<Path>,
    index: impl AsRef<Path>,
    key_fn: &dyn KeyFn,
) -> Result<(), IndexError> {
    IndexBuilder::new(input.as_ref()).build(index, key_fn)
}

/// Sort an index file in place (in memory, via temp file + atomic rename).
pub fn sort_index(index: impl AsRef<Path>) -> Result<(), IndexError> {
    InMemorySorter.sort_file(index.as_ref())
}

/// Convenience one-shot: build the index and sort it.
pub fn index_file(
    input: impl AsRef<Path>,
    index: impl AsRef<Path>,
    key_fn: &dyn KeyFn,
) -> Result<(), IndexError> {
    build_index(&input, &index, key_fn)?;
    sort_index(&index)
}

/// Lazily group a sorted index file into per-key blocks.
pub fn index_blocks(index: impl AsRef<Path>) -> Result<BlockIter, IndexError> {
    BlockIter::open(index)
}

/// For each block of a sorted index file, extract the original records its
/// entries point at, lazily, one `Vec` of records per key.
pub fn records_via_index(
    data: impl AsRef<Path>,
    index: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<Vec<String>, IndexError>>, IndexError> {
    let mut reader = RecordReader::open(data)?;
    let blocks = BlockIter::open(index)?;
    Ok(blocks.map(move |block| block.and_then(|b| reader.records(&b))))
}

/// All entries whose key equals `term`.
pub fn search_exact(index: impl AsRef<Path>, term: &str) -> Result<Vec<IndexEntry>, IndexError> {
    Searcher::new(index.as_ref()).search_exact(term)
}

/// All entries whose key starts with `term`.
pub fn search_prefix(index: impl AsRef<Path>, term: &str) -> Result<Vec<IndexEntry>, IndexError> {
    Searcher::new(index.as_ref()).search_prefix(term)
}
