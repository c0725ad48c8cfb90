use crate::error::IndexError;
use crate::types::{IndexBlock, IndexEntry};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Lazily groups a *sorted* index file into [`IndexBlock`]s.
///
/// Grouping only compares each entry's key against the previous one, so it is
/// correct purely because sorting made duplicate keys adjacent; the iterator
/// never re-sorts. Blocks come out in ascending key order; entries within a
/// block keep whatever tie order the sort produced.
///
/// A malformed line surfaces as `Err(IndexError::Parse)` and ends the
/// iteration.
pub struct BlockIter {
    lines: io::Lines<BufReader<File>>,
    pending: Option<IndexEntry>,
    done: bool,
}

impl BlockIter {
    pub fn open(path: impl AsRef<Path>) -> Result<BlockIter, IndexError> {
        Ok(BlockIter {
            lines: BufReader::new(File::open(path)?).lines(),
            pending: None,
            done: false,
        })
    }

    fn next_entry(&mut self) -> Result<Option<IndexEntry>, IndexError> {
        match self.lines.next() {
            None => Ok(None),
            Some(Err(e)) => Err(e.into()),
            Some(Ok(line)) => IndexEntry::parse(&line).map(Some),
        }
    }
}

impl Iterator for BlockIter {
    type Item = Result<IndexBlock, IndexError>;

    fn next(&mut self) -> Option<Result<IndexBlock, IndexError>> {
        if self.done {
            return None;
        }
        let first = match self.pending.take() {
            Some(entry) => entry,
            None => match self.next_entry() {
                Ok(Some(entry)) => entry,
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            },
        };
        let mut block = IndexBlock {
            key: first.key.clone(),
            entries: vec![first],
        };
        loop {
            match self.next_entry() {
                Ok(Some(entry)) => {
                    if entry.key == block.key {
                        block.entries.push(entry);
                    } else {
                        self.pending = Some(entry);
                        break;
                    }
                }
                Ok(None) => {
                    self.done = true;
                    break;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        Some(Ok(block))
    }
}

/// Extracts original records from the data file via index entry offsets.
///
/// Each lookup seeks to `start` and reads exactly `end - start` bytes, so the
/// data file must be the one the index was built against; an entry reaching
/// past the current file length fails with [`IndexError::Stale`] and is never
/// retried.
pub struct RecordReader {
    file: File,
    len: u64,
}

impl RecordReader {
    pub fn open(path: impl AsRef<Path>) -> Result<RecordReader, IndexError> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(RecordReader { file, len })
    }

    /// Decode the single record an entry points at, with its line terminator
    /// trimmed so the result equals the original line text.
    pub fn record(&mut self, entry: &IndexEntry) -> Result<String, IndexError> {
        if entry.end > self.len || entry.start >= entry.end {
            return Err(IndexError::Stale {
                start: entry.start,
                end: entry.end,
                file_len: self.len,
            });
        }
        self.file.seek(SeekFrom::Start(entry.start))?;
        let mut buf = vec![0u8; (entry.end - entry.start) as usize];
        self.file.read_exact(&mut buf).map_err(|e| {
            // the file shrank underneath us after open
            if e.kind() == io::ErrorKind::UnexpectedEof {
                IndexError::Stale {
                    start: entry.start,
                    end: entry.end,
                    file_len: self.len,
                }
            } else {
                IndexError::Io(e)
            }
        })?;
        let mut text = String::from_utf8_lossy(&buf).into_owned();
        if text.ends_with('\n') {
            text.pop();
            if text.ends_with('\r') {
                text.pop();
            }
        }
        Ok(text)
    }

    /// One record per entry in the block, in the block's entry order.
    pub fn records(&mut self, block: &IndexBlock) -> Result<Vec<String>, IndexError> {
        let mut out = Vec::with_capacity(block.entries.len());
        for entry in &block.entries {
            out.push(self.record(entry)?);
        }
        Ok(out)
    }
}
