use crate::error::IndexError;
use crate::keys::{extract_batch, KeyFn};
use crate::scan::{LineScanner, ScannedLine};
use log::debug;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

const DEFAULT_BATCH_LINES: usize = 4096;

/// Builds an (unsorted) index file over a line-oriented data file.
///
/// The input is streamed once; for every key the key function emits, one
/// `key \t start \t end` line is written to the index file, in production
/// order. Sorting is a separate step, see [`crate::sort`].
pub struct IndexBuilder {
    input: PathBuf,
    thread_cap: Option<usize>,
    batch_lines: usize,
}

impl IndexBuilder {
    pub fn new(input: impl Into<PathBuf>) -> IndexBuilder {
        IndexBuilder {
            input: input.into(),
            thread_cap: None,
            batch_lines: DEFAULT_BATCH_LINES,
        }
    }

    /// Cap the key-extraction worker pool. Defaults to the smaller of the
    /// available parallelism and 8; `LINE_INDEX_THREADS` overrides that.
    pub fn index_threads(mut self, n: usize) -> IndexBuilder {
        self.thread_cap = Some(n.max(1));
        self
    }

    /// How many scanned lines to hand to the worker pool at a time.
    pub fn batch_lines(mut self, n: usize) -> IndexBuilder {
        self.batch_lines = n.max(1);
        self
    }

    /// Stream the input file and write the index file. Aborts on the first
    /// I/O or key-function error; the index file is truncated up front, so a
    /// failed build leaves no usable index behind.
    pub fn build(&self, index_path: impl AsRef<Path>, key_fn: &dyn KeyFn) -> Result<(), IndexError> {
        let index_path = index_path.as_ref();
        let started = Instant::now();
        let mut scanner = LineScanner::open(&self.input)?;
        let mut out = BufWriter::new(File::create(index_path)?);

        let avail = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        let default_cap = std::cmp::min(avail, 8).max(1);
        let env_cap = std::env::var("LINE_INDEX_THREADS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .map(|n| n.max(1));
        let cap = self
            .thread_cap
            .or(env_cap)
            .unwrap_or(default_cap)
            .min(avail)
            .max(1);
        // fall back to the global pool if a dedicated one can't be spawned
        let pool = rayon::ThreadPoolBuilder::new().num_threads(cap).build().ok();

        let mut batch: Vec<ScannedLine> = Vec::with_capacity(self.batch_lines);
        let mut lines: u64 = 0;
        let mut entries: u64 = 0;
        loop {
            batch.clear();
            for item in scanner.by_ref() {
                batch.push(item?);
                if batch.len() >= self.batch_lines {
                    break;
                }
            }
            if batch.is_empty() {
                break;
            }
            lines += batch.len() as u64;
            let extracted = extract_batch(pool.as_ref(), &batch, key_fn);
            for (line, keys) in batch.iter().zip(extracted) {
                for key in keys.map_err(IndexError::KeyFn)? {
                    debug_assert!(
                        !key.contains('\t') && !key.contains('\n') && !key.contains('\r'),
                        "index keys must not contain the field delimiter or a line terminator"
                    );
                    writeln!(out, "{}\t{}\t{}", key, line.start, line.end)?;
                    entries += 1;
                }
            }
        }
        out.flush()?;
        debug!(
            "indexed {} lines into {} entries at {} in {:?}",
            lines,
            entries,
            index_path.display(),
            started.elapsed()
        );
        Ok(())
    }
}
