use crate::error::IndexError;
use crate::types::IndexEntry;
use log::debug;
use std::cmp::Ordering;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Index files at or below this many bytes are scanned linearly instead of
/// binary-searched (1 MiB).
pub const STREAM_THRESHOLD: u64 = 1024 * 1024;

/// Decides whether an index key satisfies a search term, plus the byte-wise
/// ordering a scan over a sorted file uses to stop early.
///
/// `compare` returning `Greater` means the sorted file has moved past every
/// key this matcher could still accept for `term`.
pub trait KeyMatch {
    fn matches(&self, key: &str, term: &str) -> bool;
    fn compare(&self, key: &str, term: &str) -> Ordering;
}

/// Exact key equality.
pub struct ExactMatch;

impl KeyMatch for ExactMatch {
    fn matches(&self, key: &str, term: &str) -> bool {
        key == term
    }

    fn compare(&self, key: &str, term: &str) -> Ordering {
        key.as_bytes().cmp(term.as_bytes())
    }
}

/// Key starts with the term.
pub struct PrefixMatch;

impl KeyMatch for PrefixMatch {
    fn matches(&self, key: &str, term: &str) -> bool {
        key.as_bytes().starts_with(term.as_bytes())
    }

    /// Compares only the leading `term.len()` bytes of the key, so every key
    /// carrying the term as a prefix sits in the `Equal` band. A key that
    /// runs out before the term orders `Less`.
    fn compare(&self, key: &str, term: &str) -> Ordering {
        let key = key.as_bytes();
        let term = term.as_bytes();
        let n = key.len().min(term.len());
        match key[..n].cmp(&term[..n]) {
            Ordering::Equal if key.len() < term.len() => Ordering::Less,
            other => other,
        }
    }
}

/// Exact and prefix lookup over a sorted index file.
///
/// Small files are scanned linearly. Larger ones are bisected over raw byte
/// offsets with line-boundary recovery, narrowing until the remaining window
/// fits the streaming threshold; the result is required to equal what a full
/// linear scan with the same matcher would return. Every search opens its own
/// handle for the duration of the call.
pub struct Searcher {
    path: PathBuf,
    threshold: u64,
}

impl Searcher {
    pub fn new(path: impl Into<PathBuf>) -> Searcher {
        Searcher {
            path: path.into(),
            threshold: STREAM_THRESHOLD,
        }
    }

    /// Override the streaming threshold in bytes. Mostly useful for forcing
    /// the bisecting path onto small files in tests.
    pub fn threshold(mut self, bytes: u64) -> Searcher {
        self.threshold = bytes.max(1);
        self
    }

    pub fn search_exact(&self, term: &str) -> Result<Vec<IndexEntry>, IndexError> {
        self.search(term, &ExactMatch)
    }

    pub fn search_prefix(&self, term: &str) -> Result<Vec<IndexEntry>, IndexError> {
        self.search(term, &PrefixMatch)
    }

    /// Threshold-accelerated lookup with an explicit matcher.
    pub fn search(&self, term: &str, matcher: &dyn KeyMatch) -> Result<Vec<IndexEntry>, IndexError> {
        let file = File::open(&self.path)?;
        let len = file.metadata()?.len();
        if len <= self.threshold {
            debug!(
                "index {} is {} bytes, under threshold, streaming",
                self.path.display(),
                len
            );
            return scan_range(file, 0, len, term, matcher);
        }
        self.bisect(file, len, term, matcher)
    }

    /// Full streaming scan of the index, the linear reference behavior the
    /// accelerated path is validated against.
    pub fn scan(&self, term: &str, matcher: &dyn KeyMatch) -> Result<Vec<IndexEntry>, IndexError> {
        let file = File::open(&self.path)?;
        let len = file.metadata()?.len();
        scan_range(file, 0, len, term, matcher)
    }

    fn bisect(
        &self,
        mut file: File,
        len: u64,
        term: &str,
        matcher: &dyn KeyMatch,
    ) -> Result<Vec<IndexEntry>, IndexError> {
        debug!(
            "bisecting {} byte index {} for {:?}",
            len,
            self.path.display(),
            term
        );
        let mut lo: u64 = 0;
        let mut hi: u64 = len;
        loop {
            if hi - lo <= self.threshold {
                let start = recover_line_start(&mut file, lo, 0)?;
                return scan_range(file, start, hi, term, matcher);
            }
            let mid = lo + (hi - lo) / 2;
            let line_start = recover_line_start(&mut file, mid, lo)?;
            let line = read_line_at(&mut file, line_start)?;
            let entry = IndexEntry::parse(&line)?;
            match matcher.compare(&entry.key, term) {
                Ordering::Greater => hi = mid,
                Ordering::Less => lo = mid,
                Ordering::Equal => {
                    if matcher.matches(&entry.key, term) {
                        return self.expand(file, line_start, term, matcher);
                    }
                    // truncated compare landed on a key that is a proper
                    // prefix of the term, which orders before it
                    lo = mid;
                }
            }
        }
    }

    /// The bisection landed inside the matching run. A single line is not the
    /// answer when duplicates exist, so walk backward line by line to the
    /// run's first entry, then stream forward across the whole of it.
    fn expand(
        &self,
        mut file: File,
        hit_start: u64,
        term: &str,
        matcher: &dyn KeyMatch,
    ) -> Result<Vec<IndexEntry>, IndexError> {
        let mut first = hit_start;
        while first > 0 {
            let prev = recover_line_start(&mut file, first - 1, 0)?;
            let line = read_line_at(&mut file, prev)?;
            let entry = IndexEntry::parse(&line)?;
            if !matcher.matches(&entry.key, term) {
                break;
            }
            first = prev;
        }
        let len = file.metadata()?.len();
        scan_range(file, first, len, term, matcher)
    }
}

/// Walk backward from `from` to the nearest line start at or before it:
/// the position just past the closest `\n` strictly before `from`. Bytes
/// below `min_pos` are never examined; if the walk reaches `min_pos` without
/// seeing a terminator, the result snaps to absolute file position 0 so the
/// caller always sits on a syntactically complete line.
fn recover_line_start(file: &mut File, from: u64, min_pos: u64) -> io::Result<u64> {
    let mut pos = from;
    let mut byte = [0u8; 1];
    while pos > min_pos {
        file.seek(SeekFrom::Start(pos - 1))?;
        file.read_exact(&mut byte)?;
        if byte[0] == b'\n' {
            return Ok(pos);
        }
        pos -= 1;
    }
    Ok(0)
}

/// Read the single line starting at `pos`, without its terminator.
fn read_line_at(file: &mut File, pos: u64) -> io::Result<String> {
    file.seek(SeekFrom::Start(pos))?;
    let mut reader = BufReader::new(&mut *file);
    let mut line = String::new();
    reader.read_line(&mut line)?;
    if line.ends_with('\n') {
        line.pop();
    }
    Ok(line)
}

/// Stream index entries from `start` (which must be a line boundary),
/// collecting every match until the sorted order passes the term, the range
/// end is reached, or the file runs out. Sortedness is what lets the `Greater`
/// comparison prune the rest of the file.
fn scan_range(
    mut file: File,
    start: u64,
    end: u64,
    term: &str,
    matcher: &dyn KeyMatch,
) -> Result<Vec<IndexEntry>, IndexError> {
    file.seek(SeekFrom::Start(start))?;
    let mut reader = BufReader::new(file);
    let mut out = Vec::new();
    let mut pos = start;
    let mut line = String::new();
    while pos < end {
        line.clear();
        let n = reader.read_line(&mut line)?;
        if n == 0 {
            break;
        }
        pos += n as u64;
        let trimmed = line.strip_suffix('\n').unwrap_or(&line);
        let entry = IndexEntry::parse(trimmed)?;
        if matcher.matches(&entry.key, term) {
            out.push(entry);
        } else if matcher.compare(&entry.key, term) == Ordering::Greater {
            break;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fixture(content: &[u8]) -> File {
        let mut f = tempfile::tempfile().unwrap();
        f.write_all(content).unwrap();
        f
    }

    #[test]
    fn recovery_finds_nearest_boundary() {
        let content = b"alpha\nbeta\ngamma\n";
        let mut f = fixture(content);
        assert_eq!(recover_line_start(&mut f, 0, 0).unwrap(), 0);
        assert_eq!(recover_line_start(&mut f, 3, 0).unwrap(), 0);
        assert_eq!(recover_line_start(&mut f, 6, 0).unwrap(), 6);
        assert_eq!(recover_line_start(&mut f, 9, 0).unwrap(), 6);
        assert_eq!(recover_line_start(&mut f, 11, 0).unwrap(), 11);
        assert_eq!(recover_line_start(&mut f, 14, 0).unwrap(), 11);
    }

    #[test]
    fn recovery_snaps_to_zero_below_lower_bound() {
        let content = b"alpha\nbeta\ngamma\n";
        let mut f = fixture(content);
        // no terminator in [6, 8]: the walk stops at the bound and snaps to 0
        assert_eq!(recover_line_start(&mut f, 9, 6).unwrap(), 0);
        // the terminator at byte 5 is inside [4, 8], so it is found
        assert_eq!(recover_line_start(&mut f, 9, 4).unwrap(), 6);
    }

    #[test]
    fn recovery_never_skips_a_boundary() {
        let content = b"aa\nb\n\ncccc\ndd";
        let mut f = fixture(content);
        for p in 0..=content.len() as u64 {
            let r = recover_line_start(&mut f, p, 0).unwrap();
            assert!(r == 0 || content[r as usize - 1] == b'\n', "p={} r={}", p, r);
            // nothing between the recovered boundary and p may be a terminator
            assert!(
                !content[r as usize..p as usize].contains(&b'\n'),
                "p={} r={}",
                p,
                r
            );
        }
    }

    #[test]
    fn prefix_compare_bands() {
        let m = PrefixMatch;
        assert_eq!(m.compare("ab", "abc"), Ordering::Less);
        assert_eq!(m.compare("abc", "abc"), Ordering::Equal);
        assert_eq!(m.compare("abcd", "abc"), Ordering::Equal);
        assert_eq!(m.compare("abd", "abc"), Ordering::Greater);
        assert_eq!(m.compare("aaa", "abc"), Ordering::Less);
        assert!(m.matches("abcd", "abc"));
        assert!(!m.matches("ab", "abc"));
    }

    #[test]
    fn exact_compare_is_full_bytewise_order() {
        let m = ExactMatch;
        assert_eq!(m.compare("a", "ab"), Ordering::Less);
        assert_eq!(m.compare("ab", "ab"), Ordering::Equal);
        assert_eq!(m.compare("b", "ab"), Ordering::Greater);
        assert!(m.matches("ab", "ab"));
        assert!(!m.matches("abc", "ab"));
    }

    #[test]
    fn scan_stops_once_past_the_term() {
        let dir = tempfile::tempdir().unwrap();
        let idx = dir.path().join("x.idx");
        std::fs::write(&idx, "a\t0\t2\nb\t2\t4\nb\t4\t6\nc\t6\t8\n").unwrap();
        let hits = Searcher::new(&idx).search_exact("b").unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].start, 2);
        assert_eq!(hits[1].start, 4);
    }
}
