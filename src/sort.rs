use crate::error::IndexError;
use log::debug;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::process::Command;
use std::time::Instant;

/// Reorders an index file ascending by its first tab-delimited field under
/// byte-wise, locale-free comparison. Tie order among equal keys is
/// unspecified.
///
/// Implementations must write to a temporary file and atomically replace the
/// original on success; this rename is the only atomic step in index
/// construction.
pub trait IndexSorter {
    fn sort_file(&self, path: &Path) -> Result<(), IndexError>;
}

/// Sorts the whole index in memory. The right choice for anything that fits
/// comfortably in RAM, and the default behind [`crate::sort_index`].
pub struct InMemorySorter;

impl IndexSorter for InMemorySorter {
    fn sort_file(&self, path: &Path) -> Result<(), IndexError> {
        let started = Instant::now();
        let mut lines: Vec<String> = Vec::new();
        for line in BufReader::new(File::open(path)?).lines() {
            lines.push(line?);
        }
        lines.sort_unstable_by(|a, b| key_of(a).cmp(key_of(b)));
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        let mut tmp = tempfile::NamedTempFile::new_in(dir.unwrap_or(Path::new(".")))?;
        for line in &lines {
            writeln!(tmp, "{}", line)?;
        }
        tmp.flush()?;
        tmp.persist(path).map_err(|e| IndexError::Io(e.error))?;
        debug!(
            "sorted {} index entries at {} in {:?}",
            lines.len(),
            path.display(),
            started.elapsed()
        );
        Ok(())
    }
}

/// Shells out to an external `sort` program with a fixed `C` collation, for
/// index files too large to sort in memory. Requires a POSIX `sort` on PATH.
pub struct CommandSorter {
    program: String,
}

impl CommandSorter {
    pub fn new(program: impl Into<String>) -> CommandSorter {
        CommandSorter {
            program: program.into(),
        }
    }
}

impl Default for CommandSorter {
    fn default() -> CommandSorter {
        CommandSorter::new("sort")
    }
}

impl IndexSorter for CommandSorter {
    fn sort_file(&self, path: &Path) -> Result<(), IndexError> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let tmp = tempfile::NamedTempFile::new_in(dir)?;
        let status = Command::new(&self.program)
            .env("LC_ALL", "C")
            .arg("-t")
            .arg("\t")
            .arg("-k")
            .arg("1,1")
            .arg("-o")
            .arg(tmp.path())
            .arg(path)
            .status()?;
        if !status.success() {
            return Err(IndexError::Io(io::Error::new(
                io::ErrorKind::Other,
                format!("{} exited with {}", self.program, status),
            )));
        }
        tmp.persist(path).map_err(|e| IndexError::Io(e.error))?;
        Ok(())
    }
}

/// The sort key of one index line: everything up to the first tab. Comparing
/// whole lines instead would let the offset fields leak into the order for
/// keys containing bytes below `\t`.
fn key_of(line: &str) -> &[u8] {
    match line.split_once('\t') {
        Some((key, _)) => key.as_bytes(),
        None => line.as_bytes(),
    }
}
