use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek};
use std::path::Path;

/// One scanned line together with the byte range it occupied in the file.
/// `start` is the file position before the line was read; `end` the position
/// after it, including the consumed line terminator. `text` carries neither
/// the `\n` nor a preceding `\r`.
#[derive(Debug, Clone)]
pub struct ScannedLine {
    pub text: String,
    pub start: u64,
    pub end: u64,
}

/// Lazy, finite, single-pass iterator over the lines of an open file handle,
/// yielding `(text, start, end)` triples and advancing the underlying cursor.
///
/// Scanning begins at the handle's current position, so a caller can seek
/// first to scan a suffix. The handle is dropped (closed) as soon as the scan
/// reaches end of file or fails; on early termination it is closed when the
/// scanner itself is dropped. Not restartable.
pub struct LineScanner {
    reader: Option<BufReader<File>>,
    pos: u64,
}

impl LineScanner {
    /// Wrap an already-open handle, scanning from its current position.
    pub fn new(mut file: File) -> io::Result<LineScanner> {
        let pos = file.stream_position()?;
        Ok(LineScanner {
            reader: Some(BufReader::new(file)),
            pos,
        })
    }

    /// Open `path` and scan it from the beginning.
    pub fn open(path: impl AsRef<Path>) -> io::Result<LineScanner> {
        LineScanner::new(File::open(path)?)
    }
}

impl Iterator for LineScanner {
    type Item = io::Result<ScannedLine>;

    fn next(&mut self) -> Option<io::Result<ScannedLine>> {
        let reader = self.reader.as_mut()?;
        let mut text = String::new();
        match reader.read_line(&mut text) {
            Ok(0) => {
                // natural exhaustion: release the handle eagerly
                self.reader = None;
                None
            }
            Ok(n) => {
                let start = self.pos;
                self.pos += n as u64;
                if text.ends_with('\n') {
                    text.pop();
                    if text.ends_with('\r') {
                        text.pop();
                    }
                }
                Some(Ok(ScannedLine {
                    text,
                    start,
                    end: self.pos,
                }))
            }
            Err(e) => {
                self.reader = None;
                Some(Err(e))
            }
        }
    }
}
