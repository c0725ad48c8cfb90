use crate::scan::ScannedLine;

/// A caller-supplied key function: maps one line of input to zero or more
/// index keys.
///
/// Implementations must be pure per line and safe to invoke concurrently
/// across different lines; the builder fans key computation out over a worker
/// pool. Returned keys must not contain a tab or a line terminator: the
/// index format has no escaping, and a violating key corrupts the index file.
/// That is a caller bug, checked only by `debug_assert!` at write time.
///
/// An `Err` aborts the entire build; a partial index file is never usable.
pub trait KeyFn: Sync {
    fn keys(&self, line: &str) -> anyhow::Result<Vec<String>>;
}

impl<F> KeyFn for F
where
    F: Fn(&str) -> anyhow::Result<Vec<String>> + Sync,
{
    fn keys(&self, line: &str) -> anyhow::Result<Vec<String>> {
        self(line)
    }
}

/// Key function selecting a single delimiter-separated field per line, the
/// common case for TSV-ish inputs. Lines with too few fields yield no keys
/// and are simply left out of the index.
pub struct FieldKey {
    field: usize,
    delimiter: char,
}

impl FieldKey {
    pub fn new(field: usize) -> FieldKey {
        FieldKey {
            field,
            delimiter: '\t',
        }
    }

    pub fn delimiter(mut self, delimiter: char) -> FieldKey {
        self.delimiter = delimiter;
        self
    }
}

impl KeyFn for FieldKey {
    fn keys(&self, line: &str) -> anyhow::Result<Vec<String>> {
        Ok(line
            .split(self.delimiter)
            .nth(self.field)
            .map(|f| f.to_string())
            .into_iter()
            .collect())
    }
}

/// Map `key_fn` over a batch of scanned lines, in parallel when a pool is
/// available. The output is index-aligned with the input batch regardless of
/// per-line completion order; restoring input order here is a correctness
/// requirement, since entry order feeds straight into the index file.
pub(crate) fn extract_batch(
    pool: Option<&rayon::ThreadPool>,
    batch: &[ScannedLine],
    key_fn: &dyn KeyFn,
) -> Vec<anyhow::Result<Vec<String>>> {
    use rayon::prelude::*;
    match pool {
        Some(pool) => pool.install(|| {
            batch
                .par_iter()
                .map(|line| key_fn.keys(&line.text))
                .collect()
        }),
        None => batch
            .par_iter()
            .map(|line| key_fn.keys(&line.text))
            .collect(),
    }
}
