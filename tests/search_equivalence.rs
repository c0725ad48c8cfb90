// Copyright 2025 HyperZoekt Project
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The bisecting search is a pure speedup: for any term, matcher and index
//! file it must return exactly what the linear streaming scan returns. These
//! tests pin that equivalence on both sides of the streaming threshold.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;

use line_index::{index_file, ExactMatch, FieldKey, PrefixMatch, Searcher};

fn build_fixture(dir: &std::path::Path, lines: &[String]) -> Result<PathBuf> {
    let data = dir.join("data.tsv");
    std::fs::write(&data, lines.join("\n") + "\n")?;
    let idx = dir.join("data.idx");
    index_file(&data, &idx, &FieldKey::new(0))?;
    Ok(idx)
}

fn random_key(rng: &mut StdRng, max_len: usize) -> String {
    let alphabet = b"abcd";
    let len = rng.gen_range(1..=max_len);
    (0..len)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
        .collect()
}

#[test]
fn randomized_terms_match_the_streaming_reference() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut rng = StdRng::seed_from_u64(0x1d9);
    let lines: Vec<String> = (0..800)
        .map(|i| format!("{}\tpayload-{}", random_key(&mut rng, 6), i))
        .collect();
    let idx = build_fixture(dir.path(), &lines)?;

    // a 200 byte threshold forces the bisecting path on this small fixture
    let searcher = Searcher::new(&idx).threshold(200);
    for _ in 0..300 {
        let term = random_key(&mut rng, 4);
        assert_eq!(
            searcher.search(&term, &PrefixMatch)?,
            searcher.scan(&term, &PrefixMatch)?,
            "prefix results diverged for {:?}",
            term
        );
        assert_eq!(
            searcher.search(&term, &ExactMatch)?,
            searcher.scan(&term, &ExactMatch)?,
            "exact results diverged for {:?}",
            term
        );
    }
    Ok(())
}

#[test]
fn long_duplicate_run_is_collected_in_full() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut lines = vec!["aaa\tlow".to_string()];
    for i in 0..500 {
        lines.push(format!("mmm\tmid-{}", i));
    }
    lines.push("zzz\thigh".to_string());
    let idx = build_fixture(dir.path(), &lines)?;

    // the bisection lands somewhere inside the run and must expand outward
    let searcher = Searcher::new(&idx).threshold(64);
    let hits = searcher.search("mmm", &ExactMatch)?;
    assert_eq!(hits.len(), 500);
    assert_eq!(hits, searcher.scan("mmm", &ExactMatch)?);

    let prefix_hits = searcher.search("mm", &PrefixMatch)?;
    assert_eq!(prefix_hits.len(), 500);
    Ok(())
}

#[test]
fn terms_at_the_file_edges() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let lines: Vec<String> = (0..2000).map(|i| format!("k{:04}\tv{}", i, i)).collect();
    let idx = build_fixture(dir.path(), &lines)?;
    let searcher = Searcher::new(&idx).threshold(128);

    for term in ["k0000", "k1999", "a", "zzzz", "k05", "k"] {
        assert_eq!(
            searcher.search(term, &PrefixMatch)?,
            searcher.scan(term, &PrefixMatch)?,
            "prefix results diverged for {:?}",
            term
        );
        assert_eq!(
            searcher.search(term, &ExactMatch)?,
            searcher.scan(term, &ExactMatch)?,
            "exact results diverged for {:?}",
            term
        );
    }
    // an empty prefix matches the entire index
    assert_eq!(searcher.search("", &PrefixMatch)?.len(), 2000);
    Ok(())
}

#[test]
fn over_the_default_threshold() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let lines: Vec<String> = (0..60_000)
        .map(|i| format!("k{:05}\tvalue-{}", i % 20_000, i))
        .collect();
    let idx = build_fixture(dir.path(), &lines)?;
    let len = std::fs::metadata(&idx)?.len();
    assert!(
        len > line_index::STREAM_THRESHOLD,
        "fixture must exceed the streaming threshold, got {} bytes",
        len
    );

    // default threshold: this exercises the bisecting path for real
    let searcher = Searcher::new(&idx);
    for term in ["k00000", "k00001", "k19999", "k10000"] {
        let hits = searcher.search(term, &ExactMatch)?;
        assert_eq!(hits.len(), 3, "each key appears three times");
        assert_eq!(hits, searcher.scan(term, &ExactMatch)?);
    }
    let prefix_hits = searcher.search("k0000", &PrefixMatch)?;
    assert_eq!(prefix_hits.len(), 30);
    assert_eq!(prefix_hits, searcher.scan("k0000", &PrefixMatch)?);
    assert!(searcher.search("absent", &ExactMatch)?.is_empty());
    Ok(())
}

#[test]
fn threshold_exactly_at_file_size_streams() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let lines: Vec<String> = (0..50).map(|i| format!("k{:02}\tv", i)).collect();
    let idx = build_fixture(dir.path(), &lines)?;
    let len = std::fs::metadata(&idx)?.len();

    let streaming = Searcher::new(&idx).threshold(len);
    let bisecting = Searcher::new(&idx).threshold(len - 1);
    for term in ["k00", "k25", "k49", "nope"] {
        assert_eq!(
            streaming.search(term, &ExactMatch)?,
            bisecting.search(term, &ExactMatch)?
        );
    }
    Ok(())
}
