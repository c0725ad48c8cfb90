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

use clap::Parser;
use line_index::{IndexEntry, IndexError, RecordReader, Searcher};
use std::result::Result as StdResult;

#[derive(Parser, Debug)]
#[command(name = "li-search", about = "Search a sorted line index")]
struct Args {
    /// Path to the sorted index file
    index: std::path::PathBuf,
    /// Key (or key prefix, with --prefix) to look up
    term: String,
    /// Prefix lookup instead of exact
    #[arg(long)]
    prefix: bool,
    /// Print the matching records from this data file instead of index entries
    #[arg(long)]
    data: Option<std::path::PathBuf>,
    /// Emit JSON (NDJSON)
    #[arg(long)]
    json: bool,
    /// Limit number of results
    #[arg(long)]
    limit: Option<usize>,
    /// Streaming threshold in bytes (default 1 MiB)
    #[arg(long)]
    threshold: Option<u64>,
}

fn main() -> StdResult<(), IndexError> {
    let env = env_logger::Env::default().filter_or("RUST_LOG", "info");
    env_logger::Builder::from_env(env).init();
    let args = Args::parse();

    let mut searcher = Searcher::new(&args.index);
    if let Some(t) = args.threshold {
        searcher = searcher.threshold(t);
    }
    let mut entries = if args.prefix {
        searcher.search_prefix(&args.term)?
    } else {
        searcher.search_exact(&args.term)?
    };
    if let Some(limit) = args.limit {
        entries.truncate(limit);
    }

    match args.data.as_ref() {
        Some(data) => {
            let mut reader = RecordReader::open(data)?;
            for entry in &entries {
                let record = reader.record(entry)?;
                if args.json {
                    let v = serde_json::json!({
                        "key": entry.key,
                        "start": entry.start,
                        "end": entry.end,
                        "record": record,
                    });
                    println!("{}", v);
                } else {
                    println!("{}", record);
                }
            }
        }
        None => {
            for entry in &entries {
                print_entry(entry, args.json);
            }
        }
    }
    Ok(())
}

fn print_entry(entry: &IndexEntry, json: bool) {
    if json {
        let v = serde_json::json!({
            "key": entry.key,
            "start": entry.start,
            "end": entry.end,
        });
        println!("{}", v);
    } else {
        println!("{}\t{}\t{}", entry.key, entry.start, entry.end);
    }
}
