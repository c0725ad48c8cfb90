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
use line_index::{FieldKey, IndexBuilder, IndexError, IndexSorter, InMemorySorter};
use std::result::Result as StdResult;

#[derive(Parser, Debug)]
#[command(name = "li-build", about = "Build a sorted line index over a data file")]
struct Args {
    /// Path to the line-oriented data file
    input: std::path::PathBuf,
    /// Optional output index path (defaults to <input>.idx)
    #[arg(long)]
    out: Option<std::path::PathBuf>,
    /// Zero-based field to key each line on
    #[arg(long, default_value_t = 0)]
    field: usize,
    /// Field delimiter
    #[arg(long, default_value_t = '\t')]
    delimiter: char,
    /// Worker threads for key extraction
    #[arg(long)]
    threads: Option<usize>,
    /// Leave the index unsorted (scan order)
    #[arg(long)]
    no_sort: bool,
}

fn main() -> StdResult<(), IndexError> {
    let env = env_logger::Env::default().filter_or("RUST_LOG", "info");
    env_logger::Builder::from_env(env).init();
    let args = Args::parse();

    let out = args.out.clone().unwrap_or_else(|| {
        let mut p = args.input.clone().into_os_string();
        p.push(".idx");
        p.into()
    });

    let mut builder = IndexBuilder::new(&args.input);
    if let Some(t) = args.threads {
        builder = builder.index_threads(t);
    }
    let key_fn = FieldKey::new(args.field).delimiter(args.delimiter);
    builder.build(&out, &key_fn)?;
    if !args.no_sort {
        InMemorySorter.sort_file(&out)?;
    }
    println!(
        "wrote index: {}{}",
        out.display(),
        if args.no_sort { " (unsorted)" } else { "" }
    );
    Ok(())
}
