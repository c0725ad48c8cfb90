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

use crate::error::IndexError;
use serde::{Deserialize, Serialize};

/// One `(key, start, end)` record in an index file.
///
/// The half-open byte range `[start, end)` covers exactly one line of the
/// original data file, including its trailing line terminator. Keys must not
/// contain a tab or a line terminator; the index format has no escaping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub key: String,
    pub start: u64,
    pub end: u64,
}

impl IndexEntry {
    /// Parse one `key \t start \t end` index line. The line must not carry
    /// its `\n`; a trailing `\r` is tolerated.
    pub fn parse(line: &str) -> Result<IndexEntry, IndexError> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 3 {
            return Err(IndexError::Parse {
                line: line.to_string(),
                reason: format!("expected 3 tab-separated fields, got {}", fields.len()),
            });
        }
        let start: u64 = fields[1].parse().map_err(|_| IndexError::Parse {
            line: line.to_string(),
            reason: format!("start offset {:?} is not an integer", fields[1]),
        })?;
        let end: u64 = fields[2].parse().map_err(|_| IndexError::Parse {
            line: line.to_string(),
            reason: format!("end offset {:?} is not an integer", fields[2]),
        })?;
        if start >= end {
            return Err(IndexError::Parse {
                line: line.to_string(),
                reason: format!("byte range [{}, {}) is empty", start, end),
            });
        }
        Ok(IndexEntry {
            key: fields[0].to_string(),
            start,
            end,
        })
    }
}

/// A maximal contiguous run of index entries sharing one key, as produced by
/// grouping a sorted index file. Entries keep their index-file order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexBlock {
    pub key: String,
    pub entries: Vec<IndexEntry>,
}
