// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk record framing
//!
//! Each line of the store file is one [`Frame`]: a record plus the CRC32 of
//! the record's JSON encoding.

use serde::{Deserialize, Serialize};

/// A single mutation of the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub(crate) enum Record {
    /// Root namespace header, always the first record of a file
    Bucket { name: String },
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
    /// Highest sequence number handed out so far
    Sequence { value: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Frame {
    pub record: Record,
    pub checksum: u32,
}

impl Frame {
    pub fn new(record: Record) -> Self {
        let checksum = Self::calculate_checksum(&record);
        Self { record, checksum }
    }

    fn calculate_checksum(record: &Record) -> u32 {
        // Record holds only strings, byte vectors and integers, so encoding cannot fail
        let json = serde_json::to_string(record).unwrap_or_default();
        crc32fast::hash(json.as_bytes())
    }

    pub fn verify(&self) -> bool {
        self.checksum == Self::calculate_checksum(&self.record)
    }

    /// Serialize to one newline-terminated line
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    /// Parse and verify a line; `None` marks the corruption point
    pub fn from_line(line: &str) -> Option<Self> {
        let frame: Frame = serde_json::from_str(line).ok()?;
        frame.verify().then_some(frame)
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
