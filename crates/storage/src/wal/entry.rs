// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WAL entry structure and key layout

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Separates the event type from the zero-padded sequence in a key
pub(crate) const KEY_SEPARATOR: char = '/';

/// A durable record of an operation that has started but not completed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Store-assigned, strictly increasing
    pub sequence: u64,
    /// Selects the recovery hook
    pub event_type: String,
    /// Encoded event, opaque to the WAL
    pub payload: Vec<u8>,
    pub logged_at: DateTime<Utc>,
}

impl LogEntry {
    /// Store key; zero padding keeps key order equal to write order
    pub fn key(&self) -> String {
        entry_key(&self.event_type, self.sequence)
    }

    /// Decode the payload as a JSON event
    pub fn decode<E: DeserializeOwned>(&self) -> Result<E, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }
}

pub(crate) fn entry_key(event_type: &str, sequence: u64) -> String {
    format!("{}{}{:020}", event_type, KEY_SEPARATOR, sequence)
}

/// Event type encoded in a key, for entries whose value cannot be decoded
pub(crate) fn event_type_of_key(key: &str) -> &str {
    key.rsplit_once(KEY_SEPARATOR)
        .map(|(event_type, _)| event_type)
        .unwrap_or(key)
}

#[cfg(test)]
#[path = "entry_tests.rs"]
mod tests;
