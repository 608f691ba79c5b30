// src/crawler/asset.rs
// =============================================================================
// The record we emit for every page that made it to the parse stage.
//
// Wire format (one JSON object per record, newline terminated):
//   {"accessed":"2023-05-01T10:00:00.123Z","address":"https://...",
//    "data":"<base64 body or empty>","references":["/a","#top",...]}
//
// Rust concepts:
// - serde derive with field-level `with` modules for custom encodings
// - chrono's DateTime<Utc> serializes as an RFC 3339 string
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One fetched page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// UTC time the fetch started
    pub accessed: DateTime<Utc>,
    /// The input line exactly as given
    pub address: String,
    /// Raw response body, empty unless body caching is on for this run
    #[serde(with = "base64_bytes", default)]
    pub data: Vec<u8>,
    /// Every href value in document pre-order, duplicates kept
    pub references: Vec<String>,
}

impl Asset {
    /// Builds the record; the body is only kept when `cache_body` is set.
    pub fn new(
        accessed: DateTime<Utc>,
        address: String,
        body: &[u8],
        cache_body: bool,
        references: Vec<String>,
    ) -> Self {
        let data = if cache_body { body.to_vec() } else { Vec::new() };

        Asset {
            accessed,
            address,
            data,
            references,
        }
    }

    /// Serializes to the bytes handed to every sink: one JSON line.
    pub fn to_record(&self) -> serde_json::Result<Vec<u8>> {
        let mut record = serde_json::to_vec(self)?;
        record.push(b'\n');
        Ok(record)
    }
}

// Byte buffers go over the wire as standard base64 text
mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    // Lets records be read back (tests, downstream tooling)
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text.as_bytes()).map_err(de::Error::custom)
    }
}
