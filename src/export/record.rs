//! Record serialization for the dump file
//!
//! Each record becomes exactly one line of the form
//! `{"_id": <string>, "_source": <original document body>}`. Serialization
//! is pure: no I/O, no shared state, safe to call concurrently on distinct
//! records.

use serde::Serialize;
use serde_json::Value;

use crate::client::Hit;
use crate::error::{EsdumpError, Result};

/// The line-level shape of one dumped record.
#[derive(Serialize)]
struct DumpRecord<'a> {
    #[serde(rename = "_id")]
    id: &'a str,
    #[serde(rename = "_source")]
    source: &'a Value,
}

/// Serialize one record into a single self-contained line.
///
/// Embedded line breaks in the body are escaped by the JSON encoding, so
/// the dump file's line count always equals its record count. Non-ASCII
/// text passes through unescaped.
///
/// # Arguments
/// * `hit` - Record to serialize
///
/// # Returns
/// * `Result<String>` - One line of JSON without a trailing line break
pub fn serialize_hit(hit: &Hit) -> Result<String> {
    let record = DumpRecord {
        id: &hit.id,
        source: &hit.source,
    };

    serde_json::to_string(&record).map_err(|e| {
        EsdumpError::Generic(format!("Failed to serialize document '{}': {}", hit.id, e))
    })
}
