use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::CoreError;

/// Current session store document version.
pub const CURRENT_VERSION: u16 = 1;

/// On-disk session store document.
///
/// Layout:
/// ```text
/// { "version": 1, "entries": { "<key>": "<value>", ... } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDocument {
    pub version: u16,

    #[serde(default)]
    pub entries: BTreeMap<String, String>,
}

/// Serialize entries into a versioned document.
pub fn write_document(entries: &BTreeMap<String, String>) -> Result<Vec<u8>, CoreError> {
    let doc = StoreDocument {
        version: CURRENT_VERSION,
        entries: entries.clone(),
    };
    serde_json::to_vec_pretty(&doc)
        .map_err(|e| CoreError::Serialization(format!("Failed to serialize session store: {e}")))
}

/// Parse a document and return its entries.
///
/// Empty (or whitespace-only) input is an empty store, so a file created
/// but never written still loads.
pub fn read_document(data: &[u8]) -> Result<BTreeMap<String, String>, CoreError> {
    if data.iter().all(u8::is_ascii_whitespace) {
        return Ok(BTreeMap::new());
    }

    let doc: StoreDocument = serde_json::from_slice(data).map_err(|e| {
        CoreError::InvalidStoreFormat(format!("Not a session store document: {e}"))
    })?;

    if doc.version == 0 || doc.version > CURRENT_VERSION {
        return Err(CoreError::UnsupportedVersion(doc.version));
    }

    Ok(doc.entries)
}
