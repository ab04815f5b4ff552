use serde::{Serialize, de::DeserializeOwned};

use crate::types::LogError;

/// Serialize a record to exactly one line of JSON.
///
/// JSON string escaping guarantees no raw line terminator can appear in the
/// output; the check below enforces that invariant against exotic
/// `Serialize` impls rather than trusting it blindly.
pub fn encode<T: Serialize>(record: &T) -> Result<String, LogError> {
    let line = serde_json::to_string(record).map_err(|e| LogError::Encode(e.to_string()))?;
    if line.bytes().any(|b| b == b'\n' || b == b'\r') {
        return Err(LogError::Encode(
            "encoded record contains a line terminator".to_string(),
        ));
    }
    Ok(line)
}

/// Parse one line back into a record. Exact inverse of [`encode`] over
/// everything `encode` can produce.
pub fn decode<T: DeserializeOwned>(line: &str) -> Result<T, LogError> {
    serde_json::from_str(line).map_err(|e| LogError::Decode(e.to_string()))
}
