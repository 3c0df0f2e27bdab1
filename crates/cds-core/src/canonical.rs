//! Canonical JSON encoding used for manifests, plans and hashing.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::{ErrorInfo, SurveyError};

/// Serializes a value to pretty JSON with object keys in sorted order.
///
/// Values pass through [`serde_json::Value`] first so map ordering never
/// depends on the source container.
pub fn to_canonical_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, SurveyError> {
    let value = serde_json::to_value(value)
        .map_err(|err| SurveyError::Serde(ErrorInfo::new("json-encode", err.to_string())))?;
    let mut bytes = serde_json::to_vec_pretty(&value)
        .map_err(|err| SurveyError::Serde(ErrorInfo::new("json-encode", err.to_string())))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Decodes a JSON payload produced by [`to_canonical_json_bytes`].
pub fn from_json_slice<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SurveyError> {
    serde_json::from_slice(bytes)
        .map_err(|err| SurveyError::Serde(ErrorInfo::new("json-decode", err.to_string())))
}
