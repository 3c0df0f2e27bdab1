//! Stable content hashes for banks and assignment plans.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::canonical::to_canonical_json_bytes;
use crate::errors::SurveyError;

/// Computes a stable hexadecimal hash for the provided serializable payload.
pub fn stable_hash_string<T: Serialize + ?Sized>(value: &T) -> Result<String, SurveyError> {
    let bytes = to_canonical_json_bytes(value)?;
    let digest = Sha256::digest(bytes);
    Ok(format!("{:x}", digest))
}
