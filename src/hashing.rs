//! Hashing - SHA-256 Fingerprints for Canvases and Export Manifests
//!
//! Every hash is taken over canonical JSON (sorted keys, no whitespace) so
//! that the same creative always fingerprints the same, whatever key order it
//! arrived in.

use sha2::{Sha256, Digest};
use serde::Serialize;
use serde_json::{Value, to_string};

use crate::canvas::Canvas;

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Convert to canonical JSON (sorted keys, no whitespace)
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v: Value = serde_json::to_value(value)?;
    to_string(&sort_value(&v))
}

fn sort_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut sorted: Vec<_> = map.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                sorted
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sort_value(v)))
                    .collect(),
            )
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_value).collect()),
        _ => v.clone(),
    }
}

/// Fingerprint of a canvas document.
pub fn canvas_fingerprint(canvas: &Canvas) -> Result<String, serde_json::Error> {
    Ok(sha256_hex(canonical_json(canvas)?.as_bytes()))
}

/// Compute manifest hash for an export record
pub fn compute_manifest_hash<T: Serialize>(manifest: &T) -> Result<String, serde_json::Error> {
    let canonical = canonical_json(manifest)?;
    Ok(sha256_hex(canonical.as_bytes()))
}

/// Compute job hash for audit logging
/// job_hash = sha256(profile_id + profile_version + canonical_canvas + engine_version)
pub fn compute_job_hash(
    profile_id: &str,
    profile_version: &str,
    canvas: &Canvas,
    engine_version: &str,
) -> Result<String, serde_json::Error> {
    let canonical_canvas = canonical_json(canvas)?;
    let combined = format!(
        "{}:{}:{}:{}",
        profile_id, profile_version, canonical_canvas, engine_version
    );
    Ok(sha256_hex(combined.as_bytes()))
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
    }
}
