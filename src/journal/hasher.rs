//! RC-008: BLAKE3 fingerprints for recipe snapshots and recipe files.
//!
//! A session journal records which snapshot it ran against; two snapshots
//! with identical content hash identically regardless of source format.

use crate::core::types::Recipe;
use std::io::Read;
use std::path::Path;

const STREAM_BUF_SIZE: usize = 65536;

/// Hash a string. Returns `"blake3:{hex}"`.
pub fn hash_string(s: &str) -> String {
    format!("blake3:{}", blake3::hash(s.as_bytes()).to_hex())
}

/// Hash a file's raw bytes. Returns `"blake3:{hex}"`.
pub fn hash_file(path: &Path) -> Result<String, String> {
    let mut file =
        std::fs::File::open(path).map_err(|e| format!("cannot open {}: {}", path.display(), e))?;
    let mut hasher = blake3::Hasher::new();
    let mut buf = [0u8; STREAM_BUF_SIZE];
    loop {
        let n = file
            .read(&mut buf)
            .map_err(|e| format!("read error {}: {}", path.display(), e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("blake3:{}", hasher.finalize().to_hex()))
}

/// Fingerprint a parsed recipe snapshot via its canonical JSON encoding.
pub fn hash_recipe(recipe: &Recipe) -> Result<String, String> {
    let json =
        serde_json::to_string(recipe).map_err(|e| format!("JSON serialize error: {}", e))?;
    Ok(hash_string(&json))
}
